//! Parse-time errors.
//!
//! Never propagated out of [`super::parser`]: a malformed directive is
//! logged with one of these as the reason, then skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("label path too short: {0}")]
    PathTooShort(String),

    #[error("empty label value for {0}")]
    EmptyValue(String),

    #[error("could not parse duration '{value}' for {key}")]
    BadDuration { key: String, value: String },

    #[error("check command is empty after splitting argv for {0}")]
    EmptyCommand(String),
}
