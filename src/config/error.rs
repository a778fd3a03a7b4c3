//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
