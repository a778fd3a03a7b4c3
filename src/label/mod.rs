//! Parses `ogre.*` container labels into [`CheckSpec`]s.

mod error;
mod parser;
mod spec;

pub use error::ParseError;
pub use parser::parse_labels;
pub use spec::{
    CheckSpec, ContainerIdentity, ExecutionSite, Formatter, OutputSpec, PlatformSpec,
    PlatformTarget,
};
