use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to bind control socket at {path}: {source}")]
    Bind {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
