use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to bind statsd UDP socket: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid prometheus metric definition: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("invalid backend server address '{0}'")]
    InvalidAddress(String),
}
