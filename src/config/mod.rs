//! Layered configuration loading: TOML file, then environment variable
//! overrides, then CLI overrides (applied by `cli::run`).

pub mod backend;
pub mod error;
pub mod logging;

pub use backend::BackendConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OgreConfig {
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub logging: LoggingConfig,
    pub backends: Vec<BackendConfig>,
}

impl Default for OgreConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/var/run/ogre-healthd.sock"),
            pid_path: PathBuf::from("/var/run/ogre-healthd.pid"),
            logging: LoggingConfig::default(),
            backends: Vec::new(),
        }
    }
}

impl OgreConfig {
    /// Load configuration from a TOML file. `None` returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `OGRE_*` environment variable overrides. Invalid values are
    /// logged and ignored; defaults are kept.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(socket_path) = std::env::var("OGRE_SOCKET_PATH") {
            self.socket_path = PathBuf::from(socket_path);
        }
        if let Ok(pid_path) = std::env::var("OGRE_PID_PATH") {
            self.pid_path = PathBuf::from(pid_path);
        }
        if let Ok(level) = std::env::var("OGRE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("OGRE_LOG_FORMAT") {
            match format.parse() {
                Ok(f) => self.logging.format = f,
                Err(e) => tracing::warn!(value = %format, error = %e, "ignoring invalid OGRE_LOG_FORMAT"),
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "socket_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        for (i, backend) in self.backends.iter().enumerate() {
            let field = format!("backends[{i}]");
            match backend {
                BackendConfig::Statsd { server, .. } if server.is_empty() => {
                    return Err(ConfigError::Validation {
                        field,
                        message: "statsd server address must not be empty".to_string(),
                    });
                }
                BackendConfig::Http { url } if url.is_empty() => {
                    return Err(ConfigError::Validation {
                        field,
                        message: "http url must not be empty".to_string(),
                    });
                }
                BackendConfig::Prometheus { bind } if bind.is_empty() => {
                    return Err(ConfigError::Validation {
                        field,
                        message: "prometheus bind address must not be empty".to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}
