//! Backend sink configuration: one entry per reporting platform the
//! operator wants wired up.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// `server` is a `host:port` UDP target; `prefix` is prepended to
    /// every metric name (empty string disables the prefix).
    Statsd {
        server: String,
        #[serde(default)]
        prefix: String,
    },
    /// `url` receives one JSON POST per result.
    Http { url: String },
    /// `bind` is the `host:port` the `/metrics` scrape server listens on.
    Prometheus { bind: String },
}
