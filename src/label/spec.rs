//! Types produced by the label parser: [`CheckSpec`] and [`Formatter`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Where a check's command vector is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionSite {
    #[default]
    Internal,
    External,
}

/// The reporting backend a check's results are routed to.
///
/// `ogre.format.backend.collectd` is a recognized-but-unimplemented
/// reservation in the label grammar: the parser logs a notice and
/// resolves it to `DefaultLog` rather than producing a dedicated
/// variant for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformTarget {
    Statsd,
    Http,
    Prometheus,
    DefaultLog,
}

/// The `output.{type,result}` half of a container's Formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub output_type: String,
    pub output_result: String,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            output_type: "int".to_string(),
            output_result: "exit".to_string(),
        }
    }
}

/// The `backend.*` half of a container's Formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpec {
    pub target: PlatformTarget,
    pub prometheus_metric: String,
    pub prometheus_label: String,
}

impl Default for PlatformSpec {
    fn default() -> Self {
        Self {
            target: PlatformTarget::DefaultLog,
            prometheus_metric: "ogre_metric".to_string(),
            prometheus_label: "ogre_job".to_string(),
        }
    }
}

/// Shared across every check of one container; built once from its
/// `ogre.format.*` labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatter {
    pub output: OutputSpec,
    pub platform: PlatformSpec,
}

/// Identity of the container a [`CheckSpec`] belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIdentity {
    pub id: String,
    pub name: String,
    pub hostname: String,
}

/// Immutable description of one health probe, parsed from a single
/// `ogre.health.*` label.
///
/// Nothing here is mutated after parse; the per-check loop's most recent
/// [`crate::message::ExecResult`] lives beside this spec, not inside it
/// (see `docker::scheduler::CheckHandle`).
#[derive(Debug, Clone)]
pub struct CheckSpec {
    pub name: String,
    pub site: ExecutionSite,
    pub command: Vec<String>,
    pub interval: Duration,
    pub container: ContainerIdentity,
    pub formatter: Arc<Formatter>,
}

impl CheckSpec {
    pub fn target(&self) -> PlatformTarget {
        self.formatter.platform.target
    }
}
