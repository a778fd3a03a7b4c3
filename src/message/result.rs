//! The result of running one check, and the envelope the hub routes to a
//! backend.

use crate::label::{CheckSpec, PlatformTarget};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw outcome of one check execution, whether run via `docker exec` or a
/// host subprocess.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub hostname: String,
}

impl ExecResult {
    /// `true` when the check's own output reports it as healthy
    /// (exit code `0`).
    pub fn healthy(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// What the hub forwards to the backend service after a check completes.
#[derive(Debug, Clone)]
pub struct ResultMessage {
    pub check: Arc<CheckSpec>,
    pub target: PlatformTarget,
    pub result: ExecResult,
}

impl ResultMessage {
    pub fn new(check: Arc<CheckSpec>, result: ExecResult) -> Self {
        let target = check.target();
        Self {
            check,
            target,
            result,
        }
    }

    /// The serializable body every backend eventually sends or logs.
    pub fn record(&self) -> ResultRecord {
        ResultRecord {
            check: self.check.name.clone(),
            container: self.check.container.name.clone(),
            hostname: self.result.hostname.clone(),
            output_type: self.check.formatter.output.output_type.clone(),
            output_result: self.check.formatter.output.output_result.clone(),
            exit_code: self.result.exit_code,
            stdout: self.result.stdout_lossy(),
        }
    }
}

/// JSON-serializable payload shared by the HTTP, default-log, and (for its
/// label values) Prometheus backends. Round-trips through `serde_json`
/// unchanged: a Result Message serialised then deserialised yields an
/// equal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub check: String,
    pub container: String,
    pub hostname: String,
    pub output_type: String,
    pub output_result: String,
    pub exit_code: i32,
    pub stdout: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{ContainerIdentity, ExecutionSite, Formatter};
    use std::time::Duration;

    fn check() -> Arc<CheckSpec> {
        Arc::new(CheckSpec {
            name: "foo_check".to_string(),
            site: ExecutionSite::Internal,
            command: vec!["true".to_string()],
            interval: Duration::from_secs(5),
            container: ContainerIdentity {
                id: "c1".to_string(),
                name: "web".to_string(),
                hostname: "host-a".to_string(),
            },
            formatter: Arc::new(Formatter::default()),
        })
    }

    #[test]
    fn healthy_on_zero_exit() {
        let result = ExecResult {
            exit_code: 0,
            stdout: b"ok".to_vec(),
            stderr: Vec::new(),
            hostname: "host-a".to_string(),
        };
        assert!(result.healthy());
    }

    #[test]
    fn unhealthy_on_nonzero_exit() {
        let result = ExecResult {
            exit_code: 1,
            stdout: Vec::new(),
            stderr: b"boom".to_vec(),
            hostname: "host-a".to_string(),
        };
        assert!(!result.healthy());
    }

    #[test]
    fn result_message_target_matches_check_formatter() {
        let msg = ResultMessage::new(
            check(),
            ExecResult {
                exit_code: 0,
                stdout: Vec::new(),
                stderr: Vec::new(),
                hostname: "host-a".to_string(),
            },
        );
        assert_eq!(msg.target, PlatformTarget::DefaultLog);
    }

    #[test]
    fn record_serializes_to_json() {
        let msg = ResultMessage::new(
            check(),
            ExecResult {
                exit_code: 0,
                stdout: b"pong".to_vec(),
                stderr: Vec::new(),
                hostname: "host-a".to_string(),
            },
        );
        let json = serde_json::to_string(&msg.record()).unwrap();
        assert!(json.contains("foo_check"));
        assert!(json.contains("pong"));
    }

    #[test]
    fn record_round_trips_through_json() {
        let msg = ResultMessage::new(
            check(),
            ExecResult {
                exit_code: 1,
                stdout: b"pong".to_vec(),
                stderr: Vec::new(),
                hostname: "host-a".to_string(),
            },
        );
        let record = msg.record();
        let json = serde_json::to_string(&record).unwrap();
        let roundtripped: ResultRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, roundtripped);
    }
}
