//! Control-socket wire format: a generic envelope is decoded first, then
//! redecoded into the concrete action enum for its named service.

use super::error::MessageError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The service + action discriminators every control message carries,
/// plus whatever the concrete action needs, captured generically so the
/// service name can be inspected before committing to a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub service: String,
    pub action: String,
    #[serde(flatten)]
    pub rest: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonAction {
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockerAction {
    Start,
    Stop,
}

/// No control verb targets the backend service today; kept as an
/// uninhabited enum so the `service: "backend"` branch in [`decode`]
/// exists and always errors rather than being silently accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendAction {}

#[derive(Debug, Clone)]
pub enum ControlMessage {
    Daemon(DaemonAction),
    Docker(DockerAction),
    Backend(BackendAction),
}

/// Decode a raw control-socket frame.
///
/// An unrecognised `service` value is treated as addressed to the daemon
/// itself rather than rejected outright, matching how a bare `{"action":
/// "stop"}` with no service at all should still stop the daemon.
pub fn decode(bytes: &[u8]) -> Result<ControlMessage, MessageError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    match envelope.service.as_str() {
        "docker" => Ok(ControlMessage::Docker(parse_action(&envelope)?)),
        "backend" => Ok(ControlMessage::Backend(parse_action(&envelope)?)),
        _ => Ok(ControlMessage::Daemon(parse_action(&envelope)?)),
    }
}

fn parse_action<T: serde::de::DeserializeOwned>(envelope: &Envelope) -> Result<T, MessageError> {
    serde_json::from_value(Value::String(envelope.action.clone())).map_err(|_| {
        MessageError::UnknownAction {
            service: envelope.service.clone(),
            action: envelope.action.clone(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_docker_stop() {
        let msg = decode(br#"{"service":"docker","action":"stop"}"#).unwrap();
        assert!(matches!(msg, ControlMessage::Docker(DockerAction::Stop)));
    }

    #[test]
    fn decodes_docker_start() {
        let msg = decode(br#"{"service":"docker","action":"start"}"#).unwrap();
        assert!(matches!(msg, ControlMessage::Docker(DockerAction::Start)));
    }

    #[test]
    fn decodes_daemon_stop() {
        let msg = decode(br#"{"service":"daemon","action":"stop"}"#).unwrap();
        assert!(matches!(msg, ControlMessage::Daemon(DaemonAction::Stop)));
    }

    #[test]
    fn unknown_service_falls_back_to_daemon() {
        let msg = decode(br#"{"service":"bogus","action":"stop"}"#).unwrap();
        assert!(matches!(msg, ControlMessage::Daemon(DaemonAction::Stop)));
    }

    #[test]
    fn unknown_action_is_an_error() {
        let err = decode(br#"{"service":"docker","action":"teleport"}"#).unwrap_err();
        assert!(matches!(err, MessageError::UnknownAction { .. }));
    }

    #[test]
    fn backend_service_always_errors() {
        let err = decode(br#"{"service":"backend","action":"anything"}"#).unwrap_err();
        assert!(matches!(err, MessageError::UnknownAction { .. }));
    }

    #[test]
    fn malformed_json_is_an_envelope_error() {
        let err = decode(b"not json").unwrap_err();
        assert!(matches!(err, MessageError::Envelope(_)));
    }
}
