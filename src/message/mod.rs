//! Message types carried on the hub's single inbound channel and its
//! per-service outbound inboxes.

pub mod control;
pub mod error;
pub mod intent;
pub mod result;

pub use control::{
    decode as decode_control, BackendAction, ControlMessage, DaemonAction, DockerAction, Envelope,
};
pub use error::MessageError;
pub use intent::DockerIntent;
pub use result::{ExecResult, ResultMessage, ResultRecord};

/// Everything the routing hub can receive on its inbound queue.
#[derive(Debug, Clone)]
pub enum Message {
    Docker(DockerIntent),
    Control(ControlMessage),
    Result(ResultMessage),
}
