//! The default-log backend: every result destined for an unconfigured
//! platform lands here, undecorated, through the ambient logging
//! framework.

use super::Backend;
use crate::label::PlatformTarget;
use crate::message::ResultMessage;
use async_trait::async_trait;

pub struct LogBackend;

#[async_trait]
impl Backend for LogBackend {
    fn target(&self) -> PlatformTarget {
        PlatformTarget::DefaultLog
    }

    async fn send(&self, message: &ResultMessage) {
        match serde_json::to_string(&message.record()) {
            Ok(body) => tracing::info!(target: "ogre::result", "{body}"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize result for default-log backend"),
        }
    }
}
