//! Backend Fan-out: routes every [`ResultMessage`] to the sink its check
//! selected, falling back to the default-log backend for any platform
//! with no backend registered.

pub mod error;
pub mod http;
pub mod log;
pub mod prometheus;
pub mod statsd;

pub use error::BackendError;

use crate::label::PlatformTarget;
use crate::message::ResultMessage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Backend: Send + Sync {
    fn target(&self) -> PlatformTarget;
    async fn send(&self, message: &ResultMessage);
}

/// Maps a [`PlatformTarget`] to the backend responsible for it. A target
/// with no registered backend always routes to the default-log backend.
pub struct BackendTable {
    backends: HashMap<PlatformTarget, Arc<dyn Backend>>,
    default_log: Arc<dyn Backend>,
}

impl BackendTable {
    pub fn new(default_log: Arc<dyn Backend>) -> Self {
        Self {
            backends: HashMap::new(),
            default_log,
        }
    }

    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.target(), backend);
    }

    pub fn route(&self, target: PlatformTarget) -> Arc<dyn Backend> {
        self.backends
            .get(&target)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_log))
    }
}

/// Run the fan-out loop: every [`ResultMessage`] the hub forwards here is
/// routed to exactly one backend and dispatched independently, so a slow
/// sink never blocks the others.
pub async fn run(mut rx: mpsc::Receiver<ResultMessage>, table: BackendTable, token: CancellationToken) {
    let table = Arc::new(table);
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("backend fan-out shutting down");
                break;
            }
            message = rx.recv() => {
                match message {
                    Some(message) => {
                        let table = Arc::clone(&table);
                        tokio::spawn(async move {
                            let backend = table.route(message.target);
                            backend.send(&message).await;
                        });
                    }
                    None => {
                        tracing::warn!("backend fan-out inbound channel closed");
                        break;
                    }
                }
            }
        }
    }
}

/// The backend service's own inbox, separate from the hub's inbound
/// queue: the hub forwards `Message::Result` payloads here as plain
/// [`ResultMessage`]s once it has decided they're headed for a backend.
pub fn inbox() -> (mpsc::Sender<ResultMessage>, mpsc::Receiver<ResultMessage>) {
    mpsc::channel(256)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{CheckSpec, ContainerIdentity, ExecutionSite, Formatter, PlatformSpec};
    use crate::message::ExecResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingBackend {
        target: PlatformTarget,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Backend for CountingBackend {
        fn target(&self) -> PlatformTarget {
            self.target
        }

        async fn send(&self, _message: &ResultMessage) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn result_message(target: PlatformTarget) -> ResultMessage {
        let formatter = Arc::new(Formatter {
            output: Default::default(),
            platform: PlatformSpec {
                target,
                ..Default::default()
            },
        });
        let check = Arc::new(CheckSpec {
            name: "ping".to_string(),
            site: ExecutionSite::Internal,
            command: vec!["true".to_string()],
            interval: Duration::from_secs(5),
            container: ContainerIdentity {
                id: "c1".to_string(),
                name: "web".to_string(),
                hostname: "host-a".to_string(),
            },
            formatter,
        });
        ResultMessage::new(
            check,
            ExecResult {
                exit_code: 0,
                stdout: Vec::new(),
                stderr: Vec::new(),
                hostname: "host-a".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn routes_to_registered_backend() {
        let log = Arc::new(CountingBackend {
            target: PlatformTarget::DefaultLog,
            calls: AtomicUsize::new(0),
        });
        let http = Arc::new(CountingBackend {
            target: PlatformTarget::Http,
            calls: AtomicUsize::new(0),
        });
        let mut table = BackendTable::new(log.clone());
        table.register(http.clone());

        table.route(PlatformTarget::Http).send(&result_message(PlatformTarget::Http)).await;

        assert_eq!(http.calls.load(Ordering::SeqCst), 1);
        assert_eq!(log.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unregistered_target_falls_back_to_default_log() {
        let log = Arc::new(CountingBackend {
            target: PlatformTarget::DefaultLog,
            calls: AtomicUsize::new(0),
        });
        let table = BackendTable::new(log.clone());

        table
            .route(PlatformTarget::Prometheus)
            .send(&result_message(PlatformTarget::Prometheus))
            .await;

        assert_eq!(log.calls.load(Ordering::SeqCst), 1);
    }
}
