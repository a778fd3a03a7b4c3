//! Container Watcher: enumerates already-running containers at startup,
//! then translates Docker engine lifecycle events into [`DockerIntent`]s
//! for the hub.

use super::client::Client;
use super::error::DockerError;
use crate::label::{self, ContainerIdentity};
use crate::message::{DockerIntent, Message};
use bollard::models::EventMessageTypeEnum;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Control verbs the watcher's own event loop accepts from the control
/// socket, distinct from per-container check scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherControl {
    Pause,
    Resume,
}

pub struct Watcher {
    client: Arc<Client>,
    hub_tx: mpsc::Sender<Message>,
}

impl Watcher {
    pub fn new(client: Arc<Client>, hub_tx: mpsc::Sender<Message>) -> Self {
        Self { client, hub_tx }
    }

    /// List running containers, fetch each one's full inspect, and emit
    /// a `StartChecks` intent for every one carrying at least one
    /// `ogre.health.*` label.
    pub async fn enumerate(&self) -> Result<(), DockerError> {
        let containers = self.client.list_running_containers().await?;
        for summary in containers {
            let Some(id) = summary.id else { continue };
            let inspect = match self.client.inspect(&id).await {
                Ok(inspect) => inspect,
                Err(e) => {
                    tracing::warn!(container_id = %id, error = %e, "failed to inspect running container");
                    continue;
                }
            };
            if let Some(intent) = intent_for_inspect(&id, &inspect) {
                if self.hub_tx.send(Message::Docker(intent)).await.is_err() {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Run the event-subscription loop until `token` is cancelled.
    /// `control_rx` carries pause/resume requests from the control
    /// socket: while paused, engine events are drained without acting on
    /// them.
    pub fn spawn(
        self: Arc<Self>,
        token: CancellationToken,
        mut control_rx: mpsc::Receiver<WatcherControl>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let client = Arc::clone(&self.client);
            let mut stream = client.subscribe_events();
            let mut paused = false;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("container watcher shutting down");
                        break;
                    }
                    Some(ctrl) = control_rx.recv() => {
                        paused = match ctrl {
                            WatcherControl::Pause => {
                                tracing::info!("container watcher paused");
                                true
                            }
                            WatcherControl::Resume => {
                                tracing::info!("container watcher resumed");
                                false
                            }
                        };
                    }
                    Some(event) = stream.next() => {
                        if paused {
                            continue;
                        }
                        match event {
                            Ok(event) => self.handle_event(event).await,
                            Err(e) => tracing::warn!(error = %e, "docker event stream error"),
                        }
                    }
                }
            }
        })
    }

    async fn handle_event(&self, event: bollard::models::EventMessage) {
        if event.typ != Some(EventMessageTypeEnum::CONTAINER) {
            return;
        }
        let Some(action) = event.action.as_deref() else {
            return;
        };
        let Some(actor) = event.actor else {
            return;
        };
        let Some(container_id) = actor.id else {
            return;
        };

        match action {
            "start" => match self.client.inspect(&container_id).await {
                Ok(inspect) => {
                    if let Some(intent) = intent_for_inspect(&container_id, &inspect) {
                        let _ = self.hub_tx.send(Message::Docker(intent)).await;
                    }
                }
                Err(e) => tracing::warn!(container_id = %container_id, error = %e, "failed to inspect started container"),
            },
            "die" | "stop" | "kill" => {
                let _ = self
                    .hub_tx
                    .send(Message::Docker(DockerIntent::StopChecks { container_id }))
                    .await;
            }
            "health_status: healthy" | "health_status: unhealthy" => {
                tracing::debug!(container_id = %container_id, action = %action, "docker-native health status event observed");
            }
            "restart" => {
                tracing::info!(container_id = %container_id, "container restarted");
            }
            _ => {}
        }
    }
}

fn intent_for_inspect(
    container_id: &str,
    inspect: &bollard::models::ContainerInspectResponse,
) -> Option<DockerIntent> {
    let name = inspect
        .name
        .clone()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| container_id.to_string());
    let labels = inspect
        .config
        .as_ref()
        .and_then(|c| c.labels.clone())
        .unwrap_or_default();
    build_intent(container_id.to_string(), name, labels)
}

fn build_intent(
    id: String,
    name: String,
    labels: std::collections::HashMap<String, String>,
) -> Option<DockerIntent> {
    let identity = ContainerIdentity {
        id: id.clone(),
        name,
        hostname: id.chars().take(12).collect(),
    };
    let (checks, _formatter) = label::parse_labels(&labels, identity);
    if checks.is_empty() {
        return None;
    }
    Some(DockerIntent::StartChecks {
        container_id: id,
        checks: checks.into_iter().map(Arc::new).collect(),
    })
}
