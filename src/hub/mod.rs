//! The Routing Hub: the single owner of the running-checks table and the
//! only task that dispatches a [`Message`] to its destination service.

use crate::docker::{scheduler, Client, WatcherControl};
use crate::label::CheckSpec;
use crate::message::{ControlMessage, DaemonAction, DockerAction, DockerIntent, Message, ResultMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct ContainerChecks {
    token: CancellationToken,
    check_count: usize,
}

/// Owns `running_checks: container id -> cancel handle` exclusively;
/// nothing outside this module ever touches that table.
pub struct RoutingHub {
    inbound_rx: mpsc::Receiver<Message>,
    inbound_tx: mpsc::Sender<Message>,
    backend_tx: mpsc::Sender<ResultMessage>,
    watcher_control_tx: mpsc::Sender<WatcherControl>,
    docker_client: Arc<Client>,
    docker_scope: CancellationToken,
    daemon_scope: CancellationToken,
    running_checks: HashMap<String, ContainerChecks>,
}

impl RoutingHub {
    pub fn new(
        inbound_rx: mpsc::Receiver<Message>,
        inbound_tx: mpsc::Sender<Message>,
        backend_tx: mpsc::Sender<ResultMessage>,
        watcher_control_tx: mpsc::Sender<WatcherControl>,
        docker_client: Arc<Client>,
        docker_scope: CancellationToken,
        daemon_scope: CancellationToken,
    ) -> Self {
        Self {
            inbound_rx,
            inbound_tx,
            backend_tx,
            watcher_control_tx,
            docker_client,
            docker_scope,
            daemon_scope,
            running_checks: HashMap::new(),
        }
    }

    /// A sender any producer (watcher, scheduler, control socket) can use
    /// to reach the hub's single inbound queue.
    pub fn inbound(&self) -> mpsc::Sender<Message> {
        self.inbound_tx.clone()
    }

    /// Drain the inbound queue until the daemon scope is cancelled.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.daemon_scope.cancelled() => {
                    tracing::info!("routing hub stopping: daemon scope cancelled");
                    break;
                }
                message = self.inbound_rx.recv() => {
                    match message {
                        Some(message) => self.dispatch(message).await,
                        None => {
                            tracing::warn!("routing hub inbound channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }
        self.shutdown_checks();
    }

    async fn dispatch(&mut self, message: Message) {
        match message {
            Message::Docker(intent) => self.handle_intent(intent).await,
            Message::Result(result) => {
                if self.backend_tx.send(result).await.is_err() {
                    tracing::warn!("backend service inbox closed, dropping result");
                }
            }
            Message::Control(control) => self.handle_control(control).await,
        }
    }

    async fn handle_intent(&mut self, intent: DockerIntent) {
        match intent {
            DockerIntent::StartChecks { container_id, checks } => {
                if self.running_checks.contains_key(&container_id) {
                    tracing::debug!(
                        container_id = %container_id,
                        "checks already scheduled for this container, ignoring duplicate start"
                    );
                    return;
                }
                self.start_checks(container_id, checks);
            }
            DockerIntent::StopChecks { container_id } => {
                if let Some(entry) = self.running_checks.remove(&container_id) {
                    tracing::info!(container_id = %container_id, "cancelling checks for stopped container");
                    entry.token.cancel();
                }
            }
        }
    }

    fn start_checks(&mut self, container_id: String, checks: Vec<Arc<CheckSpec>>) {
        let token = self.docker_scope.child_token();
        let check_count = checks.len();
        for check in checks {
            let (_handle, _join) = scheduler::spawn(
                Arc::clone(&self.docker_client),
                check,
                token.clone(),
                self.inbound_tx.clone(),
            );
        }
        tracing::info!(container_id = %container_id, checks = check_count, "scheduled checks for container");
        self.running_checks
            .insert(container_id, ContainerChecks { token, check_count });
    }

    async fn handle_control(&mut self, control: ControlMessage) {
        match control {
            ControlMessage::Daemon(DaemonAction::Stop) => {
                tracing::info!("daemon stop requested via control socket");
                self.daemon_scope.cancel();
            }
            ControlMessage::Docker(action) => {
                let verb = match action {
                    DockerAction::Start => WatcherControl::Resume,
                    DockerAction::Stop => WatcherControl::Pause,
                };
                if self.watcher_control_tx.send(verb).await.is_err() {
                    tracing::warn!("container watcher control channel closed");
                }
            }
            ControlMessage::Backend(never) => match never {},
        }
    }

    fn shutdown_checks(&mut self) {
        for (container_id, entry) in self.running_checks.drain() {
            tracing::debug!(
                container_id = %container_id,
                checks = entry.check_count,
                "cancelling checks on hub shutdown"
            );
            entry.token.cancel();
        }
    }
}
