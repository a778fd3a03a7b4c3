//! Per-check loop: runs one [`CheckSpec`] on its own interval, either as a
//! `docker exec` inside the container or as a host subprocess.

use super::client::Client;
use crate::label::{CheckSpec, ExecutionSite};
use crate::message::{ExecResult, Message, ResultMessage};
use arc_swap::ArcSwapOption;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Shared handle onto a running check loop: its immutable spec plus the
/// most recent result, published after every tick.
pub struct CheckHandle {
    pub spec: Arc<CheckSpec>,
    last_result: ArcSwapOption<ExecResult>,
}

impl CheckHandle {
    pub fn last_result(&self) -> Option<Arc<ExecResult>> {
        self.last_result.load_full()
    }
}

/// Spawn the loop for one check. `token` is the container-scoped
/// cancellation token the hub hands out; dropping the container (or
/// stopping the daemon) cancels it and every check sharing it.
pub fn spawn(
    client: Arc<Client>,
    check: Arc<CheckSpec>,
    token: CancellationToken,
    results_tx: mpsc::Sender<Message>,
) -> (Arc<CheckHandle>, JoinHandle<()>) {
    let handle = Arc::new(CheckHandle {
        spec: check.clone(),
        last_result: ArcSwapOption::empty(),
    });
    let loop_handle = handle.clone();

    let join = tokio::spawn(async move {
        let mut interval = tokio::time::interval(check.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(check = %check.name, container = %check.container.name, "check loop stopped");
                    break;
                }
                _ = interval.tick() => {
                    let result = run_once(&client, &check).await;
                    loop_handle.last_result.store(Some(Arc::new(result.clone())));
                    let message = Message::Result(ResultMessage::new(check.clone(), result));
                    if results_tx.send(message).await.is_err() {
                        tracing::warn!(check = %check.name, "hub inbound channel closed, stopping check loop");
                        break;
                    }
                }
            }
        }
    });

    (handle, join)
}

async fn run_once(client: &Client, check: &CheckSpec) -> ExecResult {
    match check.site {
        ExecutionSite::Internal => run_internal(client, check).await,
        ExecutionSite::External => run_external(check).await,
    }
}

async fn run_internal(client: &Client, check: &CheckSpec) -> ExecResult {
    match client.exec(&check.container.id, &check.command).await {
        Ok((exit_code, stdout, stderr)) => ExecResult {
            exit_code,
            stdout,
            stderr,
            hostname: check.container.hostname.clone(),
        },
        Err(e) => {
            tracing::warn!(check = %check.name, error = %e, "internal check exec failed");
            ExecResult {
                exit_code: -1,
                stdout: Vec::new(),
                stderr: e.to_string().into_bytes(),
                hostname: check.container.hostname.clone(),
            }
        }
    }
}

async fn run_external(check: &CheckSpec) -> ExecResult {
    let Some((program, args)) = check.command.split_first() else {
        return ExecResult {
            exit_code: -1,
            stdout: Vec::new(),
            stderr: b"empty command".to_vec(),
            hostname: check.container.hostname.clone(),
        };
    };

    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
    {
        Ok(output) => ExecResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
            hostname: check.container.hostname.clone(),
        },
        Err(e) => {
            tracing::warn!(check = %check.name, error = %e, "external check failed to spawn");
            ExecResult {
                exit_code: -1,
                stdout: Vec::new(),
                stderr: e.to_string().into_bytes(),
                hostname: check.container.hostname.clone(),
            }
        }
    }
}
