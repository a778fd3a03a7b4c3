//! The control socket: a local Unix domain socket accepting one JSON
//! control message per connection, forwarded into the hub's inbound
//! queue.

pub mod error;

pub use error::ControlError;

use crate::message::{self, Message};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct ControlSocket {
    listener: UnixListener,
    path: PathBuf,
}

impl ControlSocket {
    /// Bind the socket, removing any stale socket file left behind by a
    /// previous run.
    pub async fn bind(path: &Path) -> Result<Self, ControlError> {
        let _ = std::fs::remove_file(path);
        let listener = UnixListener::bind(path).map_err(|source| ControlError::Bind {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    /// Accept connections until `token` is cancelled, forwarding every
    /// successfully decoded control message to `hub_tx`.
    pub fn spawn(self, hub_tx: mpsc::Sender<Message>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(path = %self.path.display(), "control socket listening");
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("control socket shutting down");
                        break;
                    }
                    accepted = self.listener.accept() => {
                        match accepted {
                            Ok((stream, _addr)) => {
                                let hub_tx = hub_tx.clone();
                                tokio::spawn(async move { handle_connection(stream, hub_tx).await });
                            }
                            Err(e) => tracing::warn!(error = %e, "failed to accept control connection"),
                        }
                    }
                }
            }
            let _ = std::fs::remove_file(&self.path);
        })
    }
}

async fn handle_connection(mut stream: UnixStream, hub_tx: mpsc::Sender<Message>) {
    let mut buf = Vec::new();
    if let Err(e) = stream.read_to_end(&mut buf).await {
        tracing::warn!(error = %e, "failed to read control connection");
        return;
    }
    match message::decode_control(&buf) {
        Ok(control) => {
            if hub_tx.send(Message::Control(control)).await.is_err() {
                tracing::warn!("routing hub inbound channel closed, dropping control message");
            }
        }
        Err(e) => tracing::warn!(error = %e, "malformed control message"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ControlMessage, DaemonAction};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn forwards_decoded_control_message_to_hub() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("ogre.sock");
        let socket = ControlSocket::bind(&socket_path).await.unwrap();
        let (hub_tx, mut hub_rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let _handle = socket.spawn(hub_tx, token.clone());

        let mut client = UnixStream::connect(&socket_path).await.unwrap();
        client
            .write_all(br#"{"service":"daemon","action":"stop"}"#)
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        let message = hub_rx.recv().await.unwrap();
        assert!(matches!(
            message,
            Message::Control(ControlMessage::Daemon(DaemonAction::Stop))
        ));
        token.cancel();
    }

    #[tokio::test]
    async fn removes_stale_socket_file_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("ogre.sock");
        std::fs::write(&socket_path, b"not a socket").unwrap();
        assert!(ControlSocket::bind(&socket_path).await.is_ok());
    }
}
