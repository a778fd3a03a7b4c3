//! Hand-rolled statsd client: every check outcome becomes a `<name>:<exit
//! code>|c` counter increment sent over UDP, no client crate involved.

use super::error::BackendError;
use super::Backend;
use crate::label::PlatformTarget;
use crate::message::ResultMessage;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

pub struct StatsdBackend {
    socket: UdpSocket,
    server: SocketAddr,
    prefix: String,
}

impl StatsdBackend {
    pub async fn connect(server: SocketAddr, prefix: String) -> Result<Self, BackendError> {
        let bind_addr: SocketAddr = if server.is_ipv6() {
            "[::]:0".parse().expect("valid unspecified ipv6 bind address")
        } else {
            "0.0.0.0:0".parse().expect("valid unspecified ipv4 bind address")
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        Ok(Self {
            socket,
            server,
            prefix,
        })
    }

}

#[async_trait]
impl Backend for StatsdBackend {
    fn target(&self) -> PlatformTarget {
        PlatformTarget::Statsd
    }

    async fn send(&self, message: &ResultMessage) {
        let name = metric_name(&self.prefix, &message.check.name);
        let frame = format!("{name}:{}|c", message.result.exit_code);
        if let Err(e) = self.socket.send_to(frame.as_bytes(), self.server).await {
            tracing::warn!(error = %e, server = %self.server, "failed to send statsd frame");
        }
    }
}

fn metric_name(prefix: &str, check_name: &str) -> String {
    if prefix.is_empty() {
        check_name.to_string()
    } else {
        format!("{prefix}.{check_name}")
    }
}
