//! The Prometheus backend: a vector counter keyed by `{host, check,
//! health}`, reset on every tick so only the most recent outcome is
//! ever visible, scraped over HTTP.

use super::error::BackendError;
use super::Backend;
use crate::label::PlatformTarget;
use crate::message::ResultMessage;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const FALLBACK_METRIC: &str = "ogre_metric";

pub struct PrometheusBackend {
    registry: Registry,
    counters: Mutex<HashMap<String, IntCounterVec>>,
}

impl PrometheusBackend {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn counter_for(&self, metric_name: &str) -> IntCounterVec {
        let mut counters = self.counters.lock().unwrap();
        if let Some(counter) = counters.get(metric_name) {
            return counter.clone();
        }
        match self.register_counter(metric_name) {
            Ok(counter) => {
                counters.insert(metric_name.to_string(), counter.clone());
                counter
            }
            Err(e) => {
                tracing::warn!(metric = %metric_name, error = %e, "invalid prometheus metric name, falling back");
                counters
                    .entry(FALLBACK_METRIC.to_string())
                    .or_insert_with(|| {
                        self.register_counter(FALLBACK_METRIC)
                            .expect("fallback metric name is a valid prometheus identifier")
                    })
                    .clone()
            }
        }
    }

    fn register_counter(&self, metric_name: &str) -> Result<IntCounterVec, BackendError> {
        let counter = IntCounterVec::new(
            Opts::new(metric_name, "1 for the most recent unhealthy run of a check"),
            &["host", "check", "health"],
        )?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    /// Render the current state of every registered metric as Prometheus
    /// text exposition format.
    pub fn gather(&self) -> String {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode prometheus metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for PrometheusBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for PrometheusBackend {
    fn target(&self) -> PlatformTarget {
        PlatformTarget::Prometheus
    }

    async fn send(&self, message: &ResultMessage) {
        let counter = self.counter_for(&message.check.formatter.platform.prometheus_metric);
        counter.reset();
        if !message.result.healthy() {
            counter
                .with_label_values(&[&message.result.hostname, &message.check.name, "unhealthy"])
                .inc();
        }
    }
}

/// Run the `/metrics` scrape server until `token` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    backend: Arc<PrometheusBackend>,
    token: CancellationToken,
) -> std::io::Result<()> {
    let app = Router::new()
        .route("/metrics", get(scrape))
        .with_state(backend);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "prometheus scrape endpoint listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
}

async fn scrape(State(backend): State<Arc<PrometheusBackend>>) -> impl IntoResponse {
    (StatusCode::OK, backend.gather())
}
