//! HTTP POST backend: forwards the result record as a JSON body to a
//! configured URL. Non-2xx responses and transport errors are logged and
//! swallowed — this sink never blocks the hub on a downstream outage.

use super::Backend;
use crate::label::PlatformTarget;
use crate::message::ResultMessage;
use async_trait::async_trait;

pub struct HttpBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpBackend {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn target(&self) -> PlatformTarget {
        PlatformTarget::Http
    }

    async fn send(&self, message: &ResultMessage) {
        let record = message.record();
        match self.client.post(&self.url).json(&record).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    status = %response.status(),
                    url = %self.url,
                    "http backend received a non-success response"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, url = %self.url, "http backend request failed");
            }
        }
    }
}
