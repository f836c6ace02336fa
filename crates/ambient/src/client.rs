use std::sync::Arc;

use async_trait::async_trait;
use extension::{
    Credentials, DataBuffer, TelemetryClient, TelemetryClientFactory, TelemetryError,
    Timestamp, TransmissionId, TransmissionReceipt,
};
use reqwest::Url;
use serde::Serialize;
use tracing::debug;

use crate::config::{AmbientConfig, ClientBuildError};

/// JSON body of a data submission: the write key next to the slot values.
#[derive(Serialize)]
struct SendBody<'a> {
    #[serde(rename = "writeKey")]
    write_key: &'a str,
    #[serde(flatten)]
    data: &'a DataBuffer,
}

/// Builds [`AmbientClient`]s that share one connection pool.
#[derive(Debug, Clone)]
pub struct AmbientClientFactory {
    http: reqwest::Client,
    base_url: Url,
}

impl AmbientClientFactory {
    /// Creates a factory from connection settings.
    pub fn new(config: &AmbientConfig) -> Result<Self, ClientBuildError> {
        let base_url = config.parsed_base_url()?;
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    /// The base URL every client posts under.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl TelemetryClientFactory for AmbientClientFactory {
    fn connect(&self, credentials: Credentials) -> Arc<dyn TelemetryClient> {
        Arc::new(AmbientClient::new(
            self.http.clone(),
            &self.base_url,
            credentials,
        ))
    }
}

/// Client bound to one channel and write key.
#[derive(Debug, Clone)]
pub struct AmbientClient {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
}

impl AmbientClient {
    /// Creates a client posting to `{base_url}/api/v2/channels/{channel_id}/data`.
    ///
    /// The channel id is percent-encoded as a single path segment.
    pub fn new(http: reqwest::Client, base_url: &Url, credentials: Credentials) -> Self {
        let endpoint = data_endpoint(base_url, credentials.channel_id.as_str());
        Self {
            http,
            endpoint,
            credentials,
        }
    }
}

fn data_endpoint(base_url: &Url, channel_id: &str) -> Url {
    let mut url = base_url.clone();
    // http(s) URLs always have a path; `AmbientConfig::parsed_base_url` rejects the rest.
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["api", "v2", "channels", channel_id, "data"]);
    }
    url
}

#[async_trait]
impl TelemetryClient for AmbientClient {
    async fn send(
        &self,
        id: TransmissionId,
        data: &DataBuffer,
    ) -> Result<TransmissionReceipt, TelemetryError> {
        let body = SendBody {
            write_key: self.credentials.write_key.as_str(),
            data,
        };
        debug!(endpoint = %self.endpoint, slots = data.len(), "Posting data to Ambient");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| TelemetryError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TelemetryError::Transport {
                message: e.to_string(),
            })?;
        debug!(status = status.as_u16(), "Ambient responded");

        if !status.is_success() {
            return Err(TelemetryError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(TransmissionReceipt {
            id,
            channel_id: self.credentials.channel_id.clone(),
            status: status.as_u16(),
            slots: data.len(),
            body: text,
            completed_at: Timestamp::now(),
        })
    }

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}
