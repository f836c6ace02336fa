//! Connection settings for the Ambient HTTP API.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

/// Public Ambient endpoint.
pub const DEFAULT_BASE_URL: &str = "https://ambidata.io";

/// Request timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every client a factory builds.
///
/// Deserialises from the `[ambient]` table of the CLI configuration file; every
/// field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientConfig {
    /// Scheme and host (optionally a path prefix) the API lives under.
    pub base_url: String,
    /// Whole-request timeout in seconds. `0` disables the timeout.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: concat!("ambient-blocks/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AmbientConfig {
    /// Returns a config pointing at `base_url` with default settings otherwise.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// The request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Parses and checks [`AmbientConfig::base_url`].
    ///
    /// Only `http` and `https` URLs are accepted.
    pub fn parsed_base_url(&self) -> Result<Url, ClientBuildError> {
        let url = Url::parse(&self.base_url).map_err(|e| ClientBuildError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientBuildError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

/// Failure to construct an [`crate::AmbientClientFactory`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The configured base URL is unusable.
    #[error("Invalid Ambient base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be initialised (e.g. TLS backend failure).
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
