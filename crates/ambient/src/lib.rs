//! Ambient telemetry client adapter.
//!
//! Implements the [`extension::TelemetryClient`] and
//! [`extension::TelemetryClientFactory`] traits over the Ambient HTTP API.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request building, JSON encoding, and response
//! classification all live here. The [`extension`] crate sees only the traits.
//!
//! ## Wire Format
//!
//! One `send` is one request:
//!
//! ```text
//! POST {base_url}/api/v2/channels/{channel_id}/data
//! Content-Type: application/json
//!
//! {"writeKey": "<key>", "d1": 20.5, "d3": 1.0}
//! ```
//!
//! Only buffered slots appear in the body. Any 2xx status is a success.

mod client;
mod config;

pub use client::{AmbientClient, AmbientClientFactory};
pub use config::{AmbientConfig, ClientBuildError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
