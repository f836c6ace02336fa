//! Port traits implemented by infrastructure crates.
//!
//! The session never talks HTTP itself. It asks a [`TelemetryClientFactory`]
//! for a client whenever the `init` block supplies credentials, and hands the
//! buffered data to that client's [`TelemetryClient::send`]. The `ambient`
//! crate provides the production implementation; tests substitute recorders.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Credentials, DataBuffer, TelemetryError, TransmissionId, TransmissionReceipt};

/// A client bound to one credential pair.
#[async_trait]
pub trait TelemetryClient: Send + Sync {
    /// Transmits `data` in a single request.
    ///
    /// An empty buffer is still transmitted. Implementations must not retry.
    async fn send(
        &self,
        id: TransmissionId,
        data: &DataBuffer,
    ) -> Result<TransmissionReceipt, TelemetryError>;

    /// The credentials this client was constructed with.
    fn credentials(&self) -> &Credentials;
}

/// Builds telemetry clients for a credential pair.
///
/// Construction is infallible and performs no I/O: a bad credential surfaces
/// only when the resulting client sends.
pub trait TelemetryClientFactory: Send + Sync {
    /// Returns a client that writes with `credentials`.
    fn connect(&self, credentials: Credentials) -> Arc<dyn TelemetryClient>;
}
