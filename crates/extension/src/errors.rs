//! Error types for the Ambient block extension.
//!
//! [`TelemetryError`] is the single runtime failure mode: a transmission that
//! did not reach the service or was refused by it. It is logged by the task
//! that performed the request and handed to whoever awaits the
//! [`crate::PendingTransmission`]; it never changes session state.
//!
//! [`DispatchError`] covers host invocations that cannot be mapped onto a
//! block handler at all. The session is untouched when one is produced.

use thiserror::Error;

use crate::TransmissionId;

// ---------------------------------------------------------------------------
// Transmission errors
// ---------------------------------------------------------------------------

/// A transmission that failed.
///
/// There is no retry policy: every variant is terminal for the transmission
/// that produced it. The next `send` block starts from whatever has been
/// buffered since.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TelemetryError {
    /// The request never produced an HTTP response (DNS, connect, TLS, timeout).
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the underlying client error.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("Service rejected transmission with status {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the service.
        status: u16,
        /// Response body, which Ambient uses for a short reason text.
        body: String,
    },

    /// The task carrying the request was cancelled or panicked before it
    /// could report an outcome.
    #[error("Transmission {id} aborted: {message}")]
    Aborted {
        /// The transmission that was lost.
        id: TransmissionId,
        /// Description of the join failure.
        message: String,
    },
}

impl TelemetryError {
    /// Returns the HTTP status for rejections, `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            TelemetryError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// A host invocation that could not be turned into a [`crate::BlockCommand`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The opcode does not name any block of this extension.
    #[error("Unknown opcode '{opcode}'")]
    UnknownOpcode {
        /// The opcode received from the host.
        opcode: String,
    },

    /// A required argument was absent from the host's argument object.
    #[error("Opcode '{opcode}' is missing argument '{argument}'")]
    MissingArgument {
        /// The opcode being dispatched.
        opcode: String,
        /// The declared argument name (e.g. `"CHANNELID"`).
        argument: &'static str,
    },

    /// The `DATA` menu value is not one of the eight slot labels.
    #[error("Unknown data slot '{label}'")]
    UnknownSlot {
        /// The menu value received from the host.
        label: String,
    },

    /// The host's argument value was not a JSON object.
    #[error("Arguments for opcode '{opcode}' must be an object")]
    MalformedArguments {
        /// The opcode being dispatched.
        opcode: String,
    },
}
