//! Core domain for the Ambient block extension.
//!
//! This crate contains the block handler set, the slot and buffer types, the
//! host-facing registration descriptor, and the port traits a telemetry
//! transport must implement. The `ambient` crate implements those traits over
//! HTTP; this crate never opens a connection itself.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Credential newtypes (`ChannelId`, `WriteKey`) and `TransmissionId` |
//! | [`types`] | `Slot`, `DataBuffer`, `Credentials`, `TransmissionReceipt` |
//! | [`errors`] | `TelemetryError` and `DispatchError` |
//! | [`ports`] | `TelemetryClient` and `TelemetryClientFactory` traits |
//! | [`commands`] | `BlockCommand` and host argument casts |
//! | [`session`] | `Session` (the four block handlers) and `PendingTransmission` |
//! | [`descriptor`] | `ExtensionInfo` registration metadata and translations |

pub mod commands;
pub mod descriptor;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod session;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use commands::{cast_to_number, cast_to_string, BlockCommand};
pub use descriptor::{ExtensionInfo, Locale};
pub use errors::{DispatchError, TelemetryError};
pub use identifiers::{ChannelId, TransmissionId, WriteKey};
pub use ports::{TelemetryClient, TelemetryClientFactory};
pub use session::{PendingTransmission, Session};
pub use types::{
    Credentials, DataBuffer, Slot, Timestamp, TransmissionReceipt, PLACEHOLDER_CHANNEL_ID,
    PLACEHOLDER_WRITE_KEY,
};
