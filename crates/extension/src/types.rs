//! Shared value types for the Ambient block extension.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! invariants: a [`Slot`] is always one of the eight Ambient data fields, and a
//! [`DataBuffer`] can therefore never hold more than eight values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChannelId, TransmissionId, WriteKey};

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// One of the eight named data fields of an Ambient channel.
///
/// Serialises as its lowercase label (`"d1"` … `"d8"`), which is also the JSON
/// key Ambient expects in the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
}

impl Slot {
    /// Every slot, in label order.
    pub const ALL: [Slot; 8] = [
        Slot::D1,
        Slot::D2,
        Slot::D3,
        Slot::D4,
        Slot::D5,
        Slot::D6,
        Slot::D7,
        Slot::D8,
    ];

    /// Returns the slot's label as used on the wire and in the block menu.
    pub fn label(self) -> &'static str {
        match self {
            Slot::D1 => "d1",
            Slot::D2 => "d2",
            Slot::D3 => "d3",
            Slot::D4 => "d4",
            Slot::D5 => "d5",
            Slot::D6 => "d6",
            Slot::D7 => "d7",
            Slot::D8 => "d8",
        }
    }

    /// Resolves a menu value to a slot.
    ///
    /// Accepts `d1` … `d8` in any case, and the bare indices `1` … `8` that some
    /// hosts send when a menu value is replaced by a number. Surrounding
    /// whitespace is ignored. Returns `None` for anything else.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let index = label
            .strip_prefix('d')
            .or_else(|| label.strip_prefix('D'))
            .unwrap_or(label);
        match index {
            "1" => Some(Slot::D1),
            "2" => Some(Slot::D2),
            "3" => Some(Slot::D3),
            "4" => Some(Slot::D4),
            "5" => Some(Slot::D5),
            "6" => Some(Slot::D6),
            "7" => Some(Slot::D7),
            "8" => Some(Slot::D8),
            _ => None,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Data buffer
// ---------------------------------------------------------------------------

/// Values waiting to be transmitted, keyed by [`Slot`].
///
/// Assigning to a slot that already holds a value overwrites it. Serialises as
/// a flat JSON object (`{"d1": 20.5, "d3": 1.0}`) containing only the slots that
/// were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataBuffer(BTreeMap<Slot, f64>);

impl DataBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` in `slot`, returning the value it replaced, if any.
    pub fn set(&mut self, slot: Slot, value: f64) -> Option<f64> {
        self.0.insert(slot, value)
    }

    /// Returns the value buffered for `slot`.
    pub fn get(&self, slot: Slot) -> Option<f64> {
        self.0.get(&slot).copied()
    }

    /// Discards every buffered value.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Moves the buffered values out, leaving this buffer empty.
    pub fn take(&mut self) -> DataBuffer {
        std::mem::take(self)
    }

    /// Number of slots currently holding a value (at most eight).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no slot holds a value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over buffered values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, f64)> + '_ {
        self.0.iter().map(|(slot, value)| (*slot, *value))
    }
}

impl FromIterator<(Slot, f64)> for DataBuffer {
    fn from_iter<I: IntoIterator<Item = (Slot, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Default text of the `CHANNELID` block argument.
pub const PLACEHOLDER_CHANNEL_ID: &str = "Channel ID";

/// Default text of the `WRITEKEY` block argument.
pub const PLACEHOLDER_WRITE_KEY: &str = "Write Key";

/// The credential pair a telemetry client is constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Destination channel.
    pub channel_id: ChannelId,
    /// Key authorising writes to `channel_id`.
    pub write_key: WriteKey,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(channel_id: impl Into<ChannelId>, write_key: impl Into<WriteKey>) -> Self {
        Self {
            channel_id: channel_id.into(),
            write_key: write_key.into(),
        }
    }

    /// The credentials a session uses before the `init` block has run.
    ///
    /// These are the block's default argument texts, so a send before `init`
    /// reaches the service and is rejected there rather than locally.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_CHANNEL_ID, PLACEHOLDER_WRITE_KEY)
    }

    /// Returns `true` if both values are the placeholder texts.
    pub fn is_placeholder(&self) -> bool {
        self.channel_id.as_str() == PLACEHOLDER_CHANNEL_ID
            && self.write_key.as_str() == PLACEHOLDER_WRITE_KEY
    }
}

// ---------------------------------------------------------------------------
// Transmission results
// ---------------------------------------------------------------------------

/// Outcome of a transmission that reached the service and was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionReceipt {
    /// Correlates this receipt with the `ambient.send` span.
    pub id: TransmissionId,
    /// Channel the data was written to.
    pub channel_id: ChannelId,
    /// HTTP status code returned by the service.
    pub status: u16,
    /// Number of slots carried in the payload.
    pub slots: usize,
    /// Raw response body (Ambient normally returns an empty body).
    pub body: String,
    /// When the response was received.
    pub completed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
