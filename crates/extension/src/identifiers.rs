//! Newtype domain identifiers.
//!
//! The two credential strings are represented as distinct newtypes so a
//! [`ChannelId`] can never be passed where a [`WriteKey`] is expected, even
//! though both are opaque strings under the hood. Neither is validated: the
//! Ambient service is the only authority on whether a credential is usable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for opaque String-wrapped credentials.
// Generates: struct, new(), as_str(), From<&str>/From<String>.
// Debug and Display are left to the caller so secrets can redact them.
// ---------------------------------------------------------------------------
macro_rules! credential {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps the value without any validation; empty strings are accepted.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the credential as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

credential! {
    /// Identifies the Ambient channel that receives the data.
    ///
    /// Ambient assigns channel ids as decimal integers, but the host passes
    /// whatever the user typed into the block, so the value stays a string.
    ChannelId
}

credential! {
    /// Write key authorising data submission to a channel.
    ///
    /// `Debug` and `Display` never reveal the key.
    WriteKey
}

impl std::fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ChannelId").field(&self.0).finish()
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for WriteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WriteKey(<redacted>)")
    }
}

impl std::fmt::Display for WriteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single transmission (one invocation of the `send` block).
///
/// Generated fresh for every send; recorded on the `ambient.send` span and in
/// the [`crate::TransmissionReceipt`] so log lines from the spawned request can
/// be correlated with the dispatch that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransmissionId(Uuid);

impl TransmissionId {
    /// Generates a new random transmission identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TransmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_key_is_redacted() {
        let key = WriteKey::new("s3cr3t");
        assert_eq!(format!("{key:?}"), "WriteKey(<redacted>)");
        assert_eq!(key.to_string(), "<redacted>");
        assert_eq!(key.as_str(), "s3cr3t");
    }

    #[test]
    fn test_channel_id_accepts_any_string() {
        assert_eq!(ChannelId::new("").as_str(), "");
        assert_eq!(ChannelId::from("Channel ID").to_string(), "Channel ID");
    }

    #[test]
    fn test_credentials_serialize_as_plain_strings() {
        let json = serde_json::to_string(&ChannelId::new("123")).unwrap();
        assert_eq!(json, "\"123\"");
    }

    #[test]
    fn test_transmission_ids_are_unique() {
        assert_ne!(TransmissionId::new_random(), TransmissionId::new_random());
    }
}
