//! Block commands and host argument decoding.
//!
//! The host identifies a block by its opcode string and passes a JSON object
//! whose field names are the block's declared argument names. [`BlockCommand::from_host`]
//! turns that pair into a typed command so the session can dispatch with a
//! plain `match`.
//!
//! Argument values arrive already coerced by the host's type system, but the
//! host is lenient (a number field may still carry `"12"` or `""`), so the same
//! lenient casts are applied here: see [`cast_to_number`] and [`cast_to_string`].

use serde_json::{Map, Value};

use crate::{DispatchError, Slot};

/// Opcode of the `init` block.
pub const OPCODE_INIT: &str = "ambientInit";
/// Opcode of the `setData` block.
pub const OPCODE_SET_DATA: &str = "ambientSetData";
/// Opcode of the `send` block.
pub const OPCODE_SEND: &str = "ambientSend";
/// Opcode of the `clear` block.
pub const OPCODE_CLEAR: &str = "ambientClear";

/// Argument names, as declared in the block descriptors.
pub mod args {
    pub const CHANNEL_ID: &str = "CHANNELID";
    pub const WRITE_KEY: &str = "WRITEKEY";
    pub const DATA: &str = "DATA";
    pub const VALUE: &str = "VALUE";
}

/// A decoded block invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockCommand {
    /// Construct a client for the given credentials.
    Init {
        /// Raw `CHANNELID` text.
        channel_id: String,
        /// Raw `WRITEKEY` text.
        write_key: String,
    },
    /// Buffer `value` in `slot`.
    SetData {
        /// Target slot from the `DATA` menu.
        slot: Slot,
        /// Value from the `VALUE` argument.
        value: f64,
    },
    /// Transmit and clear the buffer.
    Send,
    /// Discard the buffer.
    Clear,
}

impl BlockCommand {
    /// Decodes a host invocation.
    ///
    /// `args` may be `Value::Null` for blocks without arguments. Extra fields
    /// are ignored, as the host adds bookkeeping fields of its own.
    pub fn from_host(opcode: &str, args: &Value) -> Result<Self, DispatchError> {
        let empty = Map::new();
        let fields = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(DispatchError::MalformedArguments {
                    opcode: opcode.to_string(),
                })
            }
        };
        let require = |name: &'static str| {
            fields
                .get(name)
                .ok_or_else(|| DispatchError::MissingArgument {
                    opcode: opcode.to_string(),
                    argument: name,
                })
        };

        match opcode {
            OPCODE_INIT => Ok(BlockCommand::Init {
                channel_id: cast_to_string(require(args::CHANNEL_ID)?),
                write_key: cast_to_string(require(args::WRITE_KEY)?),
            }),
            OPCODE_SET_DATA => {
                let label = cast_to_string(require(args::DATA)?);
                let slot = Slot::from_label(&label)
                    .ok_or(DispatchError::UnknownSlot { label })?;
                Ok(BlockCommand::SetData {
                    slot,
                    value: cast_to_number(require(args::VALUE)?),
                })
            }
            OPCODE_SEND => Ok(BlockCommand::Send),
            OPCODE_CLEAR => Ok(BlockCommand::Clear),
            other => Err(DispatchError::UnknownOpcode {
                opcode: other.to_string(),
            }),
        }
    }

    /// The opcode this command was decoded from.
    pub fn opcode(&self) -> &'static str {
        match self {
            BlockCommand::Init { .. } => OPCODE_INIT,
            BlockCommand::SetData { .. } => OPCODE_SET_DATA,
            BlockCommand::Send => OPCODE_SEND,
            BlockCommand::Clear => OPCODE_CLEAR,
        }
    }
}

/// Casts a host value to a number.
///
/// Numbers pass through, strings follow the host's numeric-string grammar
/// (`"0x1F"` is 31, `"inf"` is not a number), booleans become `1`/`0`.
/// Everything else, including unparsable strings, becomes `0`.
pub fn cast_to_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_numeric_string(s).unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

/// Parses a string the way the host's `Number()` conversion does.
///
/// Surrounding whitespace is ignored and a blank string is `0`. Accepts decimal
/// and exponent notation, unsigned `0x`/`0o`/`0b` integer literals, and the
/// exact words `Infinity`, `+Infinity`, `-Infinity`. Rust-only spellings such
/// as `inf` or `nan` are rejected.
fn parse_numeric_string(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    match text {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &text[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        return u128::from_str_radix(digits, radix).ok().map(|n| n as f64);
    }

    let lower = text.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Casts a host value to a string.
///
/// `null` becomes the empty string; arrays and objects use their JSON text.
pub fn cast_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
