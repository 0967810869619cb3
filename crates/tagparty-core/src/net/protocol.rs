use serde::{Deserialize, Serialize};

use crate::mode_registry::ModeId;

/// Maximum snapshot size in bytes.
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMode(u8),
    ModeMismatch { expected: ModeId, found: ModeId },
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMode(b) => write!(f, "unknown mode tag: 0x{b:02x}"),
            Self::ModeMismatch { expected, found } => {
                write!(f, "snapshot for {found} delivered to {expected}")
            },
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_SNAPSHOT_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// A byte on the wire that does not name a variant of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidByte {
    pub kind: &'static str,
    pub value: u8,
}

impl std::fmt::Display for InvalidByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} byte: {}", self.kind, self.value)
    }
}

impl std::error::Error for InvalidByte {}

/// Encode a snapshot as a 1-byte mode tag followed by its MessagePack fields.
///
/// rmp-serde writes structs as arrays, so the payload is the struct's fields
/// in declaration order with no names attached.
pub fn encode_snapshot<T: Serialize>(mode: ModeId, snapshot: &T) -> Result<Vec<u8>, ProtocolError> {
    let payload =
        rmp_serde::to_vec(snapshot).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload.len();
    if total > MAX_SNAPSHOT_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(mode as u8);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Read the mode tag from raw snapshot bytes.
pub fn decode_mode(data: &[u8]) -> Result<ModeId, ProtocolError> {
    let Some(&tag) = data.first() else {
        return Err(ProtocolError::EmptyMessage);
    };
    ModeId::from_byte(tag).ok_or(ProtocolError::UnknownMode(tag))
}

/// Decode a snapshot, checking that it was produced by `expected`.
pub fn decode_snapshot<T: for<'de> Deserialize<'de>>(
    expected: ModeId,
    data: &[u8],
) -> Result<T, ProtocolError> {
    if data.len() > MAX_SNAPSHOT_SIZE {
        return Err(ProtocolError::PayloadTooLarge(data.len()));
    }
    let found = decode_mode(data)?;
    if found != expected {
        return Err(ProtocolError::ModeMismatch { expected, found });
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}
