//! Module: serialize::envelope
//! Responsibility: the stored-value layout for table records.
//! Boundary: wrapped records carry a leading varuint32 discriminant `0`;
//! self-tagged (enum) records carry only their own variant index.

use crate::serialize::{SerializeError, cbor};
use serde::{Serialize, de::DeserializeOwned};

const WRAPPED_DISCRIMINANT: u32 = 0;

///
/// RecordEnvelope
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordEnvelope {
    /// Discriminant `0` ahead of the payload.
    Wrapped,

    /// Payload only; the value serializes its own discriminant.
    SelfTagged,
}

///
/// Record
///
/// A typed value stored in a table.
/// Enum records that should use their own variant index as the stored
/// discriminant override `ENVELOPE` with [`RecordEnvelope::SelfTagged`].
///

pub trait Record: Serialize + DeserializeOwned {
    const ENVELOPE: RecordEnvelope = RecordEnvelope::Wrapped;
}

/// Encode a record into a buffer allocated once at its exact size.
pub(crate) fn encode_record<R: Record>(record: &R) -> Result<Vec<u8>, SerializeError> {
    let header = match R::ENVELOPE {
        RecordEnvelope::Wrapped => varuint32_len(WRAPPED_DISCRIMINANT),
        RecordEnvelope::SelfTagged => 0,
    };
    let size = header + cbor::packed_size(record)?;

    let mut out = Vec::with_capacity(size);
    if R::ENVELOPE == RecordEnvelope::Wrapped {
        push_varuint32(&mut out, WRAPPED_DISCRIMINANT);
    }
    cbor::serialize_into(&mut out, record)?;
    debug_assert_eq!(out.len(), size, "packed size disagrees with encoded length");

    Ok(out)
}

/// Decode a stored record, checking the envelope discriminant.
pub(crate) fn decode_record<R: Record>(bytes: &[u8], max_bytes: usize) -> Result<R, SerializeError> {
    let payload = match R::ENVELOPE {
        RecordEnvelope::Wrapped => {
            let (found, used) = read_varuint32(bytes)?;
            if found != WRAPPED_DISCRIMINANT {
                return Err(SerializeError::Discriminant { found });
            }
            &bytes[used..]
        }
        RecordEnvelope::SelfTagged => bytes,
    };

    cbor::deserialize_bounded(payload, max_bytes)
}

fn varuint32_len(mut value: u32) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

#[expect(clippy::cast_possible_truncation)]
fn push_varuint32(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_varuint32(bytes: &[u8]) -> Result<(u32, usize), SerializeError> {
    let mut value: u32 = 0;

    for (i, &byte) in bytes.iter().enumerate().take(5) {
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(SerializeError::Deserialize(
        "truncated or overlong discriminant".into(),
    ))
}

///
/// TESTS
///
