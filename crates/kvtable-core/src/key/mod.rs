//! Module: key
//! Responsibility: binary keys, their order-preserving component codec, and
//! the composite `prefix ⧺ field` layout used against the host store.
//! Boundary: the only place that decides how typed values become key bytes.

mod decode;
mod encode;
mod error;
mod ordered;

pub use decode::{FromKey, KeyReader};
pub use encode::ToKey;
pub use error::{HexDecodeError, KeyDecodeError, KeyEncodeError};

use crate::name::Name;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    ops::{Add, AddAssign},
};

///
/// Constants
///

/// Status byte leading every live index prefix.
pub const PREFIX_STATUS_ACTIVE: u8 = 1;

/// Encoded prefix length: status byte + table name + index name.
pub const PREFIX_LEN: usize = 1 + 8 + 8;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

///
/// Key
///
/// Opaque, comparable byte sequence.
/// Ordering of this type must exactly match byte-level ordering.
///

#[derive(
    Clone, Default, Deref, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[deref(forward)]
pub struct Key(#[serde(with = "serde_bytes")] Vec<u8>);

impl Key {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Encode one typed value (or tuple of values) into key bytes.
    pub fn encode<T: ToKey + ?Sized>(value: &T) -> Result<Self, KeyEncodeError> {
        let mut out = Vec::new();
        value.write_key(&mut out)?;

        Ok(Self(out))
    }

    /// Decode the whole key as one typed value.
    pub fn decode<T: FromKey>(&self) -> Result<T, KeyDecodeError> {
        let mut reader = KeyReader::new(&self.0);
        let value = T::read_key(&mut reader)?;
        reader.finish()?;

        Ok(value)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Byte-level concatenation `self ⧺ suffix`.
    #[must_use]
    pub fn concat(&self, suffix: &[u8]) -> Self {
        let mut out = Vec::with_capacity(self.0.len() + suffix.len());
        out.extend_from_slice(&self.0);
        out.extend_from_slice(suffix);

        Self(out)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 2);
        for &byte in &self.0 {
            out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            out.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
        }

        out
    }

    /// Parse a hex rendering; uppercase digits are accepted.
    pub fn from_hex(text: &str) -> Result<Self, HexDecodeError> {
        let bytes = text.as_bytes();
        if bytes.len() % 2 != 0 {
            return Err(HexDecodeError::OddLength(bytes.len()));
        }

        let mut out = Vec::with_capacity(bytes.len() / 2);
        for (pair_index, pair) in bytes.chunks_exact(2).enumerate() {
            let offset = pair_index * 2;
            let hi = hex_value(pair[0], offset)?;
            let lo = hex_value(pair[1], offset + 1)?;
            out.push((hi << 4) | lo);
        }

        Ok(Self(out))
    }
}

fn hex_value(digit: u8, offset: usize) -> Result<u8, HexDecodeError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(HexDecodeError::InvalidDigit {
            ch: char::from(digit),
            offset,
        }),
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Add<&Key> for &Key {
    type Output = Key;

    fn add(self, rhs: &Key) -> Key {
        self.concat(rhs.as_bytes())
    }
}

impl Add for Key {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += &rhs;
        self
    }
}

impl AddAssign<&Self> for Key {
    fn add_assign(&mut self, rhs: &Self) {
        self.0.extend_from_slice(&rhs.0);
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.to_hex())
    }
}

///
/// Composite keys
///

/// Namespace prefix shared by every entry of one index.
#[must_use]
pub fn make_prefix(table: Name, index: Name) -> Key {
    make_prefix_with_status(PREFIX_STATUS_ACTIVE, table, index)
}

/// Namespace prefix with an explicit status byte.
#[must_use]
pub fn make_prefix_with_status(status: u8, table: Name, index: Name) -> Key {
    let mut out = Vec::with_capacity(PREFIX_LEN);
    out.push(status);
    out.extend_from_slice(&table.raw().to_be_bytes());
    out.extend_from_slice(&index.raw().to_be_bytes());

    Key(out)
}

/// Fully-qualified storage key `prefix ⧺ field_key`.
#[must_use]
pub fn table_key(prefix: &Key, field_key: &Key) -> Key {
    prefix + field_key
}

///
/// TESTS
///

#[cfg(test)]
mod tests;
