#![expect(clippy::cast_possible_truncation)]
//! Packed 64-bit identifiers for tables, indices, contracts and databases.
//!
//! Invariants:
//! - Text form is at most 13 characters from [`NAME_CHARSET`]; the 13th
//!   character is limited to the first 16 symbols.
//! - Numeric order of the packed value matches the order of the text form.
//! - All construction paths validate invariants.

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{
    fmt::{self, Display},
    str::FromStr,
};
use thiserror::Error as ThisError;

///
/// Constants
///

pub const NAME_CHARSET: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

pub(crate) const MAX_NAME_LEN: usize = 13;
const SYMBOL_BITS: u32 = 5;
const LAST_SYMBOL_MAX: u64 = 0x0F;

///
/// NameError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum NameError {
    #[error("name '{name}' is longer than {max} characters")]
    TooLong { name: String, max: usize },

    #[error("name '{name}' contains invalid character '{ch}'")]
    InvalidChar { name: String, ch: char },

    #[error("thirteenth character in name '{name}' cannot be a letter that comes after j")]
    InvalidLastChar { name: String },
}

impl From<NameError> for InternalError {
    fn from(err: NameError) -> Self {
        Self::new(ErrorClass::Format, ErrorOrigin::Name, err.to_string())
    }
}

///
/// Name
///

#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Name(u64);

impl Name {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Build a name at compile time.
    ///
    /// Panics (at const-eval time) on invalid input; runtime callers should
    /// use [`Name::from_str`].
    #[must_use]
    pub const fn new_const(name: &str) -> Self {
        match pack(name.as_bytes()) {
            Ok(value) => Self(value),
            Err(_) => panic!("invalid name literal"),
        }
    }

    /// Render the canonical text form into a fixed buffer.
    fn write_chars(self, buf: &mut [u8; MAX_NAME_LEN]) -> usize {
        let mut value = self.0;
        let mut len = 0;

        for (i, slot) in buf.iter_mut().enumerate() {
            if value == 0 {
                break;
            }

            let shift = if i == MAX_NAME_LEN - 1 { 60 } else { 59 };
            let symbol = (value & 0xF800_0000_0000_0000) >> shift;
            *slot = NAME_CHARSET[symbol as usize];
            len = i + 1;
            value <<= SYMBOL_BITS;
        }

        // trailing dots carry no information
        while len > 0 && buf[len - 1] == b'.' {
            len -= 1;
        }

        len
    }
}

// Validation errors stay symbolic here so the packer remains usable in const contexts.
enum PackError {
    TooLong,
    InvalidChar(usize),
    InvalidLastChar,
}

const fn symbol_value(ch: u8) -> Option<u64> {
    match ch {
        b'a'..=b'z' => Some((ch - b'a') as u64 + 6),
        b'1'..=b'5' => Some((ch - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

const fn pack(bytes: &[u8]) -> Result<u64, PackError> {
    if bytes.len() > MAX_NAME_LEN {
        return Err(PackError::TooLong);
    }
    // a 64-bit shift would overflow below
    if bytes.is_empty() {
        return Ok(0);
    }

    let head = if bytes.len() < MAX_NAME_LEN - 1 {
        bytes.len()
    } else {
        MAX_NAME_LEN - 1
    };

    let mut value: u64 = 0;
    let mut i = 0;
    while i < head {
        let Some(symbol) = symbol_value(bytes[i]) else {
            return Err(PackError::InvalidChar(i));
        };
        value = (value << SYMBOL_BITS) | symbol;
        i += 1;
    }

    let pad = 4 + SYMBOL_BITS * (MAX_NAME_LEN - 1 - head) as u32;
    value <<= pad;

    if bytes.len() == MAX_NAME_LEN {
        let Some(symbol) = symbol_value(bytes[MAX_NAME_LEN - 1]) else {
            return Err(PackError::InvalidChar(MAX_NAME_LEN - 1));
        };
        if symbol > LAST_SYMBOL_MAX {
            return Err(PackError::InvalidLastChar);
        }
        value |= symbol;
    }

    Ok(value)
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        pack(s.as_bytes()).map(Self).map_err(|err| match err {
            PackError::TooLong => NameError::TooLong {
                name: s.to_string(),
                max: MAX_NAME_LEN,
            },
            PackError::InvalidChar(at) => NameError::InvalidChar {
                name: s.to_string(),
                ch: s[at..].chars().next().unwrap_or('?'),
            },
            PackError::InvalidLastChar => NameError::InvalidLastChar {
                name: s.to_string(),
            },
        })
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; MAX_NAME_LEN];
        let len = self.write_chars(&mut buf);

        // charset is ASCII
        for &byte in &buf[..len] {
            write!(f, "{}", char::from(byte))?;
        }

        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            text.parse().map_err(de::Error::custom)
        } else {
            u64::deserialize(deserializer).map(Self)
        }
    }
}

///
/// Well-known database selectors
///

/// RAM-billed key-value database.
pub const KV_RAM: Name = Name::new_const("eosio.kvram");

/// Disk-billed key-value database.
pub const KV_DISK: Name = Name::new_const("eosio.kvdisk");

///
/// TESTS
///

#[cfg(test)]
mod tests;
