use crate::error::InternalError;
use thiserror::Error as ThisError;

///
/// KeyEncodeError
///
/// Order-preserving encoding failures for one key component.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum KeyEncodeError {
    #[error("NaN has no defined key order")]
    UnorderedFloat,
}

impl From<KeyEncodeError> for InternalError {
    fn from(err: KeyEncodeError) -> Self {
        Self::key_encoding(format!("value is not order-encodable: {err}"))
    }
}

///
/// KeyDecodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum KeyDecodeError {
    #[error("truncated key: needed {needed} more bytes")]
    Truncated { needed: usize },

    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),

    #[error("invalid {what} tag {tag:#04x}")]
    InvalidTag { what: &'static str, tag: u8 },

    #[error("invalid escape sequence 0x00 {0:#04x}")]
    InvalidEscape(u8),

    #[error("key text is not valid utf-8")]
    InvalidUtf8,

    #[error("{0} trailing bytes after key")]
    TrailingBytes(usize),
}

impl From<KeyDecodeError> for InternalError {
    fn from(err: KeyDecodeError) -> Self {
        Self::key_format(format!("key decode failed: {err}"))
    }
}

///
/// HexDecodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum HexDecodeError {
    #[error("invalid hex string length {0}")]
    OddLength(usize),

    #[error("invalid hex digit '{ch}' at offset {offset}")]
    InvalidDigit { ch: char, offset: usize },
}

impl From<HexDecodeError> for InternalError {
    fn from(err: HexDecodeError) -> Self {
        Self::key_format(err.to_string())
    }
}
