//! Module: key::decode
//! Responsibility: inverse of `ToKey` for the builtin encodings.

use crate::{
    key::{
        Key, KeyDecodeError,
        ordered::{
            ESCAPE, ESCAPED_ZERO, SEQ_ELEMENT, SEQ_END, TERMINATOR, unordered_f32, unordered_f64,
            unordered_i8, unordered_i16, unordered_i32, unordered_i64, unordered_i128,
        },
    },
    name::Name,
};

///
/// KeyReader
///
/// Forward-only view over encoded key bytes.
///

#[derive(Debug)]
pub struct KeyReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> KeyReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], KeyDecodeError> {
        let available = self.remaining();
        if len > available {
            return Err(KeyDecodeError::Truncated {
                needed: len - available,
            });
        }

        let out = &self.bytes[self.offset..self.offset + len];
        self.offset += len;

        Ok(out)
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], KeyDecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);

        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, KeyDecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Consume everything that is left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        out
    }

    /// Require that every byte was consumed.
    pub const fn finish(&self) -> Result<(), KeyDecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(KeyDecodeError::TrailingBytes(n)),
        }
    }

    fn read_terminated(&mut self) -> Result<Vec<u8>, KeyDecodeError> {
        let mut out = Vec::new();

        loop {
            let byte = self.read_u8()?;
            if byte != ESCAPE {
                out.push(byte);
                continue;
            }

            match self.read_u8()? {
                TERMINATOR => return Ok(out),
                ESCAPED_ZERO => out.push(0),
                other => return Err(KeyDecodeError::InvalidEscape(other)),
            }
        }
    }
}

///
/// FromKey
///
/// Decoding counterpart of [`ToKey`](crate::key::ToKey).
///

pub trait FromKey: Sized {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError>;
}

impl FromKey for () {
    fn read_key(_reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        Ok(())
    }
}

impl FromKey for bool {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(KeyDecodeError::InvalidBool(other)),
        }
    }
}

macro_rules! impl_from_key_unsigned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromKey for $ty {
                fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
                    Ok(<$ty>::from_be_bytes(reader.take_array()?))
                }
            }
        )*
    };
}

impl_from_key_unsigned!(u8, u16, u32, u64, u128);

impl FromKey for i8 {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        Ok(unordered_i8(reader.read_u8()?))
    }
}

macro_rules! impl_from_key_signed {
    ($($ty:ty => $decode:ident),* $(,)?) => {
        $(
            impl FromKey for $ty {
                fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
                    Ok($decode(reader.take_array()?))
                }
            }
        )*
    };
}

impl_from_key_signed!(
    i16 => unordered_i16,
    i32 => unordered_i32,
    i64 => unordered_i64,
    i128 => unordered_i128,
    f32 => unordered_f32,
    f64 => unordered_f64,
);

impl FromKey for String {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        let bytes = reader.read_terminated()?;
        Self::from_utf8(bytes).map_err(|_| KeyDecodeError::InvalidUtf8)
    }
}

impl<const N: usize> FromKey for [u8; N] {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        reader.take_array()
    }
}

impl<T: FromKey> FromKey for Option<T> {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        match reader.read_u8()? {
            0 => Ok(None),
            1 => T::read_key(reader).map(Some),
            tag => Err(KeyDecodeError::InvalidTag {
                what: "option",
                tag,
            }),
        }
    }
}

impl<T: FromKey> FromKey for Vec<T> {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        let mut out = Self::new();

        loop {
            match reader.read_u8()? {
                SEQ_END => return Ok(out),
                SEQ_ELEMENT => out.push(T::read_key(reader)?),
                tag => {
                    return Err(KeyDecodeError::InvalidTag {
                        what: "sequence",
                        tag,
                    });
                }
            }
        }
    }
}

impl FromKey for Name {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        Ok(Self::from_raw(u64::from_be_bytes(reader.take_array()?)))
    }
}

impl FromKey for Key {
    fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
        Ok(Self::from(reader.take_rest()))
    }
}

macro_rules! impl_from_key_tuple {
    ($($name:ident),+) => {
        impl<$($name: FromKey),+> FromKey for ($($name,)+) {
            fn read_key(reader: &mut KeyReader<'_>) -> Result<Self, KeyDecodeError> {
                Ok(($($name::read_key(reader)?,)+))
            }
        }
    };
}

impl_from_key_tuple!(A);
impl_from_key_tuple!(A, B);
impl_from_key_tuple!(A, B, C);
impl_from_key_tuple!(A, B, C, D);
impl_from_key_tuple!(A, B, C, D, E);
impl_from_key_tuple!(A, B, C, D, E, F);
