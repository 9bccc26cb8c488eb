//! Module: key::encode
//! Responsibility: the `ToKey` contract and its impls for builtin types.
//! Boundary: every impl must be self-delimiting or fixed-width so that
//! concatenated components never collide across different tuples.

use crate::{
    key::{
        Key, KeyEncodeError,
        ordered::{
            SEQ_ELEMENT, SEQ_END, ordered_f32_bytes, ordered_f64_bytes, ordered_i8_byte,
            ordered_i16_bytes, ordered_i32_bytes, ordered_i64_bytes, ordered_i128_bytes,
            push_terminated_bytes,
        },
    },
    name::Name,
};

///
/// ToKey
///
/// Order-preserving binary encoding for one key component.
///
/// For any two values `a < b` of the same type, the bytes appended for `a`
/// compare lexicographically below the bytes appended for `b`.
///

pub trait ToKey {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError>;
}

impl<T: ToKey + ?Sized> ToKey for &T {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        (**self).write_key(out)
    }
}

impl<T: ToKey + ?Sized> ToKey for Box<T> {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        (**self).write_key(out)
    }
}

impl ToKey for () {
    fn write_key(&self, _out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        Ok(())
    }
}

impl ToKey for bool {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        out.push(u8::from(*self));
        Ok(())
    }
}

macro_rules! impl_to_key_unsigned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToKey for $ty {
                fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
                    out.extend_from_slice(&self.to_be_bytes());
                    Ok(())
                }
            }
        )*
    };
}

impl_to_key_unsigned!(u8, u16, u32, u64, u128);

impl ToKey for i8 {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        out.push(ordered_i8_byte(*self));
        Ok(())
    }
}

macro_rules! impl_to_key_signed {
    ($($ty:ty => $encode:ident),* $(,)?) => {
        $(
            impl ToKey for $ty {
                fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
                    out.extend_from_slice(&$encode(*self));
                    Ok(())
                }
            }
        )*
    };
}

impl_to_key_signed!(
    i16 => ordered_i16_bytes,
    i32 => ordered_i32_bytes,
    i64 => ordered_i64_bytes,
    i128 => ordered_i128_bytes,
);

impl ToKey for f32 {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        if self.is_nan() {
            return Err(KeyEncodeError::UnorderedFloat);
        }
        out.extend_from_slice(&ordered_f32_bytes(*self));
        Ok(())
    }
}

impl ToKey for f64 {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        if self.is_nan() {
            return Err(KeyEncodeError::UnorderedFloat);
        }
        out.extend_from_slice(&ordered_f64_bytes(*self));
        Ok(())
    }
}

impl ToKey for str {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        push_terminated_bytes(out, self.as_bytes());
        Ok(())
    }
}

impl ToKey for String {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        self.as_str().write_key(out)
    }
}

impl<const N: usize> ToKey for [u8; N] {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        out.extend_from_slice(self);
        Ok(())
    }
}

impl<T: ToKey> ToKey for Option<T> {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        match self {
            None => {
                out.push(0);
                Ok(())
            }
            Some(value) => {
                out.push(1);
                value.write_key(out)
            }
        }
    }
}

impl<T: ToKey> ToKey for [T] {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        for item in self {
            out.push(SEQ_ELEMENT);
            item.write_key(out)?;
        }
        out.push(SEQ_END);

        Ok(())
    }
}

impl<T: ToKey> ToKey for Vec<T> {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        self.as_slice().write_key(out)
    }
}

impl ToKey for Name {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        out.extend_from_slice(&self.raw().to_be_bytes());
        Ok(())
    }
}

// Pre-encoded keys pass through untouched.
impl ToKey for Key {
    fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
        out.extend_from_slice(self.as_bytes());
        Ok(())
    }
}

macro_rules! impl_to_key_tuple {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: ToKey),+> ToKey for ($($name,)+) {
            fn write_key(&self, out: &mut Vec<u8>) -> Result<(), KeyEncodeError> {
                $( self.$idx.write_key(out)?; )+
                Ok(())
            }
        }
    };
}

impl_to_key_tuple!(A.0);
impl_to_key_tuple!(A.0, B.1);
impl_to_key_tuple!(A.0, B.1, C.2);
impl_to_key_tuple!(A.0, B.1, C.2, D.3);
impl_to_key_tuple!(A.0, B.1, C.2, D.3, E.4);
impl_to_key_tuple!(A.0, B.1, C.2, D.3, E.4, F.5);
