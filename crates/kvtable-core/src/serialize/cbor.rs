use crate::serialize::SerializeError;
use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{
    from_slice,
    ser::{IoWrite, Serializer},
};
use std::{
    io,
    panic::{AssertUnwindSafe, catch_unwind},
};

/// Append the packed CBOR form of `t` to `out`.
pub(super) fn serialize_into<T>(out: &mut Vec<u8>, t: &T) -> Result<(), SerializeError>
where
    T: Serialize,
{
    write_packed(out, t)
}

/// Count the bytes `serialize_into` would write.
pub(super) fn packed_size<T>(t: &T) -> Result<usize, SerializeError>
where
    T: Serialize,
{
    let mut counter = ByteCounter(0);
    write_packed(&mut counter, t)?;

    Ok(counter.0)
}

// Packed format keys struct fields and enum variants by index.
fn write_packed<W, T>(writer: W, t: &T) -> Result<(), SerializeError>
where
    W: io::Write,
    T: Serialize,
{
    let mut ser = Serializer::new(IoWrite::new(writer)).packed_format();

    t.serialize(&mut ser)
        .map_err(|e| SerializeError::Serialize(e.to_string()))
}

struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Deserialize CBOR bytes into a value.
///
/// Safety guarantees:
/// - Input size is bounded before decode.
/// - Any panic during decode is caught and reported as a deserialize error.
/// - No panic escapes this function.
pub(super) fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > max_bytes {
        return Err(SerializeError::DeserializeSizeLimitExceeded {
            len: bytes.len(),
            max_bytes,
        });
    }

    let result = catch_unwind(AssertUnwindSafe(|| from_slice(bytes)));

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

///
/// TESTS
///
