//! Module: key::ordered
//! Responsibility: fixed-width and escaped byte transforms preserving order.
//! Does not own: component framing or prefix layout.

pub(super) const ESCAPE: u8 = 0x00;
pub(super) const ESCAPED_ZERO: u8 = 0xFF;
pub(super) const TERMINATOR: u8 = 0x00;

pub(super) const SEQ_ELEMENT: u8 = 0x01;
pub(super) const SEQ_END: u8 = 0x00;

pub(super) const fn ordered_i8_byte(value: i8) -> u8 {
    value.cast_unsigned() ^ (1u8 << 7)
}

pub(super) const fn ordered_i16_bytes(value: i16) -> [u8; 2] {
    (value.cast_unsigned() ^ (1u16 << 15)).to_be_bytes()
}

pub(super) const fn ordered_i32_bytes(value: i32) -> [u8; 4] {
    (value.cast_unsigned() ^ (1u32 << 31)).to_be_bytes()
}

pub(super) const fn ordered_i64_bytes(value: i64) -> [u8; 8] {
    (value.cast_unsigned() ^ (1u64 << 63)).to_be_bytes()
}

pub(super) const fn ordered_i128_bytes(value: i128) -> [u8; 16] {
    (value.cast_unsigned() ^ (1u128 << 127)).to_be_bytes()
}

pub(super) const fn unordered_i8(byte: u8) -> i8 {
    (byte ^ (1u8 << 7)).cast_signed()
}

pub(super) const fn unordered_i16(bytes: [u8; 2]) -> i16 {
    (u16::from_be_bytes(bytes) ^ (1u16 << 15)).cast_signed()
}

pub(super) const fn unordered_i32(bytes: [u8; 4]) -> i32 {
    (u32::from_be_bytes(bytes) ^ (1u32 << 31)).cast_signed()
}

pub(super) const fn unordered_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1u64 << 63)).cast_signed()
}

pub(super) const fn unordered_i128(bytes: [u8; 16]) -> i128 {
    (u128::from_be_bytes(bytes) ^ (1u128 << 127)).cast_signed()
}

// -0.0 is folded into 0.0 so equal values share one encoding.
pub(super) fn ordered_f32_bytes(value: f32) -> [u8; 4] {
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    let ordered = if bits & 0x8000_0000 == 0 {
        bits ^ 0x8000_0000
    } else {
        !bits
    };

    ordered.to_be_bytes()
}

pub(super) fn ordered_f64_bytes(value: f64) -> [u8; 8] {
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    let ordered = if bits & 0x8000_0000_0000_0000 == 0 {
        bits ^ 0x8000_0000_0000_0000
    } else {
        !bits
    };

    ordered.to_be_bytes()
}

pub(super) fn unordered_f32(bytes: [u8; 4]) -> f32 {
    let ordered = u32::from_be_bytes(bytes);
    let bits = if ordered & 0x8000_0000 == 0 {
        !ordered
    } else {
        ordered ^ 0x8000_0000
    };

    f32::from_bits(bits)
}

pub(super) fn unordered_f64(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    let bits = if ordered & 0x8000_0000_0000_0000 == 0 {
        !ordered
    } else {
        ordered ^ 0x8000_0000_0000_0000
    };

    f64::from_bits(bits)
}

// Byte strings are escaped so tuple boundaries remain unambiguous.
pub(super) fn push_terminated_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == ESCAPE {
            out.extend_from_slice(&[ESCAPE, ESCAPED_ZERO]);
        } else {
            out.push(byte);
        }
    }

    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}
