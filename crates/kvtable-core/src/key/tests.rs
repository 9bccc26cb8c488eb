use super::*;
use proptest::prelude::*;
use std::cmp::Ordering;

fn enc<T: ToKey + ?Sized>(value: &T) -> Key {
    Key::encode(value).expect("value should encode")
}

fn assert_encoded_order<T: ToKey + PartialOrd>(left: &T, right: &T) {
    let expected = left.partial_cmp(right).expect("values should be comparable");
    assert_eq!(enc(left).cmp(&enc(right)), expected);
}

#[test]
fn hex_roundtrip_and_lowercase_output() {
    let key = Key::from(vec![0x00, 0x7f, 0x80, 0xab, 0xff]);

    assert_eq!(key.to_hex(), "007f80abff");
    assert_eq!(Key::from_hex("007f80abff").unwrap(), key);
    assert_eq!(Key::from_hex("007F80ABFF").unwrap(), key);
    assert_eq!(Key::from_hex("").unwrap(), Key::new());
}

#[test]
fn hex_rejects_odd_length() {
    assert_eq!(
        Key::from_hex("abc").unwrap_err(),
        HexDecodeError::OddLength(3)
    );
}

#[test]
fn hex_rejects_invalid_digit() {
    assert_eq!(
        Key::from_hex("0g").unwrap_err(),
        HexDecodeError::InvalidDigit { ch: 'g', offset: 1 }
    );
}

#[test]
fn concat_is_byte_append() {
    let a = Key::from(vec![1, 2]);
    let b = Key::from(vec![3]);
    let c = Key::from(vec![4, 5]);

    assert_eq!((&a + &b).as_bytes(), &[1, 2, 3]);
    assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
    assert_eq!(a.clone() + b.clone(), a.concat(&b));
}

#[test]
fn prefix_matches_tuple_encoding() {
    let table: Name = "users".parse().unwrap();
    let index: Name = "byname".parse().unwrap();

    let prefix = make_prefix(table, index);

    assert_eq!(prefix.len(), PREFIX_LEN);
    assert_eq!(prefix, enc(&(PREFIX_STATUS_ACTIVE, table, index)));
    assert_eq!(prefix.as_bytes()[0], 1);
}

#[test]
fn prefixes_of_distinct_indices_never_nest() {
    let table: Name = "users".parse().unwrap();
    let a = make_prefix(table, "byid".parse().unwrap());
    let b = make_prefix(table, "byname".parse().unwrap());
    let other = make_prefix("orders".parse().unwrap(), "byid".parse().unwrap());

    for (x, y) in [(&a, &b), (&a, &other), (&b, &other)] {
        assert!(!x.starts_with(y));
        assert!(!y.starts_with(x));
    }
}

#[test]
fn table_key_prepends_prefix() {
    let prefix = make_prefix("t".parse().unwrap(), "i".parse().unwrap());
    let field = enc(&7u64);
    let full = table_key(&prefix, &field);

    assert!(full.starts_with(&prefix));
    assert_eq!(&full[PREFIX_LEN..], field.as_bytes());
}

#[test]
fn signed_integers_order_across_zero() {
    assert_encoded_order(&-1i64, &0i64);
    assert_encoded_order(&i64::MIN, &i64::MAX);
    assert_encoded_order(&-128i8, &127i8);
    assert_encoded_order(&-2i32, &-1i32);
}

#[test]
fn floats_order_and_fold_negative_zero() {
    assert_encoded_order(&-1.5f64, &-0.5f64);
    assert_encoded_order(&-0.5f64, &0.25f64);
    assert_encoded_order(&f64::NEG_INFINITY, &f64::MIN);
    assert_eq!(enc(&-0.0f64), enc(&0.0f64));
    assert_eq!(enc(&-0.0f32), enc(&0.0f32));
}

#[test]
fn nan_is_not_encodable() {
    assert_eq!(
        Key::encode(&f64::NAN).unwrap_err(),
        KeyEncodeError::UnorderedFloat
    );
    assert_eq!(
        Key::encode(&(1u8, f32::NAN)).unwrap_err(),
        KeyEncodeError::UnorderedFloat
    );
}

#[test]
fn strings_escape_zero_and_terminate() {
    assert_eq!(enc("a").as_bytes(), &[b'a', 0, 0]);
    assert_eq!(enc("a\0b").as_bytes(), &[b'a', 0, 0xff, b'b', 0, 0]);

    assert_encoded_order(&"a".to_string(), &"ab".to_string());
    assert_encoded_order(&"a".to_string(), &"a\0".to_string());
    assert_encoded_order(&"a\0".to_string(), &"a\u{1}".to_string());
}

#[test]
fn tuples_do_not_collide_across_boundaries() {
    let left = enc(&("ab".to_string(), "c".to_string()));
    let right = enc(&("a".to_string(), "bc".to_string()));

    assert_ne!(left, right);
    assert_eq!(left.cmp(&right), Ordering::Greater);
}

#[test]
fn option_and_sequence_order() {
    assert_encoded_order(&None::<u8>, &Some(0u8));
    assert_encoded_order(&Vec::<u16>::new(), &vec![0u16]);
    assert_encoded_order(&vec![1u16], &vec![1u16, 0]);
    assert_encoded_order(&vec![1u16, 5], &vec![2u16]);
}

#[test]
fn decode_rejects_trailing_bytes() {
    let mut bytes = enc(&5u32).into_bytes();
    bytes.push(0);

    assert_eq!(
        Key::from(bytes).decode::<u32>().unwrap_err(),
        KeyDecodeError::TrailingBytes(1)
    );
}

#[test]
fn decode_rejects_truncated_and_bad_tags() {
    assert_eq!(
        Key::from(vec![0, 1]).decode::<u32>().unwrap_err(),
        KeyDecodeError::Truncated { needed: 2 }
    );
    assert_eq!(
        Key::from(vec![2]).decode::<bool>().unwrap_err(),
        KeyDecodeError::InvalidBool(2)
    );
    assert!(matches!(
        Key::from(vec![7]).decode::<Option<u8>>().unwrap_err(),
        KeyDecodeError::InvalidTag { what: "option", .. }
    ));
    assert_eq!(
        Key::from(vec![b'a', 0, 3]).decode::<String>().unwrap_err(),
        KeyDecodeError::InvalidEscape(3)
    );
}

#[test]
fn names_roundtrip_through_keys() {
    let name: Name = "alice".parse().unwrap();

    assert_eq!(enc(&name).decode::<Name>().unwrap(), name);
}

#[test]
fn raw_keys_pass_through() {
    let raw = Key::from(vec![9, 8, 7]);

    assert_eq!(enc(&raw), raw);
    assert_eq!(raw.decode::<Key>().unwrap(), raw);
}

proptest! {
    #[test]
    fn hex_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let key = Key::from(bytes);
        prop_assert_eq!(Key::from_hex(&key.to_hex()).unwrap(), key);
    }

    #[test]
    fn lowercase_hex_text_roundtrip(text in "([0-9a-f]{2}){0,32}") {
        prop_assert_eq!(Key::from_hex(&text).unwrap().to_hex(), text);
    }

    #[test]
    fn i64_order_preserved(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(enc(&a).cmp(&enc(&b)), a.cmp(&b));
        prop_assert_eq!(enc(&a).decode::<i64>().unwrap(), a);
    }

    #[test]
    fn u32_order_preserved(a in any::<u32>(), b in any::<u32>()) {
        prop_assert_eq!(enc(&a).cmp(&enc(&b)), a.cmp(&b));
    }

    #[test]
    fn f64_order_preserved(a in proptest::num::f64::NORMAL | proptest::num::f64::ZERO,
                           b in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        let expected = a.partial_cmp(&b).unwrap();
        prop_assert_eq!(enc(&a).cmp(&enc(&b)), expected);
        prop_assert_eq!(enc(&a).decode::<f64>().unwrap(), a);
    }

    #[test]
    fn string_order_preserved(a in ".{0,12}", b in ".{0,12}") {
        prop_assert_eq!(enc(&a).cmp(&enc(&b)), a.as_bytes().cmp(b.as_bytes()));
        prop_assert_eq!(enc(&a).decode::<String>().unwrap(), a);
    }

    #[test]
    fn tuple_order_preserved(a in (any::<u8>(), ".{0,6}", any::<i32>()),
                             b in (any::<u8>(), ".{0,6}", any::<i32>())) {
        let order = a.0.cmp(&b.0)
            .then_with(|| a.1.as_bytes().cmp(b.1.as_bytes()))
            .then_with(|| a.2.cmp(&b.2));
        prop_assert_eq!(enc(&a).cmp(&enc(&b)), order);
        prop_assert_eq!(enc(&a).decode::<(u8, String, i32)>().unwrap(), a);
    }

    #[test]
    fn sequence_roundtrip(values in proptest::collection::vec(any::<u16>(), 0..8)) {
        prop_assert_eq!(enc(&values).decode::<Vec<u16>>().unwrap(), values);
    }
}
