use super::*;

#[test]
fn text_roundtrip() {
    for text in ["a", "users", "byname", "eosio.token", "zzzzzzzzzzzz", "1", "a.b"] {
        let name: Name = text.parse().unwrap();
        assert_eq!(name.to_string(), text);
    }
}

#[test]
fn trailing_dots_are_trimmed() {
    let name: Name = "abc...".parse().unwrap();
    assert_eq!(name.to_string(), "abc");
    assert_eq!(name, "abc".parse().unwrap());
}

#[test]
fn empty_text_is_empty_name() {
    let name: Name = "".parse().unwrap();
    assert!(name.is_empty());
    assert_eq!(name, Name::EMPTY);
    assert_eq!(name.to_string(), "");
}

#[test]
fn thirteenth_character_is_limited() {
    let ok: Name = "aaaaaaaaaaaaj".parse().unwrap();
    assert_eq!(ok.to_string(), "aaaaaaaaaaaaj");

    let err = "aaaaaaaaaaaak".parse::<Name>().unwrap_err();
    assert!(matches!(err, NameError::InvalidLastChar { .. }));
}

#[test]
fn rejects_too_long() {
    let err = "aaaaaaaaaaaaaa".parse::<Name>().unwrap_err();
    assert!(matches!(err, NameError::TooLong { max: 13, .. }));
}

#[test]
fn rejects_invalid_characters() {
    let err = "Users".parse::<Name>().unwrap_err();
    assert_eq!(
        err,
        NameError::InvalidChar {
            name: "Users".to_string(),
            ch: 'U'
        }
    );

    assert!("user6".parse::<Name>().is_err());
    assert!("us-er".parse::<Name>().is_err());
}

#[test]
fn packed_order_matches_text_order() {
    let mut texts = vec!["b", "a", "ab", "a.", "zz", "a1", "a5", "aa", "1"];
    let mut names: Vec<Name> = texts.iter().map(|t| t.parse().unwrap()).collect();

    texts.sort_by_key(|t| {
        t.bytes()
            .map(|b| NAME_CHARSET.iter().position(|c| *c == b).unwrap())
            .collect::<Vec<_>>()
    });
    names.sort();

    // "a." and "a" pack to the same value; compare canonical forms
    let rendered: Vec<String> = names.iter().map(ToString::to_string).collect();
    let canonical: Vec<String> = texts
        .iter()
        .map(|t| t.trim_end_matches('.').to_string())
        .collect();
    assert_eq!(rendered, canonical);
}

#[test]
fn const_names_match_parsed() {
    assert_eq!(KV_RAM, "eosio.kvram".parse().unwrap());
    assert_eq!(KV_DISK.to_string(), "eosio.kvdisk");
}

#[test]
fn known_raw_value() {
    // "eosio" is a widely published reference value
    let name: Name = "eosio".parse().unwrap();
    assert_eq!(name.raw(), 0x5530_EA00_0000_0000);
}
