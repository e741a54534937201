use mx_abi_core::codec::{decode, decode_nested, encode, encode_nested};
use mx_abi_core::typesystem::parse_type;
use mx_abi_core::{CodecError, EncodingMode, TypeDescriptor, TypedValue};
use serde_json::json;
use std::collections::HashMap;

fn ty(input: &str) -> TypeDescriptor {
    parse_type(input, &HashMap::new()).unwrap()
}

#[test]
fn nested_list_of_u32_has_count_prefix() {
    let list_type = ty("List<u32>");
    let value = TypedValue::from_json(&json!([1, 2, 3]), &list_type).unwrap();

    let bytes = encode_nested(&value).unwrap();
    assert_eq!(
        hex::encode(&bytes),
        "00000003000000010000000200000003"
    );
    assert_eq!(decode_nested(&bytes, &list_type).unwrap(), value);
}

#[test]
fn values_survive_a_round_trip() {
    let cases = [
        ("u8", json!(255)),
        ("i16", json!(-2)),
        ("u64", json!("18446744073709551615")),
        ("BigUint", json!("340282366920938463463374607431768211456")),
        ("BigInt", json!("-1")),
        ("bool", json!(true)),
        ("bytes", json!("deadbeef")),
        ("utf-8 string", json!("lottery")),
        ("TokenIdentifier", json!("LUCKY-a1b2c3")),
        ("Option<u32>", json!(7)),
        ("Option<u32>", json!(null)),
        ("List<Option<bytes>>", json!(["ab", null, ""])),
        ("tuple<u8,List<u16>,bool>", json!([1, [2, 3], false])),
        ("array3<u8>", json!([1, 2, 3])),
        ("List<List<u64>>", json!([[1], [], [2, 3]])),
    ];

    for (type_name, literal) in cases {
        let declared = ty(type_name);
        let value = TypedValue::from_json(&literal, &declared).unwrap();
        for mode in [EncodingMode::Nested, EncodingMode::TopLevel] {
            let bytes = encode(&value, mode).unwrap();
            assert_eq!(
                decode(&bytes, &declared, mode).unwrap(),
                value,
                "{} {:?}",
                type_name,
                mode
            );
        }
    }
}

#[test]
fn truncated_streams_underflow() {
    let declared = ty("tuple<u32,bytes>");
    let value = TypedValue::from_json(&json!([9, "abcdef"]), &declared).unwrap();
    let bytes = encode_nested(&value).unwrap();

    for cut in 0..bytes.len() {
        let err = decode_nested(&bytes[..cut], &declared).unwrap_err();
        assert!(
            matches!(err, CodecError::Underflow { .. }),
            "cut at {} gave {:?}",
            cut,
            err
        );
    }
}

#[test]
fn multi_values_only_exist_at_top_level() {
    let declared = ty("List<variadic<u8>>");
    assert_eq!(
        decode_nested(&[0, 0, 0, 1, 5], &declared).unwrap_err(),
        CodecError::NotNestable("variadic<u8>".to_string())
    );
}
