//! Binary codec for contract arguments and return values.
//!
//! Two modes share one set of rules. *Top-level* applies to a value that is a
//! whole call argument, so its boundary comes from the argument separator.
//! *Nested* applies inside composites and length-prefixes anything whose size
//! the type does not fix.

pub mod decoder;
pub mod encoder;

pub use decoder::{
    decode, decode_arguments, decode_nested, decode_top_level, NestedReader, MAX_ZERO_WIDTH_ITEMS,
};
pub use encoder::{
    big_int_bytes, big_uint_bytes, encode, encode_arguments, encode_nested, encode_top_level,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    TopLevel,
    Nested,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::{Address, FieldDefinition, TypeDescriptor, TypedValue};
    use num_bigint::BigInt;

    fn round_trip(value: TypedValue, mode: EncodingMode) {
        let ty = value.type_descriptor();
        let bytes = encode(&value, mode).unwrap();
        assert_eq!(decode(&bytes, &ty, mode).unwrap(), value, "{} in {:?}", ty, mode);
    }

    #[test]
    fn test_round_trips_in_both_modes() {
        let point = TypeDescriptor::Struct {
            name: "Point".to_string(),
            fields: vec![
                FieldDefinition {
                    name: "owner".to_string(),
                    field_type: TypeDescriptor::address(),
                },
                FieldDefinition {
                    name: "label".to_string(),
                    field_type: TypeDescriptor::option(TypeDescriptor::bytes()),
                },
            ],
        };
        let values = vec![
            TypedValue::U16(513),
            TypedValue::I64(-42),
            TypedValue::big_uint(1_000_000_000_000_000_000u64),
            TypedValue::BigInt(BigInt::from(-300)),
            TypedValue::Utf8String("lottery".to_string()),
            TypedValue::token_identifier("LUCKY-a1b2c3"),
            TypedValue::Tuple(vec![TypedValue::U8(1), TypedValue::bytes_from_utf8("x")]),
            TypedValue::Array {
                element_type: TypeDescriptor::u8(),
                items: vec![TypedValue::U8(1), TypedValue::U8(2)],
            },
            TypedValue::Struct {
                descriptor: point,
                fields: vec![
                    TypedValue::Address(Address([7u8; 32])),
                    TypedValue::missing(TypeDescriptor::bytes()),
                ],
            },
        ];
        for value in values {
            round_trip(value.clone(), EncodingMode::Nested);
            round_trip(value, EncodingMode::TopLevel);
        }
    }

    #[test]
    fn test_nested_list_of_u32() {
        let value = TypedValue::list(
            TypeDescriptor::u32(),
            vec![TypedValue::U32(1), TypedValue::U32(2), TypedValue::U32(3)],
        );
        let bytes = encode_nested(&value).unwrap();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 3, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3]
        );
        let decoded = decode_nested(&bytes, &TypeDescriptor::list(TypeDescriptor::u32())).unwrap();
        assert_eq!(decoded, value);
    }
}
