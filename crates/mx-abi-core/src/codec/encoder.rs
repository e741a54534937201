//! Value to bytes.

use super::EncodingMode;
use crate::error::CodecError;
use crate::typesystem::TypedValue;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

/// Encode a value in the given mode.
pub fn encode(value: &TypedValue, mode: EncodingMode) -> Result<Vec<u8>, CodecError> {
    match mode {
        EncodingMode::TopLevel => encode_top_level(value),
        EncodingMode::Nested => encode_nested(value),
    }
}

/// Encode a value embedded inside a composite.
pub fn encode_nested(value: &TypedValue) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    write_nested(value, &mut out)?;
    Ok(out)
}

/// Encode a value that is itself one call argument.
///
/// An absent `Option`/`optional` yields an empty buffer; the argument-list
/// API omits it instead.
pub fn encode_top_level(value: &TypedValue) -> Result<Vec<u8>, CodecError> {
    match value {
        TypedValue::BigUint(n) => Ok(big_uint_bytes(n)),
        TypedValue::BigInt(n) => Ok(big_int_bytes(n)),
        TypedValue::Bytes(b) => Ok(b.clone()),
        TypedValue::Utf8String(s) | TypedValue::TokenIdentifier(s) => Ok(s.as_bytes().to_vec()),
        TypedValue::Option { value, .. } | TypedValue::Optional { value, .. } => match value {
            Some(inner) => encode_top_level(inner),
            None => Ok(Vec::new()),
        },
        TypedValue::List { items, .. } => {
            let mut out = Vec::new();
            for item in items {
                write_nested(item, &mut out)?;
            }
            Ok(out)
        }
        TypedValue::Variadic { .. } => {
            Err(CodecError::MultiArgument(value.type_descriptor().to_string()))
        }
        // Fixed-width primitives and composites look the same in both modes.
        _ => encode_nested(value),
    }
}

/// Encode call arguments, one buffer per argument.
///
/// Absent `Option`/`optional` values produce no argument and each item of a
/// `variadic` becomes its own argument.
pub fn encode_arguments(values: &[TypedValue]) -> Result<Vec<Vec<u8>>, CodecError> {
    let mut arguments = Vec::with_capacity(values.len());
    for value in values {
        match value {
            TypedValue::Option { value: None, .. } | TypedValue::Optional { value: None, .. } => {}
            TypedValue::Variadic { items, .. } => {
                for item in items {
                    arguments.push(encode_top_level(item)?);
                }
            }
            other => arguments.push(encode_top_level(other)?),
        }
    }
    Ok(arguments)
}

/// Minimal big-endian magnitude; zero is empty.
pub fn big_uint_bytes(n: &BigUint) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_bytes_be()
    }
}

/// Minimal big-endian two's complement; zero is empty.
pub fn big_int_bytes(n: &BigInt) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_signed_bytes_be()
    }
}

fn write_length(
    len: usize,
    value: &TypedValue,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let len = u32::try_from(len).map_err(|_| CodecError::Overflow {
        type_name: value.type_descriptor().to_string(),
        width: 4,
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn write_prefixed(bytes: &[u8], value: &TypedValue, out: &mut Vec<u8>) -> Result<(), CodecError> {
    write_length(bytes.len(), value, out)?;
    out.extend_from_slice(bytes);
    Ok(())
}

fn write_nested(value: &TypedValue, out: &mut Vec<u8>) -> Result<(), CodecError> {
    match value {
        TypedValue::U8(n) => out.push(*n),
        TypedValue::U16(n) => out.extend_from_slice(&n.to_be_bytes()),
        TypedValue::U32(n) => out.extend_from_slice(&n.to_be_bytes()),
        TypedValue::U64(n) => out.extend_from_slice(&n.to_be_bytes()),
        TypedValue::I8(n) => out.extend_from_slice(&n.to_be_bytes()),
        TypedValue::I16(n) => out.extend_from_slice(&n.to_be_bytes()),
        TypedValue::I32(n) => out.extend_from_slice(&n.to_be_bytes()),
        TypedValue::I64(n) => out.extend_from_slice(&n.to_be_bytes()),
        TypedValue::Bool(b) => out.push(u8::from(*b)),
        TypedValue::Address(a) => out.extend_from_slice(&a.0),
        TypedValue::H256(h) => out.extend_from_slice(h),
        TypedValue::BigUint(n) => write_prefixed(&big_uint_bytes(n), value, out)?,
        TypedValue::BigInt(n) => write_prefixed(&big_int_bytes(n), value, out)?,
        TypedValue::Bytes(b) => write_prefixed(b, value, out)?,
        TypedValue::Utf8String(s) | TypedValue::TokenIdentifier(s) => {
            write_prefixed(s.as_bytes(), value, out)?
        }
        TypedValue::Option { value: inner, .. } => match inner {
            Some(inner) => {
                out.push(1);
                write_nested(inner, out)?;
            }
            None => out.push(0),
        },
        TypedValue::List { items, .. } => {
            write_length(items.len(), value, out)?;
            for item in items {
                write_nested(item, out)?;
            }
        }
        TypedValue::Tuple(items)
        | TypedValue::Array { items, .. }
        | TypedValue::Struct { fields: items, .. } => {
            for item in items {
                write_nested(item, out)?;
            }
        }
        TypedValue::Enum {
            discriminant,
            fields,
            ..
        } => {
            out.push(*discriminant);
            for field in fields {
                write_nested(field, out)?;
            }
        }
        TypedValue::Optional { .. } | TypedValue::Variadic { .. } => {
            return Err(CodecError::NotNestable(
                value.type_descriptor().to_string(),
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::TypeDescriptor;

    #[test]
    fn test_fixed_width_same_in_both_modes() {
        let value = TypedValue::U32(5);
        assert_eq!(encode_nested(&value).unwrap(), vec![0, 0, 0, 5]);
        assert_eq!(encode_top_level(&value).unwrap(), vec![0, 0, 0, 5]);
        assert_eq!(encode_top_level(&TypedValue::Bool(false)).unwrap(), vec![0]);
    }

    #[test]
    fn test_big_uint_minimal() {
        assert_eq!(encode_top_level(&TypedValue::big_uint(0u32)).unwrap(), Vec::<u8>::new());
        assert_eq!(encode_top_level(&TypedValue::big_uint(256u32)).unwrap(), vec![1, 0]);
        assert_eq!(
            encode_nested(&TypedValue::big_uint(256u32)).unwrap(),
            vec![0, 0, 0, 2, 1, 0]
        );
        assert_eq!(encode_nested(&TypedValue::big_uint(0u32)).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_big_int_twos_complement() {
        let encode_int = |n: i64| encode_top_level(&TypedValue::BigInt(BigInt::from(n))).unwrap();
        assert_eq!(encode_int(0), Vec::<u8>::new());
        assert_eq!(encode_int(-1), vec![0xff]);
        assert_eq!(encode_int(127), vec![0x7f]);
        assert_eq!(encode_int(128), vec![0x00, 0x80]);
        assert_eq!(encode_int(-129), vec![0xff, 0x7f]);
    }

    #[test]
    fn test_option_modes() {
        let present = TypedValue::some(TypedValue::U64(7));
        assert_eq!(encode_top_level(&present).unwrap(), vec![0, 0, 0, 0, 0, 0, 0, 7]);
        assert_eq!(
            encode_nested(&present).unwrap(),
            vec![1, 0, 0, 0, 0, 0, 0, 0, 7]
        );

        let absent = TypedValue::missing(TypeDescriptor::u64());
        assert_eq!(encode_top_level(&absent).unwrap(), Vec::<u8>::new());
        assert_eq!(encode_nested(&absent).unwrap(), vec![0]);
    }

    #[test]
    fn test_bytes_prefix_only_when_nested() {
        let value = TypedValue::bytes_from_utf8("abc");
        assert_eq!(encode_top_level(&value).unwrap(), b"abc".to_vec());
        assert_eq!(encode_nested(&value).unwrap(), vec![0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_multi_value_not_nestable() {
        let optional = TypedValue::optional(TypedValue::U8(1));
        let list = TypedValue::list(optional.type_descriptor(), vec![optional]);
        assert!(matches!(
            encode_nested(&list),
            Err(CodecError::NotNestable(name)) if name == "optional<u8>"
        ));
    }

    #[test]
    fn test_encode_arguments_expands_multi_values() {
        let arguments = encode_arguments(&[
            TypedValue::U8(1),
            TypedValue::missing(TypeDescriptor::u32()),
            TypedValue::Variadic {
                element_type: TypeDescriptor::u8(),
                items: vec![TypedValue::U8(2), TypedValue::U8(3)],
            },
            TypedValue::optional_missing(TypeDescriptor::big_uint()),
        ])
        .unwrap();
        assert_eq!(arguments, vec![vec![1], vec![2], vec![3]]);
    }
}
