//! Runtime values tagged with the ABI type they were built for.

use super::types::{GenericKind, PrimitiveType, TypeDescriptor};
use num_bigint::{BigInt, BigUint};
use std::fmt;

/// A 32-byte account or contract address.
///
/// Bech32 rendering belongs to the wallet layer; here addresses are plain
/// public-key bytes shown as hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        let trimmed = hex_str.trim_start_matches("0x");
        let bytes = hex::decode(trimmed).ok()?;
        let array: [u8; 32] = bytes.try_into().ok()?;
        Some(Address(array))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A value ready to be checked against an endpoint and encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    BigUint(BigUint),
    BigInt(BigInt),
    Bool(bool),
    Address(Address),
    Bytes(Vec<u8>),
    Utf8String(String),
    TokenIdentifier(String),
    H256([u8; 32]),
    /// `Option<T>`; `value` is `None` when absent.
    Option {
        inner_type: TypeDescriptor,
        value: Option<Box<TypedValue>>,
    },
    /// `optional<T>`, the multi-value counterpart of `Option<T>`.
    Optional {
        inner_type: TypeDescriptor,
        value: Option<Box<TypedValue>>,
    },
    List {
        element_type: TypeDescriptor,
        items: Vec<TypedValue>,
    },
    Variadic {
        element_type: TypeDescriptor,
        items: Vec<TypedValue>,
    },
    Tuple(Vec<TypedValue>),
    Array {
        element_type: TypeDescriptor,
        items: Vec<TypedValue>,
    },
    /// `descriptor` is the `TypeDescriptor::Struct` the fields follow.
    Struct {
        descriptor: TypeDescriptor,
        fields: Vec<TypedValue>,
    },
    /// `descriptor` is the `TypeDescriptor::Enum` the variant belongs to.
    Enum {
        descriptor: TypeDescriptor,
        discriminant: u8,
        fields: Vec<TypedValue>,
    },
}

impl TypedValue {
    pub fn some(value: TypedValue) -> Self {
        TypedValue::Option {
            inner_type: value.type_descriptor(),
            value: Some(Box::new(value)),
        }
    }

    /// An absent `Option<inner_type>`.
    pub fn missing(inner_type: TypeDescriptor) -> Self {
        TypedValue::Option {
            inner_type,
            value: None,
        }
    }

    pub fn optional(value: TypedValue) -> Self {
        TypedValue::Optional {
            inner_type: value.type_descriptor(),
            value: Some(Box::new(value)),
        }
    }

    pub fn optional_missing(inner_type: TypeDescriptor) -> Self {
        TypedValue::Optional {
            inner_type,
            value: None,
        }
    }

    pub fn list(element_type: TypeDescriptor, items: Vec<TypedValue>) -> Self {
        TypedValue::List {
            element_type,
            items,
        }
    }

    pub fn big_uint(value: impl Into<BigUint>) -> Self {
        TypedValue::BigUint(value.into())
    }

    pub fn bytes_from_utf8(text: &str) -> Self {
        TypedValue::Bytes(text.as_bytes().to_vec())
    }

    pub fn bytes_from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(hex_str).map(TypedValue::Bytes)
    }

    pub fn token_identifier(identifier: impl Into<String>) -> Self {
        TypedValue::TokenIdentifier(identifier.into())
    }

    /// True for an absent `Option` or `optional` value.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            TypedValue::Option { value: None, .. } | TypedValue::Optional { value: None, .. }
        )
    }

    /// The descriptor this value was constructed against.
    pub fn type_descriptor(&self) -> TypeDescriptor {
        use TypedValue::*;
        let primitive = |p| TypeDescriptor::primitive(p);
        match self {
            U8(_) => primitive(PrimitiveType::U8),
            U16(_) => primitive(PrimitiveType::U16),
            U32(_) => primitive(PrimitiveType::U32),
            U64(_) => primitive(PrimitiveType::U64),
            I8(_) => primitive(PrimitiveType::I8),
            I16(_) => primitive(PrimitiveType::I16),
            I32(_) => primitive(PrimitiveType::I32),
            I64(_) => primitive(PrimitiveType::I64),
            BigUint(_) => primitive(PrimitiveType::BigUint),
            BigInt(_) => primitive(PrimitiveType::BigInt),
            Bool(_) => primitive(PrimitiveType::Bool),
            Address(_) => primitive(PrimitiveType::Address),
            Bytes(_) => primitive(PrimitiveType::Bytes),
            Utf8String(_) => primitive(PrimitiveType::Utf8String),
            TokenIdentifier(_) => primitive(PrimitiveType::TokenIdentifier),
            H256(_) => primitive(PrimitiveType::H256),
            Option { inner_type, .. } => TypeDescriptor::option(inner_type.clone()),
            Optional { inner_type, .. } => TypeDescriptor::optional(inner_type.clone()),
            List { element_type, .. } => TypeDescriptor::list(element_type.clone()),
            Variadic { element_type, .. } => TypeDescriptor::variadic(element_type.clone()),
            Tuple(items) => TypeDescriptor::generic(
                GenericKind::Tuple,
                items.iter().map(|item| item.type_descriptor()).collect(),
            ),
            Array {
                element_type,
                items,
            } => TypeDescriptor::array(items.len(), element_type.clone()),
            Struct { descriptor, .. } | Enum { descriptor, .. } => descriptor.clone(),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TypedValue::*;
        match self {
            U8(n) => write!(f, "{}", n),
            U16(n) => write!(f, "{}", n),
            U32(n) => write!(f, "{}", n),
            U64(n) => write!(f, "{}", n),
            I8(n) => write!(f, "{}", n),
            I16(n) => write!(f, "{}", n),
            I32(n) => write!(f, "{}", n),
            I64(n) => write!(f, "{}", n),
            BigUint(n) => write!(f, "{}", n),
            BigInt(n) => write!(f, "{}", n),
            Bool(b) => write!(f, "{}", b),
            Address(a) => write!(f, "{}", a),
            Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Utf8String(s) => write!(f, "\"{}\"", s),
            TokenIdentifier(t) => write!(f, "{}", t),
            H256(h) => write!(f, "0x{}", hex::encode(h)),
            Option { value: None, .. } | Optional { value: None, .. } => write!(f, "None"),
            Option { value: Some(v), .. } | Optional { value: Some(v), .. } => {
                write!(f, "Some({})", v)
            }
            List { items, .. } | Variadic { items, .. } | Array { items, .. } => {
                write!(f, "[...({} items)]", items.len())
            }
            Tuple(items) => write!(f, "(...({} items))", items.len()),
            Struct { descriptor, .. } => write!(f, "{} {{...}}", descriptor),
            Enum {
                descriptor,
                discriminant,
                ..
            } => write!(f, "{}#{}", descriptor, discriminant),
        }
    }
}
