//! Type descriptors for MultiversX contract ABIs.
//!
//! Descriptors are pure data: two descriptors are the same type exactly when
//! they are structurally equal, which is what the derived `PartialEq` gives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Leaf types understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    BigUint,
    BigInt,
    Bool,
    Address,
    Bytes,
    Utf8String,
    TokenIdentifier,
    H256,
}

impl PrimitiveType {
    /// Resolve a primitive from its ABI spelling.
    pub fn from_abi_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "u8" => PrimitiveType::U8,
            "u16" => PrimitiveType::U16,
            "u32" | "usize" => PrimitiveType::U32,
            "u64" => PrimitiveType::U64,
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" | "isize" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "BigUint" => PrimitiveType::BigUint,
            "BigInt" => PrimitiveType::BigInt,
            "bool" => PrimitiveType::Bool,
            "Address" => PrimitiveType::Address,
            "bytes" => PrimitiveType::Bytes,
            "utf-8 string" => PrimitiveType::Utf8String,
            "TokenIdentifier" => PrimitiveType::TokenIdentifier,
            "H256" => PrimitiveType::H256,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn abi_name(&self) -> &'static str {
        match self {
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::BigUint => "BigUint",
            PrimitiveType::BigInt => "BigInt",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Address => "Address",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::Utf8String => "utf-8 string",
            PrimitiveType::TokenIdentifier => "TokenIdentifier",
            PrimitiveType::H256 => "H256",
        }
    }

    /// Encoded size for types that have one, in bytes.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            PrimitiveType::U8 | PrimitiveType::I8 | PrimitiveType::Bool => Some(1),
            PrimitiveType::U16 | PrimitiveType::I16 => Some(2),
            PrimitiveType::U32 | PrimitiveType::I32 => Some(4),
            PrimitiveType::U64 | PrimitiveType::I64 => Some(8),
            PrimitiveType::Address | PrimitiveType::H256 => Some(32),
            _ => None,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PrimitiveType::I8
                | PrimitiveType::I16
                | PrimitiveType::I32
                | PrimitiveType::I64
                | PrimitiveType::BigInt
        )
    }
}

/// Parametric type constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenericKind {
    Option,
    List,
    Tuple,
    /// Multi-value: zero or one top-level argument.
    Optional,
    /// Multi-value: any number of top-level arguments.
    Variadic,
}

impl GenericKind {
    pub fn from_abi_name(name: &str) -> Option<Self> {
        match name {
            "Option" => Some(GenericKind::Option),
            "List" | "vec" => Some(GenericKind::List),
            "tuple" => Some(GenericKind::Tuple),
            "optional" => Some(GenericKind::Optional),
            "variadic" => Some(GenericKind::Variadic),
            _ => None,
        }
    }

    pub fn abi_name(&self) -> &'static str {
        match self {
            GenericKind::Option => "Option",
            GenericKind::List => "List",
            GenericKind::Tuple => "tuple",
            GenericKind::Optional => "optional",
            GenericKind::Variadic => "variadic",
        }
    }

    /// Required number of type parameters; `None` means "one or more".
    pub fn arity(&self) -> Option<usize> {
        match self {
            GenericKind::Tuple => None,
            _ => Some(1),
        }
    }

    /// Multi-value types only make sense as direct call arguments.
    pub fn is_multi_value(&self) -> bool {
        matches!(self, GenericKind::Optional | GenericKind::Variadic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumVariantDefinition {
    pub discriminant: u8,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDefinition>,
}

/// Description of an ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive {
        name: PrimitiveType,
    },
    Generic {
        name: GenericKind,
        type_parameters: Vec<TypeDescriptor>,
    },
    /// Fixed-size array, spelled `arrayN<T>` in ABI documents.
    Array {
        length: usize,
        element: Box<TypeDescriptor>,
    },
    Struct {
        name: String,
        fields: Vec<FieldDefinition>,
    },
    Enum {
        name: String,
        variants: Vec<EnumVariantDefinition>,
    },
}

impl TypeDescriptor {
    pub fn primitive(name: PrimitiveType) -> Self {
        TypeDescriptor::Primitive { name }
    }

    pub fn generic(name: GenericKind, type_parameters: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Generic {
            name,
            type_parameters,
        }
    }

    pub fn option(inner: TypeDescriptor) -> Self {
        Self::generic(GenericKind::Option, vec![inner])
    }

    pub fn list(element: TypeDescriptor) -> Self {
        Self::generic(GenericKind::List, vec![element])
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::generic(GenericKind::Optional, vec![inner])
    }

    pub fn variadic(element: TypeDescriptor) -> Self {
        Self::generic(GenericKind::Variadic, vec![element])
    }

    pub fn tuple(items: Vec<TypeDescriptor>) -> Self {
        Self::generic(GenericKind::Tuple, items)
    }

    pub fn array(length: usize, element: TypeDescriptor) -> Self {
        TypeDescriptor::Array {
            length,
            element: Box::new(element),
        }
    }

    pub fn u8() -> Self {
        Self::primitive(PrimitiveType::U8)
    }

    pub fn u32() -> Self {
        Self::primitive(PrimitiveType::U32)
    }

    pub fn u64() -> Self {
        Self::primitive(PrimitiveType::U64)
    }

    pub fn big_uint() -> Self {
        Self::primitive(PrimitiveType::BigUint)
    }

    pub fn bytes() -> Self {
        Self::primitive(PrimitiveType::Bytes)
    }

    pub fn address() -> Self {
        Self::primitive(PrimitiveType::Address)
    }

    pub fn token_identifier() -> Self {
        Self::primitive(PrimitiveType::TokenIdentifier)
    }

    /// Type parameters of `self` if it is an instance of the `kind` generic.
    ///
    /// Matching `Option<u64>` against [`GenericKind::Option`] yields `[u64]`.
    pub fn generic_parameters(&self, kind: GenericKind) -> Option<&[TypeDescriptor]> {
        match self {
            TypeDescriptor::Generic {
                name,
                type_parameters,
            } if *name == kind => Some(type_parameters),
            _ => None,
        }
    }

    /// The single parameter of a one-argument generic such as `Option<T>`.
    pub fn first_parameter(&self, kind: GenericKind) -> Option<&TypeDescriptor> {
        self.generic_parameters(kind).and_then(|params| params.first())
    }

    pub fn is_multi_value(&self) -> bool {
        matches!(self, TypeDescriptor::Generic { name, .. } if name.is_multi_value())
    }

    /// Human-readable name, used in error messages.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive { name } => write!(f, "{}", name.abi_name()),
            TypeDescriptor::Generic {
                name,
                type_parameters,
            } => {
                let inner: Vec<String> = type_parameters.iter().map(|t| t.to_string()).collect();
                write!(f, "{}<{}>", name.abi_name(), inner.join(","))
            }
            TypeDescriptor::Array { length, element } => write!(f, "array{}<{}>", length, element),
            TypeDescriptor::Struct { name, .. } => write!(f, "{}", name),
            TypeDescriptor::Enum { name, .. } => write!(f, "{}", name),
        }
    }
}
