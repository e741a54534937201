//! ABI type descriptors, typed values and the type-string grammar.

pub mod json;
pub mod parser;
pub mod types;
pub mod value;

pub use parser::{parse_type, parse_type_expression, TypeExpression};
pub use types::{EnumVariantDefinition, FieldDefinition, GenericKind, PrimitiveType, TypeDescriptor};
pub use value::{Address, TypedValue};
