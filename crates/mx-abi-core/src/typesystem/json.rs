//! Conversion between JSON literals and typed values.
//!
//! Used to take call arguments from text (CLI flags, request bodies) and to
//! show decoded values. The declared type drives the parse, so `5` becomes a
//! `u32` or a `BigUint` depending on what the endpoint expects.

use super::types::{
    EnumVariantDefinition, FieldDefinition, GenericKind, PrimitiveType, TypeDescriptor,
};
use super::value::{Address, TypedValue};
use crate::error::ValueError;
use num_bigint::{BigInt, BigUint};
use serde_json::{json, Map, Value};
use std::str::FromStr;

impl TypedValue {
    /// Build a value of type `ty` from a JSON literal.
    pub fn from_json(json: &Value, ty: &TypeDescriptor) -> Result<Self, ValueError> {
        match ty {
            TypeDescriptor::Primitive { name } => primitive_from_json(json, *name),
            TypeDescriptor::Generic {
                name,
                type_parameters,
            } => generic_from_json(json, *name, type_parameters, ty),
            TypeDescriptor::Array { length, element } => {
                let items = items_from_json(json, element, ty)?;
                if items.len() != *length {
                    return Err(ValueError::LengthMismatch {
                        type_name: ty.to_string(),
                        expected: *length,
                        actual: items.len(),
                    });
                }
                Ok(TypedValue::Array {
                    element_type: (**element).clone(),
                    items,
                })
            }
            TypeDescriptor::Struct { fields, .. } => Ok(TypedValue::Struct {
                descriptor: ty.clone(),
                fields: fields_from_json(json, fields, ty)?,
            }),
            TypeDescriptor::Enum { variants, .. } => enum_from_json(json, variants, ty),
        }
    }

    /// Render as JSON. Integers wider than 64 bits become decimal strings and
    /// byte strings become hex.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::U8(n) => json!(n),
            TypedValue::U16(n) => json!(n),
            TypedValue::U32(n) => json!(n),
            TypedValue::U64(n) => json!(n),
            TypedValue::I8(n) => json!(n),
            TypedValue::I16(n) => json!(n),
            TypedValue::I32(n) => json!(n),
            TypedValue::I64(n) => json!(n),
            TypedValue::BigUint(n) => json!(n.to_string()),
            TypedValue::BigInt(n) => json!(n.to_string()),
            TypedValue::Bool(b) => json!(b),
            TypedValue::Address(a) => json!(a.to_hex()),
            TypedValue::Bytes(b) => json!(hex::encode(b)),
            TypedValue::Utf8String(s) | TypedValue::TokenIdentifier(s) => json!(s),
            TypedValue::H256(h) => json!(hex::encode(h)),
            TypedValue::Option { value, .. } | TypedValue::Optional { value, .. } => value
                .as_ref()
                .map(|inner| inner.to_json())
                .unwrap_or(Value::Null),
            TypedValue::List { items, .. }
            | TypedValue::Variadic { items, .. }
            | TypedValue::Array { items, .. }
            | TypedValue::Tuple(items) => Value::Array(items.iter().map(|i| i.to_json()).collect()),
            TypedValue::Struct { descriptor, fields } => match descriptor {
                TypeDescriptor::Struct {
                    fields: definitions,
                    ..
                } => fields_to_json(definitions, fields),
                _ => Value::Array(fields.iter().map(|f| f.to_json()).collect()),
            },
            TypedValue::Enum {
                descriptor,
                discriminant,
                fields,
            } => {
                let variant = match descriptor {
                    TypeDescriptor::Enum { variants, .. } => {
                        variants.iter().find(|v| v.discriminant == *discriminant)
                    }
                    _ => None,
                };
                match variant {
                    Some(v) if fields.is_empty() => json!(v.name),
                    Some(v) => json!({
                        "name": v.name,
                        "fields": fields_to_json(&v.fields, fields),
                    }),
                    None => json!({ "discriminant": discriminant }),
                }
            }
        }
    }
}

fn fields_to_json(definitions: &[FieldDefinition], values: &[TypedValue]) -> Value {
    let mut object = Map::new();
    for (definition, value) in definitions.iter().zip(values) {
        object.insert(definition.name.clone(), value.to_json());
    }
    Value::Object(object)
}

/// Numbers may arrive as JSON numbers or as decimal strings.
fn integer_literal(json: &Value) -> Option<String> {
    match json {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn parse_integer<T: FromStr>(json: &Value, primitive: PrimitiveType) -> Result<T, ValueError> {
    integer_literal(json)
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| ValueError::invalid(primitive.abi_name(), json))
}

fn hex_literal(json: &Value, expected: &str) -> Result<Vec<u8>, ValueError> {
    let text = json
        .as_str()
        .ok_or_else(|| ValueError::invalid(expected, json))?;
    let trimmed = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(trimmed).map_err(|_| ValueError::invalid(expected, json))
}

fn fixed_32(json: &Value, expected: &str) -> Result<[u8; 32], ValueError> {
    let bytes = hex_literal(json, expected)?;
    bytes
        .try_into()
        .map_err(|_| ValueError::invalid(format!("{} (32 bytes as hex)", expected), json))
}

fn string_literal(json: &Value, expected: &str) -> Result<String, ValueError> {
    json.as_str()
        .map(str::to_string)
        .ok_or_else(|| ValueError::invalid(expected, json))
}

fn primitive_from_json(json: &Value, primitive: PrimitiveType) -> Result<TypedValue, ValueError> {
    let value = match primitive {
        PrimitiveType::U8 => TypedValue::U8(parse_integer(json, primitive)?),
        PrimitiveType::U16 => TypedValue::U16(parse_integer(json, primitive)?),
        PrimitiveType::U32 => TypedValue::U32(parse_integer(json, primitive)?),
        PrimitiveType::U64 => TypedValue::U64(parse_integer(json, primitive)?),
        PrimitiveType::I8 => TypedValue::I8(parse_integer(json, primitive)?),
        PrimitiveType::I16 => TypedValue::I16(parse_integer(json, primitive)?),
        PrimitiveType::I32 => TypedValue::I32(parse_integer(json, primitive)?),
        PrimitiveType::I64 => TypedValue::I64(parse_integer(json, primitive)?),
        PrimitiveType::BigUint => TypedValue::BigUint(parse_integer::<BigUint>(json, primitive)?),
        PrimitiveType::BigInt => TypedValue::BigInt(parse_integer::<BigInt>(json, primitive)?),
        PrimitiveType::Bool => match json {
            Value::Bool(b) => TypedValue::Bool(*b),
            _ => return Err(ValueError::invalid("bool", json)),
        },
        PrimitiveType::Address => TypedValue::Address(Address(fixed_32(json, "Address")?)),
        PrimitiveType::H256 => TypedValue::H256(fixed_32(json, "H256")?),
        PrimitiveType::Bytes => TypedValue::Bytes(hex_literal(json, "bytes (hex)")?),
        PrimitiveType::Utf8String => TypedValue::Utf8String(string_literal(json, "utf-8 string")?),
        PrimitiveType::TokenIdentifier => {
            let identifier = string_literal(json, "TokenIdentifier")?;
            if identifier.is_empty() || !identifier.is_ascii() {
                return Err(ValueError::invalid("TokenIdentifier", json));
            }
            TypedValue::TokenIdentifier(identifier)
        }
    };
    Ok(value)
}

fn items_from_json(
    json: &Value,
    element: &TypeDescriptor,
    container: &TypeDescriptor,
) -> Result<Vec<TypedValue>, ValueError> {
    let array = json
        .as_array()
        .ok_or_else(|| ValueError::invalid(format!("{} (JSON array)", container), json))?;
    array
        .iter()
        .enumerate()
        .map(|(i, item)| {
            TypedValue::from_json(item, element)
                .map_err(|e| e.with_context(format!("{} element {}", container, i)))
        })
        .collect()
}

fn generic_from_json(
    json: &Value,
    kind: GenericKind,
    params: &[TypeDescriptor],
    ty: &TypeDescriptor,
) -> Result<TypedValue, ValueError> {
    let first = || {
        params
            .first()
            .cloned()
            .ok_or_else(|| ValueError::invalid("a type parameter", ty))
    };
    match kind {
        GenericKind::Option | GenericKind::Optional => {
            let inner_type = first()?;
            let value = match json {
                Value::Null => None,
                other => Some(Box::new(TypedValue::from_json(other, &inner_type)?)),
            };
            Ok(if kind == GenericKind::Option {
                TypedValue::Option { inner_type, value }
            } else {
                TypedValue::Optional { inner_type, value }
            })
        }
        GenericKind::List | GenericKind::Variadic => {
            let element_type = first()?;
            let items = items_from_json(json, &element_type, ty)?;
            Ok(if kind == GenericKind::List {
                TypedValue::List {
                    element_type,
                    items,
                }
            } else {
                TypedValue::Variadic {
                    element_type,
                    items,
                }
            })
        }
        GenericKind::Tuple => {
            let array = json
                .as_array()
                .ok_or_else(|| ValueError::invalid(format!("{} (JSON array)", ty), json))?;
            if array.len() != params.len() {
                return Err(ValueError::LengthMismatch {
                    type_name: ty.to_string(),
                    expected: params.len(),
                    actual: array.len(),
                });
            }
            let items = array
                .iter()
                .zip(params)
                .enumerate()
                .map(|(i, (item, param))| {
                    TypedValue::from_json(item, param)
                        .map_err(|e| e.with_context(format!("{} item {}", ty, i)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypedValue::Tuple(items))
        }
    }
}

/// Fields come either as an object keyed by field name or as an array in
/// declaration order.
fn fields_from_json(
    json: &Value,
    definitions: &[FieldDefinition],
    owner: &TypeDescriptor,
) -> Result<Vec<TypedValue>, ValueError> {
    match json {
        Value::Object(object) => {
            if let Some(unknown) = object
                .keys()
                .find(|k| !definitions.iter().any(|d| &d.name == *k))
            {
                return Err(ValueError::UnknownMember {
                    type_name: owner.to_string(),
                    name: unknown.clone(),
                });
            }
            definitions
                .iter()
                .map(|definition| {
                    let field = object.get(&definition.name).ok_or_else(|| {
                        ValueError::invalid(
                            format!("field '{}' of {}", definition.name, owner),
                            "nothing",
                        )
                    })?;
                    TypedValue::from_json(field, &definition.field_type)
                        .map_err(|e| e.with_context(format!("{}.{}", owner, definition.name)))
                })
                .collect()
        }
        Value::Array(items) => {
            if items.len() != definitions.len() {
                return Err(ValueError::LengthMismatch {
                    type_name: owner.to_string(),
                    expected: definitions.len(),
                    actual: items.len(),
                });
            }
            items
                .iter()
                .zip(definitions)
                .map(|(item, definition)| {
                    TypedValue::from_json(item, &definition.field_type)
                        .map_err(|e| e.with_context(format!("{}.{}", owner, definition.name)))
                })
                .collect()
        }
        other => Err(ValueError::invalid(
            format!("{} (JSON object or array)", owner),
            other,
        )),
    }
}

fn enum_from_json(
    json: &Value,
    variants: &[EnumVariantDefinition],
    ty: &TypeDescriptor,
) -> Result<TypedValue, ValueError> {
    let (name, fields_json) = match json {
        Value::String(name) => (name.as_str(), None),
        Value::Object(object) => {
            let name = object
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| ValueError::invalid(format!("{} variant name", ty), json))?;
            (name, object.get("fields"))
        }
        other => return Err(ValueError::invalid(format!("{} variant", ty), other)),
    };

    let variant = variants
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| ValueError::UnknownMember {
            type_name: ty.to_string(),
            name: name.to_string(),
        })?;

    let fields = match fields_json {
        Some(fields_json) => fields_from_json(fields_json, &variant.fields, ty)?,
        None if variant.fields.is_empty() => Vec::new(),
        None => {
            return Err(ValueError::invalid(
                format!("fields for {}::{}", ty, variant.name),
                "nothing",
            ))
        }
    };

    Ok(TypedValue::Enum {
        descriptor: ty.clone(),
        discriminant: variant.discriminant,
        fields,
    })
}
