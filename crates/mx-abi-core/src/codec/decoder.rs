//! Bytes to value, guided by the declared type.

use super::EncodingMode;
use crate::error::CodecError;
use crate::typesystem::{
    Address, EnumVariantDefinition, GenericKind, PrimitiveType, TypeDescriptor, TypedValue,
};
use num_bigint::{BigInt, BigUint};

/// Upper bound on the item count of a list or array whose elements encode to
/// zero bytes, since the input length cannot bound it.
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 16;

/// Sequential reader over a nested-encoded byte stream.
pub struct NestedReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> NestedReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize, ty: &TypeDescriptor) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::underflow(ty, n, self.remaining()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self, ty: &TypeDescriptor) -> Result<u8, CodecError> {
        Ok(self.take(1, ty)?[0])
    }

    fn take_length(&mut self, ty: &TypeDescriptor) -> Result<usize, CodecError> {
        let bytes = self.take(4, ty)?;
        let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(len as usize)
    }

    fn take_prefixed(&mut self, ty: &TypeDescriptor) -> Result<&'a [u8], CodecError> {
        let len = self.take_length(ty)?;
        self.take(len, ty)
    }

    /// Reject an item count the remaining input cannot hold.
    fn check_count(
        &self,
        count: usize,
        element: &TypeDescriptor,
        ty: &TypeDescriptor,
    ) -> Result<(), CodecError> {
        match min_nested_width(element) {
            0 if count > MAX_ZERO_WIDTH_ITEMS => Err(CodecError::TooManyItems {
                type_name: ty.to_string(),
                count,
                limit: MAX_ZERO_WIDTH_ITEMS,
            }),
            0 => Ok(()),
            width => {
                let needed = count.saturating_mul(width);
                if needed > self.remaining() {
                    return Err(CodecError::underflow(ty, needed, self.remaining()));
                }
                Ok(())
            }
        }
    }

    /// Read one nested-encoded value of type `ty`.
    pub fn read(&mut self, ty: &TypeDescriptor) -> Result<TypedValue, CodecError> {
        match ty {
            TypeDescriptor::Primitive { name } => self.read_primitive(*name, ty),
            TypeDescriptor::Generic {
                name,
                type_parameters,
            } => self.read_generic(*name, type_parameters, ty),
            TypeDescriptor::Array { length, element } => {
                self.check_count(*length, element, ty)?;
                let mut items = Vec::with_capacity(*length);
                for _ in 0..*length {
                    items.push(self.read(element)?);
                }
                Ok(TypedValue::Array {
                    element_type: (**element).clone(),
                    items,
                })
            }
            TypeDescriptor::Struct { fields, .. } => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    values.push(self.read(&field.field_type)?);
                }
                Ok(TypedValue::Struct {
                    descriptor: ty.clone(),
                    fields: values,
                })
            }
            TypeDescriptor::Enum { variants, .. } => {
                let discriminant = self.take_u8(ty)?;
                let variant = find_variant(variants, discriminant, ty)?;
                let mut fields = Vec::with_capacity(variant.fields.len());
                for field in &variant.fields {
                    fields.push(self.read(&field.field_type)?);
                }
                Ok(TypedValue::Enum {
                    descriptor: ty.clone(),
                    discriminant,
                    fields,
                })
            }
        }
    }

    fn read_primitive(
        &mut self,
        primitive: PrimitiveType,
        ty: &TypeDescriptor,
    ) -> Result<TypedValue, CodecError> {
        if let Some(width) = primitive.fixed_width() {
            let bytes = self.take(width, ty)?;
            return fixed_from_bytes(primitive, bytes, ty);
        }
        let bytes = self.take_prefixed(ty)?;
        dynamic_from_bytes(primitive, bytes, ty)
    }

    fn read_generic(
        &mut self,
        kind: GenericKind,
        params: &[TypeDescriptor],
        ty: &TypeDescriptor,
    ) -> Result<TypedValue, CodecError> {
        match kind {
            GenericKind::Option => {
                let inner_type = single_parameter(params, ty)?;
                let value = match self.take_u8(ty)? {
                    0 => None,
                    1 => Some(Box::new(self.read(inner_type)?)),
                    discriminant => {
                        return Err(CodecError::InvalidDiscriminant {
                            type_name: ty.to_string(),
                            discriminant,
                        })
                    }
                };
                Ok(TypedValue::Option {
                    inner_type: inner_type.clone(),
                    value,
                })
            }
            GenericKind::List => {
                let element_type = single_parameter(params, ty)?;
                let count = self.take_length(ty)?;
                self.check_count(count, element_type, ty)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read(element_type)?);
                }
                Ok(TypedValue::List {
                    element_type: element_type.clone(),
                    items,
                })
            }
            GenericKind::Tuple => {
                let mut items = Vec::with_capacity(params.len());
                for param in params {
                    items.push(self.read(param)?);
                }
                Ok(TypedValue::Tuple(items))
            }
            GenericKind::Optional | GenericKind::Variadic => {
                Err(CodecError::NotNestable(ty.to_string()))
            }
        }
    }
}

/// Fewest bytes a nested value of type `ty` can occupy.
fn min_nested_width(ty: &TypeDescriptor) -> usize {
    match ty {
        TypeDescriptor::Primitive { name } => name.fixed_width().unwrap_or(4),
        TypeDescriptor::Generic {
            name,
            type_parameters,
        } => match name {
            GenericKind::Option => 1,
            GenericKind::List => 4,
            GenericKind::Tuple => type_parameters.iter().map(min_nested_width).sum(),
            GenericKind::Optional | GenericKind::Variadic => 0,
        },
        TypeDescriptor::Array { length, element } => {
            length.saturating_mul(min_nested_width(element))
        }
        TypeDescriptor::Struct { fields, .. } => fields
            .iter()
            .map(|f| min_nested_width(&f.field_type))
            .fold(0, usize::saturating_add),
        TypeDescriptor::Enum { .. } => 1,
    }
}

fn single_parameter<'t>(
    params: &'t [TypeDescriptor],
    ty: &TypeDescriptor,
) -> Result<&'t TypeDescriptor, CodecError> {
    params
        .first()
        .ok_or_else(|| CodecError::underflow(ty, 1, 0))
}

fn find_variant<'t>(
    variants: &'t [EnumVariantDefinition],
    discriminant: u8,
    ty: &TypeDescriptor,
) -> Result<&'t EnumVariantDefinition, CodecError> {
    variants
        .iter()
        .find(|v| v.discriminant == discriminant)
        .ok_or_else(|| CodecError::InvalidDiscriminant {
            type_name: ty.to_string(),
            discriminant,
        })
}

/// `bytes` has exactly the primitive's fixed width.
fn fixed_from_bytes(
    primitive: PrimitiveType,
    bytes: &[u8],
    ty: &TypeDescriptor,
) -> Result<TypedValue, CodecError> {
    let value = match primitive {
        PrimitiveType::U8 => TypedValue::U8(bytes[0]),
        PrimitiveType::I8 => TypedValue::I8(i8::from_be_bytes([bytes[0]])),
        PrimitiveType::U16 => TypedValue::U16(u16::from_be_bytes(array(bytes))),
        PrimitiveType::I16 => TypedValue::I16(i16::from_be_bytes(array(bytes))),
        PrimitiveType::U32 => TypedValue::U32(u32::from_be_bytes(array(bytes))),
        PrimitiveType::I32 => TypedValue::I32(i32::from_be_bytes(array(bytes))),
        PrimitiveType::U64 => TypedValue::U64(u64::from_be_bytes(array(bytes))),
        PrimitiveType::I64 => TypedValue::I64(i64::from_be_bytes(array(bytes))),
        PrimitiveType::Bool => match bytes[0] {
            0 => TypedValue::Bool(false),
            1 => TypedValue::Bool(true),
            discriminant => {
                return Err(CodecError::InvalidDiscriminant {
                    type_name: ty.to_string(),
                    discriminant,
                })
            }
        },
        PrimitiveType::Address => TypedValue::Address(Address(array(bytes))),
        PrimitiveType::H256 => TypedValue::H256(array(bytes)),
        _ => return dynamic_from_bytes(primitive, bytes, ty),
    };
    Ok(value)
}

/// Copy a slice whose length the caller already checked.
fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn dynamic_from_bytes(
    primitive: PrimitiveType,
    bytes: &[u8],
    ty: &TypeDescriptor,
) -> Result<TypedValue, CodecError> {
    let text = || String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8(ty.to_string()));
    let value = match primitive {
        PrimitiveType::BigUint => TypedValue::BigUint(BigUint::from_bytes_be(bytes)),
        PrimitiveType::BigInt => TypedValue::BigInt(BigInt::from_signed_bytes_be(bytes)),
        PrimitiveType::Utf8String => TypedValue::Utf8String(text()?),
        PrimitiveType::TokenIdentifier => TypedValue::TokenIdentifier(text()?),
        _ => TypedValue::Bytes(bytes.to_vec()),
    };
    Ok(value)
}

/// Widen a minimal top-level integer to the primitive's full width,
/// sign-extending signed types.
fn widen(bytes: &[u8], width: usize, signed: bool) -> Vec<u8> {
    let negative = signed && bytes.first().map_or(false, |b| b & 0x80 != 0);
    let fill = if negative { 0xff } else { 0x00 };
    let mut out = vec![fill; width - bytes.len()];
    out.extend_from_slice(bytes);
    out
}

/// Decode a value embedded inside a composite; the whole buffer must be used.
pub fn decode_nested(bytes: &[u8], ty: &TypeDescriptor) -> Result<TypedValue, CodecError> {
    let mut reader = NestedReader::new(bytes);
    let value = reader.read(ty)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes(reader.remaining(), ty.to_string()));
    }
    Ok(value)
}

/// Decode one call argument.
pub fn decode_top_level(bytes: &[u8], ty: &TypeDescriptor) -> Result<TypedValue, CodecError> {
    match ty {
        TypeDescriptor::Primitive { name } => match name.fixed_width() {
            Some(32) => {
                if bytes.len() > 32 {
                    return Err(CodecError::TrailingBytes(bytes.len() - 32, ty.to_string()));
                }
                decode_nested(bytes, ty)
            }
            Some(width) => {
                if bytes.len() > width {
                    return Err(CodecError::Overflow {
                        type_name: ty.to_string(),
                        width,
                    });
                }
                let full = widen(bytes, width, name.is_signed());
                fixed_from_bytes(*name, &full, ty)
            }
            None => dynamic_from_bytes(*name, bytes, ty),
        },
        TypeDescriptor::Generic {
            name,
            type_parameters,
        } => match name {
            GenericKind::Option | GenericKind::Optional => {
                let inner_type = single_parameter(type_parameters, ty)?.clone();
                // A present value with an empty encoding reads as absent.
                let value = if bytes.is_empty() {
                    None
                } else {
                    Some(Box::new(decode_top_level(bytes, &inner_type)?))
                };
                Ok(if *name == GenericKind::Option {
                    TypedValue::Option { inner_type, value }
                } else {
                    TypedValue::Optional { inner_type, value }
                })
            }
            GenericKind::List => {
                let element_type = single_parameter(type_parameters, ty)?;
                let mut reader = NestedReader::new(bytes);
                let mut items = Vec::new();
                while !reader.is_empty() {
                    let before = reader.remaining();
                    items.push(reader.read(element_type)?);
                    // Zero-width elements leave the count undetermined.
                    if reader.remaining() == before {
                        return Err(CodecError::TrailingBytes(before, ty.to_string()));
                    }
                }
                Ok(TypedValue::List {
                    element_type: element_type.clone(),
                    items,
                })
            }
            GenericKind::Variadic => Err(CodecError::MultiArgument(ty.to_string())),
            GenericKind::Tuple => decode_nested(bytes, ty),
        },
        _ => decode_nested(bytes, ty),
    }
}

/// Decode in the given mode.
pub fn decode(bytes: &[u8], ty: &TypeDescriptor, mode: EncodingMode) -> Result<TypedValue, CodecError> {
    match mode {
        EncodingMode::TopLevel => decode_top_level(bytes, ty),
        EncodingMode::Nested => decode_nested(bytes, ty),
    }
}

/// Decode a list of call arguments (or return values) against declared
/// types.
///
/// Missing trailing `Option`/`optional` arguments decode as absent and a
/// `variadic` consumes every remaining argument.
pub fn decode_arguments(
    arguments: &[Vec<u8>],
    types: &[TypeDescriptor],
) -> Result<Vec<TypedValue>, CodecError> {
    let mut values = Vec::with_capacity(types.len());
    let mut rest = arguments.iter();

    for (index, ty) in types.iter().enumerate() {
        if let Some(element_type) = ty.first_parameter(GenericKind::Variadic) {
            let items = rest
                .by_ref()
                .map(|arg| decode_top_level(arg, element_type))
                .collect::<Result<Vec<_>, _>>()?;
            values.push(TypedValue::Variadic {
                element_type: element_type.clone(),
                items,
            });
            continue;
        }

        match rest.next() {
            Some(arg) => values.push(decode_top_level(arg, ty)?),
            None => {
                let absent = ty
                    .first_parameter(GenericKind::Option)
                    .map(|inner| TypedValue::missing(inner.clone()))
                    .or_else(|| {
                        ty.first_parameter(GenericKind::Optional)
                            .map(|inner| TypedValue::optional_missing(inner.clone()))
                    });
                match absent {
                    Some(value) => values.push(value),
                    None => {
                        return Err(CodecError::MissingArgument {
                            index,
                            type_name: ty.to_string(),
                        })
                    }
                }
            }
        }
    }

    let unexpected = rest.count();
    if unexpected > 0 {
        return Err(CodecError::TooManyArguments(unexpected));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encoder::{encode_nested, encode_top_level};
    use crate::typesystem::FieldDefinition;

    fn status() -> TypeDescriptor {
        TypeDescriptor::Enum {
            name: "Status".to_string(),
            variants: vec![
                EnumVariantDefinition {
                    discriminant: 0,
                    name: "Inactive".to_string(),
                    fields: vec![],
                },
                EnumVariantDefinition {
                    discriminant: 1,
                    name: "Running".to_string(),
                    fields: vec![FieldDefinition {
                        name: "round".to_string(),
                        field_type: TypeDescriptor::u32(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_decode_short_stream_underflows() {
        let err = decode_nested(&[0, 0, 1], &TypeDescriptor::u32()).unwrap_err();
        assert_eq!(
            err,
            CodecError::Underflow {
                type_name: "u32".to_string(),
                needed: 4,
                available: 3
            }
        );

        let list = TypeDescriptor::list(TypeDescriptor::u32());
        assert!(matches!(
            decode_nested(&[0, 0, 0, 2, 0, 0, 0, 1], &list),
            Err(CodecError::Underflow { .. })
        ));
    }

    #[test]
    fn test_decode_bad_discriminants() {
        assert!(matches!(
            decode_nested(&[2], &status()),
            Err(CodecError::InvalidDiscriminant { discriminant: 2, .. })
        ));
        assert!(matches!(
            decode_nested(&[2, 0], &TypeDescriptor::option(TypeDescriptor::u8())),
            Err(CodecError::InvalidDiscriminant { discriminant: 2, .. })
        ));
        assert!(matches!(
            decode_top_level(&[7], &TypeDescriptor::primitive(PrimitiveType::Bool)),
            Err(CodecError::InvalidDiscriminant { discriminant: 7, .. })
        ));
    }

    #[test]
    fn test_list_count_bounded_by_input() {
        let list = TypeDescriptor::list(TypeDescriptor::u64());
        assert_eq!(
            decode_nested(&[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0], &list).unwrap_err(),
            CodecError::Underflow {
                type_name: "List<u64>".to_string(),
                needed: 0xffff_ffff * 8,
                available: 4
            }
        );
    }

    #[test]
    fn test_zero_width_elements_are_capped() {
        let empty = TypeDescriptor::array(0, TypeDescriptor::u8());
        let list = TypeDescriptor::list(empty.clone());

        let err = decode_nested(&[0x00, 0x40, 0x00, 0x00], &list).unwrap_err();
        assert_eq!(
            err,
            CodecError::TooManyItems {
                type_name: "List<array0<u8>>".to_string(),
                count: 0x0040_0000,
                limit: MAX_ZERO_WIDTH_ITEMS
            }
        );

        let decoded = decode_nested(&[0, 0, 0, 3], &list).unwrap();
        assert!(matches!(decoded, TypedValue::List { ref items, .. } if items.len() == 3));

        let unit = TypeDescriptor::Struct {
            name: "Unit".to_string(),
            fields: vec![],
        };
        let wide = TypeDescriptor::array(usize::MAX, unit);
        assert!(matches!(
            decode_nested(&[], &wide),
            Err(CodecError::TooManyItems { .. })
        ));

        assert_eq!(
            decode_top_level(&[1], &list).unwrap_err(),
            CodecError::TrailingBytes(1, "List<array0<u8>>".to_string())
        );
    }

    #[test]
    fn test_decode_trailing_bytes() {
        assert_eq!(
            decode_nested(&[1, 2], &TypeDescriptor::u8()).unwrap_err(),
            CodecError::TrailingBytes(1, "u8".to_string())
        );
    }

    #[test]
    fn test_top_level_accepts_minimal_integers() {
        assert_eq!(
            decode_top_level(&[5], &TypeDescriptor::u32()).unwrap(),
            TypedValue::U32(5)
        );
        assert_eq!(
            decode_top_level(&[], &TypeDescriptor::u64()).unwrap(),
            TypedValue::U64(0)
        );
        assert_eq!(
            decode_top_level(&[0xff], &TypeDescriptor::primitive(PrimitiveType::I32)).unwrap(),
            TypedValue::I32(-1)
        );
        assert_eq!(
            decode_top_level(&[], &TypeDescriptor::primitive(PrimitiveType::Bool)).unwrap(),
            TypedValue::Bool(false)
        );
        assert!(matches!(
            decode_top_level(&[1, 0], &TypeDescriptor::u8()),
            Err(CodecError::Overflow { width: 1, .. })
        ));
    }

    #[test]
    fn test_enum_round_trip() {
        let running = TypedValue::Enum {
            descriptor: status(),
            discriminant: 1,
            fields: vec![TypedValue::U32(9)],
        };
        let bytes = encode_nested(&running).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 9]);
        assert_eq!(decode_nested(&bytes, &status()).unwrap(), running);
        assert_eq!(decode_top_level(&bytes, &status()).unwrap(), running);
    }

    #[test]
    fn test_present_empty_top_level_option_reads_as_absent() {
        let cases = [
            (TypeDescriptor::big_uint(), TypedValue::big_uint(0u32)),
            (TypeDescriptor::bytes(), TypedValue::Bytes(vec![])),
        ];
        for (inner, value) in cases {
            let ty = TypeDescriptor::option(inner.clone());
            let present = TypedValue::some(value);

            let bytes = encode_top_level(&present).unwrap();
            assert!(bytes.is_empty());
            assert_eq!(
                decode_top_level(&bytes, &ty).unwrap(),
                TypedValue::missing(inner)
            );

            // The nested tag keeps the two apart.
            let nested = encode_nested(&present).unwrap();
            assert_eq!(decode_nested(&nested, &ty).unwrap(), present);
        }
    }

    #[test]
    fn test_top_level_list_round_trip() {
        let ty = TypeDescriptor::list(TypeDescriptor::bytes());
        let value = TypedValue::list(
            TypeDescriptor::bytes(),
            vec![
                TypedValue::bytes_from_utf8("a"),
                TypedValue::bytes_from_utf8("bc"),
            ],
        );
        let bytes = encode_top_level(&value).unwrap();
        assert_eq!(decode_top_level(&bytes, &ty).unwrap(), value);
    }

    #[test]
    fn test_decode_arguments_trailing_multi_values() {
        let types = vec![
            TypeDescriptor::u8(),
            TypeDescriptor::variadic(TypeDescriptor::u8()),
        ];
        let values = decode_arguments(&[vec![1], vec![2], vec![3]], &types).unwrap();
        assert_eq!(
            values[1],
            TypedValue::Variadic {
                element_type: TypeDescriptor::u8(),
                items: vec![TypedValue::U8(2), TypedValue::U8(3)],
            }
        );

        let types = vec![
            TypeDescriptor::u8(),
            TypeDescriptor::optional(TypeDescriptor::u8()),
        ];
        let values = decode_arguments(&[vec![1]], &types).unwrap();
        assert!(values[1].is_missing());

        assert_eq!(
            decode_arguments(&[], &types).unwrap_err(),
            CodecError::MissingArgument {
                index: 0,
                type_name: "u8".to_string()
            }
        );
        assert_eq!(
            decode_arguments(&[vec![1], vec![2], vec![3]], &types).unwrap_err(),
            CodecError::TooManyArguments(1)
        );
    }
}
