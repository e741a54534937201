//! Type-string grammar for ABI documents.
//!
//! ```text
//! type := ident | ident '<' type (',' type)* '>'
//! ```
//!
//! Identifiers may contain spaces and dashes (`utf-8 string`), so they run
//! until the next `<`, `>` or `,`. Parsing happens in two steps: the grammar
//! yields a [`TypeExpression`], which is then resolved against primitives,
//! generic constructors and the custom types of the document.

use super::types::{GenericKind, PrimitiveType, TypeDescriptor};
use crate::error::AbiError;
use std::collections::HashMap;

/// Deepest `<...>` nesting accepted in a type string.
pub const MAX_TYPE_DEPTH: usize = 64;

/// Unresolved `Name<Args>` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpression {
    pub name: String,
    pub arguments: Vec<TypeExpression>,
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> AbiError {
        AbiError::malformed(self.input, reason)
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    fn identifier(&mut self) -> Result<String, AbiError> {
        let rest = &self.input[self.pos..];
        let end = rest
            .find(|c| matches!(c, '<' | '>' | ','))
            .unwrap_or(rest.len());
        let ident = rest[..end].trim();
        if ident.is_empty() {
            return Err(self.error(format!("expected a type name at offset {}", self.pos)));
        }
        self.pos += end;
        Ok(ident.to_string())
    }

    fn expression(&mut self, depth: usize) -> Result<TypeExpression, AbiError> {
        let name = self.identifier()?;
        let mut arguments = Vec::new();

        if self.eat('<') {
            if depth >= MAX_TYPE_DEPTH {
                return Err(self.error(format!(
                    "type parameters nested deeper than {} levels",
                    MAX_TYPE_DEPTH
                )));
            }
            loop {
                arguments.push(self.expression(depth + 1)?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error(format!("expected ',' or '>' after '{}'", name)));
            }
        }

        Ok(TypeExpression { name, arguments })
    }
}

/// Parse the grammar only, without resolving names.
pub fn parse_type_expression(input: &str) -> Result<TypeExpression, AbiError> {
    let mut cursor = Cursor::new(input);
    let expr = cursor.expression(0)?;
    if !cursor.at_end() {
        return Err(cursor.error(format!(
            "unexpected trailing input '{}'",
            &input[cursor.pos..]
        )));
    }
    Ok(expr)
}

/// `array32` -> `Some(32)`.
fn array_length(name: &str) -> Option<usize> {
    let digits = name.strip_prefix("array")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Resolve a parsed expression. `lookup` is asked for every identifier that
/// is neither a primitive nor a generic constructor.
pub fn resolve_type_expression<F>(
    expr: &TypeExpression,
    source: &str,
    lookup: &mut F,
) -> Result<TypeDescriptor, AbiError>
where
    F: FnMut(&str) -> Result<Option<TypeDescriptor>, AbiError>,
{
    let name = expr.name.as_str();

    if let Some(primitive) = PrimitiveType::from_abi_name(name) {
        if !expr.arguments.is_empty() {
            return Err(AbiError::malformed(
                source,
                format!("'{}' does not take type parameters", name),
            ));
        }
        return Ok(TypeDescriptor::primitive(primitive));
    }

    if let Some(kind) = GenericKind::from_abi_name(name) {
        let count = expr.arguments.len();
        let arity_ok = match kind.arity() {
            Some(expected) => count == expected,
            None => count > 0,
        };
        if !arity_ok {
            return Err(AbiError::malformed(
                source,
                format!("'{}' given {} type parameter(s)", name, count),
            ));
        }
        let type_parameters = expr
            .arguments
            .iter()
            .map(|arg| resolve_type_expression(arg, source, lookup))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TypeDescriptor::generic(kind, type_parameters));
    }

    if let Some(length) = array_length(name) {
        if expr.arguments.len() != 1 {
            return Err(AbiError::malformed(
                source,
                format!("'{}' takes exactly one type parameter", name),
            ));
        }
        let element = resolve_type_expression(&expr.arguments[0], source, lookup)?;
        return Ok(TypeDescriptor::array(length, element));
    }

    match lookup(name)? {
        Some(custom) if expr.arguments.is_empty() => Ok(custom),
        Some(_) => Err(AbiError::malformed(
            source,
            format!("custom type '{}' does not take type parameters", name),
        )),
        None => Err(AbiError::malformed(source, format!("unknown type '{}'", name))),
    }
}

/// Parse and resolve a type string against already-resolved custom types.
pub fn parse_type(
    input: &str,
    custom_types: &HashMap<String, TypeDescriptor>,
) -> Result<TypeDescriptor, AbiError> {
    let expr = parse_type_expression(input)?;
    resolve_type_expression(&expr, input, &mut |name: &str| {
        Ok(custom_types.get(name).cloned())
    })
}
