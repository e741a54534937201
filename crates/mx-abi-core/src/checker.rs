//! Interaction checker.
//!
//! Validates a proposed call before it is encoded: payability first, then
//! the argument count, then each argument's type against the declared input.

use crate::abi::EndpointDefinition;
use crate::error::{InteractionError, TransferredAsset};
use crate::typesystem::{GenericKind, TypeDescriptor, TypedValue};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single ESDT transfer attached to a call. `nonce` is zero for fungible
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub token_identifier: String,
    pub nonce: u64,
    pub amount: BigUint,
}

impl TokenTransfer {
    pub fn fungible(token_identifier: impl Into<String>, amount: impl Into<BigUint>) -> Self {
        Self {
            token_identifier: token_identifier.into(),
            nonce: 0,
            amount: amount.into(),
        }
    }

    pub fn non_fungible(
        token_identifier: impl Into<String>,
        nonce: u64,
        amount: impl Into<BigUint>,
    ) -> Self {
        Self {
            token_identifier: token_identifier.into(),
            nonce,
            amount: amount.into(),
        }
    }

    pub fn is_fungible(&self) -> bool {
        self.nonce == 0
    }
}

/// Everything a call transfers to the contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredValue {
    pub egld: BigUint,
    #[serde(default)]
    pub tokens: Vec<TokenTransfer>,
}

impl TransferredValue {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn egld(amount: impl Into<BigUint>) -> Self {
        Self {
            egld: amount.into(),
            tokens: Vec::new(),
        }
    }

    pub fn tokens(tokens: Vec<TokenTransfer>) -> Self {
        Self {
            egld: BigUint::zero(),
            tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.egld.is_zero() && self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionChecker;

impl InteractionChecker {
    pub fn new() -> Self {
        Self
    }

    /// Validate `arguments` and `transferred` against `endpoint`.
    pub fn check(
        &self,
        endpoint: &EndpointDefinition,
        arguments: &[TypedValue],
        transferred: &TransferredValue,
    ) -> Result<(), InteractionError> {
        let verdict = self
            .check_payability(endpoint, transferred)
            .and_then(|_| self.check_arity(endpoint, arguments))
            .and_then(|_| self.check_arguments(endpoint, arguments));

        match &verdict {
            Ok(()) => debug!("Interaction accepted: endpoint={}", endpoint.name),
            Err(e) => debug!("Interaction rejected: endpoint={}, reason={}", endpoint.name, e),
        }
        verdict
    }

    fn check_payability(
        &self,
        endpoint: &EndpointDefinition,
        transferred: &TransferredValue,
    ) -> Result<(), InteractionError> {
        if !transferred.egld.is_zero() && !endpoint.is_payable_in_egld() {
            return Err(InteractionError::PayabilityViolation(TransferredAsset::Egld));
        }
        if let Some(refused) = transferred
            .tokens
            .iter()
            .find(|t| !endpoint.is_payable_in_token(&t.token_identifier))
        {
            return Err(InteractionError::PayabilityViolation(
                TransferredAsset::Token(refused.token_identifier.clone()),
            ));
        }
        Ok(())
    }

    /// Every declared input must be supplied, absent `Option` and `optional`
    /// values included.
    fn check_arity(
        &self,
        endpoint: &EndpointDefinition,
        arguments: &[TypedValue],
    ) -> Result<(), InteractionError> {
        if arguments.len() != endpoint.inputs.len() {
            return Err(InteractionError::ArityMismatch {
                expected: endpoint.inputs.len(),
                actual: arguments.len(),
            });
        }
        Ok(())
    }

    fn check_arguments(
        &self,
        endpoint: &EndpointDefinition,
        arguments: &[TypedValue],
    ) -> Result<(), InteractionError> {
        for (index, (argument, input)) in arguments.iter().zip(&endpoint.inputs).enumerate() {
            if !is_compatible(&input.param_type, argument) {
                let expected = input.param_type.to_string();
                let mut actual = argument.type_descriptor().to_string();
                // The value claims the declared type but its contents disagree.
                if actual == expected {
                    actual.push_str(" with non-conforming contents");
                }
                return Err(InteractionError::TypeMismatch {
                    index,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Whether `argument` may be passed where `declared` is expected.
///
/// Structural match, except that `Option<T>` and `optional<T>` are
/// transparent at the argument boundary: an absent value, a bare `T`, or
/// either wrapper around `T` is accepted. Below the boundary every item,
/// field and variant is checked against the declared type, not against the
/// type the value claims.
pub fn is_compatible(declared: &TypeDescriptor, argument: &TypedValue) -> bool {
    if conforms(declared, argument) {
        return true;
    }

    let inner = declared
        .first_parameter(GenericKind::Option)
        .or_else(|| declared.first_parameter(GenericKind::Optional));
    let Some(inner) = inner else {
        return false;
    };

    match argument {
        TypedValue::Option { value: None, .. } | TypedValue::Optional { value: None, .. } => true,
        TypedValue::Option {
            inner_type,
            value: Some(value),
        }
        | TypedValue::Optional {
            inner_type,
            value: Some(value),
        } => inner_type == inner && conforms(inner, value),
        _ => conforms(inner, argument),
    }
}

/// Whether `value` is a well-formed value of type `ty`.
fn conforms(ty: &TypeDescriptor, value: &TypedValue) -> bool {
    match (ty, value) {
        (TypeDescriptor::Primitive { .. }, _) => value.type_descriptor() == *ty,
        (
            TypeDescriptor::Generic {
                name,
                type_parameters,
            },
            _,
        ) => conforms_generic(*name, type_parameters, value),
        (
            TypeDescriptor::Array { length, element },
            TypedValue::Array {
                element_type,
                items,
            },
        ) => {
            items.len() == *length
                && **element == *element_type
                && items.iter().all(|item| conforms(element, item))
        }
        (
            TypeDescriptor::Struct { fields, .. },
            TypedValue::Struct {
                descriptor,
                fields: values,
            },
        ) => {
            descriptor == ty
                && fields.len() == values.len()
                && fields
                    .iter()
                    .zip(values)
                    .all(|(field, value)| conforms(&field.field_type, value))
        }
        (
            TypeDescriptor::Enum { variants, .. },
            TypedValue::Enum {
                descriptor,
                discriminant,
                fields: values,
            },
        ) => {
            descriptor == ty
                && variants
                    .iter()
                    .find(|v| v.discriminant == *discriminant)
                    .map_or(false, |variant| {
                        variant.fields.len() == values.len()
                            && variant
                                .fields
                                .iter()
                                .zip(values)
                                .all(|(field, value)| conforms(&field.field_type, value))
                    })
        }
        _ => false,
    }
}

fn conforms_generic(kind: GenericKind, params: &[TypeDescriptor], value: &TypedValue) -> bool {
    let single = match params {
        [single] => Some(single),
        _ => None,
    };
    match (kind, value) {
        (GenericKind::Option, TypedValue::Option { inner_type, value })
        | (GenericKind::Optional, TypedValue::Optional { inner_type, value }) => {
            single == Some(inner_type)
                && value
                    .as_deref()
                    .map_or(true, |inner| conforms(inner_type, inner))
        }
        (
            GenericKind::List,
            TypedValue::List {
                element_type,
                items,
            },
        )
        | (
            GenericKind::Variadic,
            TypedValue::Variadic {
                element_type,
                items,
            },
        ) => {
            single == Some(element_type) && items.iter().all(|item| conforms(element_type, item))
        }
        (GenericKind::Tuple, TypedValue::Tuple(items)) => {
            params.len() == items.len()
                && params
                    .iter()
                    .zip(items)
                    .all(|(param, item)| conforms(param, item))
        }
        _ => false,
    }
}
