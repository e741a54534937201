//! Error types surfaced by the ABI toolkit.
//!
//! Every variant describes rejected input (a bad interface document, a bad
//! call, or a bad byte stream), never an internal fault.

use thiserror::Error;

/// Failures while loading an interface document or resolving names in it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("malformed type '{type_name}': {reason}")]
    MalformedType { type_name: String, reason: String },

    #[error("endpoint '{0}' not found")]
    UnknownEndpoint(String),

    #[error("contract interface '{0}' not found in registry")]
    UnknownInterface(String),

    #[error("invalid ABI document: {0}")]
    InvalidDocument(String),
}

impl AbiError {
    pub fn malformed(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        AbiError::MalformedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Failures while encoding or decoding typed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("cannot decode {type_name}: needed {needed} more byte(s), {available} available")]
    Underflow {
        type_name: String,
        needed: usize,
        available: usize,
    },

    #[error("invalid discriminant {discriminant} for {type_name}")]
    InvalidDiscriminant { type_name: String, discriminant: u8 },

    #[error("{0} trailing byte(s) after decoding {1}")]
    TrailingBytes(usize, String),

    #[error("value of {type_name} does not fit in {width} byte(s)")]
    Overflow { type_name: String, width: usize },

    #[error("{0} is a multi-value type and cannot be nested")]
    NotNestable(String),

    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(String),

    #[error("{0} spans several arguments; encode it as part of an argument list")]
    MultiArgument(String),

    #[error("missing argument {index} of type {type_name}")]
    MissingArgument { index: usize, type_name: String },

    #[error("{type_name} declares {count} zero-width items, more than the limit of {limit}")]
    TooManyItems {
        type_name: String,
        count: usize,
        limit: usize,
    },

    #[error("too many arguments: {0} unexpected trailing argument(s)")]
    TooManyArguments(usize),
}

impl CodecError {
    pub(crate) fn underflow(type_name: impl std::fmt::Display, needed: usize, available: usize) -> Self {
        CodecError::Underflow {
            type_name: type_name.to_string(),
            needed,
            available,
        }
    }
}

/// Failures while building a typed value from a JSON literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected}, got {found}")]
    InvalidLiteral { expected: String, found: String },

    #[error("{type_name} expects {expected} item(s), got {actual}")]
    LengthMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("{type_name} has no variant or field named '{name}'")]
    UnknownMember { type_name: String, name: String },

    #[error("{context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ValueError>,
    },
}

impl ValueError {
    pub fn invalid(expected: impl Into<String>, found: impl std::fmt::Display) -> Self {
        ValueError::InvalidLiteral {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    pub fn with_context(self, context: impl Into<String>) -> Self {
        ValueError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Failures while reading call data back into a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("call data has no function name")]
    MissingFunction,

    #[error("argument {index} is not valid hex: {reason}")]
    InvalidHex { index: usize, reason: String },
}

/// Rejections produced while validating or preparing a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("cannot send {0} to non-payable")]
    PayabilityViolation(TransferredAsset),

    #[error("bad arguments, expected: {expected}, got: {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("type mismatch at index {index}, expected: {expected}, got: {actual}")]
    TypeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("{0} token transfer(s) require an explicit receiver address")]
    MissingReceiver(usize),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The asset an endpoint refused to receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferredAsset {
    Egld,
    Token(String),
}

impl std::fmt::Display for TransferredAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferredAsset::Egld => write!(f, "EGLD value"),
            TransferredAsset::Token(id) => write!(f, "token {}", id),
        }
    }
}
