//! Endpoint signatures.

use crate::codec::decode_arguments;
use crate::error::CodecError;
use crate::typesystem::{TypeDescriptor, TypedValue};
use serde::{Deserialize, Serialize};

/// Payability marker for the native asset inside `payableInTokens`.
pub const EGLD_TOKEN: &str = "EGLD";

/// Payability marker that accepts any asset.
pub const ANY_TOKEN: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    #[serde(rename = "readonly")]
    ReadOnly,
    Mutable,
}

impl Mutability {
    /// ABI documents spell it `readonly` or `mutable`; anything else is
    /// treated as mutable.
    pub fn from_abi(value: Option<&str>) -> Self {
        match value {
            Some("readonly") => Mutability::ReadOnly,
            _ => Mutability::Mutable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    pub inputs: Vec<ParameterDefinition>,
    pub outputs: Vec<ParameterDefinition>,
    pub mutability: Mutability,
    pub payable_in_egld: bool,
    /// Token identifiers, `*`, or `!ID` exclusions. Never contains `EGLD`.
    pub payable_in_tokens: Vec<String>,
}

impl EndpointDefinition {
    /// Build from the raw `payableInTokens` list, splitting out the native
    /// asset.
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<ParameterDefinition>,
        outputs: Vec<ParameterDefinition>,
        mutability: Mutability,
        payable_in: &[String],
    ) -> Self {
        let excluded_egld = payable_in.iter().any(|t| t == &format!("!{}", EGLD_TOKEN));
        let payable_in_egld = payable_in
            .iter()
            .any(|t| t == EGLD_TOKEN || (t == ANY_TOKEN && !excluded_egld));
        let payable_in_tokens = payable_in
            .iter()
            .filter(|t| t.as_str() != EGLD_TOKEN && t.as_str() != format!("!{}", EGLD_TOKEN))
            .cloned()
            .collect();

        Self {
            name: name.into(),
            docs: Vec::new(),
            inputs,
            outputs,
            mutability,
            payable_in_egld,
            payable_in_tokens,
        }
    }

    pub fn with_docs(mut self, docs: Vec<String>) -> Self {
        self.docs = docs;
        self
    }

    pub fn input_types(&self) -> Vec<TypeDescriptor> {
        self.inputs.iter().map(|p| p.param_type.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<TypeDescriptor> {
        self.outputs.iter().map(|p| p.param_type.clone()).collect()
    }

    pub fn is_readonly(&self) -> bool {
        self.mutability == Mutability::ReadOnly
    }

    pub fn is_payable_in_egld(&self) -> bool {
        self.payable_in_egld
    }

    /// Whether a transfer of `token_identifier` is accepted. An explicit
    /// listing wins over an exclusion, which wins over the wildcard.
    pub fn is_payable_in_token(&self, token_identifier: &str) -> bool {
        if token_identifier == EGLD_TOKEN {
            return self.payable_in_egld;
        }
        let listed = |entry: &str| self.payable_in_tokens.iter().any(|t| t == entry);
        if listed(token_identifier) {
            return true;
        }
        if listed(&format!("!{}", token_identifier)) {
            return false;
        }
        listed(ANY_TOKEN)
    }

    pub fn is_payable(&self) -> bool {
        self.payable_in_egld || !self.payable_in_tokens.is_empty()
    }

    /// Decode raw return data against the declared outputs.
    pub fn decode_outputs(&self, return_data: &[Vec<u8>]) -> Result<Vec<TypedValue>, CodecError> {
        decode_arguments(return_data, &self.output_types())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(payable_in: &[&str]) -> EndpointDefinition {
        let payable_in: Vec<String> = payable_in.iter().map(|s| s.to_string()).collect();
        EndpointDefinition::new("buy_ticket", vec![], vec![], Mutability::Mutable, &payable_in)
    }

    #[test]
    fn test_not_payable() {
        let e = endpoint(&[]);
        assert!(!e.is_payable());
        assert!(!e.is_payable_in_egld());
        assert!(!e.is_payable_in_token("LUCKY-a1b2c3"));
    }

    #[test]
    fn test_egld_only() {
        let e = endpoint(&["EGLD"]);
        assert!(e.is_payable_in_egld());
        assert!(e.payable_in_tokens.is_empty());
        assert!(!e.is_payable_in_token("LUCKY-a1b2c3"));
        assert!(e.is_payable_in_token("EGLD"));
    }

    #[test]
    fn test_wildcard_with_exclusion() {
        let e = endpoint(&["*", "!BAD-000000"]);
        assert!(e.is_payable_in_egld());
        assert!(e.is_payable_in_token("LUCKY-a1b2c3"));
        assert!(!e.is_payable_in_token("BAD-000000"));

        let e = endpoint(&["*", "!EGLD"]);
        assert!(!e.is_payable_in_egld());
        assert!(e.is_payable_in_token("LUCKY-a1b2c3"));
    }

    #[test]
    fn test_specific_token() {
        let e = endpoint(&["LUCKY-a1b2c3"]);
        assert!(e.is_payable_in_token("LUCKY-a1b2c3"));
        assert!(!e.is_payable_in_token("OTHER-123456"));
        assert!(!e.is_payable_in_egld());
    }

    #[test]
    fn test_decode_outputs() {
        let mut e = endpoint(&[]);
        e.outputs = vec![ParameterDefinition {
            name: String::new(),
            param_type: TypeDescriptor::u8(),
        }];
        assert_eq!(e.decode_outputs(&[vec![42]]).unwrap(), vec![TypedValue::U8(42)]);
    }
}
