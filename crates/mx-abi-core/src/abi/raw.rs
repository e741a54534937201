//! Serde shapes of a published `*.abi.json` document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A file holds one contract interface or an array of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAbiDocument {
    Many(Vec<RawContractAbi>),
    Single(RawContractAbi),
}

impl RawAbiDocument {
    pub fn into_contracts(self) -> Vec<RawContractAbi> {
        match self {
            RawAbiDocument::Many(contracts) => contracts,
            RawAbiDocument::Single(contract) => vec![contract],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContractAbi {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<RawConstructor>,
    #[serde(default)]
    pub endpoints: Vec<RawEndpoint>,
    /// Ordered so resolution and listings are deterministic.
    #[serde(default)]
    pub types: BTreeMap<String, RawTypeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConstructor {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(default, rename = "payableInTokens", skip_serializing_if = "Vec::is_empty")]
    pub payable_in_tokens: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<RawParameter>,
    #[serde(default)]
    pub outputs: Vec<RawParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEndpoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutability: Option<String>,
    #[serde(default, rename = "payableInTokens", skip_serializing_if = "Vec::is_empty")]
    pub payable_in_tokens: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<RawParameter>,
    #[serde(default)]
    pub outputs: Vec<RawParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Older documents mark variadic parameters this way instead of
    /// spelling `variadic<T>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_arg: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_result: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawTypeDefinition {
    Struct {
        #[serde(default)]
        fields: Vec<RawField>,
    },
    Enum {
        #[serde(default)]
        variants: Vec<RawVariant>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVariant {
    pub name: String,
    pub discriminant: u8,
    #[serde(default)]
    pub fields: Vec<RawField>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_many_documents() {
        let single: RawAbiDocument =
            serde_json::from_str(r#"{"name": "answer", "endpoints": []}"#).unwrap();
        assert_eq!(single.into_contracts().len(), 1);

        let many: RawAbiDocument =
            serde_json::from_str(r#"[{"name": "a"}, {"name": "b"}]"#).unwrap();
        assert_eq!(many.into_contracts().len(), 2);
    }

    #[test]
    fn test_type_definitions() {
        let raw: RawContractAbi = serde_json::from_str(
            r#"{
                "name": "Lottery",
                "types": {
                    "Status": {"type": "enum", "variants": [{"name": "Inactive", "discriminant": 0}]},
                    "Info": {"type": "struct", "fields": [{"name": "deadline", "type": "u64"}]}
                }
            }"#,
        )
        .unwrap();
        assert!(matches!(raw.types["Status"], RawTypeDefinition::Enum { .. }));
        assert!(matches!(raw.types["Info"], RawTypeDefinition::Struct { .. }));
    }
}
