//! The ABI registry: contract interfaces loaded once, read-only afterwards.

use super::endpoint::{EndpointDefinition, Mutability, ParameterDefinition};
use super::raw::{RawAbiDocument, RawContractAbi, RawParameter, RawTypeDefinition};
use crate::error::AbiError;
use crate::typesystem::parser::{parse_type_expression, resolve_type_expression};
use crate::typesystem::{EnumVariantDefinition, FieldDefinition, GenericKind, TypeDescriptor};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Endpoint name under which a contract's constructor is exposed.
pub const CONSTRUCTOR_NAME: &str = "init";

/// One contract interface with all its types resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInterface {
    pub name: String,
    pub docs: Vec<String>,
    pub constructor: Option<EndpointDefinition>,
    pub endpoints: Vec<EndpointDefinition>,
    pub types: BTreeMap<String, TypeDescriptor>,
}

impl ContractInterface {
    pub fn get_endpoint(&self, name: &str) -> Option<&EndpointDefinition> {
        if name == CONSTRUCTOR_NAME {
            if let Some(constructor) = &self.constructor {
                return Some(constructor);
            }
        }
        self.endpoints.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AbiRegistry {
    interfaces: Vec<ContractInterface>,
}

impl AbiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a single JSON document.
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let mut registry = Self::new();
        registry.extend_from_json(json)?;
        Ok(registry)
    }

    /// Build a registry from several `*.abi.json` files.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, AbiError> {
        let mut registry = Self::new();
        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path).map_err(|e| {
                AbiError::InvalidDocument(format!("cannot read {}: {}", path.display(), e))
            })?;
            registry.extend_from_json(&content)?;
        }
        Ok(registry)
    }

    /// Add every contract interface found in `json`. Either all of them are
    /// registered or, on error, none is.
    pub fn extend_from_json(&mut self, json: &str) -> Result<(), AbiError> {
        let document: RawAbiDocument =
            serde_json::from_str(json).map_err(|e| AbiError::InvalidDocument(e.to_string()))?;
        let mut batch: Vec<ContractInterface> = Vec::new();
        for raw in document.into_contracts() {
            self.ensure_new(&raw.name, &batch)?;
            batch.push(resolve_contract(raw)?);
        }
        for interface in &batch {
            log_loaded(interface);
        }
        self.interfaces.extend(batch);
        Ok(())
    }

    pub fn add_contract(&mut self, raw: RawContractAbi) -> Result<(), AbiError> {
        self.ensure_new(&raw.name, &[])?;
        let interface = resolve_contract(raw)?;
        log_loaded(&interface);
        self.interfaces.push(interface);
        Ok(())
    }

    fn ensure_new(&self, name: &str, pending: &[ContractInterface]) -> Result<(), AbiError> {
        if self
            .interfaces
            .iter()
            .chain(pending)
            .any(|i| i.name == name)
        {
            return Err(AbiError::InvalidDocument(format!(
                "duplicate contract interface '{}'",
                name
            )));
        }
        Ok(())
    }

    pub fn interfaces(&self) -> &[ContractInterface] {
        &self.interfaces
    }

    pub fn get_interface(&self, name: &str) -> Result<&ContractInterface, AbiError> {
        self.interfaces
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| AbiError::UnknownInterface(name.to_string()))
    }

    /// View restricted to the named interfaces, searched in the given order.
    pub fn scoped(&self, names: &[&str]) -> Result<ContractAbi<'_>, AbiError> {
        let interfaces = names
            .iter()
            .map(|name| self.get_interface(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ContractAbi { interfaces })
    }

    /// View over every loaded interface.
    pub fn all(&self) -> ContractAbi<'_> {
        ContractAbi {
            interfaces: self.interfaces.iter().collect(),
        }
    }
}

fn log_loaded(interface: &ContractInterface) {
    debug!(
        "Loaded contract interface: name={}, endpoints={}, types={}",
        interface.name,
        interface.endpoints.len(),
        interface.types.len()
    );
}

/// Endpoint lookup over a selection of interfaces.
#[derive(Debug, Clone)]
pub struct ContractAbi<'a> {
    interfaces: Vec<&'a ContractInterface>,
}

impl<'a> ContractAbi<'a> {
    pub fn interfaces(&self) -> &[&'a ContractInterface] {
        &self.interfaces
    }

    pub fn get_endpoint(&self, name: &str) -> Result<&'a EndpointDefinition, AbiError> {
        self.interfaces
            .iter()
            .copied()
            .find_map(|i| i.get_endpoint(name))
            .ok_or_else(|| AbiError::UnknownEndpoint(name.to_string()))
    }

    pub fn get_constructor(&self) -> Option<&'a EndpointDefinition> {
        self.interfaces
            .iter()
            .copied()
            .find_map(|i| i.constructor.as_ref())
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &'a EndpointDefinition> + '_ {
        self.interfaces
            .iter()
            .copied()
            .flat_map(|i| i.endpoints.iter())
    }

    pub fn get_custom_type(&self, name: &str) -> Option<&'a TypeDescriptor> {
        self.interfaces
            .iter()
            .copied()
            .find_map(|i| i.types.get(name))
    }
}

/// Resolves type strings against one document's custom types, building
/// each custom type at most once.
struct TypeResolver<'r> {
    definitions: &'r BTreeMap<String, RawTypeDefinition>,
    resolved: HashMap<String, TypeDescriptor>,
    in_progress: Vec<String>,
}

impl<'r> TypeResolver<'r> {
    fn new(definitions: &'r BTreeMap<String, RawTypeDefinition>) -> Self {
        Self {
            definitions,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    fn parse(&mut self, input: &str) -> Result<TypeDescriptor, AbiError> {
        let expr = parse_type_expression(input)?;
        resolve_type_expression(&expr, input, &mut |name: &str| self.custom(name))
    }

    fn custom(&mut self, name: &str) -> Result<Option<TypeDescriptor>, AbiError> {
        if let Some(ty) = self.resolved.get(name) {
            return Ok(Some(ty.clone()));
        }
        let definitions = self.definitions;
        let Some(definition) = definitions.get(name) else {
            return Ok(None);
        };
        if self.in_progress.iter().any(|n| n == name) {
            let cycle = format!("{} -> {}", self.in_progress.join(" -> "), name);
            return Err(AbiError::malformed(
                name,
                format!("recursive type definition ({})", cycle),
            ));
        }

        self.in_progress.push(name.to_string());
        let built = self.build(name, definition);
        self.in_progress.pop();
        let ty = built?;

        self.resolved.insert(name.to_string(), ty.clone());
        Ok(Some(ty))
    }

    fn build(
        &mut self,
        name: &str,
        definition: &RawTypeDefinition,
    ) -> Result<TypeDescriptor, AbiError> {
        match definition {
            RawTypeDefinition::Struct { fields } => {
                let fields = fields
                    .iter()
                    .map(|f| {
                        Ok(FieldDefinition {
                            name: f.name.clone(),
                            field_type: self.parse(&f.type_name)?,
                        })
                    })
                    .collect::<Result<Vec<_>, AbiError>>()?;
                Ok(TypeDescriptor::Struct {
                    name: name.to_string(),
                    fields,
                })
            }
            RawTypeDefinition::Enum { variants } => {
                let mut built = Vec::with_capacity(variants.len());
                for variant in variants {
                    if built
                        .iter()
                        .any(|v: &EnumVariantDefinition| v.discriminant == variant.discriminant)
                    {
                        return Err(AbiError::malformed(
                            name,
                            format!("duplicate discriminant {}", variant.discriminant),
                        ));
                    }
                    let fields = variant
                        .fields
                        .iter()
                        .map(|f| {
                            Ok(FieldDefinition {
                                name: f.name.clone(),
                                field_type: self.parse(&f.type_name)?,
                            })
                        })
                        .collect::<Result<Vec<_>, AbiError>>()?;
                    built.push(EnumVariantDefinition {
                        discriminant: variant.discriminant,
                        name: variant.name.clone(),
                        fields,
                    });
                }
                Ok(TypeDescriptor::Enum {
                    name: name.to_string(),
                    variants: built,
                })
            }
        }
    }

    fn parameter(
        &mut self,
        raw: &RawParameter,
        multi: Option<bool>,
    ) -> Result<ParameterDefinition, AbiError> {
        let mut param_type = self.parse(&raw.type_name)?;
        if multi == Some(true) && !param_type.is_multi_value() {
            param_type = TypeDescriptor::generic(GenericKind::Variadic, vec![param_type]);
        }
        Ok(ParameterDefinition {
            name: raw.name.clone(),
            param_type,
        })
    }

    fn endpoint(
        &mut self,
        name: &str,
        docs: &[String],
        mutability: Mutability,
        payable_in: &[String],
        inputs: &[RawParameter],
        outputs: &[RawParameter],
    ) -> Result<EndpointDefinition, AbiError> {
        let inputs = inputs
            .iter()
            .map(|p| self.parameter(p, p.multi_arg))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = outputs
            .iter()
            .map(|p| self.parameter(p, p.multi_result))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(
            EndpointDefinition::new(name, inputs, outputs, mutability, payable_in)
                .with_docs(docs.to_vec()),
        )
    }
}

fn resolve_contract(raw: RawContractAbi) -> Result<ContractInterface, AbiError> {
    let mut resolver = TypeResolver::new(&raw.types);

    let mut types = BTreeMap::new();
    for name in raw.types.keys() {
        if let Some(ty) = resolver.custom(name)? {
            types.insert(name.clone(), ty);
        }
    }

    let constructor = match &raw.constructor {
        Some(c) => Some(resolver.endpoint(
            CONSTRUCTOR_NAME,
            &c.docs,
            Mutability::Mutable,
            &c.payable_in_tokens,
            &c.inputs,
            &c.outputs,
        )?),
        None => None,
    };

    let mut endpoints: Vec<EndpointDefinition> = Vec::with_capacity(raw.endpoints.len());
    for e in &raw.endpoints {
        if endpoints.iter().any(|existing| existing.name == e.name) {
            return Err(AbiError::InvalidDocument(format!(
                "duplicate endpoint '{}' in '{}'",
                e.name, raw.name
            )));
        }
        endpoints.push(resolver.endpoint(
            &e.name,
            &e.docs,
            Mutability::from_abi(e.mutability.as_deref()),
            &e.payable_in_tokens,
            &e.inputs,
            &e.outputs,
        )?);
    }

    Ok(ContractInterface {
        name: raw.name.clone(),
        docs: raw.docs.clone(),
        constructor,
        endpoints,
        types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::TypedValue;

    const COUNTER_ABI: &str = r#"{
        "name": "Counter",
        "constructor": {"inputs": [{"name": "initial", "type": "BigUint"}], "outputs": []},
        "endpoints": [
            {"name": "increment", "mutability": "mutable", "payableInTokens": ["EGLD"], "inputs": [], "outputs": []},
            {"name": "get", "mutability": "readonly", "inputs": [], "outputs": [{"type": "Snapshot"}]},
            {"name": "history", "mutability": "readonly", "inputs": [], "outputs": [{"type": "u64", "multi_result": true}]}
        ],
        "types": {
            "Snapshot": {"type": "struct", "fields": [{"name": "value", "type": "BigUint"}, {"name": "phase", "type": "Phase"}]},
            "Phase": {"type": "enum", "variants": [{"name": "Idle", "discriminant": 0}, {"name": "Busy", "discriminant": 1}]}
        }
    }"#;

    #[test]
    fn test_resolves_nested_custom_types() {
        let registry = AbiRegistry::from_json(COUNTER_ABI).unwrap();
        let abi = registry.scoped(&["Counter"]).unwrap();
        let get = abi.get_endpoint("get").unwrap();
        match &get.outputs[0].param_type {
            TypeDescriptor::Struct { name, fields } => {
                assert_eq!(name, "Snapshot");
                assert!(matches!(fields[1].field_type, TypeDescriptor::Enum { .. }));
            }
            other => panic!("unexpected type {:?}", other),
        }
        assert!(get.is_readonly());
    }

    #[test]
    fn test_constructor_is_init() {
        let registry = AbiRegistry::from_json(COUNTER_ABI).unwrap();
        let init = registry.all().get_endpoint("init").unwrap();
        assert_eq!(init.inputs[0].param_type, TypeDescriptor::big_uint());
    }

    #[test]
    fn test_multi_result_becomes_variadic() {
        let registry = AbiRegistry::from_json(COUNTER_ABI).unwrap();
        let history = registry.all().get_endpoint("history").unwrap();
        assert_eq!(
            history.outputs[0].param_type,
            TypeDescriptor::variadic(TypeDescriptor::u64())
        );
        let decoded = history.decode_outputs(&[vec![1], vec![2]]).unwrap();
        assert_eq!(
            decoded,
            vec![TypedValue::Variadic {
                element_type: TypeDescriptor::u64(),
                items: vec![TypedValue::U64(1), TypedValue::U64(2)],
            }]
        );
    }

    #[test]
    fn test_unknown_endpoint_and_interface() {
        let registry = AbiRegistry::from_json(COUNTER_ABI).unwrap();
        assert_eq!(
            registry.all().get_endpoint("reset").unwrap_err(),
            AbiError::UnknownEndpoint("reset".to_string())
        );
        assert_eq!(
            registry.scoped(&["Lottery"]).unwrap_err(),
            AbiError::UnknownInterface("Lottery".to_string())
        );
    }

    #[test]
    fn test_failed_load_registers_nothing() {
        let mut registry = AbiRegistry::from_json(COUNTER_ABI).unwrap();
        let broken = r#"[
            {"name": "Alpha", "endpoints": []},
            {"name": "Beta", "endpoints": [{"name": "f", "inputs": [{"name": "x", "type": "Nope"}], "outputs": []}]}
        ]"#;

        let err = registry.extend_from_json(broken).unwrap_err();
        assert!(matches!(err, AbiError::MalformedType { .. }));
        let names: Vec<&str> = registry.interfaces().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Counter"]);

        let fixed = broken.replace("Nope", "u32");
        registry.extend_from_json(&fixed).unwrap();
        assert_eq!(registry.interfaces().len(), 3);
    }

    #[test]
    fn test_duplicate_within_one_document() {
        let mut registry = AbiRegistry::new();
        let twice = r#"[{"name": "Alpha", "endpoints": []}, {"name": "Alpha", "endpoints": []}]"#;
        assert_eq!(
            registry.extend_from_json(twice).unwrap_err(),
            AbiError::InvalidDocument("duplicate contract interface 'Alpha'".to_string())
        );
        assert!(registry.interfaces().is_empty());
    }

    #[test]
    fn test_recursive_types_rejected() {
        let json = r#"{
            "name": "Tree",
            "endpoints": [],
            "types": {
                "Node": {"type": "struct", "fields": [{"name": "children", "type": "List<Node>"}]}
            }
        }"#;
        let err = AbiRegistry::from_json(json).unwrap_err();
        assert!(matches!(err, AbiError::MalformedType { .. }), "{:?}", err);
    }

    #[test]
    fn test_unknown_type_in_endpoint() {
        let json = r#"{
            "name": "Broken",
            "endpoints": [{"name": "f", "inputs": [{"name": "x", "type": "Option<Missing>"}], "outputs": []}]
        }"#;
        assert_eq!(
            AbiRegistry::from_json(json).unwrap_err(),
            AbiError::malformed("Option<Missing>", "unknown type 'Missing'")
        );
    }

    #[test]
    fn test_duplicate_interface_rejected() {
        let mut registry = AbiRegistry::from_json(COUNTER_ABI).unwrap();
        assert!(matches!(
            registry.extend_from_json(COUNTER_ABI),
            Err(AbiError::InvalidDocument(_))
        ));
    }
}
