mod config;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use config::{init_config, MxAbiConfig, DEFAULT_CONFIG_FILE};
use mx_abi_core::codec::{decode, encode};
use mx_abi_core::typesystem::parse_type;
use mx_abi_core::{
    AbiRegistry, Address, ContractAbi, EncodingMode, EndpointDefinition, Interaction,
    TokenTransfer, TypeDescriptor, TypedValue,
};
use num_bigint::BigUint;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "mx-abi")]
#[command(about = "Check and encode MultiversX smart contract calls against their ABI", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output format: human or json
    #[arg(long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct AbiSelection {
    /// Path to an *.abi.json document
    #[arg(long, env = "MX_ABI_PATH")]
    abi: Option<String>,

    /// Restrict lookups to these contract interfaces
    #[arg(long = "contract")]
    contracts: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the endpoints of a contract interface
    Endpoints {
        #[command(flatten)]
        selection: AbiSelection,
    },

    /// Check a call against its endpoint and print the call data
    Check {
        #[command(flatten)]
        selection: AbiSelection,

        /// Endpoint to call
        #[arg(long)]
        endpoint: String,

        /// Argument as TYPE=JSON, e.g. `Option<u64>=null`; repeat in order
        #[arg(long = "arg")]
        args: Vec<String>,

        /// EGLD value in the smallest denomination
        #[arg(long)]
        value: Option<String>,

        /// Token transfer as ID:AMOUNT or ID:NONCE:AMOUNT; repeatable
        #[arg(long = "token")]
        tokens: Vec<String>,

        /// Contract address as hex, needed for NFT and multi-token transfers
        #[arg(long)]
        receiver: Option<String>,

        /// Base gas limit before token transfer surcharges
        #[arg(long, default_value_t = 0)]
        gas_limit: u64,
    },

    /// Encode a JSON literal of the given type to hex
    Encode {
        #[command(flatten)]
        selection: AbiSelection,

        /// ABI type, e.g. `List<u32>`
        #[arg(long = "type")]
        type_name: String,

        /// JSON literal
        #[arg(long)]
        value: String,

        /// Use the nested encoding instead of the top-level one
        #[arg(long)]
        nested: bool,
    },

    /// Decode hex of the given type to JSON
    Decode {
        #[command(flatten)]
        selection: AbiSelection,

        /// ABI type, e.g. `List<u32>`
        #[arg(long = "type")]
        type_name: String,

        /// Encoded bytes as hex
        #[arg(long)]
        hex: String,

        /// Use the nested encoding instead of the top-level one
        #[arg(long)]
        nested: bool,
    },

    /// Write a default config file
    InitConfig {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MxAbiConfig::load(args.config.as_deref())?;
    if let Some(format) = args.format {
        config.output.format = format;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Commands::Endpoints { selection } => endpoints_command(&config, selection),
        Commands::Check {
            selection,
            endpoint,
            args,
            value,
            tokens,
            receiver,
            gas_limit,
        } => check_command(
            &config, selection, endpoint, args, value, tokens, receiver, gas_limit,
        ),
        Commands::Encode {
            selection,
            type_name,
            value,
            nested,
        } => encode_command(&config, selection, type_name, value, nested),
        Commands::Decode {
            selection,
            type_name,
            hex,
            nested,
        } => decode_command(&config, selection, type_name, hex, nested),
        Commands::InitConfig { path } => {
            if init_config(Path::new(&path))? {
                println!("{} {}", "Created".green().bold(), path);
            } else {
                println!("{} already exists, leaving it untouched", path);
            }
            Ok(())
        }
    }
}

fn load_registry(config: &MxAbiConfig, selection: &AbiSelection) -> Result<AbiRegistry> {
    let path = selection
        .abi
        .clone()
        .or_else(|| config.abi.path.clone())
        .ok_or_else(|| anyhow!("No ABI document given; pass --abi or set MX_ABI_PATH"))?;
    debug!("Loading ABI document: path={}", path);
    AbiRegistry::from_files(&[&path]).context(format!("Failed to load ABI from {}", path))
}

fn select<'a>(
    registry: &'a AbiRegistry,
    config: &MxAbiConfig,
    selection: &AbiSelection,
) -> Result<ContractAbi<'a>> {
    let names = if selection.contracts.is_empty() {
        &config.abi.contracts
    } else {
        &selection.contracts
    };
    if names.is_empty() {
        return Ok(registry.all());
    }
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    Ok(registry.scoped(&names)?)
}

fn custom_types(abi: &ContractAbi<'_>) -> HashMap<String, TypeDescriptor> {
    abi.interfaces()
        .iter()
        .flat_map(|i| i.types.iter())
        .map(|(name, ty)| (name.clone(), ty.clone()))
        .collect()
}

/// Custom type names resolve only when an ABI document is available.
fn resolve_type(
    config: &MxAbiConfig,
    selection: &AbiSelection,
    type_name: &str,
) -> Result<TypeDescriptor> {
    let custom = if selection.abi.is_some() || config.abi.path.is_some() {
        let registry = load_registry(config, selection)?;
        let abi = select(&registry, config, selection)?;
        custom_types(&abi)
    } else {
        HashMap::new()
    };
    Ok(parse_type(type_name, &custom)?)
}

fn endpoints_command(config: &MxAbiConfig, selection: AbiSelection) -> Result<()> {
    let registry = load_registry(config, &selection)?;
    let abi = select(&registry, config, &selection)?;
    let endpoints: Vec<&EndpointDefinition> = abi
        .get_constructor()
        .into_iter()
        .chain(abi.endpoints())
        .collect();

    if config.is_json() {
        let listing: Vec<Value> = endpoints.iter().copied().map(endpoint_json).collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for endpoint in &endpoints {
        let mutability = if endpoint.is_readonly() {
            "readonly".cyan()
        } else {
            "mutable".yellow()
        };
        println!("{} [{}]{}", endpoint.name.bold(), mutability, payability_note(endpoint));
        for input in &endpoint.inputs {
            println!("  → {}: {}", input.name, input.param_type);
        }
        for output in &endpoint.outputs {
            println!("  ← {}", output.param_type);
        }
    }
    println!("\nTotal: {} endpoints", endpoints.len());
    Ok(())
}

fn payability_note(endpoint: &EndpointDefinition) -> String {
    let mut accepted = Vec::new();
    if endpoint.is_payable_in_egld() {
        accepted.push("EGLD".to_string());
    }
    accepted.extend(endpoint.payable_in_tokens.iter().cloned());
    if accepted.is_empty() {
        String::new()
    } else {
        format!(" payable in {}", accepted.join(", ")).green().to_string()
    }
}

fn endpoint_json(endpoint: &EndpointDefinition) -> Value {
    let params = |params: &[mx_abi_core::abi::ParameterDefinition]| -> Vec<Value> {
        params
            .iter()
            .map(|p| json!({ "name": p.name, "type": p.param_type.to_string() }))
            .collect()
    };
    json!({
        "name": endpoint.name,
        "mutability": if endpoint.is_readonly() { "readonly" } else { "mutable" },
        "payable_in_egld": endpoint.is_payable_in_egld(),
        "payable_in_tokens": endpoint.payable_in_tokens,
        "inputs": params(&endpoint.inputs),
        "outputs": params(&endpoint.outputs),
        "docs": endpoint.docs,
    })
}

/// `Option<u64>=5` -> (`Option<u64>`, `5`). Types never contain `=`.
fn split_typed_argument(raw: &str) -> Result<(&str, Value)> {
    let (type_name, literal) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Argument '{}' is not of the form TYPE=JSON", raw))?;
    let literal = literal.trim();
    let value =
        serde_json::from_str(literal).unwrap_or_else(|_| Value::String(literal.to_string()));
    Ok((type_name.trim(), value))
}

/// `ID:AMOUNT` or `ID:NONCE:AMOUNT`.
fn parse_token_transfer(raw: &str) -> Result<TokenTransfer> {
    let parts: Vec<&str> = raw.split(':').collect();
    let amount = |s: &str| {
        s.parse::<BigUint>()
            .map_err(|_| anyhow!("Invalid token amount '{}' in '{}'", s, raw))
    };
    match parts.as_slice() {
        [id, value] => Ok(TokenTransfer::fungible(*id, amount(*value)?)),
        [id, nonce, value] => {
            let nonce = nonce
                .parse::<u64>()
                .map_err(|_| anyhow!("Invalid nonce '{}' in '{}'", nonce, raw))?;
            Ok(TokenTransfer::non_fungible(*id, nonce, amount(*value)?))
        }
        _ => bail!("Token transfer '{}' is not of the form ID[:NONCE]:AMOUNT", raw),
    }
}

#[allow(clippy::too_many_arguments)]
fn check_command(
    config: &MxAbiConfig,
    selection: AbiSelection,
    endpoint: String,
    raw_args: Vec<String>,
    value: Option<String>,
    tokens: Vec<String>,
    receiver: Option<String>,
    gas_limit: u64,
) -> Result<()> {
    let registry = load_registry(config, &selection)?;
    let abi = select(&registry, config, &selection)?;
    let custom = custom_types(&abi);

    let mut arguments = Vec::with_capacity(raw_args.len());
    for (index, raw) in raw_args.iter().enumerate() {
        let (type_name, literal) = split_typed_argument(raw)?;
        let declared = parse_type(type_name, &custom)?;
        let argument = TypedValue::from_json(&literal, &declared)
            .context(format!("Invalid argument {}", index))?;
        arguments.push(argument);
    }

    let mut interaction = Interaction::new(endpoint.clone(), arguments).with_gas_limit(gas_limit);
    if let Some(value) = value {
        let egld = value
            .parse::<BigUint>()
            .map_err(|_| anyhow!("Invalid EGLD value '{}'", value))?;
        interaction = interaction.with_value(egld);
    }
    for token in &tokens {
        interaction = interaction.with_token_transfer(parse_token_transfer(token)?);
    }
    if let Some(receiver) = receiver {
        let address = Address::from_hex(&receiver)
            .ok_or_else(|| anyhow!("Receiver '{}' is not a 32-byte hex address", receiver))?;
        interaction = interaction.with_contract_address(address);
    }

    match interaction.build_payload(&abi) {
        Ok(payload) => {
            if config.is_json() {
                let output = json!({
                    "accepted": true,
                    "endpoint": endpoint,
                    "data": payload.to_string(),
                    "gas_limit": interaction.gas_limit(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{} {}", "[OK]".green().bold(), endpoint);
                println!("  data: {}", payload);
                println!("  gas limit: {}", interaction.gas_limit());
            }
            Ok(())
        }
        Err(e) => {
            if config.is_json() {
                let output = json!({
                    "accepted": false,
                    "endpoint": endpoint,
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{} {}", "[REJECTED]".red().bold(), endpoint);
                println!("  → {}", e);
            }
            std::process::exit(1);
        }
    }
}

fn encode_command(
    config: &MxAbiConfig,
    selection: AbiSelection,
    type_name: String,
    value: String,
    nested: bool,
) -> Result<()> {
    let declared = resolve_type(config, &selection, &type_name)?;
    let literal: Value =
        serde_json::from_str(&value).unwrap_or_else(|_| Value::String(value.clone()));
    let typed = TypedValue::from_json(&literal, &declared)?;
    let bytes = encode(&typed, mode(nested))?;

    if config.is_json() {
        let output = json!({ "type": declared.to_string(), "hex": hex::encode(&bytes) });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", hex::encode(&bytes));
    }
    Ok(())
}

fn decode_command(
    config: &MxAbiConfig,
    selection: AbiSelection,
    type_name: String,
    hex_input: String,
    nested: bool,
) -> Result<()> {
    let declared = resolve_type(config, &selection, &type_name)?;
    let trimmed = hex_input.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).context("Input is not valid hex")?;
    let value = decode(&bytes, &declared, mode(nested))?;

    if config.is_json() {
        let output = json!({ "type": declared.to_string(), "value": value.to_json() });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    }
    Ok(())
}

fn mode(nested: bool) -> EncodingMode {
    if nested {
        EncodingMode::Nested
    } else {
        EncodingMode::TopLevel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_typed_argument() {
        let (ty, value) = split_typed_argument("Option<u64>=null").unwrap();
        assert_eq!(ty, "Option<u64>");
        assert_eq!(value, Value::Null);

        let (ty, value) = split_typed_argument("bytes=6c75636b79").unwrap();
        assert_eq!(ty, "bytes");
        assert_eq!(value, json!("6c75636b79"));

        let (_, value) = split_typed_argument("List<u32>=[1, 2]").unwrap();
        assert_eq!(value, json!([1, 2]));

        assert!(split_typed_argument("u32").is_err());
    }

    #[test]
    fn test_parse_token_transfer() {
        let fungible = parse_token_transfer("LUCKY-a1b2c3:1000").unwrap();
        assert_eq!(fungible, TokenTransfer::fungible("LUCKY-a1b2c3", 1000u32));

        let nft = parse_token_transfer("NFT-abcdef:5:1").unwrap();
        assert_eq!(nft, TokenTransfer::non_fungible("NFT-abcdef", 5, 1u32));

        assert!(parse_token_transfer("LUCKY-a1b2c3").is_err());
        assert!(parse_token_transfer("LUCKY-a1b2c3:x").is_err());
        assert!(parse_token_transfer("A:1:2:3").is_err());
    }

    #[test]
    fn test_payability_note() {
        let payable = vec!["EGLD".to_string()];
        let endpoint = EndpointDefinition::new(
            "fund",
            vec![],
            vec![],
            mx_abi_core::Mutability::Mutable,
            &payable,
        );
        assert!(payability_note(&endpoint).contains("EGLD"));

        let endpoint =
            EndpointDefinition::new("get", vec![], vec![], mx_abi_core::Mutability::ReadOnly, &[]);
        assert!(payability_note(&endpoint).is_empty());
    }
}
