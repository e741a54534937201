use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = ".mx-abi.toml";

/// Configuration for mx-abi
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxAbiConfig {
    #[serde(default)]
    pub abi: AbiOptions,
    #[serde(default)]
    pub output: OutputOptions,
    #[serde(default)]
    pub log: LogOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiOptions {
    /// ABI document used when `--abi` and `MX_ABI_PATH` are both absent
    pub path: Option<String>,
    /// Contract interfaces to search; empty means all of them
    #[serde(default)]
    pub contracts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    pub format: String, // "human", "json"
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    pub level: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl MxAbiConfig {
    /// Load config from file or use defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_in(config_path, Path::new("."))
    }

    /// Like [`MxAbiConfig::load`], looking for the default file in `dir`.
    pub fn load_in(config_path: Option<&str>, dir: &Path) -> Result<Self> {
        if let Some(path) = config_path {
            let content = fs::read_to_string(path)
                .context(format!("Failed to read config file: {}", path))?;
            return toml::from_str(&content).context("Failed to parse config file");
        }

        let default_path = dir.join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            let content = fs::read_to_string(&default_path)?;
            toml::from_str(&content).context(format!("Failed to parse {}", DEFAULT_CONFIG_FILE))
        } else {
            Ok(Self::default())
        }
    }

    pub fn is_json(&self) -> bool {
        self.output.format == "json"
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context(format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Write a default config to `path` unless one exists. Returns whether a file
/// was written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    MxAbiConfig::default().save(path)?;
    Ok(true)
}
