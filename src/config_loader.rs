use crate::config::{AllocationMode, FabricConfig};
use crate::error::FabricError;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Settings given on the command line; they win over both files
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub profile: Option<String>,
    pub mode: Option<AllocationMode>,
}

/// Load the fabric file, optionally merged with an input file and CLI overrides
///
/// When a profile name is known (from `--profile` or the input file's
/// `fabric_context`), the fabric file is read as a map of profile name to
/// settings and the named profile is used. Otherwise the fabric file itself
/// holds the settings. Keys from the input file replace fabric keys, and
/// overrides replace both.
///
/// # Arguments
/// * `fabric_path` - Path to the fabric YAML file
/// * `input_path` - Optional per-run input YAML file
/// * `overrides` - Command line overrides
///
/// # Returns
/// The merged, not yet validated configuration
pub fn load_config(fabric_path: &Path, input_path: Option<&Path>, overrides: &CliOverrides) -> Result<FabricConfig> {
    info!("Loading fabric configuration from: {:?}", fabric_path);
    let fabric = read_yaml(fabric_path)?;

    let input = match input_path {
        Some(path) => {
            info!("Loading input from: {:?}", path);
            as_mapping(read_yaml(path)?, "input file")?
        }
        None => Mapping::new(),
    };

    let profile = match &overrides.profile {
        Some(name) => Some(name.clone()),
        None => input
            .get("fabric_context")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    let mut merged = match &profile {
        Some(name) => select_profile(fabric, name)?,
        None => as_mapping(fabric, "fabric file")?,
    };

    for (key, value) in input {
        merged.insert(key, value);
    }
    if let Some(name) = &profile {
        merged.insert(Value::from("fabric_context"), Value::from(name.as_str()));
    }
    if let Some(mode) = overrides.mode {
        let mode = serde_yaml::to_value(mode).wrap_err("Failed to encode allocation mode")?;
        merged.insert(Value::from("allocation_mode"), mode);
    }
    debug!("Merged configuration has {} keys", merged.len());

    let config: FabricConfig = serde_yaml::from_value(Value::Mapping(merged))
        .map_err(|e| FabricError::format("configuration", e.to_string()))?;

    if config.mode() == AllocationMode::Stateless && config.fabric_context.is_none() {
        return Err(FabricError::consistency(
            "fabric_context",
            "stateless allocation needs a fabric profile (set fabric_context or --profile)",
        )
        .into());
    }

    info!(
        "Using {:?} allocation{}",
        config.mode(),
        profile.map(|p| format!(" with profile '{}'", p)).unwrap_or_default()
    );
    Ok(config)
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .map_err(|e| FabricError::format(path.display().to_string(), e.to_string()))?;
    Ok(value)
}

fn as_mapping(value: Value, what: &str) -> Result<Mapping> {
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(FabricError::format(what, "expected a mapping of settings").into()),
    }
}

fn select_profile(fabric: Value, name: &str) -> Result<Mapping> {
    let mut profiles = as_mapping(fabric, "fabric file")?;
    match profiles.remove(name) {
        Some(Value::Mapping(settings)) => Ok(settings),
        Some(_) => Err(FabricError::consistency(
            "fabric_context",
            format!("profile '{}' is not a mapping of settings", name),
        )
        .into()),
        None => Err(FabricError::consistency(
            "fabric_context",
            format!("profile '{}' not found in fabric file", name),
        )
        .into()),
    }
}
