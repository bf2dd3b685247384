use std::path::Path;

use anyhow::{Context as _, Error as GenericError};
use dynrelay_params::{ParamKey, ParamMap, ParamValue};

/// A single `KEY=VALUE` parameter override given on the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamOverride {
    pub key: String,
    pub value: ParamValue,
}

/// Parses a `KEY=VALUE` override.
///
/// The value is parsed as a YAML scalar, so `true`, `1`, and `foo` become a boolean, an integer, and a string
/// respectively.
pub fn parse_override(raw: &str) -> Result<ParamOverride, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }

    let value = serde_yaml::from_str::<serde_yaml::Value>(value)
        .map_err(|e| format!("invalid value for '{}': {}", key, e))?;

    Ok(ParamOverride {
        key: key.to_string(),
        value: ParamValue::from(value),
    })
}

fn load_document(path: &Path) -> Result<ParamValue, GenericError> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters file '{}'.", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let value = if is_json {
        serde_json::from_str::<serde_json::Value>(&raw)
            .map(ParamValue::from)
            .with_context(|| format!("Failed to parse '{}' as JSON.", path.display()))?
    } else {
        serde_yaml::from_str::<serde_yaml::Value>(&raw)
            .map(ParamValue::from)
            .with_context(|| format!("Failed to parse '{}' as YAML.", path.display()))?
    };

    Ok(value)
}

/// Loads the relay parameters.
///
/// Parameters are read from the given YAML or JSON document, if any, and then overridden by `overrides` in order.
/// Without a document, the overrides are applied to an empty mapping.
///
/// If the document is not a mapping, it is returned as-is so that the relay can reject it.
///
/// # Errors
///
/// If the document cannot be read or parsed, an error is returned.
pub fn load_params(path: Option<&Path>, overrides: &[ParamOverride]) -> Result<ParamValue, GenericError> {
    let mut params = match path {
        Some(path) => load_document(path)?,
        None => ParamValue::Mapping(ParamMap::new()),
    };

    if let ParamValue::Mapping(map) = &mut params {
        for param in overrides {
            map.insert(ParamKey::from(param.key.as_str()), param.value.clone());
        }
    }

    Ok(params)
}
