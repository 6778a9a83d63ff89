//! Untyped mapping → `TrainingParams`

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::error::{ConfigError, Result};
use super::params::{TrainingParams, FIELD_NAMES, REQUIRED_FIELDS};

/// Anything the pipeline accepts as a job configuration
#[derive(Debug, Clone)]
pub enum ParamsInput {
    /// Already-typed parameters, passed through unchanged
    Typed(TrainingParams),
    /// Option name → value mapping, coerced field by field
    Mapping(Value),
}

impl From<TrainingParams> for ParamsInput {
    fn from(params: TrainingParams) -> Self {
        Self::Typed(params)
    }
}

impl From<Value> for ParamsInput {
    fn from(value: Value) -> Self {
        Self::Mapping(value)
    }
}

impl From<serde_json::Map<String, Value>> for ParamsInput {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self::Mapping(Value::Object(map))
    }
}

/// Coerce a config into typed parameters with defaults applied
///
/// # Errors
///
/// Unknown keys, missing required keys and values that cannot be coerced
/// to the field type are rejected.
pub fn normalize(input: impl Into<ParamsInput>) -> Result<TrainingParams> {
    match input.into() {
        ParamsInput::Typed(params) => Ok(params),
        ParamsInput::Mapping(value) => from_mapping(value),
    }
}

fn from_mapping(value: Value) -> Result<TrainingParams> {
    let Value::Object(map) = value else {
        return Err(ConfigError::NotAMapping(kind_name(&value).to_string()));
    };

    if let Some(unknown) = map.keys().find(|k| !FIELD_NAMES.contains(&k.as_str())) {
        return Err(ConfigError::UnknownField(unknown.clone()));
    }
    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| map.get(**field).map_or(true, Value::is_null))
    {
        return Err(ConfigError::MissingField((*missing).to_string()));
    }

    // Check each field alone first so a bad value names its key
    let template = serde_json::to_value(TrainingParams::new("", ""))?;
    for (key, field_value) in &map {
        let mut single = template.clone();
        if let Value::Object(obj) = &mut single {
            obj.insert(key.clone(), field_value.clone());
        }
        serde_json::from_value::<TrainingParams>(single)
            .map_err(|e| ConfigError::invalid(key.clone(), e.to_string()))?;
    }

    let params: TrainingParams = serde_json::from_value(Value::Object(map))?;
    debug!(model = %params.model_name, data = %params.data_path, "normalized training params");
    Ok(params)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Load and normalize a YAML (`.yaml`/`.yml`) or JSON config file
///
/// # Errors
///
/// Fails on IO errors, parse errors, and anything [`normalize`] rejects.
pub fn load_params(path: impl AsRef<Path>) -> Result<TrainingParams> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let value: Value = if is_json {
        serde_json::from_str(&content)?
    } else {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
        serde_json::to_value(yaml)?
    };

    normalize(value)
}
