//! Shared accessors over raw YAML mappings.
//!
//! Validation rules read the document through these helpers so that shape
//! errors ("must be a map", "must be a list of maps") carry consistent
//! messages regardless of which rule tripped them.

use serde_json::Value as JsonValue;
use serde_yaml::Value;

use crate::core::ConfigurationError;

use super::RawMap;

pub(super) fn get_key<'a>(map: &'a RawMap, key: &str) -> Option<&'a Value> {
    map.get(key)
}

pub(super) fn has_key(map: &RawMap, key: &str) -> bool {
    get_key(map, key).is_some()
}

/// A required, non-blank string value.
pub(super) fn get_required_string(
    map: &RawMap,
    key: &str,
    kind: &str,
) -> Result<String, ConfigurationError> {
    let value = get_key(map, key).ok_or_else(|| {
        ConfigurationError::new(format!("\"{key}\" is required for each {kind}"))
    })?;
    let text = value
        .as_str()
        .ok_or_else(|| ConfigurationError::new(format!("\"{key}\" must be a string")))?
        .trim();
    if text.is_empty() {
        return Err(ConfigurationError::new(format!("\"{key}\" cannot be empty")));
    }
    Ok(text.to_string())
}

/// An optional scalar rendered as text. A mapping value here usually means
/// an unquoted template, so the error says to quote it.
pub(super) fn get_text(map: &RawMap, key: &str) -> Result<Option<String>, ConfigurationError> {
    let Some(value) = get_key(map, key) else {
        return Ok(None);
    };
    match value {
        Value::String(text) => Ok(Some(text.clone())),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        Value::Null => Ok(None),
        Value::Mapping(_) => Err(ConfigurationError::new(format!(
            "\"{key}\" must be surrounded with quotes when it begins with a {{"
        ))),
        Value::Sequence(_) | Value::Tagged(_) => {
            Err(ConfigurationError::new(format!("\"{key}\" must be a string")))
        }
    }
}

/// An optional mapping value, defaulting to empty.
pub(super) fn get_map(map: &RawMap, key: &str) -> Result<RawMap, ConfigurationError> {
    match get_key(map, key) {
        None | Some(Value::Null) => Ok(RawMap::new()),
        Some(Value::Mapping(value)) => Ok(value.clone()),
        Some(_) => Err(ConfigurationError::new(format!("\"{key}\" must be a map"))),
    }
}

/// An optional list value, defaulting to empty.
pub(super) fn get_list(map: &RawMap, key: &str) -> Result<Vec<Value>, ConfigurationError> {
    match get_key(map, key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(values)) => Ok(values.clone()),
        Some(_) => Err(ConfigurationError::new(format!("\"{key}\" must be a list"))),
    }
}

/// An optional list whose every element is a mapping.
pub(super) fn get_maps(map: &RawMap, key: &str) -> Result<Vec<RawMap>, ConfigurationError> {
    get_list(map, key)?
        .into_iter()
        .map(|value| match value {
            Value::Mapping(entry) => Ok(entry),
            _ => Err(ConfigurationError::new(format!("\"{key}\" must be a list of maps"))),
        })
        .collect()
}

/// Fail on the first value that occurs more than once.
pub(super) fn assert_unique_values<'a, I>(
    values: I,
    describe: impl Fn(&str) -> String,
) -> Result<(), ConfigurationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(ConfigurationError::new(format!("{} is not unique", describe(value))));
        }
    }
    Ok(())
}

/// Compare the first `depth` dotted components of two version strings,
/// padding missing components with zero.
pub(super) fn is_equivalent_version(a: &str, b: &str, depth: usize) -> bool {
    let component = |text: &str, index: usize| {
        text.split('.').nth(index).unwrap_or("0").trim().to_string()
    };
    (0..depth).all(|index| component(a, index) == component(b, index))
}

/// Convert a YAML value into its JSON rendition for the data layer.
pub(super) fn json_from_yaml(value: &Value) -> Result<JsonValue, ConfigurationError> {
    serde_json::to_value(value)
        .map_err(|e| ConfigurationError::new(format!("value is not representable; {e}")))
}

/// Convert a YAML mapping into a JSON object, requiring string keys.
pub(super) fn json_map_from_yaml(
    map: &RawMap,
) -> Result<serde_json::Map<String, JsonValue>, ConfigurationError> {
    let mut object = serde_json::Map::new();
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| ConfigurationError::new("keys must be strings"))?;
        object.insert(key.to_string(), json_from_yaml(value)?);
    }
    Ok(object)
}
