//! Variable data loading and view dispatch.
//!
//! A variable's concrete value comes from disk: a plain text or JSON file, a
//! `.dictionary` file bundling several variables' values under one path, or
//! a path-only reference for anything too large or unrecognized. Loading is
//! mediated by the modification-aware [`FileCache`] and the loaded value
//! runs through the variable's registered view's `parse`.
//!
//! Views are resolved against an explicit [`ViewRegistry`] constructed at
//! process start and passed by reference into the loader; plugins register
//! additional views on it before loading begins. An unregistered view name
//! degrades to a no-op passthrough with a logged error, never a failure.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::fs;

use crate::cache::FileCache;
use crate::configuration::VariableDefinition;
use crate::constants::{ENVIRONMENT_PATH, RAW_DATA_BYTE_COUNT};
use crate::core::DataError;
use crate::pattern::get_matching_paths;
use crate::templating::render_value;
use crate::utils::disk::{get_byte_count, is_existing_path, load_raw_text, redact_path};

/// Loaded data keyed by variable id.
pub type DataById = HashMap<String, VariableData>;

/// One variable's loaded data: an in-memory value, a path-only reference
/// for content that stays on disk, and any data-level configuration found
/// alongside the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableData {
    pub value: Option<Value>,
    pub path: Option<PathBuf>,
    pub configuration: Option<Map<String, Value>>,
}

impl VariableData {
    pub fn from_value(value: Value) -> Self {
        Self { value: Some(value), ..Self::default() }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()), ..Self::default() }
    }
}

/// Parses a raw loaded value into the typed value a view presents.
pub trait VariableView: Send + Sync {
    fn parse(&self, value: Value) -> Result<Value, DataError>;
}

/// The degenerate view: returns values untouched.
#[derive(Debug, Default)]
pub struct PassthroughView;

impl VariableView for PassthroughView {
    fn parse(&self, value: Value) -> Result<Value, DataError> {
        Ok(value)
    }
}

/// Numeric view: accepts numbers and numeric strings, narrowing integral
/// values to integers.
#[derive(Debug, Default)]
pub struct NumberView;

impl VariableView for NumberView {
    fn parse(&self, value: Value) -> Result<Value, DataError> {
        let number = match &value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(number) = number else {
            return Err(DataError::new(format!(
                "value \"{}\" is not a number",
                render_value(&value)
            )));
        };
        Ok(if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
            Value::from(number as i64)
        } else {
            Value::from(number)
        })
    }
}

/// Registry mapping view names to their parsers, plus the set of installed
/// printers for `print` step checks.
pub struct ViewRegistry {
    view_by_name: HashMap<String, Arc<dyn VariableView>>,
    printer_names: HashSet<String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self { view_by_name: HashMap::new(), printer_names: HashSet::new() }
    }

    /// The stock views shipped with this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let passthrough: Arc<dyn VariableView> = Arc::new(PassthroughView);
        for name in ["string", "text", "markdown", "json", "link", "image", "file", "table", "pdf"]
        {
            registry.register(name, passthrough.clone());
        }
        registry.register("number", Arc::new(NumberView));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, view: Arc<dyn VariableView>) {
        self.view_by_name.insert(name.into(), view);
    }

    pub fn register_printer(&mut self, name: impl Into<String>) {
        self.printer_names.insert(name.into());
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.view_by_name.contains_key(name)
    }

    pub fn has_printer(&self, name: &str) -> bool {
        self.printer_names.contains(name)
    }

    /// Resolve a view, degrading to passthrough with a logged error when the
    /// name is not registered.
    pub fn get_or_passthrough(&self, view_name: &str, variable_id: &str) -> Arc<dyn VariableView> {
        match self.view_by_name.get(view_name) {
            Some(view) => view.clone(),
            None => {
                tracing::error!(
                    "view \"{view_name}\" is not installed and is needed by \
                     variable \"{variable_id}\""
                );
                Arc::new(PassthroughView)
            }
        }
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Load every variable's data from a step folder, omitting variables whose
/// data fails to load. Environment-sourced variables are skipped.
pub async fn load_variable_data_by_id(
    cache: &FileCache,
    views: &ViewRegistry,
    folder: &Path,
    variables: &[VariableDefinition],
) -> DataById {
    let mut data_by_id = DataById::new();
    for variable in variables {
        if variable.path_name == ENVIRONMENT_PATH {
            continue;
        }
        match load_variable_data(cache, views, folder, variable).await {
            Ok(variable_data) => {
                data_by_id.insert(variable.id.clone(), variable_data);
            }
            Err(e) => tracing::debug!("{e}"),
        }
    }
    data_by_id
}

/// Load one variable's data from a folder and parse it through its view.
pub async fn load_variable_data(
    cache: &FileCache,
    views: &ViewRegistry,
    folder: &Path,
    variable: &VariableDefinition,
) -> Result<VariableData, DataError> {
    let path = folder.join(&variable.path_name);
    if variable.path_name.contains("{index}") {
        return Ok(VariableData::from_path(path));
    }
    let raw_data = match cache.get(&path).await {
        Some(data) => data,
        None => {
            let data = load_raw_data(&path)
                .await
                .map_err(|e| e.with_variable_id(&variable.id))?;
            cache.put(&path, data.clone()).await;
            data
        }
    };
    let mut variable_data = if has_suffix(&path, "dictionary") {
        let value_by_id = raw_data
            .value
            .as_ref()
            .and_then(Value::as_object)
            .ok_or_else(|| DataError::new("dictionary expected").with_path(&path))?;
        let value = value_by_id.get(&variable.id).cloned().ok_or_else(|| {
            DataError::new("value was not found").with_variable_id(&variable.id)
        })?;
        let mut data = VariableData::from_value(value);
        restore_data_configuration(&mut data, folder, variable, Some(value_by_id)).await;
        data
    } else {
        let mut data = raw_data;
        restore_data_configuration(&mut data, folder, variable, None).await;
        data
    };
    if let Some(value) = variable_data.value.take() {
        let view = views.get_or_passthrough(&variable.view_name, &variable.id);
        variable_data.value =
            Some(view.parse(value).map_err(|e| e.with_variable_id(&variable.id))?);
    }
    Ok(variable_data)
}

/// Parse already-present values in place through each variable's view.
/// Used for preset rows, where a parse failure is fatal.
pub fn parse_data_by_id(
    views: &ViewRegistry,
    data_by_id: &mut DataById,
    variables: &[VariableDefinition],
) -> Result<(), DataError> {
    for variable in variables {
        let Some(variable_data) = data_by_id.get_mut(&variable.id) else {
            continue;
        };
        let Some(value) = variable_data.value.take() else {
            continue;
        };
        let view = views.get_or_passthrough(&variable.view_name, &variable.id);
        variable_data.value =
            Some(view.parse(value).map_err(|e| e.with_variable_id(&variable.id))?);
    }
    Ok(())
}

async fn load_raw_data(path: &Path) -> Result<VariableData, DataError> {
    let matching_paths = get_matching_paths(path)
        .await
        .map_err(|_| DataError::new("path does not exist").with_path(path))?;
    let resolved_path = match matching_paths.len() {
        0 => return Err(DataError::new("path does not exist").with_path(path)),
        1 => matching_paths.into_iter().next().expect("one match"),
        // Several files match the template; leave content on disk.
        _ => return Ok(VariableData::from_path(path)),
    };
    let suffix = resolved_path.extension().and_then(|s| s.to_str()).unwrap_or("");
    match suffix {
        "dictionary" => load_dictionary_data(&resolved_path).await,
        "md" | "txt" => load_text_data(&resolved_path).await,
        "json" | "geojson" => load_json_data(&resolved_path).await,
        _ => Ok(VariableData::from_path(resolved_path)),
    }
}

async fn load_dictionary_data(path: &Path) -> Result<VariableData, DataError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| DataError::new(format!("file does not load; {e}")).with_path(path))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| DataError::new(format!("json expected; {e}")).with_path(path))?;
    if !value.is_object() {
        return Err(DataError::new("dictionary expected").with_path(path));
    }
    Ok(VariableData::from_value(value))
}

async fn load_text_data(path: &Path) -> Result<VariableData, DataError> {
    if is_large(path).await? {
        return Ok(VariableData::from_path(path));
    }
    let text = load_raw_text(path)
        .await
        .map_err(|e| DataError::new(e.to_string()).with_path(path))?;
    Ok(VariableData::from_value(Value::String(text)))
}

async fn load_json_data(path: &Path) -> Result<VariableData, DataError> {
    if is_large(path).await? {
        return Ok(VariableData::from_path(path));
    }
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| DataError::new(e.to_string()).with_path(path))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| DataError::new(format!("json expected; {e}")).with_path(path))?;
    Ok(VariableData::from_value(value))
}

async fn is_large(path: &Path) -> Result<bool, DataError> {
    let byte_count = get_byte_count(path)
        .await
        .map_err(|e| DataError::new(e.to_string()).with_path(path))?;
    Ok(byte_count >= RAW_DATA_BYTE_COUNT)
}

async fn restore_data_configuration(
    variable_data: &mut VariableData,
    folder: &Path,
    variable: &VariableDefinition,
    value_by_id: Option<&Map<String, Value>>,
) {
    let mut data_configuration = Map::new();
    match value_by_id {
        Some(value_by_id) => {
            let key = format!("{}.configuration", variable.id);
            if let Some(value) = value_by_id.get(&key) {
                match value.as_object() {
                    Some(map) => data_configuration.extend(map.clone()),
                    None => tracing::error!(
                        "data configuration must be a dictionary; variable_id={}",
                        variable.id
                    ),
                }
            }
        }
        None => {
            let default_path = folder.join(format!("{}.configuration", variable.path_name));
            if is_existing_path(&default_path).await {
                update_data_configuration(&mut data_configuration, &default_path).await;
            }
        }
    }
    if let Some(Value::String(path_text)) = variable.configuration.get("path") {
        update_data_configuration(&mut data_configuration, &folder.join(path_text)).await;
    }
    if !data_configuration.is_empty() {
        variable_data.configuration = Some(data_configuration);
    }
}

async fn update_data_configuration(data_configuration: &mut Map<String, Value>, path: &Path) {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("path \"{}\" is not accessible; {e}", redact_path(path));
            return;
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => data_configuration.extend(map),
        Ok(_) => {
            tracing::error!("path \"{}\" must hold a json object", redact_path(path));
        }
        Err(e) => {
            tracing::error!("path \"{}\" is not valid json; {e}", redact_path(path));
        }
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::configuration::StepName;
    use crate::constants::RAW_DATA_CACHE_LENGTH;

    fn variable(id: &str, view_name: &str, path_name: &str) -> VariableDefinition {
        VariableDefinition {
            id: id.to_string(),
            view_name: view_name.to_string(),
            path_name: path_name.to_string(),
            mode_name: String::new(),
            label_text: String::new(),
            configuration: Map::new(),
            step_name: StepName::Input,
        }
    }

    fn cache() -> FileCache {
        FileCache::new(RAW_DATA_CACHE_LENGTH)
    }

    #[tokio::test]
    async fn test_load_variable_data_from_dictionary() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        std::fs::write(folder.join("v.dictionary"), json!({"a": 1}).to_string()).unwrap();

        let views = ViewRegistry::with_defaults();
        let data =
            load_variable_data(&cache(), &views, folder, &variable("a", "number", "v.dictionary"))
                .await
                .unwrap();
        assert_eq!(data.value, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_dictionary_missing_key_fails_with_variable_id() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        std::fs::write(folder.join("v.dictionary"), json!({"a": 1}).to_string()).unwrap();

        let views = ViewRegistry::with_defaults();
        let error =
            load_variable_data(&cache(), &views, folder, &variable("b", "number", "v.dictionary"))
                .await
                .unwrap_err();
        assert_eq!(error.variable_id(), Some("b"));
    }

    #[tokio::test]
    async fn test_number_view_rejects_text() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        std::fs::write(folder.join("x.txt"), "not a number").unwrap();

        let views = ViewRegistry::with_defaults();
        let error = load_variable_data(&cache(), &views, folder, &variable("x", "number", "x.txt"))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("is not a number"));
        assert_eq!(error.variable_id(), Some("x"));
    }

    #[tokio::test]
    async fn test_number_view_narrows_integers() {
        assert_eq!(NumberView.parse(json!("3.0")).unwrap(), json!(3));
        assert_eq!(NumberView.parse(json!("3.5")).unwrap(), json!(3.5));
        assert_eq!(NumberView.parse(json!(7)).unwrap(), json!(7));
    }

    #[tokio::test]
    async fn test_large_file_keeps_path_only() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        std::fs::write(folder.join("big.txt"), "x".repeat(2048)).unwrap();

        let views = ViewRegistry::with_defaults();
        let data = load_variable_data(&cache(), &views, folder, &variable("b", "text", "big.txt"))
            .await
            .unwrap();
        assert!(data.value.is_none());
        assert_eq!(data.path, Some(folder.join("big.txt")));
    }

    #[tokio::test]
    async fn test_unregistered_view_degrades_to_passthrough() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        std::fs::write(folder.join("x.txt"), "anything").unwrap();

        let views = ViewRegistry::new();
        let data = load_variable_data(&cache(), &views, folder, &variable("x", "vector", "x.txt"))
            .await
            .unwrap();
        assert_eq!(data.value, Some(json!("anything")));
    }

    #[tokio::test]
    async fn test_soft_fail_omits_variable() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        std::fs::write(folder.join("a.txt"), "1").unwrap();

        let views = ViewRegistry::with_defaults();
        let variables =
            vec![variable("a", "number", "a.txt"), variable("b", "number", "missing.txt")];
        let data_by_id =
            load_variable_data_by_id(&cache(), &views, folder, &variables).await;
        assert_eq!(data_by_id.len(), 1);
        assert_eq!(data_by_id["a"].value, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_environment_variables_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let views = ViewRegistry::with_defaults();
        let variables = vec![variable("secret", "string", ENVIRONMENT_PATH)];
        let data_by_id =
            load_variable_data_by_id(&cache(), &views, temp_dir.path(), &variables).await;
        assert!(data_by_id.is_empty());
    }

    #[tokio::test]
    async fn test_sibling_configuration_file_is_restored() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        std::fs::write(folder.join("x.txt"), "hello").unwrap();
        std::fs::write(folder.join("x.txt.configuration"), json!({"rows": 5}).to_string())
            .unwrap();

        let views = ViewRegistry::with_defaults();
        let data = load_variable_data(&cache(), &views, folder, &variable("x", "text", "x.txt"))
            .await
            .unwrap();
        let configuration = data.configuration.unwrap();
        assert_eq!(configuration["rows"], json!(5));
    }
}
