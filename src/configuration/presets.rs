//! Preset expansion.
//!
//! A preset entry either names a result folder whose input data loads from
//! disk, or points `configuration.path` at a `.csv`/`.txt` batch file whose
//! rows each become one expanded preset. Expanded data inherits the
//! reference folder's loaded input data, overridden by the per-row parsed
//! values, overridden by any inline `configuration` keys other than `path`.
//! Folder, name and slug support `{variable_id | filter}` substitution
//! against the resolved input data.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tokio::fs;

use crate::core::{ConfigurationError, LoadError};
use crate::templating::{format_slug, format_text};
use crate::variable::{DataById, VariableData, parse_data_by_id};

use super::helpers::{
    assert_unique_values, get_map, get_maps, get_text, has_key, json_from_yaml,
};
use super::loader::Loader;
use super::rules::ToolScope;
use super::{PresetDefinition, RawMap, StepName, VariableDefinition};

pub(super) async fn validate_presets(
    loader: &Loader,
    raw: &RawMap,
    scope: &ToolScope<'_>,
) -> Result<Vec<PresetDefinition>, LoadError> {
    let mut preset_definitions = Vec::new();
    for preset_map in get_maps(raw, "presets")? {
        preset_definitions.extend(load_preset_definitions(loader, scope, &preset_map).await?);
    }
    if scope.has_output && preset_definitions.is_empty() {
        return Err(
            ConfigurationError::new("no presets found; define at least one preset").into()
        );
    }
    assert_unique_values(
        preset_definitions.iter().map(|preset| preset.folder_name.as_str()),
        |x| format!("preset folder \"{x}\""),
    )?;
    assert_unique_values(preset_definitions.iter().map(|preset| preset.name.as_str()), |x| {
        format!("preset name \"{x}\"")
    })?;
    assert_unique_values(preset_definitions.iter().map(|preset| preset.slug.as_str()), |x| {
        format!("preset slug \"{x}\"")
    })?;
    Ok(preset_definitions)
}

async fn load_preset_definitions(
    loader: &Loader,
    scope: &ToolScope<'_>,
    preset_map: &RawMap,
) -> Result<Vec<PresetDefinition>, LoadError> {
    let reference_map = get_map(preset_map, "reference")?;
    let reference_data = match get_text(&reference_map, "folder")? {
        Some(reference_folder) => {
            scope.load_data_by_id(loader, &reference_folder, StepName::Input).await
        }
        None => DataById::new(),
    };
    let configuration_map = get_map(preset_map, "configuration")?;
    let mut override_data = DataById::new();
    for (key, value) in &configuration_map {
        let Some(key) = key.as_str() else {
            continue;
        };
        if key == "path" {
            continue;
        }
        override_data
            .insert(key.to_string(), VariableData::from_value(json_from_yaml(value)?));
    }

    let input_variables = scope.variable_definitions(StepName::Input);
    let mut definitions = Vec::new();
    if let Some(batch_text) = get_text(&configuration_map, "path")? {
        let batch_path = scope.absolute_folder.join(&batch_text);
        let suffix = batch_path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let rows = match suffix {
            "csv" => load_data_by_id_rows_csv(loader, &batch_path, input_variables).await,
            "txt" => load_data_by_id_rows_txt(loader, &batch_path, input_variables).await,
            _ => Err(ConfigurationError::new(format!(
                "preset configuration suffix \".{suffix}\" is not supported"
            ))
            .into()),
        }
        .map_err(|e| e.with_path(&batch_path))?;
        for row in rows {
            let mut data_by_id = reference_data.clone();
            data_by_id.extend(row);
            data_by_id.extend(override_data.clone());
            let (folder_name, name, slug) =
                format_preset_identifiers(preset_map, &data_by_id, Some(&batch_text))?;
            definitions.push(PresetDefinition {
                folder_name,
                name,
                slug,
                data: HashMap::from([(StepName::Input, data_by_id)]),
            });
        }
    } else {
        // No batch file: identifiers are literal and the preset's input data
        // loads from its own result folder on disk.
        let (folder_name, name, slug) =
            format_preset_identifiers(preset_map, &DataById::new(), None)?;
        let disk_data = scope.load_data_by_id(loader, &folder_name, StepName::Input).await;
        let mut data_by_id = reference_data;
        data_by_id.extend(override_data);
        data_by_id.extend(disk_data);
        definitions.push(PresetDefinition {
            folder_name,
            name,
            slug,
            data: HashMap::from([(StepName::Input, data_by_id)]),
        });
    }
    Ok(definitions)
}

fn format_preset_identifiers(
    preset_map: &RawMap,
    data_by_id: &DataById,
    batch_text: Option<&str>,
) -> Result<(String, String, String), ConfigurationError> {
    let folder_template = get_text(preset_map, "folder")?
        .ok_or_else(|| ConfigurationError::new("preset folder is required"))?;
    let name_template = get_text(preset_map, "name")?.unwrap_or_else(|| {
        Path::new(&folder_template)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| folder_template.clone())
    });
    let has_slug = has_key(preset_map, "slug");
    let slug_template = get_text(preset_map, "slug")?.unwrap_or_else(|| name_template.clone());

    // A missing template variable is easier to find when the error names the
    // batch file that produced the row.
    let attach = |e: ConfigurationError| match (e.variable_id().is_some(), batch_text) {
        (true, Some(batch_text)) => e.with_path(batch_text),
        _ => e,
    };
    let folder_name = format_text(&folder_template, data_by_id).map_err(attach)?;
    let name = format_text(&name_template, data_by_id).map_err(attach)?;
    let mut slug = format_text(&slug_template, data_by_id).map_err(attach)?;
    if !has_slug {
        slug = format_slug(&slug);
    }
    Ok((folder_name, name, slug))
}

/// Each CSV row beyond the header becomes one preset's input data; the
/// header supplies variable ids and a leading `#` marks a skipped row.
async fn load_data_by_id_rows_csv(
    loader: &Loader,
    path: &Path,
    variables: &[VariableDefinition],
) -> Result<Vec<DataById>, LoadError> {
    let text =
        fs::read_to_string(path).await.map_err(|e| ConfigurationError::new(e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut keys: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| ConfigurationError::new(format!("csv expected; {e}")))?;
        if index == 0 {
            keys = record.iter().map(|key| key.trim().to_string()).collect();
            continue;
        }
        if record.get(0).is_some_and(|value| value.trim_start().starts_with('#')) {
            continue;
        }
        let mut data_by_id = DataById::new();
        for (key, value) in keys.iter().zip(record.iter()) {
            data_by_id
                .insert(key.clone(), VariableData::from_value(Value::String(value.to_string())));
        }
        parse_data_by_id(loader.views(), &mut data_by_id, variables)?;
        rows.push(data_by_id);
    }
    Ok(rows)
}

/// Each non-blank, non-`#` line is one value for the single input variable.
async fn load_data_by_id_rows_txt(
    loader: &Loader,
    path: &Path,
    variables: &[VariableDefinition],
) -> Result<Vec<DataById>, LoadError> {
    if variables.len() > 1 {
        return Err(ConfigurationError::new(
            "use preset configuration suffix \".csv\" to configure multiple variables",
        )
        .into());
    }
    let Some(variable) = variables.first() else {
        return Err(ConfigurationError::new(
            "define at least one input variable when using preset configuration suffix \".txt\"",
        )
        .into());
    };
    let text =
        fs::read_to_string(path).await.map_err(|e| ConfigurationError::new(e.to_string()))?;
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut data_by_id = DataById::from([(
            variable.id.clone(),
            VariableData::from_value(Value::String(line.to_string())),
        )]);
        parse_data_by_id(loader.views(), &mut data_by_id, std::slice::from_ref(variable))?;
        rows.push(data_by_id);
    }
    Ok(rows)
}
