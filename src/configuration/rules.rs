//! The ordered validation pipeline that builds a [`ToolDefinition`].
//!
//! Rules run in a fixed order — protocol, paths, identifiers, copyright,
//! tools, steps, prints, presets, datasets, scripts, environment, display —
//! and later rules read what earlier rules produced. Changing the order is
//! a defect: presets format their names against variables that the steps
//! rule validated, ports resolve against log and debug variables, and the
//! uniqueness check over composed tools needs the parent's own identifiers
//! first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;
use tokio::fs;

use crate::constants::{
    COPYRIGHT_TEXT, COPYRIGHT_URI_AND_IMAGE_TEXT, COPYRIGHT_URI_TEXT, ENGINE_NAME, IMAGE_NAME,
    KIT_NAME, PRINTER_NAMES, RESERVED_VARIABLE_IDS, SCRIPT_LANGUAGE, SUPPORT_EMAIL, TOOL_NAME,
    TOOL_VERSION, VARIABLE_ID_PATTERN,
};
use crate::core::{ConfigurationError, LoadError};
use crate::templating::{format_copyright_text, format_name, format_slug};
use crate::utils::disk::{is_existing_path, is_link_path, redact_path};
use crate::utils::paths::{is_contained_path, is_path_in_folder};
use crate::variable::{DataById, ViewRegistry, load_variable_data_by_id};

use super::helpers::{
    assert_unique_values, get_key, get_map, get_maps, get_required_string, get_text, has_key,
    is_equivalent_version, json_map_from_yaml,
};
use super::loader::Loader;
use super::{
    ButtonDefinition, CopyrightDefinition, DatasetDefinition, DatasetInputMode,
    DatasetOutputMode, DatasetReference, DisplayDefinition, EnvironmentDefinition,
    EnvironmentVariableDefinition, PackageDefinition, PackageManager, PageDefinition,
    PortDefinition, RawMap, ScriptDefinition, StepDefinition, StepName, StyleDefinition,
    TemplateDefinition, ToolDefinition, VariableDefinition,
};

static VARIABLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VARIABLE_ID_PATTERN).expect("variable id pattern"));

/// The partially built tool that preset and environment rules read while
/// the pipeline is still running.
pub(super) struct ToolScope<'a> {
    pub absolute_folder: &'a Path,
    pub step_definitions: &'a [StepDefinition],
    pub has_output: bool,
}

impl ToolScope<'_> {
    pub fn variable_definitions(&self, step_name: StepName) -> &[VariableDefinition] {
        self.step_definitions
            .iter()
            .find(|step| step.name == step_name)
            .map(|step| step.variable_definitions.as_slice())
            .unwrap_or(&[])
    }

    pub async fn load_data_by_id(
        &self,
        loader: &Loader,
        result_folder: &str,
        step_name: StepName,
    ) -> DataById {
        let folder = self.absolute_folder.join(result_folder).join(step_name.as_str());
        load_variable_data_by_id(
            loader.cache(),
            loader.views(),
            &folder,
            self.variable_definitions(step_name),
        )
        .await
    }
}

/// Run the full pipeline over a parsed document.
pub(super) async fn load_tool_definition(
    loader: &Loader,
    raw: RawMap,
    path: &Path,
    locus: &str,
) -> Result<ToolDefinition, LoadError> {
    let absolute_path = path.to_path_buf();
    let absolute_folder =
        path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
    let has_output = has_key(&raw, "output");

    let protocol_version = validate_protocol(loader, &raw)?;
    validate_paths(&raw, &absolute_folder).await?;
    let (name, slug, version) = validate_tool_identifiers(&raw, locus, has_output)?;
    let copyright_definition = validate_copyright(&raw, has_output)?;
    let tool_definitions =
        validate_tools(loader, &raw, &absolute_folder, locus, &name, &slug, has_output).await?;
    let step_definitions = validate_steps(&raw, loader.views())?;
    validate_prints(&step_definitions, loader.views())?;
    let scope = ToolScope {
        absolute_folder: &absolute_folder,
        step_definitions: &step_definitions,
        has_output,
    };
    let preset_definitions = super::presets::validate_presets(loader, &raw, &scope).await?;
    let dataset_definitions = validate_datasets(&raw, &absolute_folder).await?;
    let script_definitions = validate_scripts(&raw)?;
    let environment_definition = validate_environment(&raw, &scope)?;
    let display_definition = validate_display(&raw)?;

    Ok(ToolDefinition {
        name,
        slug,
        version,
        protocol_version,
        absolute_path,
        absolute_folder,
        locus: locus.to_string(),
        copyright_definition,
        step_definitions,
        tool_definitions,
        preset_definitions,
        dataset_definitions,
        script_definitions,
        environment_definition,
        display_definition,
        has_output,
    })
}

fn validate_protocol(loader: &Loader, raw: &RawMap) -> Result<String, ConfigurationError> {
    let Some(value) = get_key(raw, "crosscompute") else {
        return Err(ConfigurationError::new("crosscompute protocol version is missing"));
    };
    let protocol_version = value.as_str().map(str::trim).unwrap_or("");
    if protocol_version.is_empty() {
        return Err(ConfigurationError::new("crosscompute protocol version is required"));
    }
    let installed_version = loader.protocol_version();
    if !is_equivalent_version(protocol_version, installed_version, 3) {
        return Err(ConfigurationError::new(format!(
            "crosscompute protocol {protocol_version} is not compatible with \
             {installed_version}, which is currently installed"
        )));
    }
    Ok(protocol_version.to_string())
}

/// Walk the whole document; every `path` or `folder` value must stay inside
/// the tool folder.
async fn validate_paths(raw: &RawMap, folder: &Path) -> Result<(), LoadError> {
    let mut packs: Vec<(&str, &Value)> = pack_entries(raw);
    while let Some((key, value)) = packs.pop() {
        if key == "path" || key == "folder" {
            let Some(text) = value.as_str() else {
                return Err(
                    ConfigurationError::new(format!("\"{key}\" must be a string")).into()
                );
            };
            if !is_path_in_folder(&folder.join(text), folder).await {
                return Err(ConfigurationError::new(format!(
                    "path \"{text}\" must be in folder \"{}\"",
                    redact_path(folder)
                ))
                .into());
            }
        } else if let Value::Mapping(map) = value {
            packs.extend(pack_entries(map));
        } else if let Value::Sequence(values) = value {
            for element in values {
                if let Value::Mapping(map) = element {
                    packs.extend(pack_entries(map));
                }
            }
        }
    }
    Ok(())
}

fn pack_entries(map: &RawMap) -> Vec<(&str, &Value)> {
    map.iter().filter_map(|(key, value)| key.as_str().map(|key| (key, value))).collect()
}

fn validate_tool_identifiers(
    raw: &RawMap,
    locus: &str,
    has_output: bool,
) -> Result<(String, String, String), ConfigurationError> {
    let default_name = if has_output { TOOL_NAME } else { KIT_NAME }.replace('X', locus);
    let name = get_text(raw, "name")?.unwrap_or(default_name).trim().to_string();
    let slug = get_text(raw, "slug")?.unwrap_or_else(|| format_slug(&name)).trim().to_string();
    let version =
        get_text(raw, "version")?.unwrap_or_else(|| TOOL_VERSION.to_string()).trim().to_string();
    Ok((name, slug, version))
}

fn validate_copyright(
    raw: &RawMap,
    has_output: bool,
) -> Result<CopyrightDefinition, ConfigurationError> {
    let copyright_map = get_map(raw, "copyright")?;
    let template = if let Some(text) = get_text(&copyright_map, "text")? {
        text
    } else if has_key(&copyright_map, "name") && has_key(&copyright_map, "year") {
        if has_key(&copyright_map, "owner_uri") {
            if has_key(&copyright_map, "image_uri") {
                COPYRIGHT_URI_AND_IMAGE_TEXT
            } else {
                COPYRIGHT_URI_TEXT
            }
        } else {
            COPYRIGHT_TEXT
        }
        .to_string()
    } else {
        String::new()
    };
    let text = format_copyright_text(&template, &copyright_map)?.trim().to_string();
    if text.is_empty() && has_output {
        return Err(ConfigurationError::new(
            "copyright is required, either as text or name and year",
        ));
    }
    Ok(CopyrightDefinition { text })
}

/// Recursively load each `tools` entry as an independent document with an
/// extended locus, splicing its runnable tools into one flat list, then
/// check name and slug uniqueness across the whole composition.
async fn validate_tools(
    loader: &Loader,
    raw: &RawMap,
    folder: &Path,
    locus: &str,
    name: &str,
    slug: &str,
    has_output: bool,
) -> Result<Vec<ToolDefinition>, LoadError> {
    let mut tool_definitions = Vec::new();
    for (index, tool_map) in get_maps(raw, "tools")?.into_iter().enumerate() {
        let path_text = get_text(&tool_map, "path")?
            .ok_or_else(|| ConfigurationError::new("tool path is required"))?;
        let child_locus = format!("{locus}-{index}");
        let child = loader
            .load_configuration_with_locus(&folder.join(&path_text), &child_locus)
            .await
            .map_err(|e| match e {
                // A nested document that is not a configuration is fatal,
                // unlike the folder-discovery case.
                LoadError::Format(format_error) => {
                    LoadError::Configuration(format_error.into_configuration())
                }
                other => other,
            })?;
        tool_definitions.extend(child.into_tool_definitions());
    }
    let mut names = Vec::new();
    let mut slugs = Vec::new();
    if has_output {
        names.push(name);
        slugs.push(slug);
    }
    names.extend(tool_definitions.iter().map(|tool| tool.name.as_str()));
    slugs.extend(tool_definitions.iter().map(|tool| tool.slug.as_str()));
    assert_unique_values(names, |x| format!("tool name \"{x}\""))?;
    assert_unique_values(slugs, |x| format!("tool slug \"{x}\""))?;
    Ok(tool_definitions)
}

fn validate_steps(
    raw: &RawMap,
    views: &ViewRegistry,
) -> Result<Vec<StepDefinition>, ConfigurationError> {
    let mut step_definitions = Vec::new();
    let mut tool_variable_ids = Vec::new();
    for step_name in StepName::ALL {
        let step_map = match get_key(raw, step_name.as_str()) {
            None | Some(Value::Null) => continue,
            Some(Value::Mapping(map)) => map,
            Some(_) => {
                return Err(ConfigurationError::new(format!("\"{step_name}\" must be a map")));
            }
        };
        if step_map.is_empty() {
            continue;
        }
        let step_definition = load_step_definition(views, step_name, step_map)?;
        let variable_ids: Vec<&str> =
            step_definition.variable_definitions.iter().map(|v| v.id.as_str()).collect();
        assert_unique_values(variable_ids.iter().copied(), |x| format!("variable id \"{x}\""))?;
        tool_variable_ids.extend(variable_ids.into_iter().map(str::to_string));
        step_definitions.push(step_definition);
    }
    for reserved_id in RESERVED_VARIABLE_IDS {
        if tool_variable_ids.iter().any(|id| id == reserved_id) {
            return Err(ConfigurationError::new(format!(
                "\"{reserved_id}\" is a reserved variable"
            )));
        }
    }
    Ok(step_definitions)
}

fn load_step_definition(
    views: &ViewRegistry,
    step_name: StepName,
    step_map: &RawMap,
) -> Result<StepDefinition, ConfigurationError> {
    let variable_definitions = get_maps(step_map, "variables")?
        .iter()
        .map(|variable_map| load_variable_definition(views, variable_map, step_name))
        .collect::<Result<Vec<_>, _>>()?;
    let template_definitions = get_maps(step_map, "templates")?
        .iter()
        .map(load_template_definition)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StepDefinition { name: step_name, variable_definitions, template_definitions })
}

fn load_variable_definition(
    views: &ViewRegistry,
    variable_map: &RawMap,
    step_name: StepName,
) -> Result<VariableDefinition, ConfigurationError> {
    let variable_id = get_required_string(variable_map, "id", "variable")?;
    let view_name = get_required_string(variable_map, "view", "variable")?;
    let path_name = get_required_string(variable_map, "path", "variable")?;
    let mode_name = get_text(variable_map, "mode")?.unwrap_or_default().trim().to_string();
    let label_text = get_text(variable_map, "label")?
        .unwrap_or_else(|| format_name(&variable_id))
        .trim()
        .to_string();
    if !VARIABLE_ID_RE.is_match(&variable_id) {
        return Err(ConfigurationError::new(format!(
            "variable \"{variable_id}\" is not a valid variable id; please use only \
             lowercase, uppercase, numbers and underscores"
        )));
    }
    if !views.has_view(&view_name) {
        return Err(ConfigurationError::new(format!(
            "variable \"{variable_id}\" view \"{view_name}\" is not installed or not supported"
        )));
    }
    if path_name.starts_with('/') || path_name.starts_with("..") {
        return Err(ConfigurationError::new(format!(
            "variable \"{variable_id}\" path \"{path_name}\" must be within the folder"
        )));
    }
    if !mode_name.is_empty() && mode_name != "input" {
        return Err(ConfigurationError::new(format!(
            "variable \"{variable_id}\" mode must be \"input\" if specified"
        )));
    }
    let configuration_map = get_map(variable_map, "configuration")?;
    if let Some(configuration_path) = get_text(&configuration_map, "path")? {
        if !configuration_path.ends_with(".json") {
            return Err(ConfigurationError::new(format!(
                "variable configuration path \"{configuration_path}\" suffix must be \".json\""
            )));
        }
    }
    Ok(VariableDefinition {
        id: variable_id,
        view_name,
        path_name,
        mode_name,
        label_text,
        configuration: json_map_from_yaml(&configuration_map)?,
        step_name,
    })
}

fn load_template_definition(
    template_map: &RawMap,
) -> Result<TemplateDefinition, ConfigurationError> {
    let path_name = get_required_string(template_map, "path", "template")?;
    let expression_text = get_text(template_map, "expression")?;
    Ok(TemplateDefinition { path_name, expression_text })
}

fn validate_prints(
    step_definitions: &[StepDefinition],
    views: &ViewRegistry,
) -> Result<(), ConfigurationError> {
    let Some(print_step) = step_definitions.iter().find(|step| step.name == StepName::Print)
    else {
        return Ok(());
    };
    for variable in &print_step.variable_definitions {
        let view_name = variable.view_name.as_str();
        if view_name == "link" {
            continue;
        }
        if !PRINTER_NAMES.contains(&view_name) {
            return Err(ConfigurationError::new(format!(
                "printer \"{view_name}\" is not supported"
            )));
        }
        if !views.has_printer(view_name) {
            tracing::error!(
                "printer \"{view_name}\" is missing; install automate-printers-{view_name}"
            );
        }
        check_page_number_options(variable)?;
    }
    Ok(())
}

fn check_page_number_options(variable: &VariableDefinition) -> Result<(), ConfigurationError> {
    let Some(options) = variable.configuration.get("page-number").and_then(|v| v.as_object())
    else {
        return Ok(());
    };
    if let Some(location) = options.get("location").and_then(|v| v.as_str()) {
        if !["header", "footer"].contains(&location) {
            return Err(ConfigurationError::new(format!(
                "print variable \"{}\" configuration \"page-number\" location \
                 \"{location}\" is not supported",
                variable.id
            )));
        }
    }
    if let Some(alignment) = options.get("alignment").and_then(|v| v.as_str()) {
        if !["left", "center", "right"].contains(&alignment) {
            return Err(ConfigurationError::new(format!(
                "print variable \"{}\" configuration \"page-number\" alignment \
                 \"{alignment}\" is not supported",
                variable.id
            )));
        }
    }
    Ok(())
}

async fn validate_datasets(
    raw: &RawMap,
    folder: &Path,
) -> Result<Vec<DatasetDefinition>, LoadError> {
    let mut dataset_definitions = Vec::new();
    for dataset_map in get_maps(raw, "datasets")? {
        let path_name = get_required_string(&dataset_map, "path", "dataset")?;
        if !is_contained_path(&path_name) {
            return Err(ConfigurationError::new(format!(
                "dataset path \"{path_name}\" is invalid"
            ))
            .into());
        }
        let input_text = get_text(&dataset_map, "input")?.unwrap_or_else(|| "none".to_string());
        let input_mode = match input_text.as_str() {
            "none" => DatasetInputMode::None,
            "replace" => DatasetInputMode::Replace,
            other => {
                return Err(ConfigurationError::new(format!(
                    "dataset input \"{other}\" is not supported"
                ))
                .into());
            }
        };
        let output_text = get_text(&dataset_map, "output")?.unwrap_or_else(|| "none".to_string());
        let output_mode = match output_text.as_str() {
            "none" => DatasetOutputMode::None,
            "append" => DatasetOutputMode::Append,
            "replace" => DatasetOutputMode::Replace,
            other => {
                return Err(ConfigurationError::new(format!(
                    "dataset output \"{other}\" is not supported"
                ))
                .into());
            }
        };
        let reference = validate_dataset_reference(&dataset_map, folder).await?;
        dataset_definitions.push(DatasetDefinition {
            path_name,
            input_mode,
            output_mode,
            reference,
        });
    }
    assert_unique_values(
        dataset_definitions.iter().map(|dataset| dataset.path_name.as_str()),
        |x| format!("dataset path \"{x}\""),
    )?;
    Ok(dataset_definitions)
}

async fn validate_dataset_reference(
    dataset_map: &RawMap,
    folder: &Path,
) -> Result<DatasetReference, LoadError> {
    let reference_map = get_map(dataset_map, "reference")?;
    let mut reference = DatasetReference::default();
    let reference_path =
        get_text(&reference_map, "path")?.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
    if let Some(reference_path) = reference_path {
        let source_path = folder.join(&reference_path);
        if !is_existing_path(&source_path).await {
            if is_link_path(&source_path).await {
                return Err(ConfigurationError::new(format!(
                    "dataset reference link \"{reference_path}\" is invalid"
                ))
                .into());
            } else if source_path.file_name() == Some(std::ffi::OsStr::new("results")) {
                fs::create_dir_all(&source_path)
                    .await
                    .map_err(|e| ConfigurationError::new(e.to_string()))?;
            } else {
                return Err(ConfigurationError::new(format!(
                    "dataset reference path \"{reference_path}\" was not found"
                ))
                .into());
            }
        }
        reference.path = Some(PathBuf::from(reference_path));
    } else if let Some(uri) = get_text(&reference_map, "uri")? {
        reference.uri = Some(uri);
    }
    Ok(reference)
}

fn validate_scripts(raw: &RawMap) -> Result<Vec<ScriptDefinition>, ConfigurationError> {
    let mut script_definitions = Vec::new();
    for script_map in get_maps(raw, "scripts")? {
        let mut method_names = Vec::new();
        let mut command_string = String::new();
        let mut preparation_map = BTreeMap::new();
        if let Some(command) = get_text(&script_map, "command")? {
            command_string = command;
            method_names.push("command");
        }
        if let Some(path_text) = get_text(&script_map, "path")? {
            (command_string, preparation_map) = prepare_script_path(&path_text)?;
            method_names.push("path");
        }
        if let Some(function_string) = get_text(&script_map, "function")? {
            let language =
                get_text(&script_map, "language")?.unwrap_or_else(|| SCRIPT_LANGUAGE.to_string());
            (command_string, preparation_map) =
                prepare_script_function(&language, &function_string)?;
            method_names.push("function");
        }
        match method_names.len() {
            0 => {
                return Err(ConfigurationError::new(
                    "script command or path or function is required",
                ));
            }
            1 => {}
            _ => {
                return Err(ConfigurationError::new(format!(
                    "script {} conflict; choose one",
                    method_names.join(" and ")
                )));
            }
        }
        let folder =
            PathBuf::from(get_text(&script_map, "folder")?.unwrap_or_else(|| ".".to_string()));
        script_definitions.push(ScriptDefinition { folder, command_string, preparation_map });
    }
    Ok(script_definitions)
}

fn prepare_script_path(
    path_text: &str,
) -> Result<(String, BTreeMap<String, String>), ConfigurationError> {
    let path = Path::new(path_text);
    match path.extension().and_then(|suffix| suffix.to_str()) {
        Some("py") => Ok((format!("python \"{path_text}\""), BTreeMap::new())),
        Some("ipynb") => {
            // The execution subsystem converts the notebook into a hidden
            // sibling script before running it.
            let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or(path_text);
            let target_path =
                path.with_file_name(format!(".{file_name}.py")).display().to_string();
            let command_string = format!("python \"{target_path}\"");
            let preparation_map = BTreeMap::from([
                ("target_path".to_string(), target_path),
                ("notebook_path".to_string(), path_text.to_string()),
            ]);
            Ok((command_string, preparation_map))
        }
        Some("sh") => Ok((format!("bash \"{path_text}\""), BTreeMap::new())),
        _ => Err(ConfigurationError::new(format!(
            "script path suffix can be one of .py .ipynb .sh; message {SUPPORT_EMAIL} to \
             request support for more suffixes"
        ))),
    }
}

fn prepare_script_function(
    script_language: &str,
    function_string: &str,
) -> Result<(String, BTreeMap<String, String>), ConfigurationError> {
    match script_language {
        "python" => {
            let target_path = ".run.py".to_string();
            let command_string = format!("python \"{target_path}\"");
            let preparation_map = BTreeMap::from([
                ("target_path".to_string(), target_path),
                ("function_string".to_string(), function_string.to_string()),
            ]);
            Ok((command_string, preparation_map))
        }
        _ => Err(ConfigurationError::new(format!(
            "script language can be one of python; message {SUPPORT_EMAIL} to request \
             support for more languages"
        ))),
    }
}

fn validate_environment(
    raw: &RawMap,
    scope: &ToolScope<'_>,
) -> Result<EnvironmentDefinition, ConfigurationError> {
    let environment_map = get_map(raw, "environment")?;
    let engine_name =
        get_text(&environment_map, "engine")?.unwrap_or_else(|| ENGINE_NAME.to_string());
    let parent_image_name =
        get_text(&environment_map, "image")?.unwrap_or_else(|| IMAGE_NAME.to_string());

    let mut package_definitions = Vec::new();
    for package_map in get_maps(&environment_map, "packages")? {
        let package_id = get_required_string(&package_map, "id", "package")?;
        let manager_text = get_required_string(&package_map, "manager", "package")?;
        let manager_name = PackageManager::parse(&manager_text).ok_or_else(|| {
            ConfigurationError::new(format!("manager \"{manager_text}\" is not supported"))
        })?;
        package_definitions.push(PackageDefinition { id: package_id, manager_name });
    }

    let mut port_definitions = Vec::new();
    for port_map in get_maps(&environment_map, "ports")? {
        let port_id = get_required_string(&port_map, "id", "port")?;
        let number_text = get_text(&port_map, "number")?
            .ok_or_else(|| ConfigurationError::new("\"number\" is required for each port"))?;
        let number: u16 = number_text.trim().parse().map_err(|_| {
            ConfigurationError::new(format!("port number \"{number_text}\" must be an integer"))
        })?;
        let step_name = scope
            .variable_definitions(StepName::Log)
            .iter()
            .chain(scope.variable_definitions(StepName::Debug))
            .find(|variable| variable.id == port_id)
            .map(|variable| variable.step_name)
            .ok_or_else(|| {
                ConfigurationError::new(format!(
                    "port \"{port_id}\" must correspond to a log or debug variable"
                ))
            })?;
        port_definitions.push(PortDefinition { id: port_id, number, step_name });
    }

    let mut variable_definitions = Vec::new();
    for variable_map in get_maps(&environment_map, "variables")? {
        let variable_id = get_required_string(&variable_map, "id", "environment variable")?;
        if std::env::var_os(&variable_id).is_none() {
            tracing::error!("tool environment is missing variable \"{variable_id}\"");
        }
        variable_definitions.push(EnvironmentVariableDefinition { id: variable_id });
    }
    assert_unique_values(
        variable_definitions.iter().map(|variable| variable.id.as_str()),
        |x| format!("environment variable id \"{x}\""),
    )?;

    Ok(EnvironmentDefinition {
        engine_name,
        parent_image_name,
        package_definitions,
        port_definitions,
        variable_definitions,
    })
}

fn validate_display(raw: &RawMap) -> Result<DisplayDefinition, ConfigurationError> {
    let display_map = get_map(raw, "display")?;

    let mut style_definitions = Vec::new();
    for style_map in get_maps(&display_map, "styles")? {
        let path_name = get_text(&style_map, "path")?.unwrap_or_default().trim().to_string();
        let uri = get_text(&style_map, "uri")?.unwrap_or_default().trim().to_string();
        if path_name.is_empty() && uri.is_empty() {
            return Err(ConfigurationError::new("style path or uri is required"));
        }
        style_definitions.push(StyleDefinition { path_name, uri });
    }

    let mut page_definitions = Vec::new();
    for page_map in get_maps(&display_map, "pages")? {
        let page_id = get_required_string(&page_map, "id", "page")?;
        let design_name = get_text(&page_map, "design")?;
        let design_name = match page_id.as_str() {
            "tool" => {
                let design_name = design_name.unwrap_or_else(|| "input".to_string());
                if !["input", "output", "none"].contains(&design_name.as_str()) {
                    return Err(ConfigurationError::new(format!(
                        "tool design \"{design_name}\" is not supported"
                    )));
                }
                design_name
            }
            "input" | "output" | "log" | "debug" => {
                let design_name = design_name.unwrap_or_else(|| "flex".to_string());
                if !["flex", "flat", "none"].contains(&design_name.as_str()) {
                    return Err(ConfigurationError::new(format!(
                        "tool design \"{design_name}\" is not supported"
                    )));
                }
                design_name
            }
            _ => {
                return Err(ConfigurationError::new(format!(
                    "page id \"{page_id}\" is not supported"
                )));
            }
        };
        let mut button_definitions = Vec::new();
        for button_map in get_maps(&page_map, "buttons")? {
            let button_id = get_required_string(&button_map, "id", "button")?;
            if !["continue", "back"].contains(&button_id.as_str()) {
                return Err(ConfigurationError::new(format!(
                    "button id \"{button_id}\" is not supported"
                )));
            }
            let text = get_required_string(&button_map, "text", "button")?;
            button_definitions.push(ButtonDefinition { id: button_id, text });
        }
        page_definitions.push(PageDefinition { id: page_id, design_name, button_definitions });
    }

    Ok(DisplayDefinition { style_definitions, page_definitions })
}
