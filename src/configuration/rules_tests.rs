//! Tests for the validation rule pipeline.
//!
//! These tests verify that the cascade correctly enforces:
//! - Protocol version compatibility
//! - Path containment within the tool folder
//! - Identifier defaulting and uniqueness across composed tools
//! - Step, script, dataset, environment, and display invariants

use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use crate::configuration::{
    DatasetInputMode, DatasetOutputMode, PackageManager, StepName, load_configuration,
};

fn write_tool(folder: &Path, name: &str, text: &str) {
    std::fs::write(folder.join(name), text).unwrap();
}

async fn load_error(folder: &Path, text: &str) -> String {
    write_tool(folder, "automate.yaml", text);
    load_configuration(folder.join("automate.yaml")).await.unwrap_err().to_string()
}

const RUNNABLE_PREAMBLE: &str = r#"
crosscompute: 0.9.5
copyright: {text: "Example Lab © 2024"}
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
presets:
  - folder: p1
"#;

#[tokio::test]
async fn test_missing_protocol_version() {
    let temp = TempDir::new().unwrap();
    let message = load_error(temp.path(), "name: T\n").await;
    assert!(message.contains("protocol version is missing"));
}

#[tokio::test]
async fn test_blank_protocol_version() {
    let temp = TempDir::new().unwrap();
    let message = load_error(temp.path(), "crosscompute: ' '\n").await;
    assert!(message.contains("protocol version is required"));
}

#[tokio::test]
async fn test_incompatible_protocol_version() {
    let temp = TempDir::new().unwrap();
    let message = load_error(temp.path(), "crosscompute: 0.8.0\n").await;
    assert!(message.contains("is not compatible"));
}

#[tokio::test]
async fn test_default_identifiers_use_locus() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(temp.path(), "automate.yaml", "crosscompute: 0.9.5\n");

    let configuration = load_configuration(temp.path()).await?;
    assert_eq!(configuration.name, "Kit 0");
    assert_eq!(configuration.slug, "kit-0");
    assert!(!configuration.is_runnable());
    Ok(())
}

#[tokio::test]
async fn test_path_escaping_tool_folder_fails() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        "crosscompute: 0.9.5\nscripts:\n  - path: ../escape.py\n",
    )
    .await;
    assert!(message.contains("must be in folder"));
}

#[tokio::test]
async fn test_absolute_path_fails() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        "crosscompute: 0.9.5\ndatasets:\n  - path: /etc/passwd\n",
    )
    .await;
    assert!(message.contains("must be in folder"));
}

#[tokio::test]
async fn test_non_string_path_fails() {
    let temp = TempDir::new().unwrap();
    let message =
        load_error(temp.path(), "crosscompute: 0.9.5\ndatasets:\n  - path: [a]\n").await;
    assert!(message.contains("\"path\" must be a string"));
}

#[tokio::test]
async fn test_contained_paths_pass() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(
        temp.path(),
        "automate.yaml",
        &format!("{RUNNABLE_PREAMBLE}datasets:\n  - path: data/rows.csv\n"),
    );
    let configuration = load_configuration(temp.path()).await?;
    assert_eq!(configuration.dataset_definitions.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_reserved_variable_id_fails() {
    let temp = TempDir::new().unwrap();
    let text = r#"
crosscompute: 0.9.5
copyright: {text: "Example Lab © 2024"}
output:
  variables:
    - {id: return_code, view: number, path: code.txt}
presets:
  - folder: p1
"#;
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("\"return_code\" is a reserved variable"));
}

#[tokio::test]
async fn test_duplicate_variable_id_within_step_fails() {
    let temp = TempDir::new().unwrap();
    let text = r#"
crosscompute: 0.9.5
input:
  variables:
    - {id: a, view: string, path: a.txt}
    - {id: a, view: string, path: b.txt}
"#;
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("variable id \"a\" is not unique"));
}

#[tokio::test]
async fn test_variable_id_pattern_is_enforced() {
    let temp = TempDir::new().unwrap();
    let text = "crosscompute: 0.9.5\ninput:\n  variables:\n    - {id: 'a b', view: string, path: a.txt}\n";
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("is not a valid variable id"));
}

#[tokio::test]
async fn test_unknown_view_fails() {
    let temp = TempDir::new().unwrap();
    let text =
        "crosscompute: 0.9.5\ninput:\n  variables:\n    - {id: a, view: vector, path: a.txt}\n";
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("view \"vector\" is not installed or not supported"));
}

#[tokio::test]
async fn test_variable_mode_must_be_input() {
    let temp = TempDir::new().unwrap();
    let text = "crosscompute: 0.9.5\ninput:\n  variables:\n    - {id: a, view: string, path: a.txt, mode: output}\n";
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("mode must be \"input\""));
}

#[tokio::test]
async fn test_variable_configuration_path_must_be_json() {
    let temp = TempDir::new().unwrap();
    let text = "crosscompute: 0.9.5\ninput:\n  variables:\n    - {id: a, view: string, path: a.txt, configuration: {path: c.yaml}}\n";
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("suffix must be \".json\""));
}

#[tokio::test]
async fn test_variable_label_defaults_from_id() -> Result<()> {
    let temp = TempDir::new().unwrap();
    let text = "crosscompute: 0.9.5\ninput:\n  variables:\n    - {id: town_name, view: string, path: town.txt}\n";
    write_tool(temp.path(), "automate.yaml", text);

    let configuration = load_configuration(temp.path()).await?;
    let variable = &configuration.variable_definitions(StepName::Input)[0];
    assert_eq!(variable.label_text, "Town name");
    Ok(())
}

#[tokio::test]
async fn test_copyright_required_for_runnable_tool() {
    let temp = TempDir::new().unwrap();
    let text = r#"
crosscompute: 0.9.5
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
presets:
  - folder: p1
"#;
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("copyright is required"));
}

#[tokio::test]
async fn test_copyright_text_from_name_and_year() -> Result<()> {
    let temp = TempDir::new().unwrap();
    let text = r#"
crosscompute: 0.9.5
copyright: {name: Example Lab, year: 2024}
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
presets:
  - folder: p1
"#;
    write_tool(temp.path(), "automate.yaml", text);

    let configuration = load_configuration(temp.path()).await?;
    assert_eq!(configuration.copyright_definition.text, "Example Lab © 2024");
    Ok(())
}

#[tokio::test]
async fn test_copyright_undefined_placeholder_fails() {
    let temp = TempDir::new().unwrap();
    let text = "crosscompute: 0.9.5\ncopyright: {text: '{name} © {year}'}\n";
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("specified in text but undefined"));
}

#[tokio::test]
async fn test_kit_composes_and_flattens_tools() -> Result<()> {
    let temp = TempDir::new().unwrap();
    let child = r#"
crosscompute: 0.9.5
name: NAME
copyright: {text: "Example Lab © 2024"}
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
presets:
  - folder: p1
"#;
    write_tool(temp.path(), "a.yaml", &child.replace("NAME", "Tool A"));
    write_tool(temp.path(), "b.yaml", &child.replace("NAME", "Tool B"));
    write_tool(
        temp.path(),
        "automate.yaml",
        "crosscompute: 0.9.5\nname: Suite\ntools:\n  - {path: a.yaml}\n  - {path: b.yaml}\n",
    );

    let configuration = load_configuration(temp.path()).await?;
    assert!(!configuration.is_runnable());
    let names: Vec<_> =
        configuration.runnable_tools().iter().map(|tool| tool.name.clone()).collect();
    assert_eq!(names, vec!["Tool A", "Tool B"]);
    assert_eq!(configuration.tool_definitions[0].locus, "0-0");
    assert_eq!(configuration.tool_definitions[1].locus, "0-1");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_tool_names_fail() {
    let temp = TempDir::new().unwrap();
    let child = r#"
crosscompute: 0.9.5
name: Twin
copyright: {text: "Example Lab © 2024"}
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
presets:
  - folder: p1
"#;
    write_tool(temp.path(), "a.yaml", child);
    write_tool(temp.path(), "b.yaml", &child.replace("p1", "p2"));
    let message = load_error(
        temp.path(),
        "crosscompute: 0.9.5\ntools:\n  - {path: a.yaml}\n  - {path: b.yaml}\n",
    )
    .await;
    assert!(message.contains("tool name \"Twin\" is not unique"));
}

#[tokio::test]
async fn test_tool_entry_requires_path() {
    let temp = TempDir::new().unwrap();
    let message =
        load_error(temp.path(), "crosscompute: 0.9.5\ntools:\n  - {name: x}\n").await;
    assert!(message.contains("tool path is required"));
}

#[tokio::test]
async fn test_nested_format_error_is_fatal() {
    let temp = TempDir::new().unwrap();
    write_tool(temp.path(), "notes.md", "# not a tool");
    let message =
        load_error(temp.path(), "crosscompute: 0.9.5\ntools:\n  - {path: notes.md}\n").await;
    assert!(message.contains("not supported"));
}

#[tokio::test]
async fn test_script_requires_exactly_one_method() {
    let temp = TempDir::new().unwrap();
    let message =
        load_error(temp.path(), &format!("{RUNNABLE_PREAMBLE}scripts:\n  - {{folder: .}}\n"))
            .await;
    assert!(message.contains("script command or path or function is required"));

    let message = load_error(
        temp.path(),
        &format!("{RUNNABLE_PREAMBLE}scripts:\n  - {{command: make, path: run.py}}\n"),
    )
    .await;
    assert!(message.contains("conflict; choose one"));
}

#[tokio::test]
async fn test_script_path_builds_command() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(
        temp.path(),
        "automate.yaml",
        &format!("{RUNNABLE_PREAMBLE}scripts:\n  - {{path: run.py}}\n"),
    );

    let configuration = load_configuration(temp.path()).await?;
    let script = &configuration.script_definitions[0];
    assert_eq!(script.command_string, "python \"run.py\"");
    assert!(script.preparation_map.is_empty());
    assert_eq!(script.folder, Path::new("."));
    Ok(())
}

#[tokio::test]
async fn test_script_notebook_prepares_hidden_target() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(
        temp.path(),
        "automate.yaml",
        &format!("{RUNNABLE_PREAMBLE}scripts:\n  - {{path: run.ipynb}}\n"),
    );

    let configuration = load_configuration(temp.path()).await?;
    let script = &configuration.script_definitions[0];
    assert_eq!(script.command_string, "python \".run.ipynb.py\"");
    assert_eq!(script.preparation_map["target_path"], ".run.ipynb.py");
    assert_eq!(script.preparation_map["notebook_path"], "run.ipynb");
    Ok(())
}

#[tokio::test]
async fn test_script_function_prepares_run_file() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(
        temp.path(),
        "automate.yaml",
        &format!("{RUNNABLE_PREAMBLE}scripts:\n  - {{function: work.run}}\n"),
    );

    let configuration = load_configuration(temp.path()).await?;
    let script = &configuration.script_definitions[0];
    assert_eq!(script.command_string, "python \".run.py\"");
    assert_eq!(script.preparation_map["function_string"], "work.run");
    Ok(())
}

#[tokio::test]
async fn test_script_suffix_must_be_supported() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!("{RUNNABLE_PREAMBLE}scripts:\n  - {{path: run.rb}}\n"),
    )
    .await;
    assert!(message.contains("script path suffix can be one of"));
}

#[tokio::test]
async fn test_dataset_modes_parse_and_reject() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(
        temp.path(),
        "automate.yaml",
        &format!(
            "{RUNNABLE_PREAMBLE}datasets:\n  - {{path: data/a.csv, input: replace, output: append}}\n"
        ),
    );
    let configuration = load_configuration(temp.path()).await?;
    let dataset = &configuration.dataset_definitions[0];
    assert_eq!(dataset.input_mode, DatasetInputMode::Replace);
    assert_eq!(dataset.output_mode, DatasetOutputMode::Append);

    let message = load_error(
        temp.path(),
        &format!("{RUNNABLE_PREAMBLE}datasets:\n  - {{path: data/a.csv, output: rotate}}\n"),
    )
    .await;
    assert!(message.contains("dataset output \"rotate\" is not supported"));
    Ok(())
}

#[tokio::test]
async fn test_dataset_traversing_path_fails() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!("{RUNNABLE_PREAMBLE}datasets:\n  - {{path: 'data/../../a.csv'}}\n"),
    )
    .await;
    assert!(message.contains("is invalid") || message.contains("must be in folder"));
}

#[tokio::test]
async fn test_dataset_duplicate_paths_fail() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!(
            "{RUNNABLE_PREAMBLE}datasets:\n  - {{path: data/a.csv}}\n  - {{path: data/a.csv}}\n"
        ),
    )
    .await;
    assert!(message.contains("dataset path \"data/a.csv\" is not unique"));
}

#[tokio::test]
async fn test_dataset_reference_results_folder_is_created() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(
        temp.path(),
        "automate.yaml",
        &format!(
            "{RUNNABLE_PREAMBLE}datasets:\n  - {{path: data/a, reference: {{path: results}}}}\n"
        ),
    );
    load_configuration(temp.path()).await?;
    assert!(temp.path().join("results").is_dir());
    Ok(())
}

#[tokio::test]
async fn test_dataset_reference_missing_path_fails() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!(
            "{RUNNABLE_PREAMBLE}datasets:\n  - {{path: data/a, reference: {{path: archive}}}}\n"
        ),
    )
    .await;
    assert!(message.contains("dataset reference path \"archive\" was not found"));
}

#[tokio::test]
async fn test_environment_defaults() -> Result<()> {
    let temp = TempDir::new().unwrap();
    write_tool(temp.path(), "automate.yaml", RUNNABLE_PREAMBLE);

    let configuration = load_configuration(temp.path()).await?;
    let environment = &configuration.environment_definition;
    assert_eq!(environment.engine_name, "podman");
    assert_eq!(environment.parent_image_name, "python");
    Ok(())
}

#[tokio::test]
async fn test_environment_packages_and_ports() -> Result<()> {
    let temp = TempDir::new().unwrap();
    let text = r#"
crosscompute: 0.9.5
copyright: {text: "Example Lab © 2024"}
log:
  variables:
    - {id: server, view: link, path: server.log}
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
presets:
  - folder: p1
environment:
  image: python:3.11-slim
  packages:
    - {id: pandas, manager: pip}
  ports:
    - {id: server, number: 8888}
"#;
    write_tool(temp.path(), "automate.yaml", text);

    let configuration = load_configuration(temp.path()).await?;
    let environment = &configuration.environment_definition;
    assert_eq!(environment.parent_image_name, "python:3.11-slim");
    assert_eq!(environment.package_definitions[0].manager_name, PackageManager::Pip);
    let port = &environment.port_definitions[0];
    assert_eq!(port.number, 8888);
    assert_eq!(port.step_name, StepName::Log);
    Ok(())
}

#[tokio::test]
async fn test_environment_port_without_variable_fails() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!(
            "{RUNNABLE_PREAMBLE}environment:\n  ports:\n    - {{id: server, number: 8888}}\n"
        ),
    )
    .await;
    assert!(message.contains("must correspond to a log or debug variable"));
}

#[tokio::test]
async fn test_environment_package_manager_must_be_supported() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!(
            "{RUNNABLE_PREAMBLE}environment:\n  packages:\n    - {{id: curl, manager: brew}}\n"
        ),
    )
    .await;
    assert!(message.contains("manager \"brew\" is not supported"));
}

#[tokio::test]
async fn test_environment_duplicate_variable_ids_fail() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!(
            "{RUNNABLE_PREAMBLE}environment:\n  variables:\n    - {{id: TOKEN}}\n    - {{id: TOKEN}}\n"
        ),
    )
    .await;
    assert!(message.contains("environment variable id \"TOKEN\" is not unique"));
}

#[tokio::test]
async fn test_print_view_must_be_a_printer() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!(
            "{RUNNABLE_PREAMBLE}print:\n  variables:\n    - {{id: report, view: markdown, path: report.md}}\n"
        ),
    )
    .await;
    assert!(message.contains("printer \"markdown\" is not supported"));
}

#[tokio::test]
async fn test_print_page_number_options_are_checked() {
    let temp = TempDir::new().unwrap();
    let text = r#"
crosscompute: 0.9.5
copyright: {text: "Example Lab © 2024"}
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
print:
  variables:
    - id: report
      view: pdf
      path: report.pdf
      configuration:
        page-number: {location: margin}
presets:
  - folder: p1
"#;
    let message = load_error(temp.path(), text).await;
    assert!(message.contains("location \"margin\" is not supported"));
}

#[tokio::test]
async fn test_display_styles_and_pages() -> Result<()> {
    let temp = TempDir::new().unwrap();
    let text = r#"
crosscompute: 0.9.5
copyright: {text: "Example Lab © 2024"}
output:
  variables:
    - {id: sum, view: number, path: sum.txt}
presets:
  - folder: p1
display:
  styles:
    - {path: style.css}
  pages:
    - id: tool
      buttons:
        - {id: continue, text: Next}
"#;
    write_tool(temp.path(), "automate.yaml", text);

    let configuration = load_configuration(temp.path()).await?;
    let display = &configuration.display_definition;
    assert_eq!(display.style_definitions[0].path_name, "style.css");
    assert_eq!(display.page_definitions[0].design_name, "input");
    assert_eq!(display.page_definitions[0].button_definitions[0].text, "Next");
    Ok(())
}

#[tokio::test]
async fn test_display_rejects_unknown_page_and_button() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!("{RUNNABLE_PREAMBLE}display:\n  pages:\n    - {{id: about}}\n"),
    )
    .await;
    assert!(message.contains("page id \"about\" is not supported"));

    let message = load_error(
        temp.path(),
        &format!(
            "{RUNNABLE_PREAMBLE}display:\n  pages:\n    - {{id: tool, buttons: [{{id: jump, text: Go}}]}}\n"
        ),
    )
    .await;
    assert!(message.contains("button id \"jump\" is not supported"));
}

#[tokio::test]
async fn test_display_style_requires_path_or_uri() {
    let temp = TempDir::new().unwrap();
    let message = load_error(
        temp.path(),
        &format!("{RUNNABLE_PREAMBLE}display:\n  styles:\n    - {{}}\n"),
    )
    .await;
    assert!(message.contains("style path or uri is required"));
}
