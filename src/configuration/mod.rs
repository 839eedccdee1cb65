//! Configuration loading and validation.
//!
//! A configuration document is a YAML mapping describing one tool — its
//! input/output variables per lifecycle step, presets, datasets, scripts,
//! runtime environment, and display pages — or a kit composing other tools
//! by path. [`Loader::load_configuration`] discovers and parses a document,
//! then drives an ordered cascade of validation rules that builds the typed
//! [`ToolDefinition`] tree returned to callers.
//!
//! Every configuration node validates into a fixed struct here. The structs
//! are populated progressively by the ordered rule pipeline and are
//! read-only once a load returns.
//!
//! # Example
//!
//! ```no_run
//! use automate_cli::configuration::load_configuration;
//!
//! # async fn example() -> Result<(), automate_cli::core::LoadError> {
//! let tool = load_configuration("automate.yaml").await?;
//! for tool in tool.runnable_tools() {
//!     println!("{} {}", tool.slug, tool.version);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::variable::{DataById, load_variable_data_by_id};

mod helpers;
pub mod loader;
mod presets;
mod rules;

#[cfg(test)]
mod rules_tests;

pub use loader::{Loader, load_configuration};

/// The raw YAML mapping of a configuration document, keys in document order.
pub type RawMap = serde_yaml::Mapping;

/// The five lifecycle phases exchanging variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepName {
    Input,
    Log,
    Output,
    Debug,
    Print,
}

impl StepName {
    /// All steps, in validation order.
    pub const ALL: [StepName; 5] =
        [StepName::Input, StepName::Log, StepName::Output, StepName::Debug, StepName::Print];

    pub fn as_str(self) -> &'static str {
        match self {
            StepName::Input => "input",
            StepName::Log => "log",
            StepName::Output => "output",
            StepName::Debug => "debug",
            StepName::Print => "print",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One validated tool, or a kit wrapping child tools.
#[derive(Debug, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub slug: String,
    pub version: String,
    pub protocol_version: String,
    pub absolute_path: PathBuf,
    pub absolute_folder: PathBuf,
    /// Recursion-path identifier distinguishing this document's position in
    /// a nested composition tree, e.g. `0-2-1`.
    pub locus: String,
    pub copyright_definition: CopyrightDefinition,
    pub step_definitions: Vec<StepDefinition>,
    /// Runnable tools contributed by `tools` entries, flattened in declared
    /// order. The owning document itself is not in this list; see
    /// [`Self::runnable_tools`].
    pub tool_definitions: Vec<ToolDefinition>,
    pub preset_definitions: Vec<PresetDefinition>,
    pub dataset_definitions: Vec<DatasetDefinition>,
    pub script_definitions: Vec<ScriptDefinition>,
    pub environment_definition: EnvironmentDefinition,
    pub display_definition: DisplayDefinition,
    pub(crate) has_output: bool,
}

impl ToolDefinition {
    /// A document that declares an `output` step is itself a runnable tool;
    /// one that does not is a kit.
    pub fn is_runnable(&self) -> bool {
        self.has_output
    }

    /// Every runnable tool this document contributes: itself when runnable,
    /// then the flattened children in declared order.
    pub fn runnable_tools(&self) -> Vec<&ToolDefinition> {
        let mut tools = Vec::new();
        if self.is_runnable() {
            tools.push(self);
        }
        tools.extend(self.tool_definitions.iter());
        tools
    }

    /// Consume this document into its contribution to a parent kit's
    /// flattened tool list.
    pub fn into_tool_definitions(mut self) -> Vec<ToolDefinition> {
        let nested = std::mem::take(&mut self.tool_definitions);
        let mut tools = Vec::new();
        if self.is_runnable() {
            tools.push(self);
        }
        tools.extend(nested);
        tools
    }

    pub fn step(&self, step_name: StepName) -> Option<&StepDefinition> {
        self.step_definitions.iter().find(|step| step.name == step_name)
    }

    pub fn variable_definitions(&self, step_name: StepName) -> &[VariableDefinition] {
        self.step(step_name).map(|step| step.variable_definitions.as_slice()).unwrap_or(&[])
    }

    /// Load typed variable values for one step of a run's result folder.
    /// Variables whose data fails to load are omitted.
    pub async fn load_data_by_id(
        &self,
        loader: &Loader,
        result_folder: impl AsRef<Path>,
        step_name: StepName,
    ) -> DataById {
        let step_folder =
            self.absolute_folder.join(result_folder.as_ref()).join(step_name.as_str());
        load_variable_data_by_id(
            loader.cache(),
            loader.views(),
            &step_folder,
            self.variable_definitions(step_name),
        )
        .await
    }
}

/// One lifecycle phase and the variables and templates it declares.
#[derive(Debug, PartialEq)]
pub struct StepDefinition {
    pub name: StepName,
    pub variable_definitions: Vec<VariableDefinition>,
    pub template_definitions: Vec<TemplateDefinition>,
}

/// One named input/output value of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub id: String,
    pub view_name: String,
    /// Path relative to the step folder; may contain `{suffix}`/`{index}`
    /// template tokens.
    pub path_name: String,
    /// Empty, or `input` for variables editable after a run.
    pub mode_name: String,
    pub label_text: String,
    pub configuration: Map<String, Value>,
    pub step_name: StepName,
}

/// A custom layout template for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDefinition {
    pub path_name: String,
    pub expression_text: Option<String>,
}

/// One example input set, expanded and resolved.
#[derive(Debug, PartialEq)]
pub struct PresetDefinition {
    pub folder_name: String,
    pub name: String,
    pub slug: String,
    /// Resolved variable data per step; presets populate `input`.
    pub data: std::collections::HashMap<StepName, DataById>,
}

impl PresetDefinition {
    pub fn input_data(&self) -> Option<&DataById> {
        self.data.get(&StepName::Input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetInputMode {
    #[default]
    None,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetOutputMode {
    #[default]
    None,
    Append,
    Replace,
}

/// An optional source backing a dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetReference {
    pub path: Option<PathBuf>,
    pub uri: Option<String>,
}

/// A data file or folder attached to a tool.
#[derive(Debug, PartialEq)]
pub struct DatasetDefinition {
    pub path_name: String,
    pub input_mode: DatasetInputMode,
    pub output_mode: DatasetOutputMode,
    pub reference: DatasetReference,
}

/// The command a tool runs, derived from exactly one of `command`, `path`
/// or `function`.
#[derive(Debug, PartialEq)]
pub struct ScriptDefinition {
    pub folder: PathBuf,
    pub command_string: String,
    /// Files the execution subsystem materializes before running the
    /// command, e.g. a notebook converted to a script.
    pub preparation_map: BTreeMap<String, String>,
}

/// The execution runtime of a tool.
#[derive(Debug, PartialEq)]
pub struct EnvironmentDefinition {
    pub engine_name: String,
    pub parent_image_name: String,
    pub package_definitions: Vec<PackageDefinition>,
    pub port_definitions: Vec<PortDefinition>,
    pub variable_definitions: Vec<EnvironmentVariableDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Dnf,
    Apt,
    Pip,
    Npm,
}

impl PackageManager {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "dnf" => Some(Self::Dnf),
            "apt" => Some(Self::Apt),
            "pip" => Some(Self::Pip),
            "npm" => Some(Self::Npm),
            _ => None,
        }
    }
}

/// A package installed into the runtime image.
#[derive(Debug, PartialEq)]
pub struct PackageDefinition {
    pub id: String,
    pub manager_name: PackageManager,
}

/// A port exposed by a running tool, tied to a log or debug variable.
#[derive(Debug, PartialEq)]
pub struct PortDefinition {
    pub id: String,
    pub number: u16,
    pub step_name: StepName,
}

/// An environment variable forwarded into the runtime.
#[derive(Debug, PartialEq)]
pub struct EnvironmentVariableDefinition {
    pub id: String,
}

/// Attribution text shown with a tool's results.
#[derive(Debug, PartialEq)]
pub struct CopyrightDefinition {
    pub text: String,
}

/// UI pages and styles.
#[derive(Debug, PartialEq, Default)]
pub struct DisplayDefinition {
    pub style_definitions: Vec<StyleDefinition>,
    pub page_definitions: Vec<PageDefinition>,
}

#[derive(Debug, PartialEq)]
pub struct StyleDefinition {
    pub path_name: String,
    pub uri: String,
}

#[derive(Debug, PartialEq)]
pub struct PageDefinition {
    pub id: String,
    pub design_name: String,
    pub button_definitions: Vec<ButtonDefinition>,
}

#[derive(Debug, PartialEq)]
pub struct ButtonDefinition {
    pub id: String,
    pub text: String,
}
