//! Crate-wide constants for configuration discovery, validation limits, and
//! runtime defaults.

/// Canonical configuration filename, tried first when loading from a folder.
pub const CONFIGURATION_NAME: &str = "automate.yaml";

/// Protocol version implemented by this crate. A configuration document must
/// declare an equivalent version (compared at three components) to load.
pub const PROTOCOL_VERSION: &str = "0.9.5";

/// Default tool name; `X` is replaced by the tool's locus.
pub const TOOL_NAME: &str = "Tool X";

/// Default kit name; `X` is replaced by the kit's locus.
pub const KIT_NAME: &str = "Kit X";

/// Default tool version when a document omits `version`.
pub const TOOL_VERSION: &str = "0.0.0";

/// Variable ids are restricted to this pattern.
pub const VARIABLE_ID_PATTERN: &str = r"^[a-zA-Z0-9_]+$";

/// Token pattern for `{variable_id | filter}` template substitution.
pub const VARIABLE_ID_TEMPLATE_PATTERN: &str = r"\{ *([a-zA-Z0-9_| ]+?) *\}";

/// Variable ids that may not be declared in any step.
pub const RESERVED_VARIABLE_IDS: &[&str] = &["return_code"];

/// Variables whose path equals this sentinel are sourced from the process
/// environment and skipped by the disk loader.
pub const ENVIRONMENT_PATH: &str = "ENVIRONMENT";

/// Files at or above this size are represented by path only, never loaded
/// into memory as values.
pub const RAW_DATA_BYTE_COUNT: u64 = 1024;

/// Maximum entry count of the raw data cache.
pub const RAW_DATA_CACHE_LENGTH: usize = 256;

/// Default language for `function` scripts.
pub const SCRIPT_LANGUAGE: &str = "python";

/// Default container engine.
pub const ENGINE_NAME: &str = "podman";

/// Default parent image.
pub const IMAGE_NAME: &str = "python";

/// Views that may print documents from a `print` step.
pub const PRINTER_NAMES: &[&str] = &["pdf"];

pub const SUPPORT_EMAIL: &str = "support@crosscompute.com";

pub const COPYRIGHT_URI_AND_IMAGE_TEXT: &str =
    r#"[<img src="{image_uri}" alt="{name}" loading="lazy">]({owner_uri}) © {year}"#;
pub const COPYRIGHT_URI_TEXT: &str = "[{name}]({owner_uri}) © {year}";
pub const COPYRIGHT_TEXT: &str = "{name} © {year}";
