//! Error handling for the configuration loader.
//!
//! Three error taxa cover every failure mode of a configuration load:
//!
//! - [`FormatError`] — "this input is not a shape I understand" (wrong file
//!   suffix, wrong top-level document type). Folder discovery recovers from
//!   it by trying the next candidate file; nested tool composition converts
//!   it to a fatal [`ConfigurationError`].
//! - [`ConfigurationError`] — a structural or semantic violation of the
//!   schema (missing required field, non-unique identifier, path escaping
//!   the tool folder, unsupported protocol version). Always fatal to the
//!   current load.
//! - [`DataError`] — one variable's concrete value failed to load or parse
//!   (bad JSON, missing dictionary entry, non-numeric input for a numeric
//!   view). Soft-failed (logged and omitted) when loading default reference
//!   data; fatal when parsing a preset's declared value.
//!
//! Errors carry structured context fields ([`ErrorContext`]) — `path`,
//! `variable_id`, `uri`, and a machine-readable `code` — attached by the
//! `with_*` wrapping methods as the error crosses module boundaries. The
//! `path` field is set once and never overwritten, so the deepest known
//! location wins.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::utils::disk::redact_path;

/// Machine-readable codes for callers that branch without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No configuration file was found in the given folder.
    ConfigurationNotFound,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationNotFound => write!(f, "configuration-not-found"),
        }
    }
}

/// Structured fields attached to an error as it crosses boundaries.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub path: Option<PathBuf>,
    pub variable_id: Option<String>,
    pub uri: Option<String>,
    pub code: Option<ErrorCode>,
}

impl ErrorContext {
    fn write_suffix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(variable_id) = &self.variable_id {
            write!(f, "; variable_id=\"{variable_id}\"")?;
        }
        if let Some(path) = &self.path {
            write!(f, "; path=\"{}\"", redact_path(path))?;
        }
        if let Some(uri) = &self.uri {
            write!(f, "; uri=\"{uri}\"")?;
        }
        if let Some(code) = &self.code {
            write!(f, "; code={code}")?;
        }
        Ok(())
    }
}

/// The input is not a configuration shape this crate understands.
#[derive(Debug, Clone)]
pub struct FormatError {
    message: String,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Nested tool composition never skips a malformed document; the format
    /// problem becomes a fatal configuration problem there.
    #[must_use]
    pub fn into_configuration(self) -> ConfigurationError {
        ConfigurationError::new(self.message)
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FormatError {}

/// A structural or semantic violation of the configuration schema.
#[derive(Debug, Clone)]
pub struct ConfigurationError {
    message: String,
    context: ErrorContext,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: ErrorContext::default() }
    }

    /// Attach the source path, keeping an already-attached (deeper) one.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.path.get_or_insert_with(|| path.into());
        self
    }

    #[must_use]
    pub fn with_variable_id(mut self, variable_id: impl Into<String>) -> Self {
        self.context.variable_id.get_or_insert_with(|| variable_id.into());
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.context.uri.get_or_insert_with(|| uri.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.context.code.get_or_insert(code);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.context.path.as_deref()
    }

    pub fn variable_id(&self) -> Option<&str> {
        self.context.variable_id.as_deref()
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.context.code
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        self.context.write_suffix(f)
    }
}

impl std::error::Error for ConfigurationError {}

/// One variable's concrete value failed to load or parse.
#[derive(Debug, Clone)]
pub struct DataError {
    message: String,
    context: ErrorContext,
}

impl DataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: ErrorContext::default() }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.path.get_or_insert_with(|| path.into());
        self
    }

    #[must_use]
    pub fn with_variable_id(mut self, variable_id: impl Into<String>) -> Self {
        self.context.variable_id.get_or_insert_with(|| variable_id.into());
        self
    }

    pub fn variable_id(&self) -> Option<&str> {
        self.context.variable_id.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.context.path.as_deref()
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        self.context.write_suffix(f)
    }
}

impl std::error::Error for DataError {}

/// Any failure of a configuration load, as returned to callers.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Data(#[from] DataError),
}

impl LoadError {
    /// Attach the source path to variants that carry context; the first
    /// attached path wins, so deeper annotations survive propagation.
    #[must_use]
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Format(e) => Self::Format(e),
            Self::Configuration(e) => Self::Configuration(e.with_path(path)),
            Self::Data(e) => Self::Data(e.with_path(path)),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Configuration(e) => e.code(),
            _ => None,
        }
    }
}
