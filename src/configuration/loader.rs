//! Configuration discovery and parsing.
//!
//! A [`Loader`] owns the view registry and the raw data cache for one load
//! session and drives the validation pipeline over a file or folder. Nested
//! tool composition re-enters [`Loader::load_configuration_with_locus`]
//! with an extended locus, sharing the session's cache and registry.

use std::path::Path;

use futures::future::BoxFuture;

use crate::cache::FileCache;
use crate::constants::{CONFIGURATION_NAME, PROTOCOL_VERSION, RAW_DATA_CACHE_LENGTH};
use crate::core::{ConfigurationError, ErrorCode, FormatError, LoadError};
use crate::utils::disk::{
    is_existing_path, is_file_path, is_folder_path, list_paths, redact_path,
};
use crate::variable::ViewRegistry;

use super::rules::load_tool_definition;
use super::{RawMap, ToolDefinition};

/// One load session: views, cache, and the installed protocol version.
pub struct Loader {
    views: ViewRegistry,
    cache: FileCache,
    protocol_version: String,
}

impl Loader {
    pub fn new(views: ViewRegistry) -> Self {
        Self {
            views,
            cache: FileCache::new(RAW_DATA_CACHE_LENGTH),
            protocol_version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// Register plugin views or printers before loading.
    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Load and validate the configuration at a file or folder path.
    pub async fn load_configuration(
        &self,
        path_or_folder: impl AsRef<Path>,
    ) -> Result<ToolDefinition, LoadError> {
        self.load_configuration_with_locus(path_or_folder.as_ref(), "0").await
    }

    /// Load with an explicit locus; nested tool composition extends the
    /// parent locus per entry (`0` → `0-0`, `0-1`, …).
    pub fn load_configuration_with_locus<'a>(
        &'a self,
        path_or_folder: &'a Path,
        locus: &'a str,
    ) -> BoxFuture<'a, Result<ToolDefinition, LoadError>> {
        Box::pin(async move {
            if is_file_path(path_or_folder).await {
                self.load_configuration_from_path(path_or_folder, locus).await
            } else if is_folder_path(path_or_folder).await {
                self.load_configuration_from_folder(path_or_folder, locus).await
            } else if !is_existing_path(path_or_folder).await {
                Err(ConfigurationError::new(format!(
                    "\"{}\" does not exist",
                    redact_path(path_or_folder)
                ))
                .into())
            } else {
                Err(FormatError::new(format!(
                    "\"{}\" must be a file or folder",
                    redact_path(path_or_folder)
                ))
                .into())
            }
        })
    }

    async fn load_configuration_from_path(
        &self,
        path: &Path,
        locus: &str,
    ) -> Result<ToolDefinition, LoadError> {
        let path = std::path::absolute(path)
            .map_err(|e| ConfigurationError::new(e.to_string()))?;
        tracing::debug!("\"{}\" is loading", redact_path(&path));
        let raw = load_raw_configuration(&path).await?;
        let configuration = load_tool_definition(self, raw, &path, locus)
            .await
            .map_err(|e| e.with_path(&path))?;
        tracing::debug!("\"{}\" loaded", redact_path(&path));
        Ok(configuration)
    }

    async fn load_configuration_from_folder(
        &self,
        folder: &Path,
        locus: &str,
    ) -> Result<ToolDefinition, LoadError> {
        let mut relative_paths = list_paths(folder)
            .await
            .map_err(|e| ConfigurationError::new(e.to_string()))?;
        if let Some(index) = relative_paths.iter().position(|name| name == CONFIGURATION_NAME) {
            let default_name = relative_paths.remove(index);
            relative_paths.insert(0, default_name);
        }
        for relative_path in relative_paths {
            let path = folder.join(relative_path);
            if is_folder_path(&path).await {
                continue;
            }
            match self.load_configuration_from_path(&path, locus).await {
                Ok(configuration) => return Ok(configuration),
                // Not a configuration shape; try the next candidate.
                Err(LoadError::Format(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(ConfigurationError::new("configuration was not found")
            .with_code(ErrorCode::ConfigurationNotFound)
            .into())
    }
}

/// Load and validate a configuration with the stock view registry.
pub async fn load_configuration(
    path_or_folder: impl AsRef<Path>,
) -> Result<ToolDefinition, LoadError> {
    let loader = Loader::new(ViewRegistry::with_defaults());
    loader.load_configuration(path_or_folder).await
}

async fn load_raw_configuration(path: &Path) -> Result<RawMap, LoadError> {
    let suffix = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    if !["yaml", "yml"].contains(&suffix) {
        return Err(
            FormatError::new(format!("file suffix \".{suffix}\" is not supported")).into()
        );
    }
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigurationError::new(e.to_string()).with_path(path))?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text)
        .map_err(|e| ConfigurationError::new(e.to_string()).with_path(path))?;
    match value {
        serde_yaml::Value::Null => Ok(RawMap::new()),
        serde_yaml::Value::Mapping(map) => Ok(map),
        _ => Err(FormatError::new("configuration document must be a mapping").into()),
    }
}
