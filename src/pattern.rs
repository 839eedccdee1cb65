//! Path-template expansion for variable paths.
//!
//! A variable's `path` may contain `{suffix}` (any trailing text) or
//! `{index}` (a run of digits) in its file name, matching a family of files
//! in one folder. Expansion compiles the file name into an anchored regular
//! expression and filters the parent directory listing.

use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::utils::disk::{is_existing_path, list_paths};

/// Expand a templated path against its parent folder's listing.
///
/// Without template tokens the path itself is returned when it exists and
/// nothing otherwise. With tokens, every entry of the parent folder whose
/// name matches the expanded expression is returned in listing order.
pub async fn get_matching_paths(path_template: &Path) -> io::Result<Vec<PathBuf>> {
    let name = match path_template.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Ok(Vec::new()),
    };
    let has_suffix = name.contains("{suffix}");
    let has_index = name.contains("{index}");
    if !has_suffix && !has_index {
        return Ok(if is_existing_path(path_template).await {
            vec![path_template.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    // Escape the literal parts of the name, then substitute the escaped
    // tokens with their character classes.
    let mut expression = regex::escape(name);
    if has_suffix {
        expression = expression.replace(r"\{suffix\}", ".*");
    }
    if has_index {
        expression = expression.replace(r"\{index\}", "[0-9]+");
    }
    let pattern = Regex::new(&format!("^{expression}$"))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let parent = path_template.parent().unwrap_or_else(|| Path::new("."));
    let names = list_paths(parent).await?;
    Ok(names
        .into_iter()
        .filter(|entry| pattern.is_match(entry))
        .map(|entry| parent.join(entry))
        .collect())
}
