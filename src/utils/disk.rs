//! Async filesystem primitives.
//!
//! Every disk touch in the validation pipeline goes through these wrappers,
//! keeping suspension points uniform and making the trusted-utility surface
//! explicit. Existence checks follow symlinks except [`is_link_path`], which
//! inspects the entry itself.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

/// True when the path resolves to an existing file or folder.
pub async fn is_existing_path(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

pub async fn is_file_path(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

pub async fn is_folder_path(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

/// True when the entry itself is a symbolic link, even a dangling one.
pub async fn is_link_path(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// List entry names in a folder, sorted for deterministic discovery order.
pub async fn list_paths(folder: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

pub async fn get_modification_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path).await?.modified()
}

pub async fn get_byte_count(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path).await?.len())
}

/// Load a text file, dropping trailing whitespace.
pub async fn load_raw_text(path: &Path) -> io::Result<String> {
    let text = fs::read_to_string(path).await?;
    Ok(text.trim_end().to_string())
}

/// Replace the home directory prefix with `~` before a path reaches a log
/// line or an error message.
pub fn redact_path(path: &Path) -> String {
    let text = path.display().to_string();
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home).display().to_string();
        if !home.is_empty() && text.starts_with(&home) {
            return format!("~{}", &text[home.len()..]);
        }
    }
    text
}
