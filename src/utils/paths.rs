//! Path safety checks preventing traversal outside a tool's folder.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tokio::fs;

/// Normalize a path lexically, resolving `.` and `..` components without
/// touching the filesystem. Leading `..` components that escape the root are
/// preserved so callers can detect them.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// True when a relative path name stays within its containing folder: not
/// absolute and never traversing above the folder at any point.
pub fn is_contained_path(path_name: &str) -> bool {
    let path = Path::new(path_name);
    if path.is_absolute() {
        return false;
    }
    let mut depth: i64 = 0;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::Prefix(_) | Component::RootDir => return false,
            Component::Normal(_) => depth += 1,
        }
    }
    true
}

/// True when `path` resolves to a location inside `folder`, following
/// symlinks. A symlink chain that escapes the folder fails the check; an
/// entry that cannot be resolved at all (dangling or cyclic link) fails too.
/// A path that does not exist yet is resolved through its nearest existing
/// ancestor, so declared-but-unwritten files validate.
pub async fn is_path_in_folder(path: &Path, folder: &Path) -> bool {
    let folder = match fs::canonicalize(folder).await {
        Ok(resolved) => resolved,
        Err(_) => normalize_path(folder),
    };
    match resolve_path(path).await {
        Some(resolved) => resolved.starts_with(&folder),
        None => false,
    }
}

async fn resolve_path(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = fs::canonicalize(path).await {
        return Some(resolved);
    }
    if fs::symlink_metadata(path).await.is_ok() {
        // The entry exists but cannot be resolved: dangling or cyclic link.
        return None;
    }
    let normalized = normalize_path(path);
    let mut remainder: Vec<OsString> = Vec::new();
    let mut ancestor = normalized.clone();
    while let Some(parent) = ancestor.parent().map(Path::to_path_buf) {
        remainder.push(ancestor.file_name()?.to_os_string());
        if let Ok(mut resolved) = fs::canonicalize(&parent).await {
            for part in remainder.iter().rev() {
                resolved.push(part);
            }
            return Some(resolved);
        }
        if fs::symlink_metadata(&parent).await.is_ok() {
            return None;
        }
        ancestor = parent;
    }
    Some(normalized)
}
