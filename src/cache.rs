//! Modification-aware caching of raw variable data.
//!
//! [`FileCache`] maps a resolved file path to the data parsed from it,
//! stamped with the file's modification time at load. A lookup revalidates
//! the stamp against a fresh stat: an unchanged file is served from memory,
//! a changed one misses so the caller reloads. Eviction is strict
//! least-recently-used at a fixed capacity.
//!
//! One cache lives on each [`crate::configuration::Loader`] session rather
//! than in process-global state, so concurrent loads of independent
//! configurations never share mutable LRU bookkeeping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use crate::utils::disk::get_modification_time;
use crate::variable::VariableData;

#[derive(Debug)]
struct CacheEntry {
    modified: SystemTime,
    stamp: u64,
    data: VariableData,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<PathBuf, CacheEntry>,
    clock: u64,
}

/// A bounded least-recently-used cache of raw variable data, invalidated by
/// file modification time.
#[derive(Debug)]
pub struct FileCache {
    maximum_length: usize,
    state: Mutex<CacheState>,
}

impl FileCache {
    pub fn new(maximum_length: usize) -> Self {
        assert!(maximum_length > 0);
        Self { maximum_length, state: Mutex::new(CacheState::default()) }
    }

    /// Return the cached data for a path whose modification time is
    /// unchanged since it was stored. A changed or unreadable file drops the
    /// stale entry and misses.
    pub async fn get(&self, path: &Path) -> Option<VariableData> {
        let modified = get_modification_time(path).await.ok()?;
        let mut state = self.state.lock().expect("cache lock");
        state.clock += 1;
        let stamp = state.clock;
        match state.entries.get_mut(path) {
            Some(entry) if entry.modified == modified => {
                entry.stamp = stamp;
                Some(entry.data.clone())
            }
            Some(_) => {
                state.entries.remove(path);
                None
            }
            None => None,
        }
    }

    /// Store data for a path, stamped with its current modification time.
    /// A path that cannot be statted is not cached.
    pub async fn put(&self, path: &Path, data: VariableData) {
        let Ok(modified) = get_modification_time(path).await else {
            return;
        };
        let mut state = self.state.lock().expect("cache lock");
        state.clock += 1;
        let stamp = state.clock;
        state.entries.insert(path.to_path_buf(), CacheEntry { modified, stamp, data });
        while state.entries.len() > self.maximum_length {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stamp)
                .map(|(path, _)| path.clone());
            match oldest {
                Some(path) => state.entries.remove(&path),
                None => break,
            };
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("cache lock").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
