//! TTL caches for media-directory lookups.
//!
//! Serving many images for a deck would otherwise re-scan the media
//! directory on every request. These caches are serving-layer conveniences
//! only; the collection's alias map remains the source of truth. Entries
//! expire after the configured TTL and are dropped early when the
//! directory's mtime changes, so files created between requests show up
//! immediately.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// How a served filename was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupReason {
    Exact,
    MapExact,
    MapCaseInsensitive,
    FsCaseInsensitive,
}

impl LookupReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::MapExact => "map-exact",
            Self::MapCaseInsensitive => "map-ci",
            Self::FsCaseInsensitive => "fs-ci",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Exact)
    }
}

/// A resolved lookup: the stored filename and how it matched, or `None`
/// for a (possibly ambiguous) miss. Misses are cached too.
pub type LookupResult = Option<(String, LookupReason)>;

struct NamesEntry {
    read_at: Instant,
    dir_mtime: Option<SystemTime>,
    names: Arc<HashSet<String>>,
}

struct LookupEntry {
    read_at: Instant,
    dir_mtime: Option<SystemTime>,
    result: LookupResult,
}

/// Shared cache of directory listings and per-filename lookup results.
pub struct MediaLookupCache {
    ttl: Duration,
    names: Mutex<HashMap<PathBuf, NamesEntry>>,
    lookups: Mutex<HashMap<(PathBuf, String), LookupEntry>>,
}

impl MediaLookupCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            names: Mutex::new(HashMap::new()),
            lookups: Mutex::new(HashMap::new()),
        }
    }

    /// The set of plain files in `dir`, read through the cache.
    pub fn directory_names(&self, dir: &Path) -> Arc<HashSet<String>> {
        let key = dir.to_path_buf();
        let current_mtime = dir_mtime(dir);

        if let Ok(cache) = self.names.lock() {
            if let Some(entry) = cache.get(&key) {
                if self.is_fresh(entry.read_at, entry.dir_mtime, current_mtime) {
                    return entry.names.clone();
                }
            }
        }

        let names = Arc::new(list_files(dir));
        if let Ok(mut cache) = self.names.lock() {
            cache.insert(
                key,
                NamesEntry {
                    read_at: Instant::now(),
                    dir_mtime: current_mtime,
                    names: names.clone(),
                },
            );
        }
        names
    }

    /// A previously cached lookup for `(dir, filename)`, if still fresh.
    pub fn cached_lookup(&self, dir: &Path, filename: &str) -> Option<LookupResult> {
        let key = (dir.to_path_buf(), filename.to_string());
        let current_mtime = dir_mtime(dir);

        let cache = self.lookups.lock().ok()?;
        let entry = cache.get(&key)?;
        if self.is_fresh(entry.read_at, entry.dir_mtime, current_mtime) {
            Some(entry.result.clone())
        } else {
            None
        }
    }

    pub fn store_lookup(&self, dir: &Path, filename: &str, result: LookupResult) {
        if let Ok(mut cache) = self.lookups.lock() {
            cache.insert(
                (dir.to_path_buf(), filename.to_string()),
                LookupEntry {
                    read_at: Instant::now(),
                    dir_mtime: dir_mtime(dir),
                    result,
                },
            );
        }
    }

    /// Fresh = within TTL and, when both mtimes are known, unchanged on
    /// disk. Unknown mtimes fall back to the TTL alone.
    fn is_fresh(
        &self,
        read_at: Instant,
        stored_mtime: Option<SystemTime>,
        current_mtime: Option<SystemTime>,
    ) -> bool {
        if read_at.elapsed() >= self.ttl {
            return false;
        }
        match (stored_mtime, current_mtime) {
            (Some(stored), Some(current)) => stored == current,
            _ => true,
        }
    }
}

fn dir_mtime(dir: &Path) -> Option<SystemTime> {
    std::fs::metadata(dir).and_then(|meta| meta.modified()).ok()
}

fn list_files(dir: &Path) -> HashSet<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return HashSet::new();
    };
    entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}
