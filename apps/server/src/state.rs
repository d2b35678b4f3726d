//! Viewer state: the currently served collection and the package cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anki_core::{load_collection, DeckCollection, LoadError};

use crate::error::{ApiError, Result};

/// Mutable state behind the server's lock.
///
/// The served collection is an `Arc` that is swapped wholesale on a deck
/// switch; request handlers clone it out and keep working on their snapshot
/// regardless of concurrent switches.
pub struct ViewerState {
    media_dir: PathBuf,
    media_url_path: String,
    current: Option<(PathBuf, Arc<DeckCollection>)>,
    cache: HashMap<PathBuf, Arc<DeckCollection>>,
}

impl ViewerState {
    pub fn new(media_dir: &Path, media_url_path: &str) -> Self {
        Self {
            media_dir: media_dir.to_path_buf(),
            media_url_path: media_url_path.to_string(),
            current: None,
            cache: HashMap::new(),
        }
    }

    /// The currently served collection, if any package loaded successfully.
    pub fn collection(&self) -> Option<Arc<DeckCollection>> {
        self.current.as_ref().map(|(_, collection)| collection.clone())
    }

    /// The collection, or the API error every content route maps to when no
    /// package is loaded.
    pub fn require_collection(&self) -> Result<Arc<DeckCollection>> {
        self.collection()
            .ok_or_else(|| ApiError::NoCollection("no package is currently loaded".to_string()))
    }

    pub fn current_package(&self) -> Option<&Path> {
        self.current.as_ref().map(|(path, _)| path.as_path())
    }

    pub fn current_package_name(&self) -> Option<String> {
        self.current_package()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Load `package` and make it current. Previously loaded packages are
    /// served from the in-memory cache without touching the media directory.
    pub fn load_package(
        &mut self,
        package: &Path,
        clean_media: bool,
    ) -> std::result::Result<Arc<DeckCollection>, LoadError> {
        let key = cache_key(package);
        if let Some(collection) = self.cache.get(&key) {
            let collection = collection.clone();
            tracing::info!(package = %package.display(), "loaded deck from cache");
            self.current = Some((package.to_path_buf(), collection.clone()));
            return Ok(collection);
        }

        if clean_media {
            clean_media_directory(&self.media_dir);
        }

        let collection = Arc::new(load_collection(
            package,
            &self.media_dir,
            Some(&self.media_url_path),
        )?);
        tracing::info!(package = %package.display(), "loaded deck from file");

        self.cache.insert(key, collection.clone());
        self.current = Some((package.to_path_buf(), collection.clone()));
        Ok(collection)
    }
}

fn cache_key(package: &Path) -> PathBuf {
    package
        .canonicalize()
        .unwrap_or_else(|_| package.to_path_buf())
}

/// All `.apkg` files in `data_dir`, sorted by name.
pub fn discover_packages(data_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return Vec::new();
    };
    let mut packages: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "apkg"))
        .collect();
    packages.sort();
    packages
}

/// Best-effort removal of everything in the media directory before a fresh
/// extraction; failures are logged and skipped.
pub fn clean_media_directory(media_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(media_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(err) = removed {
            tracing::warn!(path = %path.display(), %err, "failed to clean media entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_finds_only_apkg_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.apkg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.apkg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let packages = discover_packages(dir.path());
        let names: Vec<_> = packages
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.apkg", "b.apkg"]);
    }

    #[test]
    fn clean_removes_files_and_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.png"), b"x").unwrap();

        clean_media_directory(dir.path());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_media_directory_is_ignored() {
        clean_media_directory(Path::new("/does/not/exist"));
    }
}
