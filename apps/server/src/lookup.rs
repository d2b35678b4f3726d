//! Layered media filename resolution for the serving layer.
//!
//! Lookup order, safe and deterministic:
//! 1. Exact key in the collection's alias map
//! 2. Case-insensitive alias-map match (single distinct target only)
//! 3. Case-insensitive filename match on disk (single match only)
//!
//! Two or more case-insensitive candidates is a hard miss; the resolver
//! never guesses between them.

use std::path::Path;

use anki_core::DeckCollection;

use crate::media_cache::{LookupReason, LookupResult, MediaLookupCache};

/// Resolve `filename` to a stored media filename, consulting the cache
/// first. Misses (including ambiguous ones) are cached as misses.
pub fn find_media_file(
    media_dir: &Path,
    filename: &str,
    collection: Option<&DeckCollection>,
    cache: &MediaLookupCache,
) -> LookupResult {
    // Fuzzy matching never applies to paths with directory components.
    if filename.contains('/') || filename.contains('\\') {
        return None;
    }

    if let Some(cached) = cache.cached_lookup(media_dir, filename) {
        return cached;
    }

    let result = resolve(media_dir, filename, collection, cache);
    cache.store_lookup(media_dir, filename, result.clone());
    result
}

fn resolve(
    media_dir: &Path,
    filename: &str,
    collection: Option<&DeckCollection>,
    cache: &MediaLookupCache,
) -> LookupResult {
    if let Some(media) = collection.map(|c| c.media()).filter(|m| !m.is_empty()) {
        let aliases = media.aliases();
        if let Some(stored) = aliases.get(filename) {
            return Some((stored.clone(), LookupReason::MapExact));
        }

        let filename_lower = filename.to_lowercase();
        let mut targets: Vec<&String> = aliases
            .iter()
            .filter(|(alias, _)| alias.to_lowercase() == filename_lower)
            .map(|(_, stored)| stored)
            .collect();
        targets.sort();
        targets.dedup();
        match targets.as_slice() {
            [stored] => return Some(((*stored).clone(), LookupReason::MapCaseInsensitive)),
            // Several distinct files match case-insensitively; don't guess.
            [_, _, ..] => return None,
            [] => {}
        }
    }

    let names = cache.directory_names(media_dir);
    let filename_lower = filename.to_lowercase();
    let mut matches: Vec<&String> = names
        .iter()
        .filter(|name| name.to_lowercase() == filename_lower)
        .collect();
    matches.sort();

    match matches.as_slice() {
        [stored] => {
            let reason = if stored.as_str() == filename {
                LookupReason::Exact
            } else {
                LookupReason::FsCaseInsensitive
            };
            Some(((*stored).clone(), reason))
        }
        // Ambiguous on disk; never guess.
        _ => None,
    }
}
