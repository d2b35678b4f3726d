//! Persistent storage for card ratings (favorites, bad, memorized).
//!
//! Ratings live in one JSON file per deck under `<data_dir>/.ratings/`,
//! mapping card ids (as strings) to a sorted list of labels. Older files
//! may hold a single label string or a label-to-bool map per card; loading
//! normalizes all of them and drops anything unrecognized.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

pub const VALID_RATINGS: [&str; 3] = ["favorite", "bad", "memorized"];

/// Normalized ratings for one deck: card id to sorted labels.
pub type DeckRatings = BTreeMap<String, Vec<String>>;

pub struct RatingsStore {
    ratings_dir: Option<PathBuf>,
}

impl RatingsStore {
    /// A store rooted in `data_dir`, or a disabled store when the server has
    /// no data directory.
    pub fn new(data_dir: Option<&Path>) -> Self {
        let ratings_dir = data_dir.map(|dir| dir.join(".ratings"));
        if let Some(dir) = &ratings_dir {
            if let Err(err) = fs::create_dir_all(dir) {
                tracing::warn!(dir = %dir.display(), %err, "could not create ratings directory");
            }
        }
        Self { ratings_dir }
    }

    pub fn is_enabled(&self) -> bool {
        self.ratings_dir.is_some()
    }

    fn file(&self, deck_id: i64) -> Option<PathBuf> {
        self.ratings_dir
            .as_ref()
            .map(|dir| dir.join(format!("deck_{deck_id}.json")))
    }

    /// Load ratings for a deck. Missing or corrupt files read as empty.
    pub fn load(&self, deck_id: i64) -> DeckRatings {
        let Some(file) = self.file(deck_id) else {
            return DeckRatings::new();
        };
        let Ok(raw) = fs::read_to_string(&file) else {
            return DeckRatings::new();
        };
        match serde_json::from_str::<serde_json::Map<String, Value>>(&raw) {
            Ok(map) => normalize_ratings_map(&map),
            Err(err) => {
                tracing::warn!(file = %file.display(), %err, "ignoring unreadable ratings file");
                DeckRatings::new()
            }
        }
    }

    /// Persist ratings for a deck in normalized form.
    pub fn save(&self, deck_id: i64, ratings: &DeckRatings) -> std::io::Result<()> {
        let Some(file) = self.file(deck_id) else {
            return Ok(());
        };
        let body = serde_json::to_string_pretty(ratings)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        fs::write(file, body)
    }

    /// Favorited card ids across every deck file in the store.
    pub fn all_favorites(&self) -> BTreeMap<i64, BTreeSet<String>> {
        let Some(dir) = &self.ratings_dir else {
            return BTreeMap::new();
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return BTreeMap::new();
        };

        let mut favorites = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(deck_id) = deck_id_from_filename(&path) else {
                continue;
            };
            let Ok(raw) = fs::read_to_string(&path) else {
                continue;
            };
            let Ok(map) = serde_json::from_str::<serde_json::Map<String, Value>>(&raw) else {
                continue;
            };
            let deck_favorites: BTreeSet<String> = normalize_ratings_map(&map)
                .into_iter()
                .filter(|(_, labels)| labels.iter().any(|label| label == "favorite"))
                .map(|(card_id, _)| card_id)
                .collect();
            if !deck_favorites.is_empty() {
                favorites.insert(deck_id, deck_favorites);
            }
        }
        favorites
    }
}

/// `deck_123.json` -> 123
fn deck_id_from_filename(path: &Path) -> Option<i64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("deck_")?
        .parse()
        .ok()
}

fn normalize_ratings_map(raw: &serde_json::Map<String, Value>) -> DeckRatings {
    let mut normalized = DeckRatings::new();
    for (card_id, value) in raw {
        let labels = normalize_rating_entry(value);
        if !labels.is_empty() {
            normalized.insert(card_id.clone(), labels.into_iter().collect());
        }
    }
    normalized
}

fn normalize_rating_entry(value: &Value) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    match value {
        Value::String(label) => {
            if VALID_RATINGS.contains(&label.as_str()) {
                labels.insert(label.clone());
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                if let Some(label) = entry.as_str() {
                    if VALID_RATINGS.contains(&label) {
                        labels.insert(label.to_string());
                    }
                }
            }
        }
        Value::Object(map) => {
            for (label, active) in map {
                if active.as_bool() == Some(true) && VALID_RATINGS.contains(&label.as_str()) {
                    labels.insert(label.clone());
                }
            }
        }
        _ => {}
    }
    labels
}
