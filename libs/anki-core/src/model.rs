//! Note model metadata parsed from the collection's `col` row.
//!
//! The `decks` and `models` columns hold JSON objects keyed by stringified
//! ids. Real-world exports carry a lot of fields we do not care about, so
//! parsing probes `serde_json::Value` tolerantly instead of deserializing a
//! rigid schema.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{LoadError, Result};

/// One rendering template of a note model.
#[derive(Debug, Clone)]
pub struct NoteModelTemplate {
    pub name: String,
    pub question_format: String,
    pub answer_format: String,
}

/// A note model: ordered field names plus one or more templates.
#[derive(Debug, Clone)]
pub struct NoteModel {
    pub id: i64,
    pub name: String,
    pub field_names: Vec<String>,
    pub templates: Vec<NoteModelTemplate>,
}

impl NoteModel {
    /// Resolve a stored template ordinal, wrapping out-of-range values
    /// modulo the template count instead of indexing out of bounds.
    pub fn resolve_ordinal(&self, ordinal: i64) -> usize {
        if self.templates.is_empty() {
            return 0;
        }
        ordinal.rem_euclid(self.templates.len() as i64) as usize
    }

    pub fn template_for(&self, ordinal: i64) -> Option<&NoteModelTemplate> {
        self.templates.get(self.resolve_ordinal(ordinal))
    }
}

/// Parse the `col.decks` JSON into an id to display-name map.
pub fn parse_deck_names(json: &str) -> Result<HashMap<i64, String>> {
    let value: Value = json_table(json, "deck")?;
    let mut decks = HashMap::new();
    if let Some(map) = value.as_object() {
        for (key, deck) in map {
            let Some(id) = entry_id(key, deck) else {
                continue;
            };
            let name = deck
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string());
            decks.insert(id, name);
        }
    }
    Ok(decks)
}

/// Parse the `col.models` JSON into a model lookup table.
pub fn parse_models(json: &str) -> Result<HashMap<i64, NoteModel>> {
    let value: Value = json_table(json, "model")?;
    let mut models = HashMap::new();
    if let Some(map) = value.as_object() {
        for (key, model) in map {
            let Some(id) = entry_id(key, model) else {
                continue;
            };
            let name = model
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Model")
                .to_string();
            models.insert(
                id,
                NoteModel {
                    id,
                    name,
                    field_names: parse_field_names(model),
                    templates: parse_templates(model),
                },
            );
        }
    }
    Ok(models)
}

fn json_table(json: &str, table: &'static str) -> Result<Value> {
    serde_json::from_str(json).map_err(|source| LoadError::MetadataUnreadable { table, source })
}

/// Ids live both in the object key and in the entry's `id` field; prefer
/// the key, which is always present.
fn entry_id(key: &str, entry: &Value) -> Option<i64> {
    key.parse::<i64>()
        .ok()
        .or_else(|| entry.get("id").and_then(Value::as_i64))
}

fn parse_field_names(model: &Value) -> Vec<String> {
    model
        .get("flds")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|field| field.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_templates(model: &Value) -> Vec<NoteModelTemplate> {
    model
        .get("tmpls")
        .and_then(Value::as_array)
        .map(|templates| {
            templates
                .iter()
                .map(|tmpl| NoteModelTemplate {
                    name: tmpl
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("Card")
                        .to_string(),
                    question_format: tmpl
                        .get("qfmt")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    answer_format: tmpl
                        .get("afmt")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
