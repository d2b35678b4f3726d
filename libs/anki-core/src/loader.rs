//! Loading flashcard content from Anki `.apkg` packages.
//!
//! An `.apkg` is a zip archive holding a SQLite collection database, an
//! optional JSON media manifest, and media blobs named by manifest key. The
//! loader unpacks the archive into an ephemeral workspace, reads the
//! metadata and the cards/notes join, renders every card, and returns the
//! assembled [`DeckCollection`]. Ingestion is all-or-nothing; the workspace
//! never outlives the call.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use rusqlite::Connection;
use zip::ZipArchive;

use crate::card_type::{self, CardText, CLOZE_RE};
use crate::cloze;
use crate::error::{LoadError, Result};
use crate::media::{self, MediaStore};
use crate::model::{self, NoteModel};
use crate::template;
use crate::types::{Card, Deck, DeckCollection};

/// Notes store their field values joined by the ASCII Unit Separator.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Known collection database names, newest format first.
const COLLECTION_DB_NAMES: [&str; 2] = ["collection.anki21", "collection.anki2"];

/// Load an Anki package and return its cards grouped by deck.
///
/// Media blobs are copied into `media_dir` and `<img>` references in the
/// rendered HTML are rewritten to `media_url_path` (defaulting to `/media`).
pub fn load_collection(
    package_path: &Path,
    media_dir: &Path,
    media_url_path: Option<&str>,
) -> Result<DeckCollection> {
    if !package_path.exists() {
        return Err(LoadError::PackageNotFound(package_path.to_path_buf()));
    }
    let url_path = media::normalize_url_path(media_url_path);

    let workspace = tempfile::tempdir().map_err(|err| LoadError::Unpack(err.to_string()))?;
    extract_package(package_path, workspace.path())?;

    let collection_path = find_collection_file(workspace.path())?;
    let media_store = MediaStore::ingest(workspace.path(), media_dir, &url_path)?;

    // Copy the database out of the workspace so the extracted files can be
    // removed while the connection is still open.
    let db_copy = tempfile::NamedTempFile::new().map_err(|err| LoadError::Unpack(err.to_string()))?;
    std::fs::copy(&collection_path, db_copy.path())
        .map_err(|err| LoadError::Unpack(err.to_string()))?;

    let collection = {
        let conn = Connection::open(db_copy.path())?;
        let (deck_names, models) = read_metadata(&conn)?;
        let rows = read_card_rows(&conn)?;

        let cards: Vec<Card> = rows
            .into_iter()
            .map(|row| build_card(row, &deck_names, &models, &media_store))
            .collect();
        let decks = assemble_decks(cards, &deck_names);

        tracing::info!(
            decks = decks.len(),
            cards = decks.values().map(|d| d.cards.len()).sum::<usize>(),
            package = %package_path.display(),
            "collection loaded"
        );
        DeckCollection::new(decks, media_store)
    };

    // Extraction artifacts must never leak; cleanup failures are logged and
    // swallowed.
    if let Err(err) = db_copy.close() {
        tracing::warn!(%err, "failed to remove collection database copy");
    }
    if let Err(err) = workspace.close() {
        tracing::warn!(%err, "failed to remove extraction workspace");
    }

    Ok(collection)
}

fn extract_package(package_path: &Path, destination: &Path) -> Result<()> {
    let file = File::open(package_path).map_err(|err| LoadError::Unpack(err.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|err| LoadError::Unpack(err.to_string()))?;
    archive
        .extract(destination)
        .map_err(|err| LoadError::Unpack(err.to_string()))
}

fn find_collection_file(extracted: &Path) -> Result<std::path::PathBuf> {
    COLLECTION_DB_NAMES
        .iter()
        .map(|name| extracted.join(name))
        .find(|candidate| candidate.exists())
        .ok_or(LoadError::CollectionFileMissing)
}

fn read_metadata(
    conn: &Connection,
) -> Result<(HashMap<i64, String>, HashMap<i64, NoteModel>)> {
    let row: rusqlite::Result<(String, String)> =
        conn.query_row("SELECT decks, models FROM col LIMIT 1", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        });
    let (decks_json, models_json) = match row {
        Ok(pair) => pair,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Err(LoadError::MissingMetadata),
        Err(err) => return Err(LoadError::Database(err)),
    };

    Ok((
        model::parse_deck_names(&decks_json)?,
        model::parse_models(&models_json)?,
    ))
}

struct CardRow {
    card_id: i64,
    note_id: i64,
    deck_id: i64,
    ordinal: i64,
    model_id: i64,
    fields: String,
}

/// Single join over cards and notes, ordered deterministically so that
/// re-ingesting the same package yields the same card sequence.
fn read_card_rows(conn: &Connection) -> Result<Vec<CardRow>> {
    let mut stmt = conn.prepare(
        "SELECT cards.id, cards.nid, cards.did, cards.ord, notes.mid, notes.flds
         FROM cards JOIN notes ON notes.id = cards.nid
         ORDER BY cards.did, cards.due, cards.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CardRow {
            card_id: row.get(0)?,
            note_id: row.get(1)?,
            deck_id: row.get(2)?,
            ordinal: row.get(3)?,
            model_id: row.get(4)?,
            fields: row.get(5)?,
        })
    })?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(LoadError::from)
}

fn build_card(
    row: CardRow,
    deck_names: &HashMap<i64, String>,
    models: &HashMap<i64, NoteModel>,
    media: &MediaStore,
) -> Card {
    let values: Vec<&str> = row.fields.split(FIELD_SEPARATOR).collect();
    let model = models.get(&row.model_id);
    let mut fields = build_field_map(model, &values);

    let (ordinal, question, answer) = match model.and_then(|m| m.template_for(row.ordinal)) {
        Some(tmpl) => {
            let ordinal = model.map_or(0, |m| m.resolve_ordinal(row.ordinal));
            let question = template::render(&tmpl.question_format, &fields);
            fields.insert("FrontSide".to_string(), question.clone());
            let answer = template::render(&tmpl.answer_format, &fields);
            (ordinal, question, answer)
        }
        // Notes without a known model fall back to positional fields.
        None => (
            usize::try_from(row.ordinal).unwrap_or(0),
            values.first().copied().unwrap_or_default().to_string(),
            values.get(1).copied().unwrap_or_default().to_string(),
        ),
    };

    let extra_values: Vec<String> = values.iter().skip(2).map(|v| v.to_string()).collect();

    // Classify before cloze substitution, while markers are still present.
    let preview = CardText {
        question: &question,
        answer: &answer,
        question_revealed: None,
        extra_fields: &extra_values,
    };
    let card_type = card_type::detect_card_type(&preview);

    let mut question = question;
    let mut answer = answer;
    let mut question_revealed = None;
    let mut raw_question = None;
    let mut cloze_deletions = Vec::new();

    if CLOZE_RE.is_match(&question) {
        // One card per distinct cloze index; ord 0 masks {{c1::...}}.
        let active = (ordinal as u32).saturating_add(1);
        let raw = question;
        let revealed = cloze::render_cloze(&raw, true, Some(active));
        question = cloze::render_cloze(&raw, false, Some(active));
        answer = merge_cloze_answer(&revealed, &values);
        cloze_deletions = card_type::parse_cloze_deletions(&raw);
        question_revealed = Some(revealed);
        raw_question = Some(raw);
    }

    let deck_name = deck_names
        .get(&row.deck_id)
        .cloned()
        .unwrap_or_else(|| row.deck_id.to_string());

    Card {
        card_id: row.card_id,
        note_id: row.note_id,
        deck_id: row.deck_id,
        deck_name,
        template_ordinal: ordinal,
        question: media.rewrite_html(&question),
        answer: media.rewrite_html(&answer),
        card_type,
        question_revealed: question_revealed.map(|html| media.rewrite_html(&html)),
        extra_fields: extra_values
            .iter()
            .map(|value| media.rewrite_html(value))
            .collect(),
        raw_question,
        cloze_deletions,
    }
}

/// Field map for template rendering: model-declared names plus `Field<N+1>`
/// positional aliases, which also cover values past the declared names.
fn build_field_map(model: Option<&NoteModel>, values: &[&str]) -> HashMap<String, String> {
    let names = model.map(|m| m.field_names.as_slice()).unwrap_or(&[]);
    let mut fields = HashMap::with_capacity(values.len() * 2);
    for (index, value) in values.iter().enumerate() {
        if let Some(name) = names.get(index) {
            fields.insert(name.clone(), value.to_string());
        }
        fields.insert(format!("Field{}", index + 1), value.to_string());
    }
    fields
}

/// The revealed cloze text is the answer; the raw second field is appended
/// after it when it adds anything beyond a copy of the first field.
fn merge_cloze_answer(revealed: &str, values: &[&str]) -> String {
    let leftover = values.get(1).map(|v| v.trim()).unwrap_or("");
    let question_field = values.first().map(|v| v.trim()).unwrap_or("");
    if leftover.is_empty() || leftover == question_field {
        revealed.to_string()
    } else {
        format!(r#"{revealed}<div class="cloze-extra-answer">{leftover}</div>"#)
    }
}

fn assemble_decks(cards: Vec<Card>, deck_names: &HashMap<i64, String>) -> BTreeMap<i64, Deck> {
    let mut decks: BTreeMap<i64, Deck> = BTreeMap::new();
    for card in cards {
        decks
            .entry(card.deck_id)
            .or_insert_with(|| Deck {
                deck_id: card.deck_id,
                name: deck_names
                    .get(&card.deck_id)
                    .cloned()
                    .unwrap_or_else(|| card.deck_id.to_string()),
                cards: Vec::new(),
            })
            .cards
            .push(card);
    }
    for deck in decks.values_mut() {
        deck.cards
            .sort_by_key(|card| (card.template_ordinal, card.card_id));
    }
    decks
}
