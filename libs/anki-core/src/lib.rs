//! Core library for reading Anki `.apkg` packages.
//!
//! Provides:
//! - Package ingestion (zip extraction, SQLite collection reading)
//! - Rendering of the Mustache-like template subset Anki uses
//! - Cloze deletion rendering with per-card active-index masking
//! - Media extraction with alias-mapped `<img src>` rewriting
//! - Card type classification (basic, cloze, image)

pub mod card_type;
pub mod cloze;
pub mod error;
pub mod loader;
pub mod media;
pub mod model;
pub mod template;
pub mod types;

pub use card_type::{
    detect_card_type, is_cloze, is_image, parse_cloze_deletions, CardText, CardType, ClozeDeletion,
};
pub use cloze::render_cloze;
pub use error::{LoadError, Result};
pub use loader::load_collection;
pub use media::{normalize_url_path, sanitize_media_name, MediaStore, DEFAULT_MEDIA_URL_PATH};
pub use model::{NoteModel, NoteModelTemplate};
pub use template::render;
pub use types::{Card, Deck, DeckCollection};
