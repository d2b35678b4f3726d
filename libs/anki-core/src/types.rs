//! Data model for ingested Anki collections.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::card_type::{CardText, CardType, ClozeDeletion};
use crate::media::MediaStore;

/// A single rendered flashcard.
///
/// Built once during ingestion and never mutated afterwards. `question` and
/// `answer` hold final presentation HTML; cloze cards additionally carry the
/// pre-render text, the revealed question, and the extracted deletions.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub card_id: i64,
    pub note_id: i64,
    pub deck_id: i64,
    pub deck_name: String,
    pub template_ordinal: usize,
    pub question: String,
    pub answer: String,
    pub card_type: CardType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_revealed: Option<String>,
    pub extra_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_question: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cloze_deletions: Vec<ClozeDeletion>,
}

impl Card {
    /// Structural view of the card's text fields for classification.
    pub fn text(&self) -> CardText<'_> {
        CardText {
            question: &self.question,
            answer: &self.answer,
            question_revealed: self.question_revealed.as_deref(),
            extra_fields: &self.extra_fields,
        }
    }
}

/// Cards that belong to the same deck, sorted by (template ordinal, card id).
#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    pub deck_id: i64,
    pub name: String,
    pub cards: Vec<Card>,
}

/// Everything produced by one ingestion pass.
///
/// Replaced wholesale on reload; holders of an `Arc<DeckCollection>` are
/// unaffected by a concurrent swap.
#[derive(Debug, Clone)]
pub struct DeckCollection {
    pub decks: BTreeMap<i64, Deck>,
    media: MediaStore,
}

impl DeckCollection {
    pub fn new(decks: BTreeMap<i64, Deck>, media: MediaStore) -> Self {
        Self { decks, media }
    }

    pub fn total_cards(&self) -> usize {
        self.decks.values().map(|deck| deck.cards.len()).sum()
    }

    pub fn deck(&self, deck_id: i64) -> Option<&Deck> {
        self.decks.get(&deck_id)
    }

    pub fn card(&self, deck_id: i64, card_id: i64) -> Option<&Card> {
        self.deck(deck_id)?
            .cards
            .iter()
            .find(|card| card.card_id == card_id)
    }

    /// The resolved media for this collection (alias map + directory).
    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Served URL for a media filename, when it resolves.
    pub fn media_url_for(&self, filename: &str) -> Option<String> {
        self.media.url_for(filename)
    }
}
