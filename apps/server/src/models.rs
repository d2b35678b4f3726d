//! API payload types

use std::collections::BTreeSet;

use anki_core::{Card, CardType, ClozeDeletion, Deck};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ratings::DeckRatings;

static IMAGE_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=['"]([^'"]+)['"][^>]*>"#).unwrap());

/// One deck in the listing.
#[derive(Debug, Serialize)]
pub struct DeckSummary {
    pub deck_id: i64,
    pub name: String,
    pub card_count: usize,
}

impl DeckSummary {
    pub fn from_deck(deck: &Deck) -> Self {
        Self {
            deck_id: deck.deck_id,
            name: deck.name.clone(),
            card_count: deck.cards.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeckListResponse {
    pub decks: Vec<DeckSummary>,
    pub total_cards: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_package: Option<String>,
}

/// Full card payload, sufficient for a client to render either side
/// without re-deriving any rendering logic.
#[derive(Debug, Serialize)]
pub struct CardPayload {
    pub id: i64,
    pub deck_id: i64,
    pub deck_name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_revealed: Option<String>,
    pub extra_fields: Vec<String>,
    /// Raw pre-render text, cloze cards only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clozes: Vec<ClozeDeletion>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl CardPayload {
    pub fn from_card(card: &Card, media_url_path: &str) -> Self {
        let (text, clozes) = if card.card_type == CardType::Cloze {
            (
                Some(card.raw_question.clone().unwrap_or_default()),
                card.cloze_deletions.clone(),
            )
        } else {
            (None, Vec::new())
        };
        let images = if card.card_type == CardType::Image {
            gather_image_sources(card, media_url_path)
        } else {
            Vec::new()
        };

        Self {
            id: card.card_id,
            deck_id: card.deck_id,
            deck_name: card.deck_name.clone(),
            card_type: card.card_type,
            question: card.question.clone(),
            answer: card.answer.clone(),
            question_revealed: card.question_revealed.clone(),
            extra_fields: card.extra_fields.clone(),
            text,
            clozes,
            images,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeckDetailResponse {
    pub deck_id: i64,
    pub name: String,
    pub cards: Vec<CardPayload>,
}

/// Compact card metadata for `/api/cards`.
#[derive(Debug, Serialize)]
pub struct CardListEntry {
    pub id: i64,
    pub deck_id: i64,
    pub deck_name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
}

#[derive(Debug, Serialize)]
pub struct CardListResponse {
    pub cards: Vec<CardListEntry>,
}

#[derive(Debug, Serialize)]
pub struct PackageListResponse {
    pub packages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub success: bool,
    pub package: String,
    pub decks: usize,
    pub cards: usize,
}

#[derive(Debug, Serialize)]
pub struct RatingsResponse {
    pub ratings: DeckRatings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetRatingRequest {
    pub deck_id: i64,
    /// One of the valid labels, or empty to clear.
    #[serde(default)]
    pub rating: String,
}

#[derive(Debug, Serialize)]
pub struct SetRatingResponse {
    pub success: bool,
    pub card_id: i64,
    pub rating: String,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub cards: Vec<CardPayload>,
}

/// Unique image URLs on the card that live under the media prefix, sorted.
pub fn gather_image_sources(card: &Card, media_url_path: &str) -> Vec<String> {
    let mut sources = BTreeSet::new();
    let primary = [
        Some(card.question.as_str()),
        Some(card.answer.as_str()),
        card.question_revealed.as_deref(),
    ];
    let texts = primary
        .into_iter()
        .flatten()
        .chain(card.extra_fields.iter().map(String::as_str));

    for text in texts {
        for caps in IMAGE_SRC_RE.captures_iter(text) {
            let src = &caps[1];
            if src.starts_with(media_url_path) {
                sources.insert(src.to_string());
            }
        }
    }
    sources.into_iter().collect()
}
