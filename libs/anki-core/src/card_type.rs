//! Card type detection.
//!
//! Each helper inspects textual card content only, so a [`CardText`] view
//! can be built from fields that are still being assembled.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub(crate) static CLOZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\{\{c(\d+)::(.*?)(?:::(.*?))?\}\}").unwrap());

static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap());

/// The presentation category of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Basic,
    Cloze,
    Image,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cloze => "cloze",
            Self::Image => "image",
        }
    }
}

/// A single cloze deletion extracted from card text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClozeDeletion {
    pub num: u32,
    pub content: String,
}

/// Read-only view of the text-bearing fields of a card.
///
/// Classification happens before a full card value exists, so the detection
/// functions take this view instead of the finished card.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardText<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub question_revealed: Option<&'a str>,
    pub extra_fields: &'a [String],
}

impl<'a> CardText<'a> {
    /// Fields in detection order: question, answer, revealed question, extras.
    fn iter(&self) -> impl Iterator<Item = &'a str> {
        [self.question, self.answer]
            .into_iter()
            .chain(self.question_revealed)
            .chain(self.extra_fields.iter().map(String::as_str))
            .filter(|text| !text.is_empty())
    }
}

/// Classify a card from its textual fields.
///
/// Cloze markers take precedence over embedded images, which take precedence
/// over plain text. A card containing both a cloze marker and an `<img>` tag
/// is a cloze card.
pub fn detect_card_type(card: &CardText<'_>) -> CardType {
    if is_cloze(card) {
        CardType::Cloze
    } else if is_image(card) {
        CardType::Image
    } else {
        CardType::Basic
    }
}

/// Whether any field contains a cloze deletion marker such as `{{c1::...}}`.
pub fn is_cloze(card: &CardText<'_>) -> bool {
    card.iter().any(|text| CLOZE_RE.is_match(text))
}

/// Whether any field contains an `<img>` tag with a source attribute.
pub fn is_image(card: &CardText<'_>) -> bool {
    card.iter().any(|text| IMAGE_RE.is_match(text))
}

/// Extract cloze deletions from `text` in order of appearance.
///
/// Hints are stripped from the returned content. Malformed markers simply
/// fail to match.
pub fn parse_cloze_deletions(text: &str) -> Vec<ClozeDeletion> {
    CLOZE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let num = caps.get(1)?.as_str().parse().ok()?;
            let content = caps.get(2).map_or("", |m| m.as_str()).to_string();
            Some(ClozeDeletion { num, content })
        })
        .collect()
}
