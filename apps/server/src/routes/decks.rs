//! Deck endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::state::discover_packages;
use crate::AppState;

/// GET /api/decks
pub async fn list(State(state): State<AppState>) -> Result<Json<DeckListResponse>> {
    let viewer = state.viewer.read().await;
    let collection = viewer.require_collection()?;
    let decks = collection
        .decks
        .values()
        .map(DeckSummary::from_deck)
        .collect();
    Ok(Json(DeckListResponse {
        decks,
        total_cards: collection.total_cards(),
        current_package: viewer.current_package_name(),
    }))
}

/// GET /api/decks/{deck_id}
pub async fn detail(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> Result<Json<DeckDetailResponse>> {
    let collection = state.viewer.read().await.require_collection()?;
    let deck = collection
        .deck(deck_id)
        .ok_or_else(|| ApiError::NotFound(format!("deck {deck_id}")))?;
    Ok(Json(DeckDetailResponse {
        deck_id: deck.deck_id,
        name: deck.name.clone(),
        cards: deck
            .cards
            .iter()
            .map(|card| CardPayload::from_card(card, &state.config.media_url_path))
            .collect(),
    }))
}

/// GET /api/favorites
///
/// Aggregates favorite cards across every package in the data directory.
/// Packages that fail to load are skipped.
pub async fn favorites(State(state): State<AppState>) -> Result<Json<FavoritesResponse>> {
    let data_dir = state.config.data_dir.clone().ok_or_else(|| {
        ApiError::NotConfigured("favorites require a data directory".to_string())
    })?;

    let favorites_map = state.ratings.all_favorites();
    if favorites_map.is_empty() {
        return Ok(Json(FavoritesResponse { cards: Vec::new() }));
    }

    let mut cards = Vec::new();
    for package in discover_packages(&data_dir) {
        let collection = match state.load_package(package.clone(), false).await {
            Ok(collection) => collection,
            Err(err) => {
                tracing::warn!(package = %package.display(), %err, "skipping package while collecting favorites");
                continue;
            }
        };
        for (deck_id, deck) in &collection.decks {
            let Some(favorite_ids) = favorites_map.get(deck_id) else {
                continue;
            };
            cards.extend(
                deck.cards
                    .iter()
                    .filter(|card| favorite_ids.contains(card.card_id.to_string().as_str()))
                    .map(|card| CardPayload::from_card(card, &state.config.media_url_path)),
            );
        }
    }

    Ok(Json(FavoritesResponse { cards }))
}
