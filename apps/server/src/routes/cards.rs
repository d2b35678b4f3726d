//! Card endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/cards
///
/// High-level metadata for every card in the served collection; intended
/// for automated verification and UI tests.
pub async fn list(State(state): State<AppState>) -> Result<Json<CardListResponse>> {
    let collection = state.viewer.read().await.require_collection()?;
    let cards = collection
        .decks
        .values()
        .flat_map(|deck| deck.cards.iter())
        .map(|card| CardListEntry {
            id: card.card_id,
            deck_id: card.deck_id,
            deck_name: card.deck_name.clone(),
            card_type: card.card_type,
        })
        .collect();
    Ok(Json(CardListResponse { cards }))
}

/// GET /api/decks/{deck_id}/cards/{card_id}
pub async fn card_data(
    State(state): State<AppState>,
    Path((deck_id, card_id)): Path<(i64, i64)>,
) -> Result<Json<CardPayload>> {
    let collection = state.viewer.read().await.require_collection()?;
    let card = collection
        .card(deck_id, card_id)
        .ok_or_else(|| ApiError::NotFound(format!("card {card_id} in deck {deck_id}")))?;
    Ok(Json(CardPayload::from_card(card, &state.config.media_url_path)))
}
