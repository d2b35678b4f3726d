//! Ratings endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::ratings::VALID_RATINGS;
use crate::AppState;

/// GET /api/decks/{deck_id}/ratings
pub async fn get_ratings(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> Result<Json<RatingsResponse>> {
    ensure_enabled(&state)?;
    Ok(Json(RatingsResponse {
        ratings: state.ratings.load(deck_id),
    }))
}

/// PUT /api/cards/{card_id}/rating
///
/// Sets a single rating label for the card, or clears it when the label is
/// empty.
pub async fn set_rating(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
    Json(request): Json<SetRatingRequest>,
) -> Result<Json<SetRatingResponse>> {
    ensure_enabled(&state)?;

    if !request.rating.is_empty() && !VALID_RATINGS.contains(&request.rating.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "rating must be one of {VALID_RATINGS:?} or an empty string"
        )));
    }

    let mut ratings = state.ratings.load(request.deck_id);
    let key = card_id.to_string();
    if request.rating.is_empty() {
        ratings.remove(&key);
    } else {
        ratings.insert(key, vec![request.rating.clone()]);
    }
    state
        .ratings
        .save(request.deck_id, &ratings)
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(SetRatingResponse {
        success: true,
        card_id,
        rating: request.rating,
    }))
}

fn ensure_enabled(state: &AppState) -> Result<()> {
    if state.ratings.is_enabled() {
        Ok(())
    } else {
        Err(ApiError::NotConfigured(
            "ratings storage requires a data directory".to_string(),
        ))
    }
}
