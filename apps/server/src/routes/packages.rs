//! Package discovery and switching

use std::ffi::OsStr;
use std::path::PathBuf;

use axum::{extract::State, Json};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::state::discover_packages;
use crate::AppState;

/// GET /api/packages
pub async fn list(State(state): State<AppState>) -> Result<Json<PackageListResponse>> {
    let data_dir = require_data_dir(&state)?;
    let packages = discover_packages(&data_dir)
        .iter()
        .filter_map(|path| path.file_name().and_then(OsStr::to_str))
        .map(str::to_string)
        .collect();
    let current = state.viewer.read().await.current_package_name();
    Ok(Json(PackageListResponse { packages, current }))
}

/// POST /api/packages/switch
pub async fn switch(
    State(state): State<AppState>,
    Json(request): Json<SwitchRequest>,
) -> Result<Json<SwitchResponse>> {
    let data_dir = require_data_dir(&state)?;

    if request.filename.contains('/') || request.filename.contains('\\') {
        return Err(ApiError::BadRequest(
            "filename must not contain path separators".to_string(),
        ));
    }

    let target = data_dir.join(&request.filename);
    if !target.is_file() || target.extension() != Some("apkg".as_ref()) {
        return Err(ApiError::NotFound(format!("package {}", request.filename)));
    }

    let collection = state.load_package(target, true).await?;
    Ok(Json(SwitchResponse {
        success: true,
        package: request.filename,
        decks: collection.decks.len(),
        cards: collection.total_cards(),
    }))
}

fn require_data_dir(state: &AppState) -> Result<PathBuf> {
    state.config.data_dir.clone().ok_or_else(|| {
        ApiError::NotConfigured("package switching requires a data directory".to_string())
    })
}
