//! Media file serving with layered, cached lookup.

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, Result};
use crate::lookup::find_media_file;
use crate::AppState;

static LOOKUP_TIME_HEADER: HeaderName = HeaderName::from_static("x-media-lookup-time-ms");
static FALLBACK_HEADER: HeaderName = HeaderName::from_static("x-media-fallback");

/// GET {media_url_path}/{filename}
pub async fn serve(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let started = Instant::now();

    let collection = state.viewer.read().await.collection();
    let media_dir = state.config.media_dir.clone();
    let cache = state.media_cache.clone();
    let lookup_name = filename.clone();
    let lookup = tokio::task::spawn_blocking(move || {
        find_media_file(&media_dir, &lookup_name, collection.as_deref(), &cache)
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))?;

    let Some((stored, reason)) = lookup else {
        return Err(ApiError::NotFound(format!("media file {filename}")));
    };

    let body = tokio::fs::read(state.config.media_dir.join(&stored))
        .await
        .map_err(|_| ApiError::NotFound(format!("media file {filename}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&stored)),
    );
    if let Ok(value) = HeaderValue::from_str(&started.elapsed().as_millis().to_string()) {
        headers.insert(LOOKUP_TIME_HEADER.clone(), value);
    }
    if reason.is_fallback() {
        headers.insert(
            FALLBACK_HEADER.clone(),
            HeaderValue::from_static(reason.as_str()),
        );
    }

    Ok((headers, body).into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_common_media() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("clip.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
