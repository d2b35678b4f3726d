pub mod config;
pub mod error;
pub mod lookup;
pub mod media_cache;
pub mod models;
pub mod ratings;
pub mod routes;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anki_core::DeckCollection;
use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::{ApiError, Result};
use crate::media_cache::MediaLookupCache;
use crate::ratings::RatingsStore;
use crate::state::{discover_packages, ViewerState};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub viewer: Arc<RwLock<ViewerState>>,
    pub ratings: Arc<RatingsStore>,
    pub media_cache: Arc<MediaLookupCache>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let viewer = ViewerState::new(&config.media_dir, &config.media_url_path);
        let ratings = RatingsStore::new(config.data_dir.as_deref());
        let media_cache = MediaLookupCache::new(config.media_lookup_ttl);
        Self {
            viewer: Arc::new(RwLock::new(viewer)),
            ratings: Arc::new(ratings),
            media_cache: Arc::new(media_cache),
            config: Arc::new(config),
        }
    }

    /// Load `package` and make it the served collection.
    ///
    /// Previously loaded packages come from the in-memory cache. Loading is
    /// filesystem-heavy, so it runs off the async runtime.
    pub async fn load_package(
        &self,
        package: PathBuf,
        clean_media: bool,
    ) -> Result<Arc<DeckCollection>> {
        let viewer = self.viewer.clone();
        let collection = tokio::task::spawn_blocking(move || {
            let mut guard = viewer.blocking_write();
            guard.load_package(&package, clean_media)
        })
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))??;
        Ok(collection)
    }
}

/// Build the full router for `state`.
pub fn build_router(state: AppState) -> Router {
    let media_route = format!("{}/{{filename}}", state.config.media_url_path);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/decks", get(routes::decks::list))
        .route("/api/decks/{deck_id}", get(routes::decks::detail))
        .route(
            "/api/decks/{deck_id}/cards/{card_id}",
            get(routes::cards::card_data),
        )
        .route(
            "/api/decks/{deck_id}/ratings",
            get(routes::ratings::get_ratings),
        )
        .route("/api/cards", get(routes::cards::list))
        .route("/api/cards/{card_id}/rating", put(routes::ratings::set_rating))
        .route("/api/packages", get(routes::packages::list))
        .route("/api/packages/switch", post(routes::packages::switch))
        .route("/api/favorites", get(routes::decks::favorites))
        .route(&media_route, get(routes::media::serve))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    std::fs::create_dir_all(&config.media_dir)?;
    tracing::info!(media_dir = %config.media_dir.display(), "media directory");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config);

    if let Some(package) = starting_package(&state) {
        if let Err(err) = state.load_package(package.clone(), true).await {
            tracing::warn!(package = %package.display(), %err, "unable to load starting deck");
        }
    } else {
        tracing::warn!("no package configured or discovered; waiting for a switch request");
    }

    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The explicitly configured package, or the first one discovered in the
/// data directory.
fn starting_package(state: &AppState) -> Option<PathBuf> {
    state.config.package_path.clone().or_else(|| {
        state
            .config
            .data_dir
            .as_deref()
            .and_then(|dir| discover_packages(dir).into_iter().next())
    })
}

async fn health_check() -> &'static str {
    "OK"
}
