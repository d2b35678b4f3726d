//! Server configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anki_core::normalize_url_path;

/// Runtime configuration for the viewer server.
///
/// Everything comes from environment variables with sensible defaults;
/// `dotenvy` is consulted by `run()` before this is built.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `.apkg` packages, extracted media, and ratings.
    pub data_dir: Option<PathBuf>,
    /// Explicit starting package; overrides discovery in `data_dir`.
    pub package_path: Option<PathBuf>,
    pub media_dir: PathBuf,
    pub media_url_path: String,
    pub media_lookup_ttl: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("ANKI_DATA_DIR").ok().map(PathBuf::from);
        let package_path = std::env::var("ANKI_PACKAGE").ok().map(PathBuf::from);

        let media_dir = match &data_dir {
            Some(dir) => dir.join("media"),
            None => std::env::temp_dir().join("anki_viewer_media"),
        };

        let media_url_path =
            normalize_url_path(std::env::var("ANKI_MEDIA_URL_PATH").ok().as_deref());

        let media_lookup_ttl = std::env::var("ANKI_MEDIA_LOOKUP_TTL")
            .ok()
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::from_secs(5));

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(3000),
            data_dir,
            package_path,
            media_dir,
            media_url_path,
            media_lookup_ttl,
        }
    }
}
