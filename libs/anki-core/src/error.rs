//! Error types for anki-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using LoadError.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while ingesting an Anki package.
///
/// Ingestion is all-or-nothing: any of these aborts the pass and no partial
/// collection is returned. Recoverable anomalies (a manifest entry without a
/// blob, a media file that fails to copy, an unresolved image reference) are
/// skipped inside the pass and never surface here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("package not found: {}", .0.display())]
    PackageNotFound(PathBuf),

    #[error("failed to unpack package: {0}")]
    Unpack(String),

    #[error("collection database not found in package")]
    CollectionFileMissing,

    #[error("the collection database is missing metadata")]
    MissingMetadata,

    #[error("could not parse {table} metadata")]
    MetadataUnreadable {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read collection database: {0}")]
    Database(#[from] rusqlite::Error),
}
