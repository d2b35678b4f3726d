//! Media extraction and reference rewriting.
//!
//! At ingestion time the package's media manifest is read and every
//! referenced blob is copied into the managed media directory under a
//! sanitized, collision-free name. Rendered HTML then has its `<img src>`
//! references rewritten to served URLs through the resulting alias map.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LoadError, Result};

pub const DEFAULT_MEDIA_URL_PATH: &str = "/media";

static DOUBLE_QUOTED_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(<img[^>]*\bsrc\s*=\s*)"([^"]*)""#).unwrap());
static SINGLE_QUOTED_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(<img[^>]*\bsrc\s*=\s*)'([^']*)'"#).unwrap());
static UNQUOTED_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(<img[^>]*\bsrc\s*=\s*)([^'"\s>]+)"#).unwrap());

/// Resolved media for one ingested package.
///
/// `aliases` maps every accepted spelling of a filename (original,
/// lowercased, extension-stripped stem, lowercased stem) to the sanitized
/// on-disk name. The first registration of an alias wins.
#[derive(Debug, Clone)]
pub struct MediaStore {
    media_dir: PathBuf,
    url_path: String,
    aliases: HashMap<String, String>,
}

impl MediaStore {
    pub fn empty(media_dir: &Path, url_path: &str) -> Self {
        Self {
            media_dir: media_dir.to_path_buf(),
            url_path: url_path.to_string(),
            aliases: HashMap::new(),
        }
    }

    /// Copy manifest-referenced blobs out of `extracted` into `media_dir`
    /// and build the alias map.
    ///
    /// A missing manifest yields an empty store. Manifest entries whose blob
    /// is absent are skipped, as are blobs that fail to copy.
    pub fn ingest(extracted: &Path, media_dir: &Path, url_path: &str) -> Result<Self> {
        let manifest_path = extracted.join("media");
        if !manifest_path.exists() {
            return Ok(Self::empty(media_dir, url_path));
        }

        let raw = fs::read_to_string(&manifest_path)
            .map_err(|err| LoadError::Unpack(err.to_string()))?;
        // serde_json's map keeps entries in a deterministic order, which
        // keeps alias collisions deterministic across re-ingestions.
        let manifest: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|source| LoadError::MetadataUnreadable {
                table: "media",
                source,
            })?;

        fs::create_dir_all(media_dir).map_err(|err| LoadError::Unpack(err.to_string()))?;

        let mut store = Self::empty(media_dir, url_path);
        let mut copied = 0usize;
        for (key, value) in &manifest {
            let Some(filename) = value.as_str().filter(|name| !name.is_empty()) else {
                continue;
            };
            let blob = extracted.join(key);
            if !blob.is_file() {
                tracing::debug!(filename, "manifest entry has no blob, skipping");
                continue;
            }
            let stored = dedup_destination(media_dir, &sanitize_media_name(filename));
            if let Err(err) = fs::copy(&blob, media_dir.join(&stored)) {
                tracing::warn!(filename, %err, "failed to copy media file, skipping");
                continue;
            }
            store.register(filename, &stored);
            copied += 1;
        }

        tracing::info!(files = copied, "media ingested");
        Ok(store)
    }

    /// Register `stored` under every alias spelling of `original`.
    pub fn register(&mut self, original: &str, stored: &str) {
        for alias in [
            original.to_string(),
            original.to_lowercase(),
            stem(original).to_string(),
            stem(original).to_lowercase(),
        ] {
            self.aliases
                .entry(alias)
                .or_insert_with(|| stored.to_string());
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    /// The full alias map, including lowercase and stem spellings.
    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Resolve a reference to a stored filename: exact match, then
    /// case-insensitive, then extension-stripped stem.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        let decoded = percent_decode(reference);
        let name = filename_of(&decoded);
        self.aliases
            .get(name)
            .or_else(|| self.aliases.get(&name.to_lowercase()))
            .or_else(|| self.aliases.get(stem(name)))
            .or_else(|| self.aliases.get(&stem(name).to_lowercase()))
            .map(String::as_str)
    }

    /// The served URL for a reference, when it resolves.
    pub fn url_for(&self, reference: &str) -> Option<String> {
        self.resolve(reference)
            .map(|stored| format!("{}/{}", self.url_path, stored))
    }

    /// Rewrite `<img src>` references (quoted and unquoted) to served URLs.
    /// Unresolved references are left untouched.
    pub fn rewrite_html(&self, html: &str) -> String {
        if html.is_empty() || self.aliases.is_empty() {
            return html.to_string();
        }

        let pass = DOUBLE_QUOTED_SRC_RE.replace_all(html, |caps: &regex::Captures<'_>| {
            match self.url_for(&caps[2]) {
                Some(url) => format!(r#"{}"{}""#, &caps[1], url),
                None => caps[0].to_string(),
            }
        });
        let pass = SINGLE_QUOTED_SRC_RE.replace_all(&pass, |caps: &regex::Captures<'_>| {
            match self.url_for(&caps[2]) {
                Some(url) => format!("{}'{}'", &caps[1], url),
                None => caps[0].to_string(),
            }
        });
        UNQUOTED_SRC_RE
            .replace_all(&pass, |caps: &regex::Captures<'_>| {
                match self.url_for(&caps[2]) {
                    Some(url) => format!("{}{}", &caps[1], url),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Canonicalize a media URL prefix: always a leading `/`, never a trailing
/// one, defaulting to `/media`.
pub fn normalize_url_path(value: Option<&str>) -> String {
    let cleaned = value.map(str::trim).unwrap_or("").trim_end_matches('/');
    if cleaned.is_empty() {
        return DEFAULT_MEDIA_URL_PATH.to_string();
    }
    if cleaned.starts_with('/') {
        cleaned.to_string()
    } else {
        format!("/{cleaned}")
    }
}

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`.
pub fn sanitize_media_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "media".to_string()
    } else {
        cleaned
    }
}

/// Pick a destination name that does not collide with an existing file,
/// suffixing `_<n>` before the extension.
fn dedup_destination(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }
    let (base, ext) = match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base, Some(ext)),
        _ => (name, None),
    };
    let mut counter = 1u32;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{base}_{counter}.{ext}"),
            None => format!("{base}_{counter}"),
        };
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Basename regardless of separator style.
fn filename_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit('\\').next().unwrap_or(name)
}

fn stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => name,
    }
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(byte) = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
