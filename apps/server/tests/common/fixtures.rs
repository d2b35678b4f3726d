//! Fixture Anki packages for integration tests.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::params;
use zip::write::SimpleFileOptions;

pub const DIAGRAM_BYTES: &[u8] = b"not really a png";

/// A package with one deck ("Default", id 1) holding a basic card, a cloze
/// card, and an image card whose media blob is `diagram.png`.
pub fn write_sample_package(dir: &Path, name: &str) -> PathBuf {
    let notes: &[(i64, &str, &str)] = &[
        (1, "2 + 2", "4"),
        (2, "{{c1::Heart}} pumps blood", "Answer"),
        (3, r#"<img src="diagram.png">"#, "a diagram"),
    ];
    write_package(dir, name, notes, &[("0", "diagram.png", DIAGRAM_BYTES)])
}

/// A single-card package for switch tests.
pub fn write_minimal_package(dir: &Path, name: &str, front: &str, back: &str) -> PathBuf {
    write_package(dir, name, &[(1, front, back)], &[])
}

fn write_package(
    dir: &Path,
    name: &str,
    notes: &[(i64, &str, &str)],
    media: &[(&str, &str, &[u8])],
) -> PathBuf {
    let db_path = dir.join(format!("{name}.sqlite"));
    write_collection_db(&db_path, notes);

    let package_path = dir.join(name);
    let mut archive = zip::ZipWriter::new(File::create(&package_path).unwrap());
    let options = SimpleFileOptions::default();

    archive.start_file("collection.anki21", options).unwrap();
    archive
        .write_all(&std::fs::read(&db_path).unwrap())
        .unwrap();

    let manifest: serde_json::Map<String, serde_json::Value> = media
        .iter()
        .map(|(key, filename, _)| {
            (
                key.to_string(),
                serde_json::Value::String(filename.to_string()),
            )
        })
        .collect();
    archive.start_file("media", options).unwrap();
    archive
        .write_all(serde_json::to_string(&manifest).unwrap().as_bytes())
        .unwrap();
    for (key, _, bytes) in media {
        archive.start_file(*key, options).unwrap();
        archive.write_all(bytes).unwrap();
    }

    archive.finish().unwrap();
    std::fs::remove_file(db_path).unwrap();
    package_path
}

fn write_collection_db(path: &Path, notes: &[(i64, &str, &str)]) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE col (decks TEXT, models TEXT);
         CREATE TABLE notes (id INTEGER PRIMARY KEY, mid INTEGER, flds TEXT);
         CREATE TABLE cards (id INTEGER PRIMARY KEY, nid INTEGER, did INTEGER, ord INTEGER, due INTEGER);",
    )
    .unwrap();

    let decks = serde_json::json!({"1": {"id": 1, "name": "Default"}}).to_string();
    let models = serde_json::json!({
        "1": {
            "id": 1,
            "name": "Basic",
            "flds": [{"name": "Front"}, {"name": "Back"}],
            "tmpls": [{
                "name": "Card 1",
                "qfmt": "{{Front}}",
                "afmt": "{{FrontSide}}\n\n<hr id=answer>\n\n{{Back}}"
            }]
        }
    })
    .to_string();
    conn.execute(
        "INSERT INTO col (decks, models) VALUES (?1, ?2)",
        params![decks, models],
    )
    .unwrap();

    for (index, (id, front, back)) in notes.iter().enumerate() {
        conn.execute(
            "INSERT INTO notes (id, mid, flds) VALUES (?1, 1, ?2)",
            params![id, format!("{front}\u{1f}{back}")],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO cards (id, nid, did, ord, due) VALUES (?1, ?1, 1, 0, ?2)",
            params![id, index as i64],
        )
        .unwrap();
    }
}
