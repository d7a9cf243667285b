//! Per-collection rating storage

use crate::document::{parse_document, render_document, ImportSummary, ImportValue};
use crate::{DbPool, Grade, Result, StoreError};
use chrono::Local;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Persisted grades of one collection, keyed by filename.
/// A missing key means unrated.
pub type RatingMap = BTreeMap<String, Grade>;

/// Storage key for a collection's ratings
pub fn storage_key(collection_id: &str) -> String {
    format!("collection:{}", collection_id)
}

/// Durable filename -> grade mappings, one document per collection
pub struct RatingStore {
    pool: DbPool,
}

impl RatingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get all grades of a collection.
    ///
    /// Never fails: unreadable storage or a corrupt document yields an
    /// empty map, and values that are not grade codes are skipped.
    pub fn get(&self, collection_id: &str) -> RatingMap {
        let raw = self
            .pool
            .get()
            .map_err(|e| StoreError::Pool(e.to_string()))
            .and_then(|conn| read_raw(&conn, &storage_key(collection_id)));

        match raw {
            Ok(Some(text)) => decode_map(&text, collection_id),
            Ok(None) => RatingMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read ratings for {}: {}", collection_id, e);
                RatingMap::new()
            }
        }
    }

    /// Set or clear (`None`) the grade of one image
    pub fn set(&self, collection_id: &str, image_id: &str, grade: Option<Grade>) -> Result<()> {
        let mut conn = self.pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
        let key = storage_key(collection_id);

        let tx = conn.transaction()?;
        let mut ratings = read_raw(&tx, &key)?
            .map(|text| decode_map(&text, collection_id))
            .unwrap_or_default();

        match grade {
            Some(grade) => {
                ratings.insert(image_id.to_string(), grade);
            }
            None => {
                ratings.remove(image_id);
            }
        }

        write_raw(&tx, &key, &encode_map(&ratings)?)?;
        tx.commit()?;

        tracing::debug!(
            collection = collection_id,
            image = image_id,
            grade = grade.map(Grade::code).unwrap_or("none"),
            "Rating saved"
        );
        Ok(())
    }

    /// Delete every grade of a collection
    pub fn clear(&self, collection_id: &str) -> Result<()> {
        let conn = self.pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
        conn.execute(
            "DELETE FROM kv_store WHERE key = ?1",
            [storage_key(collection_id)],
        )?;

        tracing::info!("Cleared ratings for {}", collection_id);
        Ok(())
    }

    /// Render a collection's ratings as an export document
    pub fn export_document(&self, collection_id: &str) -> Result<String> {
        render_document(collection_id, &self.get(collection_id))
    }

    /// Write an export document into `dir`.
    ///
    /// Returns the written file, or `None` if anything failed (logged).
    pub fn export_all(&self, collection_id: &str, dir: &Path) -> Option<PathBuf> {
        let result = self.export_document(collection_id).and_then(|text| {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(export_file_name(collection_id));
            std::fs::write(&path, text)?;
            Ok(path)
        });

        match result {
            Ok(path) => {
                tracing::info!("Exported ratings for {} to {:?}", collection_id, path);
                Some(path)
            }
            Err(e) => {
                tracing::error!("Failed to export ratings for {}: {}", collection_id, e);
                None
            }
        }
    }

    /// Merge an export document into a collection.
    ///
    /// Document entries win over stored ones. Entries whose value is not a
    /// grade code unrate their image. A document that is not a mapping is
    /// rejected before anything is written.
    pub fn import_document(&self, text: &str, collection_id: &str) -> Result<ImportSummary> {
        let doc = parse_document(text)?;

        if let Some(source) = doc.source_collection.as_deref() {
            if source != collection_id {
                tracing::warn!(
                    "Importing ratings exported from '{}' into '{}'",
                    source,
                    collection_id
                );
            }
        }

        let mut conn = self.pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
        let key = storage_key(collection_id);

        let tx = conn.transaction()?;
        let mut ratings = read_raw(&tx, &key)?
            .map(|text| decode_map(&text, collection_id))
            .unwrap_or_default();

        let mut summary = ImportSummary {
            source_collection: doc.source_collection,
            ..ImportSummary::default()
        };
        for (image_id, grade) in doc.entries {
            match grade {
                ImportValue::Set(grade) => {
                    ratings.insert(image_id, grade);
                    summary.imported += 1;
                }
                ImportValue::Clear => {
                    ratings.remove(&image_id);
                    summary.removed += 1;
                }
                ImportValue::Unrecognized => {
                    ratings.remove(&image_id);
                    summary.unrecognized += 1;
                }
            }
        }

        write_raw(&tx, &key, &encode_map(&ratings)?)?;
        tx.commit()?;

        tracing::info!(
            "Imported {} ratings ({} cleared, {} unrecognized) into {}",
            summary.imported,
            summary.removed,
            summary.unrecognized,
            collection_id
        );
        Ok(summary)
    }
}

fn export_file_name(collection_id: &str) -> String {
    let safe: String = collection_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("ratings-{}-{}.json", safe, Local::now().format("%Y-%m-%d"))
}

fn read_raw(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

fn write_raw(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO kv_store (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = strftime('%s', 'now')
        "#,
        rusqlite::params![key, value],
    )?;
    Ok(())
}

fn encode_map(ratings: &RatingMap) -> Result<String> {
    Ok(serde_json::to_string(ratings)?)
}

fn decode_map(text: &str, collection_id: &str) -> RatingMap {
    let map: Map<String, Value> = match serde_json::from_str(text) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!("Stored ratings for {} are corrupt, ignoring: {}", collection_id, e);
            return RatingMap::new();
        }
    };

    map.into_iter()
        .filter_map(|(image_id, value)| {
            let grade = value.as_str().and_then(Grade::from_code);
            if grade.is_none() {
                tracing::debug!("Skipping invalid grade {} for {}", value, image_id);
            }
            grade.map(|g| (image_id, g))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, RatingStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir.path().join("ratings.db")).unwrap();
        (temp_dir, store)
    }

    fn write_raw_value(store: &RatingStore, collection_id: &str, value: &str) {
        let conn = store.pool.get().unwrap();
        write_raw(&conn, &storage_key(collection_id), value).unwrap();
    }

    #[test]
    fn test_get_missing_collection_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.get("posters").is_empty());
    }

    #[test]
    fn test_set_and_unset() {
        let (_dir, store) = temp_store();

        store.set("posters", "x.png", Some(Grade::A)).unwrap();
        store.set("posters", "y.png", Some(Grade::F)).unwrap();
        assert_eq!(store.get("posters").get("x.png"), Some(&Grade::A));

        // None deletes the key rather than storing a marker
        store.set("posters", "x.png", None).unwrap();
        let ratings = store.get("posters");
        assert!(!ratings.contains_key("x.png"));
        assert_eq!(ratings.len(), 1);
    }

    #[test]
    fn test_collections_are_isolated() {
        let (_dir, store) = temp_store();

        store.set("posters", "x.png", Some(Grade::A)).unwrap();
        store.set("logos", "x.png", Some(Grade::D)).unwrap();

        assert_eq!(store.get("posters").get("x.png"), Some(&Grade::A));
        assert_eq!(store.get("logos").get("x.png"), Some(&Grade::D));

        store.clear("logos").unwrap();
        assert!(store.get("logos").is_empty());
        assert_eq!(store.get("posters").len(), 1);
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ratings.db");

        open(&path).unwrap().set("posters", "x.png", Some(Grade::C)).unwrap();
        let reopened = open(&path).unwrap();
        assert_eq!(reopened.get("posters").get("x.png"), Some(&Grade::C));
    }

    #[test]
    fn test_corrupt_document_reads_as_empty() {
        let (_dir, store) = temp_store();
        write_raw_value(&store, "posters", "{{{ not json");

        assert!(store.get("posters").is_empty());

        // A write replaces the corrupt document
        store.set("posters", "x.png", Some(Grade::B)).unwrap();
        assert_eq!(store.get("posters").len(), 1);
    }

    #[test]
    fn test_invalid_values_read_as_unrated() {
        let (_dir, store) = temp_store();
        write_raw_value(&store, "posters", r#"{"x.png": "a", "y.png": "good", "z.png": null}"#);

        let ratings = store.get("posters");
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings.get("x.png"), Some(&Grade::A));
    }

    #[test]
    fn test_export_import_round_trip() {
        let (_dir, store) = temp_store();
        store.set("posters", "x.png", Some(Grade::A)).unwrap();
        store.set("posters", "y.png", Some(Grade::D)).unwrap();
        let original = store.get("posters");

        let document = store.export_document("posters").unwrap();

        let (_dir2, fresh) = temp_store();
        let summary = fresh.import_document(&document, "posters").unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.source_collection.as_deref(), Some("posters"));
        assert_eq!(fresh.get("posters"), original);
    }

    #[test]
    fn test_import_merges_and_wins() {
        let (_dir, store) = temp_store();
        store.set("posters", "x.png", Some(Grade::A)).unwrap();
        store.set("posters", "keep.png", Some(Grade::B)).unwrap();

        store
            .import_document(r#"{"x.png": "f", "new.png": "c"}"#, "posters")
            .unwrap();

        let ratings = store.get("posters");
        assert_eq!(ratings.get("x.png"), Some(&Grade::F));
        assert_eq!(ratings.get("keep.png"), Some(&Grade::B));
        assert_eq!(ratings.get("new.png"), Some(&Grade::C));
    }

    #[test]
    fn test_bare_and_tagged_documents_match() {
        let (_dir1, tagged) = temp_store();
        let (_dir2, bare) = temp_store();

        tagged
            .import_document(r#"{"_collection": "posters", "x.png": "a"}"#, "posters")
            .unwrap();
        bare.import_document(r#"{"x.png": "a"}"#, "posters").unwrap();

        assert_eq!(tagged.get("posters"), bare.get("posters"));
        assert!(!tagged.get("posters").contains_key(crate::COLLECTION_TAG));
    }

    #[test]
    fn test_import_with_unrecognized_values_still_merges() {
        let (_dir, store) = temp_store();
        store.set("posters", "y.png", Some(Grade::C)).unwrap();
        store.set("posters", "keep.png", Some(Grade::D)).unwrap();

        let document = r#"{"x.png": "a", "y.png": "good", "z.png": "B", "w.png": 12}"#;
        let summary = store.import_document(document, "posters").unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.unrecognized, 2);
        assert_eq!(summary.removed, 0);

        let ratings = store.get("posters");
        assert_eq!(ratings.get("x.png"), Some(&Grade::A));
        assert_eq!(ratings.get("z.png"), Some(&Grade::B));
        // A legacy label overrides the stored grade and leaves the image unrated
        assert!(!ratings.contains_key("y.png"));
        assert!(!ratings.contains_key("w.png"));
        assert_eq!(ratings.get("keep.png"), Some(&Grade::D));
    }

    #[test]
    fn test_import_of_non_mapping_merges_nothing() {
        let (_dir, store) = temp_store();
        store.set("posters", "x.png", Some(Grade::A)).unwrap();

        let result = store.import_document(r#"["x.png", "b"]"#, "posters");
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.get("posters").get("x.png"), Some(&Grade::A));
        assert_eq!(store.get("posters").len(), 1);
    }

    #[test]
    fn test_import_null_clears() {
        let (_dir, store) = temp_store();
        store.set("posters", "x.png", Some(Grade::A)).unwrap();

        let summary = store.import_document(r#"{"x.png": null}"#, "posters").unwrap();
        assert_eq!(summary.removed, 1);
        assert!(store.get("posters").is_empty());
    }

    #[test]
    fn test_export_all_writes_file() {
        let (dir, store) = temp_store();
        store.set("my posters", "x.png", Some(Grade::A)).unwrap();

        let path = store.export_all("my posters", &dir.path().join("out")).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("ratings-my_posters-"));
        assert!(name.ends_with(".json"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"_collection\": \"my posters\""));
    }

    #[test]
    fn test_export_all_reports_failure() {
        let (dir, store) = temp_store();
        // A regular file cannot act as the export directory
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        assert!(store.export_all("posters", &blocker).is_none());
    }
}
