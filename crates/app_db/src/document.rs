//! Export/import document format
//!
//! A document is a JSON object mapping filename to grade code, plus the
//! reserved key [`COLLECTION_TAG`] naming the collection it came from.
//! Documents written before the tag existed are bare mappings and are
//! still accepted.

use crate::{Grade, RatingMap, Result, StoreError};
use serde_json::{Map, Value};

/// Reserved key carrying the source collection id
pub const COLLECTION_TAG: &str = "_collection";

/// What one document entry does to the stored grade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportValue {
    Set(Grade),
    /// `null`: the image becomes unrated
    Clear,
    /// Anything that is not a grade code; the image becomes unrated
    Unrecognized,
}

/// A parsed import document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Value of the reserved tag, if present
    pub source_collection: Option<String>,
    /// Entries in document order
    pub entries: Vec<(String, ImportValue)>,
}

/// Outcome of merging a document into a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Images whose grade was set from the document
    pub imported: usize,
    /// Images unrated by a `null` entry
    pub removed: usize,
    /// Entries whose value was not a grade code; those images are unrated
    pub unrecognized: usize,
    pub source_collection: Option<String>,
}

/// Render the ratings of a collection as an export document
pub fn render_document(collection_id: &str, ratings: &RatingMap) -> Result<String> {
    let mut doc = Map::new();
    doc.insert(COLLECTION_TAG.to_string(), Value::String(collection_id.to_string()));
    for (image_id, grade) in ratings {
        doc.insert(image_id.clone(), Value::String(grade.code().to_string()));
    }
    Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
}

/// Parse an import document without touching storage.
///
/// Only a document that is not a JSON object (or whose reserved tag is not
/// a string) is rejected. Values that are not grade codes, such as the
/// `good`/`fine`/`bad` labels of older exports, read as unrated.
pub fn parse_document(text: &str) -> Result<ParsedDocument> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::Validation(format!("not valid JSON: {}", e)))?;

    let Value::Object(map) = value else {
        return Err(StoreError::Validation(
            "expected a JSON object mapping filenames to grades".to_string(),
        ));
    };

    let mut source_collection = None;
    let mut entries = Vec::with_capacity(map.len());

    for (key, value) in map {
        if key == COLLECTION_TAG {
            match value {
                Value::String(id) => source_collection = Some(id),
                other => {
                    return Err(StoreError::Validation(format!(
                        "'{}' must be a string, found {}",
                        COLLECTION_TAG, other
                    )))
                }
            }
            continue;
        }

        let parsed = match &value {
            Value::Null => ImportValue::Clear,
            Value::String(code) => code
                .parse::<Grade>()
                .map_or(ImportValue::Unrecognized, ImportValue::Set),
            _ => ImportValue::Unrecognized,
        };
        if parsed == ImportValue::Unrecognized {
            tracing::warn!("Unrecognized grade {} for '{}', treating as unrated", value, key);
        }
        entries.push((key, parsed));
    }

    Ok(ParsedDocument {
        source_collection,
        entries,
    })
}
