//! Identifiers and grade groups

use serde::{Deserialize, Serialize};
use std::fmt;

pub use app_db::Grade;

/// Filename of an image, unique within its collection
pub type ImageId = String;

/// Collection identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl CollectionId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry of the collections document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: CollectionId,
    pub name: String,
}

/// A review group: one per grade, plus unrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradeGroup {
    Graded(Grade),
    Unrated,
}

impl GradeGroup {
    /// Display order of the review screen
    pub const ORDER: [GradeGroup; 6] = [
        GradeGroup::Graded(Grade::A),
        GradeGroup::Graded(Grade::B),
        GradeGroup::Graded(Grade::C),
        GradeGroup::Graded(Grade::D),
        GradeGroup::Graded(Grade::F),
        GradeGroup::Unrated,
    ];

    pub fn of(grade: Option<Grade>) -> Self {
        grade.map_or(GradeGroup::Unrated, GradeGroup::Graded)
    }

    pub fn grade(self) -> Option<Grade> {
        match self {
            GradeGroup::Graded(grade) => Some(grade),
            GradeGroup::Unrated => None,
        }
    }

    /// Stable key, matching the persisted grade codes
    pub fn key(self) -> &'static str {
        match self {
            GradeGroup::Graded(grade) => grade.code(),
            GradeGroup::Unrated => "unrated",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GradeGroup::Graded(grade) => grade.label(),
            GradeGroup::Unrated => "Unrated",
        }
    }

    /// Position in [`GradeGroup::ORDER`]
    pub(crate) fn index(self) -> usize {
        match self {
            GradeGroup::Graded(Grade::A) => 0,
            GradeGroup::Graded(Grade::B) => 1,
            GradeGroup::Graded(Grade::C) => 2,
            GradeGroup::Graded(Grade::D) => 3,
            GradeGroup::Graded(Grade::F) => 4,
            GradeGroup::Unrated => 5,
        }
    }
}

impl fmt::Display for GradeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_order() {
        for (i, group) in GradeGroup::ORDER.iter().enumerate() {
            assert_eq!(group.index(), i);
        }
    }

    #[test]
    fn test_group_of() {
        assert_eq!(GradeGroup::of(None), GradeGroup::Unrated);
        assert_eq!(GradeGroup::of(Some(Grade::D)).key(), "d");
        assert_eq!(GradeGroup::Unrated.label(), "Unrated");
    }

    #[test]
    fn test_collection_info_json() {
        let info: CollectionInfo =
            serde_json::from_str(r#"{"id": "posters", "name": "Posters"}"#).unwrap();
        assert_eq!(info.id, CollectionId::new("posters"));
        assert_eq!(info.name, "Posters");
    }
}
