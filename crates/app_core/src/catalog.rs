//! Image catalog: manifest merged with stored grades
//!
//! Two views are kept in sync:
//! - the flat list, sorted by filename
//! - the grouped partition, one sequence per [`GradeGroup`], in manifest
//!   order at build time; re-rated images move to the end of their new group

use crate::{AppError, CollectionId, Grade, GradeGroup, ImageId, ManifestLoader};
use app_db::{RatingMap, RatingStore};
use std::collections::HashMap;
use std::sync::Arc;

/// One image with its current grade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub image_id: ImageId,
    pub grade: Option<Grade>,
}

/// Images partitioned by grade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedCatalog {
    groups: [Vec<ImageId>; 6],
}

impl GroupedCatalog {
    pub fn get(&self, group: GradeGroup) -> &[ImageId] {
        &self.groups[group.index()]
    }

    /// Groups in display order
    pub fn iter(&self) -> impl Iterator<Item = (GradeGroup, &[ImageId])> + '_ {
        GradeGroup::ORDER
            .iter()
            .map(move |&group| (group, self.get(group)))
    }

    /// Group holding an image and its index within that group
    pub fn locate(&self, image_id: &str) -> Option<(GradeGroup, usize)> {
        self.iter().find_map(|(group, images)| {
            images
                .iter()
                .position(|id| id == image_id)
                .map(|i| (group, i))
        })
    }

    /// Number of images across all groups
    pub fn total(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn remove(&mut self, image_id: &str) -> Option<GradeGroup> {
        let (group, i) = self.locate(image_id)?;
        self.groups[group.index()].remove(i);
        Some(group)
    }

    fn push(&mut self, group: GradeGroup, image_id: ImageId) {
        self.groups[group.index()].push(image_id);
    }
}

/// Rating progress of a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub rated: usize,
    pub unrated: usize,
    pub per_group: Vec<(GradeGroup, usize)>,
}

/// Flat and grouped views of one collection
#[derive(Debug, Clone)]
pub struct ImageCatalog {
    collection: CollectionId,
    manifest: Arc<[ImageId]>,
    flat: Vec<CatalogEntry>,
    /// image id -> index in `flat`
    positions: HashMap<ImageId, usize>,
    grouped: GroupedCatalog,
}

impl ImageCatalog {
    /// Catalog with no images
    pub fn empty(collection: CollectionId) -> Self {
        Self::build(collection, Arc::from(Vec::new()), &RatingMap::new())
    }

    /// Build both views from a manifest and stored grades
    pub fn build(collection: CollectionId, manifest: Arc<[ImageId]>, ratings: &RatingMap) -> Self {
        let mut grouped = GroupedCatalog::default();
        let mut flat = Vec::with_capacity(manifest.len());

        for image_id in manifest.iter() {
            let grade = ratings.get(image_id).copied();
            grouped.push(GradeGroup::of(grade), image_id.clone());
            flat.push(CatalogEntry {
                image_id: image_id.clone(),
                grade,
            });
        }

        flat.sort_by(|a, b| a.image_id.cmp(&b.image_id));
        let positions = flat
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.image_id.clone(), i))
            .collect();

        Self {
            collection,
            manifest,
            flat,
            positions,
            grouped,
        }
    }

    /// Fetch the manifest and stored grades and build the catalog.
    ///
    /// This is the only full rebuild; a failed fetch yields an empty catalog.
    pub async fn load(
        loader: &ManifestLoader,
        store: &RatingStore,
        collection: &CollectionId,
    ) -> Self {
        let manifest = loader.load_manifest(collection).await;
        let ratings = store.get(collection.as_str());

        let catalog = Self::build(collection.clone(), manifest, &ratings);
        tracing::info!(
            "Catalog for {} loaded: {} images, {} rated",
            collection,
            catalog.len(),
            catalog.stats().rated
        );
        catalog
    }

    pub fn collection(&self) -> &CollectionId {
        &self.collection
    }

    /// Images in manifest order
    pub fn manifest(&self) -> &[ImageId] {
        &self.manifest
    }

    /// All images sorted by filename
    pub fn flat(&self) -> &[CatalogEntry] {
        &self.flat
    }

    pub fn grouped(&self) -> &GroupedCatalog {
        &self.grouped
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Index of an image in the flat list
    pub fn position(&self, image_id: &str) -> Option<usize> {
        self.positions.get(image_id).copied()
    }

    pub fn entry(&self, image_id: &str) -> Option<&CatalogEntry> {
        self.position(image_id).map(|i| &self.flat[i])
    }

    pub fn contains(&self, image_id: &str) -> bool {
        self.positions.contains_key(image_id)
    }

    /// Change an image's grade in both views without reloading.
    ///
    /// The flat order never changes. In the grouped view the image moves to
    /// the end of its target group, even if the grade is unchanged.
    pub fn apply_rating(&mut self, image_id: &str, grade: Option<Grade>) -> Result<(), AppError> {
        let pos = self
            .position(image_id)
            .ok_or_else(|| AppError::UnknownImage(image_id.to_string()))?;

        self.flat[pos].grade = grade;

        let previous = self.grouped.remove(image_id);
        debug_assert!(previous.is_some(), "{} missing from grouped view", image_id);
        self.grouped.push(GradeGroup::of(grade), image_id.to_string());

        debug_assert_eq!(self.grouped.total(), self.flat.len());
        Ok(())
    }

    /// First image in manifest order without a grade.
    ///
    /// Falls back to the first image when everything is graded; `None`
    /// only for an empty catalog.
    pub fn next_unrated(&self) -> Option<&str> {
        self.manifest
            .iter()
            .find(|id| self.entry(id).map_or(false, |e| e.grade.is_none()))
            .or_else(|| self.manifest.first())
            .map(String::as_str)
    }

    pub fn stats(&self) -> CatalogStats {
        let per_group: Vec<_> = self
            .grouped
            .iter()
            .map(|(group, images)| (group, images.len()))
            .collect();
        let unrated = self.grouped.get(GradeGroup::Unrated).len();

        CatalogStats {
            total: self.flat.len(),
            rated: self.flat.len() - unrated,
            unrated,
            per_group,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;

    fn ids(names: &[&str]) -> Vec<ImageId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn build(manifest: &[&str], ratings: &[(&str, Grade)]) -> ImageCatalog {
        let ratings: RatingMap = ratings
            .iter()
            .map(|(id, g)| (id.to_string(), *g))
            .collect();
        ImageCatalog::build(CollectionId::new("test"), ids(manifest).into(), &ratings)
    }

    /// Every manifest image is in exactly one group, matching its flat grade
    fn assert_partition(catalog: &ImageCatalog) {
        let mut seen: Vec<&str> = Vec::new();
        for (group, images) in catalog.grouped().iter() {
            for id in images {
                assert_eq!(GradeGroup::of(catalog.entry(id).unwrap().grade), group);
                seen.push(id);
            }
        }
        seen.sort();
        let mut manifest: Vec<&str> = catalog.manifest().iter().map(String::as_str).collect();
        manifest.sort();
        assert_eq!(seen, manifest);
    }

    #[test]
    fn test_build_example() {
        let catalog = build(&["a.png", "b.png", "c.png"], &[("b.png", Grade::A)]);

        let grouped = catalog.grouped();
        assert_eq!(grouped.get(GradeGroup::Graded(Grade::A)), &ids(&["b.png"])[..]);
        for grade in [Grade::B, Grade::C, Grade::D, Grade::F] {
            assert!(grouped.get(GradeGroup::Graded(grade)).is_empty());
        }
        assert_eq!(grouped.get(GradeGroup::Unrated), &ids(&["a.png", "c.png"])[..]);

        assert_eq!(
            catalog.flat(),
            &[
                CatalogEntry { image_id: "a.png".into(), grade: None },
                CatalogEntry { image_id: "b.png".into(), grade: Some(Grade::A) },
                CatalogEntry { image_id: "c.png".into(), grade: None },
            ]
        );
        assert_partition(&catalog);
    }

    #[test]
    fn test_groups_keep_manifest_order() {
        let catalog = build(&["z.png", "m.png", "a.png"], &[]);

        assert_eq!(
            catalog.grouped().get(GradeGroup::Unrated),
            &ids(&["z.png", "m.png", "a.png"])[..]
        );
        let flat: Vec<_> = catalog.flat().iter().map(|e| e.image_id.as_str()).collect();
        assert_eq!(flat, vec!["a.png", "m.png", "z.png"]);
    }

    #[test]
    fn test_stale_ratings_are_ignored() {
        let catalog = build(&["a.png"], &[("gone.png", Grade::A)]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.grouped().get(GradeGroup::Graded(Grade::A)).is_empty());
        assert_partition(&catalog);
    }

    #[test]
    fn test_apply_rating_moves_between_groups() {
        let mut catalog = build(&["a.png", "b.png", "c.png"], &[("b.png", Grade::A)]);

        catalog.apply_rating("c.png", Some(Grade::A)).unwrap();
        assert_eq!(
            catalog.grouped().get(GradeGroup::Graded(Grade::A)),
            &ids(&["b.png", "c.png"])[..]
        );
        assert_eq!(catalog.entry("c.png").unwrap().grade, Some(Grade::A));
        assert_eq!(catalog.position("c.png"), Some(2));

        catalog.apply_rating("b.png", None).unwrap();
        assert_eq!(
            catalog.grouped().get(GradeGroup::Unrated),
            &ids(&["a.png", "b.png"])[..]
        );
        assert_partition(&catalog);
    }

    #[test]
    fn test_rerating_moves_to_end() {
        let mut catalog = build(
            &["a.png", "b.png", "c.png"],
            &[("a.png", Grade::B), ("b.png", Grade::B), ("c.png", Grade::B)],
        );

        catalog.apply_rating("a.png", Some(Grade::B)).unwrap();
        assert_eq!(
            catalog.grouped().get(GradeGroup::Graded(Grade::B)),
            &ids(&["b.png", "c.png", "a.png"])[..]
        );
        assert_partition(&catalog);
    }

    #[test]
    fn test_apply_rating_unknown_image() {
        let mut catalog = build(&["a.png"], &[]);
        let before = catalog.grouped().clone();

        let result = catalog.apply_rating("nope.png", Some(Grade::A));
        assert!(matches!(result, Err(AppError::UnknownImage(_))));
        assert_eq!(catalog.grouped(), &before);
    }

    #[test]
    fn test_next_unrated() {
        let catalog = build(&["x", "y", "z"], &[("x", Grade::A)]);
        assert_eq!(catalog.next_unrated(), Some("y"));

        // Everything graded: start of the deck
        let catalog = build(&["x", "y", "z"], &[("x", Grade::A), ("y", Grade::B), ("z", Grade::A)]);
        assert_eq!(catalog.next_unrated(), Some("x"));

        assert_eq!(ImageCatalog::empty(CollectionId::new("e")).next_unrated(), None);
    }

    #[test]
    fn test_next_unrated_uses_manifest_order() {
        let catalog = build(&["z", "a"], &[]);
        assert_eq!(catalog.next_unrated(), Some("z"));
    }

    #[test]
    fn test_stats() {
        let catalog = build(&["a", "b", "c", "d"], &[("a", Grade::A), ("b", Grade::F)]);
        let stats = catalog.stats();

        assert_eq!((stats.total, stats.rated, stats.unrated), (4, 2, 2));
        assert_eq!(stats.per_group[0], (GradeGroup::Graded(Grade::A), 1));
        assert_eq!(stats.per_group[4], (GradeGroup::Graded(Grade::F), 1));
        assert_eq!(stats.per_group[5], (GradeGroup::Unrated, 2));
    }

    #[tokio::test]
    async fn test_load_merges_store_and_manifest() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = app_db::open(&temp_dir.path().join("ratings.db")).unwrap();
        store.set("posters", "b.png", Some(Grade::C)).unwrap();

        let loader = ManifestLoader::new(
            MemorySource::new().with("posters/manifest.json", r#"["b.png", "a.png"]"#),
        );
        let catalog = ImageCatalog::load(&loader, &store, &CollectionId::new("posters")).await;

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entry("b.png").unwrap().grade, Some(Grade::C));
        assert_eq!(catalog.flat()[0].image_id, "a.png");
        assert_partition(&catalog);

        // A collection whose manifest cannot be fetched is empty, not an error
        let missing = ImageCatalog::load(&loader, &store, &CollectionId::new("nope")).await;
        assert!(missing.is_empty());
    }
}
