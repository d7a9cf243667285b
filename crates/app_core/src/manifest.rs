//! Manifest loading and caching
//!
//! Static assets are laid out as:
//! - `collections.json`: `[{"id": ..., "name": ...}, ...]`
//! - `<collection>/manifest.json`: `["file1.png", "file2.jpg", ...]`
//! - `<collection>/<filename>`: the image itself

use crate::{AppError, CollectionId, CollectionInfo, ImageId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Path of the collections document
pub const COLLECTIONS_PATH: &str = "collections.json";

/// Path of a collection's manifest document
pub fn manifest_path(collection: &CollectionId) -> String {
    format!("{}/manifest.json", collection)
}

/// Asset path of an image, relative to the asset root
pub fn image_path(collection: &CollectionId, filename: &str) -> String {
    format!("{}/{}", collection, filename)
}

/// Somewhere static assets can be fetched from
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AppError>;
}

/// Assets served from a local directory
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetSource for DirectorySource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(self.root.join(path))
            .await
            .map_err(|e| AppError::fetch(path, e))
    }
}

/// Assets held in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(path.to_string(), bytes.into());
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AppError> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::fetch(path, "not found"))
    }
}

/// Loads collection lists and manifests, caching manifests per collection
pub struct ManifestLoader {
    source: Box<dyn AssetSource>,
    cache: DashMap<CollectionId, Arc<[ImageId]>>,
}

impl ManifestLoader {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: DashMap::new(),
        }
    }

    /// Fetch the available collections. Failures yield an empty list.
    pub async fn load_collections(&self) -> Vec<CollectionInfo> {
        let result = self
            .source
            .fetch(COLLECTIONS_PATH)
            .await
            .and_then(|bytes| {
                serde_json::from_slice::<Vec<CollectionInfo>>(&bytes)
                    .map_err(|e| AppError::fetch(COLLECTIONS_PATH, e))
            });

        match result {
            Ok(collections) => {
                tracing::debug!("Loaded {} collections", collections.len());
                collections
            }
            Err(e) => {
                tracing::warn!("{}", e);
                Vec::new()
            }
        }
    }

    /// Get a collection's manifest, fetching it on first use.
    ///
    /// Failures yield an empty manifest and are not cached, so the next
    /// call tries again.
    pub async fn load_manifest(&self, collection: &CollectionId) -> Arc<[ImageId]> {
        if let Some(hit) = self.cached(collection) {
            return hit;
        }

        match self.fetch_manifest(collection).await {
            Ok(images) => {
                let images: Arc<[ImageId]> = images.into();
                self.cache.insert(collection.clone(), Arc::clone(&images));
                tracing::debug!("Loaded manifest for {} ({} images)", collection, images.len());
                images
            }
            Err(e) => {
                tracing::warn!("{}", e);
                Arc::from(Vec::new())
            }
        }
    }

    /// Cached manifest, if any
    pub fn cached(&self, collection: &CollectionId) -> Option<Arc<[ImageId]>> {
        self.cache.get(collection).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop a cached manifest. Returns whether one was cached.
    pub fn invalidate(&self, collection: &CollectionId) -> bool {
        self.cache.remove(collection).is_some()
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    /// Re-fetch a manifest, replacing the cached copy
    pub async fn refresh(&self, collection: &CollectionId) -> Arc<[ImageId]> {
        self.invalidate(collection);
        self.load_manifest(collection).await
    }

    async fn fetch_manifest(&self, collection: &CollectionId) -> Result<Vec<ImageId>, AppError> {
        let path = manifest_path(collection);
        let bytes = self.source.fetch(&path).await?;
        let names: Vec<ImageId> =
            serde_json::from_slice(&bytes).map_err(|e| AppError::fetch(&path, e))?;

        let mut seen = HashSet::with_capacity(names.len());
        let mut images = Vec::with_capacity(names.len());
        for name in names {
            if seen.insert(name.clone()) {
                images.push(name);
            } else {
                tracing::warn!("Duplicate entry {} in {}", name, path);
            }
        }

        Ok(images)
    }
}
