//! Append-only registry of indexed items with exact visual search.
//!
//! Every item carries a visual embedding, a text embedding, a location and a
//! category. The visual embedding is searched by brute-force inner product,
//! which for unit vectors is cosine similarity. The scan is O(n·D) per query;
//! results are exact.
//!
//! Index and metadata live behind one read-write lock. Appends hold the write
//! lock only for the push itself, searches and lookups share the read lock.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ReclaimError, Result};
use crate::geo::GeoPoint;
use crate::vector::core::distance::batch_inner_product_parallel;
use crate::vector::core::vector::Vector;

pub mod snapshot;

pub use snapshot::{SnapshotFormat, SnapshotRecord, StoreSnapshot};

/// Default embedding dimension (CLIP ViT-L/14).
pub const DEFAULT_DIMENSION: usize = 768;

/// What to do when an `item_id` is indexed twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Index the item again under a fresh internal id.
    #[default]
    Allow,
    /// Fail the insert with [`ReclaimError::DuplicateItem`].
    Reject,
}

/// Construction-time settings of a [`VectorStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Visual embedding dimension. Fixed for the life of the store.
    pub dimension: usize,
    /// Text embedding dimension, when known up front.
    #[serde(default)]
    pub text_dimension: Option<usize>,
    /// Handling of repeated item ids.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            text_dimension: None,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl VectorStoreConfig {
    /// Config with the given visual dimension and defaults otherwise.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(ReclaimError::invalid_config(
                "embedding dimension must be greater than zero",
            ));
        }
        if self.text_dimension == Some(0) {
            return Err(ReclaimError::invalid_config(
                "text embedding dimension must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// A catalog entry owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedItem {
    /// Position of the visual embedding in the index.
    pub internal_id: u64,
    /// Caller supplied identifier.
    pub item_id: String,
    /// Unit-length visual embedding.
    pub visual_embedding: Vec<f32>,
    /// Text embedding, compared only against other text embeddings.
    pub text_embedding: Vec<f32>,
    /// Where the item was reported.
    pub location: GeoPoint,
    /// Coarse category used for hard filtering.
    pub category: String,
}

/// Summary of the store contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreStats {
    /// Number of indexed items.
    pub items: usize,
    /// Number of distinct item ids.
    pub distinct_item_ids: usize,
    /// Visual embedding dimension.
    pub dimension: usize,
    /// Text embedding dimension, if fixed.
    pub text_dimension: Option<usize>,
    /// Item count per category.
    pub categories: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
struct StoreInner {
    items: Vec<Arc<IndexedItem>>,
    item_ids: HashSet<String>,
}

/// In-memory nearest-neighbor store for visual embeddings.
#[derive(Debug)]
pub struct VectorStore {
    config: VectorStoreConfig,
    inner: RwLock<StoreInner>,
}

impl VectorStore {
    /// Create an empty store.
    pub fn new(config: VectorStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            inner: RwLock::new(StoreInner::default()),
        })
    }

    /// Create an empty store for visual embeddings of `dimension`.
    pub fn with_dimension(dimension: usize) -> Result<Self> {
        Self::new(VectorStoreConfig::with_dimension(dimension))
    }

    /// Get the store configuration.
    pub fn config(&self) -> &VectorStoreConfig {
        &self.config
    }

    /// Visual embedding dimension.
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Text embedding dimension, if fixed.
    pub fn text_dimension(&self) -> Option<usize> {
        self.config.text_dimension
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    /// Index a new item and return its internal id.
    ///
    /// The visual embedding is re-normalized to unit length before storage.
    /// Locations must have finite coordinates. On any error nothing is
    /// inserted.
    pub fn add_item(
        &self,
        item_id: impl Into<String>,
        visual_embedding: Vec<f32>,
        text_embedding: Vec<f32>,
        location: GeoPoint,
        category: impl Into<String>,
    ) -> Result<u64> {
        let item_id = item_id.into();
        let category = category.into();

        let visual = Vector::new(visual_embedding);
        visual.validate("visual embedding", self.config.dimension)?;
        let visual = visual.into_normalized();
        if visual.is_zero() {
            warn!("item {item_id} has a zero visual embedding; it will score 0.0 against every query");
        }

        let text = Vector::new(text_embedding);
        self.validate_text(&text)?;
        validate_location(&location)?;

        self.append(item_id, visual.data, text.data, location, category)
    }

    fn validate_text(&self, text: &Vector) -> Result<()> {
        match self.config.text_dimension {
            Some(dim) => text.validate("text embedding", dim),
            None if !text.is_valid() => Err(ReclaimError::invalid_argument(
                "text embedding contains NaN or infinite values",
            )),
            None => Ok(()),
        }
    }

    /// Append an already validated item. Holds the write lock for the push only.
    fn append(
        &self,
        item_id: String,
        visual_embedding: Vec<f32>,
        text_embedding: Vec<f32>,
        location: GeoPoint,
        category: String,
    ) -> Result<u64> {
        let mut inner = self.inner.write();
        if !inner.item_ids.insert(item_id.clone()) {
            match self.config.duplicate_policy {
                DuplicatePolicy::Reject => return Err(ReclaimError::DuplicateItem(item_id)),
                DuplicatePolicy::Allow => {
                    debug!("item {item_id} indexed again under a new internal id");
                }
            }
        }

        let internal_id = inner.items.len() as u64;
        inner.items.push(Arc::new(IndexedItem {
            internal_id,
            item_id,
            visual_embedding,
            text_embedding,
            location,
            category,
        }));

        Ok(internal_id)
    }

    /// Append a record restored from a snapshot.
    ///
    /// Stored embeddings are already unit length, so they are validated but
    /// not normalized again; a reload reproduces the saved vectors bit for bit.
    pub(crate) fn restore_item(
        &self,
        item_id: String,
        visual_embedding: Vec<f32>,
        text_embedding: Vec<f32>,
        location: GeoPoint,
        category: String,
    ) -> Result<u64> {
        let visual = Vector::new(visual_embedding);
        visual.validate("visual embedding", self.config.dimension)?;
        let text = Vector::new(text_embedding);
        self.validate_text(&text)?;
        validate_location(&location)?;
        self.append(item_id, visual.data, text.data, location, category)
    }

    /// The `k` stored items most similar to `query`, best first.
    ///
    /// Scores are inner products of the normalized query with the stored unit
    /// vectors, bounded in `[-1, 1]`. Equal scores are ordered by internal id.
    pub fn search_visual(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
        let query = Vector::new(query.to_vec());
        query.validate("visual query", self.config.dimension)?;
        let query = query.into_normalized();

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(u64, f32)> = {
            let inner = self.inner.read();
            let rows: Vec<&[f32]> = inner
                .items
                .iter()
                .map(|item| item.visual_embedding.as_slice())
                .collect();
            batch_inner_product_parallel(&query.data, &rows)
                .into_iter()
                .enumerate()
                .map(|(idx, score)| (idx as u64, score))
                .collect()
        };

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(CmpOrdering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Metadata of the item stored under `internal_id`, if any.
    pub fn get_item_data(&self, internal_id: u64) -> Option<Arc<IndexedItem>> {
        let idx = usize::try_from(internal_id).ok()?;
        self.inner.read().items.get(idx).cloned()
    }

    /// Like [`get_item_data`](Self::get_item_data), but unknown ids are an error.
    pub fn get_item_data_or_err(&self, internal_id: u64) -> Result<Arc<IndexedItem>> {
        self.get_item_data(internal_id)
            .ok_or_else(|| ReclaimError::not_found(format!("internal id {internal_id}")))
    }

    /// Internal ids under which `item_id` is indexed, in insertion order.
    pub fn internal_ids_for(&self, item_id: &str) -> Vec<u64> {
        self.inner
            .read()
            .items
            .iter()
            .filter(|item| item.item_id == item_id)
            .map(|item| item.internal_id)
            .collect()
    }

    /// Summary of the store contents.
    pub fn stats(&self) -> VectorStoreStats {
        let inner = self.inner.read();
        let mut categories = BTreeMap::new();
        for item in &inner.items {
            *categories.entry(item.category.clone()).or_insert(0) += 1;
        }
        VectorStoreStats {
            items: inner.items.len(),
            distinct_item_ids: inner.item_ids.len(),
            dimension: self.config.dimension,
            text_dimension: self.config.text_dimension,
            categories,
        }
    }

    /// Copy of every item, in internal id order.
    pub(crate) fn items(&self) -> Vec<Arc<IndexedItem>> {
        self.inner.read().items.clone()
    }
}

fn validate_location(location: &GeoPoint) -> Result<()> {
    if location.is_finite() {
        Ok(())
    } else {
        Err(ReclaimError::invalid_argument(format!(
            "location ({}, {}) has non-finite coordinates",
            location.lat, location.lng
        )))
    }
}
