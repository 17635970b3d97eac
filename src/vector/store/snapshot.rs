//! Durable snapshots of a [`VectorStore`].
//!
//! A snapshot is the ordered list of indexed items plus the dimensions the
//! store was built with. Reloading replays the records in insertion order,
//! so every item keeps its internal id.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ReclaimError, Result};
use crate::geo::GeoPoint;
use crate::storage::{Storage, read_all, write_atomic};
use crate::vector::store::{DuplicatePolicy, VectorStore, VectorStoreConfig};

pub const SNAPSHOT_VERSION: u32 = 1;
pub const JSON_SNAPSHOT_FILE: &str = "store.json";
pub const BINARY_SNAPSHOT_FILE: &str = "store.bin";

/// Encoding of a snapshot on storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Human readable JSON.
    #[default]
    Json,
    /// Compact bincode.
    Bincode,
}

impl SnapshotFormat {
    /// File name used for this format.
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotFormat::Json => JSON_SNAPSHOT_FILE,
            SnapshotFormat::Bincode => BINARY_SNAPSHOT_FILE,
        }
    }

    /// Detect which format a storage holds, preferring JSON.
    pub fn detect(storage: &dyn Storage) -> Option<Self> {
        [SnapshotFormat::Json, SnapshotFormat::Bincode]
            .into_iter()
            .find(|format| storage.file_exists(format.file_name()))
    }

    fn encode(&self, snapshot: &StoreSnapshot) -> Result<Vec<u8>> {
        match self {
            SnapshotFormat::Json => Ok(serde_json::to_vec(snapshot)?),
            SnapshotFormat::Bincode => Ok(bincode::serialize(snapshot)?),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<StoreSnapshot> {
        match self {
            SnapshotFormat::Json => Ok(serde_json::from_slice(bytes)?),
            SnapshotFormat::Bincode => Ok(bincode::deserialize(bytes)?),
        }
    }
}

/// One indexed item as written to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub internal_id: u64,
    pub item_id: String,
    pub visual_embedding: Vec<f32>,
    pub text_embedding: Vec<f32>,
    pub location: GeoPoint,
    pub category: String,
}

/// Full image of a store at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub dimension: usize,
    #[serde(default)]
    pub text_dimension: Option<usize>,
    pub created_at: DateTime<Utc>,
    /// CRC32 over the record contents.
    pub checksum: u32,
    pub records: Vec<SnapshotRecord>,
}

impl StoreSnapshot {
    /// Build a snapshot from records, computing the checksum.
    pub fn new(dimension: usize, text_dimension: Option<usize>, records: Vec<SnapshotRecord>) -> Self {
        let checksum = records_checksum(&records);
        Self {
            version: SNAPSHOT_VERSION,
            dimension,
            text_dimension,
            created_at: Utc::now(),
            checksum,
            records,
        }
    }

    /// Check version, checksum and id layout.
    pub fn verify(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ReclaimError::snapshot(format!(
                "snapshot version mismatch: expected {}, found {}",
                SNAPSHOT_VERSION, self.version
            )));
        }

        let actual = records_checksum(&self.records);
        if actual != self.checksum {
            return Err(ReclaimError::snapshot(format!(
                "checksum mismatch: expected {:08x}, computed {:08x}",
                self.checksum, actual
            )));
        }

        for (position, record) in self.records.iter().enumerate() {
            if record.internal_id != position as u64 {
                return Err(ReclaimError::snapshot(format!(
                    "record at position {position} carries internal id {}",
                    record.internal_id
                )));
            }
        }

        Ok(())
    }
}

/// Checksum over record contents, independent of the encoding.
fn records_checksum(records: &[SnapshotRecord]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for record in records {
        hasher.update(&record.internal_id.to_le_bytes());
        hasher.update(&(record.item_id.len() as u64).to_le_bytes());
        hasher.update(record.item_id.as_bytes());
        for value in &record.visual_embedding {
            hasher.update(&value.to_le_bytes());
        }
        hasher.update(&(record.text_embedding.len() as u64).to_le_bytes());
        for value in &record.text_embedding {
            hasher.update(&value.to_le_bytes());
        }
        hasher.update(&record.location.lat.to_le_bytes());
        hasher.update(&record.location.lng.to_le_bytes());
        hasher.update(&(record.category.len() as u64).to_le_bytes());
        hasher.update(record.category.as_bytes());
    }
    hasher.finalize()
}

impl VectorStore {
    /// Capture the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        let records = self
            .items()
            .iter()
            .map(|item| SnapshotRecord {
                internal_id: item.internal_id,
                item_id: item.item_id.clone(),
                visual_embedding: item.visual_embedding.clone(),
                text_embedding: item.text_embedding.clone(),
                location: item.location,
                category: item.category.clone(),
            })
            .collect();
        StoreSnapshot::new(self.config.dimension, self.config.text_dimension, records)
    }

    /// Rebuild a store from a snapshot, preserving internal ids.
    pub fn from_snapshot(snapshot: StoreSnapshot, duplicate_policy: DuplicatePolicy) -> Result<Self> {
        snapshot.verify()?;

        let store = VectorStore::new(VectorStoreConfig {
            dimension: snapshot.dimension,
            text_dimension: snapshot.text_dimension,
            duplicate_policy,
        })?;

        for record in snapshot.records {
            let expected = record.internal_id;
            let assigned = store.restore_item(
                record.item_id,
                record.visual_embedding,
                record.text_embedding,
                record.location,
                record.category,
            )?;
            if assigned != expected {
                return Err(ReclaimError::snapshot(format!(
                    "internal id drift while reloading: expected {expected}, assigned {assigned}"
                )));
            }
        }

        Ok(store)
    }

    /// Write a snapshot to `storage`, replacing any previous one of the same format.
    pub fn save(&self, storage: &dyn Storage, format: SnapshotFormat) -> Result<StoreSnapshot> {
        let snapshot = self.snapshot();
        let bytes = format.encode(&snapshot)?;
        write_atomic(storage, format.file_name(), &bytes)?;
        info!(
            "saved {} items to {} ({} bytes)",
            snapshot.records.len(),
            format.file_name(),
            bytes.len()
        );
        Ok(snapshot)
    }

    /// Load the snapshot of `format` held by `storage`.
    pub fn load(
        storage: &dyn Storage,
        format: SnapshotFormat,
        duplicate_policy: DuplicatePolicy,
    ) -> Result<Self> {
        let bytes = read_all(storage, format.file_name())?;
        let snapshot = format.decode(&bytes)?;
        let store = Self::from_snapshot(snapshot, duplicate_policy)?;
        info!("loaded {} items from {}", store.len(), format.file_name());
        Ok(store)
    }
}
