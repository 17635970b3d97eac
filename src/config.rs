//! Runtime configuration.
//!
//! [`ReclaimConfig`] gathers every tunable of the engine in one serde
//! struct. It is stored as JSON next to the snapshot it describes, and the
//! CLI layers environment and flag overrides on top.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ReclaimError, Result};
use crate::fusion::{FusionConfig, FusionWeights};
use crate::matching::DEFAULT_CANDIDATE_POOL;
use crate::processing::DetectorConfig;
use crate::storage::{Storage, read_all, write_atomic};
use crate::vector::store::{
    DEFAULT_DIMENSION, DuplicatePolicy, SnapshotFormat, VectorStoreConfig,
};

/// Name of the configuration file inside a data directory.
pub const CONFIG_FILE: &str = "reclaim.json";

/// Version of the embedding models the catalog was built with.
pub const MODEL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimConfig {
    pub weight_visual: f64,
    pub weight_text: f64,
    pub weight_geo: f64,
    pub threshold_confirmed: f64,
    pub threshold_review: f64,
    /// Visual candidates fetched per query (k).
    pub candidate_pool: usize,
    /// Visual embedding dimension (D).
    pub dimension: usize,
    /// Text embedding dimension, enforced when set.
    pub text_dimension: Option<usize>,
    pub duplicate_policy: DuplicatePolicy,
    pub snapshot_format: SnapshotFormat,
    pub detector: DetectorConfig,
    pub model_version: String,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        let fusion = FusionConfig::default();
        Self {
            weight_visual: fusion.weights.visual,
            weight_text: fusion.weights.text,
            weight_geo: fusion.weights.geo,
            threshold_confirmed: fusion.threshold_confirmed,
            threshold_review: fusion.threshold_review,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            dimension: DEFAULT_DIMENSION,
            text_dimension: None,
            duplicate_policy: DuplicatePolicy::default(),
            snapshot_format: SnapshotFormat::default(),
            detector: DetectorConfig::default(),
            model_version: MODEL_VERSION.to_string(),
        }
    }
}

impl ReclaimConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load a configuration from a JSON file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_json(&bytes)
    }

    /// Load the configuration stored in `storage`, or the defaults when none exists.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        if !storage.file_exists(CONFIG_FILE) {
            return Ok(Self::default());
        }
        Self::from_json(&read_all(storage, CONFIG_FILE)?)
    }

    /// Store this configuration in `storage`.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        write_atomic(storage, CONFIG_FILE, &bytes)
    }

    /// Check that the configuration is usable.
    ///
    /// Non-finite numbers and empty dimensions are errors. Weights that do
    /// not sum to 1.0 and inverted thresholds are legal and only logged.
    pub fn validate(&self) -> Result<()> {
        self.to_store_config().validate()?;
        self.to_fusion_config().validate()?;

        if !self.detector.confidence_threshold.is_finite()
            || !self.detector.crop_padding_pct.is_finite()
        {
            return Err(ReclaimError::invalid_config(
                "detector settings must be finite numbers",
            ));
        }
        if self.candidate_pool == 0 {
            warn!("candidate_pool is 0; every query will return no matches");
        }
        Ok(())
    }

    /// Settings for the vector store.
    pub fn to_store_config(&self) -> VectorStoreConfig {
        VectorStoreConfig {
            dimension: self.dimension,
            text_dimension: self.text_dimension,
            duplicate_policy: self.duplicate_policy,
        }
    }

    /// Settings for the fusion engine.
    pub fn to_fusion_config(&self) -> FusionConfig {
        FusionConfig {
            weights: FusionWeights {
                visual: self.weight_visual,
                text: self.weight_text,
                geo: self.weight_geo,
            },
            threshold_confirmed: self.threshold_confirmed,
            threshold_review: self.threshold_review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ReclaimConfig::default();
        assert_eq!(config.weight_visual, 0.60);
        assert_eq!(config.weight_text, 0.25);
        assert_eq!(config.weight_geo, 0.15);
        assert_eq!(config.threshold_confirmed, 0.90);
        assert_eq!(config.threshold_review, 0.60);
        assert_eq!(config.candidate_pool, 50);
        assert_eq!(config.dimension, 768);
        assert_eq!(config.model_version, "1.0.0");
        assert_eq!(config.detector.confidence_threshold, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ReclaimConfig::from_json(br#"{"dimension": 512, "weight_geo": 0.3}"#).unwrap();
        assert_eq!(config.dimension, 512);
        assert_eq!(config.weight_geo, 0.3);
        assert_eq!(config.weight_visual, 0.60);
        assert_eq!(config.candidate_pool, 50);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"candidate_pool": 7, "duplicate_policy": "reject"}"#)
            .unwrap();
        let config = ReclaimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.candidate_pool, 7);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn test_save_and_load_from_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(ReclaimConfig::load(&storage).unwrap(), ReclaimConfig::default());

        let config = ReclaimConfig {
            text_dimension: Some(384),
            ..Default::default()
        };
        config.save(&storage).unwrap();
        assert_eq!(ReclaimConfig::load(&storage).unwrap(), config);
    }

    #[test]
    fn test_zero_dimension_is_invalid() {
        let config = ReclaimConfig {
            dimension: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReclaimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_non_finite_weight_is_invalid() {
        let config = ReclaimConfig {
            weight_text: f64::INFINITY,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conversions() {
        let config = ReclaimConfig {
            weight_visual: 0.5,
            threshold_review: 0.4,
            dimension: 16,
            ..Default::default()
        };
        let fusion = config.to_fusion_config();
        assert_eq!(fusion.weights.visual, 0.5);
        assert_eq!(fusion.threshold_review, 0.4);
        assert_eq!(config.to_store_config().dimension, 16);
    }
}
