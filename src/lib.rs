//! # Reclaim
//!
//! Multi-signal matching for lost & found catalogs.
//!
//! A reported item (image, description, location) is matched against
//! previously indexed items using three signals fused into one decision:
//!
//! - visual similarity from an exact nearest-neighbor scan
//! - text similarity between description embeddings
//! - spatial proximity from the haversine distance
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use reclaim::prelude::*;
//!
//! # fn main() -> reclaim::error::Result<()> {
//! let store = Arc::new(VectorStore::with_dimension(3)?);
//! let nyc = GeoPoint::new(40.7128, -74.0060);
//! store.add_item("wallet-1", vec![1.0, 0.0, 0.0], vec![0.0, 1.0], nyc, "wallet")?;
//!
//! let orchestrator = MatchOrchestrator::with_defaults(store);
//! let query = MatchQuery::new(vec![1.0, 0.0, 0.0], vec![0.0, 1.0])
//!     .with_location(nyc)
//!     .with_category_filter("wallet");
//! let matches = orchestrator.find_matches(&query)?;
//! assert_eq!(matches[0].status, MatchStatus::Confirmed);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fusion;
pub mod geo;
pub mod matching;
pub mod processing;
pub mod storage;
pub mod vector;

pub mod prelude {
    pub use crate::config::ReclaimConfig;
    pub use crate::error::{ReclaimError, Result};
    pub use crate::fusion::{FusionConfig, FusionEngine, FusionWeights, MatchStatus};
    pub use crate::geo::{GeoPoint, GeoScorer};
    pub use crate::matching::{MatchOrchestrator, MatchQuery, MatchResult};
    pub use crate::processing::{Embedder, MatchService, ObjectDetector};
    pub use crate::vector::{DuplicatePolicy, VectorStore, VectorStoreConfig};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
