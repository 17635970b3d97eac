//! Ingest and match pipeline over the detection and embedding collaborators.
//!
//! Both pipelines run the same front half: detect and crop, then embed the
//! crop and the trimmed description. Collaborator calls are awaited before
//! the store is touched, so no store lock is ever held across an `.await`.

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::matching::{MatchOrchestrator, MatchQuery, MatchResult};
use crate::processing::detector::{DetectionResult, ObjectDetector};
use crate::processing::embedder::Embedder;
use crate::vector::store::VectorStore;

/// Status reported for a successfully indexed item.
pub const INDEXED_STATUS: &str = "indexed";

/// A found item to add to the catalog.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub item_id: String,
    pub image: Vec<u8>,
    pub text_description: String,
    pub location: GeoPoint,
    pub category: String,
}

/// Result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub status: String,
    pub item_id: String,
    pub internal_id: u64,
    pub detection: Option<DetectionResult>,
}

/// A lost item to look up.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub image: Vec<u8>,
    pub text_description: String,
    pub location: Option<GeoPoint>,
    pub category_filter: Option<String>,
}

struct Processed {
    visual_embedding: Vec<f32>,
    text_embedding: Vec<f32>,
    detection: Option<DetectionResult>,
}

/// Drives detector and embedder, then the store or the orchestrator.
#[derive(Debug, Clone)]
pub struct MatchService {
    orchestrator: MatchOrchestrator,
    detector: Arc<dyn ObjectDetector>,
    embedder: Arc<dyn Embedder>,
}

impl MatchService {
    pub fn new(
        orchestrator: MatchOrchestrator,
        detector: Arc<dyn ObjectDetector>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            orchestrator,
            detector,
            embedder,
        }
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        self.orchestrator.store()
    }

    pub fn orchestrator(&self) -> &MatchOrchestrator {
        &self.orchestrator
    }

    async fn process(&self, image: &[u8], text_description: &str) -> Result<Processed> {
        let (crop, detection) = self.detector.detect_and_crop(image).await?;
        match &detection {
            Some(d) => debug!("detected {} ({:.2})", d.label, d.confidence),
            None => debug!("no object detected; embedding the full image"),
        }

        let visual_embedding = self.embedder.image_embedding(&crop).await?;
        let text_embedding = self.embedder.text_embedding(text_description.trim()).await?;

        Ok(Processed {
            visual_embedding,
            text_embedding,
            detection,
        })
    }

    /// Detect, embed and index a found item.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome> {
        let processed = self
            .process(&request.image, &request.text_description)
            .await?;

        let internal_id = self.store().add_item(
            request.item_id.clone(),
            processed.visual_embedding,
            processed.text_embedding,
            request.location,
            request.category,
        )?;
        info!("indexed item {} as {internal_id}", request.item_id);

        Ok(IngestOutcome {
            status: INDEXED_STATUS.to_string(),
            item_id: request.item_id,
            internal_id,
            detection: processed.detection,
        })
    }

    /// Detect, embed and match a lost item against the catalog.
    pub async fn match_item(&self, request: MatchRequest) -> Result<Vec<MatchResult>> {
        let processed = self
            .process(&request.image, &request.text_description)
            .await?;

        let query = MatchQuery {
            visual_embedding: processed.visual_embedding,
            text_embedding: processed.text_embedding,
            location: request.location,
            category_filter: request.category_filter,
            object_class: processed.detection.map(|d| d.label),
        };

        let results = self.orchestrator.find_matches(&query)?;
        info!("match returned {} results", results.len());
        Ok(results)
    }
}
