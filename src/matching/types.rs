//! Query and result types for matching.

use serde::{Deserialize, Serialize};

use crate::fusion::{FUSION_STRATEGY, FusionWeights, MatchStatus};
use crate::geo::GeoPoint;

/// Object class reported when nothing was detected.
pub const UNKNOWN_OBJECT_CLASS: &str = "unknown";

/// A newly reported item to match against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchQuery {
    /// Visual embedding of the reported item.
    pub visual_embedding: Vec<f32>,
    /// Text embedding of the item description.
    pub text_embedding: Vec<f32>,
    /// Where the item was reported, if known.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Only candidates of this category are considered.
    #[serde(default)]
    pub category_filter: Option<String>,
    /// Detected object class, echoed in every result.
    #[serde(default)]
    pub object_class: Option<String>,
}

impl MatchQuery {
    /// Create a query from the two embeddings.
    pub fn new(visual_embedding: Vec<f32>, text_embedding: Vec<f32>) -> Self {
        Self {
            visual_embedding,
            text_embedding,
            location: None,
            category_filter: None,
            object_class: None,
        }
    }

    /// Set the report location.
    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    /// Restrict candidates to one category.
    pub fn with_category_filter<S: Into<String>>(mut self, category: S) -> Self {
        self.category_filter = Some(category.into());
        self
    }

    /// Set the detected object class.
    pub fn with_object_class<S: Into<String>>(mut self, object_class: S) -> Self {
        self.object_class = Some(object_class.into());
        self
    }

    /// Object class to report, `"unknown"` when none was given.
    pub fn object_class_or_unknown(&self) -> &str {
        self.object_class.as_deref().unwrap_or(UNKNOWN_OBJECT_CLASS)
    }
}

/// Per-signal scores behind a fused score, rounded to four decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub visual_similarity: f64,
    pub text_similarity: f64,
    pub location_score: f64,
}

/// How a score was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReasoning {
    pub strategy: String,
    pub weights: FusionWeights,
}

impl MatchReasoning {
    /// Reasoning for the weighted fusion strategy.
    pub fn weighted_fusion(weights: FusionWeights) -> Self {
        Self {
            strategy: FUSION_STRATEGY.to_string(),
            weights,
        }
    }
}

/// One catalog item that survived fusion and categorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub item_id: String,
    pub final_score: f64,
    pub status: MatchStatus,
    pub breakdown: MatchBreakdown,
    pub object_class: String,
    pub reasoning: MatchReasoning,
}
