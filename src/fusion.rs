//! Weighted fusion of the visual, text and location signals.
//!
//! The fused score is a plain weighted sum,
//! `visual * w_visual + text * w_text + geo * w_geo`, and is then bucketed
//! into a [`MatchStatus`] by two thresholds.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ReclaimError, Result};
use crate::vector::core::distance::cosine_similarity;

/// Name of the only fusion strategy, reported with every match.
pub const FUSION_STRATEGY: &str = "weighted_fusion";

/// Per-signal weights of the fused score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub visual: f64,
    pub text: f64,
    pub geo: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            visual: 0.60,
            text: 0.25,
            geo: 0.15,
        }
    }
}

impl FusionWeights {
    /// Sum of the three weights.
    pub fn total(&self) -> f64 {
        self.visual + self.text + self.geo
    }
}

/// Configuration for fusion and categorization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Signal weights. Summing to 1.0 is recommended, not required.
    pub weights: FusionWeights,
    /// Minimum fused score for a confirmed match.
    pub threshold_confirmed: f64,
    /// Minimum fused score for a match that needs human review.
    pub threshold_review: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            threshold_confirmed: 0.90,
            threshold_review: 0.60,
        }
    }
}

impl FusionConfig {
    /// Reject non-finite values; warn about unusual but legal settings.
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("weight_visual", self.weights.visual),
            ("weight_text", self.weights.text),
            ("weight_geo", self.weights.geo),
            ("threshold_confirmed", self.threshold_confirmed),
            ("threshold_review", self.threshold_review),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(ReclaimError::invalid_config(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }

        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            warn!("fusion weights sum to {total:.4}; fused scores will not be on a [0, 1] scale");
        }
        if self.threshold_review > self.threshold_confirmed {
            warn!(
                "threshold_review ({}) is above threshold_confirmed ({}); no match will be sent to review",
                self.threshold_review, self.threshold_confirmed
            );
        }
        Ok(())
    }
}

/// Decision attached to a fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "confirmed_match")]
    Confirmed,
    #[serde(rename = "human_review")]
    Review,
    #[serde(rename = "discard")]
    Discard,
}

impl MatchStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Confirmed => "confirmed_match",
            MatchStatus::Review => "human_review",
            MatchStatus::Discard => "discard",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combines similarity signals into one score and categorizes it.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    /// Create a new fusion engine.
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Get the fusion configuration.
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Get the signal weights.
    pub fn weights(&self) -> FusionWeights {
        self.config.weights
    }

    /// Cosine similarity of two embeddings that are already unit length.
    pub fn cosine_sim(&self, a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(a, b)
    }

    /// Weighted sum of the three signals.
    pub fn compute_final_score(&self, visual_score: f64, text_score: f64, geo_score: f64) -> f64 {
        let weights = &self.config.weights;
        visual_score * weights.visual + text_score * weights.text + geo_score * weights.geo
    }

    /// Bucket a fused score.
    pub fn categorize(&self, final_score: f64) -> MatchStatus {
        if final_score >= self.config.threshold_confirmed {
            MatchStatus::Confirmed
        } else if final_score >= self.config.threshold_review {
            MatchStatus::Review
        } else {
            MatchStatus::Discard
        }
    }
}

/// Round to four decimal places, as reported to callers.
///
/// Rounds the exact stored value through the decimal formatter, so
/// `0.84505` (stored just below the half-way point) becomes `0.845`.
/// Non-finite values are returned unchanged.
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.4}").parse().unwrap_or(value)
}
