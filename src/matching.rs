//! Multi-signal matching of a query against the catalog.
//!
//! A query runs through five stages:
//!
//! 1. visual nearest-neighbor search for the candidate pool,
//! 2. hard category filtering,
//! 3. text and location scoring per candidate,
//! 4. weighted fusion and categorization,
//! 5. removal of discarded candidates and a deterministic sort.
//!
//! Results are ordered by rounded fused score descending, then by `item_id`
//! ascending, then by internal id ascending.

use std::cmp::Ordering;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{ReclaimError, Result};
use crate::fusion::{FusionEngine, MatchStatus, round4};
use crate::geo::GeoScorer;
use crate::vector::store::VectorStore;

pub mod types;

pub use types::{
    MatchBreakdown, MatchQuery, MatchReasoning, MatchResult, UNKNOWN_OBJECT_CLASS,
};

/// Default number of visual candidates considered per query.
pub const DEFAULT_CANDIDATE_POOL: usize = 50;

/// Turns a [`MatchQuery`] into a ranked list of [`MatchResult`]s.
#[derive(Debug, Clone)]
pub struct MatchOrchestrator {
    store: Arc<VectorStore>,
    fusion: FusionEngine,
    geo: GeoScorer,
    candidate_pool: usize,
}

impl MatchOrchestrator {
    /// Create an orchestrator over a shared store.
    pub fn new(store: Arc<VectorStore>, fusion: FusionEngine, candidate_pool: usize) -> Self {
        Self {
            store,
            fusion,
            geo: GeoScorer::new(),
            candidate_pool,
        }
    }

    /// Orchestrator with default fusion settings and candidate pool.
    pub fn with_defaults(store: Arc<VectorStore>) -> Self {
        Self::new(store, FusionEngine::default(), DEFAULT_CANDIDATE_POOL)
    }

    /// The store queried by this orchestrator.
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// The fusion engine used for scoring.
    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    /// Number of visual candidates fetched per query.
    pub fn candidate_pool(&self) -> usize {
        self.candidate_pool
    }

    /// Find catalog items matching `query`.
    ///
    /// Structural problems with the query (wrong embedding length) are
    /// errors. Problems with a single candidate are logged and the
    /// candidate is scored or skipped; they never abort the query.
    pub fn find_matches(&self, query: &MatchQuery) -> Result<Vec<MatchResult>> {
        if let Some(expected) = self.store.text_dimension()
            && query.text_embedding.len() != expected
        {
            return Err(ReclaimError::dimension_mismatch(
                "text query",
                expected,
                query.text_embedding.len(),
            ));
        }

        let candidates = self
            .store
            .search_visual(&query.visual_embedding, self.candidate_pool)?;
        debug!("visual search returned {} candidates", candidates.len());

        let object_class = query.object_class_or_unknown();
        let weights = self.fusion.weights();
        let mut matches: Vec<(u64, MatchResult)> = Vec::with_capacity(candidates.len());

        for (internal_id, visual_score) in candidates {
            let Some(item) = self.store.get_item_data(internal_id) else {
                warn!("candidate {internal_id} has no stored metadata; skipping");
                continue;
            };

            if let Some(category) = query.category_filter.as_deref()
                && item.category != category
            {
                continue;
            }

            if item.text_embedding.len() != query.text_embedding.len() {
                warn!(
                    "item {} has a text embedding of length {}, query has {}; text score is 0.0",
                    item.item_id,
                    item.text_embedding.len(),
                    query.text_embedding.len()
                );
            }
            let visual_score = f64::from(visual_score);
            let text_score = self
                .fusion
                .cosine_sim(&query.text_embedding, &item.text_embedding);
            let geo_score = self.geo.score(query.location.as_ref(), Some(&item.location));

            let final_score = self
                .fusion
                .compute_final_score(visual_score, text_score, geo_score);
            let status = self.fusion.categorize(final_score);
            if status == MatchStatus::Discard {
                continue;
            }

            matches.push((
                internal_id,
                MatchResult {
                    item_id: item.item_id.clone(),
                    final_score: round4(final_score),
                    status,
                    breakdown: MatchBreakdown {
                        visual_similarity: round4(visual_score),
                        text_similarity: round4(text_score),
                        location_score: round4(geo_score),
                    },
                    object_class: object_class.to_string(),
                    reasoning: MatchReasoning::weighted_fusion(weights),
                },
            ));
        }

        matches.sort_by(|(a_id, a), (b_id, b)| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.item_id.cmp(&b.item_id))
                .then_with(|| a_id.cmp(b_id))
        });

        Ok(matches.into_iter().map(|(_, result)| result).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{FusionConfig, FusionWeights};
    use crate::geo::GeoPoint;
    use crate::vector::store::VectorStoreConfig;

    fn nyc() -> GeoPoint {
        GeoPoint::new(40.7128, -74.0060)
    }

    fn orchestrator(store: VectorStore) -> MatchOrchestrator {
        MatchOrchestrator::with_defaults(Arc::new(store))
    }

    #[test]
    fn test_empty_store_has_no_matches() {
        let orchestrator = orchestrator(VectorStore::with_dimension(2).unwrap());
        let query = MatchQuery::new(vec![1.0, 0.0], vec![1.0]);
        assert!(orchestrator.find_matches(&query).unwrap().is_empty());
    }

    #[test]
    fn test_nyc_scenario() {
        let store = VectorStore::with_dimension(3).unwrap();
        store
            .add_item("item-a", vec![1.0, 0.0, 0.0], vec![0.0, 1.0], nyc(), "wallet")
            .unwrap();
        store
            .add_item(
                "item-b",
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0],
                GeoPoint::new(42.7128, -74.0060),
                "wallet",
            )
            .unwrap();
        let orchestrator = orchestrator(store);

        let query = MatchQuery::new(vec![1.0, 0.0, 0.0], vec![0.0, 1.0])
            .with_location(nyc())
            .with_category_filter("wallet");
        let results = orchestrator.find_matches(&query).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item_id, "item-a");
        assert_eq!(results[0].final_score, 1.0);
        assert_eq!(results[0].status, MatchStatus::Confirmed);
        assert_eq!(results[1].item_id, "item-b");
        assert_eq!(results[1].breakdown.location_score, 0.0);
        assert_eq!(results[1].final_score, 0.85);
        assert_eq!(results[1].status, MatchStatus::Review);
        assert!(results.iter().all(|r| r.object_class == "unknown"));
    }

    #[test]
    fn test_category_filter_excludes_other_categories() {
        let store = VectorStore::with_dimension(2).unwrap();
        store.add_item("keys", vec![1.0, 0.0], vec![1.0], nyc(), "keys").unwrap();
        store.add_item("wallet", vec![0.9, 0.1], vec![1.0], nyc(), "wallet").unwrap();
        let orchestrator = orchestrator(store);

        let query = MatchQuery::new(vec![1.0, 0.0], vec![1.0])
            .with_location(nyc())
            .with_category_filter("wallet");
        let results = orchestrator.find_matches(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item_id, "wallet");
    }

    #[test]
    fn test_discarded_candidates_are_dropped() {
        let store = VectorStore::with_dimension(2).unwrap();
        store.add_item("near", vec![1.0, 0.0], vec![1.0], nyc(), "bag").unwrap();
        store.add_item("orthogonal", vec![0.0, 1.0], vec![-1.0], nyc(), "bag").unwrap();
        let orchestrator = orchestrator(store);

        let query = MatchQuery::new(vec![1.0, 0.0], vec![1.0]).with_location(nyc());
        let results = orchestrator.find_matches(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|r| r.status != MatchStatus::Discard));
    }

    #[test]
    fn test_ties_break_by_item_id() {
        let store = VectorStore::with_dimension(2).unwrap();
        for id in ["zeta", "alpha", "mid", "alpha"] {
            store.add_item(id, vec![1.0, 0.0], vec![1.0], nyc(), "bag").unwrap();
        }
        let orchestrator = orchestrator(store);

        let query = MatchQuery::new(vec![1.0, 0.0], vec![1.0]).with_location(nyc());
        let ids: Vec<String> = orchestrator
            .find_matches(&query)
            .unwrap()
            .into_iter()
            .map(|r| r.item_id)
            .collect();
        assert_eq!(ids, vec!["alpha", "alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_missing_query_location_scores_zero_geo() {
        let store = VectorStore::with_dimension(2).unwrap();
        store.add_item("a", vec![1.0, 0.0], vec![1.0], nyc(), "bag").unwrap();
        let orchestrator = orchestrator(store);

        let results = orchestrator
            .find_matches(&MatchQuery::new(vec![1.0, 0.0], vec![1.0]))
            .unwrap();
        assert_eq!(results[0].breakdown.location_score, 0.0);
        assert_eq!(results[0].final_score, 0.85);
    }

    #[test]
    fn test_candidate_pool_limits_results() {
        let store = VectorStore::with_dimension(2).unwrap();
        for i in 0..10 {
            store
                .add_item(format!("item-{i}"), vec![1.0, 0.0], vec![1.0], nyc(), "bag")
                .unwrap();
        }
        let orchestrator = MatchOrchestrator::new(Arc::new(store), FusionEngine::default(), 3);
        let query = MatchQuery::new(vec![1.0, 0.0], vec![1.0]).with_location(nyc());
        assert_eq!(orchestrator.find_matches(&query).unwrap().len(), 3);
    }

    #[test]
    fn test_text_length_mismatch_per_candidate_scores_zero() {
        let store = VectorStore::with_dimension(2).unwrap();
        store.add_item("a", vec![1.0, 0.0], vec![1.0, 0.0, 0.0], nyc(), "bag").unwrap();
        let orchestrator = orchestrator(store);

        let query = MatchQuery::new(vec![1.0, 0.0], vec![1.0]).with_location(nyc());
        let results = orchestrator.find_matches(&query).unwrap();
        assert_eq!(results[0].breakdown.text_similarity, 0.0);
        assert_eq!(results[0].final_score, 0.75);
    }

    #[test]
    fn test_text_query_dimension_checked_when_configured() {
        let store = VectorStore::new(VectorStoreConfig {
            text_dimension: Some(2),
            ..VectorStoreConfig::with_dimension(2)
        })
        .unwrap();
        let orchestrator = orchestrator(store);
        let err = orchestrator
            .find_matches(&MatchQuery::new(vec![1.0, 0.0], vec![1.0]))
            .unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_visual_query_dimension_mismatch() {
        let orchestrator = orchestrator(VectorStore::with_dimension(3).unwrap());
        let err = orchestrator
            .find_matches(&MatchQuery::new(vec![1.0, 0.0], vec![]))
            .unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_reasoning_reports_configured_weights() {
        let store = VectorStore::with_dimension(2).unwrap();
        store.add_item("a", vec![1.0, 0.0], vec![1.0], nyc(), "bag").unwrap();
        let weights = FusionWeights {
            visual: 0.5,
            text: 0.3,
            geo: 0.2,
        };
        let fusion = FusionEngine::new(FusionConfig {
            weights,
            ..Default::default()
        });
        let orchestrator = MatchOrchestrator::new(Arc::new(store), fusion, 5);
        let query = MatchQuery::new(vec![1.0, 0.0], vec![1.0])
            .with_location(nyc())
            .with_object_class("backpack");
        let results = orchestrator.find_matches(&query).unwrap();
        assert_eq!(results[0].reasoning.strategy, "weighted_fusion");
        assert_eq!(results[0].reasoning.weights, weights);
        assert_eq!(results[0].object_class, "backpack");
    }
}
