//! Command implementations for the Reclaim CLI.
//!
//! Every catalog command works on a data directory holding the
//! configuration (`reclaim.json`) and one store snapshot.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::ReclaimConfig;
use crate::error::{ReclaimError, Result};
use crate::fusion::FusionEngine;
use crate::geo::{GeoPoint, GeoScorer};
use crate::matching::{MatchOrchestrator, MatchQuery};
use crate::storage::Storage;
use crate::storage::file::FileStorage;
use crate::vector::store::{SnapshotFormat, VectorStore};

/// One line of an ingest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRecord {
    /// Generated when absent.
    #[serde(default)]
    pub item_id: Option<String>,
    pub visual_embedding: Vec<f32>,
    pub text_embedding: Vec<f32>,
    pub location: GeoPoint,
    pub category: String,
}

/// Execute a CLI command.
pub fn execute_command(args: ReclaimArgs) -> Result<()> {
    match &args.command {
        Command::Init(init_args) => init_catalog(init_args, &args),
        Command::Ingest(ingest_args) => ingest_items(ingest_args, &args),
        Command::Match(match_args) => match_query(match_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
        Command::GeoScore(geo_args) => geo_score(geo_args, &args),
    }
}

/// Load the stored configuration with command line overrides applied.
fn load_config(storage: &dyn Storage, cli_args: &ReclaimArgs) -> Result<ReclaimConfig> {
    let mut config = ReclaimConfig::load(storage)?;
    cli_args.overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load the catalog snapshot of a data directory.
fn load_store(storage: &dyn Storage, config: &ReclaimConfig) -> Result<VectorStore> {
    let format = SnapshotFormat::detect(storage).ok_or_else(|| {
        ReclaimError::not_found("catalog snapshot (run `reclaim init` first)")
    })?;
    VectorStore::load(storage, format, config.duplicate_policy)
}

/// Create an empty catalog.
fn init_catalog(args: &InitArgs, cli_args: &ReclaimArgs) -> Result<()> {
    let storage = FileStorage::new(&args.data_dir)?;

    if SnapshotFormat::detect(&storage).is_some() && !args.force {
        return Err(ReclaimError::invalid_argument(
            "a catalog already exists in this directory; use --force to overwrite",
        ));
    }

    let mut config = match &args.config {
        Some(path) => {
            debug!("loading configuration from {}", path.display());
            ReclaimConfig::from_file(path)?
        }
        None => ReclaimConfig::default(),
    };
    cli_args.overrides.apply(&mut config);
    if let Some(format) = args.snapshot_format {
        config.snapshot_format = format.into();
    }
    if let Some(policy) = args.duplicate_policy() {
        config.duplicate_policy = policy;
    }
    config.validate()?;

    for format in [SnapshotFormat::Json, SnapshotFormat::Bincode] {
        storage.delete_file(format.file_name())?;
    }

    let store = VectorStore::new(config.to_store_config())?;
    store.save(&storage, config.snapshot_format)?;
    config.save(&storage)?;

    output_result(
        "Catalog created successfully",
        &InitResult {
            path: args.data_dir.to_string_lossy().to_string(),
            dimension: store.dimension(),
            text_dimension: store.text_dimension(),
            snapshot_file: config.snapshot_format.file_name().to_string(),
        },
        cli_args,
    )
}

/// Index every record of a JSONL file and save the catalog.
fn ingest_items(args: &IngestArgs, cli_args: &ReclaimArgs) -> Result<()> {
    let storage = FileStorage::new(&args.data_dir)?;
    let config = load_config(&storage, cli_args)?;
    let store = load_store(&storage, &config)?;

    let start_time = Instant::now();
    let mut items_added = 0;
    let mut items_skipped = 0;

    let reader = BufReader::new(File::open(&args.items_file)?);
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = serde_json::from_str::<IngestRecord>(&line)
            .map_err(ReclaimError::from)
            .and_then(|record| {
                let item_id = record
                    .item_id
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                store.add_item(
                    item_id,
                    record.visual_embedding,
                    record.text_embedding,
                    record.location,
                    record.category,
                )
            });

        match outcome {
            Ok(internal_id) => {
                debug!("line {} indexed as {internal_id}", line_num + 1);
                items_added += 1;
            }
            Err(e) if args.strict => {
                return Err(ReclaimError::invalid_argument(format!(
                    "line {}: {e}",
                    line_num + 1
                )));
            }
            Err(e) => {
                warn!("skipping line {}: {e}", line_num + 1);
                items_skipped += 1;
            }
        }
    }

    store.save(&storage, config.snapshot_format)?;

    output_result(
        "Items indexed",
        &IngestSummary {
            items_added,
            items_skipped,
            total_items: store.len(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Match a query file against the catalog.
fn match_query(args: &MatchArgs, cli_args: &ReclaimArgs) -> Result<()> {
    let response = run_match(args, cli_args)?;
    output_result("Match results", &response, cli_args)
}

fn run_match(args: &MatchArgs, cli_args: &ReclaimArgs) -> Result<MatchResponse> {
    let storage = FileStorage::new(&args.data_dir)?;
    let config = load_config(&storage, cli_args)?;
    let store = Arc::new(load_store(&storage, &config)?);

    let query = read_query(&args.query_file)?;

    let start_time = Instant::now();
    let orchestrator = MatchOrchestrator::new(
        store,
        FusionEngine::new(config.to_fusion_config()),
        config.candidate_pool,
    );
    let mut matches = orchestrator.find_matches(&query)?;
    if let Some(limit) = args.limit {
        matches.truncate(limit);
    }

    Ok(MatchResponse {
        matches,
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}

fn read_query(path: &Path) -> Result<MatchQuery> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Show catalog statistics.
fn show_stats(args: &StatsArgs, cli_args: &ReclaimArgs) -> Result<()> {
    let storage = FileStorage::new(&args.data_dir)?;
    let config = load_config(&storage, cli_args)?;
    let store = load_store(&storage, &config)?;
    let stats = store.stats();

    let snapshot_bytes = match SnapshotFormat::detect(&storage) {
        Some(format) => storage.file_size(format.file_name())?,
        None => 0,
    };

    output_result(
        "Catalog statistics",
        &CatalogStats {
            items: stats.items,
            distinct_item_ids: stats.distinct_item_ids,
            dimension: stats.dimension,
            text_dimension: stats.text_dimension,
            categories: stats.categories,
            snapshot_bytes,
            model_version: config.model_version,
        },
        cli_args,
    )
}

/// Score two coordinates.
fn geo_score(args: &GeoScoreArgs, cli_args: &ReclaimArgs) -> Result<()> {
    let a = GeoPoint::new(args.lat1, args.lng1);
    let b = GeoPoint::new(args.lat2, args.lng2);
    let scorer = GeoScorer::new();

    output_result(
        "Location score",
        &GeoScoreResult {
            distance_km: a.distance_to(&b),
            score: scorer.score_points(&a, &b),
        },
        cli_args,
    )
}
