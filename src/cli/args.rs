//! Command line argument parsing for the Reclaim CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::ReclaimConfig;
use crate::vector::store::{DuplicatePolicy, SnapshotFormat};

/// Reclaim - visual, textual and spatial matching for lost & found catalogs
#[derive(Parser, Debug, Clone)]
#[command(name = "reclaim")]
#[command(about = "Match lost items against a catalog of found items")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ReclaimArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ReclaimArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Configuration values settable from flags or the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Weight of the visual signal
    #[arg(long, env = "WEIGHT_VISUAL", global = true)]
    pub weight_visual: Option<f64>,

    /// Weight of the text signal
    #[arg(long, env = "WEIGHT_TEXT", global = true)]
    pub weight_text: Option<f64>,

    /// Weight of the location signal
    #[arg(long, env = "WEIGHT_GEO", global = true)]
    pub weight_geo: Option<f64>,

    /// Minimum fused score for a confirmed match
    #[arg(long, env = "THRESHOLD_CONFIRMED", global = true)]
    pub threshold_confirmed: Option<f64>,

    /// Minimum fused score for human review
    #[arg(long, env = "THRESHOLD_REVIEW", global = true)]
    pub threshold_review: Option<f64>,

    /// Visual candidates fetched per query
    #[arg(long, env = "CANDIDATE_POOL", global = true)]
    pub candidate_pool: Option<usize>,

    /// Visual embedding dimension (used when creating a catalog)
    #[arg(long, env = "EMBEDDING_DIMENSION", global = true)]
    pub dimension: Option<usize>,

    /// Text embedding dimension (used when creating a catalog)
    #[arg(long, env = "TEXT_EMBEDDING_DIMENSION", global = true)]
    pub text_dimension: Option<usize>,
}

impl ConfigOverrides {
    /// Overwrite the fields of `config` that were given.
    pub fn apply(&self, config: &mut ReclaimConfig) {
        if let Some(v) = self.weight_visual {
            config.weight_visual = v;
        }
        if let Some(v) = self.weight_text {
            config.weight_text = v;
        }
        if let Some(v) = self.weight_geo {
            config.weight_geo = v;
        }
        if let Some(v) = self.threshold_confirmed {
            config.threshold_confirmed = v;
        }
        if let Some(v) = self.threshold_review {
            config.threshold_review = v;
        }
        if let Some(v) = self.candidate_pool {
            config.candidate_pool = v;
        }
        if let Some(v) = self.dimension {
            config.dimension = v;
        }
        if self.text_dimension.is_some() {
            config.text_dimension = self.text_dimension;
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an empty catalog in a data directory
    Init(InitArgs),

    /// Index precomputed embeddings from a JSONL file
    Ingest(IngestArgs),

    /// Match a query against the catalog
    Match(MatchArgs),

    /// Show catalog statistics
    Stats(StatsArgs),

    /// Score the proximity of two coordinates
    #[command(name = "geo-score")]
    GeoScore(GeoScoreArgs),
}

/// Arguments for creating a catalog
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Path to the data directory
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Configuration file (JSON) to start from
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Snapshot encoding
    #[arg(long, value_enum)]
    pub snapshot_format: Option<SnapshotFormatArg>,

    /// Reject item ids that are already indexed
    #[arg(long)]
    pub reject_duplicates: bool,

    /// Overwrite an existing catalog
    #[arg(long)]
    pub force: bool,
}

/// Arguments for indexing items
#[derive(Parser, Debug, Clone)]
pub struct IngestArgs {
    /// Path to the data directory
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Item file, one JSON record per line
    #[arg(value_name = "ITEMS_FILE")]
    pub items_file: PathBuf,

    /// Stop at the first record that fails instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for matching
#[derive(Parser, Debug, Clone)]
pub struct MatchArgs {
    /// Path to the data directory
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Query file (JSON)
    #[arg(value_name = "QUERY_FILE")]
    pub query_file: PathBuf,

    /// Maximum number of results to print
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Path to the data directory
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,
}

/// Arguments for scoring two coordinates
#[derive(Parser, Debug, Clone)]
#[command(allow_negative_numbers = true)]
pub struct GeoScoreArgs {
    /// Latitude of the first point
    pub lat1: f64,
    /// Longitude of the first point
    pub lng1: f64,
    /// Latitude of the second point
    pub lat2: f64,
    /// Longitude of the second point
    pub lng2: f64,
}

/// Snapshot encodings selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormatArg {
    Json,
    Bincode,
}

impl From<SnapshotFormatArg> for SnapshotFormat {
    fn from(arg: SnapshotFormatArg) -> Self {
        match arg {
            SnapshotFormatArg::Json => SnapshotFormat::Json,
            SnapshotFormatArg::Bincode => SnapshotFormat::Bincode,
        }
    }
}

impl InitArgs {
    /// Duplicate policy selected by the flags.
    pub fn duplicate_policy(&self) -> Option<DuplicatePolicy> {
        self.reject_duplicates.then_some(DuplicatePolicy::Reject)
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
