//! Detection and embedding collaborators, and the pipeline that drives them.
//!
//! The models themselves live outside this crate. This module defines the
//! interfaces they implement and [`MatchService`], which wires them to the
//! store and the orchestrator.

pub mod detector;
pub mod embedder;
pub mod pipeline;

pub use detector::{BoundingBox, DetectionResult, DetectorConfig, ImageData, ObjectDetector};
pub use embedder::Embedder;
pub use pipeline::{IngestOutcome, IngestRequest, MatchRequest, MatchService};
