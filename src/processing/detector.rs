//! Object detection interface and crop geometry.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ReclaimError, Result};

/// A decoded image handed from the detector to the embedder.
///
/// Pixel layout is a contract between the two collaborators; the pipeline
/// only moves the buffer along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Axis-aligned box in pixel coordinates, `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    /// Create a box, rejecting inverted corners.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self> {
        if x2 < x1 || y2 < y1 {
            return Err(ReclaimError::invalid_argument(format!(
                "inverted bounding box ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Grow the box by `pct` of its own size on every side, clamped to an
    /// image of `image_width` x `image_height`. Padding is truncated to
    /// whole pixels.
    pub fn padded(&self, pct: f64, image_width: u32, image_height: u32) -> Self {
        let pad_x = (f64::from(self.width()) * pct.max(0.0)) as u32;
        let pad_y = (f64::from(self.height()) * pct.max(0.0)) as u32;
        Self {
            x1: self.x1.saturating_sub(pad_x),
            y1: self.y1.saturating_sub(pad_y),
            x2: self.x2.saturating_add(pad_x).min(image_width),
            y2: self.y2.saturating_add(pad_y).min(image_height),
        }
    }
}

/// The primary object found in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Detector tuning shared by implementations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Detections below this confidence are ignored.
    pub confidence_threshold: f32,
    /// Padding added around the primary box before cropping.
    pub crop_padding_pct: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            crop_padding_pct: 0.10,
        }
    }
}

impl DetectorConfig {
    /// Pick the primary detection: highest confidence at or above the
    /// threshold. Earlier detections win ties.
    pub fn select_primary<I>(&self, detections: I) -> Option<DetectionResult>
    where
        I: IntoIterator<Item = DetectionResult>,
    {
        detections
            .into_iter()
            .filter(|d| d.confidence.is_finite() && d.confidence >= self.confidence_threshold)
            .fold(None, |best: Option<DetectionResult>, candidate| match best {
                Some(b) if b.confidence >= candidate.confidence => Some(b),
                _ => Some(candidate),
            })
    }
}

/// Locates the primary object of an image and crops to it.
///
/// Implementations return the full image together with `None` when nothing
/// is detected.
#[async_trait]
pub trait ObjectDetector: Send + Sync + Debug {
    async fn detect_and_crop(&self, image: &[u8]) -> Result<(ImageData, Option<DetectionResult>)>;
}
