//! Core vector data structure.

use serde::{Deserialize, Serialize};

use crate::error::{ReclaimError, Result};

/// A dense embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The vector dimensions as floating point values.
    pub data: Vec<f32>,
}

impl Vector {
    /// Create a new vector with the given dimensions.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimensionality of this vector.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Calculate the L2 norm (magnitude) of this vector.
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Normalize this vector to unit length.
    ///
    /// A zero vector has no direction and is left untouched.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.data {
                *value /= norm;
            }
        }
    }

    /// Get a normalized copy of this vector.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized
    }

    /// Consume the vector, returning it normalized.
    pub fn into_normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| *x == 0.0)
    }

    /// Validate that this vector has the expected dimension.
    pub fn validate_dimension(&self, context: &str, expected_dim: usize) -> Result<()> {
        if self.data.len() != expected_dim {
            return Err(ReclaimError::dimension_mismatch(
                context,
                expected_dim,
                self.data.len(),
            ));
        }
        Ok(())
    }

    /// Check if this vector contains any NaN or infinite values.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Dimension and value checks combined, as done on every insert and query.
    pub fn validate(&self, context: &str, expected_dim: usize) -> Result<()> {
        self.validate_dimension(context, expected_dim)?;
        if !self.is_valid() {
            return Err(ReclaimError::invalid_argument(format!(
                "{context} contains NaN or infinite values"
            )));
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}
