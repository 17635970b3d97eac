//! Embedding interface for images and descriptions.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::processing::detector::ImageData;

/// Maps images and text into a shared similarity space.
///
/// Both methods return unit-length vectors. Image embeddings have the
/// store's visual dimension; text embeddings have a fixed dimension of their
/// own, which may differ.
///
/// # Custom implementation
///
/// ```
/// use async_trait::async_trait;
/// use reclaim::error::Result;
/// use reclaim::processing::{Embedder, ImageData};
///
/// #[derive(Debug)]
/// struct ConstantEmbedder;
///
/// #[async_trait]
/// impl Embedder for ConstantEmbedder {
///     async fn image_embedding(&self, _image: &ImageData) -> Result<Vec<f32>> {
///         Ok(vec![1.0, 0.0])
///     }
///
///     async fn text_embedding(&self, _text: &str) -> Result<Vec<f32>> {
///         Ok(vec![0.0, 1.0])
///     }
/// }
/// ```
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    /// Embed a (usually cropped) image.
    async fn image_embedding(&self, image: &ImageData) -> Result<Vec<f32>>;

    /// Embed a free-text description.
    async fn text_embedding(&self, text: &str) -> Result<Vec<f32>>;
}
