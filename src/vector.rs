//! Exact nearest-neighbor search over normalized visual embeddings.
//!
//! # Module Structure
//!
//! - `core`: vector representation and inner product kernels
//! - `store`: the append-only [`VectorStore`] and its snapshot format

pub mod core;
pub mod store;

pub use self::core::distance::{cosine_similarity, inner_product};
pub use self::core::vector::Vector;
pub use self::store::{
    DuplicatePolicy, IndexedItem, VectorStore, VectorStoreConfig, VectorStoreStats,
};
