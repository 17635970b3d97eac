//! Core data structures for vector search.
//!
//! Vector representation and the inner product kernels used by the
//! visual scan and the text signal.

pub mod distance;
pub mod vector;
