//! Inner product kernels used by the visual scan and the text signal.

use rayon::prelude::*;
use wide::f32x8;

/// Below this many rows a scan stays on the calling thread.
pub const PARALLEL_SCAN_THRESHOLD: usize = 1024;

/// Inner product of two equally sized slices.
///
/// Processes eight lanes at a time and folds the remainder in scalar code.
/// Slices of different length are compared over their common prefix; callers
/// validate dimensions before reaching this point.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);

    let a_chunks = a.chunks_exact(8);
    let b_chunks = b.chunks_exact(8);
    let a_rem = a_chunks.remainder();
    let b_rem = b_chunks.remainder();

    let mut acc = f32x8::ZERO;
    for (x, y) in a_chunks.zip(b_chunks) {
        let xv = f32x8::new([x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]]);
        let yv = f32x8::new([y[0], y[1], y[2], y[3], y[4], y[5], y[6], y[7]]);
        acc = acc + xv * yv;
    }

    let tail: f32 = a_rem.iter().zip(b_rem.iter()).map(|(x, y)| x * y).sum();
    acc.reduce_add() + tail
}

/// Cosine similarity of two vectors that are already L2-normalized.
///
/// No re-normalization happens here. Mismatched lengths, zero vectors and
/// non-finite results score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    if a.iter().all(|x| *x == 0.0) || b.iter().all(|x| *x == 0.0) {
        return 0.0;
    }

    let score = f64::from(inner_product(a, b));
    if score.is_finite() { score } else { 0.0 }
}

/// Score a query against many rows, in parallel once the batch is large.
pub fn batch_inner_product_parallel(query: &[f32], rows: &[&[f32]]) -> Vec<f32> {
    if rows.len() < PARALLEL_SCAN_THRESHOLD {
        return rows.iter().map(|row| inner_product(query, row)).collect();
    }

    rows.par_iter()
        .map(|row| inner_product(query, row))
        .collect()
}
