//! Cosine Similarity Scorer
//!
//! This module implements the core mathematics of the similarity index:
//! Euclidean norms and cosine similarity between tag genome vectors.
//!
//! ## Mathematical Foundation
//!
//! Cosine similarity measures the cosine of the angle between two
//! n-dimensional vectors:
//!
//! ```text
//! cosine_similarity(A, B) = (A · B) / (||A|| * ||B||)
//! ```
//!
//! It is well-suited for tag genome vectors because it normalizes for
//! magnitude, comparing the direction of relevance scores rather than their
//! absolute values.
//!
//! **Properties:**
//! - Range: [-1, 1] where 1 = identical direction, 0 = orthogonal,
//!   -1 = opposite direction
//! - Symmetric: `cosine_similarity(A, B) == cosine_similarity(B, A)`
//! - Scale invariant: `cosine_similarity(kA, B) == cosine_similarity(A, B)`
//!   for k > 0
//!
//! ## Precomputed Norms
//!
//! Every [`VectorRecord`] carries its Euclidean norm, computed exactly once
//! when the record is constructed and floored to [`NORM_EPSILON`] so that an
//! all-zero vector can never cause a division by zero. Scoring a record pair
//! is therefore a single dot-product pass, O(n) in the vector dimension with
//! no per-query norm recomputation over the corpus.

use crate::index::types::{VectorRecord, NORM_EPSILON};

/// Compute the Euclidean norm (magnitude) of a vector, floored to
/// [`NORM_EPSILON`].
///
/// The floor guarantees that similarity computations never divide by zero:
/// a true zero vector gets an epsilon norm, and its dot product with anything
/// is zero, so its similarity to every query is exactly `0.0`.
pub fn vector_norm(vector: &[f32]) -> f32 {
    let sum_squares: f32 = vector.iter().map(|v| v * v).sum();
    sum_squares.sqrt().max(NORM_EPSILON)
}

/// Calculate cosine similarity between two records using their precomputed
/// norms.
///
/// Returns a score in `[-1.0, 1.0]`. If either record's norm sits at the
/// epsilon floor (a degenerate zero vector), the result is exactly `0.0`,
/// a defensive fallback rather than a meaningful similarity.
///
/// Both records must come from the same corpus and therefore share a
/// dimension; this is a structural invariant of [`Corpus`](crate::Corpus)
/// construction, not re-validated per call.
///
/// # Example
///
/// ```
/// use similarity_index::{cosine_similarity, VectorRecord};
///
/// let a = VectorRecord::new(1, "a", vec![1.0, 0.0]).unwrap();
/// let b = VectorRecord::new(2, "b", vec![1.0, 0.0]).unwrap();
/// assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
/// ```
pub fn cosine_similarity(a: &VectorRecord, b: &VectorRecord) -> f32 {
    debug_assert_eq!(a.vector.len(), b.vector.len());

    // Degenerate zero vectors have no direction; score them as 0.
    if a.norm <= NORM_EPSILON || b.norm <= NORM_EPSILON {
        return 0.0;
    }

    let dot_product: f32 = a
        .vector
        .iter()
        .zip(b.vector.iter())
        .map(|(x, y)| x * y)
        .sum();

    // The result is mathematically in [-1, 1], but floating-point rounding
    // can push it slightly outside. Clamp to keep the contract exact.
    (dot_product / (a.norm * b.norm)).clamp(-1.0, 1.0)
}

/// Score a raw query vector against a record, using the record's precomputed
/// norm and a caller-supplied query norm.
///
/// The query norm is computed once per search (see
/// [`Index::search`](crate::Index::search)) and reused across every node
/// visited during traversal.
pub(crate) fn score_query(query: &[f32], query_norm: f32, record: &VectorRecord) -> f32 {
    debug_assert_eq!(query.len(), record.vector.len());

    if query_norm <= NORM_EPSILON || record.norm <= NORM_EPSILON {
        return 0.0;
    }

    let dot_product: f32 = query
        .iter()
        .zip(record.vector.iter())
        .map(|(x, y)| x * y)
        .sum();

    (dot_product / (query_norm * record.norm)).clamp(-1.0, 1.0)
}
