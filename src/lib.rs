//! Approximate k-nearest-neighbor similarity index over tag genome vectors.
//!
//! This crate answers "which items are most similar to X" over a fixed
//! corpus of high-dimensional feature vectors, with similarity defined as
//! the cosine of the angle between vectors. It provides:
//!
//! - [`Corpus`] / [`VectorRecord`]: validated fixed-width vectors with
//!   precomputed norms
//! - [`cosine_similarity`]: the pure similarity scorer
//! - [`Index::build`]: one-time construction of a balanced median-split
//!   space-partitioning tree
//! - [`Index::search`]: approximate k-NN traversal with branch pruning,
//!   re-ranked by cosine similarity
//!
//! Dataset parsing, query resolution, and serving are external concerns;
//! the crate consumes already-validated vectors and returns ranked records.
//!
//! # Example
//!
//! ```
//! use similarity_index::{Corpus, Index, VectorRecord};
//!
//! let corpus = Corpus::from_records(vec![
//!     VectorRecord::new(1, "The Matrix", vec![1.0, 0.0, 0.0])?,
//!     VectorRecord::new(2, "Blade Runner", vec![0.9, 0.1, 0.0])?,
//!     VectorRecord::new(3, "Toy Story", vec![0.0, 1.0, 0.0])?,
//! ])?;
//!
//! let index = Index::build(&corpus);
//! let results = index.search(&[1.0, 0.0, 0.0], 2)?;
//!
//! assert_eq!(results[0].record.label, "The Matrix");
//! assert_eq!(results[1].record.label, "Blade Runner");
//! # Ok::<(), similarity_index::IndexError>(())
//! ```

// Module declarations
pub mod index;
pub mod similarity;

// Re-exports for commonly used types
pub use index::types::{
    Corpus, IndexError, IndexResult, IndexStats, RecordId, SearchConfig, VectorRecord,
    NORM_EPSILON,
};
pub use index::{Index, SearchResult};
pub use similarity::{cosine_similarity, vector_norm};
