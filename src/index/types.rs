use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::similarity::vector_norm;

/// Opaque identifier for a record within a corpus.
pub type RecordId = u64;

/// Index of a node within the index arena.
pub type NodeId = u32;

/// Floor applied to Euclidean norms so that all-zero vectors can never cause
/// a division by zero during similarity scoring.
pub const NORM_EPSILON: f32 = 1e-10;

/// Errors that can occur during corpus construction and index queries
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexError {
    #[error("Vector dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid k value: {k} (must be greater than 0)")]
    InvalidK { k: usize },

    #[error("Similarity threshold out of range: {threshold} (must be between -1.0 and 1.0)")]
    InvalidThreshold { threshold: f32 },

    #[error("Record {id} has an empty vector")]
    EmptyVector { id: RecordId },

    #[error("Record {id} contains a non-finite value at position {position}")]
    NonFiniteComponent { id: RecordId, position: usize },

    #[error("Duplicate record id in corpus: {id}")]
    DuplicateId { id: RecordId },
}

pub type IndexResult<T> = Result<T, IndexError>;

/// A single corpus entry: a fixed-width tag genome vector with its
/// precomputed Euclidean norm.
///
/// The norm is computed exactly once at construction and floored to
/// [`NORM_EPSILON`], so similarity scoring never recomputes magnitudes and
/// never divides by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier for this record
    pub id: RecordId,
    /// Display label (e.g. a title) carried through to search results
    pub label: String,
    /// The feature vector; same length for every record in a corpus
    pub vector: Vec<f32>,
    /// Precomputed Euclidean norm of `vector`, floored to [`NORM_EPSILON`]
    pub norm: f32,
}

impl VectorRecord {
    /// Create a new record, validating the vector and precomputing its norm.
    ///
    /// # Errors
    ///
    /// * `EmptyVector` - if the vector has no components
    /// * `NonFiniteComponent` - if any component is NaN or infinite
    pub fn new(id: RecordId, label: impl Into<String>, vector: Vec<f32>) -> IndexResult<Self> {
        if vector.is_empty() {
            return Err(IndexError::EmptyVector { id });
        }

        for (position, &value) in vector.iter().enumerate() {
            if !value.is_finite() {
                return Err(IndexError::NonFiniteComponent { id, position });
            }
        }

        let norm = vector_norm(&vector);

        Ok(Self {
            id,
            label: label.into(),
            vector,
            norm,
        })
    }

    /// Number of components in the record's vector
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// An immutable collection of validated, uniform-dimensionality records.
///
/// Built once by an external loader, then handed to
/// [`Index::build`](crate::Index::build). The corpus is read-only from the
/// index's perspective; rebuilding an index means constructing a new corpus
/// snapshot and a new index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    records: HashMap<RecordId, VectorRecord>,
    dimension: Option<usize>,
}

impl Corpus {
    /// Build a corpus from a collection of records.
    ///
    /// The first record fixes the corpus dimensionality; every subsequent
    /// record must match it exactly. Ids must be unique.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` - if a record's vector length differs from the
    ///   first record's
    /// * `DuplicateId` - if two records share an id
    pub fn from_records(records: impl IntoIterator<Item = VectorRecord>) -> IndexResult<Self> {
        let mut corpus = Self::default();

        for record in records {
            match corpus.dimension {
                None => corpus.dimension = Some(record.dimension()),
                Some(expected) if expected != record.dimension() => {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        actual: record.dimension(),
                    });
                }
                Some(_) => {}
            }

            if corpus.records.contains_key(&record.id) {
                return Err(IndexError::DuplicateId { id: record.id });
            }
            corpus.records.insert(record.id, record);
        }

        Ok(corpus)
    }

    /// Look up a record by id
    pub fn get(&self, id: RecordId) -> Option<&VectorRecord> {
        self.records.get(&id)
    }

    /// Iterate over all records (iteration order is unspecified)
    pub fn records(&self) -> impl Iterator<Item = &VectorRecord> {
        self.records.values()
    }

    /// Vector dimensionality shared by every record, `None` when empty
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of records in the corpus
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Configuration for k-nearest-neighbor search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Candidate buffer capacity as a multiple of k; the buffer is compacted
    /// back down to k whenever it grows past `buffer_factor * k`
    pub buffer_factor: usize,
    /// Optional minimum similarity; results below this are filtered out
    pub min_similarity: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            buffer_factor: 2,
            min_similarity: None,
        }
    }
}

impl SearchConfig {
    pub(crate) fn validate(&self) -> IndexResult<()> {
        if let Some(threshold) = self.min_similarity {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(IndexError::InvalidThreshold { threshold });
            }
        }
        Ok(())
    }
}

/// Statistics about a built index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of records held in the tree
    pub record_count: usize,
    /// Vector dimensionality of the indexed corpus
    pub dimension: usize,
    /// Depth of the partitioning tree (0 for an empty index)
    pub depth: usize,
}

impl IndexStats {
    /// Generate a human-readable summary of the index
    pub fn summary(&self) -> String {
        format!(
            "Index Stats: {} records, {} dimensions, depth {}",
            self.record_count, self.dimension, self.depth
        )
    }
}
