//! Approximate k-nearest-neighbor search over a built index.
//!
//! ## Algorithm
//!
//! Depth-first, closer-branch-first traversal with a bounded candidate
//! buffer:
//!
//! 1. Every visited node's pivot is scored against the query once and pushed
//!    into the candidate buffer.
//! 2. When the buffer grows past `buffer_factor * k` entries it is
//!    compacted: re-ranked by similarity descending and truncated to `k`,
//!    bounding memory during traversal of large trees. The similarity of the
//!    worst retained candidate becomes the pruning bound.
//! 3. At each node, the branch on the query's side of the pivot's axis
//!    coordinate is descended first. The far branch is visited only when
//!    fewer than `k` candidates are retained, or when the axis-coordinate
//!    gap between query and pivot is smaller than `1 - worst_similarity`.
//! 4. After traversal, the whole buffer is re-ranked by similarity
//!    descending and the top `k` results are returned.
//!
//! ## Accuracy
//!
//! The pruning test compares a raw per-axis coordinate gap against a bound
//! expressed in cosine distance, so a pruned branch can, in principle, still
//! contain a truer neighbor. Results are therefore *approximate* k-NN under
//! cosine similarity. Passing `k >= corpus size` degrades to an exhaustive
//! scan re-ranked by similarity, which is exact.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::types::{IndexError, IndexResult, NodeId, SearchConfig, VectorRecord};
use super::{Index, IndexNode};
use crate::similarity::{score_query, vector_norm};

/// A search hit: the matched record together with its cosine similarity to
/// the query, in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched record
    pub record: VectorRecord,
    /// Cosine similarity between the query and the record
    pub similarity: f32,
}

/// A visited node awaiting final ranking. Similarity is computed once, at
/// visit time, and reused by every compaction.
struct Candidate {
    node: NodeId,
    similarity: f32,
}

/// Per-query traversal state. Each search allocates its own, so any number
/// of threads can traverse the shared index concurrently.
struct Traversal<'a> {
    index: &'a Index,
    query: &'a [f32],
    query_norm: f32,
    k: usize,
    capacity: usize,
    candidates: Vec<Candidate>,
    /// Similarity of the worst candidate retained by the last compaction;
    /// seeded below any real score so early traversal stays exhaustive.
    worst_retained: f32,
}

impl<'a> Traversal<'a> {
    fn visit(&mut self, node_id: NodeId) {
        let index = self.index;
        let node: &IndexNode = &index.nodes[node_id as usize];

        let similarity = score_query(self.query, self.query_norm, &node.record);
        self.candidates.push(Candidate {
            node: node_id,
            similarity,
        });

        if self.candidates.len() > self.capacity {
            self.compact();
        }

        // Descend the branch on the query's side of the pivot first; it is
        // the one more likely to contain closer points.
        let gap = self.query[node.axis] - node.record.vector[node.axis];
        let (near, far) = if gap < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near_id) = near {
            self.visit(near_id);
        }
        if let Some(far_id) = far {
            if self.candidates.len() < self.k || gap.abs() < 1.0 - self.worst_retained {
                self.visit(far_id);
            }
        }
    }

    /// Re-rank the buffer by similarity descending and keep the best k,
    /// tightening the pruning bound to the worst retained similarity.
    fn compact(&mut self) {
        rank_descending(&mut self.candidates);
        self.candidates.truncate(self.k);
        if let Some(worst) = self.candidates.last() {
            self.worst_retained = worst.similarity;
        }
    }
}

fn rank_descending(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
}

/// Core k-NN entry point; see [`Index::search`] for the public contract.
pub(crate) fn search_tree(
    index: &Index,
    query: &[f32],
    k: usize,
    config: &SearchConfig,
) -> IndexResult<Vec<SearchResult>> {
    if k == 0 {
        return Err(IndexError::InvalidK { k });
    }
    config.validate()?;

    // An empty index degrades to an empty result for any query.
    let Some(root) = index.root else {
        return Ok(Vec::new());
    };

    // Fail fast on dimensionality mismatch, never truncate or pad.
    if query.len() != index.dimension {
        return Err(IndexError::DimensionMismatch {
            expected: index.dimension,
            actual: query.len(),
        });
    }

    let mut traversal = Traversal {
        index,
        query,
        query_norm: vector_norm(query),
        k,
        capacity: config.buffer_factor.max(1) * k,
        candidates: Vec::new(),
        worst_retained: -1.0,
    };
    traversal.visit(root);

    let mut candidates = traversal.candidates;
    log::debug!(
        "🔎 k-NN traversal retained {} candidates for k={}",
        candidates.len(),
        k
    );

    rank_descending(&mut candidates);
    if let Some(threshold) = config.min_similarity {
        candidates.retain(|c| c.similarity >= threshold);
    }
    candidates.truncate(k);

    Ok(candidates
        .into_iter()
        .map(|c| SearchResult {
            record: index.nodes[c.node as usize].record.clone(),
            similarity: c.similarity,
        })
        .collect())
}

/// Fan a batch of independent queries out across the rayon pool. The index
/// is shared read-only state; every query owns its private traversal buffer.
pub(crate) fn batch_search_tree(
    index: &Index,
    queries: &[Vec<f32>],
    k: usize,
    config: &SearchConfig,
) -> IndexResult<Vec<Vec<SearchResult>>> {
    queries
        .par_iter()
        .map(|query| search_tree(index, query, k, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::Corpus;

    fn record(id: u64, vector: Vec<f32>) -> VectorRecord {
        VectorRecord::new(id, format!("record_{}", id), vector).unwrap()
    }

    fn build_index(records: Vec<VectorRecord>) -> Index {
        Index::build(&Corpus::from_records(records).unwrap())
    }

    #[test]
    fn test_search_rejects_zero_k() {
        let index = build_index(vec![record(1, vec![1.0, 0.0])]);
        let result = index.search(&[1.0, 0.0], 0);
        assert_eq!(result.map(|_| ()), Err(IndexError::InvalidK { k: 0 }));
    }

    #[test]
    fn test_search_rejects_dimension_mismatch() {
        let index = build_index(vec![record(1, vec![1.0, 0.0, 0.0])]);
        let result = index.search(&[1.0, 0.0], 5);
        assert_eq!(
            result.map(|_| ()),
            Err(IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_empty_index_returns_empty_for_any_query() {
        let index = Index::build(&Corpus::default());
        let results = index.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_identical_query_ranks_first_with_unit_similarity() {
        let index = build_index(vec![
            record(1, vec![0.9, 0.1, 0.3]),
            record(2, vec![0.1, 0.8, 0.2]),
            record(3, vec![0.4, 0.4, 0.7]),
        ]);

        let results = index.search(&[0.1, 0.8, 0.2], 3).unwrap();
        assert_eq!(results[0].record.id, 2);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_results_are_ranked_and_bounded() {
        let records: Vec<_> = (0..50)
            .map(|i| {
                record(
                    i,
                    vec![
                        (i % 7) as f32 * 0.1,
                        (i % 5) as f32 * 0.2,
                        (i % 3) as f32 * 0.3,
                    ],
                )
            })
            .collect();
        let index = build_index(records);

        let results = index.search(&[0.3, 0.4, 0.5], 10).unwrap();
        assert!(results.len() <= 10);
        for pair in results.windows(2) {
            assert!(
                pair[0].similarity >= pair[1].similarity,
                "results must be non-increasing in similarity"
            );
        }
    }

    #[test]
    fn test_no_duplicate_records_in_results() {
        let records: Vec<_> = (0..30)
            .map(|i| record(i, vec![(i as f32 * 0.37).sin().abs(), (i as f32 * 0.91).cos().abs()]))
            .collect();
        let index = build_index(records);

        let results = index.search(&[0.5, 0.5], 30).unwrap();
        let mut ids: Vec<u64> = results.iter().map(|r| r.record.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), results.len());
    }

    #[test]
    fn test_k_exceeding_corpus_returns_full_ranked_corpus() {
        let index = build_index(vec![
            record(1, vec![1.0, 0.0]),
            record(2, vec![0.0, 1.0]),
            record(3, vec![0.5, 0.5]),
        ]);

        let results = index.search(&[1.0, 0.0], 100).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].record.id, 1);
    }

    #[test]
    fn test_buffer_compaction_preserves_contract() {
        // buffer_factor 1 forces a compaction on nearly every visit.
        let records: Vec<_> = (0..40)
            .map(|i| record(i, vec![(i % 8) as f32 * 0.125, (i % 6) as f32 * 0.2]))
            .collect();
        let index = build_index(records);

        let config = SearchConfig {
            buffer_factor: 1,
            min_similarity: None,
        };
        let results = index.search_with_config(&[0.6, 0.4], 5, &config).unwrap();

        assert!(results.len() <= 5);
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_min_similarity_filters_results() {
        let index = build_index(vec![
            record(1, vec![1.0, 0.0]),
            record(2, vec![0.0, 1.0]),
            record(3, vec![0.9, 0.1]),
        ]);

        let config = SearchConfig {
            min_similarity: Some(0.5),
            ..SearchConfig::default()
        };
        let results = index.search_with_config(&[1.0, 0.0], 3, &config).unwrap();

        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.similarity >= 0.5);
        }
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let index = build_index(vec![record(1, vec![1.0, 0.0])]);
        let config = SearchConfig {
            min_similarity: Some(-2.0),
            ..SearchConfig::default()
        };

        let result = index.search_with_config(&[1.0, 0.0], 1, &config);
        assert_eq!(
            result.map(|_| ()),
            Err(IndexError::InvalidThreshold { threshold: -2.0 })
        );
    }

    #[test]
    fn test_batch_search_matches_single_queries() {
        let records: Vec<_> = (0..25)
            .map(|i| record(i, vec![(i % 5) as f32 * 0.2, (i % 4) as f32 * 0.25, 0.1]))
            .collect();
        let index = build_index(records);

        let queries = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.3, 0.3, 0.3],
        ];
        let batch = index.batch_search(&queries, 4).unwrap();

        assert_eq!(batch.len(), queries.len());
        for (query, batch_results) in queries.iter().zip(&batch) {
            let single = index.search(query, 4).unwrap();
            let ids = |rs: &[SearchResult]| rs.iter().map(|r| r.record.id).collect::<Vec<_>>();
            assert_eq!(ids(batch_results), ids(&single));
        }
    }

    #[test]
    fn test_batch_search_surfaces_errors() {
        let index = build_index(vec![record(1, vec![1.0, 0.0])]);
        let queries = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];

        assert!(index.batch_search(&queries, 1).is_err());
    }
}
