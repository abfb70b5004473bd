//! In-Memory Similarity Index
//!
//! This module holds the space-partitioning index over a corpus of tag
//! genome vectors and its approximate k-nearest-neighbor search:
//!
//! - [`types`]: records, corpus, errors, and search configuration
//! - [`builder`]: one-time tree construction from a corpus snapshot
//! - [`search`]: per-query traversal with branch pruning and re-ranking
//!
//! ## Lifecycle
//!
//! An external loader produces a [`Corpus`] once; [`Index::build`] consumes
//! a snapshot of it at startup and produces an immutable [`Index`]. Every
//! incoming query then traverses the shared index through
//! [`Index::search`], and results are ranked by the
//! [similarity scorer](crate::similarity). No operation mutates a built
//! index; rebuilding means constructing a new one from a new corpus.
//!
//! ## Sharing
//!
//! `Index` is plain owned data with no interior mutability, so it is `Send`
//! and `Sync`: hand out `&Index` (or an `Arc<Index>`) to as many query
//! threads as needed. Each search allocates its own candidate buffer and
//! never writes shared structure.

pub mod builder;
pub mod search;
pub mod types;

pub use search::SearchResult;
pub use types::{Corpus, IndexError, IndexResult, IndexStats, RecordId, SearchConfig, VectorRecord};

use types::NodeId;

/// A node of the partitioning tree, stored in the index arena.
///
/// Children are addressed by arena index rather than owned boxes, which
/// keeps the tree contiguous in memory and cheap to traverse.
#[derive(Debug, Clone)]
pub(crate) struct IndexNode {
    /// The pivot record stored at this node
    pub(crate) record: VectorRecord,
    /// The dimension this node splits on (`depth mod D`)
    pub(crate) axis: usize,
    /// Arena id of the subtree of records below the pivot on `axis`
    pub(crate) left: Option<NodeId>,
    /// Arena id of the subtree of records above the pivot on `axis`
    pub(crate) right: Option<NodeId>,
}

/// An immutable space-partitioning index over a corpus snapshot.
///
/// Built once via [`Index::build`]; queried any number of times, from any
/// number of threads, via [`Index::search`].
#[derive(Debug, Clone)]
pub struct Index {
    pub(crate) nodes: Vec<IndexNode>,
    pub(crate) root: Option<NodeId>,
    pub(crate) dimension: usize,
}

impl Index {
    /// Build an index from a corpus snapshot.
    ///
    /// Records are cloned out of the corpus and partitioned into a balanced
    /// median-split tree (see [`builder`]). An empty corpus yields an empty
    /// index whose searches return empty results.
    ///
    /// Construction is a one-time, single-threaded startup operation with
    /// `O(n * D * log^2 n)` cost from the per-level sort.
    pub fn build(corpus: &Corpus) -> Self {
        let mut records: Vec<VectorRecord> = corpus.records().cloned().collect();
        // The corpus map has no meaningful order; fix one so the tree shape
        // is deterministic across rebuilds.
        records.sort_by_key(|r| r.id);

        let dimension = corpus.dimension().unwrap_or(0);
        let record_count = records.len();

        let mut nodes = Vec::with_capacity(record_count);
        let root = builder::build_subtree(records, 0, dimension, &mut nodes);

        let index = Self {
            nodes,
            root,
            dimension,
        };
        log::info!(
            "🌲 Built similarity index: {} records, {} dimensions, depth {}",
            record_count,
            dimension,
            index.depth()
        );
        index
    }

    /// Find the `k` records most similar to `query`, ranked by descending
    /// cosine similarity.
    ///
    /// Results are approximate k-NN (see [`search`] for the pruning bound
    /// and its accuracy trade-off). At most `k` results are returned; a `k`
    /// larger than the corpus returns the whole corpus ranked.
    ///
    /// # Errors
    ///
    /// * `InvalidK` - if `k` is 0
    /// * `DimensionMismatch` - if `query.len()` differs from the index
    ///   dimensionality
    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<SearchResult>> {
        search::search_tree(self, query, k, &SearchConfig::default())
    }

    /// [`search`](Index::search) with an explicit [`SearchConfig`]
    /// (candidate buffer sizing, minimum similarity filter).
    pub fn search_with_config(
        &self,
        query: &[f32],
        k: usize,
        config: &SearchConfig,
    ) -> IndexResult<Vec<SearchResult>> {
        search::search_tree(self, query, k, config)
    }

    /// Run a batch of independent queries in parallel over the shared index.
    ///
    /// Result order matches query order. The first failing query's error is
    /// returned.
    pub fn batch_search(
        &self,
        queries: &[Vec<f32>],
        k: usize,
    ) -> IndexResult<Vec<Vec<SearchResult>>> {
        search::batch_search_tree(self, queries, k, &SearchConfig::default())
    }

    /// Number of records held in the index
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index holds no records
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vector dimensionality of the indexed corpus (0 for an empty index)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Statistics about the built tree
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            record_count: self.len(),
            dimension: self.dimension,
            depth: self.depth(),
        }
    }

    /// Depth of the tree: 0 when empty, 1 for a single record.
    fn depth(&self) -> usize {
        self.depth_below(self.root)
    }

    fn depth_below(&self, node_id: Option<NodeId>) -> usize {
        match node_id {
            None => 0,
            Some(id) => {
                let node = &self.nodes[id as usize];
                1 + self.depth_below(node.left).max(self.depth_below(node.right))
            }
        }
    }
}
