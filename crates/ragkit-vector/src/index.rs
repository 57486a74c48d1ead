//! Exact in-memory inner-product index.
//!
//! Vectors are stored row-major in one flat buffer; `search` scores every row
//! and keeps the best `top_k` in a bounded min-heap.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;

use ragkit_core::{Document, Error, IndexStats, Result, ScoredDocument};

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    data: Vec<f32>,
    documents: Vec<Document>,
}

/// Orders by score, then prefers the earlier insertion on ties.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    pos: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score).then_with(|| other.pos.cmp(&self.pos))
    }
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig("index dimension must be greater than 0".to_string()));
        }
        Ok(Self { dim: dimension, data: Vec::new(), documents: Vec::new() })
    }

    /// Appends `vectors[i]` paired with `documents[i]`. Nothing is inserted
    /// unless every row is valid.
    pub fn add(&mut self, vectors: &[Vec<f32>], documents: Vec<Document>) -> Result<()> {
        if vectors.len() != documents.len() {
            return Err(Error::DimensionMismatch { expected: documents.len(), actual: vectors.len() });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: bad.len() });
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        self.documents.extend(documents);
        debug!(added = vectors.len(), total = self.documents.len(), "index add");
        Ok(())
    }

    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let k = top_k.min(self.documents.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);
        for (pos, row) in self.data.chunks_exact(self.dim).enumerate() {
            let score = row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>();
            let cand = Candidate { score, pos };
            if heap.len() < k {
                heap.push(Reverse(cand));
            } else if heap.peek().is_some_and(|Reverse(worst)| cand > *worst) {
                heap.pop();
                heap.push(Reverse(cand));
            }
        }

        // ascending by Reverse == descending by candidate
        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| ScoredDocument { score: c.score, document: self.documents[c.pos].clone() })
            .collect())
    }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn dimension(&self) -> usize { self.dim }

    pub fn stats(&self) -> IndexStats {
        IndexStats { total_vectors: self.len(), dimension: self.dim, total_documents: self.len() }
    }

    /// Stored rows in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&[f32], &Document)> + '_ {
        self.data.chunks_exact(self.dim).zip(self.documents.iter())
    }
}
