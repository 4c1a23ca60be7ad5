use common::VectorStoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat metadata attached to every indexed document.
pub type Metadata = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// `1 - cosine`, lower is closer
    pub distance: f32,
}

/// In-memory vector index for one collection.
///
/// Linear scan over every vector; collections here hold hundreds of rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    entries: BTreeMap<String, IndexedDocument>,
    dimension: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document stored under `id`.
    pub fn upsert(
        &mut self,
        id: impl Into<String>,
        vector: Vec<f32>,
        document: impl Into<String>,
        metadata: Metadata,
    ) -> Result<(), VectorStoreError> {
        self.check_dimension(vector.len())?;
        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }

        self.entries.insert(
            id.into(),
            IndexedDocument {
                vector,
                document: document.into(),
                metadata,
            },
        );
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        if self.entries.is_empty() {
            self.dimension = None;
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&IndexedDocument> {
        self.entries.get(id)
    }

    /// `n` nearest documents whose metadata matches every `filter` pair.
    pub fn query(
        &self,
        query: &[f32],
        n: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<QueryHit>, VectorStoreError> {
        if self.entries.is_empty() || n == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query.len())?;

        let mut hits: Vec<QueryHit> = self
            .entries
            .iter()
            .filter(|(_, doc)| filter.map_or(true, |f| matches_filter(&doc.metadata, f)))
            .map(|(id, doc)| QueryHit {
                id: id.clone(),
                document: doc.document.clone(),
                metadata: doc.metadata.clone(),
                distance: 1.0 - cosine_similarity(query, &doc.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(n);
        Ok(hits)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dimension = None;
    }

    fn check_dimension(&self, actual: usize) -> Result<(), VectorStoreError> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(VectorStoreError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

/// Cosine similarity; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a: f32 = norm_a.sqrt();
    let norm_b: f32 = norm_b.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
