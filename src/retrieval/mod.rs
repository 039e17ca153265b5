// Retrieval module
// Nearest-neighbor lookup over the vector store with a relevance filter


use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embeddings::{Embedder, word_count};
use crate::store::VectorStore;
use crate::{RagError, Result};

/// Separator placed between chunks when they are joined into one context
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Neighbors requested from the index
    pub top_k: usize,
    /// Chunks with this many words or fewer are treated as noise
    pub min_words: usize,
    /// Retrieved chunks handed to the generator
    pub context_chunks: usize,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 3,
            min_words: 50,
            context_chunks: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Position of the chunk in the store
    pub position: usize,
    /// Squared L2 distance between the query and the chunk
    pub distance: f32,
    pub text: String,
}

/// Outcome of a retrieval: chunks nearest first, or nothing to return
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Found(Vec<RetrievedChunk>),
    Empty,
}

impl Retrieval {
    #[inline]
    pub fn chunks(&self) -> &[RetrievedChunk] {
        match self {
            Self::Found(chunks) => chunks,
            Self::Empty => &[],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks().is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks().len()
    }

    /// Join the first `limit` chunk texts into one context block
    #[inline]
    pub fn context(&self, limit: usize) -> String {
        self.chunks()
            .iter()
            .take(limit)
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}

/// Retriever bound to one store and the embedder that built it
pub struct Retriever<'a, E: Embedder + ?Sized> {
    store: &'a VectorStore,
    embedder: &'a E,
    min_words: usize,
}

impl<'a, E: Embedder + ?Sized> Retriever<'a, E> {
    #[inline]
    pub fn new(store: &'a VectorStore, embedder: &'a E) -> Self {
        Self {
            store,
            embedder,
            min_words: RetrievalConfig::default().min_words,
        }
    }

    #[inline]
    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    /// Find the chunks nearest to `query`.
    ///
    /// Hits with `min_words` words or fewer are dropped. When that drops
    /// everything, the single nearest hit is returned instead, so a store
    /// with at least one chunk never yields [`Retrieval::Empty`].
    #[inline]
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        if query.trim().is_empty() {
            return Err(RagError::Validation("query must not be empty".to_string()));
        }
        if top_k == 0 {
            return Err(RagError::Validation(
                "top_k must be greater than 0".to_string(),
            ));
        }

        info!("Retrieving up to {} chunks for query", top_k);

        if self.store.is_empty() {
            warn!("Vector store holds no chunks");
            return Ok(Retrieval::Empty);
        }

        let query_vector = self.embed_query(query)?;
        let neighbors = self.store.search(&query_vector, top_k)?;

        let hits = neighbors
            .into_iter()
            .filter_map(|neighbor| match self.store.chunk(neighbor.position) {
                Some(text) => Some(RetrievedChunk {
                    position: neighbor.position,
                    distance: neighbor.distance,
                    text: text.to_string(),
                }),
                // Unreachable while from_parts and load enforce equal lengths
                None => {
                    warn!(
                        "Index returned position {} outside the {} stored chunks",
                        neighbor.position,
                        self.store.len()
                    );
                    None
                }
            })
            .collect::<Vec<_>>();

        let Some(nearest) = hits.first().cloned() else {
            return Ok(Retrieval::Empty);
        };

        let relevant = hits
            .into_iter()
            .filter(|hit| word_count(&hit.text) > self.min_words)
            .collect::<Vec<_>>();

        if relevant.is_empty() {
            debug!(
                "No chunk above {} words, falling back to chunk {}",
                self.min_words, nearest.position
            );
            return Ok(Retrieval::Found(vec![nearest]));
        }

        debug!("Retrieved {} chunks", relevant.len());
        Ok(Retrieval::Found(relevant))
    }

    fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .embedder
            .encode(&[query.to_string()])
            .map_err(|e| RagError::Upstream(format!("failed to embed query: {:#}", e)))?;

        match vectors.pop() {
            Some(vector) if vectors.is_empty() => Ok(vector),
            _ => Err(RagError::Upstream(
                "embedder did not return exactly one query vector".to_string(),
            )),
        }
    }
}

/// Retrieve with the default relevance threshold.
///
/// `embedder` must be the embedder `store` was built with.
#[inline]
pub fn retrieve<E>(
    query: &str,
    store: &VectorStore,
    embedder: &E,
    top_k: usize,
) -> Result<Retrieval>
where
    E: Embedder + ?Sized,
{
    Retriever::new(store, embedder).retrieve(query, top_k)
}
