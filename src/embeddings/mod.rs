// Embeddings module
// Word chunking and the embedding capability consumed by the vector store

pub mod chunking;
pub mod ollama;

pub use chunking::{
    ChunkingConfig, estimate_token_count, split_text_into_chunks, truncate_to_token_budget,
    word_count,
};
pub use ollama::OllamaClient;

/// Maps text to fixed-dimension vectors.
///
/// Implementations must be deterministic for a fixed model version. The same
/// embedder has to be used to build an index and to query it: a store cannot
/// detect a mismatched model, it just returns meaningless neighbors.
pub trait Embedder: Send + Sync {
    /// Encode a batch of texts, returning one vector per input in the same order
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    #[inline]
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        (**self).encode(texts)
    }
}
