// Pipeline module
// Owns the loaded store and its collaborators and answers questions end to end


use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::document::load_pdf_text;
use crate::embeddings::{ChunkingConfig, Embedder, split_text_into_chunks};
use crate::generator::AnswerGenerator;
use crate::retrieval::{Retrieval, RetrievalConfig, Retriever};
use crate::store::VectorStore;
use crate::{RagError, Result};

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question.";
pub const NO_CONTEXT_MESSAGE: &str = "No relevant context was found in the manual.";
pub const GENERATION_FAILED_MESSAGE: &str =
    "Sorry, I could not get an answer from the model. Please try again.";

/// A ready-to-query question answering pipeline.
///
/// Immutable once constructed, so it can be shared between threads behind
/// an `Arc` without locking.
pub struct Pipeline {
    store: VectorStore,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn AnswerGenerator>,
    retrieval: RetrievalConfig,
}

impl Pipeline {
    /// Assemble a pipeline from a store and the embedder that built it
    #[inline]
    pub fn new(
        store: VectorStore,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn AnswerGenerator>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            retrieval,
        }
    }

    /// Load the configured index, or build it from the configured PDF.
    ///
    /// With `rebuild` set, existing artifacts are ignored and overwritten.
    #[inline]
    pub fn prepare(
        config: &Config,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn AnswerGenerator>,
        rebuild: bool,
    ) -> Result<Self> {
        let index_path = config.index_path();

        let store = if !rebuild && VectorStore::artifacts_exist(&index_path) {
            info!("Found existing index at {}", index_path.display());
            VectorStore::load(&index_path)?
        } else {
            if rebuild {
                info!("Rebuild requested, ignoring existing index");
            } else {
                info!("No index at {}, building one", index_path.display());
            }
            build_store(
                &config.pdf_path(),
                &index_path,
                &config.chunking,
                embedder.as_ref(),
            )?
        };

        Ok(Self::new(store, embedder, generator, config.retrieval.clone()))
    }

    #[inline]
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    #[inline]
    pub fn retrieval_config(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Retrieve chunks for `query` using the configured relevance threshold
    #[inline]
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        Retriever::new(&self.store, self.embedder.as_ref())
            .with_min_words(self.retrieval.min_words)
            .retrieve(query, top_k)
    }

    /// Answer `question` from the manual.
    ///
    /// Never fails: empty questions, missing context and upstream failures
    /// all produce a message meant for the person asking.
    #[inline]
    pub fn answer(&self, question: &str) -> String {
        let question = question.trim();
        if question.is_empty() {
            return EMPTY_QUESTION_MESSAGE.to_string();
        }

        info!("Answering question: {}", question);

        let retrieval = match self.retrieve(question, self.retrieval.top_k) {
            Ok(retrieval) => retrieval,
            Err(e) => {
                error!("Retrieval failed: {}", e);
                return GENERATION_FAILED_MESSAGE.to_string();
            }
        };

        if retrieval.is_empty() {
            warn!("No context found for question");
            return NO_CONTEXT_MESSAGE.to_string();
        }

        let context = retrieval.context(self.retrieval.context_chunks);

        match self.generator.generate(&context, question) {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => {
                warn!("Model returned an empty answer");
                GENERATION_FAILED_MESSAGE.to_string()
            }
            Err(e) => {
                error!("Answer generation failed: {}", e);
                GENERATION_FAILED_MESSAGE.to_string()
            }
        }
    }
}

/// Extract, chunk, embed and persist the PDF at `pdf_path`.
///
/// Both artifacts are checked after writing; a store that cannot be found
/// again on disk is reported as a build failure.
#[inline]
pub fn build_store<E>(
    pdf_path: &Path,
    index_path: &Path,
    chunking: &ChunkingConfig,
    embedder: &E,
) -> Result<VectorStore>
where
    E: Embedder + ?Sized,
{
    let text = load_pdf_text(pdf_path)?;
    let chunks = split_text_into_chunks(&text, chunking)?;
    info!("Split {} into {} chunks", pdf_path.display(), chunks.len());

    let store = VectorStore::build(embedder, chunks, index_path)?;

    if !VectorStore::artifacts_exist(index_path) {
        error!(
            "Index artifacts missing after build at {}",
            index_path.display()
        );
        return Err(RagError::Build(format!(
            "index artifacts were not created at {}",
            index_path.display()
        )));
    }

    Ok(store)
}
