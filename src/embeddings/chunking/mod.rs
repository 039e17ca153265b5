
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{RagError, Result};

/// Configuration for word chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Distance in words between the starts of consecutive chunks
    pub chunk_size: usize,
    /// Number of extra words each chunk reaches into the next stride
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 512,
            overlap: 32,
        }
    }
}

/// Split cleaned text into overlapping word chunks.
///
/// Chunk `i` starts at word `i * chunk_size` and spans `chunk_size + overlap`
/// words, so consecutive chunks share `overlap` words. The last chunk is
/// shorter when the text runs out; nothing is padded.
#[inline]
pub fn split_text_into_chunks(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    if config.chunk_size == 0 {
        return Err(RagError::Validation(
            "chunk_size must be greater than 0".to_string(),
        ));
    }

    info!(
        "Splitting text into chunks (size={}, overlap={})",
        config.chunk_size, config.overlap
    );

    let words = text.split_whitespace().collect::<Vec<_>>();
    let span = config.chunk_size.saturating_add(config.overlap);

    let chunks = (0..words.len())
        .step_by(config.chunk_size)
        .map(|start| {
            let end = start.saturating_add(span).min(words.len());
            words[start..end].join(" ")
        })
        .collect::<Vec<_>>();

    info!("Created {} chunks from {} words", chunks.len(), words.len());
    Ok(chunks)
}

/// Number of whitespace-delimited words in `text`
#[inline]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    text.split_whitespace().map(word_token_weight).sum::<f64>() as usize
}

/// Cut `text` down to roughly `max_tokens` estimated tokens.
///
/// Returns `None` when the text already fits.
#[inline]
pub fn truncate_to_token_budget(text: &str, max_tokens: usize) -> Option<String> {
    let budget = max_tokens as f64;
    let mut used = 0.0;
    let mut kept = Vec::new();

    for word in text.split_whitespace() {
        used += word_token_weight(word);
        if used > budget {
            debug!(
                "Truncated text to {} words ({} token budget)",
                kept.len(),
                max_tokens
            );
            return Some(kept.join(" "));
        }
        kept.push(word);
    }

    None
}

// 1 token ≈ 0.75 words for English text, plus a little for punctuation
fn word_token_weight(word: &str) -> f64 {
    let punct_count = word.chars().filter(|c| c.is_ascii_punctuation()).count();
    (punct_count as f64).mul_add(0.1, 1.0 / 0.75)
}
