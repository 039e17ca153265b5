#![allow(dead_code, reason = "each test binary uses a different subset of helpers")]

// Deterministic embedders shared by the integration tests

use anyhow::bail;
use manual_rag::embeddings::Embedder;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bag-of-words embedder: every word adds 1.0 to the bucket its hash lands in
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for HashEmbedder {
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

/// Maps known texts to fixed vectors; anything else is an error
pub struct KeyedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl KeyedEmbedder {
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, Vec<f32>)>) -> Self {
        Self {
            vectors: pairs
                .into_iter()
                .map(|(text, vector)| (text.to_string(), vector))
                .collect(),
        }
    }
}

impl Embedder for KeyedEmbedder {
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| match self.vectors.get(text) {
                Some(vector) => Ok(vector.clone()),
                None => bail!("no vector registered for {:?}", text),
            })
            .collect()
    }
}

/// Wraps another embedder and counts `encode` calls
pub struct CountingEmbedder<E> {
    inner: E,
    calls: AtomicUsize,
}

impl<E: Embedder> CountingEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E: Embedder> Embedder for CountingEmbedder<E> {
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.encode(texts)
    }
}

/// `count` distinct words, `w0 w1 w2 ...`
pub fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A chunk of `count` words, all `word`
pub fn repeated_words(word: &str, count: usize) -> String {
    vec![word; count].join(" ")
}

pub fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}
