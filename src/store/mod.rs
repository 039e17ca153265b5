// Vector store module
// Owns the flat index and the chunk texts it points at, and persists both

pub mod flat_index;

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::embeddings::Embedder;
use crate::{RagError, Result};

pub use flat_index::{FlatL2Index, Neighbor};

/// Suffix appended to the index path to locate the chunk list
pub const CHUNKS_SUFFIX: &str = ".chunks.json";

/// A flat index paired with the chunk texts it was built from.
///
/// Position `i` in the index is the embedding of `chunks[i]`. Construction
/// and loading both refuse an index whose length differs from the chunk
/// count, so every search hit resolves to a chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStore {
    index: FlatL2Index,
    chunks: Vec<String>,
}

impl VectorStore {
    /// Pair an index with its chunks, checking that they line up
    #[inline]
    pub fn from_parts(index: FlatL2Index, chunks: Vec<String>) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(RagError::Corrupt(format!(
                "index holds {} vectors but there are {} chunks",
                index.len(),
                chunks.len()
            )));
        }

        Ok(Self { index, chunks })
    }

    /// Pair an index with chunks without checking that they line up
    #[cfg(test)]
    pub(crate) fn from_parts_unchecked(index: FlatL2Index, chunks: Vec<String>) -> Self {
        Self { index, chunks }
    }

    /// Embed `chunks`, build a flat index over them and persist both artifacts.
    ///
    /// The index is written to `path` first and the chunks to
    /// [`chunks_path`](Self::chunks_path) second. The pair is not written
    /// atomically: a failure between the two leaves only the index behind.
    #[inline]
    pub fn build<E>(embedder: &E, chunks: Vec<String>, path: &Path) -> Result<Self>
    where
        E: Embedder + ?Sized,
    {
        info!("Building vector store from {} chunks", chunks.len());

        if chunks.is_empty() {
            error!("Refusing to build a vector store without chunks");
            return Err(RagError::Build("no chunks to embed".to_string()));
        }

        let embeddings = embedder.encode(&chunks).map_err(|e| {
            error!("Failed to encode chunks: {:#}", e);
            RagError::Build(format!("failed to encode chunks: {:#}", e))
        })?;

        if embeddings.len() != chunks.len() {
            error!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            );
            return Err(RagError::Build(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if dimension == 0 {
            return Err(RagError::Build(
                "embedder returned empty vectors".to_string(),
            ));
        }
        debug!("Embedding dimension is {}", dimension);

        let mut index = FlatL2Index::new(dimension);
        for (position, embedding) in embeddings.iter().enumerate() {
            index.add(embedding).map_err(|e| {
                RagError::Build(format!("embedding {} is unusable: {}", position, e))
            })?;
        }

        let store = Self::from_parts(index, chunks)
            .map_err(|e| RagError::Build(e.to_string()))?;

        store.save(path)?;

        info!(
            "Saved {} chunks and their index to {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Load a store written by [`build`](Self::build).
    ///
    /// The embedder used for later queries must be the one the store was
    /// built with.
    #[inline]
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading vector store from {}", path.display());

        let chunks_path = Self::chunks_path(path);
        for artifact in [path, chunks_path.as_path()] {
            if !artifact.is_file() {
                error!("Vector store artifact missing: {}", artifact.display());
                return Err(RagError::NotFound(format!(
                    "vector store artifact {}",
                    artifact.display()
                )));
            }
        }

        let index: FlatL2Index = read_artifact(path, |reader| {
            bincode::deserialize_from(reader).map_err(|e| e.to_string())
        })?;
        index.check_shape().map_err(|message| {
            error!("Index {} is malformed: {}", path.display(), message);
            RagError::Corrupt(format!("{}: {}", path.display(), message))
        })?;

        let chunks: Vec<String> = read_artifact(&chunks_path, |reader| {
            serde_json::from_reader(reader).map_err(|e| e.to_string())
        })?;

        let store = Self::from_parts(index, chunks).inspect_err(|e| {
            error!("Vector store at {} is inconsistent: {}", path.display(), e);
        })?;

        info!(
            "Restored {} chunks ({} dimensions)",
            store.len(),
            store.dimension()
        );
        Ok(store)
    }

    /// Write the index to `path` and the chunk list next to it
    #[inline]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create {}: {}", parent.display(), e);
                RagError::Build(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        write_artifact(path, |writer| {
            bincode::serialize_into(writer, &self.index).map_err(|e| e.to_string())
        })?;

        let chunks_path = Self::chunks_path(path);
        write_artifact(&chunks_path, |writer| {
            serde_json::to_writer(writer, &self.chunks).map_err(|e| e.to_string())
        })
        .inspect_err(|_| {
            warn!(
                "Index {} was written without its chunk list",
                path.display()
            );
        })
    }

    /// Path of the chunk list belonging to the index at `path`
    #[inline]
    pub fn chunks_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(CHUNKS_SUFFIX);
        PathBuf::from(name)
    }

    /// Whether both persisted artifacts exist at `path`
    #[inline]
    pub fn artifacts_exist(path: &Path) -> bool {
        path.is_file() && Self::chunks_path(path).is_file()
    }

    /// The `k` chunks nearest to `query`, nearest first
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.index.search(query, k)
    }

    #[inline]
    pub fn chunk(&self, position: usize) -> Option<&str> {
        self.chunks.get(position).map(String::as_str)
    }

    #[inline]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    #[inline]
    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }
}

fn write_artifact<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::result::Result<(), String>,
{
    let build_error = |message: String| {
        error!("Failed to write {}: {}", path.display(), message);
        RagError::Build(format!("failed to write {}: {}", path.display(), message))
    };

    let file = File::create(path).map_err(|e| build_error(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(build_error)?;
    writer.flush().map_err(|e| build_error(e.to_string()))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

fn read_artifact<T, F>(path: &Path, read: F) -> Result<T>
where
    F: FnOnce(BufReader<File>) -> std::result::Result<T, String>,
{
    let file = File::open(path).map_err(|e| {
        error!("Failed to open {}: {}", path.display(), e);
        if e.kind() == std::io::ErrorKind::NotFound {
            RagError::NotFound(format!("vector store artifact {}", path.display()))
        } else {
            RagError::Io(e)
        }
    })?;

    read(BufReader::new(file)).map_err(|message| {
        error!("Failed to deserialize {}: {}", path.display(), message);
        RagError::Corrupt(format!("{}: {}", path.display(), message))
    })
}
