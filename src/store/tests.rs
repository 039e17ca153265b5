use super::*;
use anyhow::bail;
use tempfile::TempDir;

/// Encodes each text as `[word count, length in bytes]`
struct ShapeEmbedder;

impl Embedder for ShapeEmbedder {
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| vec![text.split_whitespace().count() as f32, text.len() as f32])
            .collect())
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn encode(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        bail!("model is not loaded")
    }
}

struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 2.0]).collect())
    }
}

struct RaggedEmbedder;

impl Embedder for RaggedEmbedder {
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| vec![0.5; i + 1])
            .collect())
    }
}

fn sample_chunks() -> Vec<String> {
    vec![
        "open a data file".to_string(),
        "define variable properties in the variable view".to_string(),
        "run descriptive statistics".to_string(),
    ]
}

#[test]
fn chunks_path_appends_suffix() {
    let path = Path::new("embeddings/index.bin");
    assert_eq!(
        VectorStore::chunks_path(path),
        PathBuf::from("embeddings/index.bin.chunks.json")
    );
}

#[test]
fn from_parts_rejects_length_mismatch() {
    let mut index = FlatL2Index::new(2);
    index.add(&[1.0, 2.0]).expect("vector fits");

    let result = VectorStore::from_parts(index, vec!["a".to_string(), "b".to_string()]);
    assert!(matches!(result, Err(RagError::Corrupt(_))));
}

#[test]
fn build_persists_both_artifacts() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("nested").join("index.bin");

    let store = VectorStore::build(&ShapeEmbedder, sample_chunks(), &path)
        .expect("build should succeed");

    assert_eq!(store.len(), 3);
    assert_eq!(store.dimension(), 2);
    assert!(path.is_file());
    assert!(VectorStore::chunks_path(&path).is_file());
    assert!(VectorStore::artifacts_exist(&path));

    let json = fs::read_to_string(VectorStore::chunks_path(&path)).expect("chunks readable");
    let chunks: Vec<String> = serde_json::from_str(&json).expect("chunks are a JSON array");
    assert_eq!(chunks, sample_chunks());
}

#[test]
fn load_restores_built_store() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");

    let built = VectorStore::build(&ShapeEmbedder, sample_chunks(), &path)
        .expect("build should succeed");
    let loaded = VectorStore::load(&path).expect("load should succeed");

    assert_eq!(loaded, built);
    assert_eq!(loaded.chunk(1), Some(sample_chunks()[1].as_str()));
    assert_eq!(loaded.chunk(3), None);
}

#[test]
fn build_rejects_empty_chunks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");

    let result = VectorStore::build(&ShapeEmbedder, Vec::new(), &path);
    assert!(matches!(result, Err(RagError::Build(_))));
    assert!(!path.exists());
}

#[test]
fn build_reports_embedder_failure() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");

    let result = VectorStore::build(&FailingEmbedder, sample_chunks(), &path);
    match result {
        Err(RagError::Build(message)) => assert!(message.contains("model is not loaded")),
        other => panic!("expected build error, got {:?}", other),
    }
    assert!(!path.exists());
}

#[test]
fn build_rejects_vector_count_mismatch() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");

    let result = VectorStore::build(&ShortEmbedder, sample_chunks(), &path);
    assert!(matches!(result, Err(RagError::Build(_))));
}

#[test]
fn build_rejects_inconsistent_dimensions() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");

    let result = VectorStore::build(&RaggedEmbedder, sample_chunks(), &path);
    assert!(matches!(result, Err(RagError::Build(_))));
}

#[test]
fn load_missing_index_is_not_found() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");

    let result = VectorStore::load(&path);
    assert!(matches!(result, Err(RagError::NotFound(_))));
}

#[test]
fn load_rejects_garbage_index() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");
    fs::write(&path, b"not an index").expect("write garbage");
    fs::write(VectorStore::chunks_path(&path), "[\"a\"]").expect("write chunks");

    let result = VectorStore::load(&path);
    assert!(matches!(result, Err(RagError::Corrupt(_))));
}

#[test]
fn load_rejects_garbage_chunks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");
    VectorStore::build(&ShapeEmbedder, sample_chunks(), &path).expect("build should succeed");
    fs::write(VectorStore::chunks_path(&path), "{ not json").expect("overwrite chunks");

    let result = VectorStore::load(&path);
    assert!(matches!(result, Err(RagError::Corrupt(_))));
}

#[test]
fn load_rejects_chunk_count_mismatch() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");
    VectorStore::build(&ShapeEmbedder, sample_chunks(), &path).expect("build should succeed");
    fs::write(VectorStore::chunks_path(&path), "[\"only one\"]").expect("overwrite chunks");

    let result = VectorStore::load(&path);
    assert!(matches!(result, Err(RagError::Corrupt(_))));
}

#[test]
fn search_delegates_to_index() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");
    let store =
        VectorStore::build(&ShapeEmbedder, sample_chunks(), &path).expect("build should succeed");

    let query = ShapeEmbedder
        .encode(&[sample_chunks()[2].clone()])
        .expect("encode succeeds");
    let neighbors = store.search(&query[0], 1).expect("search succeeds");

    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].position, 2);
    assert_eq!(neighbors[0].distance, 0.0);
}

#[test]
fn unwritable_index_path_is_build_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");
    fs::create_dir(&path).expect("directory in place of the index");

    let result = VectorStore::build(&ShapeEmbedder, sample_chunks(), &path);

    match result {
        Err(RagError::Build(message)) => assert!(message.contains("index.bin")),
        other => panic!("expected build error, got {:?}", other),
    }
    assert!(!VectorStore::chunks_path(&path).exists());
}

#[test]
fn failed_chunk_write_leaves_index_behind() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index.bin");
    fs::create_dir(VectorStore::chunks_path(&path)).expect("directory in place of the chunks");

    let result = VectorStore::build(&ShapeEmbedder, sample_chunks(), &path);

    match result {
        Err(RagError::Build(message)) => assert!(message.contains(CHUNKS_SUFFIX)),
        other => panic!("expected build error, got {:?}", other),
    }
    assert!(path.is_file());
    assert!(!VectorStore::artifacts_exist(&path));
}
