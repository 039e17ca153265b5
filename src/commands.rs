use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::embeddings::{Embedder, OllamaClient, word_count};
use crate::generator::{AnswerGenerator, HuggingFaceClient};
use crate::pipeline::{Pipeline, build_store};
use crate::retrieval::Retrieval;
use crate::store::VectorStore;

/// Characters of each chunk shown in search output
const PREVIEW_CHARS: usize = 200;

/// Embedding client for the configured Ollama server
#[inline]
pub fn embedder_from_config(config: &Config) -> Result<Box<dyn Embedder>> {
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    Ok(Box::new(client))
}

/// Generation client for the configured inference endpoint
#[inline]
pub fn generator_from_config(config: &Config) -> Result<Box<dyn AnswerGenerator>> {
    let client = HuggingFaceClient::new(&config.generator, &config.document.manual_name)
        .context("Failed to create inference client")?;
    Ok(Box::new(client))
}

/// Build the index from the configured PDF, or report the one already on disk
#[inline]
pub fn build_index(config_dir: &Path, rebuild: bool) -> Result<()> {
    let config = Config::load(config_dir)?;
    let index_path = config.index_path();

    if !rebuild && VectorStore::artifacts_exist(&index_path) {
        let store = VectorStore::load(&index_path)?;
        println!(
            "Index already exists at {} ({} chunks)",
            index_path.display(),
            store.len()
        );
        println!("Use 'manual-rag build --rebuild' to rebuild it.");
        return Ok(());
    }

    let embedder = embedder_from_config(&config)?;

    let spinner = if console::user_attended_stderr() {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    } else {
        ProgressBar::hidden()
    };
    spinner.set_message(format!("Indexing {}", config.pdf_path().display()));

    let result = build_store(
        &config.pdf_path(),
        &index_path,
        &config.chunking,
        embedder.as_ref(),
    );
    spinner.finish_and_clear();

    match result {
        Ok(store) => {
            info!("Index build completed");
            println!("Index built successfully!");
            println!("  Chunks: {}", store.len());
            println!("  Dimensions: {}", store.dimension());
            println!("  Index: {}", index_path.display());
            println!(
                "  Chunks file: {}",
                VectorStore::chunks_path(&index_path).display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Index build failed: {}", e);
            Err(e.into())
        }
    }
}

/// Answer a question from the manual
#[inline]
pub fn ask(config_dir: &Path, question: &str) -> Result<()> {
    let config = Config::load(config_dir)?;
    let pipeline = Pipeline::prepare(
        &config,
        embedder_from_config(&config)?,
        generator_from_config(&config)?,
        false,
    )?;

    println!("{}", pipeline.answer(question));
    Ok(())
}

/// Print the chunks retrieved for `query` without calling the model
#[inline]
pub fn search(config_dir: &Path, query: &str, top_k: Option<usize>) -> Result<()> {
    let config = Config::load(config_dir)?;
    let index_path = config.index_path();
    let store = VectorStore::load(&index_path)
        .with_context(|| format!("No usable index at {}", index_path.display()))?;

    let pipeline = Pipeline::new(
        store,
        embedder_from_config(&config)?,
        generator_from_config(&config)?,
        config.retrieval.clone(),
    );

    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    match pipeline.retrieve(query, top_k)? {
        Retrieval::Empty => println!("No chunks found."),
        Retrieval::Found(chunks) => {
            println!("Found {} chunk(s) for: {}", chunks.len(), query);
            println!();
            for chunk in &chunks {
                println!(
                    "#{} (distance {:.4}, {} words)",
                    chunk.position,
                    chunk.distance,
                    word_count(&chunk.text)
                );
                println!("   {}", preview(&chunk.text));
                println!();
            }
        }
    }

    Ok(())
}

/// Show detailed status of the index and the external services
#[inline]
pub fn show_status(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).unwrap_or_else(|e| {
        println!("⚠️  Could not load configuration, using defaults: {:#}", e);
        Config {
            base_dir: config_dir.to_path_buf(),
            ..Config::default()
        }
    });

    println!("📊 Manual-RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("📄 Document:");
    println!("   Manual: {}", config.document.manual_name);
    let pdf_path = config.pdf_path();
    if pdf_path.is_file() {
        println!("   ✅ PDF: {}", pdf_path.display());
    } else {
        println!("   ❌ PDF: Missing at {}", pdf_path.display());
    }
    println!();

    println!("🔍 Index Status:");
    let index_path = config.index_path();
    if VectorStore::artifacts_exist(&index_path) {
        match VectorStore::load(&index_path) {
            Ok(store) => {
                println!("   ✅ Index: {}", index_path.display());
                println!("   🧩 Chunks: {}", store.len());
                println!("   🔢 Dimensions: {}", store.dimension());
            }
            Err(e) => println!("   ❌ Index: Unreadable - {}", e),
        }
    } else {
        println!("   ⚠️  Index: Not built yet (run 'manual-rag build')");
    }
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Model: {}", config.ollama.model);
                println!("   🔢 Batch Size: {}", config.ollama.batch_size);
            }
            Err(e) => println!("   ⚠️  Ollama: Connected but unhealthy - {}", e),
        },
        Err(e) => println!("   ❌ Ollama: Failed to connect - {}", e),
    }
    println!();

    println!("💬 Generator Status:");
    match config.generator.model_url() {
        Ok(url) => println!("   📋 Endpoint: {}", url),
        Err(e) => println!("   ❌ Endpoint: {}", e),
    }
    if config.generator.api_token().is_some() {
        println!("   ✅ Token: {} is set", config.generator.token_env);
    } else {
        println!(
            "   ⚠️  Token: {} is not set, requests will be anonymous",
            config.generator.token_env
        );
    }
    println!();

    println!("⚙️  Retrieval:");
    println!(
        "   Chunking: {} words, {} overlap",
        config.chunking.chunk_size, config.chunking.overlap
    );
    println!(
        "   Top K: {}, min words: {}, context chunks: {}",
        config.retrieval.top_k, config.retrieval.min_words, config.retrieval.context_chunks
    );

    Ok(())
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head = chars.by_ref().take(PREVIEW_CHARS).collect::<String>();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
