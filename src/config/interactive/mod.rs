
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

use super::{Config, DocumentConfig, GeneratorConfig, OllamaConfig};
use crate::embeddings::chunking::ChunkingConfig;
use crate::retrieval::RetrievalConfig;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Manual RAG Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure your local Ollama instance for embedding generation.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Answer Generation").bold().yellow());
    eprintln!("Configure the hosted model that writes answers from retrieved context.");
    eprintln!();

    configure_generator(&mut config.generator)?;

    eprintln!();
    eprintln!("{}", style("Chunking").bold().yellow());
    eprintln!("Changing these values requires rebuilding the index.");
    eprintln!();

    configure_chunking(&mut config.chunking)?;

    eprintln!();
    eprintln!("{}", style("Retrieval").bold().yellow());
    eprintln!("Control how many chunks are searched and handed to the model.");
    eprintln!();

    configure_retrieval(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Document").bold().yellow());
    eprintln!("Relative paths resolve against {}.", config.get_base_dir().display());
    eprintln!();

    configure_document(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before building the index.");
    }

    if config.generator.api_token().is_none() {
        eprintln!(
            "{}",
            style(format!(
                "⚠ Warning: {} is not set, requests will be anonymous",
                config.generator.token_env
            ))
            .yellow()
        );
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());
    match config.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Generator Settings:").bold().yellow());
    match config.generator.model_url() {
        Ok(url) => eprintln!("  Model URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Model URL: {} ({})", style("Invalid").red(), e),
    }
    let token_state = if config.generator.api_token().is_some() {
        style("set").green()
    } else {
        style("not set").yellow()
    };
    eprintln!(
        "  Token: {} ({})",
        style(&config.generator.token_env).cyan(),
        token_state
    );
    eprintln!(
        "  Max Context Tokens: {}",
        style(config.generator.max_context_tokens).cyan()
    );
    eprintln!(
        "  Temperature: {}",
        style(config.generator.temperature).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!(
        "  Chunk Size / Overlap: {} / {} words",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.overlap).cyan()
    );
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  Minimum Chunk Words: {}",
        style(config.retrieval.min_words).cyan()
    );
    eprintln!(
        "  Context Chunks: {}",
        style(config.retrieval.context_chunks).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Document:").bold().yellow());
    eprintln!("  Manual: {}", style(&config.document.manual_name).cyan());
    eprintln!("  PDF: {}", style(config.pdf_path().display()).cyan());
    eprintln!("  Index: {}", style(config.index_path().display()).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Config {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No valid configuration found. Using defaults.").yellow()
            );
            Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            }
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), super::ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(ollama.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;
    ollama.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_generator(generator: &mut GeneratorConfig) -> Result<()> {
    let api_url: String = Input::new()
        .with_prompt("Inference API base URL")
        .default(generator.api_url.clone())
        .validate_with(|input: &String| -> Result<(), super::ConfigError> {
            let temp_config = GeneratorConfig {
                api_url: input.clone(),
                ..generator.clone()
            };
            temp_config.model_url().map(|_| ())
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Generation model")
        .default(generator.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature")
        .default(generator.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    generator.set_api_url(api_url)?;
    generator.set_model(model)?;
    generator.set_temperature(temperature)?;

    Ok(())
}

fn configure_chunking(chunking: &mut ChunkingConfig) -> Result<()> {
    chunking.chunk_size = Input::new()
        .with_prompt("Chunk size (words)")
        .default(chunking.chunk_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=8192).contains(input) {
                Ok(())
            } else {
                Err("Chunk size must be between 1 and 8192")
            }
        })
        .interact_text()?;

    chunking.overlap = Input::new()
        .with_prompt("Overlap (words)")
        .default(chunking.overlap)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input <= 4096 {
                Ok(())
            } else {
                Err("Overlap must be 4096 or less")
            }
        })
        .interact_text()?;

    Ok(())
}

fn configure_retrieval(config: &mut Config) -> Result<()> {
    let top_k: usize = Input::new()
        .with_prompt("Chunks to retrieve (top k)")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Top k must be between 1 and 100")
            }
        })
        .interact_text()?;

    let min_words: usize = Input::new()
        .with_prompt("Ignore chunks with this many words or fewer")
        .default(config.retrieval.min_words)
        .interact_text()?;

    let context_chunks: usize = Input::new()
        .with_prompt("Chunks passed to the model as context")
        .default(config.retrieval.context_chunks)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Context chunks must be between 1 and 100")
            }
        })
        .interact_text()?;

    config.set_retrieval(RetrievalConfig {
        top_k,
        min_words,
        context_chunks,
    })?;

    Ok(())
}

fn configure_document(config: &mut Config) -> Result<()> {
    let manual_name: String = Input::new()
        .with_prompt("Manual name (used in prompts)")
        .default(config.document.manual_name.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Manual name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let pdf_path: String = Input::new()
        .with_prompt("PDF path")
        .default(config.document.pdf_path.display().to_string())
        .validate_with(non_empty_path)
        .interact_text()?;

    let index_path: String = Input::new()
        .with_prompt("Index path")
        .default(config.document.index_path.display().to_string())
        .validate_with(non_empty_path)
        .interact_text()?;

    config.set_document(DocumentConfig {
        manual_name,
        pdf_path: PathBuf::from(pdf_path),
        index_path: PathBuf::from(index_path),
    })?;

    Ok(())
}

fn non_empty_path(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Path cannot be empty")
    } else {
        Ok(())
    }
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    let url = format!(
        "{}://{}:{}/api/version",
        ollama.protocol, ollama.host, ollama.port
    );

    let agent = crate::http::build_agent(std::time::Duration::from_secs(5));

    match agent.get(&url).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => true,
        Err(_) => false,
    }
}
