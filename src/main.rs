use anyhow::Result;
use clap::{Parser, Subcommand};
use manual_rag::commands::{ask, build_index, search, show_status};
use manual_rag::config::{get_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "manual-rag")]
#[command(about = "Question answering over a PDF manual with retrieval-augmented generation")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the relative data paths (default: ~/.manual-rag)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedder, generator and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Extract, chunk and embed the manual into a searchable index
    Build {
        /// Rebuild even if an index already exists
        #[arg(long)]
        rebuild: bool,
    },
    /// Ask a question about the manual
    Ask {
        /// The question to answer
        question: String,
    },
    /// Show the chunks retrieved for a query without generating an answer
    Search {
        /// Search query
        query: String,
        /// Number of neighbors to retrieve, overriding the configured value
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show detailed status of the index and external services
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Build { rebuild } => {
            build_index(&config_dir, rebuild)?;
        }
        Commands::Ask { question } => {
            ask(&config_dir, &question)?;
        }
        Commands::Search { query, top_k } => {
            search(&config_dir, &query, top_k)?;
        }
        Commands::Status => {
            show_status(&config_dir)?;
        }
    }

    Ok(())
}
