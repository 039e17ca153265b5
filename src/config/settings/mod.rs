
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::embeddings::chunking::ChunkingConfig;
use crate::retrieval::RetrievalConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub batch_size: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "all-minilm:latest".to_string(),
            batch_size: 32,
        }
    }
}

/// Hosted text-generation endpoint used to answer questions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the inference API; the model id is appended to it
    pub api_url: String,
    pub model: String,
    /// Environment variable holding the bearer token
    pub token_env: String,
    /// Context is cut to this many estimated tokens before prompting
    pub max_context_tokens: usize,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "Qwen/Qwen2-1.5B-Instruct".to_string(),
            token_env: "HF_API_TOKEN".to_string(),
            max_context_tokens: 8192,
            max_new_tokens: 1024,
            temperature: 0.3,
            timeout_seconds: 60,
        }
    }
}

/// The manual being answered from and where its index lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    /// Human readable name used in prompts
    pub manual_name: String,
    /// PDF source; relative paths resolve against the base directory
    pub pdf_path: PathBuf,
    /// Index file; the chunk list is stored next to it
    pub index_path: PathBuf,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            manual_name: "IBM SPSS Statistics".to_string(),
            pdf_path: PathBuf::from("data/IBM_SPSS_Statistics_Core_System_User_Guide.pdf"),
            index_path: PathBuf::from("embeddings/index.bin"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid token variable: {0} (cannot be empty)")]
    InvalidTokenEnv(String),
    #[error("Invalid max context tokens: {0} (must be between 256 and 131072)")]
    InvalidMaxContextTokens(usize),
    #[error("Invalid max new tokens: {0} (must be between 1 and 8192)")]
    InvalidMaxNewTokens(u32),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid chunk size: {0} (must be between 1 and 8192)")]
    InvalidChunkSize(usize),
    #[error("Invalid overlap: {0} (must be between 0 and 4096)")]
    InvalidOverlap(usize),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid context chunks: {0} (must be between 1 and 100)")]
    InvalidContextChunks(usize),
    #[error("Invalid manual name: {0} (cannot be empty)")]
    InvalidManualName(String),
    #[error("Invalid path for {0} (cannot be empty)")]
    EmptyPath(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Default base directory, `~/.manual-rag`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".manual-rag"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("manual-rag"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;
        self.generator.validate()?;
        self.validate_chunking_config()?;
        validate_retrieval(&self.retrieval)?;
        validate_document(&self.document)?;

        Ok(())
    }

    /// Replace the `[retrieval]` section, keeping the old one if the new one is invalid
    #[inline]
    pub fn set_retrieval(&mut self, retrieval: RetrievalConfig) -> Result<(), ConfigError> {
        validate_retrieval(&retrieval)?;
        self.retrieval = retrieval;
        Ok(())
    }

    /// Replace the `[document]` section, keeping the old one if the new one is invalid
    #[inline]
    pub fn set_document(&mut self, document: DocumentConfig) -> Result<(), ConfigError> {
        validate_document(&document)?;
        self.document = document;
        Ok(())
    }

    fn validate_chunking_config(&self) -> Result<(), ConfigError> {
        let config = &self.chunking;

        if !(1..=8192).contains(&config.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(config.chunk_size));
        }

        if config.overlap > 4096 {
            return Err(ConfigError::InvalidOverlap(config.overlap));
        }

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Location of the source PDF
    #[inline]
    pub fn pdf_path(&self) -> PathBuf {
        self.get_base_dir().join(&self.document.pdf_path)
    }

    /// Location of the persisted index file
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.get_base_dir().join(&self.document.index_path)
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        self.ollama.ollama_url()
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        self.ollama_url()?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = OllamaConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model_url()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.token_env.trim().is_empty() {
            return Err(ConfigError::InvalidTokenEnv(self.token_env.clone()));
        }

        if !(256..=131_072).contains(&self.max_context_tokens) {
            return Err(ConfigError::InvalidMaxContextTokens(
                self.max_context_tokens,
            ));
        }

        if !(1..=8192).contains(&self.max_new_tokens) {
            return Err(ConfigError::InvalidMaxNewTokens(self.max_new_tokens));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        Ok(())
    }

    /// Full URL of the configured model, `<api_url>/<model>`
    pub fn model_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.model.trim_start_matches('/')
        );
        let url = Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str.clone()))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidProtocol(other.to_string())),
        }
    }

    /// Bearer token from the configured environment variable, if set
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_api_url(&mut self, api_url: String) -> Result<(), ConfigError> {
        let temp_config = GeneratorConfig {
            api_url: api_url.clone(),
            ..self.clone()
        };
        temp_config.model_url()?;
        self.api_url = api_url;
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }
        self.temperature = temperature;
        Ok(())
    }
}

fn validate_retrieval(config: &RetrievalConfig) -> Result<(), ConfigError> {
    if !(1..=100).contains(&config.top_k) {
        return Err(ConfigError::InvalidTopK(config.top_k));
    }

    if !(1..=100).contains(&config.context_chunks) {
        return Err(ConfigError::InvalidContextChunks(config.context_chunks));
    }

    Ok(())
}

fn validate_document(config: &DocumentConfig) -> Result<(), ConfigError> {
    if config.manual_name.trim().is_empty() {
        return Err(ConfigError::InvalidManualName(config.manual_name.clone()));
    }
    if config.pdf_path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath("pdf_path"));
    }
    if config.index_path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath("index_path"));
    }

    Ok(())
}
