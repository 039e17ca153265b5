use super::*;
use crate::embeddings::chunking::ChunkingConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let original_config = Config {
            ollama: OllamaConfig {
                protocol: "https".to_string(),
                host: "test-host".to_string(),
                port: 8080,
                model: "test-model".to_string(),
                batch_size: 32,
            },
            document: DocumentConfig {
                manual_name: "Widget Manual".to_string(),
                pdf_path: PathBuf::from("docs/widget.pdf"),
                index_path: PathBuf::from("cache/widget.bin"),
            },
            ..Config::default()
        };

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(&config_path, toml_content).expect("should write to config_path successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_config_with_defaults() {
        let partial_toml = r#"
            [ollama]
            host = "custom-host"

            [retrieval]
            top_k = 5
        "#;

        let config: Config = toml::from_str(partial_toml).expect("partial config should parse");
        assert_eq!(config.ollama.host, "custom-host");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.min_words, 50);
        assert_eq!(config.chunking, ChunkingConfig::default());
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn complete_valid_config() {
        let valid_toml = r#"
            [ollama]
            protocol = "http"
            host = "localhost"
            port = 11434
            model = "all-minilm:latest"
            batch_size = 64

            [generator]
            api_url = "https://api-inference.huggingface.co/models"
            model = "Qwen/Qwen2-1.5B-Instruct"
            token_env = "HF_API_TOKEN"
            max_context_tokens = 4096
            max_new_tokens = 512
            temperature = 0.3
            timeout_seconds = 30

            [chunking]
            chunk_size = 512
            overlap = 64

            [retrieval]
            top_k = 3
            min_words = 50
            context_chunks = 2

            [document]
            manual_name = "IBM SPSS Statistics"
            pdf_path = "data/manual.pdf"
            index_path = "embeddings/index.bin"
        "#;

        let config: Config = toml::from_str(valid_toml).expect("should parse toml successfully");
        assert!(config.validate().is_ok());
        assert_eq!(config.ollama.batch_size, 64);
        assert_eq!(config.generator.max_context_tokens, 4096);
        assert_eq!(config.chunking.overlap, 64);
        assert_eq!(config.document.pdf_path, PathBuf::from("data/manual.pdf"));
    }

    #[test]
    fn config_validation_edge_cases() {
        let config = Config {
            ollama: OllamaConfig {
                protocol: "http".to_string(),
                host: String::new(),
                port: 80,
                model: "test".to_string(),
                batch_size: 1,
            },
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err()); // Empty host should be invalid
    }

    #[test]
    fn port_boundary_validation() {
        let mut config = OllamaConfig {
            port: 1,
            ..OllamaConfig::default()
        };

        assert!(config.set_port(1).is_ok());
        assert!(config.set_port(65535).is_ok());
        assert!(config.set_port(0).is_err());
    }

    #[test]
    fn ollama_url_generation_with_different_hosts() {
        let configs = vec![
            ("http", "localhost", 11434, "http://localhost:11434/"),
            ("http", "127.0.0.1", 8080, "http://127.0.0.1:8080/"),
            ("http", "example.com", 3000, "http://example.com:3000/"),
            (
                "https",
                "secure.example.com",
                443,
                "https://secure.example.com/",
            ),
        ];

        for (protocol, host, port, expected_url) in configs {
            let config = Config {
                ollama: OllamaConfig {
                    protocol: protocol.to_string(),
                    host: host.to_string(),
                    port,
                    model: "test".to_string(),
                    batch_size: 32,
                },
                ..Config::default()
            };

            let url = config.ollama_url().expect("ollama_url is ok");
            assert_eq!(url.as_str(), expected_url);
        }
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidProtocol("ftp".to_string()),
            ConfigError::InvalidPort(0),
            ConfigError::InvalidBatchSize(0),
            ConfigError::InvalidModel(String::new()),
            ConfigError::InvalidUrl("invalid-url".to_string()),
            ConfigError::InvalidChunkSize(0),
            ConfigError::EmptyPath("pdf_path"),
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(!message.is_empty());
            assert!(message.len() > 10); // Ensure meaningful error messages
        }
    }
}
