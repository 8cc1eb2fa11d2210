//! Configuration management for the AgriSmart yield advisory service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with AGRI__ prefix

use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Prediction history database
    pub database: DatabaseConfig,

    /// Yield model artifact and training data
    pub model: ModelConfig,

    /// Text-generation backend for advisories
    pub llm: LlmConfig,

    /// Allowed browser origins
    pub cors: CorsConfig,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Serialized model artifact
    pub artifact_path: PathBuf,

    /// CSV dataset used when the artifact must be (re)trained
    pub dataset_path: PathBuf,

    /// Optional depth limit for the regression tree
    pub max_depth: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Backend identifier: "ollama" or "groq"
    pub provider: String,

    /// Upper bound for a single advisory request
    pub timeout_seconds: u64,

    pub ollama: OllamaConfig,

    pub groq: GroqConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Base URL of the local Ollama server
    pub base_url: String,

    /// Model tag
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroqConfig {
    /// Groq API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// OpenAI-compatible API base URL
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub origins: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGRI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.path", "data/agrismart.db")?
            .set_default("database.max_connections", 5)?
            .set_default("model.artifact_path", "data/model.json")?
            .set_default("model.dataset_path", "data/yield_df.csv")?
            .set_default("llm.provider", "ollama")?
            .set_default("llm.timeout_seconds", 30)?
            .set_default("llm.ollama.base_url", "http://localhost:11434")?
            .set_default("llm.ollama.model", "llama3.1:8b")?
            .set_default("llm.groq.model", "llama-3.1-8b-instant")?
            .set_default("llm.groq.base_url", "https://api.groq.com/openai/v1")?
            .set_default("cors.origins", "http://localhost:5173")?
            .set_default("log_level", "info")?
            .set_default("log_json", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRI_ prefix)
            .add_source(
                Environment::with_prefix("AGRI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.llm.provider = config.llm.provider.trim().to_lowercase();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(3..=180).contains(&self.llm.timeout_seconds) {
            return Err(ConfigError::Message(format!(
                "llm.timeout_seconds must be between 3 and 180, got {}",
                self.llm.timeout_seconds
            )));
        }
        Ok(())
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors
            .origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
