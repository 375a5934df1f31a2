//! Configuration management for Flashtutor
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence is file < environment < CLI.

use crate::error::{FlashtutorError, Result};
use crate::pipeline::FlashcardTrigger;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable holding the model service credential
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Main configuration structure for Flashtutor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model provider configuration
    pub provider: ProviderConfig,
    /// Extraction pipeline behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Provider configuration
///
/// Specifies which model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Anthropic Messages API configuration
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

/// Anthropic provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key. Only ever read from the environment, never from or to files.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Upper bound on generated tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// API base URL (overridable so tests can point at a mock server)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Value of the `anthropic-version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Timeout for a single model call (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    6192
}

fn default_api_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
            api_base: default_api_base(),
            api_version: default_api_version(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl AnthropicConfig {
    /// Return the configured API key
    ///
    /// # Errors
    ///
    /// Returns `FlashtutorError::MissingCredentials` when the key is absent
    /// or blank. Callers that talk to the model invoke this at startup so a
    /// missing key stops the process before it accepts any work.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(FlashtutorError::MissingCredentials(format!(
                "anthropic ({} is not set)",
                API_KEY_ENV
            ))
            .into()),
        }
    }
}

/// Extraction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// When to offer the flashcard tool to the model
    #[serde(default)]
    pub trigger: FlashcardTrigger,

    /// Topic used when the model omits one
    #[serde(default = "default_fallback_topic")]
    pub fallback_topic: String,

    /// Optional system prompt sent with every call
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_fallback_topic() -> String {
    "Untitled Topic".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trigger: FlashcardTrigger::default(),
            fallback_topic: default_fallback_topic(),
            system_prompt: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path. Defaults to the user data directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,

    /// Optional file that receives a copy of the log stream
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig {
                provider_type: "anthropic".to_string(),
                anthropic: AnthropicConfig::default(),
            },
            pipeline: PipelineConfig::default(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FlashtutorError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FlashtutorError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            self.provider.anthropic.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("FLASHTUTOR_MODEL") {
            self.provider.anthropic.model = model;
        }

        if let Ok(api_base) = std::env::var("FLASHTUTOR_API_BASE") {
            self.provider.anthropic.api_base = api_base;
        }

        if let Ok(timeout) = std::env::var("FLASHTUTOR_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.anthropic.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid FLASHTUTOR_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(trigger) = std::env::var("FLASHTUTOR_FLASHCARD_TRIGGER") {
            match trigger.parse::<FlashcardTrigger>() {
                Ok(value) => {
                    self.pipeline.trigger = value;
                    tracing::debug!(trigger = %trigger, "Env override: FLASHTUTOR_FLASHCARD_TRIGGER");
                }
                Err(_) => {
                    tracing::warn!("Invalid FLASHTUTOR_FLASHCARD_TRIGGER: {}", trigger);
                }
            }
        }

        if let Ok(bind) = std::env::var("FLASHTUTOR_BIND") {
            self.server.bind = bind;
        }

        if let Ok(db_path) = std::env::var("FLASHTUTOR_DB") {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }

        if let Ok(level) = std::env::var("FLASHTUTOR_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json_logs) = std::env::var("FLASHTUTOR_JSON_LOGS") {
            match json_logs.parse::<bool>() {
                Ok(v) => self.logging.json_format = v,
                Err(_) => tracing::warn!("Invalid FLASHTUTOR_JSON_LOGS: {}", json_logs),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.storage_path {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }

        if cli.verbose {
            self.logging.level = "debug".to_string();
        }

        if let crate::cli::Commands::Serve { bind: Some(bind) } = &cli.command {
            self.server.bind = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Credentials are checked separately by
    /// [`AnthropicConfig::require_api_key`] so read-only commands can run
    /// without a key.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type != "anthropic" {
            return Err(FlashtutorError::Config(format!(
                "Invalid provider type: {}. Must be one of: anthropic",
                self.provider.provider_type
            ))
            .into());
        }

        let anthropic = &self.provider.anthropic;
        if anthropic.model.trim().is_empty() {
            return Err(
                FlashtutorError::Config("provider.anthropic.model cannot be empty".to_string())
                    .into(),
            );
        }

        if anthropic.max_tokens == 0 {
            return Err(FlashtutorError::Config(
                "provider.anthropic.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if anthropic.timeout_seconds == 0 {
            return Err(FlashtutorError::Config(
                "provider.anthropic.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        url::Url::parse(&anthropic.api_base).map_err(|e| {
            FlashtutorError::Config(format!(
                "provider.anthropic.api_base is not a valid URL: {}",
                e
            ))
        })?;

        if self.pipeline.fallback_topic.trim().is_empty() {
            return Err(FlashtutorError::Config(
                "pipeline.fallback_topic cannot be empty".to_string(),
            )
            .into());
        }

        self.server.bind.parse::<SocketAddr>().map_err(|e| {
            FlashtutorError::Config(format!(
                "server.bind '{}' is not a socket address: {}",
                self.server.bind, e
            ))
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
