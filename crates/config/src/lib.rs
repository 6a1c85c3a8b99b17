//! Configuration loading, validation, and management for Docent.
//!
//! Loads configuration from `~/.docent/config.toml` with environment
//! variable overrides. Validates all settings once at startup; a session
//! never starts from an invalid configuration.

use docent_core::retrieval::{ContextPolicy, DistanceMetric};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest accepted value for `retrieval.context_limit`.
pub const MAX_CONTEXT_LIMIT: usize = 20;

/// The root configuration structure.
///
/// Maps directly to `~/.docent/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the provider endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name ("openai", "openrouter", "ollama", or "custom")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL override for OpenAI-compatible endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Chat completion model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per reply
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Per-call timeout for embedding and completion requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Corpus and ranking settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Transcript token budget
    #[serde(default)]
    pub budget: BudgetConfig,

    /// System prompt and turn instructions
    #[serde(default)]
    pub persona: PersonaConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_chat_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_output_tokens() -> u32 {
    256
}
fn default_request_timeout_secs() -> u64 {
    60
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retrieval", &self.retrieval)
            .field("budget", &self.budget)
            .field("persona", &self.persona)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Corpus file produced by `docent corpus build`
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Must be the model the corpus was embedded with
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// How many documents may be injected per turn, `0..=20`
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,

    #[serde(default)]
    pub policy: ContextPolicy,

    #[serde(default)]
    pub metric: DistanceMetric,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data.json")
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_context_limit() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            embedding_model: default_embedding_model(),
            context_limit: default_context_limit(),
            policy: ContextPolicy::default(),
            metric: DistanceMetric::default(),
        }
    }
}

/// When a transcript counts as over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStrictness {
    /// Evict while `tokens >= max_tokens`; a fitting transcript is strictly below the budget.
    #[default]
    Strict,
    /// Evict while `tokens > max_tokens`; a transcript may use the whole budget.
    Inclusive,
}

/// Which token counter estimates transcript cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// BPE encoding matched to the chat model
    #[default]
    Bpe,
    /// ~4 characters per token
    Heuristic,
}

/// Explicit per-model overhead constants, replacing the built-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverheadConfig {
    pub per_message: i64,
    pub per_name: i64,
    pub per_conversation: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum estimated transcript tokens sent per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default)]
    pub strictness: BudgetStrictness,

    #[serde(default)]
    pub tokenizer: TokenizerKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overheads: Option<OverheadConfig>,
}

fn default_max_tokens() -> usize {
    // 4096-token window minus the default reply allowance
    3840
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            strictness: BudgetStrictness::default(),
            tokenizer: TokenizerKind::default(),
            overheads: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Content of the fixed system turn
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Prepended to every query before the retrieved context
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Printed once when an interactive session opens
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_system_prompt() -> String {
    "You are an art advisor.".into()
}
fn default_instructions() -> String {
    "Answer my QUERY with the CONTEXT below, but keep it VERY brief. \
     Also, do not just paste in text in the format provided to you. And \
     make sure your responses are complete sentences in conversational \
     English - DO NOT just paste facts."
        .into()
}
fn default_greeting() -> String {
    "Hi, I'm an art advisor. How can I help you?".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            instructions: default_instructions(),
            greeting: default_greeting(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docent/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, apply environment overrides, then validate.
    ///
    /// Environment variables:
    /// - `DOCENT_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `DOCENT_MODEL`
    /// - `DOCENT_CORPUS`
    /// - `DOCENT_CONTEXT_LIMIT`
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("DOCENT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("DOCENT_MODEL") {
            config.chat_model = model;
        }

        if let Ok(corpus) = std::env::var("DOCENT_CORPUS") {
            config.retrieval.corpus_path = PathBuf::from(corpus);
        }

        if let Ok(limit) = std::env::var("DOCENT_CONTEXT_LIMIT") {
            config.retrieval.context_limit = limit.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "DOCENT_CONTEXT_LIMIT must be an integer in 0..={MAX_CONTEXT_LIMIT}, got '{limit}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docent")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.context_limit > MAX_CONTEXT_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "retrieval.context_limit must be between 0 and {MAX_CONTEXT_LIMIT}, got {}",
                self.retrieval.context_limit
            )));
        }

        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.budget.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "budget.max_tokens must be > 0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if self.retrieval.embedding_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "retrieval.embedding_model must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            retrieval: RetrievalConfig::default(),
            budget: BudgetConfig::default(),
            persona: PersonaConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
