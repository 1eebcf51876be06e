//! Configuration loading, validation, and management for meetwise.
//!
//! Loads configuration from `~/.meetwise/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Length of the marker appended to truncated text.
const TRUNCATION_MARKER_CHARS: usize = 3;

/// The root configuration structure.
///
/// Maps directly to `~/.meetwise/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature for free-form generation
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Model client settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Memory store configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Context assembly limits
    #[serde(default)]
    pub context: ContextConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "openai/gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
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
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("model", &self.model)
            .field("memory", &self.memory)
            .field("context", &self.context)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Settings applied to every external model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Upper bound on a single model call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional cap on generated tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "sqlite", "in_memory" or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite database file; defaults to `~/.meetwise/memory.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_memory_backend() -> String {
    "sqlite".into()
}

const MEMORY_BACKENDS: [&str; 3] = ["sqlite", "in_memory", "none"];

/// Providers served from the local machine, which accept requests without a key.
const LOCAL_PROVIDERS: [&str; 2] = ["ollama", "vllm"];

pub fn is_local_provider(name: &str) -> bool {
    LOCAL_PROVIDERS.contains(&name)
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
        }
    }
}

impl MemoryConfig {
    /// The database path, falling back to the config directory.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("memory.db"))
    }
}

/// Limits and switches for history-aware context assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Most past records considered per turn
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Per-record cap when extracting insights
    #[serde(default = "default_extraction_item_chars")]
    pub extraction_item_chars: usize,

    /// Per-record cap when comparing summaries
    #[serde(default = "default_comparison_item_chars")]
    pub comparison_item_chars: usize,

    /// Cap on each synthesized insight field
    #[serde(default = "default_insight_field_chars")]
    pub insight_field_chars: usize,

    /// Cap on the rendered insights block
    #[serde(default = "default_insights_section_chars")]
    pub insights_section_chars: usize,

    /// Cap on the rendered delta block
    #[serde(default = "default_delta_section_chars")]
    pub delta_section_chars: usize,

    /// Items kept per delta category
    #[serde(default = "default_delta_category_items")]
    pub delta_category_items: usize,

    /// Which tool's history feeds the context window
    #[serde(default = "default_history_tool")]
    pub history_tool: String,

    /// Append a delta section to freshly generated summaries
    #[serde(default = "default_true")]
    pub post_hoc_delta: bool,

    /// Run insight synthesis and delta computation concurrently
    #[serde(default = "default_true")]
    pub concurrent_synthesis: bool,
}

fn default_max_records() -> usize {
    3
}
fn default_extraction_item_chars() -> usize {
    1200
}
fn default_comparison_item_chars() -> usize {
    2000
}
fn default_insight_field_chars() -> usize {
    500
}
fn default_insights_section_chars() -> usize {
    1200
}
fn default_delta_section_chars() -> usize {
    800
}
fn default_delta_category_items() -> usize {
    5
}
fn default_history_tool() -> String {
    "summarization".into()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
            extraction_item_chars: default_extraction_item_chars(),
            comparison_item_chars: default_comparison_item_chars(),
            insight_field_chars: default_insight_field_chars(),
            insights_section_chars: default_insights_section_chars(),
            delta_section_chars: default_delta_section_chars(),
            delta_category_items: default_delta_category_items(),
            history_tool: default_history_tool(),
            post_hoc_delta: true,
            concurrent_synthesis: true,
        }
    }
}

impl ContextConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_records == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_records must be at least 1".into(),
            ));
        }

        let caps = [
            ("extraction_item_chars", self.extraction_item_chars),
            ("comparison_item_chars", self.comparison_item_chars),
            ("insight_field_chars", self.insight_field_chars),
            ("insights_section_chars", self.insights_section_chars),
            ("delta_section_chars", self.delta_section_chars),
        ];
        for (name, cap) in caps {
            if cap <= TRUNCATION_MARKER_CHARS {
                return Err(ConfigError::ValidationError(format!(
                    "context.{name} must be greater than {TRUNCATION_MARKER_CHARS}"
                )));
            }
        }

        if self.history_tool.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "context.history_tool must not be empty".into(),
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.meetwise/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `MEETWISE_API_KEY` (highest priority)
    /// - `LLM_API_KEY`
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
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

    /// Apply environment overrides through a lookup function.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = ["MEETWISE_API_KEY", "LLM_API_KEY", "OPENROUTER_API_KEY", "OPENAI_API_KEY"]
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.is_empty()));
        }

        if let Some(provider) = lookup("MEETWISE_PROVIDER").or_else(|| lookup("LLM_PROVIDER")) {
            self.default_provider = provider.to_lowercase();
        }

        if let Some(model) = lookup("MEETWISE_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".meetwise")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "model.timeout_secs must be at least 1".into(),
            ));
        }

        if !MEMORY_BACKENDS.contains(&self.memory.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown memory backend '{}' (expected one of: {})",
                self.memory.backend,
                MEMORY_BACKENDS.join(", ")
            )));
        }

        self.context.validate()
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Whether the default provider cannot be called without a key that is not set.
    pub fn missing_api_key(&self) -> bool {
        !self.has_api_key() && !is_local_provider(&self.default_provider)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            model: ModelConfig::default(),
            memory: MemoryConfig::default(),
            context: ContextConfig::default(),
            providers: HashMap::new(),
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

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
