//! Centralized configuration management for tokenlens
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Optional TOML or YAML file
//! 3. `TOKENLENS_*` environment variable overrides
//! 4. Runtime validation

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use source::{
    ConfigurationLoader, ConfigurationSource, EnvironmentSource, TomlFileSource, YamlFileSource,
};
pub use validation::Validate;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tokenlens_common::TokenizerTier;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

// Limit checking
const DEFAULT_BATCH_DIVISOR: usize = 2; // batch size = token_limit / divisor
const MAX_BATCH_DIVISOR: u64 = 1024;
const DEFAULT_MAX_BATCHES: usize = 1000; // planning decodes one prefix per batch
const MAX_MAX_BATCHES: u64 = 100_000;

// Tokenizers
const DEFAULT_CHARS_PER_TOKEN: usize = 4;
const MAX_CHARS_PER_TOKEN: u64 = 64;
const DEFAULT_TOKENIZER_SUBDIR: &str = "tokenizers";

// API Server Configuration
const DEFAULT_API_HOST: &str = "127.0.0.1"; // Localhost only
const DEFAULT_API_PORT: u16 = 8000;
const DEFAULT_API_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_API_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const MIN_API_MAX_BODY_BYTES: u64 = 1024;
const MAX_API_MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;
const DEFAULT_API_ENABLE_DOCS: bool = true;

// Telemetry Configuration
const DEFAULT_TRACING_LEVEL: &str = "info";
const DEFAULT_JSON_LOGS: bool = false;
const DEFAULT_TELEMETRY_SERVICE_NAME: &str = "tokenlens";

const APP_DIR_NAME: &str = "tokenlens";

/// Core configuration for the whole tokenlens application
///
/// Every field has a safe default, so a partial TOML or YAML file only needs
/// to mention what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Limit checking behaviour
    pub limits: LimitsConfig,

    /// Tokenizer resolution and storage
    pub tokenizer: TokenizerConfig,

    /// Model catalog sources
    pub catalog: CatalogConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// Limit checking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Recommended batch size is `token_limit / batch_divisor`, floored at one token
    pub batch_divisor: usize,

    /// Largest split a check will plan; a request needing more batches is rejected
    pub max_batches: usize,

    /// Tier used when a request does not name one
    pub default_tier: TokenizerTier,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            batch_divisor: DEFAULT_BATCH_DIVISOR,
            max_batches: DEFAULT_MAX_BATCHES,
            default_tier: TokenizerTier::default(),
        }
    }
}

impl LimitsConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.batch_divisor = env_or("TOKENLENS_LIMITS_BATCH_DIVISOR", self.batch_divisor);
        self.max_batches = env_or("TOKENLENS_LIMITS_MAX_BATCHES", self.max_batches);
        self.default_tier = env_or("TOKENLENS_LIMITS_DEFAULT_TIER", self.default_tier);
        self
    }
}

impl Validate for LimitsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(
            self.batch_divisor as u64,
            1,
            MAX_BATCH_DIVISOR,
            "limits.batch_divisor",
        )?;
        validation::validate_range(
            self.max_batches as u64,
            1,
            MAX_MAX_BATCHES,
            "limits.max_batches",
        )
    }
}

/// Tokenizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Root of the local tokenizer store, laid out as `<provider>/<model>/tokenizer.json`
    pub huggingface_dir: PathBuf,

    /// Upper bound on characters per piece for the approximate tokenizer
    pub chars_per_token: usize,

    /// Alternative HuggingFace Hub endpoint (mirror) for `fetch-tokenizer`
    pub hub_endpoint: Option<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            huggingface_dir: default_tokenizer_dir(),
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            hub_endpoint: None,
        }
    }
}

impl TokenizerConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("TOKENLENS_TOKENIZER_HUGGINGFACE_DIR") {
            self.huggingface_dir = PathBuf::from(dir);
        }
        self.chars_per_token = env_or("TOKENLENS_TOKENIZER_CHARS_PER_TOKEN", self.chars_per_token);
        if let Ok(endpoint) = std::env::var("TOKENLENS_TOKENIZER_HUB_ENDPOINT") {
            self.hub_endpoint = Some(endpoint);
        }
        self
    }
}

impl Validate for TokenizerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(
            &self.huggingface_dir.to_string_lossy(),
            "tokenizer.huggingface_dir",
        )?;
        validation::validate_range(
            self.chars_per_token as u64,
            1,
            MAX_CHARS_PER_TOKEN,
            "tokenizer.chars_per_token",
        )?;
        if let Some(ref endpoint) = self.hub_endpoint {
            validation::validate_url(endpoint, "tokenizer.hub_endpoint")?;
        }
        Ok(())
    }
}

/// Model catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory of provider tables (`*.toml`) merged over the built-in catalog
    pub overrides_dir: Option<PathBuf>,
}

impl CatalogConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("TOKENLENS_CATALOG_OVERRIDES_DIR") {
            self.overrides_dir = Some(PathBuf::from(dir));
        }
        self
    }
}

impl Validate for CatalogConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref dir) = self.overrides_dir {
            validation::validate_existing_dir(dir, "catalog.overrides_dir")?;
        }
        Ok(())
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Upper bound on a single limit check, in seconds
    pub timeout_seconds: u64,

    /// Largest accepted request body
    pub max_body_bytes: usize,

    /// Enable OpenAPI/Swagger documentation
    pub enable_docs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
            timeout_seconds: DEFAULT_API_TIMEOUT_SECONDS,
            max_body_bytes: DEFAULT_API_MAX_BODY_BYTES,
            enable_docs: DEFAULT_API_ENABLE_DOCS,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("TOKENLENS_API_HOST") {
            self.host = host;
        }
        self.port = env_or("TOKENLENS_API_PORT", self.port);
        self.timeout_seconds = env_or("TOKENLENS_API_TIMEOUT_SECONDS", self.timeout_seconds);
        self.max_body_bytes = env_or("TOKENLENS_API_MAX_BODY_BYTES", self.max_body_bytes);
        self.enable_docs = env_or("TOKENLENS_API_ENABLE_DOCS", self.enable_docs);
        self
    }

    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.host, "api.host")?;
        validation::validate_port(self.port, "api.port")?;
        validation::validate_range(self.timeout_seconds, 1, 3600, "api.timeout_seconds")?;
        validation::validate_range(
            self.max_body_bytes as u64,
            MIN_API_MAX_BODY_BYTES,
            MAX_API_MAX_BODY_BYTES,
            "api.max_body_bytes",
        )?;
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Tracing level (trace, debug, info, warn, error), used when `RUST_LOG` is unset
    pub tracing_level: String,

    /// Emit JSON log lines instead of the human-readable format
    pub json_logs: bool,

    /// Write daily-rotated log files here in addition to stderr
    pub log_dir: Option<PathBuf>,

    /// Service name recorded in startup logs
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_level: DEFAULT_TRACING_LEVEL.to_string(),
            json_logs: DEFAULT_JSON_LOGS,
            log_dir: None,
            service_name: DEFAULT_TELEMETRY_SERVICE_NAME.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("TOKENLENS_TELEMETRY_TRACING_LEVEL") {
            self.tracing_level = level;
        }
        self.json_logs = env_or("TOKENLENS_TELEMETRY_JSON_LOGS", self.json_logs);
        if let Ok(dir) = std::env::var("TOKENLENS_TELEMETRY_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Ok(name) = std::env::var("TOKENLENS_TELEMETRY_SERVICE_NAME") {
            self.service_name = name;
        }
        self
    }
}

impl Validate for TelemetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.service_name, "telemetry.service_name")?;

        match self.tracing_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Generic {
                message: format!("Invalid tracing level: {}", self.tracing_level),
            }),
        }
    }
}

impl ApplicationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any `TOKENLENS_*` variables that are set on top of `self`
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            limits: self.limits.with_env_overrides(),
            tokenizer: self.tokenizer.with_env_overrides(),
            catalog: self.catalog.with_env_overrides(),
            api: self.api.with_env_overrides(),
            telemetry: self.telemetry.with_env_overrides(),
        }
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.limits.validate()?;
        self.tokenizer.validate()?;
        self.catalog.validate()?;
        self.api.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

/// Parse an environment variable, keeping `current` when unset or unparsable
fn env_or<T: FromStr>(key: &str, current: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment override");
            current
        }),
        Err(_) => current,
    }
}

/// `<cache dir>/tokenlens/tokenizers`, falling back to a relative directory
fn default_tokenizer_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || PathBuf::from(".tokenlens").join(DEFAULT_TOKENIZER_SUBDIR),
        |cache| cache.join(APP_DIR_NAME).join(DEFAULT_TOKENIZER_SUBDIR),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_config_uses_safe_defaults() {
        let config = ApplicationConfig::default();

        assert_eq!(config.limits.batch_divisor, DEFAULT_BATCH_DIVISOR);
        assert_eq!(config.limits.max_batches, DEFAULT_MAX_BATCHES);
        assert_eq!(config.limits.default_tier, TokenizerTier::Precise);
        assert_eq!(config.tokenizer.chars_per_token, DEFAULT_CHARS_PER_TOKEN);
        assert!(config.tokenizer.huggingface_dir.ends_with("tokenizers"));
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.api.port, 8000);
        assert!(config.catalog.overrides_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_variable_overrides() {
        unsafe {
            std::env::set_var("TOKENLENS_LIMITS_BATCH_DIVISOR", "4");
            std::env::set_var("TOKENLENS_LIMITS_DEFAULT_TIER", "approximate");
            std::env::set_var("TOKENLENS_API_PORT", "1234");
        }

        let config = ApplicationConfig::from_env();

        assert_eq!(config.limits.batch_divisor, 4);
        assert_eq!(config.limits.default_tier, TokenizerTier::Approximate);
        assert_eq!(config.api.port, 1234);

        unsafe {
            std::env::remove_var("TOKENLENS_LIMITS_BATCH_DIVISOR");
            std::env::remove_var("TOKENLENS_LIMITS_DEFAULT_TIER");
            std::env::remove_var("TOKENLENS_API_PORT");
        }
    }

    #[test]
    fn test_unparsable_override_keeps_current_value() {
        unsafe {
            std::env::set_var("TOKENLENS_TOKENIZER_CHARS_PER_TOKEN", "lots");
        }
        let config = TokenizerConfig::from_env();
        assert_eq!(config.chars_per_token, DEFAULT_CHARS_PER_TOKEN);
        unsafe {
            std::env::remove_var("TOKENLENS_TOKENIZER_CHARS_PER_TOKEN");
        }
    }

    #[test]
    fn test_validation_rejects_zero_batch_divisor() {
        let mut config = ApplicationConfig::default();
        config.limits.batch_divisor = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("limits.batch_divisor"));
    }

    #[test]
    fn test_validation_rejects_zero_max_batches() {
        let mut config = ApplicationConfig::default();
        config.limits.max_batches = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("limits.max_batches"));
    }

    #[test]
    fn test_validation_rejects_bad_hub_endpoint() {
        let mut config = ApplicationConfig::default();
        config.tokenizer.hub_endpoint = Some("not a url".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_missing_overrides_dir() {
        let mut config = ApplicationConfig::default();
        config.catalog.overrides_dir = Some(PathBuf::from("/definitely/not/here/tokenlens"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_telemetry_config_validation() {
        let mut config = ApplicationConfig::default();
        config.telemetry.tracing_level = "invalid-level".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid tracing level"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ApplicationConfig = toml::from_str(
            r#"
            [limits]
            default_tier = "approximate"

            [api]
            port = 9100
            "#,
        )
        .unwrap();

        assert_eq!(config.limits.default_tier, TokenizerTier::Approximate);
        assert_eq!(config.limits.batch_divisor, DEFAULT_BATCH_DIVISOR);
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.api.host, DEFAULT_API_HOST);
    }

    #[test]
    fn test_configuration_serialization_roundtrip() {
        let original = ApplicationConfig::default();
        let toml_string = toml::to_string(&original).unwrap();
        assert!(toml_string.contains("[limits]"));

        let parsed: ApplicationConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.api.port, original.api.port);
        assert_eq!(parsed.tokenizer.huggingface_dir, original.tokenizer.huggingface_dir);
        assert!(parsed.validate().is_ok());
    }
}
