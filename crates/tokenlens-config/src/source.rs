//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// A layer of configuration applied on top of what lower-priority layers produced
pub trait ConfigurationSource {
    /// Produce a configuration from `base` plus whatever this source contributes
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn load(&self, base: ApplicationConfig) -> ConfigResult<ApplicationConfig>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;
}

/// Apply `TOKENLENS_*` environment variables
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn load(&self, base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        Ok(base.with_env_overrides())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100 // environment variables override everything
    }
}

/// Load configuration from a TOML file
///
/// Fields the file leaves out take their defaults, not the values of lower layers.
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn load(&self, _base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Load configuration from a YAML file
pub struct YamlFileSource {
    path: PathBuf,
}

impl YamlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for YamlFileSource {
    fn load(&self, _base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn name(&self) -> &'static str {
        "yaml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that layers multiple sources over the defaults
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a file source, choosing the format from the extension
    ///
    /// # Errors
    /// Returns `ConfigError::UnsupportedFormat` for anything but `.toml`, `.yaml` or `.yml`
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let source: Box<dyn ConfigurationSource> = match extension.as_deref() {
            Some("toml") => Box::new(TomlFileSource::new(path)),
            Some("yaml" | "yml") => Box::new(YamlFileSource::new(path)),
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        Ok(self.add_source(source))
    }

    /// Load configuration from all sources with priority ordering
    ///
    /// A source that fails aborts loading; a config file the caller asked for
    /// must not be silently skipped.
    ///
    /// # Errors
    /// Returns configuration loading or validation errors
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::default();

        // Lowest priority first so higher priorities land on top
        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            config = source.load(config).inspect_err(|e| {
                tracing::warn!(source = source.name(), error = %e, "Failed to load configuration source");
            })?;
            tracing::debug!(source = source.name(), "Applied configuration source");
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}
