//! Fluent builder over a figment provider stack

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

use super::models::{KintreeConfig, LayoutConfig, LoggingConfig};
use super::{ConfigError, ENV_PREFIX, Result};

/// Builds a [`KintreeConfig`] from layered sources.
///
/// Precedence, lowest to highest: compiled-in defaults, configuration file,
/// environment variables (`KINTREE_` prefix, `__` as the section separator),
/// explicit setter calls.
pub struct ConfigBuilder {
    figment: Figment,
}

impl ConfigBuilder {
    /// Start from the compiled-in defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(KintreeConfig::default())),
        }
    }

    /// Alias for [`ConfigBuilder::new`], matching call sites that read better
    /// as `ConfigBuilder::defaults().build()`.
    pub fn defaults() -> Self {
        Self::new()
    }

    /// Merge a TOML configuration file. Missing files are ignored by figment.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.figment = self.figment.merge(Toml::file(path.as_ref()));
        self
    }

    /// Merge `KINTREE_`-prefixed environment variables.
    ///
    /// Section and key are separated by a double underscore, e.g.
    /// `KINTREE_LAYOUT__NODE_WIDTH=200`.
    pub fn with_env(mut self) -> Self {
        self.figment = self.figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        self
    }

    /// Override the layout geometry.
    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.figment = self.figment.merge(Serialized::default("layout", layout));
        self
    }

    /// Override the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("logging", logging));
        self
    }

    /// Extract and validate the final configuration.
    pub fn build(self) -> Result<KintreeConfig> {
        let config: KintreeConfig = self
            .figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
