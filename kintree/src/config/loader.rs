//! Default configuration discovery

use std::path::{Path, PathBuf};

use tracing::debug;

use super::builder::ConfigBuilder;
use super::models::KintreeConfig;
use super::{DEFAULT_CONFIG_FILES, Result};

/// Loads configuration from the conventional locations.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the first file found in
    /// [`DEFAULT_CONFIG_FILES`] (relative to the working directory), then
    /// apply environment overrides.
    pub fn load() -> Result<KintreeConfig> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration rooted at the given directory.
    pub fn load_from(dir: &Path) -> Result<KintreeConfig> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = Self::find_config_file(dir) {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.with_file(path);
        }

        builder.with_env().build()
    }

    fn find_config_file(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}
