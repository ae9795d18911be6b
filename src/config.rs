//! Settings loaded from `~/.config/citemap/config.toml`.
//!
//! ```toml
//! [locate]
//! threshold = 0.35
//! onlyPrimarySections = true
//!
//! [classifier]
//! tablePageSlack = 2
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CiteError, Result};
use crate::locate::LocateOptions;
use crate::section::ClassifierConfig;

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locate: LocateOptions,
    pub classifier: ClassifierConfig,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CiteError::Config(e.to_string()))
    }
}

/// Load settings from `path`, or from the default location when `None`.
///
/// A missing file at the default location yields [`Config::default`]; an
/// explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path(), false),
    };
    if !explicit && !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| CiteError::Config(format!("failed to read {}: {e}", path.display())))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| CiteError::Config(format!("invalid TOML in {}: {e}", path.display())))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("citemap")
        .join("config.toml")
}
