//! CLI configuration: `config.toml` under the user config directory.
//!
//! ```toml
//! user = "alice"
//! curator = "alice"
//! data_path = "/home/alice/.local/share/cuppa/catalog.json"
//! shared_by_default = false
//! ```
//!
//! Every field is optional; a missing file yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// User-level CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Identity used when `--user` and `CUPPA_USER` are absent.
    pub user: Option<String>,
    /// Curator identity for the shared list.
    pub curator: Option<String>,
    /// Catalog data file; defaults to the user data directory.
    pub data_path: Option<PathBuf>,
    /// Open the shared view when no `--shared`/`--private` flag is given.
    pub shared_by_default: bool,
}

impl CliConfig {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    /// Serialize back to TOML (used by `cup init`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config")
    }
}

/// `<config-dir>/cuppa/config.toml`, when a config dir exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cuppa").join("config.toml"))
}

/// `<data-dir>/cuppa/catalog.json`, falling back to the current directory.
pub fn default_data_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("cuppa-catalog.json"),
        |d| d.join("cuppa").join("catalog.json"),
    )
}
