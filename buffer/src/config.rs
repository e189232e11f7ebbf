//! Buffer configuration, loaded from `config.toml`.
//!
//! [`BufferConfig::load_with_overrides`] picks the config path: CLI override >
//! discovered > the defaults embedded from the crate's `config.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// Whether the live layer fuses edits that touch an existing change.
    #[serde(default = "default_merges_adjacent_changes")]
    pub merges_adjacent_changes: bool,

    /// Whether [`crate::TextBuffer::create_snapshot`] first folds layers that
    /// no snapshot references into the live layer.
    #[serde(default = "default_consolidate_on_snapshot")]
    pub consolidate_on_snapshot: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            merges_adjacent_changes: default_merges_adjacent_changes(),
            consolidate_on_snapshot: default_consolidate_on_snapshot(),
        }
    }
}

fn default_merges_adjacent_changes() -> bool {
    true
}

fn default_consolidate_on_snapshot() -> bool {
    true
}

impl BufferConfig {
    /// Read and deserialize a TOML config file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BufferConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration with priority: CLI override > discovered path > defaults.
    pub fn load_with_overrides(
        cli_override: Option<&Path>,
        discovered_path: Option<&Path>,
    ) -> Result<Self> {
        if let Some(path) = cli_override {
            return Self::load(path);
        }
        if let Some(path) = discovered_path {
            return Self::load(path);
        }
        Self::load_embedded()
    }

    fn load_embedded() -> Result<Self> {
        let source = include_str!("../config.toml");
        toml::from_str(source).context("Failed to parse embedded config.toml")
    }
}
