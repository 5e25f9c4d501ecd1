//! Configuration loading for abcmode.
//!
//! # Configuration File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/abcmode/config.toml` (system)
//! 2. `~/.config/abcmode/config.toml` (user)
//! 3. `./abcmode.toml` (local override, or the `--config` path)
//! 4. Environment variables (`ABCMODE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [tools]
//! renderer = "abcm2ps"
//! renderer_flags = "-O ="
//! converter = "abc2midi"
//! preprocessor = "abcpp"
//!
//! [tools.option_sets]
//! songbook = "-F songbook -s 0.8"
//!
//! [tags]
//! staves = "%%score"
//!
//! [skeleton]
//! meter = "6/8"
//! key = "D"
//!
//! [logging]
//! level = "debug"
//! ```

pub mod editing;
pub mod loader;
pub mod tools;

pub use editing::{LoggingConfig, SkeletonConfig, TagOverrides};
pub use loader::{discover_config_files_with_override, ConfigSources};
pub use tools::{default_option_sets, OptionSets, ToolsConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete abcmode configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModeConfig {
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Field marker overrides.
    #[serde(default)]
    pub tags: TagOverrides,

    #[serde(default)]
    pub skeleton: SkeletonConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ModeConfig {
    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let table = loader::load_table(&path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let mut config = loader::table_to_config(merged, Path::new("<merged>"))?;
        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let body = toml::to_string_pretty(self).unwrap_or_default();
        format!("# abcmode configuration\n\n{}", body)
    }
}
