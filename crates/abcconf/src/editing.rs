//! Editing configuration - tag overrides, tune skeleton, logging.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field marker overrides, keyed by field name (e.g. `title = "T:"`).
///
/// Names are validated when the tag table is built, not here.
pub type TagOverrides = BTreeMap<String, String>;

/// Defaults for the header block inserted by `new-tune`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonConfig {
    /// Default: 4/4
    #[serde(default = "SkeletonConfig::default_meter")]
    pub meter: String,

    /// Default: 1/8
    #[serde(default = "SkeletonConfig::default_unit_length")]
    pub unit_length: String,

    /// Default: C
    #[serde(default = "SkeletonConfig::default_key")]
    pub key: String,
}

impl SkeletonConfig {
    fn default_meter() -> String {
        "4/4".to_string()
    }

    fn default_unit_length() -> String {
        "1/8".to_string()
    }

    fn default_key() -> String {
        "C".to_string()
    }
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            meter: Self::default_meter(),
            unit_length: Self::default_unit_length(),
            key: Self::default_key(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: warn
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}
