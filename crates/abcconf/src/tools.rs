//! External tool configuration - renderer, converter, transformer, preprocessor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named renderer option sets (e.g. "pretty" -> "-p").
pub type OptionSets = BTreeMap<String, String>;

/// Default renderer option sets.
pub fn default_option_sets() -> OptionSets {
    let mut sets = BTreeMap::new();
    sets.insert("none".to_string(), String::new());
    sets.insert("pretty".to_string(), "-p".to_string());
    sets.insert("pretty2".to_string(), "-P".to_string());
    sets.insert("fbook".to_string(), "-F fbook".to_string());
    sets.insert("landscape".to_string(), "-F landscape".to_string());
    sets.insert("tight".to_string(), "-F tight".to_string());
    sets
}

/// Executables and flags for the external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Notation-to-PostScript renderer.
    /// Default: abcm2ps
    #[serde(default = "ToolsConfig::default_renderer")]
    pub renderer: String,

    /// Free-form flags always passed to the renderer.
    #[serde(default)]
    pub renderer_flags: String,

    /// Flag that restricts rendering to one tune, followed by its number.
    /// Default: -e
    #[serde(default = "ToolsConfig::default_renderer_record_flag")]
    pub renderer_record_flag: String,

    /// Option set used when none is requested.
    /// Default: none
    #[serde(default = "ToolsConfig::default_option_set")]
    pub default_option_set: String,

    /// Named option sets selectable per render.
    #[serde(default = "default_option_sets")]
    pub option_sets: OptionSets,

    /// Notation-to-MIDI converter.
    /// Default: abc2midi
    #[serde(default = "ToolsConfig::default_converter")]
    pub converter: String,

    /// Free-form flags always passed to the converter.
    #[serde(default)]
    pub converter_flags: String,

    /// Notation-to-notation transformer.
    /// Default: abc2abc
    #[serde(default = "ToolsConfig::default_transformer")]
    pub transformer: String,

    /// Free-form flags always passed to the transformer.
    #[serde(default)]
    pub transformer_flags: String,

    /// Optional preprocessor executable. Empty disables preprocessing.
    #[serde(default)]
    pub preprocessor: String,

    /// Options passed to the preprocessor.
    #[serde(default)]
    pub preprocessor_options: String,

    /// Only files with this extension go through the preprocessor.
    /// Default: abp
    #[serde(default = "ToolsConfig::default_preprocessor_extension")]
    pub preprocessor_extension: String,

    /// Macro flag added to the preprocessor when producing MIDI input.
    /// Default: -MIDI
    #[serde(default = "ToolsConfig::default_midi_macro_flag")]
    pub midi_macro_flag: String,
}

impl ToolsConfig {
    fn default_renderer() -> String {
        "abcm2ps".to_string()
    }

    fn default_renderer_record_flag() -> String {
        "-e".to_string()
    }

    fn default_option_set() -> String {
        "none".to_string()
    }

    fn default_converter() -> String {
        "abc2midi".to_string()
    }

    fn default_transformer() -> String {
        "abc2abc".to_string()
    }

    fn default_preprocessor_extension() -> String {
        "abp".to_string()
    }

    fn default_midi_macro_flag() -> String {
        "-MIDI".to_string()
    }

    /// Whether a preprocessor executable is configured.
    pub fn has_preprocessor(&self) -> bool {
        !self.preprocessor.trim().is_empty()
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            renderer: Self::default_renderer(),
            renderer_flags: String::new(),
            renderer_record_flag: Self::default_renderer_record_flag(),
            default_option_set: Self::default_option_set(),
            option_sets: default_option_sets(),
            converter: Self::default_converter(),
            converter_flags: String::new(),
            transformer: Self::default_transformer(),
            transformer_flags: String::new(),
            preprocessor: String::new(),
            preprocessor_options: String::new(),
            preprocessor_extension: Self::default_preprocessor_extension(),
            midi_macro_flag: Self::default_midi_macro_flag(),
        }
    }
}
