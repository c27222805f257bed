#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! Every tunable of the editing engine lives in one [`EditorConfig`] that can
//! be loaded from TOML or JSON. Missing fields take their defaults.
//!
//! ```toml
//! board_size = 13
//!
//! [history]
//! max_size = 250
//!
//! [layout]
//! cell_size = 32
//! ```
//!
//! ```rust,ignore
//! let config = EditorConfig::load("kifu.toml")?;
//! let doc = Document::new(&config, Box::new(BasicRules));
//! ```

use std::path::Path;

use kifu_core::tree::DEFAULT_BOARD_SIZE;
use kifu_layout::LayoutConfig;
use serde::{Deserialize, Serialize};

use crate::undo::HistoryConfig;

/// Largest board a record can describe.
pub const MAX_BOARD_SIZE: u16 = 52;

/// Top-level configuration for a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Board edge length for new records.
    pub board_size: u16,

    /// Undo history bounds.
    pub history: HistoryConfig,

    /// Tree layout grid.
    pub layout: LayoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            history: HistoryConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load a file, picking the format from its extension (`.json` is JSON,
    /// anything else TOML), and validate the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        tracing::debug!(
            target: "kifu.config",
            path = %path.display(),
            board_size = config.board_size,
            max_history = config.history.max_size,
            "editor config loaded"
        );
        Ok(config)
    }

    /// Check every parameter is within range.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.board_size == 0 || self.board_size > MAX_BOARD_SIZE {
            errors.push(format!(
                "board_size must be in 1..={MAX_BOARD_SIZE}, got {}",
                self.board_size
            ));
        }

        if self.layout.cell_size == 0 {
            errors.push("layout.cell_size must be > 0".into());
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading an editor configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
