#![forbid(unsafe_code)]

//! Inventory settings as data.
//!
//! ```toml
//! # gridstash.toml
//! width = 8
//! height = 4
//! auto_rotate = false
//! ```
//!
//! ```rust,ignore
//! let config = InventoryConfig::from_toml_file("gridstash.toml")?;
//! let inventory = Inventory::new(&config, catalog)?;
//! ```
//!
//! Missing keys fall back to [`InventoryConfig::default`]. Every loader
//! validates before returning.

#[cfg(feature = "config")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Arena dimensions and placement behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Arena width in cells.
    pub width: u16,
    /// Arena height in cells.
    pub height: u16,
    /// Let automatic placement fall back to the rotated orientation.
    ///
    /// Items whose definition forbids rotation never rotate regardless.
    pub auto_rotate: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            width: 6,
            height: 6,
            auto_rotate: true,
        }
    }
}

impl InventoryConfig {
    #[must_use]
    pub fn with_size(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Compact single-line JSON.
    #[cfg(feature = "config")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Problems with this config. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.width == 0 {
            errors.push("width must be > 0".into());
        }
        if self.height == 0 {
            errors.push("height must be > 0".into());
        }
        errors
    }

    /// `self` if [`validate`](Self::validate) finds nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }
}
