//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::services::visibility::DEFAULT_VISIBLE_DEVICES_ENV;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Visible-device allow-list settings
    pub visibility: VisibilityConfig,
    /// Compute process settings
    pub processes: ProcessConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
}

/// Visible-device allow-list configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Environment variable holding the comma-separated allow-list
    pub env_var: String,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            env_var: DEFAULT_VISIBLE_DEVICES_ENV.to_string(),
        }
    }
}

/// Compute process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Look up OS metadata (name, user, parent) for each GPU process
    pub resolve: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self { resolve: true }
    }
}
