//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// An explicit path must load; without one the default locations are
    /// searched and a missing file keeps the defaults.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default(),
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with CLI verbose flag
    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        if let Some(v) = verbose {
            self.config.general.verbose = v;
        }
        self
    }

    /// Override the allow-list environment variable
    pub fn with_visible_env(mut self, env_var: Option<String>) -> Self {
        if let Some(var) = env_var {
            self.config.visibility.env_var = var;
        }
        self
    }

    /// Override OS process lookup
    pub fn with_process_resolution(mut self, resolve: Option<bool>) -> Self {
        if let Some(r) = resolve {
            self.config.processes.resolve = r;
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        if self.config.visibility.env_var.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "visibility.env_var".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_verbose(Some(true))
            .with_visible_env(Some("MY_GPUS".to_string()))
            .with_process_resolution(Some(false))
            .build()
            .unwrap();

        assert!(config.general.verbose);
        assert_eq!(config.visibility.env_var, "MY_GPUS");
        assert!(!config.processes.resolve);
    }

    #[test]
    fn test_none_keeps_value() {
        let config = ConfigBuilder::new()
            .with_verbose(None)
            .with_visible_env(None)
            .build()
            .unwrap();
        assert!(!config.general.verbose);
        assert_eq!(config.visibility.env_var, "CUDA_VISIBLE_DEVICES");
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nverbose = true\n").unwrap();

        let config = ConfigBuilder::new()
            .with_file(file.path().to_str())
            .unwrap()
            .with_verbose(Some(false))
            .build()
            .unwrap();
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let result = ConfigBuilder::new().with_file(Some("/nonexistent/nvinfo.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_env_var_rejected() {
        let result = ConfigBuilder::new()
            .with_visible_env(Some(" ".to_string()))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
