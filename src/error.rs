//! Unified error types for nvinfo
//!
//! This module defines all error types used throughout the crate.
//! Uses thiserror for ergonomic error definitions.
//!
//! Note that a missing telemetry source is not an error: the source adapter
//! reports it as an absent response, and individual malformed metrics are
//! absorbed into sentinel values by the normalizer.

use std::num::ParseIntError;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from NVML operations
    #[error("NVML error: {0}")]
    Nvml(#[from] NvmlError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Requested device does not exist
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Malformed visible-device allow-list
    #[error(transparent)]
    AllowList(#[from] AllowListError),

    /// IO error (output, file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from NVML initialization
#[derive(Error, Debug)]
pub enum NvmlError {
    /// Failed to initialize NVML library
    #[error("Failed to initialize NVML: {0}")]
    InitializationFailed(String),

    /// NVML library not found
    #[error("NVML library not found. Is the NVIDIA driver installed?")]
    LibraryNotFound,
}

/// Errors raised when a device cannot be materialized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The source reported zero devices (or is unavailable)
    #[error("There are no GPU devices available")]
    NoDevices,

    /// The index has no corresponding device at query time
    #[error("Invalid device index: {index}. Valid: {valid:?}")]
    InvalidDevice { index: u32, valid: Vec<u32> },
}

/// Errors from the OS process table lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessLookupError {
    /// The process exited between the GPU snapshot and the OS lookup
    #[error("Process {0} not found")]
    NotFound(u32),

    /// The process exists but its metadata could not be read
    #[error("Process {0} metadata is not readable")]
    Unreadable(u32),
}

/// Errors from parsing the visible-device allow-list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllowListError {
    /// A token is not a non-negative device index
    #[error("Invalid device index '{token}' in allow-list: {source}")]
    InvalidToken {
        token: String,
        #[source]
        source: ParseIntError,
    },

    /// The environment variable holds non-UTF-8 data
    #[error("Environment variable {0} is not valid UTF-8")]
    NotUnicode(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
