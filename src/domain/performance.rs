//! Performance and utilization domain types
//!
//! Types for utilization rates, temperature, performance state and clocks.

use super::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};

/// GPU utilization rates and thermal state
///
/// Utilization rates report how busy the GPU was over the last sample
/// period, which lies between 1/6 second and 1 second depending on the
/// product. Values are passed through as reported and never clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationInfo {
    /// Percent of time one or more kernels were executing
    #[serde(deserialize_with = "super::nan_if_null")]
    pub gpu_percent: f64,
    /// Percent of time device memory was being read or written
    #[serde(deserialize_with = "super::nan_if_null")]
    pub memory_percent: f64,
    /// Fan speed as percent of maximum
    #[serde(deserialize_with = "super::nan_if_null")]
    pub fan_percent: f64,
    /// Core GPU temperature in Celsius
    #[serde(deserialize_with = "super::nan_if_null")]
    pub temperature: f64,
    /// Current performance state, "P0" (maximum) to "P12" (minimum)
    pub performance_state: String,
}

impl UtilizationInfo {
    /// Create a new utilization value
    pub fn new(
        gpu_percent: f64,
        memory_percent: f64,
        fan_percent: f64,
        temperature: f64,
        performance_state: impl Into<String>,
    ) -> Self {
        Self {
            gpu_percent,
            memory_percent,
            fan_percent,
            temperature,
            performance_state: performance_state.into(),
        }
    }
}

impl Default for UtilizationInfo {
    fn default() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN, NOT_AVAILABLE)
    }
}

/// Current and maximum clock frequencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockInfo {
    /// Graphics (shader) clock
    #[serde(deserialize_with = "super::nan_if_null")]
    pub graphics: f64,
    /// Streaming Multiprocessor clock
    #[serde(deserialize_with = "super::nan_if_null")]
    pub sm: f64,
    /// Memory clock
    #[serde(deserialize_with = "super::nan_if_null")]
    pub memory: f64,
    /// Maximum graphics (shader) clock
    #[serde(deserialize_with = "super::nan_if_null")]
    pub max_graphics: f64,
    /// Maximum Streaming Multiprocessor clock
    #[serde(deserialize_with = "super::nan_if_null")]
    pub max_sm: f64,
    /// Maximum memory clock
    #[serde(deserialize_with = "super::nan_if_null")]
    pub max_memory: f64,
    /// Unit of all clock values (e.g. "MHz")
    pub unit: String,
}

impl Default for ClockInfo {
    fn default() -> Self {
        Self {
            graphics: f64::NAN,
            sm: f64::NAN,
            memory: f64::NAN,
            max_graphics: f64::NAN,
            max_sm: f64::NAN,
            max_memory: f64::NAN,
            unit: NOT_AVAILABLE.to_string(),
        }
    }
}
