//! Power domain type
//!
//! When power management is enabled the GPU limits its power draw under load
//! to fit the configured envelope by adjusting the performance state.

use super::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};

/// Power readings and limits for the entire board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerInfo {
    /// "Supported" when power management is available, otherwise "N/A"
    pub management: String,
    /// Last measured power draw, accurate to within +/- 5 watts
    #[serde(deserialize_with = "super::nan_if_null")]
    pub draw: f64,
    /// Software power limit
    #[serde(deserialize_with = "super::nan_if_null")]
    pub limit: f64,
    /// Minimum value the power limit can be set to
    #[serde(deserialize_with = "super::nan_if_null")]
    pub min_limit: f64,
    /// Maximum value the power limit can be set to
    #[serde(deserialize_with = "super::nan_if_null")]
    pub max_limit: f64,
    /// Unit of all power values (e.g. "W")
    pub unit: String,
}

impl Default for PowerInfo {
    fn default() -> Self {
        Self {
            management: NOT_AVAILABLE.to_string(),
            draw: f64::NAN,
            limit: f64::NAN,
            min_limit: f64::NAN,
            max_limit: f64::NAN,
            unit: NOT_AVAILABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_default_is_unavailable() {
        let power = PowerInfo::default();
        assert_eq!(power.management, "N/A");
        assert!(power.draw.is_nan());
        assert!(power.max_limit.is_nan());
        assert_eq!(power.unit, "N/A");
    }
}
