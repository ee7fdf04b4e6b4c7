//! Frame buffer memory domain type
//!
//! On-board memory as reported by the driver. Reported total memory is
//! affected by the ECC state: with ECC enabled the available total shrinks by
//! several percent for the parity bits. The driver may also reserve a small
//! amount of memory for internal use even without active work on the GPU.

use super::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame buffer memory usage of one GPU
///
/// `used + free` is expected to be close to `total`, but this is not
/// enforced: the driver samples each counter independently.
///
/// # Examples
///
/// ```
/// use nvinfo::domain::MemoryInfo;
///
/// let memory = MemoryInfo::new(8192.0, 2048.0, 6144.0, "MiB");
/// assert_eq!(memory.used_percent(), 25.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Total installed memory
    #[serde(deserialize_with = "super::nan_if_null")]
    pub total: f64,
    /// Memory allocated by active contexts
    #[serde(deserialize_with = "super::nan_if_null")]
    pub used: f64,
    /// Free memory
    #[serde(deserialize_with = "super::nan_if_null")]
    pub free: f64,
    /// Unit of the three counters (e.g. "MiB")
    pub unit: String,
}

impl MemoryInfo {
    /// Create a new memory info value
    pub fn new(total: f64, used: f64, free: f64, unit: impl Into<String>) -> Self {
        Self {
            total,
            used,
            free,
            unit: unit.into(),
        }
    }

    /// Share of total memory in use, in percent
    ///
    /// `NaN` if either counter is unavailable, infinite if total is zero.
    pub fn used_percent(&self) -> f64 {
        self.used / self.total * 100.0
    }

    /// Share of total memory free, in percent
    pub fn free_percent(&self) -> f64 {
        self.free / self.total * 100.0
    }
}

impl Default for MemoryInfo {
    fn default() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN, NOT_AVAILABLE)
    }
}

impl fmt::Display for MemoryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}/{:.2} {} ({:.2}%)",
            self.used,
            self.total,
            self.unit,
            self.used_percent()
        )
    }
}
