//! Domain models for nvinfo
//!
//! This module contains the normalized per-device snapshot types.
//! Fields the telemetry source could not provide carry sentinel values:
//! `NaN` for numbers and [`NOT_AVAILABLE`] for text.

pub mod gpu;
pub mod memory;
pub mod pcie;
pub mod performance;
pub mod power;
pub mod process;

pub use gpu::DeviceRecord;
pub use memory::MemoryInfo;
pub use pcie::PciInfo;
pub use performance::{ClockInfo, UtilizationInfo};
pub use power::PowerInfo;

use serde::{Deserialize, Deserializer};
pub use process::{format_create_time, GpuProcess, ProcessDetails, ProcessList};

/// Text sentinel for missing or wrongly-typed string metrics
pub const NOT_AVAILABLE: &str = "N/A";

/// Deserialize a numeric metric, reading `null` back as the `NaN` sentinel
///
/// serde_json writes `NaN` as `null`, so this keeps JSON output readable.
pub(crate) fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Returns true when a numeric metric holds the missing-value sentinel
#[inline]
pub fn is_unavailable(value: f64) -> bool {
    value.is_nan()
}
