//! GPU device record
//!
//! Provides the DeviceRecord struct, the normalized snapshot of one GPU.

use super::{ClockInfo, MemoryInfo, PciInfo, PowerInfo, ProcessList, UtilizationInfo};
use crate::error::DeviceError;
use crate::host::ProcessResolver;
use crate::nvml::TelemetrySource;
use crate::services::DeviceDirectory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of one GPU and its telemetry
///
/// A record is built from a single telemetry query and does not change
/// until it is refreshed through a [`DeviceDirectory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// GPU index (0-based) in enumeration order at query time
    pub index: u32,
    /// Official product name (e.g. "NVIDIA GeForce RTX 4090")
    pub name: String,
    /// Board serial number as printed on the board
    pub serial: String,
    /// Globally unique immutable GPU identifier
    pub uuid: String,
    /// VBIOS version of the board
    pub bios_version: String,
    /// Frame buffer memory usage
    pub memory: MemoryInfo,
    /// Utilization, fan, temperature and performance state
    pub utilization: UtilizationInfo,
    /// PCI identifiers and link state
    pub pci: PciInfo,
    /// Current and maximum clocks
    pub clocks: ClockInfo,
    /// Power readings and limits
    pub power: PowerInfo,
    /// Processes with a compute context on the GPU
    pub processes: ProcessList,
}

impl DeviceRecord {
    /// Re-query this device and replace the snapshot in place
    ///
    /// On error the record is left unchanged.
    pub fn refresh<S, R>(&mut self, directory: &DeviceDirectory<S, R>) -> Result<(), DeviceError>
    where
        S: TelemetrySource,
        R: ProcessResolver,
    {
        directory.refresh(self)
    }

    /// Get a short display name
    pub fn short_name(&self) -> &str {
        // Remove "NVIDIA " prefix if present
        self.name.strip_prefix("NVIDIA ").unwrap_or(&self.name)
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> DeviceRecord {
        DeviceRecord {
            index: 0,
            name: name.to_string(),
            serial: "0324".to_string(),
            uuid: "GPU-xxx".to_string(),
            bios_version: "95.02.18.80.5F".to_string(),
            memory: MemoryInfo::default(),
            utilization: UtilizationInfo::default(),
            pci: PciInfo::default(),
            clocks: ClockInfo::default(),
            power: PowerInfo::default(),
            processes: ProcessList::Unsupported,
        }
    }

    #[test]
    fn test_device_record_display() {
        let device = record("NVIDIA GeForce RTX 4090");
        assert_eq!(device.to_string(), "[0] NVIDIA GeForce RTX 4090");
    }

    #[test]
    fn test_device_record_short_name() {
        let device = record("NVIDIA GeForce RTX 4090");
        assert_eq!(device.short_name(), "GeForce RTX 4090");

        let other = record("Tesla T4");
        assert_eq!(other.short_name(), "Tesla T4");
    }
}
