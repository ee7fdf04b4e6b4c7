//! PCI domain type
//!
//! Basic PCI identification for the device plus the PCIe link generation and
//! width. Some of this information may change whenever cards are added,
//! removed or moved in a system.

use super::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};

/// PCI identifiers and PCIe link state, kept as the hex text reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciInfo {
    /// PCI bus number
    pub bus: String,
    /// PCI bus id as "domain:bus:device.function"
    pub bus_id: String,
    /// PCI device number
    pub device: String,
    /// PCI vendor device id
    pub device_id: String,
    /// PCI sub system id
    pub sub_system_id: String,
    /// Current link generation, may be reduced when the GPU is idle
    pub current_link_generation: String,
    /// Maximum link generation possible with this GPU and system
    pub max_link_generation: String,
    /// Current link width, may be reduced when the GPU is idle
    pub current_link_width: String,
    /// Maximum link width possible with this GPU and system
    pub max_link_width: String,
}

impl Default for PciInfo {
    fn default() -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            bus: na(),
            bus_id: na(),
            device: na(),
            device_id: na(),
            sub_system_id: na(),
            current_link_generation: na(),
            max_link_generation: na(),
            current_link_width: na(),
            max_link_width: na(),
        }
    }
}
