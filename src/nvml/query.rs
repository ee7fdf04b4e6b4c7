//! Telemetry query vocabulary
//!
//! [`Metric`] names every value the normalizer understands, and
//! [`RawResponse`] is the loosely-typed document a source returns for them.
//!
//! The document mirrors the `nvidia-smi` query layout:
//!
//! ```text
//! {
//!   "count": 2,
//!   "driver_version": "535.154.05",
//!   "gpu": [
//!     { "product_name": "...", "fb_memory_usage": { "total": 8192, "unit": "MiB", ... }, ... },
//!     ...
//!   ]
//! }
//! ```
//!
//! Every leaf may be missing, `null`, or of an unexpected type.

use serde_json::Value;
use std::fmt;

/// Path of the memory unit inside a device object
pub const MEMORY_UNIT_PATH: &[&str] = &["fb_memory_usage", "unit"];
/// Path of the clock unit inside a device object (shared by current and max clocks)
pub const CLOCK_UNIT_PATH: &[&str] = &["clocks", "unit"];
/// Path of the power unit inside a device object
pub const POWER_UNIT_PATH: &[&str] = &["power_readings", "unit"];

/// A metric that can be requested from a telemetry source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Count,
    DriverVersion,
    Index,
    Name,
    Serial,
    Uuid,
    VbiosVersion,
    MemoryTotal,
    MemoryUsed,
    MemoryFree,
    FanSpeed,
    GpuUtilization,
    MemoryUtilization,
    PerformanceState,
    GpuTemperature,
    PciBus,
    PciBusId,
    PciDevice,
    PciDeviceId,
    PciSubSystemId,
    PcieLinkGenCurrent,
    PcieLinkGenMax,
    PcieLinkWidthCurrent,
    PcieLinkWidthMax,
    ClocksGraphics,
    ClocksSm,
    ClocksMemory,
    MaxClocksGraphics,
    MaxClocksSm,
    MaxClocksMemory,
    PowerManagement,
    PowerDraw,
    PowerLimit,
    PowerMinLimit,
    PowerMaxLimit,
    ComputeApps,
}

impl Metric {
    /// Every per-device metric needed to build a full device record
    pub const ALL_DEVICE_INFO: &'static [Metric] = &[
        Metric::Count,
        Metric::Index,
        Metric::Name,
        Metric::Serial,
        Metric::Uuid,
        Metric::VbiosVersion,
        Metric::MemoryTotal,
        Metric::MemoryUsed,
        Metric::MemoryFree,
        Metric::FanSpeed,
        Metric::GpuUtilization,
        Metric::MemoryUtilization,
        Metric::PerformanceState,
        Metric::GpuTemperature,
        Metric::PciBus,
        Metric::PciBusId,
        Metric::PciDevice,
        Metric::PciDeviceId,
        Metric::PciSubSystemId,
        Metric::PcieLinkGenCurrent,
        Metric::PcieLinkGenMax,
        Metric::PcieLinkWidthCurrent,
        Metric::PcieLinkWidthMax,
        Metric::ClocksGraphics,
        Metric::ClocksSm,
        Metric::ClocksMemory,
        Metric::MaxClocksGraphics,
        Metric::MaxClocksSm,
        Metric::MaxClocksMemory,
        Metric::PowerManagement,
        Metric::PowerDraw,
        Metric::PowerLimit,
        Metric::PowerMinLimit,
        Metric::PowerMaxLimit,
        Metric::ComputeApps,
    ];

    /// Query name, as understood by `nvidia-smi --query-gpu`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::DriverVersion => "driver_version",
            Self::Index => "index",
            Self::Name => "name",
            Self::Serial => "serial",
            Self::Uuid => "uuid",
            Self::VbiosVersion => "vbios_version",
            Self::MemoryTotal => "memory.total",
            Self::MemoryUsed => "memory.used",
            Self::MemoryFree => "memory.free",
            Self::FanSpeed => "fan.speed",
            Self::GpuUtilization => "utilization.gpu",
            Self::MemoryUtilization => "utilization.memory",
            Self::PerformanceState => "pstate",
            Self::GpuTemperature => "temperature.gpu",
            Self::PciBus => "pci.bus",
            Self::PciBusId => "pci.bus_id",
            Self::PciDevice => "pci.device",
            Self::PciDeviceId => "pci.device_id",
            Self::PciSubSystemId => "pci.sub_device_id",
            Self::PcieLinkGenCurrent => "pcie.link.gen.current",
            Self::PcieLinkGenMax => "pcie.link.gen.max",
            Self::PcieLinkWidthCurrent => "pcie.link.width.current",
            Self::PcieLinkWidthMax => "pcie.link.width.max",
            Self::ClocksGraphics => "clocks.gr",
            Self::ClocksSm => "clocks.sm",
            Self::ClocksMemory => "clocks.mem",
            Self::MaxClocksGraphics => "clocks.max.gr",
            Self::MaxClocksSm => "clocks.max.sm",
            Self::MaxClocksMemory => "clocks.max.mem",
            Self::PowerManagement => "power.management",
            Self::PowerDraw => "power.draw",
            Self::PowerLimit => "power.limit",
            Self::PowerMinLimit => "power.min_limit",
            Self::PowerMaxLimit => "power.max_limit",
            Self::ComputeApps => "compute-apps",
        }
    }

    /// Location of this metric in the response document
    ///
    /// Top-level metrics are relative to the document root, all others to
    /// a device object inside `gpu`.
    pub fn path(&self) -> &'static [&'static str] {
        match self {
            Self::Count => &["count"],
            Self::DriverVersion => &["driver_version"],
            Self::Index => &["index"],
            Self::Name => &["product_name"],
            Self::Serial => &["serial"],
            Self::Uuid => &["uuid"],
            Self::VbiosVersion => &["vbios_version"],
            Self::MemoryTotal => &["fb_memory_usage", "total"],
            Self::MemoryUsed => &["fb_memory_usage", "used"],
            Self::MemoryFree => &["fb_memory_usage", "free"],
            Self::FanSpeed => &["fan_speed"],
            Self::GpuUtilization => &["utilization", "gpu_util"],
            Self::MemoryUtilization => &["utilization", "memory_util"],
            Self::PerformanceState => &["performance_state"],
            Self::GpuTemperature => &["temperature", "gpu_temp"],
            Self::PciBus => &["pci", "pci_bus"],
            Self::PciBusId => &["pci", "pci_bus_id"],
            Self::PciDevice => &["pci", "pci_device"],
            Self::PciDeviceId => &["pci", "pci_device_id"],
            Self::PciSubSystemId => &["pci", "pci_sub_system_id"],
            Self::PcieLinkGenCurrent => &["pci", "pci_gpu_link_info", "pcie_gen", "current_link_gen"],
            Self::PcieLinkGenMax => &["pci", "pci_gpu_link_info", "pcie_gen", "max_link_gen"],
            Self::PcieLinkWidthCurrent => {
                &["pci", "pci_gpu_link_info", "link_widths", "current_link_width"]
            }
            Self::PcieLinkWidthMax => &["pci", "pci_gpu_link_info", "link_widths", "max_link_width"],
            Self::ClocksGraphics => &["clocks", "graphics_clock"],
            Self::ClocksSm => &["clocks", "sm_clock"],
            Self::ClocksMemory => &["clocks", "mem_clock"],
            Self::MaxClocksGraphics => &["max_clocks", "graphics_clock"],
            Self::MaxClocksSm => &["max_clocks", "sm_clock"],
            Self::MaxClocksMemory => &["max_clocks", "mem_clock"],
            Self::PowerManagement => &["power_readings", "power_management"],
            Self::PowerDraw => &["power_readings", "power_draw"],
            Self::PowerLimit => &["power_readings", "power_limit"],
            Self::PowerMinLimit => &["power_readings", "min_power_limit"],
            Self::PowerMaxLimit => &["power_readings", "max_power_limit"],
            Self::ComputeApps => &["processes"],
        }
    }

    /// Whether the metric lives inside a device object
    pub fn is_device_metric(&self) -> bool {
        !matches!(self, Self::Count | Self::DriverVersion)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up a nested value by key path
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(*key))
}

/// Raw response of a telemetry query
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse(Value);

impl RawResponse {
    /// Wrap a response document
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Number of installed devices
    ///
    /// Uses the `count` metric when present, otherwise the number of device
    /// objects in the document.
    pub fn device_count(&self) -> u32 {
        match self.0.get("count").and_then(Value::as_u64) {
            Some(count) => u32::try_from(count).unwrap_or(u32::MAX),
            None => self.devices().len() as u32,
        }
    }

    /// Driver version string, if reported
    pub fn driver_version(&self) -> Option<&str> {
        self.0.get("driver_version").and_then(Value::as_str)
    }

    /// All device objects in enumeration order
    pub fn devices(&self) -> &[Value] {
        self.0
            .get("gpu")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Device object at `index`, if any
    pub fn device(&self, index: u32) -> Option<&Value> {
        self.devices().get(index as usize)
    }
}
