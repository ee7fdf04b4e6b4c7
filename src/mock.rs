//! Mock implementations for testing
//!
//! Provides a mock telemetry source and process resolver for unit testing
//! without real hardware.

use crate::error::ProcessLookupError;
use crate::host::{ProcessIdentity, ProcessResolver};
use crate::nvml::{Metric, RawResponse, TelemetrySource};

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Mock GPU device, rendered as a device object of the response document
#[derive(Debug, Clone)]
pub struct MockDevice {
    index: u32,
    name: String,
    uuid: String,
    memory_total: f64,
    memory_used: f64,
    gpu_utilization: f64,
    temperature: f64,
    processes: Option<Vec<(u32, Option<u64>)>>,
}

impl MockDevice {
    /// Create a new mock device with default values
    pub fn new(index: u32) -> Self {
        Self {
            index,
            name: format!("Mock GPU {}", index),
            uuid: format!("GPU-MOCK-{:04}", index),
            memory_total: 8192.0,
            memory_used: 1024.0,
            gpu_utilization: 25.0,
            temperature: 45.0,
            processes: Some(Vec::new()),
        }
    }

    /// Builder: set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: add a compute process
    pub fn with_process(mut self, pid: u32, used_memory: Option<u64>) -> Self {
        self.processes
            .get_or_insert_with(Vec::new)
            .push((pid, used_memory));
        self
    }

    /// Builder: report process accounting as unsupported
    pub fn without_process_accounting(mut self) -> Self {
        self.processes = None;
        self
    }

    /// Render as a device object
    pub fn to_json(&self) -> Value {
        let processes = match &self.processes {
            Some(processes) => Value::Array(
                processes
                    .iter()
                    .map(|(pid, memory)| json!({ "pid": pid, "used_memory": memory }))
                    .collect(),
            ),
            None => Value::Null,
        };

        json!({
            "index": self.index,
            "product_name": self.name,
            "serial": format!("{:010}", self.index),
            "uuid": self.uuid,
            "vbios_version": "90.00.00.00.01",
            "fb_memory_usage": {
                "total": self.memory_total,
                "used": self.memory_used,
                "free": self.memory_total - self.memory_used,
                "unit": "MiB"
            },
            "fan_speed": 30,
            "utilization": { "gpu_util": self.gpu_utilization, "memory_util": 10 },
            "performance_state": "P2",
            "temperature": { "gpu_temp": self.temperature },
            "pci": {
                "pci_bus": format!("{:02X}", self.index + 1),
                "pci_bus_id": format!("00000000:{:02X}:00.0", self.index + 1),
                "pci_device": "00",
                "pci_device_id": "268410DE",
                "pci_sub_system_id": "167C10DE",
                "pci_gpu_link_info": {
                    "pcie_gen": { "current_link_gen": 4, "max_link_gen": 4 },
                    "link_widths": { "current_link_width": "16x", "max_link_width": "16x" }
                }
            },
            "clocks": { "graphics_clock": 1800, "sm_clock": 1800, "mem_clock": 9501, "unit": "MHz" },
            "max_clocks": { "graphics_clock": 2520, "sm_clock": 2520, "mem_clock": 10501 },
            "power_readings": {
                "power_management": "Supported",
                "power_draw": 120.5,
                "power_limit": 300.0,
                "min_power_limit": 100.0,
                "max_power_limit": 400.0,
                "unit": "W"
            },
            "processes": processes
        })
    }
}

/// Mock telemetry source serving fixed device documents
#[derive(Debug)]
pub struct MockSource {
    devices: RwLock<Vec<Value>>,
    driver_version: Option<String>,
    available: bool,
    queries: AtomicUsize,
}

impl MockSource {
    /// Create an available source without devices
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            driver_version: None,
            available: true,
            queries: AtomicUsize::new(0),
        }
    }

    /// Create a source that behaves like a host without NVML
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Builder: add a device
    pub fn with_device(self, device: MockDevice) -> Self {
        self.with_raw_device(device.to_json())
    }

    /// Builder: add an arbitrary device object
    pub fn with_raw_device(mut self, device: Value) -> Self {
        if let Ok(devices) = self.devices.get_mut() {
            devices.push(device);
        }
        self
    }

    /// Builder: set the reported driver version
    pub fn with_driver_version(mut self, version: impl Into<String>) -> Self {
        self.driver_version = Some(version.into());
        self
    }

    /// Change the GPU utilization of a device between queries
    pub fn set_gpu_utilization(&self, index: usize, percent: f64) {
        if let Ok(mut devices) = self.devices.write() {
            if let Some(device) = devices.get_mut(index) {
                device["utilization"]["gpu_util"] = json!(percent);
            }
        }
    }

    /// Number of queries served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for MockSource {
    fn query(&self, metrics: &[Metric]) -> Option<RawResponse> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return None;
        }

        let devices = self.devices.read().ok()?;
        let mut document = Map::new();

        if metrics.contains(&Metric::Count) {
            document.insert("count".to_string(), json!(devices.len()));
        }
        if metrics.contains(&Metric::DriverVersion) {
            if let Some(version) = &self.driver_version {
                document.insert("driver_version".to_string(), json!(version));
            }
        }
        if metrics.iter().any(Metric::is_device_metric) {
            document.insert("gpu".to_string(), Value::Array(devices.clone()));
        }

        Some(RawResponse::new(Value::Object(document)))
    }
}

/// Mock process resolver backed by a PID map
///
/// PIDs not in the map fail with [`ProcessLookupError::NotFound`].
#[derive(Debug, Default)]
pub struct MockResolver {
    processes: HashMap<u32, ProcessIdentity>,
    lookups: AtomicUsize,
}

impl MockResolver {
    /// Create a resolver that knows no processes
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a process
    pub fn with_process(mut self, pid: u32, identity: ProcessIdentity) -> Self {
        self.processes.insert(pid, identity);
        self
    }

    /// Number of lookups performed so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ProcessResolver for MockResolver {
    fn resolve(&self, pid: u32) -> Result<ProcessIdentity, ProcessLookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.processes
            .get(&pid)
            .cloned()
            .ok_or(ProcessLookupError::NotFound(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_counts_queries() {
        let source = MockSource::new().with_device(MockDevice::new(0));
        assert_eq!(source.query_count(), 0);

        let raw = source.query(Metric::ALL_DEVICE_INFO).unwrap();
        assert_eq!(raw.device_count(), 1);
        assert_eq!(source.query_count(), 1);
    }

    #[test]
    fn test_mock_source_unavailable() {
        let source = MockSource::unavailable().with_device(MockDevice::new(0));
        assert!(source.query(&[Metric::Count]).is_none());
        assert_eq!(source.query_count(), 1);
    }

    #[test]
    fn test_mock_source_only_requested_sections() {
        let source = MockSource::new()
            .with_device(MockDevice::new(0))
            .with_driver_version("550.54.14");

        let raw = source.query(&[Metric::DriverVersion]).unwrap();
        assert_eq!(raw.driver_version(), Some("550.54.14"));
        assert!(raw.devices().is_empty());
    }

    #[test]
    fn test_mock_device_processes() {
        let device = MockDevice::new(0).with_process(42, Some(128)).to_json();
        assert_eq!(device["processes"], json!([{ "pid": 42, "used_memory": 128 }]));

        let device = MockDevice::new(0).without_process_accounting().to_json();
        assert_eq!(device["processes"], Value::Null);
    }

    #[test]
    fn test_mock_resolver() {
        let resolver = MockResolver::new().with_process(
            7,
            ProcessIdentity {
                name: "trainer".to_string(),
                user: "bob".to_string(),
                parent_pid: 1,
                parent_name: "init".to_string(),
                create_time_epoch_seconds: 0,
            },
        );
        assert_eq!(resolver.resolve(7).unwrap().name, "trainer");
        assert_eq!(resolver.resolve(8), Err(ProcessLookupError::NotFound(8)));
        assert_eq!(resolver.lookup_count(), 2);
    }
}
