//! Record normalizer
//!
//! Turns the loosely-typed [`RawResponse`] of a telemetry source into a
//! strongly-typed [`DeviceRecord`]. A malformed or missing leaf never fails
//! the record: numbers fall back to `NaN` and text falls back to "N/A".

use crate::domain::{
    format_create_time, ClockInfo, DeviceRecord, GpuProcess, MemoryInfo, PciInfo, PowerInfo,
    ProcessDetails, ProcessList, UtilizationInfo, NOT_AVAILABLE,
};
use crate::host::ProcessResolver;
use crate::nvml::query::{lookup, CLOCK_UNIT_PATH, MEMORY_UNIT_PATH, POWER_UNIT_PATH};
use crate::nvml::{Metric, RawResponse};

use log::{trace, warn};
use serde_json::Value;

/// Build the record of device `index` from a raw response
///
/// Returns `None` when the response holds no device object at `index`.
/// Process metadata is looked up through `resolver` when one is given;
/// a PID that cannot be resolved keeps its GPU-side data and gets no
/// details.
pub fn normalize(
    index: u32,
    raw: &RawResponse,
    resolver: Option<&dyn ProcessResolver>,
) -> Option<DeviceRecord> {
    let device = raw.device(index)?;

    Some(DeviceRecord {
        index,
        name: text(device, Metric::Name.path()),
        serial: text(device, Metric::Serial.path()),
        uuid: text(device, Metric::Uuid.path()),
        bios_version: text(device, Metric::VbiosVersion.path()),
        memory: memory(device),
        utilization: utilization(device),
        pci: pci(device),
        clocks: clocks(device),
        power: power(device),
        processes: processes(index, device, resolver),
    })
}

fn memory(device: &Value) -> MemoryInfo {
    MemoryInfo::new(
        number(device, Metric::MemoryTotal.path()),
        number(device, Metric::MemoryUsed.path()),
        number(device, Metric::MemoryFree.path()),
        text(device, MEMORY_UNIT_PATH),
    )
}

fn utilization(device: &Value) -> UtilizationInfo {
    UtilizationInfo::new(
        number(device, Metric::GpuUtilization.path()),
        number(device, Metric::MemoryUtilization.path()),
        number(device, Metric::FanSpeed.path()),
        number(device, Metric::GpuTemperature.path()),
        text(device, Metric::PerformanceState.path()),
    )
}

fn pci(device: &Value) -> PciInfo {
    PciInfo {
        bus: pci_text(device, Metric::PciBus.path()),
        bus_id: pci_text(device, Metric::PciBusId.path()),
        device: pci_text(device, Metric::PciDevice.path()),
        device_id: pci_text(device, Metric::PciDeviceId.path()),
        sub_system_id: pci_text(device, Metric::PciSubSystemId.path()),
        current_link_generation: pci_text(device, Metric::PcieLinkGenCurrent.path()),
        max_link_generation: pci_text(device, Metric::PcieLinkGenMax.path()),
        current_link_width: pci_text(device, Metric::PcieLinkWidthCurrent.path()),
        max_link_width: pci_text(device, Metric::PcieLinkWidthMax.path()),
    }
}

fn clocks(device: &Value) -> ClockInfo {
    ClockInfo {
        graphics: number(device, Metric::ClocksGraphics.path()),
        sm: number(device, Metric::ClocksSm.path()),
        memory: number(device, Metric::ClocksMemory.path()),
        max_graphics: number(device, Metric::MaxClocksGraphics.path()),
        max_sm: number(device, Metric::MaxClocksSm.path()),
        max_memory: number(device, Metric::MaxClocksMemory.path()),
        unit: text(device, CLOCK_UNIT_PATH),
    }
}

fn power(device: &Value) -> PowerInfo {
    PowerInfo {
        management: text(device, Metric::PowerManagement.path()),
        draw: number(device, Metric::PowerDraw.path()),
        limit: number(device, Metric::PowerLimit.path()),
        min_limit: number(device, Metric::PowerMinLimit.path()),
        max_limit: number(device, Metric::PowerMaxLimit.path()),
        unit: text(device, POWER_UNIT_PATH),
    }
}

fn processes(index: u32, device: &Value, resolver: Option<&dyn ProcessResolver>) -> ProcessList {
    let entries = match lookup(device, Metric::ComputeApps.path()) {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => return ProcessList::Unsupported,
        Some(other) => {
            if other.as_str() != Some(NOT_AVAILABLE) {
                trace!("GPU {}: unexpected process list {}", index, other);
            }
            return ProcessList::Unsupported;
        }
    };

    let processes = entries
        .iter()
        .filter_map(|entry| {
            let pid = entry
                .get("pid")
                .and_then(Value::as_u64)
                .and_then(|pid| u32::try_from(pid).ok());
            match pid {
                Some(pid) => Some(process(index, pid, entry, resolver)),
                None => {
                    warn!("GPU {}: skipping process entry without a valid PID", index);
                    None
                }
            }
        })
        .collect();

    ProcessList::Tracked(processes)
}

fn process(
    index: u32,
    pid: u32,
    entry: &Value,
    resolver: Option<&dyn ProcessResolver>,
) -> GpuProcess {
    let gpu_memory = entry.get("used_memory").and_then(memory_amount);

    let Some(resolver) = resolver else {
        return GpuProcess::new(pid, gpu_memory);
    };

    match resolver.resolve(pid) {
        Ok(identity) => GpuProcess::with_details(
            pid,
            gpu_memory,
            ProcessDetails {
                name: identity.name,
                user: identity.user,
                parent_pid: identity.parent_pid,
                parent_name: identity.parent_name,
                create_time: format_create_time(identity.create_time_epoch_seconds),
            },
        ),
        Err(e) => {
            warn!("GPU {}: {}, keeping PID {} without details", index, e, pid);
            GpuProcess::new(pid, gpu_memory)
        }
    }
}

fn memory_amount(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    })
}

/// Numeric leaf; anything other than a JSON number becomes `NaN`
fn number(device: &Value, path: &[&str]) -> f64 {
    match lookup(device, path) {
        Some(value) => value.as_f64().unwrap_or_else(|| {
            trace!("{}: non-numeric value {}", path.join("."), value);
            f64::NAN
        }),
        None => f64::NAN,
    }
}

/// Text leaf; anything other than a JSON string becomes "N/A"
fn text(device: &Value, path: &[&str]) -> String {
    lookup(device, path)
        .and_then(Value::as_str)
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// PCI leaf; kept verbatim, numbers are rendered in decimal
fn pci_text(device: &Value, path: &[&str]) -> String {
    match lookup(device, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::is_unavailable;
    use crate::host::ProcessIdentity;
    use crate::mock::MockResolver;
    use serde_json::json;

    fn raw(device: Value) -> RawResponse {
        RawResponse::new(json!({ "count": 1, "gpu": [device] }))
    }

    fn full_device() -> Value {
        json!({
            "product_name": "NVIDIA GeForce RTX 4090",
            "serial": "1324",
            "uuid": "GPU-aaaa",
            "vbios_version": "95.02.18.80.5F",
            "fb_memory_usage": { "total": 24564, "used": 1024, "free": 23540, "unit": "MiB" },
            "fan_speed": 30,
            "utilization": { "gpu_util": 45, "memory_util": 12 },
            "performance_state": "P2",
            "temperature": { "gpu_temp": 61 },
            "pci": {
                "pci_bus": "01",
                "pci_bus_id": "00000000:01:00.0",
                "pci_device": "00",
                "pci_device_id": "268410DE",
                "pci_sub_system_id": "167C10DE",
                "pci_gpu_link_info": {
                    "pcie_gen": { "current_link_gen": 4, "max_link_gen": 4 },
                    "link_widths": { "current_link_width": "16x", "max_link_width": "16x" }
                }
            },
            "clocks": { "graphics_clock": 2520, "sm_clock": 2520, "mem_clock": 10501, "unit": "MHz" },
            "max_clocks": { "graphics_clock": 3105, "sm_clock": 3105, "mem_clock": 10501 },
            "power_readings": {
                "power_management": "Supported",
                "power_draw": 121.5,
                "power_limit": 450.0,
                "min_power_limit": 150.0,
                "max_power_limit": 600.0,
                "unit": "W"
            },
            "processes": [ { "pid": 4242, "used_memory": 512 } ]
        })
    }

    fn identity(name: &str) -> ProcessIdentity {
        ProcessIdentity {
            name: name.to_string(),
            user: "alice".to_string(),
            parent_pid: 1,
            parent_name: "systemd".to_string(),
            create_time_epoch_seconds: 1_700_000_000,
        }
    }

    #[test]
    fn test_normalize_full_device() {
        let record = normalize(0, &raw(full_device()), None).unwrap();

        assert_eq!(record.index, 0);
        assert_eq!(record.name, "NVIDIA GeForce RTX 4090");
        assert_eq!(record.bios_version, "95.02.18.80.5F");
        assert_eq!(record.memory.total, 24564.0);
        assert_eq!(record.memory.unit, "MiB");
        assert_eq!(record.utilization.gpu_percent, 45.0);
        assert_eq!(record.utilization.performance_state, "P2");
        assert_eq!(record.pci.bus_id, "00000000:01:00.0");
        assert_eq!(record.pci.current_link_generation, "4");
        assert_eq!(record.pci.max_link_width, "16x");
        assert_eq!(record.clocks.max_graphics, 3105.0);
        assert_eq!(record.clocks.unit, "MHz");
        assert_eq!(record.power.draw, 121.5);
        assert_eq!(record.power.unit, "W");
        assert_eq!(
            record.processes,
            ProcessList::Tracked(vec![GpuProcess::new(4242, Some(512))])
        );
    }

    #[test]
    fn test_malformed_leaf_only_affects_itself() {
        let mut device = full_device();
        device["fb_memory_usage"]["total"] = json!("N/A");

        let record = normalize(0, &raw(device), None).unwrap();
        assert!(is_unavailable(record.memory.total));
        assert_eq!(record.memory.used, 1024.0);
        assert_eq!(record.memory.free, 23540.0);
        assert_eq!(record.name, "NVIDIA GeForce RTX 4090");
    }

    #[test]
    fn test_empty_device_object_is_all_sentinels() {
        let record = normalize(0, &raw(json!({})), None).unwrap();

        assert_eq!(record.name, "N/A");
        assert_eq!(record.uuid, "N/A");
        assert!(is_unavailable(record.memory.total));
        assert_eq!(record.memory.unit, "N/A");
        assert!(is_unavailable(record.utilization.temperature));
        assert_eq!(record.pci, PciInfo::default());
        assert!(is_unavailable(record.power.max_limit));
        assert_eq!(record.processes, ProcessList::Unsupported);
    }

    #[test]
    fn test_text_rejects_non_strings() {
        let record = normalize(0, &raw(json!({ "product_name": 42 })), None).unwrap();
        assert_eq!(record.name, "N/A");
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let mut device = full_device();
        device["utilization"]["gpu_util"] = json!(150);

        let record = normalize(0, &raw(device), None).unwrap();
        assert_eq!(record.utilization.gpu_percent, 150.0);
    }

    #[test]
    fn test_null_processes_are_unsupported() {
        let mut device = full_device();
        device["processes"] = Value::Null;
        let record = normalize(0, &raw(device), None).unwrap();
        assert_eq!(record.processes, ProcessList::Unsupported);

        let mut device = full_device();
        device["processes"] = json!("N/A");
        let record = normalize(0, &raw(device), None).unwrap();
        assert_eq!(record.processes, ProcessList::Unsupported);
    }

    #[test]
    fn test_empty_processes_are_tracked() {
        let mut device = full_device();
        device["processes"] = json!([]);
        let record = normalize(0, &raw(device), None).unwrap();
        assert_eq!(record.processes, ProcessList::Tracked(Vec::new()));
    }

    #[test]
    fn test_entries_without_pid_are_skipped() {
        let mut device = full_device();
        device["processes"] = json!([
            { "used_memory": 10 },
            { "pid": "abc", "used_memory": 20 },
            { "pid": 7, "used_memory": "N/A" }
        ]);
        let record = normalize(0, &raw(device), None).unwrap();
        assert_eq!(
            record.processes,
            ProcessList::Tracked(vec![GpuProcess::new(7, None)])
        );
    }

    #[test]
    fn test_resolved_process_details() {
        let resolver = MockResolver::new().with_process(4242, identity("python"));
        let record = normalize(0, &raw(full_device()), Some(&resolver)).unwrap();

        let process = &record.processes.processes()[0];
        let details = process.details.as_ref().unwrap();
        assert_eq!(details.name, "python");
        assert_eq!(details.user, "alice");
        assert_eq!(details.parent_pid, 1);
        assert_eq!(details.create_time, format_create_time(1_700_000_000));
    }

    #[test]
    fn test_failed_lookup_keeps_process() {
        let mut device = full_device();
        device["processes"] = json!([
            { "pid": 1234, "used_memory": 100 },
            { "pid": 4242, "used_memory": 200 }
        ]);
        let resolver = MockResolver::new().with_process(4242, identity("python"));

        let record = normalize(0, &raw(device), Some(&resolver)).unwrap();
        let processes = record.processes.processes();
        assert_eq!(processes.len(), 2);
        assert_eq!(processes[0].pid, 1234);
        assert_eq!(processes[0].gpu_memory, Some(100));
        assert!(!processes[0].is_resolved());
        assert_eq!(processes[1].name(), Some("python"));
    }

    #[test]
    fn test_index_without_device_object() {
        assert!(normalize(1, &raw(full_device()), None).is_none());
        assert!(normalize(0, &RawResponse::new(json!({})), None).is_none());
    }
}
