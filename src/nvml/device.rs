//! NVML device collection
//!
//! Reads the requested metrics of one device through nvml-wrapper and
//! writes them into a response document object. A failing NVML call only
//! leaves its own leaf `null`.

use crate::nvml::query::{Metric, CLOCK_UNIT_PATH, MEMORY_UNIT_PATH, POWER_UNIT_PATH};

use nvml_wrapper::enum_wrappers::device::{Clock, PerformanceState, TemperatureSensor};
use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::error::NvmlError as WrapperError;
use nvml_wrapper::Device;
use serde_json::{json, Map, Value};

const MIB: u64 = 1024 * 1024;

/// NVML device wrapper producing response document objects
pub struct NvmlDevice<'a> {
    device: Device<'a>,
    index: u32,
}

impl<'a> NvmlDevice<'a> {
    /// Create a new NVML device wrapper
    pub fn new(device: Device<'a>, index: u32) -> Self {
        Self { device, index }
    }

    /// Collect the requested metrics into a device object
    pub fn collect(&self, metrics: &[Metric]) -> Value {
        let wants = |metric: Metric| metrics.contains(&metric);
        let wants_any = |group: &[Metric]| group.iter().any(|m| metrics.contains(m));
        let mut doc = Map::new();

        if wants(Metric::Index) {
            insert(&mut doc, Metric::Index.path(), json!(self.index));
        }
        if wants(Metric::Name) {
            insert(&mut doc, Metric::Name.path(), text(self.device.name()));
        }
        if wants(Metric::Serial) {
            insert(&mut doc, Metric::Serial.path(), text(self.device.serial()));
        }
        if wants(Metric::Uuid) {
            insert(&mut doc, Metric::Uuid.path(), text(self.device.uuid()));
        }
        if wants(Metric::VbiosVersion) {
            insert(&mut doc, Metric::VbiosVersion.path(), text(self.device.vbios_version()));
        }

        if wants_any(&[Metric::MemoryTotal, Metric::MemoryUsed, Metric::MemoryFree]) {
            self.collect_memory(&mut doc, metrics);
        }

        if wants_any(&[Metric::GpuUtilization, Metric::MemoryUtilization]) {
            let rates = self.device.utilization_rates();
            let (gpu, memory) = match rates {
                Ok(rates) => (json!(rates.gpu), json!(rates.memory)),
                Err(e) => {
                    log::trace!("GPU {}: utilization unavailable: {}", self.index, e);
                    (Value::Null, Value::Null)
                }
            };
            if wants(Metric::GpuUtilization) {
                insert(&mut doc, Metric::GpuUtilization.path(), gpu);
            }
            if wants(Metric::MemoryUtilization) {
                insert(&mut doc, Metric::MemoryUtilization.path(), memory);
            }
            insert(&mut doc, &["utilization", "unit"], json!("%"));
        }

        if wants(Metric::FanSpeed) {
            insert(&mut doc, Metric::FanSpeed.path(), number(self.device.fan_speed(0)));
        }
        if wants(Metric::PerformanceState) {
            let state = self.device.performance_state().map(performance_state_name);
            insert(&mut doc, Metric::PerformanceState.path(), text(state));
        }
        if wants(Metric::GpuTemperature) {
            let temp = self.device.temperature(TemperatureSensor::Gpu);
            insert(&mut doc, Metric::GpuTemperature.path(), number(temp));
        }

        self.collect_pci(&mut doc, metrics);
        self.collect_clocks(&mut doc, metrics);
        self.collect_power(&mut doc, metrics);

        if wants(Metric::ComputeApps) {
            insert(&mut doc, Metric::ComputeApps.path(), self.compute_processes());
        }

        Value::Object(doc)
    }

    fn collect_memory(&self, doc: &mut Map<String, Value>, metrics: &[Metric]) {
        let (total, used, free) = match self.device.memory_info() {
            Ok(mem) => (
                json!(mem.total / MIB),
                json!(mem.used / MIB),
                json!(mem.free / MIB),
            ),
            Err(e) => {
                log::trace!("GPU {}: memory info unavailable: {}", self.index, e);
                (Value::Null, Value::Null, Value::Null)
            }
        };

        for (metric, value) in [
            (Metric::MemoryTotal, total),
            (Metric::MemoryUsed, used),
            (Metric::MemoryFree, free),
        ] {
            if metrics.contains(&metric) {
                insert(doc, metric.path(), value);
            }
        }
        insert(doc, MEMORY_UNIT_PATH, json!("MiB"));
    }

    fn collect_pci(&self, doc: &mut Map<String, Value>, metrics: &[Metric]) {
        let identity = [
            Metric::PciBus,
            Metric::PciBusId,
            Metric::PciDevice,
            Metric::PciDeviceId,
            Metric::PciSubSystemId,
        ];

        if identity.iter().any(|m| metrics.contains(m)) {
            let (bus, bus_id, device, device_id, sub_system_id) = match self.device.pci_info() {
                Ok(pci) => (
                    json!(format!("{:02X}", pci.bus)),
                    json!(pci.bus_id),
                    json!(format!("{:02X}", pci.device)),
                    json!(format!("{:08X}", pci.pci_device_id)),
                    pci.pci_sub_system_id
                        .map(|id| json!(format!("{:08X}", id)))
                        .unwrap_or(Value::Null),
                ),
                Err(e) => {
                    log::trace!("GPU {}: PCI info unavailable: {}", self.index, e);
                    (Value::Null, Value::Null, Value::Null, Value::Null, Value::Null)
                }
            };

            for (metric, value) in identity
                .into_iter()
                .zip([bus, bus_id, device, device_id, sub_system_id])
            {
                if metrics.contains(&metric) {
                    insert(doc, metric.path(), value);
                }
            }
        }

        if metrics.contains(&Metric::PcieLinkGenCurrent) {
            let gen = self.device.current_pcie_link_gen().map(|g| g.to_string());
            insert(doc, Metric::PcieLinkGenCurrent.path(), text(gen));
        }
        if metrics.contains(&Metric::PcieLinkGenMax) {
            let gen = self.device.max_pcie_link_gen().map(|g| g.to_string());
            insert(doc, Metric::PcieLinkGenMax.path(), text(gen));
        }
        if metrics.contains(&Metric::PcieLinkWidthCurrent) {
            let width = self.device.current_pcie_link_width().map(|w| format!("{}x", w));
            insert(doc, Metric::PcieLinkWidthCurrent.path(), text(width));
        }
        if metrics.contains(&Metric::PcieLinkWidthMax) {
            let width = self.device.max_pcie_link_width().map(|w| format!("{}x", w));
            insert(doc, Metric::PcieLinkWidthMax.path(), text(width));
        }
    }

    fn collect_clocks(&self, doc: &mut Map<String, Value>, metrics: &[Metric]) {
        let clocks = [
            (Metric::ClocksGraphics, Clock::Graphics, false),
            (Metric::ClocksSm, Clock::SM, false),
            (Metric::ClocksMemory, Clock::Memory, false),
            (Metric::MaxClocksGraphics, Clock::Graphics, true),
            (Metric::MaxClocksSm, Clock::SM, true),
            (Metric::MaxClocksMemory, Clock::Memory, true),
        ];

        let mut any = false;
        for (metric, clock, max) in clocks {
            if !metrics.contains(&metric) {
                continue;
            }
            any = true;
            let speed = if max {
                self.device.max_clock_info(clock)
            } else {
                self.device.clock_info(clock)
            };
            insert(doc, metric.path(), number(speed));
        }

        if any {
            insert(doc, CLOCK_UNIT_PATH, json!("MHz"));
            insert(doc, &["max_clocks", "unit"], json!("MHz"));
        }
    }

    fn collect_power(&self, doc: &mut Map<String, Value>, metrics: &[Metric]) {
        let group = [
            Metric::PowerManagement,
            Metric::PowerDraw,
            Metric::PowerLimit,
            Metric::PowerMinLimit,
            Metric::PowerMaxLimit,
        ];
        if !group.iter().any(|m| metrics.contains(m)) {
            return;
        }

        let limit = self.device.power_management_limit();

        if metrics.contains(&Metric::PowerManagement) {
            let management = if limit.is_ok() { "Supported" } else { "N/A" };
            insert(doc, Metric::PowerManagement.path(), json!(management));
        }
        if metrics.contains(&Metric::PowerDraw) {
            insert(doc, Metric::PowerDraw.path(), watts(self.device.power_usage()));
        }
        if metrics.contains(&Metric::PowerLimit) {
            insert(doc, Metric::PowerLimit.path(), watts(limit));
        }
        if metrics.contains(&Metric::PowerMinLimit) || metrics.contains(&Metric::PowerMaxLimit) {
            let (min, max) = match self.device.power_management_limit_constraints() {
                Ok(c) => (watts(Ok(c.min_limit)), watts(Ok(c.max_limit))),
                Err(e) => {
                    log::trace!("GPU {}: power constraints unavailable: {}", self.index, e);
                    (Value::Null, Value::Null)
                }
            };
            if metrics.contains(&Metric::PowerMinLimit) {
                insert(doc, Metric::PowerMinLimit.path(), min);
            }
            if metrics.contains(&Metric::PowerMaxLimit) {
                insert(doc, Metric::PowerMaxLimit.path(), max);
            }
        }
        insert(doc, POWER_UNIT_PATH, json!("W"));
    }

    /// Compute processes as `[{pid, used_memory}]`, or `null` without accounting
    fn compute_processes(&self) -> Value {
        match self.device.running_compute_processes() {
            Ok(processes) => Value::Array(
                processes
                    .into_iter()
                    .map(|p| {
                        let used_memory = match p.used_gpu_memory {
                            UsedGpuMemory::Used(bytes) => json!(bytes / MIB),
                            UsedGpuMemory::Unavailable => Value::Null,
                        };
                        json!({ "pid": p.pid, "used_memory": used_memory })
                    })
                    .collect(),
            ),
            Err(WrapperError::NotSupported) => Value::Null,
            Err(e) => {
                log::debug!("GPU {}: compute processes unavailable: {}", self.index, e);
                Value::Null
            }
        }
    }
}

/// Insert `value` at `path`, creating intermediate objects
fn insert(doc: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = doc;
    for key in parents {
        node = match node
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(map) => map,
            _ => return,
        };
    }
    node.insert(last.to_string(), value);
}

fn text(result: Result<String, WrapperError>) -> Value {
    match result {
        Ok(value) => Value::String(value),
        Err(e) => {
            log::trace!("metric unavailable: {}", e);
            Value::Null
        }
    }
}

fn number(result: Result<u32, WrapperError>) -> Value {
    match result {
        Ok(value) => json!(value),
        Err(e) => {
            log::trace!("metric unavailable: {}", e);
            Value::Null
        }
    }
}

/// NVML reports power in milliwatts
fn watts(result: Result<u32, WrapperError>) -> Value {
    match result {
        Ok(milliwatts) => json!(milliwatts as f64 / 1000.0),
        Err(e) => {
            log::trace!("metric unavailable: {}", e);
            Value::Null
        }
    }
}

/// Name of a performance state as "P0" to "P15"
fn performance_state_name(state: PerformanceState) -> String {
    let level = match state {
        PerformanceState::Zero => 0,
        PerformanceState::One => 1,
        PerformanceState::Two => 2,
        PerformanceState::Three => 3,
        PerformanceState::Four => 4,
        PerformanceState::Five => 5,
        PerformanceState::Six => 6,
        PerformanceState::Seven => 7,
        PerformanceState::Eight => 8,
        PerformanceState::Nine => 9,
        PerformanceState::Ten => 10,
        PerformanceState::Eleven => 11,
        PerformanceState::Twelve => 12,
        PerformanceState::Thirteen => 13,
        PerformanceState::Fourteen => 14,
        PerformanceState::Fifteen => 15,
        PerformanceState::Unknown => return "Unknown".to_string(),
    };
    format!("P{}", level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_creates_parents() {
        let mut doc = Map::new();
        insert(&mut doc, Metric::PcieLinkGenMax.path(), json!("4"));
        insert(&mut doc, Metric::PciBus.path(), json!("01"));

        let doc = Value::Object(doc);
        assert_eq!(doc["pci"]["pci_gpu_link_info"]["pcie_gen"]["max_link_gen"], "4");
        assert_eq!(doc["pci"]["pci_bus"], "01");
    }

    #[test]
    fn test_insert_does_not_replace_leaf_with_object() {
        let mut doc = Map::new();
        insert(&mut doc, &["fan_speed"], json!(40));
        insert(&mut doc, &["fan_speed", "nested"], json!(1));
        assert_eq!(doc["fan_speed"], json!(40));
    }

    #[test]
    fn test_performance_state_names() {
        assert_eq!(performance_state_name(PerformanceState::Zero), "P0");
        assert_eq!(performance_state_name(PerformanceState::Eight), "P8");
        assert_eq!(performance_state_name(PerformanceState::Fifteen), "P15");
        assert_eq!(performance_state_name(PerformanceState::Unknown), "Unknown");
    }

    #[test]
    fn test_watts_conversion() {
        assert_eq!(watts(Ok(250_500)), json!(250.5));
        assert_eq!(watts(Err(WrapperError::NotSupported)), Value::Null);
    }

    #[test]
    fn test_text_and_number_failures_are_null() {
        assert_eq!(text(Err(WrapperError::GpuLost)), Value::Null);
        assert_eq!(number(Err(WrapperError::NoPermission)), Value::Null);
        assert_eq!(number(Ok(45)), json!(45));
    }
}
