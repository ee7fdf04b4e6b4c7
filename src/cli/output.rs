//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::{InfoArgs, OutputFormat};
use crate::domain::{
    is_unavailable, ClockInfo, DeviceRecord, GpuProcess, MemoryInfo, PciInfo, PowerInfo,
    ProcessList, UtilizationInfo, NOT_AVAILABLE,
};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T>(data: &T, format: OutputFormat) -> io::Result<()>
where
    T: Serialize + TableDisplay + ?Sized,
{
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

const BAR_WIDTH: usize = 25;
const PLACEHOLDER: &str = " [...]";

/// Render a reading, "N/A" when unavailable
fn reading(value: f64) -> String {
    if is_unavailable(value) {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

/// Render a reading right-aligned with fixed precision
fn fixed(value: f64, width: usize, precision: usize) -> String {
    if value.is_finite() {
        format!("{:>width$.precision$}", value)
    } else {
        format!("{:>width$}", NOT_AVAILABLE)
    }
}

/// Percentage bar: one `|` per 4 percent, padded to 25 columns
fn bar(percent: f64) -> String {
    let fill = if percent.is_finite() && percent > 0.0 {
        (percent / 4.0) as usize
    } else {
        0
    };
    format!("[{:<BAR_WIDTH$}]", "|".repeat(fill))
}

fn percent(value: f64) -> String {
    if is_unavailable(value) {
        NOT_AVAILABLE.to_string()
    } else {
        format!("{:.2}%", value)
    }
}

/// Collapse whitespace and truncate to `width` columns at a word boundary,
/// marking the cut with " [...]"
pub fn shorten(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let mut shortened = String::new();
    for word in words {
        let len = if shortened.is_empty() {
            word.chars().count()
        } else {
            shortened.chars().count() + 1 + word.chars().count()
        };
        if len + PLACEHOLDER.len() > width {
            break;
        }
        if !shortened.is_empty() {
            shortened.push(' ');
        }
        shortened.push_str(word);
    }

    if shortened.is_empty() {
        PLACEHOLDER.trim_start().to_string()
    } else {
        shortened + PLACEHOLDER
    }
}

impl TableDisplay for MemoryInfo {
    fn to_table(&self) -> String {
        let row = |label: &str, value: f64, share: f64| {
            format!(
                "    {:<6}: {} {} ({}%)",
                label,
                fixed(value, 10, 2),
                self.unit,
                fixed(share, 6, 2)
            )
        };
        [
            "GPU MEMORY:".to_string(),
            format!("    {:<6}: {} {} (100.00%)", "Total", fixed(self.total, 10, 2), self.unit),
            row("Used", self.used, self.used_percent()),
            row("Free", self.free, self.free_percent()),
        ]
        .join("\n")
    }
}

impl TableDisplay for UtilizationInfo {
    fn to_table(&self) -> String {
        let meter = |label: &str, value: f64| {
            format!("    {:<12}: {} {}", label, bar(value), percent(value))
        };
        [
            "GPU UTILIZATION:".to_string(),
            format!("    {:<12}: {}", "Performance", self.performance_state),
            format!("    {:<12}: {}C", "Temperature", reading(self.temperature)),
            meter("Graphics", self.gpu_percent),
            meter("Memory", self.memory_percent),
            meter("Fan", self.fan_percent),
        ]
        .join("\n")
    }
}

impl TableDisplay for PciInfo {
    fn to_table(&self) -> String {
        [
            "PCI INFO:".to_string(),
            format!("    {:<14}: {}", "Bus", self.bus),
            format!("    {:<14}: {}", "Bus ID", self.bus_id),
            format!("    {:<14}: {}", "Device", self.device),
            format!("    {:<14}: {}", "Device ID", self.device_id),
            format!("    {:<14}: {}", "Sub-System ID", self.sub_system_id),
            format!(
                "    {:<14}: {} (Max: {})",
                "Generation", self.current_link_generation, self.max_link_generation
            ),
            format!(
                "    {:<14}: {} (Max: {})",
                "Link Width", self.current_link_width, self.max_link_width
            ),
        ]
        .join("\n")
    }
}

impl TableDisplay for ClockInfo {
    fn to_table(&self) -> String {
        let clock = |label: &str, current: f64, max: f64| {
            format!("    {:<30}: {} (Max: {})", label, reading(current), reading(max))
        };
        [
            "GPU CLOCK:".to_string(),
            clock("Graphics (Shader)", self.graphics, self.max_graphics),
            clock("SM (Streaming Multiprocessor)", self.sm, self.max_sm),
            clock("Memory", self.memory, self.max_memory),
        ]
        .join("\n")
    }
}

impl TableDisplay for PowerInfo {
    fn to_table(&self) -> String {
        [
            "POWER INFO:".to_string(),
            format!("    {:<11}: {}", "Management", self.management),
            format!("    {:<11}: {}", "Draw", reading(self.draw)),
            format!("    {:<11}: {}", "Limit", reading(self.limit)),
            format!("    {:<11}: {}", "Min Limit", reading(self.min_limit)),
            format!("    {:<11}: {}", "Max Limit", reading(self.max_limit)),
        ]
        .join("\n")
    }
}

fn process_row(process: &GpuProcess) -> String {
    let memory = process
        .gpu_memory
        .map(|m| m.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let (name, user, parent, created) = match &process.details {
        Some(d) => (
            shorten(&d.name, 20),
            shorten(&d.user, 20),
            d.parent_pid.to_string(),
            d.create_time.clone(),
        ),
        None => (
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    };

    format!(
        "{:<6} | {:<20} | {:<20} | {:<8} | {:<20} | {:<6}",
        process.pid, name, user, parent, created, memory
    )
}

impl TableDisplay for ProcessList {
    fn to_table(&self) -> String {
        let mut output = String::from("PROCESSES\n");

        let ProcessList::Tracked(processes) = self else {
            output.push_str("    Not Supported\n");
            return output;
        };

        output.push_str(&format!(
            "    {:<6} | {:<20} | {:<20} | {:<8} | {:<20} | {:<6}\n",
            "PID", "NAME", "USER", "PARENT", "CREATION TIME", "GPU MEM"
        ));
        for process in processes {
            output.push_str("    ");
            output.push_str(&process_row(process));
            output.push('\n');
        }
        output
    }

    fn to_compact(&self) -> String {
        match self {
            ProcessList::Unsupported => "processes: Not Supported".to_string(),
            ProcessList::Tracked(processes) => format!(
                "processes: {} ({} total)",
                processes.len(),
                self.total_gpu_memory()
            ),
        }
    }
}

impl TableDisplay for DeviceRecord {
    fn to_table(&self) -> String {
        format!(
            "{:<13}: {}\n{:<13}: {}\n{:<13}: {}\n{:<13}: {}\n{:<13}: {}\n\n{}\n\n{}\n\n{}\n\n{}\n\n{}\n\n{}",
            "INDEX",
            self.index,
            "BOARD NAME",
            self.name,
            "SERIAL",
            self.serial,
            "UUID",
            self.uuid,
            "BIOS VERSION",
            self.bios_version,
            self.memory.to_table(),
            self.utilization.to_table(),
            self.pci.to_table(),
            self.clocks.to_table(),
            self.power.to_table(),
            self.processes.to_table(),
        )
    }

    fn to_compact(&self) -> String {
        format!(
            "{}:{} {}C gpu {} mem {}/{} {} {}",
            self.index,
            self.short_name(),
            reading(self.utilization.temperature),
            percent(self.utilization.gpu_percent),
            reading(self.memory.used),
            reading(self.memory.total),
            self.memory.unit,
            self.processes.to_compact(),
        )
    }
}

impl TableDisplay for Vec<DeviceRecord> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No GPUs found".to_string();
        }
        self.iter()
            .map(|item| item.to_table())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.iter()
            .map(|item| item.to_compact())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Selected sections of one device record
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSections {
    pub index: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<UtilizationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pci: Option<PciInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clocks: Option<ClockInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<PowerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processes: Option<ProcessList>,
}

impl DeviceSections {
    /// Keep the sections requested by `args`
    pub fn select(record: &DeviceRecord, args: &InfoArgs) -> Self {
        Self {
            index: record.index,
            name: record.name.clone(),
            memory: args.memory.then(|| record.memory.clone()),
            utilization: args.utilization.then(|| record.utilization.clone()),
            pci: args.pci.then(|| record.pci.clone()),
            clocks: args.clocks.then(|| record.clocks.clone()),
            power: args.power.then(|| record.power.clone()),
            processes: args.processes.then(|| record.processes.clone()),
        }
    }
}

impl TableDisplay for DeviceSections {
    fn to_table(&self) -> String {
        let mut parts = vec![format!("[{}] {}", self.index, self.name)];
        if let Some(memory) = &self.memory {
            parts.push(memory.to_table());
        }
        if let Some(utilization) = &self.utilization {
            parts.push(utilization.to_table());
        }
        if let Some(pci) = &self.pci {
            parts.push(pci.to_table());
        }
        if let Some(clocks) = &self.clocks {
            parts.push(clocks.to_table());
        }
        if let Some(power) = &self.power {
            parts.push(power.to_table());
        }
        if let Some(processes) = &self.processes {
            parts.push(processes.to_table());
        }
        parts.join("\n")
    }
}

impl TableDisplay for Vec<DeviceSections> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No GPUs found".to_string();
        }
        self.iter()
            .map(|item| item.to_table())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn to_compact(&self) -> String {
        self.iter()
            .map(|item| item.to_compact())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// GPU list entry for display
#[derive(Debug, Clone, Serialize)]
pub struct GpuListEntry {
    pub index: u32,
    pub name: String,
    pub uuid: String,
    pub memory_total: f64,
    pub memory_unit: String,
}

impl From<&DeviceRecord> for GpuListEntry {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            index: record.index,
            name: record.name.clone(),
            uuid: record.uuid.clone(),
            memory_total: record.memory.total,
            memory_unit: record.memory.unit.clone(),
        }
    }
}

impl TableDisplay for GpuListEntry {
    fn to_table(&self) -> String {
        format!(
            "[{}] {} (Memory: {} {}, UUID: {})",
            self.index,
            self.name,
            reading(self.memory_total),
            self.memory_unit,
            self.uuid
        )
    }

    fn to_compact(&self) -> String {
        format!("{}:{}", self.index, self.name)
    }
}

/// GPU list for display
#[derive(Debug, Clone, Serialize)]
pub struct GpuList {
    pub gpus: Vec<GpuListEntry>,
    pub driver_version: DriverVersion,
}

impl TableDisplay for GpuList {
    fn to_table(&self) -> String {
        let mut output = format!("Driver Version: {}\n", self.driver_version.to_table());
        output.push_str(&format!("GPUs Found: {}\n\n", self.gpus.len()));

        for gpu in &self.gpus {
            output.push_str(&gpu.to_table());
            output.push('\n');
        }

        output
    }

    fn to_compact(&self) -> String {
        self.gpus
            .iter()
            .map(|g| g.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Major and minor driver version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverVersion {
    pub major: Option<u32>,
    pub minor: Option<u32>,
}

impl From<(Option<u32>, Option<u32>)> for DriverVersion {
    fn from((major, minor): (Option<u32>, Option<u32>)) -> Self {
        Self { major, minor }
    }
}

impl TableDisplay for DriverVersion {
    fn to_table(&self) -> String {
        let part = |p: Option<u32>| p.map(|v| v.to_string()).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        format!("{}.{}", part(self.major), part(self.minor))
    }
}

/// Device counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceCount {
    pub installed: u32,
    pub visible: usize,
}

impl TableDisplay for DeviceCount {
    fn to_table(&self) -> String {
        format!("Installed: {}\nVisible  : {}", self.installed, self.visible)
    }

    fn to_compact(&self) -> String {
        format!("{}/{}", self.visible, self.installed)
    }
}

/// Compute processes of one device
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub gpu_index: u32,
    pub gpu_name: String,
    pub processes: ProcessList,
}

impl From<&DeviceRecord> for ProcessReport {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            gpu_index: record.index,
            gpu_name: record.name.clone(),
            processes: record.processes.clone(),
        }
    }
}

impl TableDisplay for ProcessReport {
    fn to_table(&self) -> String {
        format!("[{}] {}\n{}", self.gpu_index, self.gpu_name, self.processes.to_table())
    }

    fn to_compact(&self) -> String {
        format!("GPU {}: {}", self.gpu_index, self.processes.to_compact())
    }
}

impl TableDisplay for Vec<ProcessReport> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No GPUs found".to_string();
        }
        self.iter()
            .map(|item| item.to_table())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.iter()
            .map(|item| item.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProcessDetails;

    fn record() -> DeviceRecord {
        DeviceRecord {
            index: 0,
            name: "NVIDIA GeForce RTX 4090".to_string(),
            serial: "1324".to_string(),
            uuid: "GPU-aaaa".to_string(),
            bios_version: "95.02.18.80.5F".to_string(),
            memory: MemoryInfo::new(8192.0, 2048.0, 6144.0, "MiB"),
            utilization: UtilizationInfo::new(20.0, 10.0, 30.0, 45.0, "P2"),
            pci: PciInfo::default(),
            clocks: ClockInfo::default(),
            power: PowerInfo::default(),
            processes: ProcessList::Tracked(Vec::new()),
        }
    }

    #[test]
    fn test_memory_table() {
        let table = MemoryInfo::new(8192.0, 2048.0, 6144.0, "MiB").to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "GPU MEMORY:");
        assert_eq!(lines[1], "    Total :    8192.00 MiB (100.00%)");
        assert_eq!(lines[2], "    Used  :    2048.00 MiB ( 25.00%)");
        assert_eq!(lines[3], "    Free  :    6144.00 MiB ( 75.00%)");
    }

    #[test]
    fn test_memory_table_unavailable() {
        let table = MemoryInfo::default().to_table();
        assert!(table.contains("    Total :        N/A N/A (100.00%)"));
    }

    #[test]
    fn test_utilization_bars() {
        let table = UtilizationInfo::new(20.0, 100.0, f64::NAN, 45.0, "P2").to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[1], "    Performance : P2");
        assert_eq!(lines[2], "    Temperature : 45C");
        assert_eq!(lines[3], "    Graphics    : [|||||                    ] 20.00%");
        assert_eq!(lines[4], format!("    Memory      : [{}] 100.00%", "|".repeat(25)));
        assert_eq!(lines[5], format!("    Fan         : [{}] N/A", " ".repeat(25)));
    }

    #[test]
    fn test_pci_table() {
        let pci = PciInfo {
            current_link_generation: "3".to_string(),
            max_link_generation: "4".to_string(),
            ..PciInfo::default()
        };
        let table = pci.to_table();
        assert!(table.contains("    Generation    : 3 (Max: 4)"));
        assert!(table.contains("    Sub-System ID : N/A"));
    }

    #[test]
    fn test_clock_table() {
        let clocks = ClockInfo {
            graphics: 1800.0,
            max_graphics: 2520.0,
            ..ClockInfo::default()
        };
        let table = clocks.to_table();
        assert!(table.contains("    Graphics (Shader)             : 1800 (Max: 2520)"));
        assert!(table.contains("    Memory                        : N/A (Max: N/A)"));
    }

    #[test]
    fn test_power_table() {
        let power = PowerInfo {
            management: "Supported".to_string(),
            draw: 121.5,
            ..PowerInfo::default()
        };
        let table = power.to_table();
        assert!(table.contains("    Management : Supported"));
        assert!(table.contains("    Draw       : 121.5"));
    }

    #[test]
    fn test_process_table() {
        let list = ProcessList::Tracked(vec![
            GpuProcess::with_details(
                4242,
                Some(512),
                ProcessDetails {
                    name: "python".to_string(),
                    user: "alice".to_string(),
                    parent_pid: 1,
                    parent_name: "bash".to_string(),
                    create_time: "2024-01-01 12:00:00".to_string(),
                },
            ),
            GpuProcess::new(1234, None),
        ]);

        let table = list.to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "PROCESSES");
        assert_eq!(
            lines[1],
            "    PID    | NAME                 | USER                 | PARENT   | CREATION TIME        | GPU MEM"
        );
        assert_eq!(
            lines[2],
            "    4242   | python               | alice                | 1        | 2024-01-01 12:00:00  | 512   "
        );
        assert!(lines[3].starts_with("    1234   | N/A "));
    }

    #[test]
    fn test_process_table_unsupported() {
        assert_eq!(
            ProcessList::Unsupported.to_table(),
            "PROCESSES\n    Not Supported\n"
        );
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("python", 20), "python");
        assert_eq!(shorten("  a   b  ", 20), "a b");
        assert_eq!(shorten("the quick brown fox jumps", 20), "the quick [...]");
        assert_eq!(shorten("abcdefghijklmnopqrstuvwxyz", 20), "[...]");
    }

    #[test]
    fn test_device_record_table() {
        let table = record().to_table();
        assert!(table.starts_with("INDEX        : 0\nBOARD NAME   : NVIDIA GeForce RTX 4090\n"));
        assert!(table.contains("BIOS VERSION : 95.02.18.80.5F\n\nGPU MEMORY:"));
        assert!(table.contains("\n\nPROCESSES\n"));
    }

    #[test]
    fn test_device_record_compact() {
        let compact = record().to_compact();
        assert!(compact.starts_with("0:GeForce RTX 4090 45C"));
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_device_sections() {
        let args = InfoArgs {
            memory: true,
            power: true,
            ..InfoArgs::default()
        };
        let sections = DeviceSections::select(&record(), &args);
        assert!(sections.memory.is_some());
        assert!(sections.pci.is_none());

        let table = sections.to_table();
        assert!(table.starts_with("[0] NVIDIA GeForce RTX 4090\nGPU MEMORY:"));
        assert!(table.contains("POWER INFO:"));
        assert!(!table.contains("PCI INFO:"));

        let json = serde_json::to_value(&sections).unwrap();
        assert!(json.get("pci").is_none());
        assert!(json.get("memory").is_some());
    }

    #[test]
    fn test_driver_version_display() {
        assert_eq!(DriverVersion::from((Some(535), Some(154))).to_table(), "535.154");
        assert_eq!(DriverVersion::from((Some(550), None)).to_table(), "550.N/A");
    }

    #[test]
    fn test_gpu_list_entry_table() {
        let entry = GpuListEntry::from(&record());
        let output = entry.to_table();
        assert!(output.contains("NVIDIA GeForce RTX 4090"));
        assert!(output.contains("Memory: 8192 MiB"));
    }
}
