//! Process monitoring domain types
//!
//! Types for processes holding a compute context on a GPU, enriched with
//! metadata from the OS process table.

use super::NOT_AVAILABLE;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of [`ProcessDetails::create_time`]
pub const CREATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a process start time (seconds since the epoch) in local time
///
/// Returns "N/A" for timestamps the local timezone cannot represent.
pub fn format_create_time(epoch_seconds: u64) -> String {
    i64::try_from(epoch_seconds)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).earliest())
        .map(|time| time.format(CREATE_TIME_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// OS-side metadata of a GPU process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDetails {
    /// Process name
    pub name: String,
    /// Name of the user owning the process
    pub user: String,
    /// Parent process ID (0 when there is no parent)
    pub parent_pid: u32,
    /// Parent process name
    pub parent_name: String,
    /// Start time as "YYYY-MM-DD HH:MM:SS" in local time
    pub create_time: String,
}

/// A process holding a compute context on the GPU at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuProcess {
    /// Process ID as reported by the GPU
    pub pid: u32,
    /// GPU memory attributed to this process, in the owning device's memory unit
    pub gpu_memory: Option<u64>,
    /// OS metadata; `None` when the process could not be looked up
    pub details: Option<ProcessDetails>,
}

impl GpuProcess {
    /// Create a process whose OS metadata is unknown
    pub fn new(pid: u32, gpu_memory: Option<u64>) -> Self {
        Self {
            pid,
            gpu_memory,
            details: None,
        }
    }

    /// Create a process with resolved OS metadata
    pub fn with_details(pid: u32, gpu_memory: Option<u64>, details: ProcessDetails) -> Self {
        Self {
            pid,
            gpu_memory,
            details: Some(details),
        }
    }

    /// Whether the OS lookup for this PID succeeded
    pub fn is_resolved(&self) -> bool {
        self.details.is_some()
    }

    /// Process name, if resolved
    pub fn name(&self) -> Option<&str> {
        self.details.as_ref().map(|d| d.name.as_str())
    }

    /// Get display name (name or PID)
    pub fn display_name(&self) -> String {
        self.name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Process {}", self.pid))
    }
}

impl fmt::Display for GpuProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.gpu_memory {
            Some(memory) => write!(f, "PID {} ({}): {}", self.pid, self.display_name(), memory),
            None => write!(f, "PID {} ({}): {}", self.pid, self.display_name(), NOT_AVAILABLE),
        }
    }
}

/// Compute processes of one GPU
///
/// `Unsupported` means the driver does not expose process accounting for
/// this device, which is different from a tracked but empty list.
/// Serializes as `null` and as an array respectively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessList {
    /// Process accounting is not available
    Unsupported,
    /// Processes in the order reported by the source
    Tracked(Vec<GpuProcess>),
}

impl ProcessList {
    /// Whether the source supports process accounting on this device
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Tracked(_))
    }

    /// Tracked processes; empty when unsupported
    pub fn processes(&self) -> &[GpuProcess] {
        match self {
            Self::Unsupported => &[],
            Self::Tracked(processes) => processes,
        }
    }

    /// Get number of processes
    pub fn count(&self) -> usize {
        self.processes().len()
    }

    /// Sum of the memory attributed to processes that report it
    pub fn total_gpu_memory(&self) -> u64 {
        self.processes().iter().filter_map(|p| p.gpu_memory).sum()
    }
}

impl Default for ProcessList {
    fn default() -> Self {
        Self::Tracked(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str) -> ProcessDetails {
        ProcessDetails {
            name: name.to_string(),
            user: "alice".to_string(),
            parent_pid: 1,
            parent_name: "systemd".to_string(),
            create_time: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_gpu_process_unresolved() {
        let process = GpuProcess::new(1234, Some(512));
        assert!(!process.is_resolved());
        assert_eq!(process.name(), None);
        assert_eq!(process.display_name(), "Process 1234");
    }

    #[test]
    fn test_gpu_process_with_details() {
        let process = GpuProcess::with_details(1234, Some(512), details("python"));
        assert!(process.is_resolved());
        assert_eq!(process.display_name(), "python");
        assert_eq!(process.to_string(), "PID 1234 (python): 512");
    }

    #[test]
    fn test_unsupported_differs_from_empty() {
        let unsupported = ProcessList::Unsupported;
        let empty = ProcessList::Tracked(Vec::new());

        assert!(!unsupported.is_supported());
        assert!(empty.is_supported());
        assert_ne!(unsupported, empty);
        assert_eq!(unsupported.count(), 0);
        assert_eq!(empty.count(), 0);
    }

    #[test]
    fn test_process_list_serialization() {
        assert_eq!(
            serde_json::to_string(&ProcessList::Unsupported).unwrap(),
            "null"
        );
        assert_eq!(
            serde_json::to_string(&ProcessList::Tracked(Vec::new())).unwrap(),
            "[]"
        );

        let parsed: ProcessList = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, ProcessList::Unsupported);
    }

    #[test]
    fn test_process_list_memory() {
        let list = ProcessList::Tracked(vec![
            GpuProcess::new(100, Some(256)),
            GpuProcess::new(200, None),
            GpuProcess::new(300, Some(1024)),
        ]);
        assert_eq!(list.total_gpu_memory(), 1280);
        assert_eq!(list.processes()[2].pid, 300);
    }

    #[test]
    fn test_format_create_time_layout() {
        let formatted = format_create_time(1_700_000_000);
        assert_eq!(formatted.len(), 19);
        assert_eq!(&formatted[4..5], "-");
        assert_eq!(&formatted[10..11], " ");
        assert_eq!(&formatted[13..14], ":");
    }

    #[test]
    fn test_format_create_time_out_of_range() {
        assert_eq!(format_create_time(u64::MAX), "N/A");
    }
}
