//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod count;
pub mod driver;
pub mod info;
pub mod list;
pub mod processes;

pub use count::run_count;
pub use driver::run_driver;
pub use info::run_info;
pub use list::run_list;
pub use processes::run_processes;

use crate::domain::DeviceRecord;
use crate::error::Result;
use crate::host::ProcessResolver;
use crate::nvml::TelemetrySource;
use crate::services::DeviceDirectory;

/// Which devices a command operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every installed device
    #[default]
    All,
    /// Devices in the visible-device allow-list
    Visible,
    /// A single device
    Index(u32),
}

impl Selection {
    /// Selection from the global `--gpu` and `--visible` flags
    pub fn from_flags(gpu: Option<u32>, visible: bool) -> Self {
        match (gpu, visible) {
            (Some(index), _) => Self::Index(index),
            (None, true) => Self::Visible,
            (None, false) => Self::All,
        }
    }
}

/// Materialize the selected devices from one query
pub fn select_devices<S, R>(
    directory: &DeviceDirectory<S, R>,
    selection: Selection,
) -> Result<Vec<DeviceRecord>>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    let devices = match selection {
        Selection::All => directory.all()?,
        Selection::Visible => directory.visible()?,
        Selection::Index(index) => vec![directory.get(index)?],
    };
    log::debug!("Selected {} device(s) ({:?})", devices.len(), selection);
    Ok(devices)
}
