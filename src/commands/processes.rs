//! Processes command implementation
//!
//! Lists processes with a compute context on the selected GPUs.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, ProcessReport};
use crate::commands::{select_devices, Selection};
use crate::error::Result;
use crate::host::ProcessResolver;
use crate::nvml::TelemetrySource;
use crate::services::DeviceDirectory;

/// Build one process report per selected GPU
pub fn process_reports<S, R>(
    directory: &DeviceDirectory<S, R>,
    selection: Selection,
) -> Result<Vec<ProcessReport>>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    let devices = select_devices(directory, selection)?;
    Ok(devices.iter().map(ProcessReport::from).collect())
}

/// Execute the processes command
pub fn run_processes<S, R>(
    directory: &DeviceDirectory<S, R>,
    format: OutputFormat,
    selection: Selection,
) -> Result<()>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    print_output(&process_reports(directory, selection)?, format)?;
    Ok(())
}
