//! Info command implementation
//!
//! Shows detailed GPU information.

use crate::cli::args::{InfoArgs, OutputFormat};
use crate::cli::output::{print_output, DeviceSections};
use crate::commands::{select_devices, Selection};
use crate::error::Result;
use crate::host::ProcessResolver;
use crate::nvml::TelemetrySource;
use crate::services::DeviceDirectory;

/// Execute the info command
pub fn run_info<S, R>(
    directory: &DeviceDirectory<S, R>,
    args: &InfoArgs,
    format: OutputFormat,
    selection: Selection,
) -> Result<()>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    let devices = select_devices(directory, selection)?;

    if args.shows_all() {
        print_output(&devices, format)?;
        return Ok(());
    }

    let sections: Vec<DeviceSections> = devices
        .iter()
        .map(|device| DeviceSections::select(device, args))
        .collect();
    print_output(&sections, format)?;

    Ok(())
}
