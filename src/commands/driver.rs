//! Driver command implementation

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DriverVersion};
use crate::error::Result;
use crate::host::ProcessResolver;
use crate::nvml::TelemetrySource;
use crate::services::DeviceDirectory;

/// Execute the driver command
pub fn run_driver<S, R>(directory: &DeviceDirectory<S, R>, format: OutputFormat) -> Result<()>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    let version = DriverVersion::from(directory.driver_version());
    print_output(&version, format)?;
    Ok(())
}
