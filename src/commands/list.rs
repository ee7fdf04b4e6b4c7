//! List command implementation
//!
//! Lists the selected NVIDIA GPUs.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DriverVersion, GpuList, GpuListEntry};
use crate::commands::{select_devices, Selection};
use crate::error::Result;
use crate::host::ProcessResolver;
use crate::nvml::TelemetrySource;
use crate::services::DeviceDirectory;

/// Build the GPU list
pub fn gpu_list<S, R>(directory: &DeviceDirectory<S, R>, selection: Selection) -> Result<GpuList>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    let devices = select_devices(directory, selection)?;

    Ok(GpuList {
        gpus: devices.iter().map(GpuListEntry::from).collect(),
        driver_version: DriverVersion::from(directory.driver_version()),
    })
}

/// Execute the list command
pub fn run_list<S, R>(
    directory: &DeviceDirectory<S, R>,
    format: OutputFormat,
    selection: Selection,
) -> Result<()>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    print_output(&gpu_list(directory, selection)?, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::TableDisplay;
    use crate::mock::{MockDevice, MockResolver, MockSource};

    #[test]
    fn test_gpu_list() {
        let directory = DeviceDirectory::new(
            MockSource::new()
                .with_device(MockDevice::new(0).with_name("NVIDIA A100"))
                .with_device(MockDevice::new(1))
                .with_driver_version("535.154.05"),
            MockResolver::new(),
        );

        let list = gpu_list(&directory, Selection::All).unwrap();
        assert_eq!(list.gpus.len(), 2);
        assert_eq!(list.gpus[0].name, "NVIDIA A100");

        let table = list.to_table();
        assert!(table.starts_with("Driver Version: 535.154\nGPUs Found: 2\n"));
    }

    #[test]
    fn test_gpu_list_without_devices() {
        let directory = DeviceDirectory::new(MockSource::unavailable(), MockResolver::new());
        let list = gpu_list(&directory, Selection::All).unwrap();
        assert!(list.gpus.is_empty());
        assert_eq!(list.driver_version.to_table(), "N/A.N/A");
    }
}
