//! Count command implementation
//!
//! Counts installed and visible GPUs.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DeviceCount};
use crate::error::Result;
use crate::host::ProcessResolver;
use crate::nvml::TelemetrySource;
use crate::services::DeviceDirectory;

/// Collect the device counts
pub fn device_count<S, R>(directory: &DeviceDirectory<S, R>) -> Result<DeviceCount>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    Ok(DeviceCount {
        installed: directory.count_all(),
        visible: directory.count_visible()?,
    })
}

/// Execute the count command
pub fn run_count<S, R>(directory: &DeviceDirectory<S, R>, format: OutputFormat) -> Result<()>
where
    S: TelemetrySource,
    R: ProcessResolver,
{
    print_output(&device_count(directory)?, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDevice, MockResolver, MockSource};

    #[test]
    fn test_device_count() {
        let var = "NVINFO_TEST_COUNT_COMMAND";
        std::env::set_var(var, "1");
        let directory = DeviceDirectory::new(
            MockSource::new()
                .with_device(MockDevice::new(0))
                .with_device(MockDevice::new(1)),
            MockResolver::new(),
        )
        .with_visible_env(var);

        let count = device_count(&directory).unwrap();
        assert_eq!(count.installed, 2);
        assert_eq!(count.visible, 1);
    }

    #[test]
    fn test_device_count_bad_allow_list() {
        let var = "NVINFO_TEST_COUNT_COMMAND_BAD";
        std::env::set_var(var, "one");
        let directory =
            DeviceDirectory::new(MockSource::new(), MockResolver::new()).with_visible_env(var);

        assert!(device_count(&directory).is_err());
    }
}
