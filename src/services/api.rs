//! Library-level convenience functions
//!
//! Free functions over a process-wide NVML handle, configured with the
//! defaults (allow-list from `CUDA_VISIBLE_DEVICES`, process lookups on).
//! Each call queries NVML afresh; only the library handle is shared.

use crate::config::Config;
use crate::domain::DeviceRecord;
use crate::error::{AllowListError, DeviceError, Result};
use crate::host::SysinfoResolver;
use crate::nvml::NvmlSource;
use crate::services::DeviceDirectory;

use std::sync::OnceLock;

static SOURCE: OnceLock<NvmlSource> = OnceLock::new();

fn directory() -> DeviceDirectory<&'static NvmlSource, SysinfoResolver> {
    let source = SOURCE.get_or_init(NvmlSource::new);
    DeviceDirectory::from_config(source, SysinfoResolver::new(), &Config::default())
}

/// Number of installed GPUs; 0 when NVML is unavailable
pub fn count_devices() -> u32 {
    directory().count_all()
}

/// Number of entries in `CUDA_VISIBLE_DEVICES`
pub fn count_visible_devices() -> std::result::Result<usize, AllowListError> {
    directory().count_visible()
}

/// Indices of all installed GPUs
pub fn device_indices() -> Vec<u32> {
    directory().all_indices()
}

/// Indices listed in `CUDA_VISIBLE_DEVICES`, in listed order
pub fn visible_device_indices() -> std::result::Result<Vec<u32>, AllowListError> {
    directory().visible_indices()
}

/// Major and minor version of the installed driver
pub fn driver_version() -> (Option<u32>, Option<u32>) {
    directory().driver_version()
}

/// Snapshot of the GPU at `index`
pub fn get_device(index: u32) -> std::result::Result<DeviceRecord, DeviceError> {
    directory().get(index)
}

/// Snapshots of all installed GPUs
pub fn list_devices() -> std::result::Result<Vec<DeviceRecord>, DeviceError> {
    directory().all()
}

/// Snapshots of the GPUs listed in `CUDA_VISIBLE_DEVICES`
pub fn list_visible_devices() -> Result<Vec<DeviceRecord>> {
    directory().visible()
}
