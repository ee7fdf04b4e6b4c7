//! nvinfo - NVML-based GPU information library
//!
//! This library exposes typed snapshots of NVIDIA GPUs: static properties,
//! memory, utilization, PCI, clock and power telemetry, and the processes
//! holding a compute context on each device.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Device record types
//! - [`error`]: Error types
//! - [`host`]: OS process table lookups
//! - [`nvml`]: NVML telemetry source
//! - [`services`]: Normalization, visibility and the device directory
//!
//! # Example
//!
//! ```no_run
//! for device in nvinfo::list_devices().unwrap() {
//!     println!("{} {:.0}%", device, device.utilization.gpu_percent);
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod host;
pub mod nvml;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use domain::DeviceRecord;
pub use error::{AppError, Result};
pub use services::api::{
    count_devices, count_visible_devices, device_indices, driver_version, get_device,
    list_devices, list_visible_devices, visible_device_indices,
};
pub use services::DeviceDirectory;
