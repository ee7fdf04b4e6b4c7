//! Device directory
//!
//! Entry point for enumerating GPUs and materializing device records.
//! Every operation queries the telemetry source afresh; nothing is cached
//! between calls, and a multi-device fetch shares a single query.

use crate::config::Config;
use crate::domain::DeviceRecord;
use crate::error::{AllowListError, DeviceError, Result};
use crate::host::{ProcessResolver, SysinfoResolver};
use crate::nvml::{Metric, NvmlSource, RawResponse, TelemetrySource};
use crate::services::normalizer::normalize;
use crate::services::visibility::{visible_indices_from_env, DEFAULT_VISIBLE_DEVICES_ENV};

use log::debug;

/// Split a driver version such as "535.154.05" into major and minor
///
/// Each component that is missing or not an integer becomes `None`.
pub fn parse_driver_version(version: &str) -> (Option<u32>, Option<u32>) {
    let mut parts = version.trim().split('.');
    let major = parts.next().and_then(|p| p.parse().ok());
    let minor = parts.next().and_then(|p| p.parse().ok());
    (major, minor)
}

/// Directory of installed GPUs
pub struct DeviceDirectory<S, R> {
    source: S,
    resolver: R,
    resolve_processes: bool,
    visible_env: String,
}

impl DeviceDirectory<NvmlSource, SysinfoResolver> {
    /// Directory backed by NVML and the OS process table
    ///
    /// An NVML initialization failure is logged and leaves a directory that
    /// reports zero devices.
    pub fn nvml(config: &Config) -> Self {
        Self::from_config(NvmlSource::new(), SysinfoResolver::new(), config)
    }
}

impl<S: TelemetrySource, R: ProcessResolver> DeviceDirectory<S, R> {
    /// Create a directory with default settings
    pub fn new(source: S, resolver: R) -> Self {
        Self {
            source,
            resolver,
            resolve_processes: true,
            visible_env: DEFAULT_VISIBLE_DEVICES_ENV.to_string(),
        }
    }

    /// Create a directory with settings taken from `config`
    pub fn from_config(source: S, resolver: R, config: &Config) -> Self {
        Self::new(source, resolver)
            .with_visible_env(config.visibility.env_var.clone())
            .with_process_resolution(config.processes.resolve)
    }

    /// Builder: read the allow-list from another environment variable
    pub fn with_visible_env(mut self, env_var: impl Into<String>) -> Self {
        self.visible_env = env_var.into();
        self
    }

    /// Builder: enable or disable OS process lookups
    pub fn with_process_resolution(mut self, enabled: bool) -> Self {
        self.resolve_processes = enabled;
        self
    }

    /// The underlying telemetry source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The process resolver
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Number of installed devices; 0 when the source is unavailable
    pub fn count_all(&self) -> u32 {
        self.source
            .query(&[Metric::Count])
            .map(|raw| raw.device_count())
            .unwrap_or(0)
    }

    /// Indices of all installed devices, in enumeration order
    pub fn all_indices(&self) -> Vec<u32> {
        (0..self.count_all()).collect()
    }

    /// Indices listed in the visible-device allow-list, in listed order
    ///
    /// Indices are not checked against the installed devices.
    pub fn visible_indices(&self) -> std::result::Result<Vec<u32>, AllowListError> {
        visible_indices_from_env(&self.visible_env)
    }

    /// Number of entries in the visible-device allow-list
    pub fn count_visible(&self) -> std::result::Result<usize, AllowListError> {
        self.visible_indices().map(|indices| indices.len())
    }

    /// Major and minor driver version
    pub fn driver_version(&self) -> (Option<u32>, Option<u32>) {
        self.source
            .query(&[Metric::DriverVersion])
            .and_then(|raw| raw.driver_version().map(parse_driver_version))
            .unwrap_or((None, None))
    }

    /// Materialize the device at `index`
    pub fn get(&self, index: u32) -> std::result::Result<DeviceRecord, DeviceError> {
        let raw = self.query_devices()?;
        self.materialize(index, &raw)
    }

    /// Materialize every installed device from one query
    ///
    /// An unavailable source or a host without GPUs yields an empty list.
    pub fn all(&self) -> std::result::Result<Vec<DeviceRecord>, DeviceError> {
        let raw = match self.query_devices() {
            Ok(raw) => raw,
            Err(DeviceError::NoDevices) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        (0..raw.device_count())
            .map(|index| self.materialize(index, &raw))
            .collect()
    }

    /// Materialize the devices in the allow-list, in listed order
    ///
    /// Fails if the allow-list is malformed or names a device that is not
    /// installed. An empty allow-list yields an empty list without a query.
    pub fn visible(&self) -> Result<Vec<DeviceRecord>> {
        let indices = self.visible_indices()?;
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self.query_devices()?;
        let records = indices
            .into_iter()
            .map(|index| self.materialize(index, &raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Re-query a record's device and replace it in place
    ///
    /// The record is left unchanged if the device can no longer be
    /// materialized.
    pub fn refresh(&self, record: &mut DeviceRecord) -> std::result::Result<(), DeviceError> {
        *record = self.get(record.index)?;
        Ok(())
    }

    fn query_devices(&self) -> std::result::Result<RawResponse, DeviceError> {
        let raw = self
            .source
            .query(Metric::ALL_DEVICE_INFO)
            .ok_or(DeviceError::NoDevices)?;
        if raw.device_count() == 0 {
            return Err(DeviceError::NoDevices);
        }
        Ok(raw)
    }

    fn materialize(
        &self,
        index: u32,
        raw: &RawResponse,
    ) -> std::result::Result<DeviceRecord, DeviceError> {
        let resolver: Option<&dyn ProcessResolver> = if self.resolve_processes {
            Some(&self.resolver)
        } else {
            None
        };

        let valid = raw.device_count();
        if index >= valid {
            return Err(DeviceError::InvalidDevice {
                index,
                valid: (0..valid).collect(),
            });
        }

        normalize(index, raw, resolver).ok_or_else(|| {
            debug!("GPU {} counted but missing from the response", index);
            DeviceError::InvalidDevice {
                index,
                valid: (0..raw.devices().len() as u32).collect(),
            }
        })
    }
}
