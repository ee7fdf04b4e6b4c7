//! NVML telemetry source
//!
//! Provides the production [`TelemetrySource`] backed by nvml-wrapper.

use crate::error::NvmlError;
use crate::nvml::device::NvmlDevice;
use crate::nvml::query::{Metric, RawResponse};
use crate::nvml::traits::TelemetrySource;

use nvml_wrapper::Nvml;
use serde_json::{json, Map, Value};

/// NVML-backed telemetry source
///
/// NVML is initialized once. If initialization fails the source stays
/// usable but reports no data, which callers see as zero devices.
pub struct NvmlSource {
    nvml: Option<Nvml>,
}

impl NvmlSource {
    /// Initialize NVML, falling back to an unavailable source on failure
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(source) => source,
            Err(e) => {
                log::warn!("{}", e);
                Self::unavailable()
            }
        }
    }

    /// Initialize NVML and fail if the library cannot be used
    pub fn try_new() -> Result<Self, NvmlError> {
        let nvml = Nvml::init().map_err(|e| match e {
            nvml_wrapper::error::NvmlError::LibloadingError(_) => NvmlError::LibraryNotFound,
            nvml_wrapper::error::NvmlError::DriverNotLoaded => {
                NvmlError::InitializationFailed("NVIDIA driver not loaded".to_string())
            }
            other => NvmlError::InitializationFailed(other.to_string()),
        })?;

        Ok(Self { nvml: Some(nvml) })
    }

    /// A source that never returns data
    pub fn unavailable() -> Self {
        Self { nvml: None }
    }

    /// Whether NVML was initialized
    pub fn is_available(&self) -> bool {
        self.nvml.is_some()
    }
}

impl Default for NvmlSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for NvmlSource {
    fn query(&self, metrics: &[Metric]) -> Option<RawResponse> {
        let nvml = self.nvml.as_ref()?;
        log::debug!("Querying {} metrics from NVML", metrics.len());

        let count = match nvml.device_count() {
            Ok(count) => count,
            Err(e) => {
                log::warn!("Failed to enumerate GPUs: {}", e);
                return None;
            }
        };

        let mut doc = Map::new();

        if metrics.contains(&Metric::Count) {
            doc.insert("count".to_string(), json!(count));
        }

        if metrics.contains(&Metric::DriverVersion) {
            let version = nvml
                .sys_driver_version()
                .map(Value::String)
                .unwrap_or(Value::Null);
            doc.insert("driver_version".to_string(), version);
        }

        if metrics.iter().any(Metric::is_device_metric) {
            let gpus = (0..count)
                .map(|index| match nvml.device_by_index(index) {
                    Ok(device) => NvmlDevice::new(device, index).collect(metrics),
                    Err(e) => {
                        log::warn!("GPU {} is not accessible: {}", index, e);
                        Value::Object(Map::new())
                    }
                })
                .collect();
            doc.insert("gpu".to_string(), Value::Array(gpus));
        }

        Some(RawResponse::new(Value::Object(doc)))
    }
}
