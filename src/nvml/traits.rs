//! Trait definitions for telemetry access
//!
//! These traits abstract over NVML to enable testing with mocks.

use crate::nvml::query::{Metric, RawResponse};

/// Source of GPU telemetry
///
/// A single call returns the requested metrics for every installed device,
/// so the number of round trips to the driver does not grow with the number
/// of GPUs.
pub trait TelemetrySource: Send + Sync {
    /// Query the given metrics for all devices
    ///
    /// Returns `None` when the driver or management library is unavailable.
    /// Callers treat that as "zero devices", not as a failure.
    fn query(&self, metrics: &[Metric]) -> Option<RawResponse>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for &T {
    fn query(&self, metrics: &[Metric]) -> Option<RawResponse> {
        (**self).query(metrics)
    }
}
