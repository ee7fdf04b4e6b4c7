//! Telemetry source layer
//!
//! [`TelemetrySource`] returns one loosely-typed document per query;
//! [`NvmlSource`] is the NVML-backed implementation.

pub mod device;
pub mod query;
pub mod traits;
pub mod wrapper;

pub use device::NvmlDevice;
pub use query::{Metric, RawResponse};
pub use traits::TelemetrySource;
pub use wrapper::NvmlSource;
