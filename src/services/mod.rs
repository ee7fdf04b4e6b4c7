//! Service layer for device enumeration
//!
//! Services turn raw telemetry into device records and decide which
//! devices are visible.

pub mod api;
pub mod directory;
pub mod normalizer;
pub mod visibility;

pub use directory::{parse_driver_version, DeviceDirectory};
pub use normalizer::normalize;
pub use visibility::parse_allow_list;
