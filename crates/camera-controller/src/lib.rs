//! camera-controller: typed register binding for the CameraControllerGen2
//!
//! One static register table ([`registers::REGISTERS`]) drives the shared
//! codec in `register-codec`; this crate adds the device's domain value
//! types, the connection facade with its identity check, and a metrics hub.

pub mod registers;

mod values;
pub use values::{
    CameraEvents, CameraFlags, EventConfig, OutputConfig, OutputFlags, StrobeSource,
    TriggerInverted, TriggerSource,
};

mod error;
pub use error::{DeviceError, Result};

mod device;
pub use device::Device;

mod metrics;
pub use metrics::{LinkMetrics, MetricsHub};
