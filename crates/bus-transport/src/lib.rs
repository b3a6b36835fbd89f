//! bus-transport: framed register-message abstractions
//!
//! This crate provides the types and traits for exchanging framed register
//! messages with an instrument bus, with feature-gated backends. The default
//! build enables a `mock` backend so that binaries can compile and run on any
//! host without hardware; the `loopback` backend simulates a full register
//! file for development and tests.

mod types;
pub use types::{DeviceTime, LinkInfo, MessageKind, RegisterMessage};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::DeviceLink;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockLink;

#[cfg(feature = "loopback")]
mod loopback;

#[cfg(feature = "loopback")]
pub use loopback::LoopbackLink;
