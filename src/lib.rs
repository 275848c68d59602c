//! railseq — GPIO-gated power domain sequencer.
//!
//! Exposes the sequencer, its port traits and the adapters for integration
//! testing and for use from the firmware binary. All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod sequencer;

pub use app::ports::{DeviceReady, EnablePin, MonotonicTimer, PinMode, PowerDependent, PowerNotice};
pub use app::requests::PowerRequests;
pub use config::{DomainConfig, PinSpec};
pub use error::{PowerError, Result};
pub use sequencer::{PowerAction, PowerDomain, PowerDomainBuilder, PowerState, Subdomain};
