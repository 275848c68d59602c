//! Unified error types for the power domain sequencer.
//!
//! A single `PowerError` enum is returned by every entry point, from domain
//! construction through the four power actions.  All variants are `Copy` so
//! they can be recorded in fan-out reports and handed across the request
//! queue without allocation.

use core::fmt;

use crate::sequencer::{PowerAction, PowerState};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    /// The action was requested from a context that cannot block
    /// (e.g. an interrupt handler).  Re-issue it from a thread.
    UnsupportedContext,
    /// The action is not permitted from the domain's current state.
    InvalidTransition {
        action: PowerAction,
        state: PowerState,
    },
    /// An unrecognised raw action code was supplied.
    NotSupported,
    /// A dependency was not ready when the domain initialised.
    DependencyNotReady(Dependency),
    /// The enable pin adapter reported a failure.
    Pin(PinError),
    /// A dependent device rejected a power notice.
    Device(&'static str),
    /// The request queue has no free slot.
    QueueFull,
    /// Configuration is invalid.
    Config(&'static str),
}

impl PowerError {
    /// Negative errno-style status code for C-style callers.
    pub const fn code(self) -> i32 {
        match self {
            Self::UnsupportedContext | Self::InvalidTransition { .. } | Self::NotSupported => {
                -ENOTSUP
            }
            Self::DependencyNotReady(Dependency::EnablePin) => -ENODEV,
            Self::DependencyNotReady(Dependency::ParentDomain) | Self::Config(_) => -EINVAL,
            Self::Pin(_) | Self::Device(_) => -EIO,
            Self::QueueFull => -EAGAIN,
        }
    }
}

const EIO: i32 = 5;
const EAGAIN: i32 = 11;
const ENODEV: i32 = 19;
const EINVAL: i32 = 22;
const ENOTSUP: i32 = 134;

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedContext => write!(f, "blocking actions cannot run in this context"),
            Self::InvalidTransition { action, state } => {
                write!(f, "{action} not permitted while {state}")
            }
            Self::NotSupported => write!(f, "unsupported action"),
            Self::DependencyNotReady(dep) => write!(f, "{dep} not ready"),
            Self::Pin(e) => write!(f, "enable pin: {e}"),
            Self::Device(msg) => write!(f, "device: {msg}"),
            Self::QueueFull => write!(f, "request queue full"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for PowerError {}

// ---------------------------------------------------------------------------
// Dependencies checked at initialisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// The GPIO port/pin driving the rail enable.
    EnablePin,
    /// The domain this domain is itself powered from.
    ParentDomain,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnablePin => write!(f, "enable pin"),
            Self::ParentDomain => write!(f, "parent domain"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pin adapter errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    /// Direction / drive-strength reconfiguration failed (driver rc).
    ConfigureFailed(i32),
    /// Output level write failed (driver rc).
    WriteFailed(i32),
    /// A level write was attempted while the pin is not an output.
    NotAnOutput,
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigureFailed(rc) => write!(f, "configure failed (rc={})", rc),
            Self::WriteFailed(rc) => write!(f, "level write failed (rc={})", rc),
            Self::NotAnOutput => write!(f, "pin is not configured as an output"),
        }
    }
}

impl From<PinError> for PowerError {
    fn from(e: PinError) -> Self {
        Self::Pin(e)
    }
}

impl From<crate::config::ConfigError> for PowerError {
    fn from(e: crate::config::ConfigError) -> Self {
        match e {
            crate::config::ConfigError::ValidationFailed(msg) => Self::Config(msg),
            crate::config::ConfigError::Malformed => Self::Config("malformed configuration"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, PowerError>;
