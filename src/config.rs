//! Power domain configuration.
//!
//! One [`DomainConfig`] per switchable rail.  The values are the
//! device-tree-equivalent static description of the domain; they are read
//! once at construction and never change afterwards.

use heapless::String;
use serde::{Deserialize, Serialize};

/// Maximum length of a domain or port label.
pub const LABEL_CAPACITY: usize = 32;

/// Fixed-capacity label used for domain and port names.
pub type Label = String<LABEL_CAPACITY>;

/// Location and polarity of a rail enable GPIO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSpec {
    /// GPIO controller label (e.g. `"gpio0"`).
    pub port: Label,
    /// Pin number within the port.
    pub pin: u8,
    /// `true` when the rail is enabled by driving the pin low.
    #[serde(default)]
    pub active_low: bool,
}

impl PinSpec {
    pub fn new(port: &str, pin: u8) -> Self {
        Self {
            port: label(port),
            pin,
            active_low: false,
        }
    }

    /// Same pin, enabled by a low level.
    pub fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }

    /// Physical output level for a logical (active / inactive) level.
    pub fn physical_level(&self, active: bool) -> bool {
        active != self.active_low
    }
}

/// Static configuration of one GPIO-gated power domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Name used in log output.
    pub name: Label,
    /// Rail enable GPIO.
    pub enable: PinSpec,
    /// Time the rail needs after energising before it is stable (µs).
    #[serde(default)]
    pub startup_delay_us: u32,
    /// Minimum time the rail must stay off before re-energising (µs).
    #[serde(default, alias = "off_on_delay_us")]
    pub cooldown_delay_us: u32,
    /// Use the highest drive strength while the pin is driven.
    #[serde(default, alias = "enable_pin_high_drive")]
    pub enable_high_drive: bool,
}

impl DomainConfig {
    pub fn new(name: &str, enable: PinSpec) -> Self {
        Self {
            name: label(name),
            enable,
            startup_delay_us: 0,
            cooldown_delay_us: 0,
            enable_high_drive: false,
        }
    }

    pub fn with_startup_delay_us(mut self, us: u32) -> Self {
        self.startup_delay_us = us;
        self
    }

    pub fn with_cooldown_delay_us(mut self, us: u32) -> Self {
        self.cooldown_delay_us = us;
        self
    }

    pub fn with_high_drive(mut self, enabled: bool) -> Self {
        self.enable_high_drive = enabled;
        self
    }

    /// Parse and validate a JSON domain description.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject descriptions that cannot produce a usable domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationFailed("domain name is empty"));
        }
        if self.enable.port.is_empty() {
            return Err(ConfigError::ValidationFailed("enable pin port is empty"));
        }
        Ok(())
    }
}

/// Errors from loading or validating a [`DomainConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The description could not be deserialised (bad syntax, missing
    /// field, or a label longer than [`LABEL_CAPACITY`]).
    Malformed,
    /// A field failed validation.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed configuration"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

/// Build a label, truncating at a character boundary if it is too long.
pub(crate) fn label(s: &str) -> Label {
    let mut out = Label::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
