//! Port traits — the boundary between the sequencer and the outside world.
//!
//! ```text
//!   GPIO adapter ──▶ EnablePin ──┐
//!   Timer adapter ─▶ MonotonicTimer ──▶ PowerDomain ──▶ PowerDependent (×N)
//!   Parent domain ─▶ DeviceReady ──┘
//! ```
//!
//! The [`PowerDomain`](crate::sequencer::PowerDomain) consumes these via
//! generics and trait objects, so the state machine never touches hardware
//! directly and runs unchanged against the simulation adapters.

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

use crate::error::{PinError, PowerError};

// ───────────────────────────────────────────────────────────────
// Readiness (pins, parent domains)
// ───────────────────────────────────────────────────────────────

/// Anything a domain depends on at initialisation.
pub trait DeviceReady {
    /// Human-readable label for log output.
    fn label(&self) -> &str;

    /// `true` once the device has finished its own initialisation.
    fn is_ready(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Enable pin (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// Electrical configuration of the enable pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Input / high impedance; the pin floats.
    Disconnected,
    /// Driven output, initially at the inactive level.
    OutputInactive { high_drive: bool },
    /// Driven output, initially at the active level.
    OutputActive { high_drive: bool },
}

impl PinMode {
    pub fn is_output(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

/// The single GPIO that switches a rail.
///
/// Levels are logical: `set_active(true)` energises the rail regardless of
/// the pin's physical polarity.  Each call is a single atomic hardware
/// operation; on failure the pin keeps its previous configuration.
pub trait EnablePin: DeviceReady {
    fn configure(&mut self, mode: PinMode) -> Result<(), PinError>;

    fn set_active(&mut self, active: bool) -> Result<(), PinError>;
}

// ───────────────────────────────────────────────────────────────
// Timer (driven adapter: domain → monotonic clock + blocking waits)
// ───────────────────────────────────────────────────────────────

/// Monotonic clock plus thread-blocking waits.
///
/// `now()` is measured from boot (or, on host, from adapter creation); the
/// domain seeds its first cool-down window from that origin.
pub trait MonotonicTimer: DelayNs {
    fn now(&self) -> Instant;

    /// Whether the calling context may block (false inside interrupts).
    fn can_block(&self) -> bool {
        true
    }

    /// Block for a fixed duration.
    fn sleep(&mut self, duration: Duration) {
        let mut remaining = duration.as_micros();
        while remaining > 0 {
            let chunk = remaining.min(u64::from(u32::MAX));
            self.delay_us(chunk as u32);
            remaining -= chunk;
        }
    }

    /// Block until `deadline`.  Returns immediately when the deadline is
    /// now or already in the past.
    fn sleep_until(&mut self, deadline: Instant) {
        if let Some(remaining) = deadline.checked_duration_since(self.now()) {
            if remaining.as_ticks() > 0 {
                self.sleep(remaining);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Dependents (driving adapter: domain → powered devices)
// ───────────────────────────────────────────────────────────────

/// Notice delivered to every dependent of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerNotice {
    /// The rail is now powered and stable.
    TurnOn,
    /// The rail is about to lose power.
    TurnOff,
}

impl core::fmt::Display for PowerNotice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TurnOn => write!(f, "TURN_ON"),
            Self::TurnOff => write!(f, "TURN_OFF"),
        }
    }
}

/// A device powered from a domain.  Nested domains implement this too,
/// which makes notification recursive.
pub trait PowerDependent {
    fn name(&self) -> &str;

    /// Apply the notice to the device's own hardware state.  Must not block
    /// for long; the domain calls dependents one after another.
    fn on_power_notice(&mut self, notice: PowerNotice) -> Result<(), PowerError>;
}
