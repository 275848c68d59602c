//! GPIO power domain sequencer.
//!
//! Three states, four actions:
//!
//! ```text
//!                 TURN_ON                RESUME
//!  DISCONNECTED ──────────▶ DRIVEN_OFF ──────────▶ ON
//!       ▲        TURN_OFF       │  ▲     SUSPEND    │
//!       └───────────────────────┘  └────────────────┘
//! ```
//!
//! `TURN_ON` / `TURN_OFF` only reconfigure the enable pin (driven vs.
//! floating).  `RESUME` / `SUSPEND` switch the rail itself, honour the
//! cool-down and settle windows, and notify every dependent.
//!
//! Every action blocks the calling thread until the sequence is complete.
//! Callers must serialise actions on one domain; `&mut self` enforces that,
//! and [`PowerRequests`](crate::app::requests::PowerRequests) funnels
//! requests from other contexts onto a single worker.  Nested domains are
//! reached through a [`Subdomain`] handle.

pub mod builder;
pub mod fanout;
pub mod shared;

use core::fmt;

use embassy_time::{Duration, Instant};
use log::{debug, error, info};

use crate::app::ports::{
    DeviceReady, EnablePin, MonotonicTimer, PinMode, PowerDependent, PowerNotice,
};
use crate::config::Label;
use crate::error::{PowerError, Result};
use fanout::FanOutReport;

pub use builder::PowerDomainBuilder;
pub use shared::Subdomain;

// ---------------------------------------------------------------------------
// State and action identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Pin floating, rail unpowered.
    Disconnected,
    /// Pin driven to the inactive level, rail unpowered.
    DrivenOff,
    /// Pin driven active, rail powered and dependents notified.
    On,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::DrivenOff => write!(f, "DRIVEN_OFF"),
            Self::On => write!(f, "ON"),
        }
    }
}

/// Requests accepted from the upstream power policy.
///
/// Discriminants match the raw action codes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PowerAction {
    /// De-energise the rail.
    Suspend = 0,
    /// Energise the rail.
    Resume = 1,
    /// Let the enable pin float.
    TurnOff = 2,
    /// Start actively driving the enable pin (rail stays off).
    TurnOn = 3,
}

impl TryFrom<u8> for PowerAction {
    type Error = PowerError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::Suspend),
            1 => Ok(Self::Resume),
            2 => Ok(Self::TurnOff),
            3 => Ok(Self::TurnOn),
            _ => Err(PowerError::NotSupported),
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suspend => write!(f, "SUSPEND"),
            Self::Resume => write!(f, "RESUME"),
            Self::TurnOff => write!(f, "TURN_OFF"),
            Self::TurnOn => write!(f, "TURN_ON"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain instance
// ---------------------------------------------------------------------------

/// One switchable power rail and the devices it powers.
///
/// Built with [`PowerDomainBuilder`]; starts in [`PowerState::Disconnected`].
pub struct PowerDomain<P: EnablePin> {
    name: Label,
    pin: P,
    startup_delay: Duration,
    cooldown_delay: Duration,
    high_drive: bool,
    /// Earliest instant the rail may be energised again.
    next_energize_at: Instant,
    state: PowerState,
    dependents: Vec<Box<dyn PowerDependent>>,
    last_fan_out: Option<FanOutReport>,
}

impl<P: EnablePin> PowerDomain<P> {
    /// Run one power action to completion.
    ///
    /// `RESUME` and `SUSPEND` block on `timer` for the cool-down and settle
    /// windows.  Rejected with [`PowerError::UnsupportedContext`] when the
    /// timer reports a non-blockable context, before any pin is touched.
    pub fn pm_action<T: MonotonicTimer>(&mut self, action: PowerAction, timer: &mut T) -> Result<()> {
        if !timer.can_block() {
            error!("{}: blocking actions cannot run in this context", self.name);
            return Err(PowerError::UnsupportedContext);
        }

        match (action, self.state) {
            (PowerAction::Resume, PowerState::DrivenOff) => self.resume(timer),
            (PowerAction::Suspend, PowerState::On) => self.suspend(timer),
            (PowerAction::TurnOn | PowerAction::TurnOff, _) => self.configure_step(action),
            (action, state) => Err(PowerError::InvalidTransition { action, state }),
        }
    }

    /// Bring the rail from any off state to `ON`.
    pub fn power_up<T: MonotonicTimer>(&mut self, timer: &mut T) -> Result<()> {
        if self.state == PowerState::Disconnected {
            self.pm_action(PowerAction::TurnOn, timer)?;
        }
        self.pm_action(PowerAction::Resume, timer)
    }

    /// Take the rail from any state down to `DISCONNECTED`.
    pub fn power_down<T: MonotonicTimer>(&mut self, timer: &mut T) -> Result<()> {
        if self.state == PowerState::On {
            self.pm_action(PowerAction::Suspend, timer)?;
        }
        self.pm_action(PowerAction::TurnOff, timer)
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn is_powered(&self) -> bool {
        self.state == PowerState::On
    }

    pub fn next_energize_at(&self) -> Instant {
        self.next_energize_at
    }

    pub fn startup_delay(&self) -> Duration {
        self.startup_delay
    }

    pub fn cooldown_delay(&self) -> Duration {
        self.cooldown_delay
    }

    pub fn dependent_count(&self) -> usize {
        self.dependents.len()
    }

    /// Outcome of the most recent dependent broadcast, if any.
    pub fn last_fan_out(&self) -> Option<&FanOutReport> {
        self.last_fan_out.as_ref()
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    // ── Transitions ───────────────────────────────────────────

    fn resume<T: MonotonicTimer>(&mut self, timer: &mut T) -> Result<()> {
        // Wait until the rail has been off for the full cool-down window.
        timer.sleep_until(self.next_energize_at);

        self.pin.set_active(true)?;
        info!("{} is now ON", self.name);

        timer.sleep(self.startup_delay);

        self.state = PowerState::On;
        self.broadcast(PowerNotice::TurnOn);
        Ok(())
    }

    fn suspend<T: MonotonicTimer>(&mut self, timer: &mut T) -> Result<()> {
        self.broadcast(PowerNotice::TurnOff);

        self.pin.set_active(false)?;
        info!("{} is now OFF", self.name);

        self.next_energize_at = timer.now() + self.cooldown_delay;
        self.state = PowerState::DrivenOff;
        Ok(())
    }

    /// `TURN_ON` / `TURN_OFF`: pin configuration only, never blocks.
    fn configure_step(&mut self, action: PowerAction) -> Result<()> {
        match (action, self.state) {
            (PowerAction::TurnOn, PowerState::Disconnected) => {
                self.pin.configure(PinMode::OutputInactive {
                    high_drive: self.high_drive,
                })?;
                self.state = PowerState::DrivenOff;
                debug!("{} is OFF and powered", self.name);
                Ok(())
            }
            (PowerAction::TurnOff, PowerState::DrivenOff) => {
                self.pin.configure(PinMode::Disconnected)?;
                self.state = PowerState::Disconnected;
                debug!("{} is OFF and not powered", self.name);
                Ok(())
            }
            (PowerAction::TurnOff, PowerState::Disconnected) => Ok(()),
            (action, state) => Err(PowerError::InvalidTransition { action, state }),
        }
    }

    fn broadcast(&mut self, notice: PowerNotice) {
        let report = fanout::notify_all(&self.name, &mut self.dependents, notice);
        self.last_fan_out = Some(report);
    }
}

impl<P: EnablePin> DeviceReady for PowerDomain<P> {
    fn label(&self) -> &str {
        &self.name
    }

    /// A domain only exists once its initialisation has succeeded.
    fn is_ready(&self) -> bool {
        true
    }
}

impl<P: EnablePin> PowerDependent for PowerDomain<P> {
    fn name(&self) -> &str {
        &self.name
    }

    /// Notices are only sent from the parent's `RESUME` / `SUSPEND`, which
    /// have already passed the parent's blocking-context check, and the
    /// configure steps they map to never block.
    fn on_power_notice(&mut self, notice: PowerNotice) -> Result<()> {
        let action = match notice {
            PowerNotice::TurnOn => PowerAction::TurnOn,
            PowerNotice::TurnOff => PowerAction::TurnOff,
        };
        self.configure_step(action)
    }
}
