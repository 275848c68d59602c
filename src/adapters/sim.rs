//! Virtual-time timer for simulation and tests.
//!
//! [`SimTimer`] never sleeps; a blocking wait just moves a shared
//! [`SimClock`] forward and is recorded.  Mock pins and devices holding a
//! clone of the clock can timestamp what they observe, which makes the
//! cool-down and settle guarantees checkable to the microsecond.

use std::cell::Cell;
use std::rc::Rc;

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;

use crate::app::ports::MonotonicTimer;

/// Shared virtual clock (nanosecond resolution, starts at boot = 0).
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Instant {
        Instant::from_micros(self.now_us())
    }

    pub fn now_us(&self) -> u64 {
        self.0.get() / 1000
    }

    pub fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }

    pub fn advance_us(&self, us: u64) {
        self.advance_ns(us * 1000);
    }
}

/// [`MonotonicTimer`] over a [`SimClock`].
#[derive(Debug, Default)]
pub struct SimTimer {
    clock: SimClock,
    interrupt_context: bool,
    sleeps_us: Vec<u64>,
}

impl SimTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: SimClock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    /// Pretend to run inside an interrupt handler.
    pub fn set_interrupt_context(&mut self, in_isr: bool) {
        self.interrupt_context = in_isr;
    }

    /// Let time pass without it counting as a blocking wait.
    pub fn advance_us(&mut self, us: u64) {
        self.clock.advance_us(us);
    }

    pub fn elapsed_us(&self) -> u64 {
        self.clock.now_us()
    }

    /// Every blocking wait so far, in µs.
    pub fn sleeps_us(&self) -> &[u64] {
        &self.sleeps_us
    }

    pub fn clear_sleeps(&mut self) {
        self.sleeps_us.clear();
    }
}

impl DelayNs for SimTimer {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(u64::from(ns));
        self.sleeps_us.push(u64::from(ns).div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_us(u64::from(us));
        self.sleeps_us.push(u64::from(us));
    }
}

impl MonotonicTimer for SimTimer {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn can_block(&self) -> bool {
        !self.interrupt_context
    }
}
