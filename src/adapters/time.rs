//! System timer adapter.
//!
//! Monotonic time plus thread-blocking delays for the sequencer.
//!
//! - **`target_os = "espidf"`** — `esp_timer_get_time()` (µs since boot)
//!   and the IDF hybrid delay (busy-wait for short waits, FreeRTOS sleep
//!   for long ones).  Interrupt context is detected with
//!   `xPortInIsrContext()`.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` measured from
//!   adapter creation and `std::thread::sleep`.

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;

use crate::app::ports::MonotonicTimer;

pub struct SystemTimer {
    #[cfg(target_os = "espidf")]
    delay: esp_idf_hal::delay::Delay,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimer {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            delay: esp_idf_hal::delay::Delay::new_default(),
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl DelayNs for SystemTimer {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    #[cfg(target_os = "espidf")]
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(core::time::Duration::from_nanos(u64::from(ns)));
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(core::time::Duration::from_micros(u64::from(us)));
    }
}

impl MonotonicTimer for SystemTimer {
    #[cfg(target_os = "espidf")]
    fn now(&self) -> Instant {
        Instant::from_micros(unsafe { esp_idf_svc::sys::esp_timer_get_time() } as u64)
    }

    #[cfg(not(target_os = "espidf"))]
    fn now(&self) -> Instant {
        Instant::from_micros(self.start.elapsed().as_micros() as u64)
    }

    #[cfg(target_os = "espidf")]
    fn can_block(&self) -> bool {
        unsafe { esp_idf_svc::sys::xPortInIsrContext() == 0 }
    }
}
