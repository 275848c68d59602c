//! Rail enable GPIO adapter.
//!
//! Implements [`EnablePin`] for one GPIO described by a [`PinSpec`]:
//! floating (input, no pulls) while the domain is disconnected, push-pull
//! output otherwise, optionally at the strongest drive setting.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real pad through the IDF GPIO driver.
//! On host/test: tracks state in-memory only.

use crate::app::ports::{DeviceReady, EnablePin, PinMode};
use crate::config::PinSpec;
use crate::error::PinError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct GpioEnablePin {
    spec: PinSpec,
    ready: bool,
    mode: PinMode,
    active: bool,
    configure_count: u32,
    write_count: u32,
}

impl GpioEnablePin {
    pub fn new(spec: PinSpec) -> Self {
        let ready = Self::pin_is_valid(&spec);
        Self {
            spec,
            ready,
            mode: PinMode::Disconnected,
            active: false,
            configure_count: 0,
            write_count: 0,
        }
    }

    pub fn spec(&self) -> &PinSpec {
        &self.spec
    }

    /// Last mode successfully applied.
    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Logical level currently driven (meaningless while floating).
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn configure_count(&self) -> u32 {
        self.configure_count
    }

    pub fn write_count(&self) -> u32 {
        self.write_count
    }

    /// Simulation hook: mark the GPIO controller (un)available.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    #[cfg(target_os = "espidf")]
    fn pin_is_valid(spec: &PinSpec) -> bool {
        (spec.pin as gpio_num_t) < gpio_num_t_GPIO_NUM_MAX
    }

    #[cfg(not(target_os = "espidf"))]
    fn pin_is_valid(_spec: &PinSpec) -> bool {
        true
    }

    #[cfg(target_os = "espidf")]
    fn configure_hw(&self, mode: PinMode) -> Result<(), PinError> {
        let pin = self.spec.pin as gpio_num_t;
        let check = |rc: esp_err_t| {
            if rc == ESP_OK as esp_err_t {
                Ok(())
            } else {
                Err(PinError::ConfigureFailed(rc))
            }
        };

        // SAFETY: the pin is owned exclusively by this adapter; the IDF
        // GPIO calls only touch that pad's registers.
        unsafe {
            match mode {
                PinMode::Disconnected => {
                    check(gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_DISABLE))?;
                    check(gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_FLOATING))?;
                }
                PinMode::OutputInactive { high_drive } | PinMode::OutputActive { high_drive } => {
                    let active = matches!(mode, PinMode::OutputActive { .. });
                    // Latch the level before enabling the driver so the
                    // rail never sees a glitch.
                    let level = u32::from(self.spec.physical_level(active));
                    check(gpio_set_level(pin, level))?;
                    check(gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_OUTPUT))?;
                    if high_drive {
                        check(gpio_set_drive_capability(pin, gpio_drive_cap_t_GPIO_DRIVE_CAP_3))?;
                    }
                }
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn configure_hw(&self, _mode: PinMode) -> Result<(), PinError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn write_hw(&self, active: bool) -> Result<(), PinError> {
        let level = u32::from(self.spec.physical_level(active));
        // SAFETY: see `configure_hw`.
        let rc = unsafe { gpio_set_level(self.spec.pin as gpio_num_t, level) };
        if rc == ESP_OK as esp_err_t {
            Ok(())
        } else {
            Err(PinError::WriteFailed(rc))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_hw(&self, _active: bool) -> Result<(), PinError> {
        Ok(())
    }
}

impl DeviceReady for GpioEnablePin {
    fn label(&self) -> &str {
        &self.spec.port
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

impl EnablePin for GpioEnablePin {
    fn configure(&mut self, mode: PinMode) -> Result<(), PinError> {
        self.configure_hw(mode)?;
        self.configure_count += 1;
        self.mode = mode;
        self.active = matches!(mode, PinMode::OutputActive { .. });
        Ok(())
    }

    fn set_active(&mut self, active: bool) -> Result<(), PinError> {
        let high_drive = match self.mode {
            PinMode::Disconnected => return Err(PinError::NotAnOutput),
            PinMode::OutputInactive { high_drive } | PinMode::OutputActive { high_drive } => {
                high_drive
            }
        };
        self.write_hw(active)?;
        self.write_count += 1;
        self.active = active;
        self.mode = if active {
            PinMode::OutputActive { high_drive }
        } else {
            PinMode::OutputInactive { high_drive }
        };
        Ok(())
    }
}
