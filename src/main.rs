//! railseq firmware — main entry point.
//!
//! Brings up a two-level power tree and serves power requests forever.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  periph_3v3 (GPIO 4)                                         │
//! │    ├── sensor_bus   (logging dependent)                      │
//! │    └── radio_pa (GPIO 5, nested domain)                      │
//! │                                                              │
//! │  ISR / policy ──▶ REQUESTS ───────┐                          │
//! │  ISR / policy ──▶ RADIO_REQUESTS ─┴─▶ worker loop            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use railseq::adapters::gpio::GpioEnablePin;
use railseq::adapters::time::SystemTimer;
use railseq::{
    DomainConfig, PowerAction, PowerDependent, PowerDomainBuilder, PowerError,
    PowerNotice, PowerRequests, Subdomain,
};

/// Requests from interrupt handlers and the policy layer.
static REQUESTS: PowerRequests<8> = PowerRequests::new();

/// Requests for the radio rail.
static RADIO_REQUESTS: PowerRequests<4> = PowerRequests::new();

/// Board power tree: the main peripheral rail.
const MAIN_RAIL: &str = r#"{
    "name": "periph_3v3",
    "enable": { "port": "gpio0", "pin": 4 },
    "startup_delay_us": 1000,
    "off_on_delay_us": 5000,
    "enable_pin_high_drive": true
}"#;

/// Power amplifier rail, fed from `periph_3v3`.
const RADIO_RAIL: &str = r#"{
    "name": "radio_pa",
    "enable": { "port": "gpio0", "pin": 5, "active_low": true },
    "startup_delay_us": 250
}"#;

/// Idle time between request polls.
const POLL_INTERVAL_MS: u64 = 50;

// ── Dependents ────────────────────────────────────────────────

/// Devices that only need to know when their supply comes and goes.
struct SensorBus;

impl PowerDependent for SensorBus {
    fn name(&self) -> &str {
        "sensor_bus"
    }

    fn on_power_notice(&mut self, notice: PowerNotice) -> Result<(), PowerError> {
        info!("sensor_bus: supply {}", notice);
        Ok(())
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("railseq v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Build the power tree ───────────────────────────────
    let main_cfg = DomainConfig::from_json(MAIN_RAIL).map_err(PowerError::from)?;
    let radio_cfg = DomainConfig::from_json(RADIO_RAIL).map_err(PowerError::from)?;

    let radio_pin = GpioEnablePin::new(radio_cfg.enable.clone());
    let main_pin = GpioEnablePin::new(main_cfg.enable.clone());

    let radio = Subdomain::new();
    let mut domain = PowerDomainBuilder::new(main_cfg, main_pin)
        .dependent(Box::new(SensorBus))
        .subdomain(PowerDomainBuilder::new(radio_cfg, radio_pin), &radio)
        .build()?;

    info!(
        "{}: {} dependents, state {}",
        domain.name(),
        domain.dependent_count(),
        domain.state()
    );

    // ── 3. Initial power-up via the request queue ─────────────
    REQUESTS.submit(PowerAction::TurnOn)?;
    REQUESTS.submit(PowerAction::Resume)?;
    RADIO_REQUESTS.submit(PowerAction::Resume)?;

    // ── 4. Worker loop ────────────────────────────────────────
    let mut timer = SystemTimer::new();
    loop {
        let served = REQUESTS.serve(&mut domain, &mut timer, |action, outcome| {
            if let Err(e) = outcome {
                warn!("request {} rejected (code {})", action, e.code());
            }
        })?;

        // The radio follows its parent's TURN_ON; serve it after the parent.
        radio.with(|pa| {
            RADIO_REQUESTS.serve(pa, &mut timer, |action, outcome| {
                if let Err(e) = outcome {
                    warn!("radio request {} rejected (code {})", action, e.code());
                }
            })
        })??;

        let report = domain.last_fan_out().filter(|r| served > 0 && !r.is_clean());
        if let Some(report) = report {
            warn!(
                "{}: {} of {} dependents failed {}",
                domain.name(),
                report.fault_count(),
                report.notified,
                report.notice
            );
        }

        std::thread::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS));
    }
}
