//! Timing and ordering of the four power actions on a single domain.

use railseq::adapters::sim::{SimClock, SimTimer};
use railseq::error::PinError;
use railseq::{
    DomainConfig, PinMode, PinSpec, PowerAction, PowerDomain, PowerDomainBuilder, PowerError,
    PowerNotice, PowerState,
};

use crate::mock_hw::{EventLog, HwEvent, MockPin, RecordingDependent};

const STARTUP_US: u32 = 1000;
const COOLDOWN_US: u32 = 5000;

struct Rig {
    domain: PowerDomain<MockPin>,
    timer: SimTimer,
    log: EventLog,
}

fn rig_with(dependents: &[&'static str]) -> Rig {
    let clock = SimClock::new();
    let log = EventLog::new();
    let config = DomainConfig::new("rail", PinSpec::new("gpio0", 4))
        .with_startup_delay_us(STARTUP_US)
        .with_cooldown_delay_us(COOLDOWN_US);

    let mut builder = PowerDomainBuilder::new(config, MockPin::new("en", &clock, &log));
    for &name in dependents {
        builder = builder.dependent(RecordingDependent::new(name, &clock, &log).boxed());
    }
    let domain = builder.build().unwrap();

    Rig {
        domain,
        timer: SimTimer::with_clock(clock),
        log,
    }
}

fn rig() -> Rig {
    rig_with(&["sensor", "radio", "flash"])
}

impl Rig {
    fn act(&mut self, action: PowerAction) -> Result<(), PowerError> {
        self.domain.pm_action(action, &mut self.timer)
    }
}

// ── Initialisation ────────────────────────────────────────────

#[test]
fn init_floats_pin_and_never_energises() {
    let r = rig();
    assert_eq!(r.domain.state(), PowerState::Disconnected);
    assert_eq!(r.log.modes("en"), vec![PinMode::Disconnected]);
    assert_eq!(r.log.level_at("en", true), None);
    assert!(r.log.notices().is_empty());
}

// ── Boot-time scenario (1000 µs settle, 5000 µs cool-down) ───

#[test]
fn first_resume_after_boot_waits_out_cooldown() {
    let mut r = rig();

    r.act(PowerAction::TurnOn).unwrap();
    assert_eq!(r.timer.elapsed_us(), 0);

    r.act(PowerAction::Resume).unwrap();
    assert_eq!(r.log.level_at("en", true), Some(5000));
    assert_eq!(r.timer.elapsed_us(), 6000);
    assert_eq!(r.domain.state(), PowerState::On);
}

#[test]
fn resume_after_boot_window_does_not_wait_for_cooldown() {
    let mut r = rig();
    r.timer.advance_us(8000);

    r.act(PowerAction::TurnOn).unwrap();
    r.act(PowerAction::Resume).unwrap();
    assert_eq!(r.log.level_at("en", true), Some(8000));
    assert_eq!(r.timer.sleeps_us(), &[u64::from(STARTUP_US)]);
}

// ── Cool-down after SUSPEND ───────────────────────────────────

#[test]
fn immediate_resume_after_suspend_waits_exactly_cooldown() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();
    r.timer.advance_us(10_000);

    let suspended_at = r.timer.elapsed_us();
    r.act(PowerAction::Suspend).unwrap();
    r.log.clear();

    r.act(PowerAction::Resume).unwrap();
    assert_eq!(
        r.log.level_at("en", true),
        Some(suspended_at + u64::from(COOLDOWN_US))
    );
}

#[test]
fn resume_after_cooldown_elapsed_blocks_only_for_settle() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();
    r.act(PowerAction::Suspend).unwrap();

    r.timer.advance_us(u64::from(COOLDOWN_US) + 1);
    r.timer.clear_sleeps();
    r.log.clear();
    let resumed_at = r.timer.elapsed_us();

    r.act(PowerAction::Resume).unwrap();
    assert_eq!(r.log.level_at("en", true), Some(resumed_at));
    assert_eq!(r.timer.sleeps_us(), &[u64::from(STARTUP_US)]);
}

#[test]
fn partial_cooldown_waits_only_the_remainder() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();
    r.act(PowerAction::Suspend).unwrap();
    let off_at = r.timer.elapsed_us();

    r.timer.advance_us(3000);
    r.timer.clear_sleeps();
    r.log.clear();
    r.act(PowerAction::Resume).unwrap();

    assert_eq!(r.timer.sleeps_us(), &[2000, u64::from(STARTUP_US)]);
    assert_eq!(r.log.level_at("en", true), Some(off_at + u64::from(COOLDOWN_US)));
}

// ── Settle before dependents ──────────────────────────────────

#[test]
fn dependents_see_turn_on_only_after_settle() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();

    let energised = r.log.level_at("en", true).unwrap();
    let notices: Vec<_> = r
        .log
        .events()
        .into_iter()
        .filter(|e| matches!(e, HwEvent::Notice { .. }))
        .collect();
    assert_eq!(notices.len(), 3);
    for event in notices {
        assert!(event.at_us() >= energised + u64::from(STARTUP_US));
    }
}

#[test]
fn suspend_notifies_before_cutting_power() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();
    r.log.clear();

    r.act(PowerAction::Suspend).unwrap();
    let events = r.log.events();
    assert_eq!(events.len(), 4);
    assert!(events[..3]
        .iter()
        .all(|e| matches!(e, HwEvent::Notice { notice: PowerNotice::TurnOff, .. })));
    assert!(matches!(
        events[3],
        HwEvent::SetActive { active: false, .. }
    ));
    assert_eq!(r.timer.sleeps_us().len(), 2, "suspend itself never blocks");
}

// ── Fan-out ───────────────────────────────────────────────────

#[test]
fn every_dependent_notified_once_in_registration_order() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();
    r.act(PowerAction::Suspend).unwrap();

    assert_eq!(
        r.log.notices(),
        vec![
            ("sensor", PowerNotice::TurnOn),
            ("radio", PowerNotice::TurnOn),
            ("flash", PowerNotice::TurnOn),
            ("sensor", PowerNotice::TurnOff),
            ("radio", PowerNotice::TurnOff),
            ("flash", PowerNotice::TurnOff),
        ]
    );
    assert!(r.domain.last_fan_out().unwrap().is_clean());
}

#[test]
fn failing_dependent_does_not_block_the_others() {
    let clock = SimClock::new();
    let log = EventLog::new();
    let config = DomainConfig::new("rail", PinSpec::new("gpio0", 4));
    let mut domain = PowerDomainBuilder::new(config, MockPin::new("en", &clock, &log))
        .dependent(RecordingDependent::new("a", &clock, &log).boxed())
        .dependent(
            RecordingDependent::new("b", &clock, &log)
                .failing(PowerError::Device("brown-out"))
                .boxed(),
        )
        .dependent(RecordingDependent::new("c", &clock, &log).boxed())
        .build()
        .unwrap();
    let mut timer = SimTimer::with_clock(clock);

    assert_eq!(domain.power_up(&mut timer), Ok(()));
    assert_eq!(domain.state(), PowerState::On);
    assert_eq!(log.notices().len(), 3);

    let report = domain.last_fan_out().unwrap();
    assert_eq!(report.notice, PowerNotice::TurnOn);
    assert_eq!(report.notified, 3);
    assert_eq!(report.fault_count(), 1);
    assert_eq!(report.faults[0].index, 1);
    assert_eq!(report.faults[0].name.as_str(), "b");
    assert_eq!(report.faults[0].error, PowerError::Device("brown-out"));
}

#[test]
fn domain_without_dependents_still_sequences() {
    let mut r = rig_with(&[]);
    r.domain.power_up(&mut r.timer).unwrap();
    assert_eq!(r.domain.state(), PowerState::On);
    assert_eq!(r.domain.last_fan_out().unwrap().notified, 0);
}

// ── Context guard ─────────────────────────────────────────────

#[test]
fn interrupt_context_has_no_hardware_side_effects() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();
    let before = r.log.len();

    r.timer.set_interrupt_context(true);
    for action in [
        PowerAction::Suspend,
        PowerAction::Resume,
        PowerAction::TurnOff,
        PowerAction::TurnOn,
    ] {
        assert_eq!(r.act(action), Err(PowerError::UnsupportedContext));
    }
    assert_eq!(r.log.len(), before);
    assert_eq!(r.domain.state(), PowerState::On);
}

// ── Pin failures ──────────────────────────────────────────────

#[test]
fn failed_configure_leaves_state_unchanged() {
    let mut r = rig();
    r.domain.pin().configure_fault.arm(PinError::ConfigureFailed(-1));

    assert_eq!(
        r.act(PowerAction::TurnOn),
        Err(PowerError::Pin(PinError::ConfigureFailed(-1)))
    );
    assert_eq!(r.domain.state(), PowerState::Disconnected);

    r.domain.pin().configure_fault.disarm();
    assert_eq!(r.act(PowerAction::TurnOn), Ok(()));
    assert_eq!(r.domain.state(), PowerState::DrivenOff);
}

#[test]
fn failed_energise_skips_settle_and_notices() {
    let mut r = rig();
    r.act(PowerAction::TurnOn).unwrap();
    r.domain.pin().write_fault.arm(PinError::WriteFailed(-5));

    assert_eq!(
        r.act(PowerAction::Resume),
        Err(PowerError::Pin(PinError::WriteFailed(-5)))
    );
    assert_eq!(r.domain.state(), PowerState::DrivenOff);
    assert!(r.log.notices().is_empty());
    assert_eq!(r.timer.sleeps_us(), &[u64::from(COOLDOWN_US)]);
}

#[test]
fn failed_cut_keeps_domain_on() {
    let mut r = rig();
    r.domain.power_up(&mut r.timer).unwrap();
    let armed_until = r.domain.next_energize_at();
    r.domain.pin().write_fault.arm(PinError::WriteFailed(-5));

    assert!(r.act(PowerAction::Suspend).is_err());
    assert_eq!(r.domain.state(), PowerState::On);
    assert_eq!(r.domain.next_energize_at(), armed_until);
}

// ── Configuration loading ─────────────────────────────────────

#[test]
fn json_config_with_legacy_names_drives_timing() {
    let json = r#"{
        "name": "cam",
        "enable": { "port": "gpio1", "pin": 7, "active_low": true },
        "startup_delay_us": 300,
        "off_on_delay_us": 700,
        "enable_pin_high_drive": true
    }"#;
    let config = DomainConfig::from_json(json).unwrap();
    let clock = SimClock::new();
    let log = EventLog::new();
    let mut domain = PowerDomainBuilder::new(config, MockPin::new("cam-en", &clock, &log))
        .build()
        .unwrap();
    let mut timer = SimTimer::with_clock(clock);

    domain.power_up(&mut timer).unwrap();
    assert_eq!(timer.sleeps_us(), &[700, 300]);
    assert_eq!(
        log.modes("cam-en"),
        vec![
            PinMode::Disconnected,
            PinMode::OutputInactive { high_drive: true }
        ]
    );
}
