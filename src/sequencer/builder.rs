//! Domain construction and the initialisation sequence.
//!
//! 1. Validate the configuration.
//! 2. Check the enable pin, then the parent domain (if any), are ready.
//! 3. Seed the cool-down window from boot: the rail may have been switched
//!    off just before we started, so the first `RESUME` waits it out.
//! 4. Force the pin to float so hardware and logical state agree.
//! 5. Register dependents, initialising nested sub-domains after their
//!    parent.
//!
//! The rail is never energised here.

use embassy_time::{Duration, Instant};
use log::{debug, error};

use crate::app::ports::{DeviceReady, EnablePin, PinMode, PowerDependent};
use crate::config::DomainConfig;
use crate::error::{Dependency, PowerError, Result};

use super::{PowerDomain, PowerState, Subdomain};

type SubdomainInit = Box<dyn FnOnce(&dyn DeviceReady) -> Result<Box<dyn PowerDependent>>>;

enum Pending {
    Device(Box<dyn PowerDependent>),
    Subdomain(SubdomainInit),
}

/// Explicit builder for a [`PowerDomain`].
///
/// `'p` is the borrow of the declared parent, whose readiness is read when
/// [`build`](Self::build) runs.
pub struct PowerDomainBuilder<'p, P: EnablePin> {
    config: DomainConfig,
    pin: P,
    parent: Option<&'p dyn DeviceReady>,
    dependents: Vec<Pending>,
}

impl<'p, P: EnablePin + 'static> PowerDomainBuilder<'p, P> {
    pub fn new(config: DomainConfig, pin: P) -> Self {
        Self {
            config,
            pin,
            parent: None,
            dependents: Vec::new(),
        }
    }

    /// Declare the domain this one is powered from.
    pub fn parent<'q>(self, parent: &'q dyn DeviceReady) -> PowerDomainBuilder<'q, P> {
        PowerDomainBuilder {
            config: self.config,
            pin: self.pin,
            parent: Some(parent),
            dependents: self.dependents,
        }
    }

    /// Register a dependent device.  Notification order is registration
    /// order.
    pub fn dependent(mut self, device: Box<dyn PowerDependent>) -> Self {
        self.dependents.push(Pending::Device(device));
        self
    }

    /// Register a nested domain powered from this one.
    ///
    /// It is initialised right after this domain, with this domain as its
    /// parent, and placed in `handle`.  The parent forwards its
    /// `TURN_ON` / `TURN_OFF` notices to it; `RESUME` / `SUSPEND` go through
    /// `handle`.
    pub fn subdomain<Q: EnablePin + 'static>(
        mut self,
        child: PowerDomainBuilder<'static, Q>,
        handle: &Subdomain<Q>,
    ) -> Self {
        let handle = handle.clone();
        self.dependents.push(Pending::Subdomain(Box::new(move |parent: &dyn DeviceReady| {
            let domain = child.parent(parent).build()?;
            Ok(Box::new(handle.install(domain)) as Box<dyn PowerDependent>)
        })));
        self
    }

    /// Run the initialisation sequence.  On error the domain never exists.
    pub fn build(self) -> Result<PowerDomain<P>> {
        let Self {
            config,
            mut pin,
            parent,
            dependents,
        } = self;

        config.validate()?;

        if !pin.is_ready() {
            error!("GPIO port {} is not ready", pin.label());
            return Err(PowerError::DependencyNotReady(Dependency::EnablePin));
        }
        if let Some(parent) = parent.filter(|p| !p.is_ready()) {
            error!(
                "Invalid domain sequencing! {} depends on {}",
                config.name,
                parent.label()
            );
            return Err(PowerError::DependencyNotReady(Dependency::ParentDomain));
        }

        let cooldown_delay = Duration::from_micros(u64::from(config.cooldown_delay_us));

        pin.configure(PinMode::Disconnected)?;
        debug!("{} is OFF and not powered", config.name);

        let mut domain = PowerDomain {
            name: config.name,
            pin,
            startup_delay: Duration::from_micros(u64::from(config.startup_delay_us)),
            cooldown_delay,
            high_drive: config.enable_high_drive,
            next_energize_at: Instant::from_micros(0) + cooldown_delay,
            state: PowerState::Disconnected,
            dependents: Vec::with_capacity(dependents.len()),
            last_fan_out: None,
        };

        // Sub-domains see a parent whose own init has completed, so their
        // parent check always passes here.
        for pending in dependents {
            let device = match pending {
                Pending::Device(device) => device,
                Pending::Subdomain(init) => init(&domain)?,
            };
            domain.dependents.push(device);
        }

        Ok(domain)
    }
}
