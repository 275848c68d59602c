//! Shared handles to nested domains.
//!
//! A sub-domain is both a dependent of its parent (it follows the parent's
//! `TURN_ON` / `TURN_OFF` notices) and a full domain in its own right that
//! the power policy drives with all four actions.  [`Subdomain`] gives the
//! caller that second view: the parent keeps one clone of the handle in its
//! dependent list, the caller keeps another.
//!
//! The handle is created empty and filled in when the parent is built,
//! because a child is only initialised after its parent.

use std::cell::RefCell;
use std::rc::Rc;

use crate::app::ports::{EnablePin, MonotonicTimer, PowerDependent, PowerNotice};
use crate::config::{Label, label};
use crate::error::{PowerError, Result};

use super::{PowerAction, PowerDomain, PowerState};

/// Caller-side handle to a nested [`PowerDomain`].
pub struct Subdomain<Q: EnablePin> {
    slot: Rc<RefCell<Option<PowerDomain<Q>>>>,
}

impl<Q: EnablePin> Subdomain<Q> {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    /// `true` once the parent has been built and this domain initialised.
    pub fn is_built(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Run one power action on the nested domain.
    pub fn pm_action<T: MonotonicTimer>(&self, action: PowerAction, timer: &mut T) -> Result<()> {
        self.with(|domain| domain.pm_action(action, timer))?
    }

    pub fn state(&self) -> Option<PowerState> {
        self.slot.borrow().as_ref().map(PowerDomain::state)
    }

    /// Borrow the nested domain, e.g. to serve a request queue against it.
    ///
    /// Fails with [`PowerError::Config`] before the parent is built.
    pub fn with<R>(&self, f: impl FnOnce(&mut PowerDomain<Q>) -> R) -> Result<R> {
        let mut slot = self
            .slot
            .try_borrow_mut()
            .map_err(|_| PowerError::Device("sub-domain busy"))?;
        let domain = slot
            .as_mut()
            .ok_or(PowerError::Config("sub-domain not initialised"))?;
        Ok(f(domain))
    }

    /// Store the freshly built domain and return the parent's view of it.
    pub(crate) fn install(&self, domain: PowerDomain<Q>) -> SharedDependent<Q> {
        let name = label(domain.name());
        *self.slot.borrow_mut() = Some(domain);
        SharedDependent {
            name,
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<Q: EnablePin> Default for Subdomain<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: EnablePin> Clone for Subdomain<Q> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

/// Parent-side view of a [`Subdomain`].
pub(crate) struct SharedDependent<Q: EnablePin> {
    name: Label,
    slot: Rc<RefCell<Option<PowerDomain<Q>>>>,
}

impl<Q: EnablePin> PowerDependent for SharedDependent<Q> {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_power_notice(&mut self, notice: PowerNotice) -> Result<()> {
        let mut slot = self
            .slot
            .try_borrow_mut()
            .map_err(|_| PowerError::Device("sub-domain busy"))?;
        match slot.as_mut() {
            Some(domain) => domain.on_power_notice(notice),
            None => Err(PowerError::Config("sub-domain not initialised")),
        }
    }
}
