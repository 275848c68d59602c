//! Dependent notification broadcast.
//!
//! Every dependent receives the notice exactly once, in registration
//! order.  A failing dependent never stops the broadcast; its error is
//! logged and recorded in the [`FanOutReport`] so the caller can inspect
//! partial failures after the action returns.

use heapless::Vec;
use log::{debug, warn};

use crate::app::ports::{PowerDependent, PowerNotice};
use crate::config::{Label, label};
use crate::error::PowerError;

/// Maximum number of individual faults kept per broadcast.
pub const MAX_REPORTED_FAULTS: usize = 8;

/// One dependent that rejected a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentFault {
    /// Position in registration order.
    pub index: usize,
    pub name: Label,
    pub error: PowerError,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub notice: PowerNotice,
    /// Dependents the notice was delivered to (successful or not).
    pub notified: usize,
    pub faults: Vec<DependentFault, MAX_REPORTED_FAULTS>,
    /// Faults beyond [`MAX_REPORTED_FAULTS`] that were counted but not kept.
    pub dropped_faults: usize,
}

impl FanOutReport {
    fn new(notice: PowerNotice) -> Self {
        Self {
            notice,
            notified: 0,
            faults: Vec::new(),
            dropped_faults: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.dropped_faults == 0
    }

    pub fn fault_count(&self) -> usize {
        self.faults.len() + self.dropped_faults
    }
}

pub(crate) fn notify_all(
    owner: &str,
    dependents: &mut [Box<dyn PowerDependent>],
    notice: PowerNotice,
) -> FanOutReport {
    let mut report = FanOutReport::new(notice);

    for (index, dependent) in dependents.iter_mut().enumerate() {
        report.notified += 1;
        match dependent.on_power_notice(notice) {
            Ok(()) => debug!("{}: {} -> {}", owner, notice, dependent.name()),
            Err(error) => {
                warn!("{}: {} -> {} failed: {}", owner, notice, dependent.name(), error);
                let fault = DependentFault {
                    index,
                    name: label(dependent.name()),
                    error,
                };
                if report.faults.push(fault).is_err() {
                    report.dropped_faults += 1;
                }
            }
        }
    }

    report
}
