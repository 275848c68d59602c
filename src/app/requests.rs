//! Power request queue.
//!
//! Power actions block for milliseconds, so they cannot run inside an
//! interrupt or timer callback.  Those contexts [`submit`] requests
//! instead; one worker thread owns the domain and [`serve`]s them in
//! FIFO order.
//!
//! ```text
//! ┌──────────────┐  PowerAction  ┌──────────────┐   pm_action   ┌─────────────┐
//! │ ISR / policy │──────────────▶│ PowerRequests│──────────────▶│ PowerDomain │
//! │ (any context)│   submit()    │  (channel)   │    serve()    │ (worker)    │
//! └──────────────┘               └──────────────┘               └─────────────┘
//! ```
//!
//! [`submit`]: PowerRequests::submit
//! [`serve`]: PowerRequests::serve

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{error, info, warn};

use crate::app::ports::{EnablePin, MonotonicTimer};
use crate::error::{PowerError, Result};
use crate::sequencer::{PowerAction, PowerDomain};

/// Bounded queue of pending power actions for a single domain.
pub struct PowerRequests<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, PowerAction, N>,
}

impl<const N: usize> PowerRequests<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue an action.  Never blocks; safe from interrupt context.
    pub fn submit(&self, action: PowerAction) -> Result<()> {
        self.channel.try_send(action).map_err(|_| {
            warn!("power request {} dropped: queue full", action);
            PowerError::QueueFull
        })
    }

    /// Queue a raw action code (e.g. received over a wire protocol).
    pub fn submit_raw(&self, code: u8) -> Result<()> {
        self.submit(PowerAction::try_from(code)?)
    }

    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Execute every queued action against `domain`, reporting each outcome
    /// to `on_done`.  Returns the number of actions executed.
    ///
    /// Refuses to run (leaving the queue untouched) from a context that
    /// cannot block.
    pub fn serve<P, T>(
        &self,
        domain: &mut PowerDomain<P>,
        timer: &mut T,
        mut on_done: impl FnMut(PowerAction, Result<()>),
    ) -> Result<usize>
    where
        P: EnablePin,
        T: MonotonicTimer,
    {
        if !timer.can_block() {
            error!("{}: request queue served from a non-blocking context", domain.name());
            return Err(PowerError::UnsupportedContext);
        }

        let mut served = 0;
        while let Ok(action) = self.channel.try_receive() {
            let outcome = domain.pm_action(action, timer);
            match outcome {
                Ok(()) => info!("{}: {} done ({})", domain.name(), action, domain.state()),
                Err(e) => warn!("{}: {} failed: {}", domain.name(), action, e),
            }
            on_done(action, outcome);
            served += 1;
        }
        Ok(served)
    }
}

impl<const N: usize> Default for PowerRequests<N> {
    fn default() -> Self {
        Self::new()
    }
}
