//! `critical-section` implementation for ESP-IDF.
//!
//! [`PowerRequests`](crate::app::requests::PowerRequests) sits on an
//! `embassy-sync` channel guarded by `CriticalSectionRawMutex`, which needs
//! one global `critical_section::Impl`.  Host builds get it from the `std`
//! feature of `critical-section` (dev-dependency); on ESP-IDF it is a single
//! process-wide mutex, re-entrant per thread so nested sections don't
//! deadlock.

use std::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

use critical_section::RawRestoreState;

static QUEUE_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static NESTING: Cell<u32> = const { Cell::new(0) };
    static HELD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

struct IdfCriticalSection;

critical_section::set_impl!(IdfCriticalSection);

// SAFETY: the outermost `acquire` on a thread takes the mutex and keeps the
// guard until the matching outermost `release`; inner pairs only count.
unsafe impl critical_section::Impl for IdfCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let depth = NESTING.get();
        if depth == 0 {
            // The lock guards `()`, so a poisoned lock is still sound to use.
            let guard = QUEUE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            HELD.with_borrow_mut(|held| *held = Some(guard));
        }
        NESTING.set(depth + 1);
        RawRestoreState::default()
    }

    unsafe fn release(_restore: RawRestoreState) {
        match NESTING.get() {
            0 => {}
            1 => {
                NESTING.set(0);
                HELD.with_borrow_mut(|held| *held = None);
            }
            depth => NESTING.set(depth - 1),
        }
    }
}
