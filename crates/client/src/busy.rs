//! Overlap guard for user-triggered operations.
//!
//! There is only one logical thread of control, so no mutex is needed around
//! component state; the flag exists to reject overlapping user-triggered
//! calls (rapid double-clicks) while a remote call is outstanding. The flag
//! is part of the observable contract - frontends disable the triggering
//! action while it is set.

use std::sync::atomic::{AtomicBool, Ordering};

/// A busy flag guarding a component against overlapping operations.
#[derive(Debug, Default)]
pub(crate) struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub(crate) const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Try to claim the flag; `None` when an operation is already running.
    pub(crate) fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_ok()
            .then_some(BusyGuard(&self.0))
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the owning [`BusyFlag`] on drop.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
