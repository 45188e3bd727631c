/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{Interrupted, Interruptee};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Hands out [`InterruptScope`]s and interrupts them.
///
/// Each interrupter has its own counter, so interrupting one manager never
/// affects the operations of another.
#[derive(Clone, Debug, Default)]
pub struct Interrupter {
    counter: Arc<AtomicUsize>,
}

impl Interrupter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope for an operation that is about to start.
    #[inline]
    pub fn scope(&self) -> InterruptScope {
        InterruptScope {
            counter: Arc::clone(&self.counter),
            start_value: self.counter.load(Ordering::Relaxed),
        }
    }

    /// Interrupt any `InterruptScope`s created before this call.
    #[inline]
    pub fn interrupt(&self) {
        self.counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Scope for an interruptible operation
///
/// The scope remembers the counter value of its [`Interrupter`] at creation
/// time and reports itself interrupted once that counter has moved. If several
/// steps take part in the same operation they should share clones of a single
/// scope.
#[derive(Clone, Debug)]
pub struct InterruptScope {
    counter: Arc<AtomicUsize>,
    start_value: usize,
}

impl InterruptScope {
    #[inline]
    /// Return Err(Interrupted) if this scope was interrupted
    pub fn err_if_interrupted(&self) -> Result<(), Interrupted> {
        Interruptee::err_if_interrupted(self)
    }
}

impl Interruptee for InterruptScope {
    #[inline]
    fn was_interrupted(&self) -> bool {
        self.counter.load(Ordering::Relaxed) != self.start_value
    }
}
