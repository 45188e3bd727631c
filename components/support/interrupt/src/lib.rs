/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![warn(rust_2018_idioms)]
//! Cooperative cancellation for long-running or remote operations.
//!
//! An [`Interrupter`] is owned by whatever drives the work (for example a
//! registration manager). Each operation takes an [`InterruptScope`] from it
//! when it starts and checks that scope between its blocking steps. Calling
//! [`Interrupter::interrupt`] marks every scope handed out before the call as
//! interrupted; scopes created afterwards start clean.
//!
//! Nothing here can stop code that is already blocked inside a remote call.
//! Callers are expected to sprinkle `err_if_interrupted()` checks before each
//! such call and rely on per-call timeouts for the rest.

mod scopes;

pub use scopes::{InterruptScope, Interrupter};

/// Represents the state of something that may be interrupted. Decoupled from
/// the interrupt mechanics so that code which only checks for interruption
/// does not need to know who triggers it.
pub trait Interruptee {
    fn was_interrupted(&self) -> bool;

    fn err_if_interrupted(&self) -> Result<(), Interrupted> {
        if self.was_interrupted() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

/// The error returned by err_if_interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("The operation was interrupted.")]
pub struct Interrupted;

#[cfg(test)]
mod test {
    use super::*;

    struct Flag(bool);

    impl Interruptee for Flag {
        fn was_interrupted(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn err_if_interrupted() {
        assert_eq!(Flag(false).err_if_interrupted(), Ok(()));
        assert_eq!(Flag(true).err_if_interrupted(), Err(Interrupted));
        assert_eq!(Interrupted.to_string(), "The operation was interrupted.");
    }
}
