/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The native messaging token side of registration.

use crate::error::Result;

/// Supplies the device's native messaging token.
pub trait TokenSource {
    /// Fetch the current token, asking the platform for one if needed.
    fn current_token(&self) -> Result<String>;
}

/// Receives token refreshes from whatever owns the native messaging client.
pub trait TokenUpdateObserver: Send + Sync {
    fn on_token_update(&self, token: &str, did_change: bool);

    fn on_token_update_failed(&self, reason: &str);
}
