/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![warn(rust_2018_idioms)]
//! Error conversion shared by the workspace's components.
//!
//! A component keeps an internal `Error` type for its own code and a public error type for
//! its callers. The internal type implements [`GetErrorHandling`] to say which public error
//! each variant becomes and how loudly it is logged. Public functions are then written
//! against the internal type and marked with [`handle_error`]:
//!
//! ```ignore
//! #[handle_error(Error)]
//! pub fn do_something(&self) -> ApiResult<String> {
//!     // `?` works on the internal `Error` in here.
//!     let value = self.store.get_meta("key")?;
//!     Ok(value.unwrap_or_default())
//! }
//! ```

mod handling;

pub use error_support_macros::handle_error;
pub use handling::{convert_log_error, ErrorHandling, GetErrorHandling};
