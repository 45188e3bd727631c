/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Helpers for components to "handle" errors.

/// Specifies how an "internal" error is converted to an "external" public error and
/// the level it is logged at on the way out.
pub struct ErrorHandling<E> {
    /// The external error that should be returned.
    pub err: E,
    /// If Some(level), a log message is written at that level.
    pub log_level: Option<log::Level>,
}

impl<E> ErrorHandling<E> {
    /// Just convert the error without any logging.
    pub fn convert(err: E) -> Self {
        Self {
            err,
            log_level: None,
        }
    }

    pub fn log_info(self) -> Self {
        self.log(log::Level::Info)
    }

    pub fn log_warning(self) -> Self {
        self.log(log::Level::Warn)
    }

    pub fn log_error(self) -> Self {
        self.log(log::Level::Error)
    }

    fn log(self, level: log::Level) -> Self {
        Self {
            log_level: Some(level),
            ..self
        }
    }
}

/// A trait to define how errors are converted and logged.
pub trait GetErrorHandling {
    type ExternalError;

    /// Return how to handle our internal errors
    fn get_error_handling(&self) -> ErrorHandling<Self::ExternalError>;
}

/// Handle the specified "internal" error, logging it as requested and converting it to the
/// public error. Called by the `handle_error` macro so needs to be public.
pub fn convert_log_error<IE, EE>(e: IE) -> EE
where
    IE: GetErrorHandling<ExternalError = EE> + std::error::Error,
{
    let handling = e.get_error_handling();
    if let Some(level) = handling.log_level {
        log::log!(level, "{}", e);
    }
    handling.err
}
