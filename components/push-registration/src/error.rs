/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

pub use log::{debug, error, info, warn};

use error_support::{ErrorHandling, GetErrorHandling};
use interrupt_support::Interrupted;

pub type Result<T, E = Error> = std::result::Result<T, E>;
pub type ApiResult<T, E = PushRegistrationApiError> = std::result::Result<T, E>;

/// The errors callers of this crate see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushRegistrationApiError {
    /// A call to the pub/sub endpoint service failed.
    #[error("Remote service error: {reason}")]
    RemoteService { reason: String },

    /// The messaging token could not be obtained.
    #[error("Token error: {reason}")]
    Token { reason: String },

    /// The device has no endpoint yet, so there is nothing to update remotely.
    #[error("The device is not registered")]
    NotRegistered,

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The operation was interrupted or took longer than allowed.
    #[error("The operation was interrupted or timed out")]
    Interrupted,

    #[error("Unexpected error: {reason}")]
    Internal { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Messaging token error: {0}")]
    Token(String),

    #[error("No endpoint registered")]
    NotRegistered,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Error executing SQL: {0}")]
    StorageSql(#[from] rusqlite::Error),

    #[error("{0}")]
    Interrupted(#[from] Interrupted),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("The registration worker has stopped")]
    WorkerGone,
}

impl GetErrorHandling for Error {
    type ExternalError = PushRegistrationApiError;

    fn get_error_handling(&self) -> ErrorHandling<Self::ExternalError> {
        match self {
            Error::RemoteService(reason) => {
                ErrorHandling::convert(PushRegistrationApiError::RemoteService {
                    reason: reason.clone(),
                })
                .log_warning()
            }
            Error::Token(reason) => ErrorHandling::convert(PushRegistrationApiError::Token {
                reason: reason.clone(),
            })
            .log_warning(),
            Error::NotRegistered => {
                ErrorHandling::convert(PushRegistrationApiError::NotRegistered)
            }
            Error::InvalidArgument(reason) => {
                ErrorHandling::convert(PushRegistrationApiError::InvalidArgument {
                    reason: reason.clone(),
                })
            }
            Error::Interrupted(_) | Error::Timeout(_) => {
                ErrorHandling::convert(PushRegistrationApiError::Interrupted).log_warning()
            }
            Error::Storage(_) | Error::StorageSql(_) | Error::WorkerGone => {
                ErrorHandling::convert(PushRegistrationApiError::Internal {
                    reason: self.to_string(),
                })
                .log_error()
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod test {
    use super::*;
    use error_support::convert_log_error;

    #[test]
    fn conversion() {
        init_for_tests();
        assert_eq!(
            convert_log_error(Error::RemoteService("boom".into())),
            PushRegistrationApiError::RemoteService {
                reason: "boom".into()
            }
        );
        assert_eq!(
            convert_log_error(Error::Interrupted(Interrupted)),
            PushRegistrationApiError::Interrupted
        );
        assert_eq!(
            convert_log_error(Error::Timeout(std::time::Duration::from_secs(1))),
            PushRegistrationApiError::Interrupted
        );
        assert!(matches!(
            convert_log_error(Error::Storage("disk".into())),
            PushRegistrationApiError::Internal { .. }
        ));
    }

    #[test]
    fn log_levels() {
        assert_eq!(Error::NotRegistered.get_error_handling().log_level, None);
        assert_eq!(
            Error::InvalidArgument("empty".into())
                .get_error_handling()
                .log_level,
            None
        );
        assert_eq!(
            Error::Token("gone".into()).get_error_handling().log_level,
            Some(log::Level::Warn)
        );
        assert_eq!(
            Error::WorkerGone.get_error_handling().log_level,
            Some(log::Level::Error)
        );
    }
}
