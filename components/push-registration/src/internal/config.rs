/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Provides configuration for the [PushRegistrationManager](`crate::PushRegistrationManager`)
//!

use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RegistrationConfiguration {
    /// The messaging-service platform application this build registers with.
    /// A different value from the one persisted discards all stored state.
    pub platform_application_id: String,

    /// OS Path to the database
    pub database_path: String,

    /// Upper bound handed to every remote call.
    pub request_timeout: Duration,

    /// Pre-configured recipient endpoint or topic ids test notifications go to.
    pub recipients: Vec<String>,
}

impl RegistrationConfiguration {
    pub fn new(platform_application_id: &str, database_path: &str) -> Self {
        Self {
            platform_application_id: platform_application_id.to_owned(),
            database_path: database_path.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            recipients: Vec::new(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.platform_application_id.is_empty() {
            return Err(Error::InvalidArgument(
                "platform_application_id must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidArgument(
                "request_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
// To avoid a future footgun, the default implementation is only for tests
impl Default for RegistrationConfiguration {
    fn default() -> RegistrationConfiguration {
        RegistrationConfiguration::new("arn:test:app/GCM/test-app", "")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validate() {
        assert!(RegistrationConfiguration::default().validate().is_ok());
        assert!(RegistrationConfiguration::new("", "db").validate().is_err());
        assert!(RegistrationConfiguration::new("app", "db")
            .with_request_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
