/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Publishing messages to endpoints and topics.
//!
//! Publishing never reads or writes the registration record, so it is kept
//! apart from the [`RegistrationManager`](super::RegistrationManager) and runs
//! without its lock.

use std::time::Duration;

use interrupt_support::InterruptScope;

use crate::error::{debug, Error, Result};
use crate::internal::service::EndpointService;

pub struct Publisher<Svc> {
    service: Svc,
    request_timeout: Duration,
}

impl<Svc: EndpointService> Publisher<Svc> {
    pub fn new(service: Svc, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    /// Publish a message to an endpoint or topic.
    pub fn publish(
        &self,
        subject: &str,
        message: &str,
        target_id: &str,
        scope: &InterruptScope,
    ) -> Result<()> {
        check_content(subject, message)?;
        if target_id.is_empty() {
            return Err(Error::InvalidArgument("empty publish target".to_string()));
        }
        scope.err_if_interrupted()?;
        self.service
            .publish(target_id, subject, message, self.request_timeout)?;
        debug!("published to '{}'", target_id);
        Ok(())
    }

    /// Publish the same message to each target in order, one outcome per target.
    pub fn publish_to_all(
        &self,
        subject: &str,
        message: &str,
        targets: &[String],
        scope: &InterruptScope,
    ) -> Result<Vec<(String, Result<()>)>> {
        check_content(subject, message)?;
        Ok(targets
            .iter()
            .map(|target| {
                (
                    target.clone(),
                    self.publish(subject, message, target, scope),
                )
            })
            .collect())
    }
}

fn check_content(subject: &str, message: &str) -> Result<()> {
    if subject.is_empty() || message.is_empty() {
        return Err(Error::InvalidArgument(
            "subject and message are required".to_string(),
        ));
    }
    Ok(())
}
