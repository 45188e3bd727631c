/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The remote pub/sub endpoint service.
//!
//! How the service is reached (which vendor, which wire format) is up to the
//! embedding application; this crate only needs the three calls below. Every
//! call is potentially a blocking network request and receives the timeout it
//! must honour. Publishing runs concurrently with registration, so
//! implementations are shared between threads.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Endpoint attribute holding the enabled state.
pub const ENDPOINT_ATTRIBUTE_ENABLED: &str = "Enabled";

#[cfg_attr(test, mockall::automock)]
pub trait EndpointService: Send + Sync {
    /// Create (or look up) the platform endpoint for `token`, returning its id.
    fn create_endpoint(
        &self,
        platform_application_id: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<String>;

    /// Set a single attribute on an existing endpoint.
    fn set_endpoint_attribute(
        &self,
        endpoint_id: &str,
        name: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<()>;

    /// Publish a message to an endpoint or topic.
    fn publish(&self, target_id: &str, subject: &str, message: &str, timeout: Duration)
        -> Result<()>;
}

impl<T: EndpointService + ?Sized> EndpointService for Box<T> {
    fn create_endpoint(
        &self,
        platform_application_id: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<String> {
        (**self).create_endpoint(platform_application_id, token, timeout)
    }

    fn set_endpoint_attribute(
        &self,
        endpoint_id: &str,
        name: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<()> {
        (**self).set_endpoint_attribute(endpoint_id, name, value, timeout)
    }

    fn publish(
        &self,
        target_id: &str,
        subject: &str,
        message: &str,
        timeout: Duration,
    ) -> Result<()> {
        (**self).publish(target_id, subject, message, timeout)
    }
}

impl<T: EndpointService + ?Sized> EndpointService for Arc<T> {
    fn create_endpoint(
        &self,
        platform_application_id: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<String> {
        (**self).create_endpoint(platform_application_id, token, timeout)
    }

    fn set_endpoint_attribute(
        &self,
        endpoint_id: &str,
        name: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<()> {
        (**self).set_endpoint_attribute(endpoint_id, name, value, timeout)
    }

    fn publish(
        &self,
        target_id: &str,
        subject: &str,
        message: &str,
        timeout: Duration,
    ) -> Result<()> {
        (**self).publish(target_id, subject, message, timeout)
    }
}
