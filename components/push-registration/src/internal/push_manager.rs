/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Main entrypoint for push registration, reconciles the device's endpoint
//! with the remote endpoint service.
//!
//! The [`RegistrationManager`] allows users to:
//! - Register (or re-register) an endpoint whenever the messaging token changes or no endpoint exists
//! - Enable or disable push on the registered endpoint
//!
//! Every registration failure clears the endpoint id, so the next trigger performs a full fresh
//! registration instead of patching a remote endpoint in an unknown state. The desired enabled
//! state is only ever changed by the caller, so it survives any number of failed attempts.

use std::time::Duration;

use interrupt_support::{InterruptScope, Interrupter};

use crate::error::{debug, info, warn, Error, Result};
use crate::internal::config::RegistrationConfiguration;
use crate::internal::listener::StateChangeEvent;
use crate::internal::service::{EndpointService, ENDPOINT_ATTRIBUTE_ENABLED};
use crate::internal::storage::{EndpointRecord, Storage};
use crate::internal::token::TokenSource;

/// What a token-refreshed trigger ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Token unchanged and an endpoint already exists; nothing was done.
    Skipped,
    /// The endpoint was created and its enabled attribute set.
    Registered,
    /// A remote call failed; the endpoint id has been cleared.
    Failed,
}

pub struct RegistrationManager<Svc, S> {
    service: Svc,
    store: S,
    record: EndpointRecord,
    request_timeout: Duration,
    interrupter: Interrupter,
    last_reported: bool,
    pending_event: Option<StateChangeEvent>,
}

impl<Svc: EndpointService, S: Storage> RegistrationManager<Svc, S> {
    pub fn new(config: &RegistrationConfiguration, service: Svc, store: S) -> Result<Self> {
        config.validate()?;
        let record = EndpointRecord::load(&store, &config.platform_application_id)?;
        debug!(
            "loaded registration: endpoint '{}', enabled {}",
            record.endpoint_id, record.push_enabled
        );
        Ok(Self {
            service,
            store,
            last_reported: record.push_enabled,
            record,
            request_timeout: config.request_timeout,
            interrupter: Interrupter::new(),
            pending_event: None,
        })
    }

    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    pub fn is_registered(&self) -> bool {
        self.record.is_registered()
    }

    pub fn is_enabled(&self) -> bool {
        self.record.push_enabled
    }

    pub fn should_enable_push(&self) -> bool {
        self.record.should_enable_push
    }

    pub fn endpoint_id(&self) -> &str {
        &self.record.endpoint_id
    }

    pub fn record(&self) -> &EndpointRecord {
        &self.record
    }

    /// The state change produced by the last operation, if the confirmed
    /// enabled state moved since it was last reported.
    pub fn take_state_change(&mut self) -> Option<StateChangeEvent> {
        self.pending_event.take()
    }

    /// The messaging token was refreshed, or the app wants to make sure it is registered.
    ///
    /// Remote failures are absorbed: they are logged, reflected in the record and reported
    /// as [`RegistrationOutcome::Failed`]. Only a failure to persist is returned as an error.
    pub fn on_token_refreshed(
        &mut self,
        token: &str,
        did_change: bool,
        scope: &InterruptScope,
    ) -> Result<RegistrationOutcome> {
        if !did_change && self.record.is_registered() {
            debug!("token unchanged and endpoint registered");
            return Ok(RegistrationOutcome::Skipped);
        }
        info!("token changed or endpoint not registered, registering");
        let outcome = match self.register(token, scope) {
            Ok(()) => {
                info!("Push Notifications - OK");
                RegistrationOutcome::Registered
            }
            Err(e) => {
                warn!("Push Notifications - FAILED : {}", e);
                RegistrationOutcome::Failed
            }
        };
        // Whatever happened above gets persisted and then reported.
        let persisted = self.record.persist_registration(&self.store);
        self.note_state();
        persisted?;
        Ok(outcome)
    }

    /// The messaging token could not be obtained. Push is considered disabled until the
    /// next successful registration; nothing is persisted.
    pub fn on_token_refresh_failed(&mut self, reason: &str) {
        warn!("Push Notifications - FAILED : token registration failed : {}", reason);
        self.record.push_enabled = false;
        self.note_state();
    }

    /// Fetch the current token and run the token-refreshed trigger, flagging the token as
    /// changed when it differs from the one we last saw.
    pub fn register_device(
        &mut self,
        source: &dyn TokenSource,
        scope: &InterruptScope,
    ) -> Result<RegistrationOutcome> {
        let token = match source.current_token() {
            Ok(token) => token,
            Err(e) => {
                let reason = e.to_string();
                self.on_token_refresh_failed(&reason);
                return Err(Error::Token(reason));
            }
        };
        let did_change = self.store.get_last_token()?.as_deref() != Some(token.as_str());
        if did_change {
            self.store.set_last_token(&token)?;
        }
        self.on_token_refreshed(&token, did_change, scope)
    }

    /// Record the caller's wish and try to apply it to the remote endpoint.
    ///
    /// The desired state is persisted whatever happens remotely; the confirmed state only
    /// changes (and is only persisted) when the remote call succeeds. The remote failure is
    /// returned so the caller can report it.
    pub fn set_desired_enabled(&mut self, enabled: bool, scope: &InterruptScope) -> Result<()> {
        self.record.should_enable_push = enabled;
        let remote = if self.record.is_registered() {
            self.set_remote_enabled(enabled, scope)
        } else {
            Err(Error::NotRegistered)
        };
        let confirmed = remote.is_ok();
        if confirmed {
            self.record.push_enabled = enabled;
        }
        let persisted = self.record.persist_desired(&self.store, confirmed);
        self.note_state();
        persisted?;
        remote
    }

    fn register(&mut self, token: &str, scope: &InterruptScope) -> Result<()> {
        if let Err(e) = self.create_endpoint(token, scope) {
            self.record.endpoint_id.clear();
            self.record.push_enabled = false;
            return Err(e);
        }
        let enabled = self.record.should_enable_push;
        debug!("Updating push enabled state to {}", enabled);
        if let Err(e) = self.set_remote_enabled(enabled, scope) {
            self.record.endpoint_id.clear();
            return Err(e);
        }
        self.record.push_enabled = enabled;
        Ok(())
    }

    fn create_endpoint(&mut self, token: &str, scope: &InterruptScope) -> Result<()> {
        scope.err_if_interrupted()?;
        let endpoint_id = self.service.create_endpoint(
            &self.record.platform_application_id,
            token,
            self.request_timeout,
        )?;
        if endpoint_id.is_empty() {
            return Err(Error::RemoteService(
                "endpoint service returned an empty endpoint id".to_string(),
            ));
        }
        debug!("endpoint id: {}", endpoint_id);
        self.record.endpoint_id = endpoint_id;
        Ok(())
    }

    fn set_remote_enabled(&self, enabled: bool, scope: &InterruptScope) -> Result<()> {
        scope.err_if_interrupted()?;
        self.service.set_endpoint_attribute(
            &self.record.endpoint_id,
            ENDPOINT_ATTRIBUTE_ENABLED,
            &enabled.to_string(),
            self.request_timeout,
        )?;
        debug!(
            "Set push {} for endpoint id: {}",
            if enabled { "enabled" } else { "disabled" },
            self.record.endpoint_id
        );
        Ok(())
    }

    // Edge-triggered: only a change of the confirmed state since the last report counts.
    fn note_state(&mut self) {
        let push_enabled = self.record.push_enabled;
        if push_enabled != self.last_reported {
            self.last_reported = push_enabled;
            self.pending_event = Some(StateChangeEvent { push_enabled });
        }
    }
}
