/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![allow(unknown_lints)]
#![warn(rust_2018_idioms)]
//! # Push Registration Component
//!
//! This component keeps a device's push *endpoint* in line with what the application wants. It
//! sits between the platform's native messaging client, which hands out a *token*, and a remote
//! pub/sub endpoint service, which turns that token into an addressable endpoint.
//!
//! ## Background Concepts
//!
//! ### Endpoints
//!
//! The endpoint service knows the device by an opaque *endpoint id*, created from the current
//! messaging token and the *platform application* this build is configured for. An endpoint has
//! an `Enabled` attribute which decides whether messages published to it are delivered.
//!
//! ### Desired and confirmed state
//!
//! The component tracks two enabled flags:
//! * the *desired* state, which only the application changes, through
//!   [`PushRegistrationManager::set_desired_enabled`];
//! * the *confirmed* state, which only changes once the endpoint service has accepted it.
//!
//! Whenever the token changes, or no endpoint is registered, the component creates the endpoint
//! and applies the desired state to it. If any step fails the endpoint id is cleared, so the next
//! attempt starts from scratch. The desired state is never touched by failures, so the
//! application's intent survives any number of retries.
//!
//! All of this is persisted in a small SQLite database. If the configured platform application
//! differs from the one the database was written for, everything stored is discarded and the
//! device registers again.
//!
//! ## API
//!
//! ## Initialization
//!
//! ```no_run
//! use std::sync::Arc;
//! # use push_registration::{EndpointService, Result};
//! # use std::time::Duration;
//! # struct MyEndpointService;
//! # impl EndpointService for MyEndpointService {
//! #     fn create_endpoint(&self, _: &str, _: &str, _: Duration) -> Result<String> { unimplemented!() }
//! #     fn set_endpoint_attribute(&self, _: &str, _: &str, _: &str, _: Duration) -> Result<()> { unimplemented!() }
//! #     fn publish(&self, _: &str, _: &str, _: &str, _: Duration) -> Result<()> { unimplemented!() }
//! # }
//! use push_registration::{
//!     ChannelListener, PushRegistrationManager, RegistrationConfiguration, RegistrationWorker,
//! };
//!
//! let config = RegistrationConfiguration::new(
//!     "arn:aws:sns:us-east-1:000000000000:app/GCM/my-app",
//!     "/path/to/push_registration.db",
//! );
//! let manager = Arc::new(PushRegistrationManager::new(config, Box::new(MyEndpointService))?);
//!
//! // Listeners are called on the worker thread; a channel listener lets the UI
//! // drain state changes on its own thread.
//! let (listener, state_changes) = ChannelListener::new();
//! manager.register_listener(Arc::new(listener));
//!
//! // Remote calls are blocking, so run them off the UI thread.
//! let worker = RegistrationWorker::start(manager.clone())?;
//! worker.on_token_refreshed("native-token", true).wait()?;
//! worker.publish("Subject", "Hello!", "arn:aws:sns:...:endpoint/GCM/my-app/1234").wait()?;
//! # Ok::<(), push_registration::PushRegistrationApiError>(())
//! ```

mod error;
mod internal;
mod worker;

use std::sync::Arc;

use error_support::{convert_log_error, handle_error};
use interrupt_support::{InterruptScope, Interrupter};
use parking_lot::Mutex;

pub use error::{ApiResult, Error, PushRegistrationApiError, Result};
pub use internal::config::{RegistrationConfiguration, DEFAULT_REQUEST_TIMEOUT};
pub use internal::identity::{CredentialProvider, IdentityManager, Timestamp};
pub use internal::listener::{
    ChannelListener, ListenerHandle, PushStateListener, StateChangeEvent,
};
pub use internal::push_manager::RegistrationOutcome;
pub use internal::service::{EndpointService, ENDPOINT_ATTRIBUTE_ENABLED};
pub use internal::storage::{EndpointRecord, Storage, Store};
pub use internal::token::{TokenSource, TokenUpdateObserver};
pub use worker::{PendingResult, RegistrationWorker};

use error::{error, info};
use internal::listener::Notifier;
use internal::Publisher;

type Service = Arc<dyn EndpointService>;
type InternalManager = internal::RegistrationManager<Service, Store>;

/// The outcome of publishing to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub target_id: String,
    pub result: ApiResult<()>,
}

/// Object representing the push registration of this device
///
/// The `PushRegistrationManager` is the main interface provided by this crate. It owns the
/// endpoint lifecycle: registration, the enabled state, persistence and recovery from partial
/// failure. Remote calls block, so callers on a UI thread should go through a
/// [`RegistrationWorker`].
///
/// Registration operations are serialized with each other. Publishing and the state accessors
/// never wait for them.
pub struct PushRegistrationManager {
    // Registration operations read-modify-persist the same record.
    internal: Mutex<InternalManager>,
    // Copy of the record as of the last finished registration operation.
    state: Mutex<EndpointRecord>,
    publisher: Publisher<Service>,
    notifier: Notifier,
    interrupter: Interrupter,
    recipients: Vec<String>,
    identity: Option<IdentityManager<Box<dyn CredentialProvider>>>,
}

impl PushRegistrationManager {
    /// Creates a new [`PushRegistrationManager`], loading any persisted registration
    ///
    /// # Arguments
    ///   - `config`: [`RegistrationConfiguration`] the configuration for this instance
    ///   - `service`: the remote endpoint service
    ///
    /// # Errors
    /// Returns an error in the following cases:
    ///   - the configuration is invalid
    ///   - the manager is unable to open the `database_path` given
    #[handle_error(Error)]
    pub fn new(
        config: RegistrationConfiguration,
        service: Box<dyn EndpointService>,
    ) -> ApiResult<Self> {
        info!(
            "PushRegistrationManager platform_application_id: {}",
            config.platform_application_id
        );
        config.validate()?;
        let store = Store::open(&config.database_path)?;
        let service: Service = Arc::from(service);
        let internal = internal::RegistrationManager::new(&config, Arc::clone(&service), store)?;
        Ok(Self {
            interrupter: internal.interrupter(),
            state: Mutex::new(internal.record().clone()),
            internal: Mutex::new(internal),
            publisher: Publisher::new(service, config.request_timeout),
            notifier: Notifier::new(),
            recipients: config.recipients.clone(),
            identity: None,
        })
    }

    /// Attach the provider of the caller identity and its credentials.
    pub fn with_credentials(mut self, provider: Box<dyn CredentialProvider>) -> Self {
        self.identity = Some(IdentityManager::new(provider));
        self
    }

    /// The messaging token was refreshed (`did_change`) or the app wants to make sure the device
    /// is registered.
    ///
    /// Remote failures never surface here; they are logged and reflected in
    /// [`is_registered`](Self::is_registered) and [`is_enabled`](Self::is_enabled).
    ///
    /// # Errors
    /// Returns an error if the resulting state could not be persisted.
    pub fn on_token_refreshed(
        &self,
        token: &str,
        did_change: bool,
    ) -> ApiResult<RegistrationOutcome> {
        self.on_token_refreshed_scoped(token, did_change, &self.interrupter.scope())
    }

    /// The messaging token could not be obtained. Push is reported as disabled.
    pub fn on_token_refresh_failed(&self, reason: &str) {
        self.run(|internal| internal.on_token_refresh_failed(reason))
    }

    /// Fetch the current token from `source` and register with it.
    ///
    /// # Errors
    /// Returns an error if the token could not be obtained (push is then reported as
    /// disabled) or the state could not be persisted.
    pub fn register_device(&self, source: &dyn TokenSource) -> ApiResult<RegistrationOutcome> {
        self.register_device_scoped(source, &self.interrupter.scope())
    }

    /// Sets whether push should be enabled, and tries to apply it to the endpoint.
    ///
    /// The wish is remembered even when the endpoint service can't be reached, and applied on
    /// the next registration.
    ///
    /// # Errors
    /// Returns an error in the following cases:
    ///   - the device is not registered yet
    ///   - the endpoint service rejected the update or could not be reached
    ///   - the state could not be persisted
    pub fn set_desired_enabled(&self, enabled: bool) -> ApiResult<()> {
        self.set_desired_enabled_scoped(enabled, &self.interrupter.scope())
    }

    /// Publish a message to an endpoint or topic.
    ///
    /// # Errors
    /// Returns an error, without calling the endpoint service, if the subject, message or
    /// target is empty.
    pub fn publish(&self, subject: &str, message: &str, target_id: &str) -> ApiResult<()> {
        self.publish_scoped(subject, message, target_id, &self.interrupter.scope())
    }

    /// Publish a message to each of `targets`, in order.
    ///
    /// # Errors
    /// Returns an error, without publishing anything, if the subject or message is empty.
    pub fn publish_to_all(
        &self,
        subject: &str,
        message: &str,
        targets: &[String],
    ) -> ApiResult<Vec<PublishOutcome>> {
        self.publish_to_all_scoped(subject, message, targets, &self.interrupter.scope())
    }

    /// Publish a message to every recipient in the configuration.
    pub fn publish_to_recipients(
        &self,
        subject: &str,
        message: &str,
    ) -> ApiResult<Vec<PublishOutcome>> {
        self.publish_to_all(subject, message, &self.recipients)
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Subscribe to changes of the confirmed enabled state.
    ///
    /// Events arrive in the order the state changed. An event may be delivered on another
    /// thread than the one whose operation produced it, after that operation has returned.
    pub fn register_listener(&self, listener: Arc<dyn PushStateListener>) -> ListenerHandle {
        self.notifier.subscribe(listener)
    }

    /// Returns false if the listener was not registered.
    pub fn unregister_listener(&self, handle: ListenerHandle) -> bool {
        self.notifier.unsubscribe(handle)
    }

    pub fn is_registered(&self) -> bool {
        self.state.lock().is_registered()
    }

    /// The last enabled state confirmed with the endpoint service.
    pub fn is_enabled(&self) -> bool {
        self.state.lock().push_enabled
    }

    /// The enabled state last asked for.
    pub fn should_enable_push(&self) -> bool {
        self.state.lock().should_enable_push
    }

    /// The endpoint id, empty when not registered.
    pub fn endpoint_id(&self) -> String {
        self.state.lock().endpoint_id.clone()
    }

    pub fn record(&self) -> EndpointRecord {
        self.state.lock().clone()
    }

    /// Interrupt every operation that is queued or in flight. Operations started afterwards
    /// are unaffected.
    pub fn interrupt(&self) {
        info!("interrupting push registration operations");
        self.interrupter.interrupt();
    }

    /// The caller identity, or `None` when no credential provider was attached.
    #[handle_error(Error)]
    pub fn identity(&self) -> ApiResult<Option<String>> {
        match &self.identity {
            Some(identity) => Ok(Some(identity.identity()?)),
            None => Ok(None),
        }
    }

    /// Whether the access credentials have expired, or `None` when no credential provider
    /// was attached.
    pub fn credentials_expired(&self) -> Option<bool> {
        self.identity
            .as_ref()
            .map(|identity| identity.credentials_expired(Timestamp::now()))
    }

    pub(crate) fn interrupt_scope(&self) -> InterruptScope {
        self.interrupter.scope()
    }

    #[handle_error(Error)]
    pub(crate) fn on_token_refreshed_scoped(
        &self,
        token: &str,
        did_change: bool,
        scope: &InterruptScope,
    ) -> ApiResult<RegistrationOutcome> {
        self.run(|internal| internal.on_token_refreshed(token, did_change, scope))
    }

    #[handle_error(Error)]
    pub(crate) fn register_device_scoped(
        &self,
        source: &dyn TokenSource,
        scope: &InterruptScope,
    ) -> ApiResult<RegistrationOutcome> {
        self.run(|internal| internal.register_device(source, scope))
    }

    #[handle_error(Error)]
    pub(crate) fn set_desired_enabled_scoped(
        &self,
        enabled: bool,
        scope: &InterruptScope,
    ) -> ApiResult<()> {
        self.run(|internal| internal.set_desired_enabled(enabled, scope))
    }

    #[handle_error(Error)]
    pub(crate) fn publish_scoped(
        &self,
        subject: &str,
        message: &str,
        target_id: &str,
        scope: &InterruptScope,
    ) -> ApiResult<()> {
        self.publisher.publish(subject, message, target_id, scope)
    }

    #[handle_error(Error)]
    pub(crate) fn publish_to_all_scoped(
        &self,
        subject: &str,
        message: &str,
        targets: &[String],
        scope: &InterruptScope,
    ) -> ApiResult<Vec<PublishOutcome>> {
        let outcomes = self
            .publisher
            .publish_to_all(subject, message, targets, scope)?;
        Ok(outcomes
            .into_iter()
            .map(|(target_id, result)| PublishOutcome {
                target_id,
                result: result.map_err(convert_log_error),
            })
            .collect())
    }

    // Runs `f` under the lock and refreshes the state copy before releasing it. Any state
    // change is queued under the lock too, so events keep the order of the operations, and
    // delivered once it is released so listeners are free to call back into the manager.
    fn run<T>(&self, f: impl FnOnce(&mut InternalManager) -> T) -> T {
        let result = {
            let mut internal = self.internal.lock();
            let result = f(&mut *internal);
            *self.state.lock() = internal.record().clone();
            if let Some(event) = internal.take_state_change() {
                self.notifier.enqueue(event);
            }
            result
        };
        self.notifier.flush();
        result
    }
}

impl TokenUpdateObserver for PushRegistrationManager {
    fn on_token_update(&self, token: &str, did_change: bool) {
        if let Err(e) = self.on_token_refreshed(token, did_change) {
            error!("failed to record push registration: {}", e);
        }
    }

    fn on_token_update_failed(&self, reason: &str) {
        self.on_token_refresh_failed(reason);
    }
}
