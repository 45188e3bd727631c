/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use push_registration::{
    EndpointService, Error, PushRegistrationManager, RegistrationConfiguration, Result,
    TokenSource,
};

pub const APP: &str = "arn:aws:sns:us-east-1:000000000000:app/GCM/push-registration";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct ServiceState {
    pub fail_create: bool,
    pub fail_attribute: bool,
    pub fail_publish_to: Vec<String>,
    pub created: Vec<(String, String)>,
    pub attributes: Vec<(String, String, String)>,
    pub published: Vec<(String, String, String)>,
}

/// An endpoint service that keeps everything in memory. Clones share state, so a test can
/// hand one to the manager and inspect the other.
#[derive(Clone, Default)]
pub struct FakeService {
    pub state: Arc<Mutex<ServiceState>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.state.lock().fail_create = fail;
    }

    pub fn set_fail_attribute(&self, fail: bool) {
        self.state.lock().fail_attribute = fail;
    }

    pub fn created(&self) -> Vec<(String, String)> {
        self.state.lock().created.clone()
    }

    /// The values written to the `Enabled` attribute, oldest first.
    pub fn enabled_values(&self) -> Vec<String> {
        self.state
            .lock()
            .attributes
            .iter()
            .map(|(_, _, value)| value.clone())
            .collect()
    }

    pub fn published(&self) -> Vec<(String, String, String)> {
        self.state.lock().published.clone()
    }
}

impl EndpointService for FakeService {
    fn create_endpoint(
        &self,
        platform_application_id: &str,
        token: &str,
        _timeout: Duration,
    ) -> Result<String> {
        let mut state = self.state.lock();
        if state.fail_create {
            return Err(Error::RemoteService("endpoint service unreachable".into()));
        }
        state
            .created
            .push((platform_application_id.to_owned(), token.to_owned()));
        Ok(format!("{}/endpoint-{}", platform_application_id, token))
    }

    fn set_endpoint_attribute(
        &self,
        endpoint_id: &str,
        name: &str,
        value: &str,
        _timeout: Duration,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_attribute {
            return Err(Error::RemoteService("attribute update rejected".into()));
        }
        state
            .attributes
            .push((endpoint_id.to_owned(), name.to_owned(), value.to_owned()));
        Ok(())
    }

    fn publish(
        &self,
        target_id: &str,
        subject: &str,
        message: &str,
        _timeout: Duration,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_publish_to.iter().any(|t| t == target_id) {
            return Err(Error::RemoteService(format!("no such target {}", target_id)));
        }
        state
            .published
            .push((target_id.to_owned(), subject.to_owned(), message.to_owned()));
        Ok(())
    }
}

pub struct FixedToken(pub Option<&'static str>);

impl TokenSource for FixedToken {
    fn current_token(&self) -> Result<String> {
        self.0
            .map(str::to_owned)
            .ok_or_else(|| Error::Token("play services unavailable".into()))
    }
}

pub struct Profile {
    pub dir: tempfile::TempDir,
}

impl Profile {
    pub fn new() -> Self {
        init_logging();
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("push_registration.db")
    }

    pub fn config(&self, platform_application_id: &str) -> RegistrationConfiguration {
        RegistrationConfiguration::new(platform_application_id, self.db_path().to_str().unwrap())
    }

    pub fn open(&self, service: &FakeService) -> PushRegistrationManager {
        self.open_with(self.config(APP), service)
    }

    pub fn open_with(
        &self,
        config: RegistrationConfiguration,
        service: &FakeService,
    ) -> PushRegistrationManager {
        PushRegistrationManager::new(config, Box::new(service.clone())).unwrap()
    }
}
