/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Caller identity and the lifetime of its access credentials.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::error::{debug, Result};

// Typesafe way to manage timestamps, milliseconds since the epoch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        SystemTime::now().into()
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn checked_add(self, d: Duration) -> Option<Timestamp> {
        u64::try_from(d.as_millis())
            .ok()
            .and_then(|ms| self.0.checked_add(ms))
            .map(Timestamp)
    }
}

impl From<SystemTime> for Timestamp {
    #[inline]
    fn from(st: SystemTime) -> Self {
        // Clocks before the epoch are clamped rather than panicking.
        let d = st.duration_since(UNIX_EPOCH).unwrap_or_default();
        Timestamp(d.as_secs() * 1000 + u64::from(d.subsec_millis()))
    }
}

impl From<u64> for Timestamp {
    #[inline]
    fn from(ts: u64) -> Self {
        Timestamp(ts)
    }
}

/// Supplies the caller identity and time-limited credentials used to reach
/// the endpoint service.
pub trait CredentialProvider: Send + Sync {
    fn identity(&self) -> Result<String>;

    /// When the current credentials expire, if there are any.
    fn credentials_expiration(&self) -> Option<Timestamp>;
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Box<T> {
    fn identity(&self) -> Result<String> {
        (**self).identity()
    }

    fn credentials_expiration(&self) -> Option<Timestamp> {
        (**self).credentials_expiration()
    }
}

/// Caches the identity handed out by a [`CredentialProvider`].
pub struct IdentityManager<P> {
    provider: P,
    cached_identity: Mutex<Option<String>>,
}

impl<P: CredentialProvider> IdentityManager<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cached_identity: Mutex::new(None),
        }
    }

    /// The identity, fetched from the provider the first time only.
    pub fn identity(&self) -> Result<String> {
        let mut cached = self.cached_identity.lock();
        if let Some(identity) = cached.as_ref() {
            return Ok(identity.clone());
        }
        let identity = self.provider.identity()?;
        debug!("fetched identity '{}'", identity);
        *cached = Some(identity.clone());
        Ok(identity)
    }

    pub fn cached_identity(&self) -> Option<String> {
        self.cached_identity.lock().clone()
    }

    /// Missing credentials count as expired.
    pub fn credentials_expired(&self, now: Timestamp) -> bool {
        let expired = match self.provider.credentials_expiration() {
            Some(expiration) => expiration < now,
            None => true,
        };
        debug!(
            "Credentials are {}",
            if expired { "EXPIRED" } else { "OK" }
        );
        expired
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        calls: AtomicUsize,
        expiration: Option<Timestamp>,
        fail: bool,
    }

    impl CredentialProvider for FakeProvider {
        fn identity(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::RemoteService("identity pool unavailable".into()))
            } else {
                Ok("us-east-1:0000-1111".to_string())
            }
        }

        fn credentials_expiration(&self) -> Option<Timestamp> {
            self.expiration
        }
    }

    fn provider(expiration: Option<Timestamp>, fail: bool) -> FakeProvider {
        FakeProvider {
            calls: AtomicUsize::new(0),
            expiration,
            fail,
        }
    }

    #[test]
    fn identity_is_cached() -> Result<()> {
        crate::error::init_for_tests();
        let manager = IdentityManager::new(provider(None, false));
        assert_eq!(manager.cached_identity(), None);
        assert_eq!(manager.identity()?, "us-east-1:0000-1111");
        assert_eq!(manager.identity()?, "us-east-1:0000-1111");
        assert_eq!(manager.provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            manager.cached_identity().as_deref(),
            Some("us-east-1:0000-1111")
        );
        Ok(())
    }

    #[test]
    fn identity_failure_is_not_cached() {
        crate::error::init_for_tests();
        let manager = IdentityManager::new(provider(None, true));
        assert!(manager.identity().is_err());
        assert!(manager.identity().is_err());
        assert_eq!(manager.provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.cached_identity(), None);
    }

    #[test]
    fn expiration() {
        crate::error::init_for_tests();
        let now = Timestamp(1_000_000);
        assert!(IdentityManager::new(provider(None, false)).credentials_expired(now));
        assert!(IdentityManager::new(provider(Some(Timestamp(999_999)), false))
            .credentials_expired(now));
        let later = now.checked_add(Duration::from_secs(60));
        assert_eq!(later, Some(Timestamp(1_060_000)));
        assert!(!IdentityManager::new(provider(later, false)).credentials_expired(now));
    }
}
