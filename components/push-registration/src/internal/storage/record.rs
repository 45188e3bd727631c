/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::error::{info, Result};

use super::db::{
    Storage, ENDPOINT_ID_KEY, PLATFORM_APPLICATION_ID_KEY, PUSH_ENABLED_KEY,
    SHOULD_ENABLE_PUSH_KEY,
};

/// The persisted registration state of this device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointRecord {
    /// The platform application this build registers with.
    pub platform_application_id: String,

    /// Handle returned by the endpoint service; empty means "not registered".
    pub endpoint_id: String,

    /// Last enabled state confirmed with the endpoint service.
    pub push_enabled: bool,

    /// Enabled state the caller asked for.
    pub should_enable_push: bool,

    /// The platform application the stored values were written for, if any.
    pub last_known_platform_application_id: Option<String>,
}

impl EndpointRecord {
    /// The state of a fresh install: unregistered, with push wanted.
    pub fn new(platform_application_id: &str) -> Self {
        Self {
            platform_application_id: platform_application_id.to_owned(),
            endpoint_id: String::new(),
            push_enabled: false,
            should_enable_push: true,
            last_known_platform_application_id: None,
        }
    }

    /// Load the record for `platform_application_id`, discarding everything
    /// stored if it was written for another platform application.
    pub fn load<S: Storage>(store: &S, platform_application_id: &str) -> Result<Self> {
        let previous = store.get_meta(PLATFORM_APPLICATION_ID_KEY)?;
        if previous.as_deref() != Some(platform_application_id) {
            info!(
                "platform application changed or not set ({:?} -> '{}'), discarding stored registration",
                previous, platform_application_id
            );
            store.clear()?;
            return Ok(Self::new(platform_application_id));
        }
        let push_enabled = store.get_bool(PUSH_ENABLED_KEY)?.unwrap_or(false);
        Ok(Self {
            platform_application_id: platform_application_id.to_owned(),
            endpoint_id: store.get_meta(ENDPOINT_ID_KEY)?.unwrap_or_default(),
            push_enabled,
            // The last confirmed state is what we want after a restart.
            should_enable_push: push_enabled,
            last_known_platform_application_id: previous,
        })
    }

    pub fn is_registered(&self) -> bool {
        !self.endpoint_id.is_empty()
    }

    /// Persist everything a registration attempt touches.
    pub fn persist_registration<S: Storage>(&mut self, store: &S) -> Result<()> {
        store.put_all(&[
            (
                PLATFORM_APPLICATION_ID_KEY,
                self.platform_application_id.clone(),
            ),
            (ENDPOINT_ID_KEY, self.endpoint_id.clone()),
            (PUSH_ENABLED_KEY, self.push_enabled.to_string()),
            (SHOULD_ENABLE_PUSH_KEY, self.should_enable_push.to_string()),
        ])?;
        self.last_known_platform_application_id = Some(self.platform_application_id.clone());
        Ok(())
    }

    /// Persist the desired state. The confirmed flag is only written when
    /// `confirmed` is true, so a failed remote update leaves it untouched.
    pub fn persist_desired<S: Storage>(&mut self, store: &S, confirmed: bool) -> Result<()> {
        let mut values = vec![
            (SHOULD_ENABLE_PUSH_KEY, self.should_enable_push.to_string()),
            (
                PLATFORM_APPLICATION_ID_KEY,
                self.platform_application_id.clone(),
            ),
        ];
        if confirmed {
            values.push((PUSH_ENABLED_KEY, self.push_enabled.to_string()));
        }
        store.put_all(&values)?;
        self.last_known_platform_application_id = Some(self.platform_application_id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::internal::storage::Store;

    const APP: &str = "arn:test:app/GCM/first";
    const OTHER_APP: &str = "arn:test:app/GCM/second";

    fn get_db() -> Result<Store> {
        crate::error::init_for_tests();
        Store::open_in_memory()
    }

    #[test]
    fn fresh_install_defaults() -> Result<()> {
        let db = get_db()?;
        let record = EndpointRecord::load(&db, APP)?;
        assert_eq!(record, EndpointRecord::new(APP));
        assert!(!record.is_registered());
        assert!(!record.push_enabled);
        assert!(record.should_enable_push);
        Ok(())
    }

    #[test]
    fn round_trip_through_store() -> Result<()> {
        let db = get_db()?;
        let mut record = EndpointRecord::new(APP);
        record.endpoint_id = "e1".to_string();
        record.push_enabled = true;
        record.persist_registration(&db)?;
        assert_eq!(
            record.last_known_platform_application_id.as_deref(),
            Some(APP)
        );

        let loaded = EndpointRecord::load(&db, APP)?;
        assert_eq!(loaded.endpoint_id, "e1");
        assert!(loaded.push_enabled);
        assert!(loaded.should_enable_push);
        assert!(loaded.is_registered());
        Ok(())
    }

    #[test]
    fn desired_state_comes_from_confirmed_state() -> Result<()> {
        let db = get_db()?;
        let mut record = EndpointRecord::new(APP);
        record.endpoint_id = "e1".to_string();
        record.push_enabled = false;
        record.should_enable_push = true;
        record.persist_registration(&db)?;
        assert_eq!(db.get_bool(SHOULD_ENABLE_PUSH_KEY)?, Some(true));

        let loaded = EndpointRecord::load(&db, APP)?;
        assert!(!loaded.push_enabled);
        assert!(!loaded.should_enable_push);
        Ok(())
    }

    #[test]
    fn changed_platform_application_discards_state() -> Result<()> {
        let db = get_db()?;
        let mut record = EndpointRecord::new(APP);
        record.endpoint_id = "e1".to_string();
        record.push_enabled = true;
        record.should_enable_push = false;
        record.persist_registration(&db)?;
        db.set_last_token("tok1")?;

        let loaded = EndpointRecord::load(&db, OTHER_APP)?;
        assert_eq!(loaded, EndpointRecord::new(OTHER_APP));
        // everything stored was dropped, not just the record.
        assert_eq!(db.get_meta(ENDPOINT_ID_KEY)?, None);
        assert_eq!(db.get_last_token()?, None);
        Ok(())
    }

    #[test]
    fn persist_desired_only_writes_confirmed_on_success() -> Result<()> {
        let db = get_db()?;
        let mut record = EndpointRecord::new(APP);
        record.endpoint_id = "e1".to_string();
        record.push_enabled = true;
        record.persist_registration(&db)?;

        record.should_enable_push = false;
        record.push_enabled = false;
        record.persist_desired(&db, false)?;
        assert_eq!(db.get_bool(SHOULD_ENABLE_PUSH_KEY)?, Some(false));
        assert_eq!(db.get_bool(PUSH_ENABLED_KEY)?, Some(true));

        record.persist_desired(&db, true)?;
        assert_eq!(db.get_bool(PUSH_ENABLED_KEY)?, Some(false));
        Ok(())
    }
}
