/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{debug, warn, Error, Result};

use super::schema;

pub const PLATFORM_APPLICATION_ID_KEY: &str = "platform_application_id";
pub const ENDPOINT_ID_KEY: &str = "endpoint_id";
pub const PUSH_ENABLED_KEY: &str = "push_enabled";
pub const SHOULD_ENABLE_PUSH_KEY: &str = "should_enable_push";
pub const LAST_TOKEN_KEY: &str = "last_token";

pub trait Storage: Sized {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;

    fn get_meta(&self, key: &str) -> Result<Option<String>>;
    fn set_meta(&self, key: &str, value: &str) -> Result<()>;

    /// Writes every pair in a single commit.
    fn put_all(&self, values: &[(&str, String)]) -> Result<()>;

    /// Forgets everything.
    fn clear(&self) -> Result<()>;

    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(match self.get_meta(key)?.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                warn!("ignoring unexpected value {:?} for '{}'", other, key);
                None
            }
            None => None,
        })
    }

    // The messaging token gets a special helper, everything else goes
    // through the record.
    fn get_last_token(&self) -> Result<Option<String>> {
        self.get_meta(LAST_TOKEN_KEY)
    }

    fn set_last_token(&self, token: &str) -> Result<()> {
        self.set_meta(LAST_TOKEN_KEY, token)
    }
}

pub struct RegistrationDb {
    pub db: Connection,
}

impl RegistrationDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // By default, file open errors are StorageSqlErrors and aren't super helpful.
        // Instead, remap to StorageError and provide the path to the file that couldn't be opened.
        let db = Connection::open(path).map_err(|orig| {
            Error::Storage(format!(
                "Could not open database file {:?} - {}",
                &path.as_os_str(),
                orig,
            ))
        })?;
        schema::init(&db)?;
        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        schema::init(&db)?;
        Ok(Self { db })
    }
}

impl Storage for RegistrationDb {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        RegistrationDb::open(path)
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .db
            .query_row(
                "SELECT value FROM meta_data WHERE key = :key LIMIT 1",
                &[(":key", &key)],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let query = "INSERT OR REPLACE INTO meta_data (key, value) VALUES (:k, :v)";
        self.db
            .prepare_cached(query)?
            .execute(&[(":k", &key), (":v", &value)])?;
        Ok(())
    }

    fn put_all(&self, values: &[(&str, String)]) -> Result<()> {
        debug!(
            "persisting {:?}",
            values.iter().map(|(k, _)| *k).collect::<Vec<_>>()
        );
        let tx = self.db.unchecked_transaction()?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT OR REPLACE INTO meta_data (key, value) VALUES (:k, :v)")?;
            for (key, value) in values {
                stmt.execute(&[(":k", key), (":v", &value.as_str())])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        debug!("clearing all persisted registration state");
        self.db.execute("DELETE FROM meta_data", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn get_db() -> Result<RegistrationDb> {
        crate::error::init_for_tests();
        // NOTE: In Memory tests can sometimes produce false positives. Use the following
        // for debugging
        // RegistrationDb::open("/tmp/push_registration.sqlite");
        RegistrationDb::open_in_memory()
    }

    #[test]
    fn meta() -> Result<()> {
        let db = get_db()?;
        assert_eq!(db.get_meta(ENDPOINT_ID_KEY)?, None);
        db.set_meta("fruit", "apple")?;
        db.set_meta("fruit", "banana")?;
        assert_eq!(db.get_meta("fruit")?, Some("banana".to_owned()));
        Ok(())
    }

    #[test]
    fn put_all_and_clear() -> Result<()> {
        let db = get_db()?;
        db.put_all(&[
            (ENDPOINT_ID_KEY, "ep-1".to_string()),
            (PUSH_ENABLED_KEY, "true".to_string()),
            (SHOULD_ENABLE_PUSH_KEY, "false".to_string()),
        ])?;
        assert_eq!(db.get_meta(ENDPOINT_ID_KEY)?, Some("ep-1".to_string()));
        assert_eq!(db.get_bool(PUSH_ENABLED_KEY)?, Some(true));
        assert_eq!(db.get_bool(SHOULD_ENABLE_PUSH_KEY)?, Some(false));

        db.put_all(&[(ENDPOINT_ID_KEY, "ep-2".to_string())])?;
        assert_eq!(db.get_meta(ENDPOINT_ID_KEY)?, Some("ep-2".to_string()));
        // untouched keys survive a partial write.
        assert_eq!(db.get_bool(PUSH_ENABLED_KEY)?, Some(true));

        db.clear()?;
        assert_eq!(db.get_meta(ENDPOINT_ID_KEY)?, None);
        assert_eq!(db.get_bool(PUSH_ENABLED_KEY)?, None);
        Ok(())
    }

    #[test]
    fn bool_parsing() -> Result<()> {
        let db = get_db()?;
        db.set_meta(PUSH_ENABLED_KEY, "yes please")?;
        assert_eq!(db.get_bool(PUSH_ENABLED_KEY)?, None);
        Ok(())
    }

    #[test]
    fn last_token() -> Result<()> {
        let db = get_db()?;
        assert_eq!(db.get_last_token()?, None);
        db.set_last_token("tok1")?;
        assert_eq!(db.get_last_token()?, Some("tok1".to_string()));
        Ok(())
    }

    #[test]
    fn survives_reopen() -> Result<()> {
        crate::error::init_for_tests();
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("push_registration.db");
        {
            let db = RegistrationDb::open(&path)?;
            db.put_all(&[(ENDPOINT_ID_KEY, "ep-1".to_string())])?;
        }
        let db = RegistrationDb::open(&path)?;
        assert_eq!(db.get_meta(ENDPOINT_ID_KEY)?, Some("ep-1".to_string()));
        Ok(())
    }

    #[test]
    fn open_bad_path() {
        crate::error::init_for_tests();
        let tempdir = tempfile::tempdir().unwrap();
        // the parent directory does not exist.
        let err = RegistrationDb::open(tempdir.path().join("missing").join("x.db"))
            .err()
            .expect("should fail");
        assert!(matches!(err, Error::Storage(_)));
    }
}
