/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
use rusqlite::Connection;

use crate::error::{warn, Result};

pub const END_VERSION: u32 = 1;

const CREATE_TABLE_META_SQL: &str = "
    CREATE TABLE IF NOT EXISTS meta_data (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    ) WITHOUT ROWID;
";

// We have a single key-value table and no foreign keys, temp tables or
// SQL functions, so there are no pragmas worth setting.
pub fn init(db: &Connection) -> Result<()> {
    let version: u32 = db.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => {
            db.execute_batch(CREATE_TABLE_META_SQL)?;
            db.execute_batch(&format!("PRAGMA user_version = {}", END_VERSION))?;
        }
        END_VERSION => (),
        other => {
            warn!(
                "Loaded future schema version {} (we only understand version {}). \
                Optimistically continuing",
                other, END_VERSION
            );
            // The table might not exist if the future schema renamed it.
            db.execute_batch(CREATE_TABLE_META_SQL)?;
        }
    }
    Ok(())
}
