//! SQLite-backed license store.

use super::{sort_newest_first, LicenseStore, Mutator};
use crate::error::{LicenseError, LicenseResult};
use crate::hasher::short;
use crate::record::{LicenseId, LicenseRecord};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error};

const SELECT_COLUMNS: &str = "SELECT id, token_digest, description, bound_hwid, created_at, used, active, expires_at, activated_at FROM licenses";

/// Persistent license store backed by SQLite.
pub struct SqliteLicenseStore {
    conn: Mutex<Connection>,
}

impl SqliteLicenseStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path, busy_timeout: Duration) -> LicenseResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            error!("failed to open license database {}: {e}", path.display());
            LicenseError::StoreUnavailable(format!("failed to open license database: {e}"))
        })?;
        conn.busy_timeout(busy_timeout)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("opened sqlite license store at {}", path.display());
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> LicenseResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> LicenseResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LicenseError::StoreUnavailable("license database lock poisoned".into()))
    }

    fn init_schema(&self) -> LicenseResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS licenses (
                id TEXT PRIMARY KEY,
                token_digest TEXT NOT NULL UNIQUE,
                description TEXT,
                bound_hwid TEXT,
                created_at TEXT NOT NULL,
                used INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                expires_at TEXT,
                activated_at TEXT
            );
            ",
        )
        .map_err(|e| LicenseError::StoreUnavailable(format!("failed to init license schema: {e}")))?;
        Ok(())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<LicenseRecord> {
    let id_str: String = row.get(0)?;
    let id = LicenseId::parse(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    Ok(LicenseRecord {
        id,
        token_digest: row.get(1)?,
        description: row.get(2)?,
        bound_hwid: row.get(3)?,
        created_at: row.get(4)?,
        used: row.get(5)?,
        active: row.get(6)?,
        expires_at: row.get(7)?,
        activated_at: row.get(8)?,
    })
}

fn select_by_id(conn: &Connection, id: LicenseId) -> LicenseResult<LicenseRecord> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id.to_string()],
        row_to_record,
    )
    .optional()?
    .ok_or_else(|| LicenseError::NotFound(id.to_string()))
}

impl LicenseStore for SqliteLicenseStore {
    fn create(&self, record: LicenseRecord) -> LicenseResult<LicenseId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO licenses (id, token_digest, description, bound_hwid, created_at, used, active, expires_at, activated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id.to_string(),
                record.token_digest,
                record.description,
                record.bound_hwid,
                record.created_at,
                record.used,
                record.active,
                record.expires_at,
                record.activated_at,
            ],
        )?;
        debug!("inserted license {} ({})", record.id, short(&record.token_digest));
        Ok(record.id)
    }

    fn get_by_digest(&self, digest: &str) -> LicenseResult<LicenseRecord> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE token_digest = ?1"),
            params![digest],
            row_to_record,
        )
        .optional()?
        .ok_or_else(|| LicenseError::NotFound(short(digest).to_string()))
    }

    fn get(&self, id: LicenseId) -> LicenseResult<LicenseRecord> {
        let conn = self.lock()?;
        select_by_id(&conn, id)
    }

    fn update(&self, id: LicenseId, mutator: Mutator<'_>) -> LicenseResult<LicenseRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut record = select_by_id(&tx, id)?;
        if mutator(&mut record) {
            tx.execute(
                "UPDATE licenses SET description = ?2, bound_hwid = ?3, used = ?4, active = ?5, expires_at = ?6, activated_at = ?7 WHERE id = ?1",
                params![
                    id.to_string(),
                    record.description,
                    record.bound_hwid,
                    record.used,
                    record.active,
                    record.expires_at,
                    record.activated_at,
                ],
            )?;
            tx.commit()?;
        }
        Ok(record)
    }

    fn delete(&self, id: LicenseId) -> LicenseResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM licenses WHERE id = ?1", params![id.to_string()])?;
        if removed == 0 {
            return Err(LicenseError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_all(&self) -> LicenseResult<Vec<LicenseRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_COLUMNS)?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        sort_newest_first(&mut records);
        Ok(records)
    }
}
