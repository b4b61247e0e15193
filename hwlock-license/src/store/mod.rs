//! Persistent license storage.
//!
//! The store is the only component that touches the storage medium. Two
//! backings are provided:
//!
//! - [`SqliteLicenseStore`]: a single `licenses` table, updates run inside an
//!   immediate transaction.
//! - [`JsonFileLicenseStore`]: records held in memory behind per-record locks
//!   and written through to a JSON file on every mutation.

mod json;
mod sqlite;

pub use json::JsonFileLicenseStore;
pub use sqlite::SqliteLicenseStore;

use crate::error::LicenseResult;
use crate::record::{LicenseId, LicenseRecord};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on how long a SQLite call waits for a competing writer.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Conditional mutation applied by [`LicenseStore::update`].
///
/// The closure receives the current record and returns `true` if it changed
/// it and the change must be persisted. Returning `false` leaves the stored
/// record untouched.
pub type Mutator<'a> = &'a mut dyn FnMut(&mut LicenseRecord) -> bool;

/// Storage contract for license records.
///
/// Implementations must serialize `update` calls on the same record so that
/// the mutator always sees the latest committed state.
pub trait LicenseStore: Send + Sync {
    /// Inserts a new record and returns its id.
    ///
    /// Fails with `DuplicateToken` if the digest is already present.
    fn create(&self, record: LicenseRecord) -> LicenseResult<LicenseId>;

    /// Looks a record up by token digest.
    fn get_by_digest(&self, digest: &str) -> LicenseResult<LicenseRecord>;

    /// Looks a record up by id.
    fn get(&self, id: LicenseId) -> LicenseResult<LicenseRecord>;

    /// Applies `mutator` atomically and returns the resulting record.
    fn update(&self, id: LicenseId, mutator: Mutator<'_>) -> LicenseResult<LicenseRecord>;

    /// Deletes a record permanently.
    fn delete(&self, id: LicenseId) -> LicenseResult<()>;

    /// Returns every record, newest first.
    fn list_all(&self) -> LicenseResult<Vec<LicenseRecord>>;
}

/// Which backing to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// SQLite database file.
    Sqlite {
        /// Database path.
        path: PathBuf,
        /// Wait bound for locked databases.
        busy_timeout: Duration,
    },
    /// JSON file with write-through persistence.
    JsonFile {
        /// File path.
        path: PathBuf,
    },
    /// Volatile in-memory store.
    Memory,
}

/// Opens the configured backing.
pub fn open_store(config: &StoreConfig) -> LicenseResult<Arc<dyn LicenseStore>> {
    let store: Arc<dyn LicenseStore> = match config {
        StoreConfig::Sqlite { path, busy_timeout } => {
            Arc::new(SqliteLicenseStore::open(path, *busy_timeout)?)
        }
        StoreConfig::JsonFile { path } => Arc::new(JsonFileLicenseStore::open(path)?),
        StoreConfig::Memory => Arc::new(JsonFileLicenseStore::in_memory()),
    };
    Ok(store)
}

/// Newest first; ids break ties so the order is stable.
pub(crate) fn sort_newest_first(records: &mut [LicenseRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
