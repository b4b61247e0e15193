//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use hwlock_license::{
    EngineConfig, Expiry, IssuedLicense, JsonFileLicenseStore, LicenseEngine, LicenseStore,
    SqliteLicenseStore,
};
use std::sync::Arc;
use tempfile::TempDir;

/// A store under test plus whatever keeps its backing alive.
pub struct Backend {
    pub name: &'static str,
    pub store: Arc<dyn LicenseStore>,
    _dir: Option<TempDir>,
}

/// Every backing, each on fresh storage.
pub fn backends() -> Vec<Backend> {
    let json_dir = TempDir::new().unwrap();
    let json_store =
        JsonFileLicenseStore::open(&json_dir.path().join("licenses.json")).unwrap();

    let sqlite_dir = TempDir::new().unwrap();
    let sqlite_store = SqliteLicenseStore::open(
        &sqlite_dir.path().join("licenses.db"),
        std::time::Duration::from_secs(5),
    )
    .unwrap();

    vec![
        Backend {
            name: "memory",
            store: Arc::new(JsonFileLicenseStore::in_memory()),
            _dir: None,
        },
        Backend {
            name: "json",
            store: Arc::new(json_store),
            _dir: Some(json_dir),
        },
        Backend {
            name: "sqlite",
            store: Arc::new(sqlite_store),
            _dir: Some(sqlite_dir),
        },
    ]
}

impl Backend {
    pub fn engine(&self) -> LicenseEngine {
        LicenseEngine::new(self.store.clone(), EngineConfig::default())
    }
}

/// An engine over a volatile store.
pub fn memory_engine() -> LicenseEngine {
    LicenseEngine::new(
        Arc::new(JsonFileLicenseStore::in_memory()),
        EngineConfig::default(),
    )
}

/// Issues a 30-day license.
pub fn issue_30_days(engine: &LicenseEngine) -> IssuedLicense {
    engine.issue(Expiry::Days(30), None).unwrap()
}

/// Issues a license that expired yesterday.
pub fn issue_expired(engine: &LicenseEngine) -> IssuedLicense {
    engine
        .issue(Expiry::At(Utc::now() - Duration::days(1)), None)
        .unwrap()
}
