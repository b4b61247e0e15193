mod common;

use chrono::{Duration, Utc};
use common::backends;
use hwlock_license::{
    digest, open_store, JsonFileLicenseStore, LicenseError, LicenseId, LicenseRecord,
    LicenseStore, SqliteLicenseStore, StoreConfig,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn record(token: &str) -> LicenseRecord {
    let now = Utc::now();
    LicenseRecord::new(digest(token), None, now, Some(now + Duration::days(30)))
}

// ── Conformance across backings ──────────────────────────────────

#[test]
fn create_then_get_by_digest() {
    for backend in backends() {
        let rec = record("LIC_ONE");
        let id = backend.store.create(rec.clone()).unwrap();
        let fetched = backend.store.get_by_digest(&digest("LIC_ONE")).unwrap();
        assert_eq!(fetched.id, id, "{}", backend.name);
        assert_eq!(fetched.token_digest, rec.token_digest, "{}", backend.name);
        assert!(!fetched.used);
        assert!(fetched.active);
        assert_eq!(backend.store.get(id).unwrap().token_digest, rec.token_digest);
    }
}

#[test]
fn duplicate_digest_rejected() {
    for backend in backends() {
        backend.store.create(record("LIC_DUP")).unwrap();
        let err = backend.store.create(record("LIC_DUP")).unwrap_err();
        assert!(matches!(err, LicenseError::DuplicateToken), "{}: {err}", backend.name);
        assert_eq!(backend.store.list_all().unwrap().len(), 1);
    }
}

#[test]
fn unknown_digest_is_not_found() {
    for backend in backends() {
        let err = backend.store.get_by_digest(&digest("nope")).unwrap_err();
        assert!(matches!(err, LicenseError::NotFound(_)), "{}", backend.name);
        let err = backend.store.get(LicenseId::new()).unwrap_err();
        assert!(matches!(err, LicenseError::NotFound(_)), "{}", backend.name);
    }
}

#[test]
fn non_hex_digest_lookup_is_not_found() {
    for backend in backends() {
        let err = backend.store.get_by_digest("aéééééééé").unwrap_err();
        assert!(matches!(err, LicenseError::NotFound(_)), "{}", backend.name);
        let err = backend.store.get_by_digest("").unwrap_err();
        assert!(matches!(err, LicenseError::NotFound(_)), "{}", backend.name);
    }
}

#[test]
fn update_applies_and_persists_changes() {
    for backend in backends() {
        let id = backend.store.create(record("LIC_UPD")).unwrap();
        let now = Utc::now();
        let updated = backend
            .store
            .update(id, &mut |r: &mut LicenseRecord| {
                r.bind("HWID-1", now);
                true
            })
            .unwrap();
        assert!(updated.used);
        assert_eq!(updated.bound_hwid.as_deref(), Some("HWID-1"));

        let fetched = backend.store.get(id).unwrap();
        assert_eq!(fetched.bound_hwid.as_deref(), Some("HWID-1"), "{}", backend.name);
        assert!(fetched.activated_at.is_some());
    }
}

#[test]
fn update_returning_false_leaves_record() {
    for backend in backends() {
        let id = backend.store.create(record("LIC_NOOP")).unwrap();
        let before = backend.store.get(id).unwrap();
        let returned = backend
            .store
            .update(id, &mut |r: &mut LicenseRecord| {
                r.active = false;
                false
            })
            .unwrap();
        assert!(!returned.active);
        assert_eq!(backend.store.get(id).unwrap(), before, "{}", backend.name);
    }
}

#[test]
fn update_unknown_id_is_not_found() {
    for backend in backends() {
        let err = backend
            .store
            .update(LicenseId::new(), &mut |_: &mut LicenseRecord| true)
            .unwrap_err();
        assert!(matches!(err, LicenseError::NotFound(_)), "{}", backend.name);
    }
}

#[test]
fn delete_removes_record_and_digest() {
    for backend in backends() {
        let id = backend.store.create(record("LIC_DEL")).unwrap();
        backend.store.delete(id).unwrap();
        assert!(backend.store.get_by_digest(&digest("LIC_DEL")).is_err());
        assert!(matches!(
            backend.store.delete(id).unwrap_err(),
            LicenseError::NotFound(_)
        ));
        // The digest is free again.
        backend.store.create(record("LIC_DEL")).unwrap();
    }
}

#[test]
fn list_all_is_newest_first() {
    for backend in backends() {
        let base = Utc::now();
        for (i, token) in ["LIC_A", "LIC_B", "LIC_C"].iter().enumerate() {
            let mut rec = record(token);
            rec.created_at = base + Duration::seconds(i as i64);
            backend.store.create(rec).unwrap();
        }
        let listed: Vec<String> = backend
            .store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.token_digest)
            .collect();
        assert_eq!(
            listed,
            vec![digest("LIC_C"), digest("LIC_B"), digest("LIC_A")],
            "{}",
            backend.name
        );
    }
}

// ── JSON file persistence ────────────────────────────────────────

#[test]
fn json_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("licenses.json");
    let id = {
        let store = JsonFileLicenseStore::open(&path).unwrap();
        let id = store.create(record("LIC_PERSIST")).unwrap();
        store
            .update(id, &mut |r: &mut LicenseRecord| {
                r.bind("ABC", Utc::now());
                true
            })
            .unwrap();
        id
    };

    let reopened = JsonFileLicenseStore::open(&path).unwrap();
    let rec = reopened.get_by_digest(&digest("LIC_PERSIST")).unwrap();
    assert_eq!(rec.id, id);
    assert_eq!(rec.bound_hwid.as_deref(), Some("ABC"));
}

#[test]
fn json_store_leaves_no_temp_file_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("licenses.json");
    let store = JsonFileLicenseStore::open(&path).unwrap();
    store.create(record("LIC_SYNCED")).unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("licenses.json.tmp").exists());
    let saved: Vec<LicenseRecord> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].token_digest, digest("LIC_SYNCED"));
}

#[test]
fn json_store_never_writes_raw_tokens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("licenses.json");
    let store = JsonFileLicenseStore::open(&path).unwrap();
    store.create(record("LIC_SECRET_VALUE")).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("LIC_SECRET_VALUE"));
    assert!(contents.contains(&digest("LIC_SECRET_VALUE")));
}

#[test]
fn json_store_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("licenses.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = JsonFileLicenseStore::open(&path).err().unwrap();
    assert!(matches!(err, LicenseError::StoreUnavailable(_)));
}

#[test]
fn json_store_accepts_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("licenses.json");
    std::fs::write(&path, "").unwrap();
    let store = JsonFileLicenseStore::open(&path).unwrap();
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn json_store_write_failure_keeps_memory_consistent() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let path = data_dir.join("licenses.json");
    let store = JsonFileLicenseStore::open(&path).unwrap();
    let id = store.create(record("LIC_KEEP")).unwrap();

    std::fs::remove_dir_all(&data_dir).unwrap();

    let err = store.create(record("LIC_LOST")).unwrap_err();
    assert!(matches!(err, LicenseError::StoreUnavailable(_)));
    assert!(store.get_by_digest(&digest("LIC_LOST")).is_err());

    let err = store
        .update(id, &mut |r: &mut LicenseRecord| {
            r.bind("ABC", Utc::now());
            true
        })
        .unwrap_err();
    assert!(matches!(err, LicenseError::StoreUnavailable(_)));
    assert!(!store.get(id).unwrap().used);

    assert!(store.delete(id).is_err());
    assert!(store.get(id).is_ok());
    assert_eq!(store.list_all().unwrap().len(), 1);
}

// ── SQLite persistence ───────────────────────────────────────────

#[test]
fn sqlite_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("licenses.db");
    let id = {
        let store = SqliteLicenseStore::open(&path, std::time::Duration::from_secs(1)).unwrap();
        let mut rec = record("LIC_SQL");
        rec.description = Some("reseller batch".into());
        store.create(rec).unwrap()
    };

    let reopened = SqliteLicenseStore::open(&path, std::time::Duration::from_secs(1)).unwrap();
    let rec = reopened.get(id).unwrap();
    assert_eq!(rec.description.as_deref(), Some("reseller batch"));
    assert!(rec.expires_at.is_some());
    assert!(rec.active);
}

#[test]
fn sqlite_in_memory_store_works() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let id = store.create(record("LIC_MEM")).unwrap();
    assert_eq!(store.list_all().unwrap()[0].id, id);
}

#[test]
fn open_store_selects_backing() {
    let dir = TempDir::new().unwrap();
    let configs = [
        StoreConfig::Memory,
        StoreConfig::JsonFile {
            path: dir.path().join("a.json"),
        },
        StoreConfig::Sqlite {
            path: dir.path().join("a.db"),
            busy_timeout: std::time::Duration::from_secs(1),
        },
    ];
    for config in &configs {
        let store = open_store(config).unwrap();
        store.create(record("LIC_OPEN")).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1, "{config:?}");
    }
}
