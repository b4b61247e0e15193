//! In-memory license store with write-through JSON persistence.
//!
//! Each record sits behind its own mutex, so updates to unrelated licenses do
//! not wait on each other while their mutators run. The on-disk image is a
//! separate map guarded by one lock; a mutation is written to disk before it
//! becomes visible in memory, and a failed write leaves memory untouched.

use super::{sort_newest_first, LicenseStore, Mutator};
use crate::error::{LicenseError, LicenseResult};
use crate::hasher::short;
use crate::record::{LicenseId, LicenseRecord};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info};

/// A record slot. `None` marks a record deleted while someone still held the
/// slot, so late updates cannot bring it back.
type Slot = Arc<Mutex<Option<LicenseRecord>>>;

#[derive(Default)]
struct Index {
    by_id: HashMap<LicenseId, Slot>,
    by_digest: HashMap<String, LicenseId>,
}

/// License store holding records in memory and persisting them to a JSON file.
pub struct JsonFileLicenseStore {
    path: Option<PathBuf>,
    index: RwLock<Index>,
    image: Mutex<BTreeMap<LicenseId, LicenseRecord>>,
}

impl JsonFileLicenseStore {
    /// Opens the store at `path`, loading any existing records.
    ///
    /// A missing file starts an empty store. A file that cannot be parsed is
    /// an error rather than silently discarded.
    pub fn open(path: &Path) -> LicenseResult<Self> {
        let records: Vec<LicenseRecord> = if path.exists() {
            let bytes = fs::read(path)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                Vec::new()
            } else {
                serde_json::from_slice(&bytes).map_err(|e| {
                    error!("license file {} is corrupt: {e}", path.display());
                    LicenseError::StoreUnavailable(format!("failed to parse license file: {e}"))
                })?
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            Vec::new()
        };

        let mut index = Index::default();
        let mut image = BTreeMap::new();
        for record in records {
            if index.by_digest.contains_key(&record.token_digest) {
                return Err(LicenseError::StoreUnavailable(format!(
                    "license file contains duplicate digest {}",
                    short(&record.token_digest)
                )));
            }
            index.by_digest.insert(record.token_digest.clone(), record.id);
            index
                .by_id
                .insert(record.id, Arc::new(Mutex::new(Some(record.clone()))));
            image.insert(record.id, record);
        }

        info!("loaded {} licenses from {}", image.len(), path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            index: RwLock::new(index),
            image: Mutex::new(image),
        })
    }

    /// Creates a volatile store with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            index: RwLock::new(Index::default()),
            image: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock_image(&self) -> LicenseResult<MutexGuard<'_, BTreeMap<LicenseId, LicenseRecord>>> {
        self.image.lock().map_err(|_| poisoned())
    }

    fn slot(&self, id: LicenseId) -> LicenseResult<Slot> {
        let index = self.index.read().map_err(|_| poisoned())?;
        index
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| LicenseError::NotFound(id.to_string()))
    }

    /// Writes the image to disk via a temp file and rename.
    fn flush(&self, image: &BTreeMap<LicenseId, LicenseRecord>) -> LicenseResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut records: Vec<LicenseRecord> = image.values().cloned().collect();
        sort_newest_first(&mut records);
        let json = serde_json::to_vec_pretty(&records)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let result = write_synced(&tmp, &json).and_then(|()| fs::rename(&tmp, path));
        result.map_err(|e| {
            error!("failed to persist licenses to {}: {e}", path.display());
            LicenseError::StoreUnavailable(format!("failed to persist licenses: {e}"))
        })
    }

    /// Puts `record` into the image and flushes, restoring the previous entry
    /// if the write fails.
    fn write_through(&self, record: &LicenseRecord) -> LicenseResult<()> {
        let mut image = self.lock_image()?;
        let previous = image.insert(record.id, record.clone());
        if let Err(e) = self.flush(&image) {
            match previous {
                Some(prev) => image.insert(record.id, prev),
                None => image.remove(&record.id),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn poisoned() -> LicenseError {
    LicenseError::StoreUnavailable("license store lock poisoned".into())
}

impl LicenseStore for JsonFileLicenseStore {
    fn create(&self, record: LicenseRecord) -> LicenseResult<LicenseId> {
        let mut index = self.index.write().map_err(|_| poisoned())?;
        if index.by_digest.contains_key(&record.token_digest) || index.by_id.contains_key(&record.id) {
            return Err(LicenseError::DuplicateToken);
        }
        self.write_through(&record)?;

        let id = record.id;
        debug!("inserted license {id} ({})", short(&record.token_digest));
        index.by_digest.insert(record.token_digest.clone(), id);
        index.by_id.insert(id, Arc::new(Mutex::new(Some(record))));
        Ok(id)
    }

    fn get_by_digest(&self, digest: &str) -> LicenseResult<LicenseRecord> {
        let slot = {
            let index = self.index.read().map_err(|_| poisoned())?;
            index
                .by_digest
                .get(digest)
                .and_then(|id| index.by_id.get(id))
                .cloned()
        };
        let not_found = || LicenseError::NotFound(short(digest).to_string());
        let slot = slot.ok_or_else(not_found)?;
        let guard = slot.lock().map_err(|_| poisoned())?;
        guard.clone().ok_or_else(not_found)
    }

    fn get(&self, id: LicenseId) -> LicenseResult<LicenseRecord> {
        let slot = self.slot(id)?;
        let guard = slot.lock().map_err(|_| poisoned())?;
        guard
            .clone()
            .ok_or_else(|| LicenseError::NotFound(id.to_string()))
    }

    fn update(&self, id: LicenseId, mutator: Mutator<'_>) -> LicenseResult<LicenseRecord> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().map_err(|_| poisoned())?;
        let Some(current) = guard.as_ref() else {
            return Err(LicenseError::NotFound(id.to_string()));
        };

        let mut next = current.clone();
        if !mutator(&mut next) {
            return Ok(next);
        }
        self.write_through(&next)?;
        *guard = Some(next.clone());
        Ok(next)
    }

    fn delete(&self, id: LicenseId) -> LicenseResult<()> {
        let mut index = self.index.write().map_err(|_| poisoned())?;
        let slot = index
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| LicenseError::NotFound(id.to_string()))?;
        let mut guard = slot.lock().map_err(|_| poisoned())?;

        {
            let mut image = self.lock_image()?;
            let previous = image.remove(&id);
            if let Err(e) = self.flush(&image) {
                if let Some(prev) = previous {
                    image.insert(id, prev);
                }
                return Err(e);
            }
        }

        if let Some(record) = guard.take() {
            index.by_digest.remove(&record.token_digest);
        }
        index.by_id.remove(&id);
        Ok(())
    }

    fn list_all(&self) -> LicenseResult<Vec<LicenseRecord>> {
        let image = self.lock_image()?;
        let mut records: Vec<LicenseRecord> = image.values().cloned().collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

/// Writes `bytes` to `path` and waits for them to reach the disk.
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
