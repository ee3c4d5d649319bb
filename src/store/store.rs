use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::field::field_model::FieldRecord;

/// Slot holding the most recently saved form.
pub const SAVED_FORM_DATA: &str = "savedFormData";

/// Format version written by this build.
pub const STORE_VERSION: u32 = 1;

/// Named slots of field records.
pub trait FormStore {
    /// Records in `slot`, `None` when the slot was never written.
    fn load(&self, slot: &str) -> Result<Option<Vec<FieldRecord>>, StoreError>;

    fn save(&mut self, slot: &str, records: &[FieldRecord]) -> Result<(), StoreError>;

    /// Deletes `slot`. Returns whether anything was there.
    fn remove(&mut self, slot: &str) -> Result<bool, StoreError>;

    fn slots(&self) -> Result<Vec<String>, StoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: BTreeMap<String, Vec<FieldRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormStore for MemoryStore {
    fn load(&self, slot: &str) -> Result<Option<Vec<FieldRecord>>, StoreError> {
        Ok(self.slots.get(slot).cloned())
    }

    fn save(&mut self, slot: &str, records: &[FieldRecord]) -> Result<(), StoreError> {
        self.slots.insert(slot.to_string(), persistable(slot, records));
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<bool, StoreError> {
        Ok(self.slots.remove(slot).is_some())
    }

    fn slots(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.slots.keys().cloned().collect())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    slots: BTreeMap<String, Vec<Value>>,
}

/// All slots in one JSON file:
///
/// ```json
/// { "version": 1, "slots": { "savedFormData": [ { "type": "text", ... } ] } }
/// ```
///
/// Also reads the unversioned layouts older builds wrote: a bare record
/// array (taken as the `savedFormData` slot) or a plain `{ slot: [...] }`
/// map. Both are upgraded on the next save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    /// `<data dir>/form-autofill/store.json`, or `./form-autofill-store.json`
    /// when the platform has no data directory.
    pub fn default_path() -> PathBuf {
        match dirs::data_dir() {
            Some(dir) => dir.join("form-autofill").join("store.json"),
            None => PathBuf::from("form-autofill-store.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_file(&self) -> Result<StoreFile, StoreError> {
        if !self.path.exists() {
            return Ok(StoreFile {
                version: STORE_VERSION,
                slots: BTreeMap::new(),
            });
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let raw: Value = serde_json::from_str(&content).map_err(|e| StoreError::Json {
            path: self.path.display().to_string(),
            source: e,
        })?;
        self.upgrade(raw)
    }

    fn upgrade(&self, raw: Value) -> Result<StoreFile, StoreError> {
        let json_error = |source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        };

        match raw {
            Value::Array(records) => {
                debug!(target: "store", "reading legacy record array");
                let mut slots = BTreeMap::new();
                slots.insert(SAVED_FORM_DATA.to_string(), records);
                Ok(StoreFile { version: 0, slots })
            }
            Value::Object(map) if !map.contains_key("version") => {
                debug!(target: "store", "reading legacy slot map");
                let slots: BTreeMap<String, Vec<Value>> =
                    serde_json::from_value(Value::Object(map)).map_err(json_error)?;
                Ok(StoreFile { version: 0, slots })
            }
            other => {
                let file: StoreFile = serde_json::from_value(other).map_err(json_error)?;
                if file.version > STORE_VERSION {
                    return Err(StoreError::UnsupportedVersion {
                        found: file.version,
                        supported: STORE_VERSION,
                    });
                }
                Ok(file)
            }
        }
    }

    fn write_file(&self, file: &StoreFile) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(file).map_err(|e| StoreError::Json {
            path: self.path.display().to_string(),
            source: e,
        })?;
        write_atomic(&self.path, &data).map_err(|e| self.io_error(e))
    }
}

/// The records of `records` that hold the persistence invariants. Both
/// stores drop the rest before writing.
pub fn persistable(slot: &str, records: &[FieldRecord]) -> Vec<FieldRecord> {
    records
        .iter()
        .enumerate()
        .filter(|(index, record)| match record.validate() {
            Ok(()) => true,
            Err(problem) => {
                warn!(target: "store", slot, index, question = %record.question, %problem, "not saving invalid record");
                false
            }
        })
        .map(|(_, record)| record.clone())
        .collect()
}

/// Keeps the records that parse and hold the persistence invariants.
fn decode_records(slot: &str, raw: Vec<Value>) -> Vec<FieldRecord> {
    let mut records = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let record: FieldRecord = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "store", slot, index, error = %e, "dropping unreadable record");
                continue;
            }
        };
        if let Err(problem) = record.validate() {
            warn!(target: "store", slot, index, question = %record.question, %problem, "dropping invalid record");
            continue;
        }
        records.push(record);
    }
    records
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp, path)
}

impl FormStore for JsonFileStore {
    fn load(&self, slot: &str) -> Result<Option<Vec<FieldRecord>>, StoreError> {
        let mut file = self.read_file()?;
        Ok(file.slots.remove(slot).map(|raw| decode_records(slot, raw)))
    }

    fn save(&mut self, slot: &str, records: &[FieldRecord]) -> Result<(), StoreError> {
        let records = persistable(slot, records);
        let mut file = self.read_file()?;
        let mut encoded = Vec::with_capacity(records.len());
        for record in &records {
            encoded.push(serde_json::to_value(record).map_err(|e| StoreError::Json {
                path: self.path.display().to_string(),
                source: e,
            })?);
        }
        file.slots.insert(slot.to_string(), encoded);
        file.version = STORE_VERSION;
        self.write_file(&file)?;
        info!(target: "store", slot, count = records.len(), path = %self.path.display(), "saved records");
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<bool, StoreError> {
        let mut file = self.read_file()?;
        if file.slots.remove(slot).is_none() {
            return Ok(false);
        }
        file.version = STORE_VERSION;
        self.write_file(&file)?;
        info!(target: "store", slot, "removed slot");
        Ok(true)
    }

    fn slots(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_file()?.slots.into_keys().collect())
    }
}
