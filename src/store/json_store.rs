use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use crate::store::schema::KeyValueData;
use crate::store::score_store::KeyValueStore;

const FILE_NAME: &str = "best_scores.json";

/// File-backed key/value store. The whole document is kept in memory and
/// rewritten atomically on every change.
pub struct JsonStore {
    base_dir: PathBuf,
    data: KeyValueData,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mcquiz");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        let mut store = Self {
            base_dir,
            data: KeyValueData::default(),
        };
        store.data = store.load();
        Ok(store)
    }

    pub fn file_path(&self) -> PathBuf {
        self.base_dir.join(FILE_NAME)
    }

    /// Missing, unreadable, corrupt or stale files all load as empty.
    fn load(&self) -> KeyValueData {
        let path = self.file_path();
        if !path.exists() {
            return KeyValueData::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str::<KeyValueData>(&content)?));
        match parsed {
            Ok(data) if !data.needs_reset() => data,
            Ok(data) => {
                warn!(
                    path = %path.display(),
                    schema_version = data.schema_version,
                    "discarding best scores with unknown schema"
                );
                KeyValueData::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable best scores");
                KeyValueData::default()
            }
        }
    }

    fn save(&self) -> Result<()> {
        let path = self.file_path();
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(&self.data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let previous = self.data.entries.insert(key.to_string(), value.to_string());
        if let Err(err) = self.save() {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(old) => self.data.entries.insert(key.to_string(), old),
                None => self.data.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}
