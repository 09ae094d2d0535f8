use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// On-disk layout of `best_scores.json`: raw key/value pairs, so the file
/// backend stays agnostic of what the values mean.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyValueData {
    pub schema_version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl Default for KeyValueData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl KeyValueData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
