use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

/// Minimal string key/value persistence, the only storage the quiz needs.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Process-lifetime store, used in tests and when the data dir is unusable.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

pub fn score_key(subject: &str, topic: &str) -> String {
    format!("mcqBestScore_{subject}_{topic}")
}

/// Best accuracy percentage per (subject, topic). Writes are a ratchet: a
/// value is only stored when it beats the previous best. Storage failures
/// are logged and otherwise ignored.
pub struct ScoreStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> ScoreStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// `None` when no attempt has been recorded (or the value is unreadable).
    pub fn get(&self, subject: &str, topic: &str) -> Option<u8> {
        let raw = self.backend.get(&score_key(subject, topic))?;
        raw.trim().parse::<u8>().ok().map(|pct| pct.min(100))
    }

    /// Store `accuracy_percent` if it beats the recorded best. Returns
    /// whether a new best was written.
    pub fn put(&mut self, subject: &str, topic: &str, accuracy_percent: u8) -> bool {
        let accuracy_percent = accuracy_percent.min(100);
        if let Some(best) = self.get(subject, topic) {
            if accuracy_percent <= best {
                return false;
            }
        }
        match self
            .backend
            .set(&score_key(subject, topic), &accuracy_percent.to_string())
        {
            Ok(()) => {
                debug!(subject, topic, accuracy_percent, "new best score");
                true
            }
            Err(err) => {
                warn!(subject, topic, error = %err, "could not persist best score");
                false
            }
        }
    }
}
