//! Persistence collaborator: whole-value load/replace of per-user state.
//!
//! The engine only sees `CompanionStore`. `SledStore` keeps state on the host
//! filesystem; `InMemoryStore` is a DashMap used for tests and ephemeral runs.

use crate::error::StoreError;
use crate::trend::EmotionLogEntry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const DEFAULT_DATA_PATH: &str = "./data/haven";

/// Background flush interval for the sled log. Writes never flush inline.
const FLUSH_EVERY_MS: u64 = 500;

/// Scope used when the caller does not name a user.
pub const DEFAULT_SCOPE: &str = "default";

/// Synchronous whole-value store, keyed by user scope. Absent values load as
/// empty defaults; read or decode failures are errors.
pub trait CompanionStore: Send + Sync {
    fn load_memory(&self, scope: &str) -> Result<Vec<String>, StoreError>;
    fn save_memory(&self, scope: &str, memory: &[String]) -> Result<(), StoreError>;

    fn load_emotion_log(&self, scope: &str) -> Result<Vec<EmotionLogEntry>, StoreError>;
    fn save_emotion_log(&self, scope: &str, log: &[EmotionLogEntry]) -> Result<(), StoreError>;

    fn load_safe_word(&self, scope: &str) -> Result<Option<String>, StoreError>;
    fn save_safe_word(&self, scope: &str, word: &str) -> Result<(), StoreError>;

    fn load_silent_mode(&self, scope: &str) -> Result<bool, StoreError>;
    fn save_silent_mode(&self, scope: &str, enabled: bool) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct ScopeState {
    memory: Vec<String>,
    emotion_log: Vec<EmotionLogEntry>,
    safe_word: Option<String>,
    silent_mode: bool,
}

/// Process-local store. Last write wins.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    scopes: DashMap<String, ScopeState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, scope: &str, f: impl FnOnce(&ScopeState) -> T) -> T {
        match self.scopes.get(scope) {
            Some(state) => f(state.value()),
            None => f(&ScopeState::default()),
        }
    }

    fn write(&self, scope: &str, f: impl FnOnce(&mut ScopeState)) {
        let mut entry = self.scopes.entry(scope.to_string()).or_default();
        f(entry.value_mut());
    }
}

impl CompanionStore for InMemoryStore {
    fn load_memory(&self, scope: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.read(scope, |s| s.memory.clone()))
    }

    fn save_memory(&self, scope: &str, memory: &[String]) -> Result<(), StoreError> {
        self.write(scope, |s| s.memory = memory.to_vec());
        Ok(())
    }

    fn load_emotion_log(&self, scope: &str) -> Result<Vec<EmotionLogEntry>, StoreError> {
        Ok(self.read(scope, |s| s.emotion_log.clone()))
    }

    fn save_emotion_log(&self, scope: &str, log: &[EmotionLogEntry]) -> Result<(), StoreError> {
        self.write(scope, |s| s.emotion_log = log.to_vec());
        Ok(())
    }

    fn load_safe_word(&self, scope: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read(scope, |s| s.safe_word.clone()))
    }

    fn save_safe_word(&self, scope: &str, word: &str) -> Result<(), StoreError> {
        self.write(scope, |s| s.safe_word = Some(word.to_string()));
        Ok(())
    }

    fn load_silent_mode(&self, scope: &str) -> Result<bool, StoreError> {
        Ok(self.read(scope, |s| s.silent_mode))
    }

    fn save_silent_mode(&self, scope: &str, enabled: bool) -> Result<(), StoreError> {
        self.write(scope, |s| s.silent_mode = enabled);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sled
// ---------------------------------------------------------------------------

/// Sled-backed store. Keys are `{scope}/{field}`, values are JSON.
///
/// Writes land in sled's page cache and are made durable by its background
/// flusher; call `flush_async` before shutdown to persist the tail.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open the store at `path`, or `./data/haven` when `None`.
    pub fn open(path: Option<impl AsRef<Path>>) -> Result<Self, StoreError> {
        let p = path
            .map(|x| x.as_ref().to_path_buf())
            .unwrap_or_else(|| Path::new(DEFAULT_DATA_PATH).to_path_buf());
        let db = sled::Config::new()
            .path(p)
            .flush_every_ms(Some(FLUSH_EVERY_MS))
            .open()?;
        Ok(Self { db })
    }

    fn key(scope: &str, field: &str) -> String {
        format!("{}/{}", scope, field)
    }

    fn get_json<T: DeserializeOwned>(&self, scope: &str, field: &str) -> Result<Option<T>, StoreError> {
        match self.db.get(Self::key(scope, field).as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize + ?Sized>(&self, scope: &str, field: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(Self::key(scope, field).as_bytes(), bytes)?;
        Ok(())
    }

    /// Persist everything written so far without blocking the runtime.
    pub async fn flush_async(&self) -> Result<usize, StoreError> {
        Ok(self.db.flush_async().await?)
    }
}

impl CompanionStore for SledStore {
    fn load_memory(&self, scope: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.get_json(scope, "memory")?.unwrap_or_default())
    }

    fn save_memory(&self, scope: &str, memory: &[String]) -> Result<(), StoreError> {
        self.put_json(scope, "memory", memory)
    }

    fn load_emotion_log(&self, scope: &str) -> Result<Vec<EmotionLogEntry>, StoreError> {
        Ok(self.get_json(scope, "emotion_log")?.unwrap_or_default())
    }

    fn save_emotion_log(&self, scope: &str, log: &[EmotionLogEntry]) -> Result<(), StoreError> {
        self.put_json(scope, "emotion_log", log)
    }

    fn load_safe_word(&self, scope: &str) -> Result<Option<String>, StoreError> {
        self.get_json(scope, "safe_word")
    }

    fn save_safe_word(&self, scope: &str, word: &str) -> Result<(), StoreError> {
        self.put_json(scope, "safe_word", word)
    }

    fn load_silent_mode(&self, scope: &str) -> Result<bool, StoreError> {
        Ok(self.get_json(scope, "silent_mode")?.unwrap_or(false))
    }

    fn save_silent_mode(&self, scope: &str, enabled: bool) -> Result<(), StoreError> {
        self.put_json(scope, "silent_mode", &enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Emotion;

    #[test]
    fn in_memory_defaults_are_empty() {
        let store = InMemoryStore::new();
        assert!(store.load_memory("u").unwrap().is_empty());
        assert!(store.load_emotion_log("u").unwrap().is_empty());
        assert_eq!(store.load_safe_word("u").unwrap(), None);
        assert!(!store.load_silent_mode("u").unwrap());
    }

    #[test]
    fn in_memory_scopes_are_isolated() {
        let store = InMemoryStore::new();
        store.save_safe_word("alice", "ocean").unwrap();
        store.save_silent_mode("alice", true).unwrap();
        assert_eq!(store.load_safe_word("alice").unwrap().as_deref(), Some("ocean"));
        assert_eq!(store.load_safe_word("bob").unwrap(), None);
        assert!(!store.load_silent_mode("bob").unwrap());
    }

    #[test]
    fn sled_stores_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(Some(dir.path())).unwrap();
        store.save_memory(DEFAULT_SCOPE, &["tea".to_string(), "cats".to_string()]).unwrap();
        store
            .save_emotion_log(DEFAULT_SCOPE, &[EmotionLogEntry::now(Emotion::Sadness)])
            .unwrap();
        store.save_safe_word(DEFAULT_SCOPE, "ocean").unwrap();
        store.save_silent_mode(DEFAULT_SCOPE, true).unwrap();

        assert_eq!(store.load_memory(DEFAULT_SCOPE).unwrap(), vec!["tea", "cats"]);
        let log = store.load_emotion_log(DEFAULT_SCOPE).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].emotion, Emotion::Sadness);
        assert_eq!(store.load_safe_word(DEFAULT_SCOPE).unwrap().as_deref(), Some("ocean"));
        assert!(store.load_silent_mode(DEFAULT_SCOPE).unwrap());
        assert!(store.load_memory("someone_else").unwrap().is_empty());
    }

    #[test]
    fn sled_corrupt_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(Some(dir.path())).unwrap();
        store.db.insert("default/memory", &b"not json"[..]).unwrap();
        assert!(matches!(store.load_memory(DEFAULT_SCOPE), Err(StoreError::Json(_))));
    }

    #[tokio::test]
    async fn sled_writes_are_readable_before_flush_and_flush_is_async() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(Some(dir.path())).unwrap();
        store.save_safe_word("u", "harbor").unwrap();
        assert_eq!(store.load_safe_word("u").unwrap().as_deref(), Some("harbor"));
        store.flush_async().await.unwrap();
        assert_eq!(store.load_safe_word("u").unwrap().as_deref(), Some("harbor"));
    }
}
