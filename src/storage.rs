use crate::model::{Note, NoteId, Preferences};
use chrono::Utc;
use log::{debug, warn};
use rand::{distributions::Alphanumeric, Rng};
use std::fs;
use std::io;
use std::path::PathBuf;

pub const THOUGHTS_KEY: &str = "MINDFLOW_THOUGHTS";
pub const SETTINGS_KEY: &str = "MINDFLOW_SETTINGS";

const ID_LEN: usize = 12;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serializing {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),
}

/// String blobs under fixed keys, read and written whole.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileKv { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// The note collection, newest first, stored as a single JSON array.
#[derive(Debug, Clone)]
pub struct ThoughtStore<S> {
    kv: S,
}

impl<S: KvStore> ThoughtStore<S> {
    pub fn new(kv: S) -> Self {
        ThoughtStore { kv }
    }

    /// Unreadable or malformed data is treated as an empty collection.
    pub fn load(&self) -> Vec<Note> {
        let raw = match self.kv.get(THOUGHTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("event=thoughts_load status=read_failed error={}", err);
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(notes) => notes,
            Err(err) => {
                warn!("event=thoughts_load status=parse_failed error={}", err);
                Vec::new()
            }
        }
    }

    pub fn save(&mut self, notes: &[Note]) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(notes).map_err(|source| StoreError::Serialize {
            key: THOUGHTS_KEY,
            source,
        })?;
        self.kv.set(THOUGHTS_KEY, &serialized)
    }

    pub fn list(&self) -> Vec<Note> {
        self.load()
    }

    pub fn add(&mut self, content: impl Into<String>) -> Result<Note, StoreError> {
        let mut notes = self.load();
        let id = unique_id(&notes);
        let note = Note::new(id, content.into(), Utc::now());
        notes.insert(0, note.clone());
        self.save(&notes)?;
        debug!("event=thought_add id={} total={}", note.id, notes.len());
        Ok(note)
    }

    pub fn update(&mut self, id: &str, content: impl Into<String>) -> Result<Note, StoreError> {
        let mut notes = self.load();
        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StoreError::NoteNotFound(id.to_string()))?;
        note.content = content.into();
        let updated = note.clone();
        self.save(&notes)?;
        debug!("event=thought_update id={}", id);
        Ok(updated)
    }

    /// Returns whether a note with `id` existed.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut notes = self.load();
        let before = notes.len();
        notes.retain(|n| n.id != id);
        let removed = notes.len() != before;
        self.save(&notes)?;
        debug!("event=thought_delete id={} removed={}", id, removed);
        Ok(removed)
    }

    pub fn delete_all(&mut self) -> Result<(), StoreError> {
        self.kv.remove(THOUGHTS_KEY)?;
        debug!("event=thought_delete_all");
        Ok(())
    }
}

pub fn load_preferences<S: KvStore>(kv: &S) -> Preferences {
    let raw = match kv.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Preferences::default(),
        Err(err) => {
            warn!("event=settings_load status=read_failed error={}", err);
            return Preferences::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!("event=settings_load status=parse_failed error={}", err);
        Preferences::default()
    })
}

pub fn save_preferences<S: KvStore>(kv: &mut S, prefs: &Preferences) -> Result<(), StoreError> {
    let serialized = serde_json::to_string(prefs).map_err(|source| StoreError::Serialize {
        key: SETTINGS_KEY,
        source,
    })?;
    kv.set(SETTINGS_KEY, &serialized)
}

fn unique_id(existing: &[Note]) -> NoteId {
    loop {
        let id = generate_id();
        if !existing.iter().any(|n| n.id == id) {
            return id;
        }
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
pub mod memory {
    use super::{KvStore, StoreError};
    use std::collections::HashMap;

    #[derive(Debug, Default, Clone)]
    pub struct MemoryKv {
        pub entries: HashMap<String, String>,
    }

    impl KvStore for MemoryKv {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.entries.get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            self.entries.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.entries.remove(key);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryKv;
    use super::*;
    use chrono::{TimeZone, Utc};

    fn note(id: &str, content: &str, millis: i64) -> Note {
        Note::new(
            id.into(),
            content.into(),
            Utc.timestamp_millis_opt(millis).unwrap(),
        )
    }

    #[test]
    fn save_then_load_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ThoughtStore::new(FileKv::new(dir.path()));
        let notes = vec![
            note("b", "second", 1_700_000_100_000),
            note("a", "first", 1_700_000_000_000),
        ];
        store.save(&notes).unwrap();
        assert_eq!(store.load(), notes);
        assert!(dir.path().join("MINDFLOW_THOUGHTS.json").exists());
    }

    #[test]
    fn missing_blob_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThoughtStore::new(FileKv::new(dir.path().join("nested")));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_blob_fails_open() {
        let mut kv = MemoryKv::default();
        kv.set(THOUGHTS_KEY, "{not json").unwrap();
        let store = ThoughtStore::new(kv);
        assert!(store.list().is_empty());
    }

    #[test]
    fn add_places_newest_first() {
        let mut store = ThoughtStore::new(MemoryKv::default());
        let first = store.add("one").unwrap();
        let second = store.add("two").unwrap();
        let listed = store.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], second);
        assert_eq!(listed[1], first);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn delete_removes_only_matching_id() {
        let mut store = ThoughtStore::new(MemoryKv::default());
        let notes = vec![note("c", "3", 3), note("b", "2", 2), note("a", "1", 1)];
        store.save(&notes).unwrap();

        assert!(store.delete("b").unwrap());
        let ids: Vec<_> = store.list().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["c", "a"]);

        assert!(!store.delete("zzz").unwrap());
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn update_changes_content_in_place() {
        let mut store = ThoughtStore::new(MemoryKv::default());
        let notes = vec![note("b", "old", 2_000), note("a", "keep", 1_000)];
        store.save(&notes).unwrap();

        let updated = store.update("b", "new").unwrap();
        assert_eq!(updated.content, "new");
        assert_eq!(updated.created_at, notes[0].created_at);
        let listed = store.list();
        assert_eq!(listed[0].id, "b");
        assert_eq!(listed[0].content, "new");
        assert_eq!(listed[1], notes[1]);
    }

    #[test]
    fn update_unknown_id_is_an_error() {
        let mut store = ThoughtStore::new(MemoryKv::default());
        let err = store.update("nope", "x").unwrap_err();
        assert!(matches!(err, StoreError::NoteNotFound(id) if id == "nope"));
    }

    #[test]
    fn delete_all_removes_the_blob() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ThoughtStore::new(FileKv::new(dir.path()));
        store.add("gone soon").unwrap();
        store.delete_all().unwrap();
        assert!(store.list().is_empty());
        assert!(!dir.path().join("MINDFLOW_THOUGHTS.json").exists());
        store.delete_all().unwrap();
    }

    #[test]
    fn preferences_round_trip_and_default() {
        let mut kv = MemoryKv::default();
        assert_eq!(load_preferences(&kv), Preferences::default());

        let prefs = Preferences {
            blur_enabled: false,
            focus_mode_enabled: true,
            onboarding_completed: true,
        };
        save_preferences(&mut kv, &prefs).unwrap();
        assert_eq!(load_preferences(&kv), prefs);

        let raw = kv.get(SETTINGS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"blurEnabled\":false"));
    }
}
