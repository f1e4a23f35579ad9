//! Best-effort storage of the high score, the settings, and the in-progress
//! run
use crate::consts;
use crate::game::Snapshot;
use crate::settings::Settings;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, trace};

pub(crate) const HIGH_SCORE_KEY: &str = "highScore";
pub(crate) const SETTINGS_KEY: &str = "settings";
pub(crate) const SNAPSHOT_KEY: &str = "snapshot";

/// A string key-value store
pub(crate) trait Store {
    /// Return the value for `key`, or `None` if it is not set
    fn get(&self, key: &str) -> std::io::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> std::io::Result<()>;

    /// Delete `key`.  Deleting a key that is not set is not an error.
    fn remove(&mut self, key: &str) -> std::io::Result<()>;
}

/// A [`Store`] that keeps each key in its own file inside a directory
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub(crate) fn new(dir: PathBuf) -> FileStore {
        FileStore { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        match fs_err::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> std::io::Result<()> {
        fs_err::create_dir_all(&self.dir)?;
        fs_err::write(self.path(key), value)
    }

    fn remove(&mut self, key: &str) -> std::io::Result<()> {
        match fs_err::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// A [`Store`] that lives only as long as the process
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MemoryStore {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub(crate) fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// A store whose writes all fail
    #[cfg(test)]
    pub(crate) fn read_only(entries: HashMap<String, String>) -> MemoryStore {
        MemoryStore {
            entries,
            read_only: true,
        }
    }

    fn check_writable(&self) -> std::io::Result<()> {
        if self.read_only {
            Err(std::io::Error::new(
                ErrorKind::PermissionDenied,
                "store is read-only",
            ))
        } else {
            Ok(())
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> std::io::Result<()> {
        self.check_writable()?;
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> std::io::Result<()> {
        self.check_writable()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Typed access to a [`Store`].
///
/// Snapshot writes are coalesced so that the store is written at most once
/// per [`SNAPSHOT_SAVE_INTERVAL`][consts::SNAPSHOT_SAVE_INTERVAL]; the most
/// recent snapshot is held back until the interval has passed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Persistence<S> {
    store: S,
    last_snapshot_write: Option<Instant>,
    pending_snapshot: Option<Snapshot>,
}

impl<S: Store> Persistence<S> {
    pub(crate) fn new(store: S) -> Persistence<S> {
        Persistence {
            store,
            last_snapshot_write: None,
            pending_snapshot: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Load the high score.  A missing high score is zero.
    pub(crate) fn load_high_score(&self) -> Result<u32, LoadError> {
        match self.read(HIGH_SCORE_KEY)? {
            Some(src) => src
                .trim()
                .parse::<u32>()
                .map_err(|e| LoadError::parse_int(HIGH_SCORE_KEY, e)),
            None => Ok(0),
        }
    }

    pub(crate) fn save_high_score(&mut self, score: u32) -> Result<(), SaveError> {
        self.write(HIGH_SCORE_KEY, &score.to_string())
    }

    /// Load the saved settings, if any
    pub(crate) fn load_settings(&self) -> Result<Option<Settings>, LoadError> {
        self.read_json(SETTINGS_KEY)
    }

    pub(crate) fn save_settings(&mut self, settings: Settings) -> Result<(), SaveError> {
        let src = serde_json::to_string(&settings)
            .map_err(|e| SaveError::serialize(SETTINGS_KEY, e))?;
        self.write(SETTINGS_KEY, &src)
    }

    /// Load the saved in-progress run, if any
    pub(crate) fn load_snapshot(&self) -> Result<Option<Snapshot>, LoadError> {
        self.read_json(SNAPSHOT_KEY)
    }

    /// Queue `snapshot` for saving, and write it if enough time has passed
    /// since the last snapshot write.  Returns `true` if the snapshot was
    /// written.
    pub(crate) fn save_snapshot(
        &mut self,
        snapshot: Snapshot,
        now: Instant,
    ) -> Result<bool, SaveError> {
        self.pending_snapshot = Some(snapshot);
        self.flush(now)
    }

    /// Write the pending snapshot, if there is one and the rate limit allows
    pub(crate) fn flush(&mut self, now: Instant) -> Result<bool, SaveError> {
        if self.pending_snapshot.is_none() {
            return Ok(false);
        }
        if let Some(last) = self.last_snapshot_write {
            if now.saturating_duration_since(last) < consts::SNAPSHOT_SAVE_INTERVAL {
                trace!("Snapshot write deferred");
                return Ok(false);
            }
        }
        self.write_pending(now)
    }

    /// Write the pending snapshot regardless of the rate limit
    pub(crate) fn sync(&mut self, now: Instant) -> Result<bool, SaveError> {
        self.write_pending(now)
    }

    /// Delete the saved run and forget any pending snapshot
    pub(crate) fn clear_snapshot(&mut self) -> Result<(), SaveError> {
        self.pending_snapshot = None;
        self.store
            .remove(SNAPSHOT_KEY)
            .map_err(|e| SaveError::write(SNAPSHOT_KEY, e))
    }

    fn write_pending(&mut self, now: Instant) -> Result<bool, SaveError> {
        let Some(snapshot) = self.pending_snapshot.take() else {
            return Ok(false);
        };
        // Count failed writes against the rate limit too so that a broken
        // store is not hammered every frame.
        self.last_snapshot_write = Some(now);
        let src = serde_json::to_string(&snapshot)
            .map_err(|e| SaveError::serialize(SNAPSHOT_KEY, e))?;
        self.write(SNAPSHOT_KEY, &src)?;
        debug!(score = snapshot.score, "Saved snapshot");
        Ok(true)
    }

    fn read(&self, key: &'static str) -> Result<Option<String>, LoadError> {
        self.store.get(key).map_err(|e| LoadError::read(key, e))
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &'static str,
    ) -> Result<Option<T>, LoadError> {
        match self.read(key)? {
            Some(src) => serde_json::from_str(&src)
                .map(Some)
                .map_err(|e| LoadError::deserialize(key, e)),
            None => Ok(None),
        }
    }

    fn write(&mut self, key: &'static str, value: &str) -> Result<(), SaveError> {
        self.store
            .set(key, value)
            .map_err(|e| SaveError::write(key, e))
    }
}

#[derive(Debug, Error)]
#[error("failed to save {key:?}")]
pub(crate) struct SaveError {
    key: &'static str,
    #[source]
    source: SaveErrorSource,
}

impl SaveError {
    fn serialize(key: &'static str, e: serde_json::Error) -> Self {
        SaveError {
            key,
            source: SaveErrorSource::Serialize(e),
        }
    }

    fn write(key: &'static str, e: std::io::Error) -> Self {
        SaveError {
            key,
            source: SaveErrorSource::Write(e),
        }
    }
}

#[derive(Debug, Error)]
enum SaveErrorSource {
    #[error("failed to serialize value")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write to storage")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("failed to load {key:?}")]
pub(crate) struct LoadError {
    key: &'static str,
    #[source]
    source: LoadErrorSource,
}

impl LoadError {
    fn read(key: &'static str, e: std::io::Error) -> Self {
        LoadError {
            key,
            source: LoadErrorSource::Read(e),
        }
    }

    fn parse_int(key: &'static str, e: std::num::ParseIntError) -> Self {
        LoadError {
            key,
            source: LoadErrorSource::ParseInt(e),
        }
    }

    fn deserialize(key: &'static str, e: serde_json::Error) -> Self {
        LoadError {
            key,
            source: LoadErrorSource::Deserialize(e),
        }
    }
}

#[derive(Debug, Error)]
enum LoadErrorSource {
    #[error("failed to read from storage")]
    Read(#[source] std::io::Error),
    #[error("stored value is not an integer")]
    ParseInt(#[source] std::num::ParseIntError),
    #[error("failed to deserialize stored value")]
    Deserialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::border::BorderMode;
    use crate::game::direction::Direction;
    use crate::game::grid::Cell;
    use std::time::Duration;

    fn snapshot(score: u32) -> Snapshot {
        Snapshot {
            snake: vec![Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)],
            food: Cell::new(1, 1),
            score,
            direction: Direction::Right,
        }
    }

    fn stored(p: &Persistence<MemoryStore>, key: &str) -> Option<String> {
        p.store().get(key).unwrap()
    }

    #[test]
    fn missing_values_are_defaults() {
        let p = Persistence::new(MemoryStore::new());
        assert_eq!(p.load_high_score().unwrap(), 0);
        assert_eq!(p.load_settings().unwrap(), None);
        assert_eq!(p.load_snapshot().unwrap(), None);
    }

    #[test]
    fn high_score_is_integer_string() {
        let mut p = Persistence::new(MemoryStore::new());
        p.save_high_score(120).unwrap();
        assert_eq!(stored(&p, HIGH_SCORE_KEY).as_deref(), Some("120"));
        assert_eq!(p.load_high_score().unwrap(), 120);
    }

    #[test]
    fn malformed_values_fail_to_load() {
        let entries = HashMap::from([
            (HIGH_SCORE_KEY.to_owned(), String::from("lots")),
            (SETTINGS_KEY.to_owned(), String::from("{\"cellSize\":")),
            (SNAPSHOT_KEY.to_owned(), String::from("[]")),
        ]);
        let p = Persistence::new(MemoryStore::read_only(entries));
        let e = p.load_high_score().unwrap_err();
        assert_eq!(e.to_string(), "failed to load \"highScore\"");
        assert!(p.load_settings().is_err());
        assert!(p.load_snapshot().is_err());
    }

    #[test]
    fn settings_round_trip() {
        let mut p = Persistence::new(MemoryStore::new());
        let settings = Settings {
            border_mode: BorderMode::Bounce,
            ..Settings::default()
        };
        p.save_settings(settings).unwrap();
        assert_eq!(p.load_settings().unwrap(), Some(settings));
    }

    #[test]
    fn snapshot_json_layout() {
        let mut p = Persistence::new(MemoryStore::new());
        assert!(p.save_snapshot(snapshot(30), Instant::now()).unwrap());
        assert_eq!(
            stored(&p, SNAPSHOT_KEY).as_deref(),
            Some(
                r#"{"snake":[{"x":5,"y":5},{"x":4,"y":5},{"x":3,"y":5}],"food":{"x":1,"y":1},"score":30,"direction":"right"}"#
            )
        );
        assert_eq!(p.load_snapshot().unwrap(), Some(snapshot(30)));
    }

    #[test]
    fn snapshot_writes_are_coalesced() {
        let mut p = Persistence::new(MemoryStore::new());
        let start = Instant::now();
        assert!(p.save_snapshot(snapshot(0), start).unwrap());
        for (i, ms) in [100, 300, 900].into_iter().enumerate() {
            let score = u32::try_from(i + 1).unwrap() * 10;
            assert!(!p
                .save_snapshot(snapshot(score), start + Duration::from_millis(ms))
                .unwrap());
        }
        assert_eq!(p.load_snapshot().unwrap(), Some(snapshot(0)));
        assert!(!p.flush(start + Duration::from_millis(999)).unwrap());
        assert!(p.flush(start + Duration::from_millis(1000)).unwrap());
        assert_eq!(p.load_snapshot().unwrap(), Some(snapshot(30)));
        assert!(!p.flush(start + Duration::from_millis(5000)).unwrap());
    }

    #[test]
    fn sync_ignores_rate_limit() {
        let mut p = Persistence::new(MemoryStore::new());
        let start = Instant::now();
        p.save_snapshot(snapshot(0), start).unwrap();
        p.save_snapshot(snapshot(10), start + Duration::from_millis(10))
            .unwrap();
        assert!(p.sync(start + Duration::from_millis(20)).unwrap());
        assert_eq!(p.load_snapshot().unwrap(), Some(snapshot(10)));
    }

    #[test]
    fn clear_drops_pending() {
        let mut p = Persistence::new(MemoryStore::new());
        let start = Instant::now();
        p.save_snapshot(snapshot(0), start).unwrap();
        p.save_snapshot(snapshot(10), start + Duration::from_millis(10))
            .unwrap();
        p.clear_snapshot().unwrap();
        assert!(!p.flush(start + Duration::from_secs(2)).unwrap());
        assert_eq!(p.load_snapshot().unwrap(), None);
    }

    #[test]
    fn write_failures_are_errors() {
        let mut p = Persistence::new(MemoryStore::read_only(HashMap::new()));
        let e = p.save_high_score(10).unwrap_err();
        assert_eq!(e.to_string(), "failed to save \"highScore\"");
        assert!(p.save_snapshot(snapshot(0), Instant::now()).is_err());
    }

    mod file_store {
        use super::*;
        use tempfile::tempdir;

        #[test]
        fn get_set_remove() {
            let tmp = tempdir().unwrap();
            let mut store = FileStore::new(tmp.path().join("data"));
            assert_eq!(store.get("settings").unwrap(), None);
            store.set("settings", "{}").unwrap();
            assert_eq!(store.get("settings").unwrap().as_deref(), Some("{}"));
            assert_eq!(
                fs_err::read_to_string(tmp.path().join("data").join("settings")).unwrap(),
                "{}"
            );
            store.remove("settings").unwrap();
            assert_eq!(store.get("settings").unwrap(), None);
            store.remove("settings").unwrap();
        }

        #[test]
        fn persistence_over_files() {
            let tmp = tempdir().unwrap();
            let mut p = Persistence::new(FileStore::new(tmp.path().to_path_buf()));
            p.save_high_score(70).unwrap();
            let p2 = Persistence::new(FileStore::new(tmp.path().to_path_buf()));
            assert_eq!(p2.load_high_score().unwrap(), 70);
        }
    }
}
