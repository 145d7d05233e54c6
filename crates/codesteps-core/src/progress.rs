//! Solved-exercise persistence for one local installation.
//!
//! The solved set lives under a single well-known key as a JSON array of
//! positive integers. [`ProgressStore`] reads it leniently (anything unusable
//! is an empty set) and writes it synchronously on every mutation, so a crash
//! loses at most the mutation in flight.
//!
//! Storage is injected through [`ProgressBackend`]: [`FileBackend`] for real
//! sessions, [`MemoryBackend`] for tests.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::catalog::{coerce_id, ExerciseId};
use crate::error::{CodestepsError, Result};

/// Key under which the solved set is persisted.
pub const SOLVED_KEY: &str = "codesteps_solved_exercise_ids_v1";

// ============================================================================
// SolvedSet
// ============================================================================

/// Ids of the exercises the learner has solved.
///
/// Only positive ids are ever stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SolvedSet(BTreeSet<ExerciseId>);

impl SolvedSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns `true` if the exercise is solved.
    #[must_use]
    pub fn contains(&self, id: ExerciseId) -> bool {
        self.0.contains(&id)
    }

    /// Adds an id. Returns `false` if it was already present or is `0`.
    pub fn insert(&mut self, id: ExerciseId) -> bool {
        id != 0 && self.0.insert(id)
    }

    /// Number of solved ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is solved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ExerciseId> + '_ {
        self.0.iter().copied()
    }

    /// Parses a persisted record.
    ///
    /// Returns `None` if the text is not a JSON array. Elements that do not
    /// coerce to a positive integer are dropped.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => Some(items.iter().map(|v| coerce_id(Some(v))).collect()),
            _ => None,
        }
    }
}

impl FromIterator<ExerciseId> for SolvedSet {
    fn from_iter<I: IntoIterator<Item = ExerciseId>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|id| *id > 0).collect())
    }
}

// ============================================================================
// Backends
// ============================================================================

/// Key/value storage the progress store persists through.
pub trait ProgressBackend {
    /// Reads the value stored under `key`, or `None` if there is none.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Durably stores `value` under `key` before returning.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with one raw entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self { entries }
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl ProgressBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File backend: one `<key>.json` file per key inside a data directory.
///
/// Writes go to a temporary sibling, are synced, then renamed over the
/// record, so the record is always either the old or the new content.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path used for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ProgressBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CodestepsError::Io(e)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        let to_error = |e: std::io::Error| CodestepsError::progress_write(&path, e.to_string());

        std::fs::create_dir_all(&self.dir).map_err(to_error)?;

        let mut file = std::fs::File::create(&tmp_path).map_err(to_error)?;
        file.write_all(value.as_bytes()).map_err(to_error)?;
        file.sync_all().map_err(to_error)?;
        drop(file);

        std::fs::rename(&tmp_path, &path).map_err(to_error)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CodestepsError::progress_write(&path, e.to_string())),
        }
    }
}

// ============================================================================
// ProgressStore
// ============================================================================

/// The learner's persisted progress.
#[derive(Debug, Clone)]
pub struct ProgressStore<B> {
    backend: B,
}

impl ProgressStore<FileBackend> {
    /// Opens a file-backed store in `dir`.
    #[must_use]
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }
}

impl<B: ProgressBackend> ProgressStore<B> {
    /// Wraps a backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads the solved set.
    ///
    /// Never fails: a missing, unreadable or corrupt record is an empty set.
    pub fn load(&self) -> SolvedSet {
        let raw = match self.backend.read(SOLVED_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SolvedSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read progress; starting empty");
                return SolvedSet::new();
            }
        };

        SolvedSet::from_json(&raw).unwrap_or_else(|| {
            tracing::warn!("Progress record is not a JSON array; starting empty");
            SolvedSet::new()
        })
    }

    /// Marks an exercise solved and persists the set before returning.
    ///
    /// Idempotent. Returns `true` if the id was newly added; id `0` is
    /// ignored.
    ///
    /// A record that is not a JSON array is replaced by a fresh set. A
    /// record that cannot be read at all is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot read or persist the record.
    pub fn mark_solved(&mut self, id: ExerciseId) -> Result<bool> {
        if id == 0 {
            tracing::debug!("Ignoring mark_solved for id 0");
            return Ok(false);
        }

        let mut solved = match self.backend.read(SOLVED_KEY)? {
            Some(raw) => SolvedSet::from_json(&raw).unwrap_or_else(|| {
                tracing::warn!("Progress record is not a JSON array; replacing it");
                SolvedSet::new()
            }),
            None => SolvedSet::new(),
        };
        if !solved.insert(id) {
            return Ok(false);
        }

        let record = serde_json::to_string(&solved)?;
        self.backend.write(SOLVED_KEY, &record)?;
        tracing::info!(exercise_id = id, solved = solved.len(), "Exercise marked solved");
        Ok(true)
    }

    /// Clears all progress by removing the persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot remove the record.
    pub fn reset(&mut self) -> Result<()> {
        self.backend.remove(SOLVED_KEY)?;
        tracing::info!("Progress reset");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn memory_store() -> ProgressStore<MemoryBackend> {
        ProgressStore::new(MemoryBackend::new())
    }

    fn ids(set: &SolvedSet) -> Vec<ExerciseId> {
        set.iter().collect()
    }

    // ------------------------------------------------------------------------
    // SolvedSet tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_solved_set_rejects_zero() {
        let mut set = SolvedSet::new();
        assert!(!set.insert(0));
        assert!(set.insert(3));
        assert!(!set.insert(3));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_solved_set_from_json_coerces_elements() {
        let set = SolvedSet::from_json(r#"[3, "7", -2, 0, "x", 4.0, null, 3]"#).unwrap();
        assert_eq!(ids(&set), vec![3, 4, 7]);
    }

    #[test]
    fn test_solved_set_from_json_rejects_non_arrays() {
        assert!(SolvedSet::from_json(r#"{"ids": [1]}"#).is_none());
        assert!(SolvedSet::from_json("12").is_none());
        assert!(SolvedSet::from_json("[1, 2").is_none());
    }

    #[test]
    fn test_solved_set_serializes_as_array() {
        let set: SolvedSet = [5, 1, 3].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,3,5]");
    }

    // ------------------------------------------------------------------------
    // ProgressStore over MemoryBackend
    // ------------------------------------------------------------------------

    #[test]
    fn test_load_missing_is_empty() {
        assert!(memory_store().load().is_empty());
    }

    #[test]
    fn test_mark_solved_persists() {
        let mut store = memory_store();
        assert!(store.mark_solved(4).unwrap());
        assert!(store.mark_solved(2).unwrap());

        assert_eq!(ids(&store.load()), vec![2, 4]);
        assert_eq!(store.backend().raw(SOLVED_KEY), Some("[2,4]"));
    }

    #[test]
    fn test_mark_solved_is_idempotent() {
        let mut once = memory_store();
        once.mark_solved(9).unwrap();

        let mut twice = memory_store();
        assert!(twice.mark_solved(9).unwrap());
        assert!(!twice.mark_solved(9).unwrap());

        assert_eq!(once.load(), twice.load());
        assert_eq!(once.backend().raw(SOLVED_KEY), twice.backend().raw(SOLVED_KEY));
    }

    #[test]
    fn test_mark_solved_ignores_zero() {
        let mut store = memory_store();
        assert!(!store.mark_solved(0).unwrap());
        assert!(store.backend().raw(SOLVED_KEY).is_none());
    }

    #[test]
    fn test_reset_removes_record() {
        let mut store = memory_store();
        store.mark_solved(1).unwrap();
        store.reset().unwrap();

        assert!(store.load().is_empty());
        assert!(store.backend().raw(SOLVED_KEY).is_none());
    }

    #[test]
    fn test_corrupt_record_loads_empty() {
        let store = ProgressStore::new(MemoryBackend::with_entry(SOLVED_KEY, "{{not json"));
        assert!(store.load().is_empty());

        let store = ProgressStore::new(MemoryBackend::with_entry(SOLVED_KEY, r#""[1,2]""#));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_mark_solved_over_corrupt_record_starts_fresh() {
        let mut store = ProgressStore::new(MemoryBackend::with_entry(SOLVED_KEY, "garbage"));
        store.mark_solved(5).unwrap();
        assert_eq!(ids(&store.load()), vec![5]);
    }

    /// Memory backend whose next `failing_reads` reads return an I/O error.
    struct FlakyBackend {
        inner: MemoryBackend,
        failing_reads: Cell<u32>,
    }

    impl ProgressBackend for FlakyBackend {
        fn read(&self, key: &str) -> Result<Option<String>> {
            let left = self.failing_reads.get();
            if left > 0 {
                self.failing_reads.set(left - 1);
                return Err(std::io::Error::other("disk unavailable").into());
            }
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<()> {
            self.inner.write(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_mark_solved_keeps_record_on_read_error() {
        let mut store = ProgressStore::new(FlakyBackend {
            inner: MemoryBackend::with_entry(SOLVED_KEY, "[1,2,3]"),
            failing_reads: Cell::new(1),
        });

        let err = store.mark_solved(4).unwrap_err();
        assert!(matches!(err, CodestepsError::Io(_)));
        assert_eq!(store.backend().inner.raw(SOLVED_KEY), Some("[1,2,3]"));

        // Once reads work again the id is added on top of earlier progress
        assert!(store.mark_solved(4).unwrap());
        assert_eq!(store.backend().inner.raw(SOLVED_KEY), Some("[1,2,3,4]"));
    }

    #[test]
    fn test_load_swallows_read_error() {
        let store = ProgressStore::new(FlakyBackend {
            inner: MemoryBackend::with_entry(SOLVED_KEY, "[1]"),
            failing_reads: Cell::new(1),
        });
        assert!(store.load().is_empty());
        assert_eq!(ids(&store.load()), vec![1]);
    }

    // ------------------------------------------------------------------------
    // FileBackend
    // ------------------------------------------------------------------------

    fn temp_data_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = temp_data_dir("codesteps_test_progress_roundtrip");
        let mut store = ProgressStore::open(&dir);

        assert!(store.load().is_empty());
        store.mark_solved(1).unwrap();
        store.mark_solved(3).unwrap();

        // A fresh store over the same directory sees the same progress.
        let reopened = ProgressStore::open(&dir);
        assert_eq!(ids(&reopened.load()), vec![1, 3]);

        let contents = std::fs::read_to_string(dir.join(format!("{SOLVED_KEY}.json"))).unwrap();
        assert_eq!(contents, "[1,3]");
        assert!(!dir.join(format!(".{SOLVED_KEY}.json.tmp")).exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_store_reset_removes_file() {
        let dir = temp_data_dir("codesteps_test_progress_reset");
        let mut store = ProgressStore::open(&dir);
        store.mark_solved(2).unwrap();

        store.reset().unwrap();
        assert!(!store.backend().path_for(SOLVED_KEY).exists());
        assert!(store.load().is_empty());

        // Resetting again is fine.
        store.reset().unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_store_corrupt_file_loads_empty() {
        let dir = temp_data_dir("codesteps_test_progress_corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{SOLVED_KEY}.json")), [0xFF, 0xFE, 0x00]).unwrap();

        let store = ProgressStore::open(&dir);
        assert!(store.load().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
