//! Durable store persisted as one JSON object on disk.
//!
//! The document maps store keys to string values. Every write rewrites the
//! whole document through a temporary sibling file followed by a rename, so a
//! crash mid-write leaves the previous document intact.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::warn;

use super::entry_size;
use crate::domain::ports::{DurableStore, DurableStoreError};

/// Default document name inside the store directory.
pub const DEFAULT_STORE_FILE_NAME: &str = "route-cache.json";

type Document = BTreeMap<String, String>;

/// File-backed store opened through a `cap_std` directory handle.
pub struct JsonFileDurableStore {
    directory: Dir,
    directory_path: PathBuf,
    file_name: String,
    temp_name: String,
    quota_bytes: Option<usize>,
    guard: Mutex<()>,
}

impl std::fmt::Debug for JsonFileDurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileDurableStore")
            .field("path", &self.document_path())
            .field("quota_bytes", &self.quota_bytes)
            .finish_non_exhaustive()
    }
}

impl JsonFileDurableStore {
    /// Open (creating if needed) `directory` and store entries in `file_name`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use itinerary_routing::outbound::storage::JsonFileDurableStore;
    ///
    /// let store = JsonFileDurableStore::open("/var/cache/itinerary", "route-cache.json")?;
    /// # Ok::<(), itinerary_routing::domain::ports::DurableStoreError>(())
    /// ```
    pub fn open(
        directory: impl AsRef<Path>,
        file_name: impl Into<String>,
    ) -> Result<Self, DurableStoreError> {
        let directory_path = directory.as_ref().to_path_buf();
        let file_name = file_name.into();
        if file_name.is_empty() || Path::new(&file_name).components().count() != 1 {
            return Err(DurableStoreError::unavailable(format!(
                "store file name must be a single path component, got {file_name:?}"
            )));
        }

        Dir::create_ambient_dir_all(&directory_path, ambient_authority())
            .map_err(|error| open_error(&directory_path, &error))?;
        let handle = Dir::open_ambient_dir(&directory_path, ambient_authority())
            .map_err(|error| open_error(&directory_path, &error))?;

        Ok(Self {
            directory: handle,
            directory_path,
            temp_name: format!(".{file_name}.tmp"),
            file_name,
            quota_bytes: None,
            guard: Mutex::new(()),
        })
    }

    /// Reject writes once keys and values together would exceed `quota_bytes`.
    #[must_use]
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Absolute path of the backing document.
    pub fn document_path(&self) -> PathBuf {
        self.directory_path.join(&self.file_name)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<Document, DurableStoreError> {
        let raw = match self.directory.read_to_string(&self.file_name) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(error) => return Err(self.io_error("read", &error)),
        };
        if raw.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&raw).map_err(|error| {
            DurableStoreError::unavailable(format!(
                "{} is not a JSON object of strings: {error}",
                self.document_path().display()
            ))
        })
    }

    /// Load the document for a write. An unreadable document is replaced.
    fn load_for_write(&self) -> Result<Document, DurableStoreError> {
        match self.load() {
            Err(DurableStoreError::Unavailable { message }) => {
                warn!(
                    path = %self.document_path().display(),
                    %message,
                    "resetting corrupt store document"
                );
                Ok(Document::new())
            }
            other => other,
        }
    }

    fn persist(&self, document: &Document) -> Result<(), DurableStoreError> {
        let encoded = serde_json::to_vec(document).map_err(|error| {
            DurableStoreError::io(format!("failed to encode store document: {error}"))
        })?;
        self.directory
            .write(&self.temp_name, &encoded)
            .map_err(|error| self.io_error("write", &error))?;
        self.directory
            .rename(&self.temp_name, &self.directory, &self.file_name)
            .map_err(|error| self.io_error("replace", &error))
    }

    fn check_quota(
        &self,
        document: &Document,
        key: &str,
        value: &str,
    ) -> Result<(), DurableStoreError> {
        let Some(quota) = self.quota_bytes else {
            return Ok(());
        };
        let used = document
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, stored)| entry_size(existing, stored))
            .sum::<usize>();
        let needed = used.saturating_add(entry_size(key, value));
        if needed > quota {
            return Err(DurableStoreError::quota_exceeded(format!(
                "writing {key} needs {needed} bytes, quota is {quota}"
            )));
        }
        Ok(())
    }

    fn io_error(&self, action: &str, error: &io::Error) -> DurableStoreError {
        DurableStoreError::io(format!(
            "failed to {action} {}: {error}",
            self.document_path().display()
        ))
    }
}

fn open_error(path: &Path, error: &io::Error) -> DurableStoreError {
    DurableStoreError::unavailable(format!("failed to open {}: {error}", path.display()))
}

#[async_trait]
impl DurableStore for JsonFileDurableStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DurableStoreError> {
        let _guard = self.lock();
        Ok(self.load()?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError> {
        let _guard = self.lock();
        let mut document = self.load_for_write()?;
        self.check_quota(&document, key, value)?;
        document.insert(key.to_owned(), value.to_owned());
        self.persist(&document)
    }

    async fn remove(&self, key: &str) -> Result<(), DurableStoreError> {
        let _guard = self.lock();
        let mut document = self.load()?;
        if document.remove(key).is_some() {
            self.persist(&document)?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, DurableStoreError> {
        let _guard = self.lock();
        Ok(self.load()?.into_keys().collect())
    }

    async fn entries_with_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, DurableStoreError> {
        let _guard = self.lock();
        Ok(self
            .load()?
            .into_iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Filesystem behaviour of the JSON document store.
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn open(dir: &TempDir) -> JsonFileDurableStore {
        JsonFileDurableStore::open(dir.path(), DEFAULT_STORE_FILE_NAME).expect("open store")
    }

    #[rstest]
    #[tokio::test]
    async fn values_survive_reopening(temp_dir: TempDir) {
        open(&temp_dir)
            .set("route-cache:v1:a", "{\"x\":1}")
            .await
            .expect("set");

        let reopened = open(&temp_dir);
        assert_eq!(
            reopened.get("route-cache:v1:a").await.expect("get"),
            Some("{\"x\":1}".to_owned())
        );
        assert_eq!(reopened.keys().await.expect("keys"), vec!["route-cache:v1:a"]);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_document_reads_as_empty(temp_dir: TempDir) {
        let store = open(&temp_dir);
        assert_eq!(store.get("absent").await.expect("get"), None);
        assert!(store.keys().await.expect("keys").is_empty());
        store.remove("absent").await.expect("remove");
    }

    #[rstest]
    #[tokio::test]
    async fn remove_deletes_only_the_named_key(temp_dir: TempDir) {
        let store = open(&temp_dir);
        store.set("a", "1").await.expect("set a");
        store.set("b", "2").await.expect("set b");
        store.remove("a").await.expect("remove");
        assert_eq!(store.keys().await.expect("keys"), vec!["b"]);
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_document_is_unavailable_until_rewritten(temp_dir: TempDir) {
        let store = open(&temp_dir);
        store
            .directory
            .write(DEFAULT_STORE_FILE_NAME, b"not json")
            .expect("seed corrupt document");

        let err = store.keys().await.expect_err("corrupt document");
        assert!(matches!(err, DurableStoreError::Unavailable { .. }));

        store.set("a", "1").await.expect("rewrite");
        assert_eq!(store.get("a").await.expect("get"), Some("1".to_owned()));
    }

    #[rstest]
    #[tokio::test]
    async fn entries_with_prefix_reads_the_namespace_in_one_pass(temp_dir: TempDir) {
        let store = open(&temp_dir);
        store.set("route-cache:v1:b", "2").await.expect("set b");
        store.set("route-cache:v1:a", "1").await.expect("set a");
        store.set("preferences:theme", "dark").await.expect("set theme");

        let entries = store
            .entries_with_prefix("route-cache:v1:")
            .await
            .expect("entries");
        assert_eq!(
            entries,
            vec![
                ("route-cache:v1:a".to_owned(), "1".to_owned()),
                ("route-cache:v1:b".to_owned(), "2".to_owned()),
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn quota_rejects_writes_without_touching_the_document(temp_dir: TempDir) {
        let store = open(&temp_dir).with_quota(8);
        store.set("a", "1234").await.expect("fits");
        let err = store.set("b", "12345").await.expect_err("over quota");
        assert!(matches!(err, DurableStoreError::QuotaExceeded { .. }));
        assert_eq!(store.keys().await.expect("keys"), vec!["a"]);
    }

    #[rstest]
    #[case::empty("")]
    #[case::nested("nested/route-cache.json")]
    fn rejects_file_names_that_are_not_one_component(temp_dir: TempDir, #[case] name: &str) {
        let err = JsonFileDurableStore::open(temp_dir.path(), name).expect_err("bad name");
        assert!(matches!(err, DurableStoreError::Unavailable { .. }));
    }
}
