//! Session-scoped storage for resolved release info.
//!
//! Entries never expire. A stored value is trusted until the
//! session store itself goes away.

use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use cached::{Cached, UnboundCache};
use log::{debug, trace, warn};
use tempfile::NamedTempFile;

use crate::{error::CacheError, release::ReleaseInfo};

/// The cache key for an application repository and image tag.
#[must_use]
pub fn cache_key(app_repository: &str, image_tag: &str) -> String {
    format!("{app_repository}-{image_tag}")
}

/// A string key-value store that lives as long as a session.
pub trait SessionStore: Send + Sync {
    /// # Errors
    /// Will error if the backing storage can't be read.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// # Errors
    /// Will error if the backing storage can't be written.
    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
}

impl<T> SessionStore for Arc<T>
where
    T: SessionStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        (**self).set(key, value)
    }
}

impl<T> SessionStore for Box<T>
where
    T: SessionStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        (**self).set(key, value)
    }
}

/// Keeps entries for the life of the process.
pub struct MemoryStore {
    entries: Mutex<UnboundCache<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(UnboundCache::new()),
        }
    }

    /// # Panics
    /// Panics if the store's mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("Should lock store").cache_size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .finish()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .lock()
            .expect("Should lock store")
            .cache_get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries
            .lock()
            .expect("Should lock store")
            .cache_set(key.to_string(), value);
        Ok(())
    }
}

/// Keeps entries in a JSON file so separate invocations
/// pointed at the same file share a session.
///
/// Every write replaces the file with a rename, so readers in other
/// processes always see a complete file. Concurrent writers can still
/// drop each other's newest entry, which only costs a refetch.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, CacheError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| CacheError::FileFormat {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("Session file {} doesn't exist yet", self.path.display());
                Ok(BTreeMap::new())
            }
            Err(source) => Err(CacheError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let _guard = self.lock.lock().expect("Should lock session file");
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let _guard = self.lock.lock().expect("Should lock session file");

        let mut entries = self.read_entries().unwrap_or_else(|e| {
            warn!("{e}, starting a new session");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value);

        let contents =
            serde_json::to_string_pretty(&entries).map_err(|source| CacheError::Serialize {
                key: key.to_string(),
                source,
            })?;
        self.replace_file(contents.as_bytes())
    }
}

impl FileStore {
    fn replace_file(&self, contents: &[u8]) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(contents).map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;
        trace!("Replaced session file {}", self.path.display());

        Ok(())
    }
}

/// Stores normalized [`ReleaseInfo`] in a [`SessionStore`].
#[derive(Debug)]
pub struct ReleaseCache<S> {
    store: Arc<S>,
}

impl<S> Clone for ReleaseCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ReleaseCache<S>
where
    S: SessionStore,
{
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// # Errors
    /// Will error if the store can't be read or the
    /// stored value doesn't deserialize.
    pub fn get(&self, key: &str) -> Result<Option<ReleaseInfo>, CacheError> {
        let Some(raw) = self.store.get(key)? else {
            debug!("Cache miss for key: {key}");
            return Ok(None);
        };

        let info = serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        debug!("Cache hit for key: {key}");

        Ok(Some(info))
    }

    /// # Errors
    /// Will error if the store can't be written.
    pub fn put(&self, key: &str, info: &ReleaseInfo) -> Result<(), CacheError> {
        let raw = serde_json::to_string(info).map_err(|source| CacheError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, raw)?;
        debug!("Cached release info for key: {key}");

        Ok(())
    }
}

impl<S> ReleaseCache<S>
where
    S: SessionStore + 'static,
{
    /// Runs [`Self::get`] on the blocking pool since
    /// a store may do file I/O.
    ///
    /// # Errors
    /// Same as [`Self::get`], or if the blocking task panicked.
    pub async fn load(&self, key: &str) -> Result<Option<ReleaseInfo>, CacheError> {
        let cache = self.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || cache.get(&key))
            .await
            .map_err(CacheError::Task)?
    }

    /// Runs [`Self::put`] on the blocking pool.
    ///
    /// # Errors
    /// Same as [`Self::put`], or if the blocking task panicked.
    pub async fn save(&self, key: &str, info: &ReleaseInfo) -> Result<(), CacheError> {
        let cache = self.clone();
        let key = key.to_string();
        let info = info.clone();

        tokio::task::spawn_blocking(move || cache.put(&key, &info))
            .await
            .map_err(CacheError::Task)?
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::release::ReleaseEntity;

    use super::*;

    fn info() -> ReleaseInfo {
        ReleaseInfo {
            current: Some(ReleaseEntity {
                git_ref: Some("v2.0".into()),
                author: Some("alice".into()),
                ..Default::default()
            }),
            latest: None,
        }
    }

    #[test]
    fn key_format() {
        assert_eq!(cache_key("org/repo", "1.2.3"), "org/repo-1.2.3");
    }

    #[test]
    fn memory_round_trip() {
        let cache = ReleaseCache::new(MemoryStore::new());

        assert_eq!(cache.get("org/repo-1.2.3").unwrap(), None);
        cache.put("org/repo-1.2.3", &info()).unwrap();

        assert_eq!(cache.get("org/repo-1.2.3").unwrap(), Some(info()));
        assert_eq!(cache.store().len(), 1);
    }

    #[test]
    fn corrupt_entry() {
        let store = MemoryStore::new();
        store.set("org/repo-1.2.3", "{not json".into()).unwrap();
        let cache = ReleaseCache::new(store);

        assert!(matches!(
            cache.get("org/repo-1.2.3"),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn file_store_shares_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        ReleaseCache::new(FileStore::new(&path))
            .put("org/repo-1.2.3", &info())
            .unwrap();

        let cache = ReleaseCache::new(FileStore::new(&path));
        assert_eq!(cache.get("org/repo-1.2.3").unwrap(), Some(info()));
        assert_eq!(cache.get("org/repo-2.0.0").unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_from_async() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReleaseCache::new(FileStore::new(dir.path().join("session.json")));

        assert_eq!(cache.load("org/repo-1.2.3").await.unwrap(), None);
        cache.save("org/repo-1.2.3", &info()).await.unwrap();

        assert_eq!(cache.load("org/repo-1.2.3").await.unwrap(), Some(info()));
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));

        assert_eq!(store.get("org/repo-1.2.3").unwrap(), None);
    }

    #[test]
    fn file_store_concurrent_writers_keep_file_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let path = &path;
                scope.spawn(move || {
                    let store = FileStore::new(path);
                    for entry in 0..25 {
                        store
                            .set(&format!("org/repo-{writer}.{entry}"), "{}".into())
                            .unwrap();
                    }
                });
            }
        });

        let entries = FileStore::new(&path).read_entries().unwrap();
        assert!(!entries.is_empty());
        assert!(entries.values().all(|value| value == "{}"));
    }

    #[test]
    fn file_store_recovers_from_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();
        let store = FileStore::new(&path);

        assert!(matches!(
            store.get("org/repo-1.2.3"),
            Err(CacheError::FileFormat { .. })
        ));

        store.set("org/repo-1.2.3", "{}".into()).unwrap();
        assert_eq!(store.get("org/repo-1.2.3").unwrap().as_deref(), Some("{}"));
    }
}
