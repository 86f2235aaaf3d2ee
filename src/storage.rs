use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "wrote key");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::JournalError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory store whose writes can be made to fail.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub values: Mutex<HashMap<String, String>>,
        pub fail_writes: AtomicBool,
    }

    impl MemoryStore {
        pub(crate) fn value(&self, key: &str) -> Option<String> {
            self.values.lock().expect("lock").get(key).cloned()
        }

        pub(crate) fn set_failing(&self, failing: bool) {
            self.fail_writes.store(failing, Ordering::SeqCst);
        }

        fn check_writable(&self) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(JournalError::persistence("disk full"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.value(key))
        }

        async fn set(&self, key: &str, value: String) -> Result<()> {
            self.check_writable()?;
            self.values
                .lock()
                .expect("lock")
                .insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.check_writable()?;
            self.values.lock().expect("lock").remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn file_store_round_trips_and_removes() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("entries").await.unwrap(), None);

        store.set("entries", "[]".to_string()).await.unwrap();
        assert_eq!(store.get("entries").await.unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested/entries.json").exists());
        assert!(!dir.path().join("nested/entries.json.tmp").exists());

        store.set("entries", "[1]".to_string()).await.unwrap();
        assert_eq!(store.get("entries").await.unwrap().as_deref(), Some("[1]"));

        store.remove("entries").await.unwrap();
        assert_eq!(store.get("entries").await.unwrap(), None);
    }

    #[tokio::test]
    async fn removing_missing_key_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.remove("latestEntry").await.unwrap();
    }
}
