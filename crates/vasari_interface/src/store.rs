//! Filesystem-backed session store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vasari_error::{SessionError, SessionErrorKind, VasariResult};

use crate::traits::SessionStore;

/// Stores session blobs as files under a base directory.
///
/// Writes go through a temp file and an atomic rename so a crashed save
/// never leaves a half-written session behind.
pub struct FileSystemSessionStore {
    base_path: PathBuf,
}

impl FileSystemSessionStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> VasariResult<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            SessionError::new(SessionErrorKind::StoreFailed(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;
        tracing::info!(path = %base_path.display(), "Created filesystem session store");
        Ok(Self { base_path })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        // Session ids are UUIDs; reject anything that could escape the root.
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe}.json"))
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl SessionStore for FileSystemSessionStore {
    #[tracing::instrument(skip(self, blob), fields(size = blob.len()))]
    async fn save(&self, id: &str, blob: &[u8]) -> VasariResult<()> {
        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, blob).await.map_err(|e| {
            SessionError::new(SessionErrorKind::StoreFailed(format!(
                "{}: {}",
                tmp.display(),
                e
            )))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            SessionError::new(SessionErrorKind::StoreFailed(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        tracing::debug!(path = %path.display(), "Saved session blob");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn load(&self, id: &str) -> VasariResult<Option<Vec<u8>>> {
        let path = self.path_for(id);
        match tokio::fs::read(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::new(SessionErrorKind::StoreFailed(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemSessionStore::new(dir.path()).unwrap();
        store.save("abc-123", b"payload").await.unwrap();
        let loaded = store.load("abc-123").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"payload".as_slice()));
    }

    #[tokio::test]
    async fn missing_id_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemSessionStore::new(dir.path()).unwrap();
        assert!(store.load("nothing-here").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn path_separators_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemSessionStore::new(dir.path()).unwrap();
        store.save("../evil", b"x").await.unwrap();
        assert!(store.load("../evil").await.unwrap().is_some());
        assert!(dir.path().join("___evil.json").exists());
    }
}
