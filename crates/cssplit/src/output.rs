//! Fragment persistence.
//!
//! Files are written through a [`StorageWriter`]. [`FsStorage`] writes each
//! file to a temporary file in the destination directory and renames it into
//! place, so readers never observe a partial file. [`MemoryStorage`] keeps
//! everything in memory for tests and dry runs.
//!
//! [`persist_all`] writes a set of files concurrently and either all of them
//! end up written or the run fails and every file it touched is put back the
//! way it was: restored when it existed before, removed otherwise.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;

use cssplit_core::logging::targets;

use crate::error::{Error, Result};

/// Destination for generated files.
pub trait StorageWriter: Send + Sync {
    /// Write `contents` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Current contents of `path`, or `None` if there is no such file.
    fn read(&self, path: &Path) -> io::Result<Option<String>>;

    /// Remove a file written earlier.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Writes to the local file system, atomically per file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl StorageWriter for FsStorage {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Same directory as the target so the rename stays on one filesystem.
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read(&self, path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Keeps written files in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents written to `path`, if any.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    /// Every written path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    /// Number of files held.
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl StorageWriter for MemoryStorage {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.files
            .lock()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn read(&self, path: &Path) -> io::Result<Option<String>> {
        Ok(self.get(path))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// A file to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    /// Create an artifact.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Write every artifact concurrently on the blocking pool.
///
/// Returns the written paths in artifact order. On the first failure the
/// remaining writes are awaited, every file this call wrote is rolled back
/// (previous contents restored, new files removed) and the failure is
/// returned as [`Error::Persistence`].
pub async fn persist_all(
    storage: Arc<dyn StorageWriter>,
    artifacts: Vec<Artifact>,
) -> Result<Vec<PathBuf>> {
    let mut tasks = JoinSet::new();
    for (order, artifact) in artifacts.into_iter().enumerate() {
        let storage = Arc::clone(&storage);
        tasks.spawn_blocking(move || {
            let result = storage.read(&artifact.path).and_then(|previous| {
                storage.write(&artifact.path, &artifact.contents)?;
                Ok(previous)
            });
            (order, artifact.path, result)
        });
    }

    let mut written = Vec::new();
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((order, path, Ok(previous))) => {
                tracing::debug!(target: targets::OUTPUT, path = %path.display(), "wrote file");
                written.push((order, path, previous));
            }
            Ok((_, path, Err(source))) => {
                failure.get_or_insert(Error::Persistence { path, source });
            }
            Err(join_error) => {
                failure.get_or_insert(Error::Io(io::Error::other(join_error)));
            }
        }
    }

    written.sort_by_key(|(order, ..)| *order);

    let Some(error) = failure else {
        return Ok(written.into_iter().map(|(_, path, _)| path).collect());
    };

    for (_, path, previous) in &written {
        let rollback = match previous {
            Some(contents) => storage.write(path, contents),
            None => storage.remove(path),
        };
        if let Err(e) = rollback {
            tracing::warn!(
                target: targets::OUTPUT,
                path = %path.display(),
                "failed to roll back written file: {e}"
            );
        }
    }
    Err(error)
}

/// Path of the source map written next to `css_path` (`<css_path>.map`).
pub fn map_path(css_path: &Path) -> PathBuf {
    let mut path = css_path.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Memory storage that refuses one path.
    struct Refusing {
        inner: MemoryStorage,
        refused: PathBuf,
    }

    impl StorageWriter for Refusing {
        fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
            if path == self.refused {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "refused"));
            }
            self.inner.write(path, contents)
        }

        fn read(&self, path: &Path) -> io::Result<Option<String>> {
            self.inner.read(path)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            self.inner.remove(path)
        }
    }

    #[test]
    fn fs_storage_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.css");

        FsStorage.write(&path, "a {}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a {}\n");

        FsStorage.write(&path, "b {}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "b {}\n");

        FsStorage.remove(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn map_path_appends_extension() {
        assert_eq!(map_path(Path::new("dist/app-0.css")), PathBuf::from("dist/app-0.css.map"));
    }

    #[tokio::test]
    async fn persist_all_writes_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let artifacts = (0..8)
            .map(|i| Artifact::new(format!("out-{i}.css"), format!("a{i} {{}}")))
            .collect();

        let written = persist_all(storage.clone(), artifacts).await.unwrap();

        assert_eq!(written.len(), 8);
        assert_eq!(storage.len(), 8);
        assert_eq!(storage.get("out-3.css").as_deref(), Some("a3 {}"));
    }

    #[tokio::test]
    async fn persist_all_rolls_back_on_failure() {
        let storage = Arc::new(Refusing {
            inner: MemoryStorage::new(),
            refused: PathBuf::from("out-2.css"),
        });
        let artifacts = (0..5)
            .map(|i| Artifact::new(format!("out-{i}.css"), "x {}"))
            .collect();

        let result = persist_all(storage.clone(), artifacts).await;

        match result {
            Err(Error::Persistence { path, .. }) => assert_eq!(path, PathBuf::from("out-2.css")),
            other => panic!("expected persistence failure, got {other:?}"),
        }
        assert!(storage.inner.is_empty());
    }

    #[tokio::test]
    async fn rollback_restores_previous_contents() {
        let storage = Arc::new(Refusing {
            inner: MemoryStorage::new(),
            refused: PathBuf::from("out-1.css"),
        });
        storage.inner.write(Path::new("out-0.css"), "old {}").unwrap();

        let artifacts = vec![
            Artifact::new("out-0.css", "new {}"),
            Artifact::new("out-1.css", "x {}"),
        ];
        let result = persist_all(storage.clone(), artifacts).await;

        assert!(matches!(result, Err(Error::Persistence { .. })));
        assert_eq!(storage.inner.get("out-0.css").as_deref(), Some("old {}"));
        assert_eq!(storage.inner.len(), 1);
    }

    #[test]
    fn fs_storage_reads_missing_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.css");

        assert_eq!(FsStorage.read(&path).unwrap(), None);
        FsStorage.write(&path, "a {}").unwrap();
        assert_eq!(FsStorage.read(&path).unwrap().as_deref(), Some("a {}"));
    }
}
