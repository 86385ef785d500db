use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::time::SystemTime;

use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use thiserror::Error;
use tokio::fs;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Directory entry snapshot used by the retention sweeper.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

/// Flat on-disk store rooted at a single scratch directory.
#[derive(Clone)]
pub struct DownloadStore {
    root: PathBuf,
}

impl DownloadStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(DownloadStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reduce a requested filename to its final path component.
    ///
    /// Directory components, `..` segments, and absolute prefixes are all
    /// stripped; a request that has no usable final component is rejected.
    pub fn sanitize(name: &str) -> StorageResult<String> {
        if name.is_empty() || name.contains('\0') {
            return Err(StorageError::InvalidName(
                "Filename is empty or contains invalid characters".to_string(),
            ));
        }

        // Backslashes are separators on Windows clients; treat them the same.
        let normalized = name.replace('\\', "/");
        let file_name = Path::new(&normalized)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                StorageError::InvalidName("Filename has no usable component".to_string())
            })?;

        if file_name == "." || file_name == ".." {
            return Err(StorageError::InvalidName(
                "Filename has no usable component".to_string(),
            ));
        }

        Ok(file_name)
    }

    /// Resolve a requested filename against the storage root.
    ///
    /// The resolved path is guaranteed to be a direct child of the root.
    pub fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        let file_name = Self::sanitize(name)?;
        let path = self.root.join(&file_name);

        // The joined path must not gain components beyond root + filename.
        let suspicious = path
            .strip_prefix(&self.root)
            .map(|rest| {
                rest.components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            })
            .unwrap_or(true);
        if suspicious {
            return Err(StorageError::InvalidName(
                "Filename resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Create (truncate) a file for writing. Callers stream content in and
    /// are responsible for flushing.
    pub async fn create(&self, name: &str) -> StorageResult<fs::File> {
        let path = self.resolve(name)?;
        fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })
    }

    pub async fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.resolve(name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    /// Size in bytes of a stored file.
    pub async fn size(&self, name: &str) -> StorageResult<u64> {
        let path = self.resolve(name)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(name.to_string()))?;
        Ok(meta.len())
    }

    /// Open a stored file as a chunked byte stream.
    pub async fn read_stream(
        &self,
        name: &str,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
        let path = self.resolve(name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);
        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    /// Delete a stored file. A file that is already gone counts as success:
    /// the delivery gateway and the sweeper may race on the same name.
    pub async fn remove(&self, name: &str) -> StorageResult<()> {
        let path = self.resolve(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed stored file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Snapshot of every regular file under the root. A missing root yields
    /// an empty listing, not an error.
    pub async fn list(&self) -> StorageResult<Vec<StoredFile>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::IoError(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }

            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                modified,
            });
        }

        Ok(files)
    }

    /// First stored filename starting with `prefix`, if any. Used to recover
    /// a file whose final name was chosen by the extraction tool.
    pub async fn find_by_prefix(&self, prefix: &str) -> StorageResult<Option<String>> {
        let files = self.list().await?;
        Ok(files.into_iter().map(|f| f.name).find(|n| n.starts_with(prefix)))
    }

    /// Best-effort removal of every file starting with `prefix`. Returns the
    /// number of files removed; per-file failures are logged and skipped.
    pub async fn remove_by_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let files = self.list().await?;
        let mut removed = 0;
        for file in files.into_iter().filter(|f| f.name.starts_with(prefix)) {
            match self.remove(&file.name).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(error = %e, name = %file.name, "Failed to remove partial file");
                }
            }
        }
        Ok(removed)
    }
}
