//! Persistent key-value store for catalog, config, watchlist and favorites.
//!
//! Values are JSON strings keyed by [`StorageKey`]. A missing key is a valid
//! empty state, not an error. Writes go through [`PersistentStore`], which
//! applies them behind the caller's back on a single writer task: in-memory
//! state is always ahead of disk, and write failures are logged and dropped.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Keys understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    ApiConfig,
    LiveCategories,
    VodCategories,
    SeriesCategories,
    LiveStreams,
    VodStreams,
    SeriesStreams,
    Watchlist,
    Favorites,
}

impl StorageKey {
    pub const ALL: [StorageKey; 9] = [
        StorageKey::ApiConfig,
        StorageKey::LiveCategories,
        StorageKey::VodCategories,
        StorageKey::SeriesCategories,
        StorageKey::LiveStreams,
        StorageKey::VodStreams,
        StorageKey::SeriesStreams,
        StorageKey::Watchlist,
        StorageKey::Favorites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::ApiConfig => "apiConfig",
            StorageKey::LiveCategories => "liveCategories",
            StorageKey::VodCategories => "vodCategories",
            StorageKey::SeriesCategories => "seriesCategories",
            StorageKey::LiveStreams => "liveStreams",
            StorageKey::VodStreams => "vodStreams",
            StorageKey::SeriesStreams => "seriesStreams",
            StorageKey::Watchlist => "watchlist",
            StorageKey::Favorites => "favorites",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage writer is no longer running")]
    WriterClosed,
}

/// Durable string-keyed storage backend
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: StorageKey, value: String) -> Result<(), StoreError>;
    /// Remove every known key
    async fn clear(&self) -> Result<(), StoreError>;
}

// ============================================================================
// File backend
// ============================================================================

/// One `<key>.json` file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create the store, creating the directory if needed
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    fn tmp_path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", key.as_str()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: StorageKey, value: String) -> Result<(), StoreError> {
        let path = self.path(key);
        let tmp_path = self.tmp_path(key);

        let mut file = File::create(&tmp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        // Atomic replace to avoid readers seeing partial writes
        let _ = fs::remove_file(&path).await;
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        for key in StorageKey::ALL {
            match fs::remove_file(self.path(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

// ============================================================================
// Memory backend
// ============================================================================

/// In-process backend, nothing survives the process
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

// ============================================================================
// Write-behind front
// ============================================================================

enum WriteOp {
    Set(StorageKey, String),
    Clear(oneshot::Sender<Result<(), StoreError>>),
    Flush(oneshot::Sender<()>),
}

/// Typed, write-behind handle over a [`KeyValueStore`].
///
/// `persist` returns as soon as the value is serialized; the write itself is
/// queued to a background task that applies operations in enqueue order.
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn KeyValueStore>,
    writer: mpsc::UnboundedSender<WriteOp>,
}

impl PersistentStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (writer, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(backend.clone(), queue));
        Self { backend, writer }
    }

    /// Read and decode a key. Missing, unreadable and corrupt values all come
    /// back as `None`; the latter two are logged.
    pub async fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        // Read our own queued writes
        self.flush().await;

        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No persisted value for {}", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read persisted {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding corrupt persisted {}: {}", key, e);
                None
            }
        }
    }

    /// Serialize now, write later. Failures are logged, never returned.
    pub fn persist<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to serialize {} for storage: {}", key, e);
                return;
            }
        };

        if self.writer.send(WriteOp::Set(key, serialized)).is_err() {
            tracing::warn!("Dropped write to {}: storage writer stopped", key);
        }
    }

    /// Wait until every write queued so far has been applied
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.writer.send(WriteOp::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Remove every key, after any writes already queued
    pub async fn clear(&self) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.writer
            .send(WriteOp::Clear(tx))
            .map_err(|_| StoreError::WriterClosed)?;
        rx.await.map_err(|_| StoreError::WriterClosed)?
    }
}

async fn run_writer(backend: Arc<dyn KeyValueStore>, mut queue: mpsc::UnboundedReceiver<WriteOp>) {
    while let Some(op) = queue.recv().await {
        match op {
            WriteOp::Set(key, value) => {
                if let Err(e) = backend.set(key, value).await {
                    tracing::warn!("Failed to persist {}: {}", key, e);
                }
            }
            WriteOp::Clear(reply) => {
                let _ = reply.send(backend.clear().await);
            }
            WriteOp::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
    tracing::debug!("Storage writer stopped");
}
