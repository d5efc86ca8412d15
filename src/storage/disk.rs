//! Persistent bucket storage on the local filesystem
//!
//! Buckets survive process restarts. Every file is written to a temporary
//! name and renamed into place, so readers never observe a torn write.
//! Index updates and entry writes hold an exclusive advisory lock
//! (`index.lock`, `<bucket>/.lock`), which also serializes separate
//! processes sharing one root. Concurrent writers to the same key take
//! turns: the last one wins.

use super::{ensure_storable, Bucket, CacheStorage, StoredEntry};
use crate::error::{CacheError, CacheResult};
use crate::http::{RequestDescriptor, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

const INDEX_FILE: &str = "index.json";
const INDEX_LOCK_FILE: &str = "index.lock";
const BUCKET_LOCK_FILE: &str = ".lock";

/// Hex SHA-256 digest, used for file and directory names
fn digest(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Write `content` to `path` via a uniquely named temporary file
async fn write_atomic(path: &Path, content: &[u8]) -> CacheResult<()> {
    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, content)
        .await
        .map_err(|e| CacheError::io(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| CacheError::io(format!("renaming into {}", path.display()), e))
}

/// Remove a file, treating "already gone" as success
async fn remove_if_exists(path: &Path) -> CacheResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(format!("removing {}", path.display()), e)),
    }
}

/// Exclusive advisory lock on a file, released when dropped
struct FileLease {
    _file: std::fs::File,
}

impl FileLease {
    async fn acquire(path: PathBuf) -> CacheResult<Self> {
        let context = format!("locking {}", path.display());
        let file = tokio::task::spawn_blocking(move || {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.lock_exclusive()?;
            Ok::<_, std::io::Error>(file)
        })
        .await
        .map_err(|e| CacheError::Internal(format!("lock task failed: {}", e)))?
        .map_err(|e| CacheError::io(context, e))?;

        Ok(Self { _file: file })
    }
}

/// Held across an index read-modify-write cycle
struct IndexGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _lease: FileLease,
}

/// One bucket in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRecord {
    name: String,
    dir: String,
    created_at: DateTime<Utc>,
}

/// Filesystem-backed [`CacheStorage`]
pub struct DiskStorage {
    root: PathBuf,
    // Keeps tasks of this process from queueing on the file lock
    index_lock: Mutex<()>,
}

impl DiskStorage {
    /// Open (creating if needed) a storage rooted at `root`
    pub async fn open_root(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| CacheError::io(format!("creating storage root {}", root.display()), e))?;

        Ok(Self {
            root,
            index_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn lock_index(&self) -> CacheResult<IndexGuard<'_>> {
        let local = self.index_lock.lock().await;
        let lease = FileLease::acquire(self.root.join(INDEX_LOCK_FILE)).await?;
        Ok(IndexGuard {
            _local: local,
            _lease: lease,
        })
    }

    async fn read_index(&self) -> CacheResult<Vec<IndexRecord>> {
        let path = self.root.join(INDEX_FILE);
        match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CacheError::storage(format!("corrupt bucket index {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(CacheError::io(format!("reading {}", path.display()), e)),
        }
    }

    async fn write_index(&self, records: &[IndexRecord]) -> CacheResult<()> {
        let content = serde_json::to_vec_pretty(records)?;
        write_atomic(&self.root.join(INDEX_FILE), &content).await
    }

    fn bucket_for(&self, record: &IndexRecord) -> Arc<DiskBucket> {
        Arc::new(DiskBucket {
            name: record.name.clone(),
            dir: self.root.join(&record.dir),
        })
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn Bucket>> {
        let _guard = self.lock_index().await?;
        let mut records = self.read_index().await?;

        if let Some(record) = records.iter().find(|r| r.name == name) {
            return Ok(self.bucket_for(record));
        }

        let record = IndexRecord {
            name: name.to_string(),
            dir: digest(name),
            created_at: Utc::now(),
        };
        let dir = self.root.join(&record.dir);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io(format!("creating bucket {}", dir.display()), e))?;

        records.push(record.clone());
        self.write_index(&records).await?;
        debug!("Created bucket {} at {}", name, dir.display());

        Ok(self.bucket_for(&record))
    }

    async fn open_existing(&self, name: &str) -> CacheResult<Option<Arc<dyn Bucket>>> {
        let records = self.read_index().await?;
        Ok(records
            .iter()
            .find(|r| r.name == name)
            .map(|r| self.bucket_for(r) as Arc<dyn Bucket>))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let records = self.read_index().await?;
        Ok(records.into_iter().map(|r| r.name).collect())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let _guard = self.lock_index().await?;
        let mut records = self.read_index().await?;

        let Some(position) = records.iter().position(|r| r.name == name) else {
            return Ok(false);
        };
        let record = records.remove(position);
        self.write_index(&records).await?;

        let dir = self.root.join(&record.dir);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CacheError::BucketDelete {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        debug!("Deleted bucket {}", name);
        Ok(true)
    }
}

/// Entry metadata as written to `<sha256(key)>.json`
#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    #[serde(flatten)]
    entry: StoredEntry,
    body_file: String,
}

/// A bucket directory
pub struct DiskBucket {
    name: String,
    dir: PathBuf,
}

impl DiskBucket {
    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", digest(key)))
    }

    async fn lock(&self) -> CacheResult<FileLease> {
        if !self.dir.exists() {
            return Err(CacheError::BucketDeleted(self.name.clone()));
        }
        FileLease::acquire(self.dir.join(BUCKET_LOCK_FILE)).await
    }

    /// Remove body files of `stem` other than `keep`
    ///
    /// Failures are logged; the entry itself is already consistent.
    async fn sweep_bodies(&self, stem: &str, keep: Option<&str>) {
        let prefix = format!("{}.", stem);
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list {} for cleanup: {}", self.dir.display(), e);
                return;
            }
        };

        loop {
            let dir_entry = match entries.next_entry().await {
                Ok(Some(dir_entry)) => dir_entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Cannot list {} for cleanup: {}", self.dir.display(), e);
                    break;
                }
            };
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(".body") || Some(name) == keep {
                continue;
            }
            if let Err(e) = remove_if_exists(&dir_entry.path()).await {
                warn!("Failed to remove stale body {}: {}", name, e);
            }
        }
    }

    async fn read_record(&self, path: &Path) -> CacheResult<Option<EntryRecord>> {
        match fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                CacheError::storage(format!("corrupt entry {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(format!("reading {}", path.display()), e)),
        }
    }

    async fn read_entry(&self, key: &str) -> CacheResult<Option<StoredEntry>> {
        let Some(record) = self.read_record(&self.record_path(key)).await? else {
            return Ok(None);
        };

        let body_path = self.dir.join(&record.body_file);
        match fs::read(&body_path).await {
            Ok(body) => {
                let mut entry = record.entry;
                entry.response.body = body;
                Ok(Some(entry))
            }
            // Superseded by a concurrent put between the two reads
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(format!("reading {}", body_path.display()), e)),
        }
    }
}

#[async_trait]
impl Bucket for DiskBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &RequestDescriptor) -> CacheResult<Option<Response>> {
        if !request.is_get() {
            return Ok(None);
        }

        let entry = self.read_entry(&request.cache_key()).await?;
        Ok(entry
            .filter(|entry| entry.matches(request))
            .map(|entry| entry.to_response()))
    }

    async fn put(&self, request: &RequestDescriptor, response: Response) -> CacheResult<()> {
        ensure_storable(request)?;
        let mut entry = StoredEntry::capture(request, response)?;
        let _lease = self.lock().await?;

        let stem = digest(&entry.key);
        let body_file = format!("{}.{}.body", stem, Uuid::new_v4().simple());
        let record_path = self.record_path(&entry.key);

        let body = std::mem::take(&mut entry.response.body);
        write_atomic(&self.dir.join(&body_file), &body).await?;

        let record = EntryRecord { entry, body_file };
        write_atomic(&record_path, &serde_json::to_vec_pretty(&record)?).await?;

        self.sweep_bodies(&stem, Some(&record.body_file)).await;
        Ok(())
    }

    async fn delete(&self, request: &RequestDescriptor) -> CacheResult<bool> {
        let key = request.cache_key();
        let record_path = self.record_path(&key);
        if !record_path.exists() {
            return Ok(false);
        }

        let _lease = self.lock().await?;
        let removed = remove_if_exists(&record_path).await?;
        self.sweep_bodies(&digest(&key), None).await;
        Ok(removed)
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(format!("reading {}", self.dir.display()), e)),
        };

        let mut records = Vec::new();
        while let Some(dir_entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io("reading bucket entry", e))?
        {
            let path = dir_entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Ok(Some(record)) = self.read_record(&path).await {
                    records.push(record.entry);
                }
            }
        }

        records.sort_by(|a, b| a.stored_at.cmp(&b.stored_at));
        Ok(records.into_iter().map(|entry| entry.key).collect())
    }
}
