//! Archive cache with memory and disk tiers.
//!
//! Tier order on read: in-memory TTL cache → disk → caller fetches from the
//! network. Disk entries are one `<uuid>.zip` per application plus a
//! `<uuid>.json` sidecar recording when the archive was fetched. Writes go
//! to a `.part` temp file, are synced, then renamed into place so an
//! interrupted fetch never leaves a half-written entry.

use crate::config::{NetworkConfig, PathsConfig};
use crate::error::{Result, SailError};
use chrono::{DateTime, Utc};
use mini_moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sidecar metadata stored next to each cached archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveCacheMeta {
    /// RFC 3339 timestamp of the fetch that produced the archive.
    pub fetched_at: String,
    /// Archive size in bytes, for a cheap consistency check.
    pub byte_len: u64,
}

/// Two-tier cache of export archives keyed by application uuid.
pub struct ArchiveCache {
    memory: Cache<String, Arc<Vec<u8>>>,
    cache_dir: PathBuf,
}

impl ArchiveCache {
    /// Create a cache rooted at `cache_dir`, creating the directory if
    /// needed.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)
            .map_err(|e| SailError::io_with_path(e, cache_dir.clone()))?;

        Ok(Self {
            memory: Cache::builder()
                .time_to_live(NetworkConfig::ARCHIVE_MEMORY_TTL)
                .max_capacity(8)
                .build(),
            cache_dir,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn archive_path(&self, app_uuid: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", app_uuid, PathsConfig::ARCHIVE_EXTENSION))
    }

    fn meta_path(&self, app_uuid: &str) -> PathBuf {
        self.cache_dir.join(format!(
            "{}.{}",
            app_uuid,
            PathsConfig::ARCHIVE_META_EXTENSION
        ))
    }

    /// Look up an archive, consulting memory first, then disk.
    ///
    /// A disk hit repopulates the memory tier.
    pub fn get(&self, app_uuid: &str) -> Option<Arc<Vec<u8>>> {
        if let Some(bytes) = self.memory.get(&app_uuid.to_string()) {
            debug!("Archive cache memory hit for {}", app_uuid);
            return Some(bytes);
        }

        let path = self.archive_path(app_uuid);
        if !path.exists() {
            return None;
        }

        match fs::read(&path) {
            Ok(bytes) => {
                debug!(
                    "Archive cache disk hit for {} ({} bytes)",
                    app_uuid,
                    bytes.len()
                );
                let bytes = Arc::new(bytes);
                self.memory.insert(app_uuid.to_string(), bytes.clone());
                Some(bytes)
            }
            Err(e) => {
                warn!("Failed to read cached archive {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Read the sidecar metadata for a cached archive, if any.
    pub fn meta(&self, app_uuid: &str) -> Option<ArchiveCacheMeta> {
        let path = self.meta_path(app_uuid);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("Failed to parse cache sidecar {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Store an archive under `app_uuid`, atomically.
    pub fn put(&self, app_uuid: &str, bytes: &[u8]) -> Result<()> {
        let archive_path = self.archive_path(app_uuid);
        atomic_place(&archive_path, bytes)?;

        let meta = ArchiveCacheMeta {
            fetched_at: Utc::now().to_rfc3339(),
            byte_len: bytes.len() as u64,
        };
        let meta_json = serde_json::to_string_pretty(&meta)?;
        atomic_place(&self.meta_path(app_uuid), meta_json.as_bytes())?;

        self.memory
            .insert(app_uuid.to_string(), Arc::new(bytes.to_vec()));
        debug!(
            "Cached archive for {} ({} bytes) at {}",
            app_uuid,
            bytes.len(),
            archive_path.display()
        );
        Ok(())
    }

    /// Remove both tiers for `app_uuid` (operator-forced re-fetch).
    pub fn invalidate(&self, app_uuid: &str) {
        self.memory.invalidate(&app_uuid.to_string());
        for path in [self.archive_path(app_uuid), self.meta_path(app_uuid)] {
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("Failed to remove cache file {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Enumerate application uuids with a cached archive on disk.
    pub fn cached_uuids(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut uuids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let path = e.path();
                if path.extension().and_then(|x| x.to_str())
                    == Some(PathsConfig::ARCHIVE_EXTENSION)
                {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect();
        uuids.sort();
        uuids
    }

    /// Age of a cached entry, if its sidecar is readable.
    pub fn entry_age(&self, app_uuid: &str) -> Option<chrono::Duration> {
        let meta = self.meta(app_uuid)?;
        let fetched = DateTime::parse_from_rfc3339(&meta.fetched_at).ok()?;
        Some(Utc::now().signed_duration_since(fetched))
    }
}

/// Write `bytes` to `path` via a temp file, sync, and atomic rename.
fn atomic_place(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| SailError::Io {
                message: format!("Failed to create directory {}", parent.display()),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }
    }

    let temp_path = path.with_extension(format!(
        "{}.{}",
        std::process::id(),
        PathsConfig::PARTIAL_SUFFIX
    ));

    {
        let mut file = fs::File::create(&temp_path).map_err(|e| SailError::Io {
            message: format!("Failed to create temp file {}", temp_path.display()),
            path: Some(temp_path.clone()),
            source: Some(e),
        })?;
        file.write_all(bytes).map_err(|e| SailError::Io {
            message: format!("Failed to write temp file {}", temp_path.display()),
            path: Some(temp_path.clone()),
            source: Some(e),
        })?;
        file.sync_all().map_err(|e| SailError::Io {
            message: format!("Failed to sync temp file {}", temp_path.display()),
            path: Some(temp_path.clone()),
            source: Some(e),
        })?;
    }

    fs::rename(&temp_path, path).map_err(|e| SailError::Io {
        message: format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        ),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    Ok(())
}
