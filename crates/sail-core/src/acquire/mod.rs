//! Archive acquisition: local files and authenticated remote exports.
//!
//! The acquirer turns an [`AppRef`] into archive bytes. Remote references
//! walk the cache tiers (memory → disk → network) unless a forced refresh
//! is requested; local paths are read directly, since the caller already
//! controls freshness through the filesystem.

mod cache;
mod export;

pub use cache::{ArchiveCache, ArchiveCacheMeta};
pub use export::ExportClient;

use crate::config::Connection;
use crate::error::{Result, SailError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Reference to one application's export source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRef {
    /// Application uuid on a configured remote environment.
    Remote { uuid: String },
    /// Pre-exported archive on the local filesystem.
    Local { path: PathBuf },
}

impl AppRef {
    pub fn remote(uuid: impl Into<String>) -> Self {
        AppRef::Remote { uuid: uuid.into() }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        AppRef::Local { path: path.into() }
    }

    /// Stable cache identity: uuid for remote refs, absolute path for local.
    pub fn cache_key(&self) -> String {
        match self {
            AppRef::Remote { uuid } => uuid.clone(),
            AppRef::Local { path } => path.display().to_string(),
        }
    }
}

/// Obtains export archives, caching remote fetches.
pub struct ArchiveAcquirer {
    cache: ArchiveCache,
    /// Present only when a remote environment is configured.
    export_client: Option<ExportClient>,
}

impl ArchiveAcquirer {
    /// Build an acquirer with a disk cache at `cache_dir`.
    ///
    /// `connection` may be `None` for local-zip-only operation; remote
    /// references then fail with a configuration-shaped acquisition error.
    pub fn new(cache_dir: impl Into<PathBuf>, connection: Option<Connection>) -> Result<Self> {
        let export_client = match connection {
            Some(conn) => Some(ExportClient::new(conn)?),
            None => None,
        };
        Ok(Self {
            cache: ArchiveCache::new(cache_dir)?,
            export_client,
        })
    }

    pub fn cache(&self) -> &ArchiveCache {
        &self.cache
    }

    /// Acquire the archive bytes for `app_ref`.
    ///
    /// `force_refresh` bypasses both cache tiers for remote references and
    /// repopulates them from the fresh download.
    pub async fn acquire(&self, app_ref: &AppRef, force_refresh: bool) -> Result<Arc<Vec<u8>>> {
        match app_ref {
            AppRef::Local { path } => self.read_local(path),
            AppRef::Remote { uuid } => {
                if !force_refresh {
                    if let Some(bytes) = self.cache.get(uuid) {
                        debug!("Using cached export for {}", uuid);
                        return Ok(bytes);
                    }
                }
                self.fetch_remote(uuid).await
            }
        }
    }

    /// Drop the cache entry for a remote application.
    pub fn invalidate(&self, app_uuid: &str) {
        self.cache.invalidate(app_uuid);
    }

    fn read_local(&self, path: &Path) -> Result<Arc<Vec<u8>>> {
        if !path.exists() {
            return Err(SailError::acquisition(format!(
                "Local archive not found: {}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| SailError::Acquisition {
            message: format!("Failed to read local archive {}", path.display()),
            cause: Some(e.to_string()),
        })?;
        if bytes.is_empty() {
            return Err(SailError::acquisition(format!(
                "Local archive is empty: {}",
                path.display()
            )));
        }
        Ok(Arc::new(bytes))
    }

    async fn fetch_remote(&self, uuid: &str) -> Result<Arc<Vec<u8>>> {
        let client = self.export_client.as_ref().ok_or_else(|| {
            SailError::acquisition(
                "No remote environment configured (set APPIAN_URL and APPIAN_API_KEY)",
            )
        })?;

        info!("Exporting application {} from remote environment", uuid);
        let bytes = client.export_application(uuid).await?;
        self.cache.put(uuid, &bytes)?;
        Ok(Arc::new(bytes))
    }
}
