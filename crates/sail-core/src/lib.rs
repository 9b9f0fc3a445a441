//! Sail Core - Headless library for Appian application export ingestion.
//!
//! This crate turns application export archives (zips of XML haul documents)
//! into in-memory object indices and answers queries over them: listing,
//! full-text search, single-object source retrieval, component-usage lookup,
//! and reference walking. It can be used programmatically without any
//! HTTP/RPC layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use sail_core::{AppRef, SailApi};
//!
//! #[tokio::main]
//! async fn main() -> sail_core::Result<()> {
//!     let api = SailApi::new("/path/to/data")?;
//!
//!     let report = api
//!         .load_application("hr-portal", &AppRef::local("export.zip"), false)
//!         .await?;
//!     println!("Loaded {} objects", report.object_count);
//!
//!     let users = api.find_users_of_component("hr-portal", "a!gridField").await?;
//!     println!("{} interfaces use gridField", users.len());
//!
//!     Ok(())
//! }
//! ```

pub mod acquire;
pub mod archive;
pub mod checklist;
pub mod config;
pub mod error;
pub mod index;
pub mod network;
pub mod object;
pub mod query;
pub mod store;

pub use acquire::{AppRef, ArchiveAcquirer};
pub use archive::{ParseOutcome, ParseWarning};
pub use checklist::{AuroraChecklist, ChecklistSource};
pub use config::Connection;
pub use error::{Result, SailError};
pub use object::{ObjectKind, ObjectRecord, ObjectSummary};
pub use query::{MatchField, ReferenceHit, SearchHit};
pub use store::{ApplicationStore, Snapshot};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Outcome of a completed application load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub label: String,
    pub object_count: usize,
    pub warnings: Vec<ParseWarning>,
    pub loaded_at: DateTime<Utc>,
}

/// Main API struct for export ingestion and object queries.
///
/// This is the primary entry point for programmatic access. It owns the
/// archive acquirer (with its disk cache under `<data_root>/cache`), the
/// store of loaded application snapshots, and the accessibility checklist
/// source. All methods are safe to call concurrently.
pub struct SailApi {
    data_root: PathBuf,
    default_app_uuid: Option<String>,
    acquirer: ArchiveAcquirer,
    store: ApplicationStore,
    checklist: Box<dyn ChecklistSource>,
}

impl SailApi {
    /// Create an API rooted at `data_root`, resolving remote-export
    /// credentials from the environment when present.
    pub fn new(data_root: impl Into<PathBuf>) -> Result<Self> {
        let connection = Connection::from_env()?;
        Self::with_connection(data_root, connection)
    }

    /// Create an API with explicit connection settings (or none, in which
    /// case only local archives and the cache can be loaded).
    pub fn with_connection(
        data_root: impl Into<PathBuf>,
        connection: Option<Connection>,
    ) -> Result<Self> {
        let data_root = data_root.into();
        let cache_dir = data_root.join(config::PathsConfig::CACHE_DIR_NAME);
        if connection.is_none() {
            info!("No Appian connection configured; remote exports are unavailable");
        }
        Ok(Self {
            default_app_uuid: connection.as_ref().and_then(|c| c.default_app_uuid.clone()),
            acquirer: ArchiveAcquirer::new(&cache_dir, connection)?,
            store: ApplicationStore::new(),
            checklist: Box::new(AuroraChecklist::new(&cache_dir)?),
            data_root,
        })
    }

    pub fn data_root(&self) -> &PathBuf {
        &self.data_root
    }

    /// The application uuid to export when a caller names none.
    pub fn default_app_uuid(&self) -> Option<&str> {
        self.default_app_uuid.as_deref()
    }

    /// Acquire, parse, and index an application, then install its snapshot
    /// under `label`.
    ///
    /// Loads of the same label are serialized; queries against a previously
    /// installed snapshot proceed throughout. On any failure the prior
    /// snapshot, if one exists, remains installed and queryable.
    pub async fn load_application(
        &self,
        label: &str,
        app_ref: &AppRef,
        force_refresh: bool,
    ) -> Result<LoadReport> {
        let lock = self.store.load_lock(label).await;
        let _guard = lock.lock().await;

        info!("Loading application '{}' from {:?}", label, app_ref);
        let bytes = self.acquirer.acquire(app_ref, force_refresh).await?;
        let outcome = archive::parse_archive(&bytes)?;
        let source_index = index::build_index(&outcome.objects);
        let snapshot = Snapshot::new(label, outcome.objects, source_index, outcome.warnings);

        let report = LoadReport {
            label: snapshot.label.clone(),
            object_count: snapshot.objects.len(),
            warnings: snapshot.warnings.clone(),
            loaded_at: snapshot.loaded_at,
        };
        self.store.put(snapshot).await;
        Ok(report)
    }

    /// Labels of currently loaded applications.
    pub async fn list_applications(&self) -> Vec<String> {
        self.store.labels().await
    }

    /// Summaries of objects in a loaded application, optionally filtered.
    pub async fn list_objects(
        &self,
        label: &str,
        kind_filter: Option<ObjectKind>,
        name_pattern: Option<&str>,
    ) -> Result<Vec<ObjectSummary>> {
        let snapshot = self.store.get(label).await?;
        Ok(query::list_objects(&snapshot, kind_filter, name_pattern))
    }

    /// The full record (including source text) for one object.
    pub async fn get_source(&self, label: &str, id: &str) -> Result<ObjectRecord> {
        let snapshot = self.store.get(label).await?;
        query::get_source(&snapshot, id).cloned()
    }

    /// Ranked full-text search over names, descriptions, and source.
    pub async fn search(&self, label: &str, query_text: &str) -> Result<Vec<SearchHit>> {
        let snapshot = self.store.get(label).await?;
        Ok(query::search(&snapshot, query_text))
    }

    /// Objects whose source invokes the given component.
    pub async fn find_users_of_component(
        &self,
        label: &str,
        component: &str,
    ) -> Result<Vec<ObjectSummary>> {
        let snapshot = self.store.get(label).await?;
        Ok(query::find_users_of_component(&snapshot, component))
    }

    /// Objects reachable from `id` through static references.
    pub async fn find_references(
        &self,
        label: &str,
        id: &str,
        depth: Option<u32>,
    ) -> Result<Vec<ReferenceHit>> {
        let snapshot = self.store.get(label).await?;
        query::find_references(&snapshot, id, depth)
    }

    /// The Aurora accessibility checklist, freshest source available.
    pub async fn a11y_checklist(&self) -> String {
        self.checklist.fetch_or_fallback().await
    }
}
