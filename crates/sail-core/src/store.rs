//! Multi-application object store.
//!
//! Snapshots are immutable once constructed and held behind `Arc`, so
//! replacing a label is a pointer swap under the map's write lock: readers
//! that already cloned the `Arc` keep seeing the old snapshot, and readers
//! arriving after the swap see the new one. There is no state in between.
//!
//! Loads of the same label are serialized through a per-label mutex handed
//! out by [`ApplicationStore::load_lock`]; loads of different labels do not
//! contend with each other or with readers.

use crate::archive::ParseWarning;
use crate::error::{Result, SailError};
use crate::index::SourceIndex;
use crate::object::ObjectRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Complete, atomically-replaceable state for one loaded application.
#[derive(Debug)]
pub struct Snapshot {
    pub label: String,
    pub objects: HashMap<String, ObjectRecord>,
    pub index: SourceIndex,
    /// Non-fatal problems from the parse that produced this snapshot.
    pub warnings: Vec<ParseWarning>,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    /// Assemble a snapshot from parser and indexer output.
    pub fn new(
        label: impl Into<String>,
        objects: Vec<ObjectRecord>,
        index: SourceIndex,
        warnings: Vec<ParseWarning>,
    ) -> Self {
        Self {
            label: label.into(),
            objects: objects.into_iter().map(|o| (o.id.clone(), o)).collect(),
            index,
            warnings,
            loaded_at: Utc::now(),
        }
    }
}

/// Store of loaded applications keyed by caller-chosen label.
#[derive(Default)]
pub struct ApplicationStore {
    snapshots: RwLock<HashMap<String, Arc<Snapshot>>>,
    /// Per-label load serialization. Entries are created on demand and
    /// never removed; the set of labels is small.
    load_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the snapshot for its label.
    pub async fn put(&self, snapshot: Snapshot) {
        let label = snapshot.label.clone();
        let object_count = snapshot.objects.len();
        let replaced = self
            .snapshots
            .write()
            .await
            .insert(label.clone(), Arc::new(snapshot))
            .is_some();
        info!(
            "{} snapshot '{}' with {} objects",
            if replaced { "Replaced" } else { "Installed" },
            label,
            object_count
        );
    }

    /// Get the current snapshot for `label`.
    pub async fn get(&self, label: &str) -> Result<Arc<Snapshot>> {
        self.snapshots
            .read()
            .await
            .get(label)
            .cloned()
            .ok_or_else(|| SailError::UnknownApplication {
                label: label.to_string(),
            })
    }

    /// Labels of currently loaded applications, sorted.
    pub async fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.snapshots.read().await.keys().cloned().collect();
        labels.sort();
        labels
    }

    /// Remove a snapshot. Returns whether one was present.
    pub async fn remove(&self, label: &str) -> bool {
        self.snapshots.write().await.remove(label).is_some()
    }

    /// The mutex serializing loads of `label`.
    ///
    /// Callers hold the guard across acquire → parse → index → put.
    pub async fn load_lock(&self, label: &str) -> Arc<Mutex<()>> {
        self.load_locks
            .lock()
            .await
            .entry(label.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
