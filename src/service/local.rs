use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::io::task_file::{StoreFile, read_store, store_path, write_store};
use crate::model::{TaskFields, TaskRecord};

use super::{DeleteOutcome, RecalcOutcome, ServiceError, TaskListing, TaskService, book};

/// Task service backed by the JSON store in the data directory, or by memory
/// alone when no path is given.
///
/// File-backed calls re-read the store before acting so that edits made by
/// other processes are never overwritten with stale data.
pub struct LocalTaskService {
    path: Option<PathBuf>,
    store: Mutex<StoreFile>,
}

impl LocalTaskService {
    pub fn open(data_dir: &Path) -> Self {
        LocalTaskService {
            path: Some(store_path(data_dir)),
            store: Mutex::new(StoreFile::default()),
        }
    }

    pub fn in_memory(store: StoreFile) -> Self {
        LocalTaskService {
            path: None,
            store: Mutex::new(store),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Snapshot of the current data
    pub async fn snapshot(&self) -> Result<StoreFile, ServiceError> {
        let mut store = self.store.lock().await;
        self.refresh(&mut store)?;
        Ok(store.clone())
    }

    fn refresh(&self, store: &mut StoreFile) -> Result<(), ServiceError> {
        if let Some(path) = &self.path {
            *store = read_store(path)?;
        }
        Ok(())
    }

    fn persist(&self, store: &StoreFile) -> Result<(), ServiceError> {
        if let Some(path) = &self.path {
            write_store(path, store)?;
            debug!(path = %path.display(), "task store written");
        }
        Ok(())
    }

    /// Register a scope with its currency; no-op if it already exists
    pub async fn ensure_scope(&self, scope: &str, currency: Option<&str>) -> Result<bool, ServiceError> {
        let created = self.mutate(|s| Ok(book::ensure_scope(s, scope, currency))).await?;
        if created {
            info!(scope, "scope registered");
        }
        Ok(created)
    }

    /// Run `op` against fresh data and write the result only when it succeeds
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut StoreFile) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut store = self.store.lock().await;
        self.refresh(&mut store)?;
        let mut working = store.clone();
        let out = op(&mut working)?;
        self.persist(&working)?;
        *store = working;
        Ok(out)
    }
}

#[async_trait]
impl TaskService for LocalTaskService {
    async fn list_tasks(&self, scope: &str) -> Result<TaskListing, ServiceError> {
        let mut store = self.store.lock().await;
        self.refresh(&mut store)?;
        Ok(book::listing(&store, scope))
    }

    async fn create_task(
        &self,
        scope: &str,
        fields: &TaskFields,
    ) -> Result<TaskRecord, ServiceError> {
        let record = self.mutate(|s| book::create(s, scope, fields)).await?;
        info!(scope, id = %record.id, "task created");
        Ok(record)
    }

    async fn update_task(&self, task_id: &str, fields: &TaskFields) -> Result<(), ServiceError> {
        let changed = self.mutate(|s| book::update(s, task_id, fields)).await?;
        info!(id = task_id, changed, "task updated");
        Ok(())
    }

    async fn delete_tasks(
        &self,
        ids: &[String],
        force: bool,
        delete_connected: bool,
    ) -> Result<DeleteOutcome, ServiceError> {
        let out = self
            .mutate(|s| book::delete(s, ids, force, delete_connected))
            .await?;
        info!(requested = ids.len(), deleted = out.deleted_count, "tasks deleted");
        Ok(out)
    }

    async fn recalculate_parents(&self, scope: &str) -> Result<RecalcOutcome, ServiceError> {
        let out = self
            .mutate(|s| Ok(book::recalculate_all(s, scope)))
            .await?;
        info!(scope, updated = out.updated_count, total = out.total_parents, "parents recalculated");
        Ok(out)
    }
}
