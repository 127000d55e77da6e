pub mod book;
pub mod local;

use async_trait::async_trait;
use serde::Serialize;

use crate::io::task_file::StoreError;
use crate::model::{TaskFields, TaskMeta, TaskRecord};

pub use local::LocalTaskService;

/// Error type for task service calls
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Rejected input; nothing was changed
    #[error("{0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task {0} has child tasks")]
    HasChildren(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Transport or server failure
    #[error("{0}")]
    Remote(String),
}

/// One scope's tasks in display order, with its option lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskListing {
    pub tasks: Vec<TaskRecord>,
    pub meta: TaskMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// Tasks removed, including connected ones
    pub deleted_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecalcOutcome {
    pub updated_count: usize,
    pub total_parents: usize,
}

/// The remote side of the task table.
///
/// Every mutation is followed by a fresh `list_tasks` on the caller's side,
/// so implementations never need to return the changed records.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// All tasks of `scope`, parents before children
    async fn list_tasks(&self, scope: &str) -> Result<TaskListing, ServiceError>;

    async fn create_task(&self, scope: &str, fields: &TaskFields)
    -> Result<TaskRecord, ServiceError>;

    /// Partial update; fields not present are left alone
    async fn update_task(&self, task_id: &str, fields: &TaskFields) -> Result<(), ServiceError>;

    /// With `delete_connected`, descendants and dependent tasks go too
    async fn delete_tasks(
        &self,
        ids: &[String],
        force: bool,
        delete_connected: bool,
    ) -> Result<DeleteOutcome, ServiceError>;

    /// Roll child dates, hours and status up into every parent
    async fn recalculate_parents(&self, scope: &str) -> Result<RecalcOutcome, ServiceError>;
}
