#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use tasktree::controller::TaskTreeController;
use tasktree::model::{TaskFields, TaskMeta, TaskRecord};
use tasktree::service::{DeleteOutcome, RecalcOutcome, ServiceError, TaskListing, TaskService};
use tasktree::sync::{self, RemoteOp, Reply, Request};
use tasktree::table::DisplayFormat;

/// In-memory task service that records every call and can be told to fail.
#[derive(Default)]
pub struct MockService {
    tasks: Mutex<Vec<TaskRecord>>,
    calls: Mutex<Vec<String>>,
    fail: Mutex<Option<&'static str>>,
}

impl MockService {
    pub fn with_tasks(tasks: Vec<TaskRecord>) -> Self {
        MockService {
            tasks: Mutex::new(tasks),
            ..Default::default()
        }
    }

    /// Every call so far, as `op` or `op:arg`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make every call to `op` fail until cleared
    pub fn fail_on(&self, op: &'static str) {
        *self.fail.lock().unwrap() = Some(op);
    }

    pub fn heal(&self) {
        *self.fail.lock().unwrap() = None;
    }

    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.tasks.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, arg: &str) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(format!("{}:{}", op, arg));
        if *self.fail.lock().unwrap() == Some(op) {
            return Err(ServiceError::Remote(format!("{} unavailable", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskService for MockService {
    async fn list_tasks(&self, scope: &str) -> Result<TaskListing, ServiceError> {
        self.record("list", scope)?;
        Ok(TaskListing {
            tasks: self.tasks(),
            meta: TaskMeta::default(),
        })
    }

    async fn create_task(
        &self,
        _scope: &str,
        fields: &TaskFields,
    ) -> Result<TaskRecord, ServiceError> {
        self.record("create", "")?;
        let mut tasks = self.tasks.lock().unwrap();
        let mut record = TaskRecord::new(format!("N{}", tasks.len() + 1), "");
        for (field, value) in fields {
            record.set_value(*field, value);
        }
        tasks.push(record.clone());
        Ok(record)
    }

    async fn update_task(&self, task_id: &str, fields: &TaskFields) -> Result<(), ServiceError> {
        self.record("update", task_id)?;
        let mut tasks = self.tasks.lock().unwrap();
        let record = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ServiceError::NotFound(task_id.to_string()))?;
        for (field, value) in fields {
            record.set_value(*field, value);
        }
        Ok(())
    }

    async fn delete_tasks(
        &self,
        ids: &[String],
        _force: bool,
        delete_connected: bool,
    ) -> Result<DeleteOutcome, ServiceError> {
        self.record("delete", &ids.join(","))?;
        let mut tasks = self.tasks.lock().unwrap();
        let mut doomed: Vec<String> = ids.to_vec();
        if delete_connected {
            let mut i = 0;
            while i < doomed.len() {
                let id = doomed[i].clone();
                for t in tasks.iter() {
                    let linked = t.parent.as_deref() == Some(id.as_str())
                        || t.depends_on.contains(&id);
                    if linked && !doomed.contains(&t.id) {
                        doomed.push(t.id.clone());
                    }
                }
                i += 1;
            }
        }
        let before = tasks.len();
        tasks.retain(|t| !doomed.contains(&t.id));
        Ok(DeleteOutcome {
            deleted_count: before - tasks.len(),
        })
    }

    async fn recalculate_parents(&self, scope: &str) -> Result<RecalcOutcome, ServiceError> {
        self.record("recalc", scope)?;
        let tasks = self.tasks.lock().unwrap();
        let parents = tasks
            .iter()
            .filter(|t| tasks.iter().any(|c| c.parent.as_deref() == Some(t.id.as_str())))
            .count();
        Ok(RecalcOutcome {
            updated_count: parents,
            total_parents: parents,
        })
    }
}

/// A, B under A, C under A, D under B
pub fn abcd() -> Vec<TaskRecord> {
    vec![
        TaskRecord::new("A", "Foundations"),
        TaskRecord::new("B", "Excavation").with_parent("A"),
        TaskRecord::new("C", "Footings").with_parent("A"),
        TaskRecord::new("D", "Survey").with_parent("B"),
    ]
}

/// Mount a controller on scope "P" and run until idle
pub async fn mounted(service: &MockService) -> TaskTreeController {
    let mut controller = TaskTreeController::mount("P", DisplayFormat::default());
    sync::drain(&mut controller, service).await;
    controller
}

/// Run one request by hand, for interleaving tests
pub async fn run(service: &MockService, req: &Request) -> Result<Reply, ServiceError> {
    sync::execute(service, &req.op).await
}

pub fn is_list(req: &Request) -> bool {
    matches!(req.op, RemoteOp::List { .. })
}
