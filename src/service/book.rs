//! Task mutations over the stored data, independent of where it lives.

use std::collections::{HashMap, HashSet};

use crate::io::task_file::{ScopeData, StoreFile};
use crate::model::{FieldValue, TaskField, TaskFields, TaskRecord};
use crate::tree::build_tree;

use super::{DeleteOutcome, RecalcOutcome, ServiceError, TaskListing};

const COMPLETED: &str = "Completed";
const WORKING: &str = "Working";

/// Tasks of `scope` in tree order: parents first, siblings as stored
pub fn listing(store: &StoreFile, scope: &str) -> TaskListing {
    let Some(data) = store.scopes.get(scope) else {
        return TaskListing {
            tasks: Vec::new(),
            meta: Default::default(),
        };
    };
    let tree = build_tree(&data.tasks);
    TaskListing {
        tasks: tree
            .preorder()
            .into_iter()
            .map(|idx| tree.node(idx).record.clone())
            .collect(),
        meta: data.meta.to_task_meta(),
    }
}

pub fn next_id(store: &mut StoreFile) -> String {
    store.last_seq += 1;
    format!("TASK-{:04}", store.last_seq)
}

/// Register `scope` in the store. Returns false if it already existed.
pub fn ensure_scope(store: &mut StoreFile, scope: &str, currency: Option<&str>) -> bool {
    if store.scopes.contains_key(scope) {
        return false;
    }
    let data = store.scopes.entry(scope.to_string()).or_default();
    data.meta.currency = currency.map(str::to_string);
    true
}

pub fn create(
    store: &mut StoreFile,
    scope: &str,
    fields: &TaskFields,
) -> Result<TaskRecord, ServiceError> {
    if scope.trim().is_empty() {
        return Err(ServiceError::Validation("Scope is required".into()));
    }
    let subject = fields
        .get(&TaskField::Subject)
        .and_then(FieldValue::as_text)
        .map(str::trim)
        .unwrap_or_default();
    if subject.is_empty() {
        return Err(ServiceError::Validation("Subject is required".into()));
    }
    let is_group = fields.get(&TaskField::IsGroup).is_some_and(FieldValue::as_flag);
    let parent = if is_group {
        None
    } else {
        fields
            .get(&TaskField::Parent)
            .and_then(FieldValue::as_text)
            .map(str::to_string)
    };
    if let Some(p) = &parent
        && !store
            .scopes
            .get(scope)
            .is_some_and(|d| d.tasks.iter().any(|t| &t.id == p))
    {
        return Err(ServiceError::NotFound(p.clone()));
    }

    let id = next_id(store);
    let mut record = TaskRecord::new(id, subject);
    for (field, value) in fields {
        match field {
            TaskField::Subject | TaskField::Parent | TaskField::IsGroup => {}
            TaskField::Status | TaskField::Priority if value.is_empty() => {}
            _ => {
                record.set_value(*field, value);
            }
        }
    }
    record.is_group = is_group;
    record.parent = parent;

    store
        .scopes
        .entry(scope.to_string())
        .or_default()
        .tasks
        .push(record.clone());
    Ok(record)
}

/// Apply a partial update. When something changed and the task has a
/// parent, that parent is recalculated. Returns whether anything changed.
pub fn update(store: &mut StoreFile, task_id: &str, fields: &TaskFields) -> Result<bool, ServiceError> {
    let scope = store
        .scope_of(task_id)
        .map(str::to_string)
        .ok_or_else(|| ServiceError::NotFound(task_id.to_string()))?;
    let Some(data) = store.scopes.get_mut(&scope) else {
        return Err(ServiceError::NotFound(task_id.to_string()));
    };

    if let Some(value) = fields.get(&TaskField::Subject)
        && value.as_text().is_none_or(|s| s.trim().is_empty())
    {
        return Err(ServiceError::Validation("Subject is required".into()));
    }
    if let Some(FieldValue::Text(new_parent)) = fields.get(&TaskField::Parent) {
        check_parent(data, task_id, new_parent)?;
    }

    let Some(record) = data.tasks.iter_mut().find(|t| t.id == task_id) else {
        return Err(ServiceError::NotFound(task_id.to_string()));
    };
    let zero_hours = FieldValue::Hours(0.0);
    let mut dirty = false;
    for (field, value) in fields {
        let value = match (field, value) {
            (TaskField::PlannedHours, FieldValue::Empty) => &zero_hours,
            _ => value,
        };
        dirty |= record.set_value(*field, value);
    }
    if record.is_group && record.parent.is_some() {
        record.parent = None;
        dirty = true;
    }
    let parent = record.parent.clone();

    if dirty && let Some(parent) = parent {
        recalculate_parent(&mut data.tasks, &parent);
    }
    Ok(dirty)
}

/// A new parent must exist and must not sit below the task itself
fn check_parent(data: &ScopeData, task_id: &str, new_parent: &str) -> Result<(), ServiceError> {
    if !data.tasks.iter().any(|t| t.id == new_parent) {
        return Err(ServiceError::NotFound(new_parent.to_string()));
    }
    let parent_of: HashMap<&str, &str> = data
        .tasks
        .iter()
        .filter_map(|t| Some((t.id.as_str(), t.parent.as_deref()?)))
        .collect();
    let mut cur = Some(new_parent);
    let mut seen = HashSet::new();
    while let Some(id) = cur {
        if id == task_id {
            return Err(ServiceError::Validation(format!(
                "{} cannot be placed under its own subtask",
                task_id
            )));
        }
        if !seen.insert(id) {
            break;
        }
        cur = parent_of.get(id).copied();
    }
    Ok(())
}

/// Roll children up into `parent_id`. Returns false when the parent is
/// missing or has no children.
pub fn recalculate_parent(tasks: &mut [TaskRecord], parent_id: &str) -> bool {
    let children: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| t.parent.as_deref() == Some(parent_id))
        .collect();
    if children.is_empty() {
        return false;
    }

    let planned_start = children.iter().filter_map(|c| c.planned_start).min();
    let planned_end = children.iter().filter_map(|c| c.planned_end).max();
    let planned_hours: f64 = children.iter().map(|c| c.planned_hours).sum();
    let actual_start = children.iter().filter_map(|c| c.actual_start).min();
    let actual_end = children.iter().filter_map(|c| c.actual_end).max();
    let statuses: Vec<&str> = children
        .iter()
        .map(|c| c.status.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let status = if statuses.iter().all(|s| *s == COMPLETED) {
        Some(COMPLETED)
    } else if statuses.contains(&WORKING) {
        Some(WORKING)
    } else {
        None
    };

    let Some(parent) = tasks.iter_mut().find(|t| t.id == parent_id) else {
        return false;
    };
    parent.planned_start = planned_start;
    parent.planned_end = planned_end;
    parent.planned_hours = planned_hours;
    parent.actual_start = actual_start;
    parent.actual_end = actual_end;
    if let Some(status) = status {
        parent.status = status.to_string();
    }
    true
}

/// Recalculate every parent of `scope`, deepest first
pub fn recalculate_all(store: &mut StoreFile, scope: &str) -> RecalcOutcome {
    let Some(data) = store.scopes.get_mut(scope) else {
        return RecalcOutcome {
            updated_count: 0,
            total_parents: 0,
        };
    };
    let tree = build_tree(&data.tasks);
    let mut parents: Vec<(usize, String)> = tree
        .nodes()
        .filter(|(_, n)| n.has_children())
        .map(|(_, n)| (n.depth, n.id().to_string()))
        .collect();
    parents.sort_by(|a, b| b.0.cmp(&a.0));

    let total_parents = parents.len();
    let updated_count = parents
        .iter()
        .filter(|(_, id)| recalculate_parent(&mut data.tasks, id))
        .count();
    RecalcOutcome {
        updated_count,
        total_parents,
    }
}

/// Delete `ids`. With `delete_connected`, every descendant and every task
/// depending (transitively) on a removed task is removed as well. Without it
/// a task that still has children is refused unless `force`.
pub fn delete(
    store: &mut StoreFile,
    ids: &[String],
    force: bool,
    delete_connected: bool,
) -> Result<DeleteOutcome, ServiceError> {
    let mut deleted_count = 0;
    let mut found_any = false;

    for data in store.scopes.values_mut() {
        let targets: HashSet<String> = ids
            .iter()
            .filter(|id| data.tasks.iter().any(|t| &t.id == *id))
            .cloned()
            .collect();
        if targets.is_empty() {
            continue;
        }
        found_any = true;

        let doomed = if delete_connected {
            connected_closure(&data.tasks, targets)
        } else {
            if !force
                && let Some(t) = data.tasks.iter().find(|t| {
                    t.parent.as_ref().is_some_and(|p| targets.contains(p)) && !targets.contains(&t.id)
                })
                && let Some(parent) = &t.parent
            {
                return Err(ServiceError::HasChildren(parent.clone()));
            }
            targets
        };

        let before = data.tasks.len();
        data.tasks.retain(|t| !doomed.contains(&t.id));
        deleted_count += before - data.tasks.len();
        for t in &mut data.tasks {
            t.depends_on.retain(|d| !doomed.contains(d));
        }
    }

    if !found_any {
        let first = ids.first().cloned().unwrap_or_default();
        return Err(ServiceError::NotFound(first));
    }
    Ok(DeleteOutcome { deleted_count })
}

/// Targets plus their descendants and dependents, to a fixed point
fn connected_closure(tasks: &[TaskRecord], mut doomed: HashSet<String>) -> HashSet<String> {
    loop {
        let before = doomed.len();
        for t in tasks {
            if doomed.contains(&t.id) {
                continue;
            }
            let under_doomed = t.parent.as_ref().is_some_and(|p| doomed.contains(p));
            let depends_on_doomed = t.depends_on.iter().any(|d| doomed.contains(d));
            if under_doomed || depends_on_doomed {
                doomed.insert(t.id.clone());
            }
        }
        if doomed.len() == before {
            return doomed;
        }
    }
}
