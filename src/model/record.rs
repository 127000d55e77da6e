use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fields::{FieldValue, TaskField};

/// Status options used when the service does not supply its own list
pub const DEFAULT_STATUS_OPTIONS: &[&str] = &[
    "Open",
    "Working",
    "Pending Review",
    "Overdue",
    "Completed",
    "Cancelled",
];

/// Priority options used when the service does not supply its own list
pub const DEFAULT_PRIORITY_OPTIONS: &[&str] = &["Low", "Medium", "High", "Urgent"];

/// A flat task record as returned by the task service.
///
/// Records are immutable snapshots: a reload replaces every record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier (e.g. `TASK-0007`)
    pub id: String,
    /// Parent task identifier; `None` or an unresolvable id means root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<NaiveDate>,
    #[serde(default)]
    pub planned_hours: f64,
    #[serde(default)]
    pub actual_hours: f64,
    /// Computed costing amount (read-only on this side)
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tasks this task depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl TaskRecord {
    /// A root task with the given subject and `Open`/`Medium` defaults
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        TaskRecord {
            id: id.into(),
            parent: None,
            subject: subject.into(),
            status: "Open".into(),
            priority: "Medium".into(),
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            planned_hours: 0.0,
            actual_hours: 0.0,
            cost: 0.0,
            is_group: false,
            description: None,
            depends_on: Vec::new(),
        }
    }

    /// Builder-style parent assignment
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Planned duration in days, counting both ends
    pub fn planned_duration_days(&self) -> Option<i64> {
        inclusive_days(self.planned_start, self.planned_end)
    }

    /// Actual duration in days, counting both ends
    pub fn actual_duration_days(&self) -> Option<i64> {
        inclusive_days(self.actual_start, self.actual_end)
    }

    /// Current value of a field as a typed value
    pub fn value(&self, field: TaskField) -> FieldValue {
        match field {
            TaskField::Subject => FieldValue::text(&self.subject),
            TaskField::Status => FieldValue::text(&self.status),
            TaskField::Priority => FieldValue::text(&self.priority),
            TaskField::PlannedStart => FieldValue::date(self.planned_start),
            TaskField::PlannedEnd => FieldValue::date(self.planned_end),
            TaskField::ActualStart => FieldValue::date(self.actual_start),
            TaskField::ActualEnd => FieldValue::date(self.actual_end),
            TaskField::PlannedHours => FieldValue::Hours(self.planned_hours),
            TaskField::Parent => self
                .parent
                .as_deref()
                .map_or(FieldValue::Empty, FieldValue::text),
            TaskField::IsGroup => FieldValue::Flag(self.is_group),
            TaskField::Description => self
                .description
                .as_deref()
                .map_or(FieldValue::Empty, FieldValue::text),
        }
    }

    /// Apply one field value. Returns true if the record changed.
    pub fn set_value(&mut self, field: TaskField, value: &FieldValue) -> bool {
        let before = self.value(field);
        if &before == value {
            return false;
        }
        match field {
            TaskField::Subject => self.subject = value.as_text().unwrap_or_default().to_string(),
            TaskField::Status => self.status = value.as_text().unwrap_or_default().to_string(),
            TaskField::Priority => self.priority = value.as_text().unwrap_or_default().to_string(),
            TaskField::PlannedStart => self.planned_start = value.as_date(),
            TaskField::PlannedEnd => self.planned_end = value.as_date(),
            TaskField::ActualStart => self.actual_start = value.as_date(),
            TaskField::ActualEnd => self.actual_end = value.as_date(),
            TaskField::PlannedHours => self.planned_hours = value.as_hours().unwrap_or(0.0),
            TaskField::Parent => self.parent = value.as_text().map(str::to_string),
            TaskField::IsGroup => self.is_group = value.as_flag(),
            TaskField::Description => self.description = value.as_text().map(str::to_string),
        }
        self.value(field) != before
    }
}

fn inclusive_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<i64> {
    Some((end? - start?).num_days() + 1)
}

/// Per-listing metadata: currency and the option sets for choice fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub status_options: Vec<String>,
    #[serde(default)]
    pub priority_options: Vec<String>,
}

impl Default for TaskMeta {
    fn default() -> Self {
        TaskMeta {
            currency: None,
            status_options: DEFAULT_STATUS_OPTIONS.iter().map(|s| s.to_string()).collect(),
            priority_options: DEFAULT_PRIORITY_OPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl TaskMeta {
    /// Fill empty option lists with the defaults
    pub fn with_fallbacks(mut self) -> Self {
        let defaults = TaskMeta::default();
        if self.status_options.is_empty() {
            self.status_options = defaults.status_options;
        }
        if self.priority_options.is_empty() {
            self.priority_options = defaults.priority_options;
        }
        self
    }
}
