use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::record::TaskMeta;

/// Storage format for dates in edit controls and on the wire
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Error type for field parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("not a date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("not a number of hours: {0}")]
    InvalidHours(String),
    #[error("\"{0}\" is not one of the allowed options")]
    UnknownOption(String),
}

/// A writable task field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Subject,
    Status,
    Priority,
    PlannedStart,
    PlannedEnd,
    PlannedHours,
    ActualStart,
    ActualEnd,
    Parent,
    IsGroup,
    Description,
}

impl TaskField {
    /// Fields that can be edited in place in the table
    pub const INLINE: [TaskField; 7] = [
        TaskField::Status,
        TaskField::Priority,
        TaskField::PlannedStart,
        TaskField::PlannedEnd,
        TaskField::PlannedHours,
        TaskField::ActualStart,
        TaskField::ActualEnd,
    ];

    /// The wire key for this field
    pub fn key(self) -> &'static str {
        match self {
            TaskField::Subject => "subject",
            TaskField::Status => "status",
            TaskField::Priority => "priority",
            TaskField::PlannedStart => "planned_start",
            TaskField::PlannedEnd => "planned_end",
            TaskField::PlannedHours => "planned_hours",
            TaskField::ActualStart => "actual_start",
            TaskField::ActualEnd => "actual_end",
            TaskField::Parent => "parent",
            TaskField::IsGroup => "is_group",
            TaskField::Description => "description",
        }
    }

    /// Human-readable label (column headers, dialog labels)
    pub fn label(self) -> &'static str {
        match self {
            TaskField::Subject => "Subject",
            TaskField::Status => "Status",
            TaskField::Priority => "Priority",
            TaskField::PlannedStart => "Planned Start",
            TaskField::PlannedEnd => "Planned Finish",
            TaskField::PlannedHours => "Planned Hours",
            TaskField::ActualStart => "Actual Start",
            TaskField::ActualEnd => "Actual End",
            TaskField::Parent => "Parent Task",
            TaskField::IsGroup => "Is Group",
            TaskField::Description => "Description",
        }
    }

    pub fn is_inline_editable(self) -> bool {
        TaskField::INLINE.contains(&self)
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TaskField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "subject" => TaskField::Subject,
            "status" => TaskField::Status,
            "priority" => TaskField::Priority,
            "planned_start" | "exp_start_date" => TaskField::PlannedStart,
            "planned_end" | "exp_end_date" => TaskField::PlannedEnd,
            "planned_hours" | "expected_time" => TaskField::PlannedHours,
            "actual_start" => TaskField::ActualStart,
            "actual_end" => TaskField::ActualEnd,
            "parent" | "parent_task" => TaskField::Parent,
            "is_group" => TaskField::IsGroup,
            "description" => TaskField::Description,
            other => return Err(FieldError::UnknownField(other.to_string())),
        };
        Ok(field)
    }
}

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Date(NaiveDate),
    Hours(f64),
    Flag(bool),
}

impl FieldValue {
    pub fn text(s: &str) -> Self {
        if s.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(s.to_string())
        }
    }

    pub fn date(d: Option<NaiveDate>) -> Self {
        d.map_or(FieldValue::Empty, FieldValue::Date)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_hours(&self) -> Option<f64> {
        match self {
            FieldValue::Hours(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    /// Raw text used to pre-populate an edit control
    pub fn to_input(&self) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format(ISO_DATE).to_string(),
            FieldValue::Hours(h) => format_hours_input(*h),
            FieldValue::Flag(b) => if *b { "1" } else { "0" }.to_string(),
        }
    }
}

/// `8.0` → `"8"`, `4.25` → `"4.25"`, `0.0` → `""`
fn format_hours_input(h: f64) -> String {
    if h == 0.0 {
        String::new()
    } else if h.fract() == 0.0 {
        format!("{}", h as i64)
    } else {
        format!("{}", h)
    }
}

/// An ordered partial update, keyed by field
pub type TaskFields = IndexMap<TaskField, FieldValue>;

/// Which kind of control edits a field. Resolved once from listing metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Enumerated select over the given options
    Choice(Vec<String>),
    Date,
    Hours,
    Text,
    Flag,
}

impl FieldKind {
    /// Control kind for a field anywhere (dialog forms, CLI)
    pub fn for_field(field: TaskField, meta: &TaskMeta) -> FieldKind {
        match field {
            TaskField::Status => FieldKind::Choice(meta.status_options.clone()),
            TaskField::Priority => FieldKind::Choice(meta.priority_options.clone()),
            TaskField::PlannedStart
            | TaskField::PlannedEnd
            | TaskField::ActualStart
            | TaskField::ActualEnd => FieldKind::Date,
            TaskField::PlannedHours => FieldKind::Hours,
            TaskField::IsGroup => FieldKind::Flag,
            TaskField::Subject | TaskField::Parent | TaskField::Description => FieldKind::Text,
        }
    }

    /// Control kind for an in-table cell, or `None` if the cell is not editable
    pub fn inline_for(field: TaskField, meta: &TaskMeta) -> Option<FieldKind> {
        field
            .is_inline_editable()
            .then(|| FieldKind::for_field(field, meta))
    }

    /// Parse raw control text into a typed value. Blank input parses to `Empty`.
    pub fn parse(&self, raw: &str) -> Result<FieldValue, FieldError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(FieldValue::Empty);
        }
        match self {
            FieldKind::Choice(options) => options
                .iter()
                .find(|o| o.as_str() == raw)
                .map(|o| FieldValue::Text(o.clone()))
                .ok_or_else(|| FieldError::UnknownOption(raw.to_string())),
            FieldKind::Date => NaiveDate::parse_from_str(raw, ISO_DATE)
                .map(FieldValue::Date)
                .map_err(|_| FieldError::InvalidDate(raw.to_string())),
            FieldKind::Hours => match raw.parse::<f64>() {
                Ok(h) if h.is_finite() && h >= 0.0 => Ok(FieldValue::Hours(h)),
                _ => Err(FieldError::InvalidHours(raw.to_string())),
            },
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Flag => Ok(FieldValue::Flag(matches!(
                raw.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "y"
            ))),
        }
    }
}
