use crate::model::{TaskField, TaskRecord};
use crate::tree::{NodeIdx, TaskTree};

use super::format::DisplayFormat;
use super::surface::RowSurface;

/// Text shown in a cell while its update is in flight
pub const SAVING_PLACEHOLDER: &str = "Saving...";

/// Table columns in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Subject,
    Wbs,
    Status,
    Priority,
    PlannedStart,
    PlannedEnd,
    Duration,
    PlannedHours,
    ActualStart,
    ActualEnd,
    ActualDuration,
    ActualHours,
    Cost,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Subject,
        Column::Wbs,
        Column::Status,
        Column::Priority,
        Column::PlannedStart,
        Column::PlannedEnd,
        Column::Duration,
        Column::PlannedHours,
        Column::ActualStart,
        Column::ActualEnd,
        Column::ActualDuration,
        Column::ActualHours,
        Column::Cost,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Subject => "Task",
            Column::Wbs => "WBS",
            Column::Status => "Status",
            Column::Priority => "Priority",
            Column::PlannedStart => "Plan Start",
            Column::PlannedEnd => "Plan Finish",
            Column::Duration => "Duration",
            Column::PlannedHours => "Plan Hrs",
            Column::ActualStart => "Act Start",
            Column::ActualEnd => "Act End",
            Column::ActualDuration => "Act Dur",
            Column::ActualHours => "Act Hrs",
            Column::Cost => "Cost",
        }
    }

    /// The field an inline edit on this column writes, if any
    pub fn field(self) -> Option<TaskField> {
        match self {
            Column::Status => Some(TaskField::Status),
            Column::Priority => Some(TaskField::Priority),
            Column::PlannedStart => Some(TaskField::PlannedStart),
            Column::PlannedEnd => Some(TaskField::PlannedEnd),
            Column::PlannedHours => Some(TaskField::PlannedHours),
            Column::ActualStart => Some(TaskField::ActualStart),
            Column::ActualEnd => Some(TaskField::ActualEnd),
            _ => None,
        }
    }

    /// Preferred width in terminal cells
    pub fn width(self) -> usize {
        match self {
            Column::Subject => 28,
            Column::Wbs => 6,
            Column::Status => 14,
            Column::Priority => 8,
            Column::PlannedStart
            | Column::PlannedEnd
            | Column::ActualStart
            | Column::ActualEnd => 11,
            Column::Duration | Column::ActualDuration => 8,
            Column::PlannedHours | Column::ActualHours => 8,
            Column::Cost => 14,
        }
    }

    /// Editable columns in display order
    pub fn editable() -> impl Iterator<Item = Column> {
        Column::ALL.into_iter().filter(|c| c.field().is_some())
    }
}

/// Per-row action controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    AddChild,
    Edit,
    Delete,
}

pub const ROW_ACTIONS: &[RowAction] = &[RowAction::AddChild, RowAction::Edit, RowAction::Delete];

/// What a cell is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Display,
    Editing,
    Saving,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub column: Column,
    pub text: String,
    pub state: CellState,
}

impl CellView {
    pub fn is_editable(&self) -> bool {
        self.column.field().is_some()
    }
}

/// One rendered table row
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub task_id: String,
    pub parent_id: Option<String>,
    pub depth: usize,
    pub has_children: bool,
    /// Expand triangle state (only drawn when `has_children`)
    pub expanded: bool,
    pub visible: bool,
    /// Row checkbox
    pub checked: bool,
    /// Row carries the "selected" highlight
    pub selected: bool,
    /// Indentation before the subject, in cells
    pub indent: usize,
    pub cells: Vec<CellView>,
    pub actions: &'static [RowAction],
}

impl RowView {
    pub fn cell(&self, column: Column) -> Option<&CellView> {
        self.cells.iter().find(|c| c.column == column)
    }

    pub fn cell_mut(&mut self, column: Column) -> Option<&mut CellView> {
        self.cells.iter_mut().find(|c| c.column == column)
    }

    pub fn text(&self, column: Column) -> &str {
        self.cell(column).map_or("", |c| c.text.as_str())
    }
}

/// Display text for one column of a record
pub fn cell_text(record: &TaskRecord, wbs: &str, column: Column, fmt: &DisplayFormat) -> String {
    match column {
        Column::Subject => {
            if record.subject.is_empty() {
                record.id.clone()
            } else {
                record.subject.clone()
            }
        }
        Column::Wbs => wbs.to_string(),
        Column::Status => record.status.clone(),
        Column::Priority => record.priority.clone(),
        Column::PlannedStart => fmt.date(record.planned_start),
        Column::PlannedEnd => fmt.date(record.planned_end),
        Column::Duration => fmt.days(record.planned_duration_days()),
        Column::PlannedHours => fmt.hours(record.planned_hours),
        Column::ActualStart => fmt.date(record.actual_start),
        Column::ActualEnd => fmt.date(record.actual_end),
        Column::ActualDuration => fmt.days(record.actual_duration_days()),
        Column::ActualHours => fmt.hours(record.actual_hours),
        Column::Cost => fmt.money(record.cost),
    }
}

/// Render one node as a row. Visibility and checkbox state start at their
/// defaults (visible, unchecked); the caller places the row in context.
/// `parent_id` is the parent in the built tree, not the record's raw link.
pub fn render_row(tree: &TaskTree, idx: NodeIdx, fmt: &DisplayFormat) -> RowView {
    let node = tree.node(idx);
    let record = &node.record;
    RowView {
        task_id: record.id.clone(),
        parent_id: node.parent.map(|p| tree.node(p).id().to_string()),
        depth: node.depth,
        has_children: node.has_children(),
        expanded: node.expanded,
        visible: true,
        checked: false,
        selected: false,
        indent: node.depth * fmt.indent,
        cells: Column::ALL
            .iter()
            .map(|&column| CellView {
                column,
                text: cell_text(record, &node.wbs, column, fmt),
                state: CellState::Display,
            })
            .collect(),
        actions: ROW_ACTIONS,
    }
}

/// Render the whole tree in preorder. A row is visible when every ancestor
/// is expanded.
pub fn render_rows(tree: &TaskTree, fmt: &DisplayFormat) -> RowSurface {
    let mut rows = Vec::with_capacity(tree.len());
    let mut stack: Vec<(usize, bool)> = tree.roots().iter().rev().map(|&r| (r, true)).collect();
    while let Some((idx, visible)) = stack.pop() {
        let node = tree.node(idx);
        let mut row = render_row(tree, idx, fmt);
        row.visible = visible;
        rows.push(row);
        let child_visible = visible && node.expanded;
        stack.extend(node.children.iter().rev().map(|&c| (c, child_visible)));
    }
    RowSurface::new(rows)
}
