use std::collections::HashMap;

use super::row::{CellState, Column, RowView};

/// State of the header "select all" checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectAll {
    #[default]
    Unchecked,
    Checked,
    Indeterminate,
}

/// The rendered rows of one tree, in display order. This is what the
/// terminal draws and what selection is reconciled against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSurface {
    rows: Vec<RowView>,
    index: HashMap<String, usize>,
    select_all: SelectAll,
}

impl RowSurface {
    pub fn new(rows: Vec<RowView>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.task_id.clone(), i))
            .collect();
        RowSurface {
            rows,
            index,
            select_all: SelectAll::Unchecked,
        }
    }

    pub fn rows(&self) -> &[RowView] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.index.get(task_id).copied()
    }

    pub fn row(&self, task_id: &str) -> Option<&RowView> {
        self.position(task_id).map(|i| &self.rows[i])
    }

    pub fn row_mut(&mut self, task_id: &str) -> Option<&mut RowView> {
        self.position(task_id).map(|i| &mut self.rows[i])
    }

    /// Positions of visible rows, top to bottom
    pub fn visible_positions(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.visible)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn visible_ids(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.visible)
            .map(|r| r.task_id.as_str())
            .collect()
    }

    pub fn set_visible(&mut self, task_id: &str, visible: bool) {
        if let Some(row) = self.row_mut(task_id) {
            row.visible = visible;
        }
    }

    pub fn set_expanded(&mut self, task_id: &str, expanded: bool) {
        if let Some(row) = self.row_mut(task_id) {
            row.expanded = expanded;
        }
    }

    /// Set a row's checkbox and its "selected" highlight together
    pub fn set_checked(&mut self, task_id: &str, checked: bool) {
        if let Some(row) = self.row_mut(task_id) {
            row.checked = checked;
            row.selected = checked;
        }
    }

    pub fn checked_ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| r.checked)
            .map(|r| r.task_id.clone())
            .collect()
    }

    pub fn all_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.task_id.clone()).collect()
    }

    pub fn select_all(&self) -> SelectAll {
        self.select_all
    }

    pub fn set_select_all(&mut self, state: SelectAll) {
        self.select_all = state;
    }

    pub fn cell_text(&self, task_id: &str, column: Column) -> Option<&str> {
        self.row(task_id)?.cell(column).map(|c| c.text.as_str())
    }

    /// Replace a cell's text and state; returns false when the cell is gone
    pub fn set_cell(&mut self, task_id: &str, column: Column, text: &str, state: CellState) -> bool {
        match self.row_mut(task_id).and_then(|r| r.cell_mut(column)) {
            Some(cell) => {
                cell.text = text.to_string();
                cell.state = state;
                true
            }
            None => false,
        }
    }
}
