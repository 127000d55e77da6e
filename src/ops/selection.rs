use indexmap::IndexSet;

use crate::table::{RowSurface, SelectAll};

/// The authoritative set of selected task ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: IndexSet<String>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// A row checkbox changed: update membership and the row highlight,
    /// then reconcile against the surface.
    pub fn on_row_checkbox(&mut self, surface: &mut RowSurface, id: &str, checked: bool) {
        if surface.row(id).is_none() {
            return;
        }
        if checked {
            self.ids.insert(id.to_string());
        } else {
            self.ids.shift_remove(id);
        }
        surface.set_checked(id, checked);
        self.reconcile(surface);
    }

    /// The header checkbox changed: every row takes the clicked state through
    /// the per-row path.
    pub fn on_select_all(&mut self, surface: &mut RowSurface, checked: bool) {
        self.ids.clear();
        for id in surface.all_ids() {
            self.on_row_checkbox(surface, &id, checked);
        }
        self.reconcile(surface);
    }

    /// Rebuild the set from checked rows and recompute the header state
    pub fn reconcile(&mut self, surface: &mut RowSurface) {
        self.ids = surface.checked_ids().into_iter().collect();
        surface.set_select_all(select_all_state(self.ids.len(), surface.len()));
    }
}

pub fn select_all_state(checked: usize, total: usize) -> SelectAll {
    if checked == 0 || total == 0 {
        SelectAll::Unchecked
    } else if checked == total {
        SelectAll::Checked
    } else {
        SelectAll::Indeterminate
    }
}
