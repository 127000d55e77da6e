use crate::table::RowSurface;

use super::builder::{NodeIdx, TaskTree};

/// Result of flipping one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub expanded: bool,
    /// Direct children shown or hidden
    pub child_count: usize,
}

/// Flip the expanded flag of `id` and show or hide its descendants.
///
/// Returns `None` for unknown ids and for leaves, which have nothing to
/// toggle. When showing, a child's own subtree is shown only if that child
/// is itself expanded; when hiding, every descendant is hidden.
pub fn toggle(tree: &mut TaskTree, surface: &mut RowSurface, id: &str) -> Option<ToggleOutcome> {
    let idx = tree.find(id)?;
    if !tree.node(idx).has_children() {
        return None;
    }
    let expanded = !tree.node(idx).expanded;
    tree.node_mut(idx).expanded = expanded;
    surface.set_expanded(id, expanded);

    let children = tree.node(idx).children.clone();
    for &child in &children {
        if expanded {
            show_subtree(tree, surface, child);
        } else {
            hide_subtree(tree, surface, child);
        }
    }
    Some(ToggleOutcome {
        expanded,
        child_count: children.len(),
    })
}

fn show_subtree(tree: &TaskTree, surface: &mut RowSurface, idx: NodeIdx) {
    let mut stack = vec![idx];
    while let Some(cur) = stack.pop() {
        let node = tree.node(cur);
        surface.set_visible(node.id(), true);
        if node.expanded {
            stack.extend(node.children.iter().copied());
        }
    }
}

fn hide_subtree(tree: &TaskTree, surface: &mut RowSurface, idx: NodeIdx) {
    surface.set_visible(tree.node(idx).id(), false);
    for desc in tree.descendants(idx) {
        surface.set_visible(tree.node(desc).id(), false);
    }
}

/// Expand every parent and show every row
pub fn expand_all(tree: &mut TaskTree, surface: &mut RowSurface) {
    set_all(tree, surface, true);
}

/// Collapse every parent and hide every non-root row
pub fn collapse_all(tree: &mut TaskTree, surface: &mut RowSurface) {
    set_all(tree, surface, false);
}

fn set_all(tree: &mut TaskTree, surface: &mut RowSurface, expanded: bool) {
    for idx in 0..tree.len() {
        let (is_root, has_children) = {
            let node = tree.node(idx);
            (node.parent.is_none(), node.has_children())
        };
        if has_children {
            tree.node_mut(idx).expanded = expanded;
        }
        let id = tree.node(idx).id().to_string();
        if has_children {
            surface.set_expanded(&id, expanded);
        }
        surface.set_visible(&id, expanded || is_root);
    }
}
