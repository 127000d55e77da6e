use pretty_assertions::assert_eq;
use tasktree::model::TaskRecord;
use tasktree::table::{DisplayFormat, RowSurface, render_rows};
use tasktree::tree::{TaskTree, build_tree, collapse_all, expand_all, toggle};

mod common;

fn build(records: &[TaskRecord]) -> (TaskTree, RowSurface) {
    let tree = build_tree(records);
    let surface = render_rows(&tree, &DisplayFormat::default());
    (tree, surface)
}

fn ids(tree: &TaskTree, idxs: &[usize]) -> Vec<String> {
    idxs.iter().map(|&i| tree.node(i).id().to_string()).collect()
}

fn visible(surface: &RowSurface) -> Vec<&str> {
    surface.visible_ids()
}

#[test]
fn every_record_appears_once_in_input_order() {
    let records = vec![
        TaskRecord::new("X", "x"),
        TaskRecord::new("Y1", "y1").with_parent("Y"),
        TaskRecord::new("Y", "y"),
        TaskRecord::new("Z", "z").with_parent("missing"),
        TaskRecord::new("Y2", "y2").with_parent("Y"),
        TaskRecord::new("X1", "x1").with_parent("X"),
    ];
    let (tree, _) = build(&records);

    let mut seen = ids(&tree, &tree.preorder());
    assert_eq!(seen, vec!["X", "X1", "Y", "Y1", "Y2", "Z"]);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), records.len());

    // roots keep input order; the unresolved parent makes Z a root
    assert_eq!(ids(&tree, tree.roots()), vec!["X", "Y", "Z"]);
    let y = tree.find("Y").unwrap();
    assert_eq!(ids(&tree, &tree.node(y).children), vec!["Y1", "Y2"]);
    assert!(tree.anomalies().is_empty());
}

#[test]
fn abcd_builds_and_collapses() {
    let (mut tree, mut surface) = build(&common::abcd());

    assert_eq!(ids(&tree, tree.roots()), vec!["A"]);
    let a = tree.find("A").unwrap();
    let b = tree.find("B").unwrap();
    assert_eq!(ids(&tree, &tree.node(a).children), vec!["B", "C"]);
    assert_eq!(ids(&tree, &tree.node(b).children), vec!["D"]);

    toggle(&mut tree, &mut surface, "A");
    assert_eq!(visible(&surface), vec!["A"]);

    toggle(&mut tree, &mut surface, "A");
    assert_eq!(visible(&surface), vec!["A", "B", "D", "C"]);
}

#[test]
fn re_expanding_keeps_collapsed_grandchild_hidden() {
    let (mut tree, mut surface) = build(&common::abcd());
    toggle(&mut tree, &mut surface, "B");
    toggle(&mut tree, &mut surface, "A");
    toggle(&mut tree, &mut surface, "A");
    assert_eq!(visible(&surface), vec!["A", "B", "C"]);
    assert!(!tree.get("B").unwrap().expanded);
}

#[test]
fn toggle_is_its_own_inverse() {
    let (mut tree, mut surface) = build(&common::abcd());
    toggle(&mut tree, &mut surface, "B");
    let before_rows = surface.clone();
    let before_flags: Vec<bool> = tree.nodes().map(|(_, n)| n.expanded).collect();

    let out = toggle(&mut tree, &mut surface, "A").unwrap();
    assert!(!out.expanded);
    assert_eq!(out.child_count, 2);
    toggle(&mut tree, &mut surface, "A");

    let after_flags: Vec<bool> = tree.nodes().map(|(_, n)| n.expanded).collect();
    assert_eq!(after_flags, before_flags);
    assert_eq!(surface, before_rows);
}

#[test]
fn toggling_a_leaf_does_nothing() {
    let (mut tree, mut surface) = build(&common::abcd());
    assert!(toggle(&mut tree, &mut surface, "D").is_none());
    assert!(toggle(&mut tree, &mut surface, "nope").is_none());
    assert_eq!(visible(&surface).len(), 4);
}

#[test]
fn collapse_all_then_expand_all_restores_everything() {
    let (mut tree, mut surface) = build(&common::abcd());
    toggle(&mut tree, &mut surface, "B");
    toggle(&mut tree, &mut surface, "A");

    collapse_all(&mut tree, &mut surface);
    assert_eq!(visible(&surface), vec!["A"]);
    assert!(tree.nodes().all(|(_, n)| !n.has_children() || !n.expanded));

    expand_all(&mut tree, &mut surface);
    assert_eq!(visible(&surface), vec!["A", "B", "D", "C"]);
    assert!(tree.nodes().all(|(_, n)| n.expanded));
}

#[test]
fn cycles_and_duplicates_are_reported_not_lost() {
    let records = vec![
        TaskRecord::new("P", "p").with_parent("Q"),
        TaskRecord::new("Q", "q").with_parent("P"),
        TaskRecord::new("R", "r"),
        TaskRecord::new("R", "r again"),
    ];
    let (tree, surface) = build(&records);
    let mut all = ids(&tree, &tree.preorder());
    all.sort();
    assert_eq!(all, vec!["P", "Q", "R"]);
    assert_eq!(surface.len(), 3);
    assert_eq!(tree.anomalies().len(), 2);
}
