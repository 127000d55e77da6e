use std::collections::HashMap;

use crate::model::TaskRecord;

/// Index of a node inside a [`TaskTree`]
pub type NodeIdx = usize;

/// One record placed in the hierarchy, plus its view flag
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub record: TaskRecord,
    pub parent: Option<NodeIdx>,
    /// Children in input order
    pub children: Vec<NodeIdx>,
    /// Whether children are shown; only meaningful when there are children
    pub expanded: bool,
    /// Nesting depth (0 = root)
    pub depth: usize,
    /// Work-breakdown number, e.g. `2.1.3`
    pub wbs: String,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Irregularities found in a snapshot. None of them abort the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A later record reused an id; it was dropped
    DuplicateId { id: String },
    /// Parent links formed a loop; `promoted` was made a root to break it
    Cycle { ids: Vec<String>, promoted: String },
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::DuplicateId { id } => write!(f, "duplicate task id {}", id),
            Anomaly::Cycle { ids, promoted } => write!(
                f,
                "parent cycle {} (treating {} as root)",
                ids.join(" -> "),
                promoted
            ),
        }
    }
}

/// The hierarchy built from one flat snapshot. Nodes live in an arena in
/// input order; parent/child links are indices into it.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeIdx>,
    index: HashMap<String, NodeIdx>,
    anomalies: Vec<Anomaly>,
}

impl TaskTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    pub fn node(&self, idx: NodeIdx) -> &TreeNode {
        &self.nodes[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut TreeNode {
        &mut self.nodes[idx]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &TreeNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn find(&self, id: &str) -> Option<NodeIdx> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.find(id).map(|idx| &self.nodes[idx])
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// All nodes depth-first, parents before children, siblings in input order
    pub fn preorder(&self) -> Vec<NodeIdx> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeIdx> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        out
    }

    /// Every descendant of `idx` in preorder (excluding `idx`)
    pub fn descendants(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIdx> = self.nodes[idx].children.iter().rev().copied().collect();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.nodes[cur].children.iter().rev().copied());
        }
        out
    }
}

/// Build the hierarchy from a flat record list.
///
/// Records whose parent does not resolve become roots. Siblings and roots keep
/// input order. Duplicate ids keep their first occurrence; each parent cycle is
/// broken by promoting its earliest member to a root.
pub fn build_tree(records: &[TaskRecord]) -> TaskTree {
    let mut nodes: Vec<TreeNode> = Vec::with_capacity(records.len());
    let mut index: HashMap<String, NodeIdx> = HashMap::with_capacity(records.len());
    let mut anomalies = Vec::new();

    for record in records {
        if index.contains_key(&record.id) {
            anomalies.push(Anomaly::DuplicateId {
                id: record.id.clone(),
            });
            continue;
        }
        index.insert(record.id.clone(), nodes.len());
        nodes.push(TreeNode {
            record: record.clone(),
            parent: None,
            children: Vec::new(),
            expanded: true,
            depth: 0,
            wbs: String::new(),
        });
    }

    let mut parent_of: Vec<Option<NodeIdx>> = nodes
        .iter()
        .map(|n| {
            n.record
                .parent
                .as_deref()
                .and_then(|p| index.get(p).copied())
        })
        .collect();

    break_cycles(&nodes, &mut parent_of, &mut anomalies);

    let mut roots = Vec::new();
    for (idx, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(p) => {
                nodes[*p].children.push(idx);
                nodes[idx].parent = Some(*p);
            }
            None => roots.push(idx),
        }
    }

    assign_positions(&mut nodes, &roots);

    TaskTree {
        nodes,
        roots,
        index,
        anomalies,
    }
}

/// Walk each node's parent chain; a chain that revisits a node from the same
/// walk is a cycle.
fn break_cycles(
    nodes: &[TreeNode],
    parent_of: &mut [Option<NodeIdx>],
    anomalies: &mut Vec<Anomaly>,
) {
    const UNSEEN: usize = usize::MAX;
    // walk_id[n] = index of the walk that first reached n
    let mut walk_id = vec![UNSEEN; nodes.len()];

    for start in 0..nodes.len() {
        if walk_id[start] != UNSEEN {
            continue;
        }
        let mut path: Vec<NodeIdx> = Vec::new();
        let mut cur = Some(start);
        while let Some(n) = cur {
            if walk_id[n] != UNSEEN {
                if walk_id[n] == start {
                    // n is on this walk's path: the loop is path[pos..]
                    if let Some(pos) = path.iter().position(|&p| p == n) {
                        let cycle = &path[pos..];
                        if let Some(&earliest) = cycle.iter().min() {
                            parent_of[earliest] = None;
                            anomalies.push(Anomaly::Cycle {
                                ids: cycle.iter().map(|&i| nodes[i].record.id.clone()).collect(),
                                promoted: nodes[earliest].record.id.clone(),
                            });
                        }
                    }
                }
                break;
            }
            walk_id[n] = start;
            path.push(n);
            cur = parent_of[n];
        }
    }
}

fn assign_positions(nodes: &mut [TreeNode], roots: &[NodeIdx]) {
    let mut stack: Vec<(NodeIdx, usize, String)> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &idx)| (idx, 0, (i + 1).to_string()))
        .collect();
    while let Some((idx, depth, wbs)) = stack.pop() {
        for (i, &child) in nodes[idx].children.iter().enumerate().rev() {
            stack.push((child, depth + 1, format!("{}.{}", wbs, i + 1)));
        }
        nodes[idx].depth = depth;
        nodes[idx].wbs = wbs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(id: &str, parent: Option<&str>) -> TaskRecord {
        let r = TaskRecord::new(id, format!("Task {}", id));
        match parent {
            Some(p) => r.with_parent(p),
            None => r,
        }
    }

    fn ids(tree: &TaskTree, idxs: &[NodeIdx]) -> Vec<String> {
        idxs.iter().map(|&i| tree.node(i).id().to_string()).collect()
    }

    #[test]
    fn builds_scenario_hierarchy() {
        let tree = build_tree(&[
            rec("A", None),
            rec("B", Some("A")),
            rec("C", Some("A")),
            rec("D", Some("B")),
        ]);
        assert_eq!(ids(&tree, tree.roots()), vec!["A"]);
        let a = tree.get("A").unwrap();
        assert_eq!(ids(&tree, &a.children), vec!["B", "C"]);
        let b = tree.get("B").unwrap();
        assert_eq!(ids(&tree, &b.children), vec!["D"]);
        assert!(tree.nodes().all(|(_, n)| n.expanded));
        assert_eq!(tree.get("D").unwrap().depth, 2);
        assert_eq!(tree.get("D").unwrap().wbs, "1.1.1");
        assert_eq!(tree.get("C").unwrap().wbs, "1.2");
        assert!(tree.anomalies().is_empty());
    }

    #[test]
    fn children_before_parent_in_input_still_link() {
        let tree = build_tree(&[rec("D", Some("B")), rec("B", Some("A")), rec("A", None)]);
        assert_eq!(ids(&tree, tree.roots()), vec!["A"]);
        assert_eq!(ids(&tree, &tree.preorder()), vec!["A", "B", "D"]);
    }

    #[test]
    fn unresolved_parent_becomes_root_in_input_order() {
        let tree = build_tree(&[
            rec("X", Some("missing")),
            rec("A", None),
            rec("Y", Some("gone")),
        ]);
        assert_eq!(ids(&tree, tree.roots()), vec!["X", "A", "Y"]);
        assert_eq!(tree.get("Y").unwrap().wbs, "3");
    }

    #[test]
    fn sibling_order_follows_input() {
        let tree = build_tree(&[
            rec("P", None),
            rec("c3", Some("P")),
            rec("c1", Some("P")),
            rec("c2", Some("P")),
        ]);
        assert_eq!(ids(&tree, &tree.get("P").unwrap().children), vec!["c3", "c1", "c2"]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let tree = build_tree(&[rec("A", None), rec("B", Some("A")), rec("A", Some("B"))]);
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.anomalies(),
            &[Anomaly::DuplicateId { id: "A".into() }]
        );
        assert_eq!(ids(&tree, tree.roots()), vec!["A"]);
    }

    #[test]
    fn cycle_is_broken_at_earliest_member() {
        let tree = build_tree(&[
            rec("R", None),
            rec("A", Some("C")),
            rec("B", Some("A")),
            rec("C", Some("B")),
            rec("leaf", Some("B")),
        ]);
        assert_eq!(ids(&tree, tree.roots()), vec!["R", "A"]);
        assert_eq!(ids(&tree, &tree.preorder()), vec!["R", "A", "B", "C", "leaf"]);
        match &tree.anomalies()[0] {
            Anomaly::Cycle { ids, promoted } => {
                assert_eq!(promoted, "A");
                assert_eq!(ids.len(), 3);
            }
            other => panic!("unexpected anomaly {:?}", other),
        }
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let tree = build_tree(&[rec("S", Some("S"))]);
        assert_eq!(ids(&tree, tree.roots()), vec!["S"]);
        assert_eq!(tree.anomalies().len(), 1);
    }

    #[test]
    fn every_record_appears_once_in_acyclic_lists() {
        // Deterministic pseudo-random lists: parents always point to a lower
        // original index, and the list is shuffled before building.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };
        for round in 0..50 {
            let n = 1 + (round % 40);
            let mut records: Vec<TaskRecord> = (0..n)
                .map(|i| {
                    let parent = if i > 0 && next() % 3 != 0 {
                        Some(format!("n{}", next() as usize % i))
                    } else {
                        None
                    };
                    let r = TaskRecord::new(format!("n{}", i), "x");
                    match parent {
                        Some(p) => r.with_parent(p),
                        None => r,
                    }
                })
                .collect();
            for i in (1..records.len()).rev() {
                let j = next() as usize % (i + 1);
                records.swap(i, j);
            }

            let tree = build_tree(&records);
            let mut seen = ids(&tree, &tree.preorder());
            assert_eq!(seen.len(), n);
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), n);
            assert!(tree.anomalies().is_empty());
        }
    }

    #[test]
    fn descendants_are_preorder() {
        let tree = build_tree(&[
            rec("A", None),
            rec("B", Some("A")),
            rec("C", Some("A")),
            rec("D", Some("B")),
        ]);
        let a = tree.find("A").unwrap();
        assert_eq!(ids(&tree, &tree.descendants(a)), vec!["B", "D", "C"]);
    }
}
