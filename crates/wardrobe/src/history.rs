//! Bounded linear undo history
//!
//! Entries hold transform snapshots of the hat and shirt groups, taken at
//! commit time. A deletion entry additionally records the detached node
//! and where it came from. While the deletion is in effect the node sits
//! outside the scene and belongs to its entry; entries dropped by
//! [`History::push`] are handed back so the caller can free such nodes.

use tracing::debug;

use crate::constants::SNAPSHOT_EPSILON;
use crate::graph::{NodeId, NodeTransform, SceneGraph};
use avatar_ipc::WearableCategory;

/// Transform of one direct child of a wearable group
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSnapshot {
    pub node: NodeId,
    pub index: usize,
    pub name: String,
    pub transform: NodeTransform,
    pub visible: bool,
}

/// Transform of a wearable group and its direct children
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSnapshot {
    pub node: NodeId,
    pub transform: NodeTransform,
    pub children: Vec<ChildSnapshot>,
}

impl GroupSnapshot {
    pub fn capture(graph: &SceneGraph, group: NodeId) -> Option<Self> {
        let node = graph.get(group)?;
        let children = node
            .children()
            .iter()
            .enumerate()
            .filter_map(|(index, child)| {
                let c = graph.get(*child)?;
                Some(ChildSnapshot {
                    node: *child,
                    index,
                    name: c.name.clone(),
                    transform: c.transform,
                    visible: c.visible,
                })
            })
            .collect();
        Some(Self {
            node: group,
            transform: node.transform,
            children,
        })
    }

    /// Write the snapshot back. Nodes that no longer exist, or children that
    /// moved to another parent, are skipped.
    pub fn apply(&self, graph: &mut SceneGraph) {
        let Some(group) = graph.get_mut(self.node) else {
            debug!("Snapshot target no longer exists");
            return;
        };
        group.transform = self.transform;
        for child in &self.children {
            if graph.parent(child.node) != Some(self.node) {
                continue;
            }
            if let Some(node) = graph.get_mut(child.node) {
                node.transform = child.transform;
                node.visible = child.visible;
            }
        }
    }

    fn same_state(&self, other: &Self) -> bool {
        self.node == other.node
            && self.transform.abs_diff_eq(&other.transform, SNAPSHOT_EPSILON)
            && self.children.len() == other.children.len()
            && self.children.iter().zip(&other.children).all(|(a, b)| {
                a.node == b.node && a.visible == b.visible && a.transform.abs_diff_eq(&b.transform, SNAPSHOT_EPSILON)
            })
    }
}

/// A node removed by a deletion entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedNode {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    pub index: usize,
    /// Set when the node was the hat or shirt group
    pub category: Option<WearableCategory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub action: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub hat: Option<GroupSnapshot>,
    pub shirt: Option<GroupSnapshot>,
    pub deleted: Option<DeletedNode>,
}

impl HistoryEntry {
    pub fn new(action: impl Into<String>, hat: Option<GroupSnapshot>, shirt: Option<GroupSnapshot>) -> Self {
        Self {
            action: action.into(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            hat,
            shirt,
            deleted: None,
        }
    }

    pub fn with_deleted(mut self, deleted: DeletedNode) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn snapshot(&self, category: WearableCategory) -> Option<&GroupSnapshot> {
        match category {
            WearableCategory::Hat => self.hat.as_ref(),
            WearableCategory::Shirt => self.shirt.as_ref(),
        }
    }

    fn same_state(&self, other: &Self) -> bool {
        fn same(a: &Option<GroupSnapshot>, b: &Option<GroupSnapshot>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_state(b),
                _ => false,
            }
        }
        same(&self.hat, &other.hat) && same(&self.shirt, &other.shirt)
    }
}

/// What an undo or redo step must restore
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStep {
    /// Deletion to revert (undo) or re-apply (redo)
    pub deleted: Option<DeletedNode>,
    pub hat: Option<GroupSnapshot>,
    pub shirt: Option<GroupSnapshot>,
}

/// Result of a push
#[derive(Debug, Default)]
pub struct PushOutcome {
    /// The entry matched the current one and was not stored
    pub coalesced: bool,
    /// Entries discarded from the redo tail or evicted from the front
    pub dropped: Vec<HistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    current: Option<usize>,
    max_entries: usize,
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        match self.current {
            Some(i) => i + 1 < self.entries.len(),
            None => !self.entries.is_empty(),
        }
    }

    /// True if `node` is held by a deletion entry
    pub fn owns_deleted(&self, node: NodeId) -> bool {
        self.entries.iter().any(|e| e.deleted.is_some_and(|d| d.node == node))
    }

    /// Append an entry after the current one.
    ///
    /// The redo tail is always discarded. A non-deletion entry identical to
    /// the current entry is not stored again.
    pub fn push(&mut self, entry: HistoryEntry) -> PushOutcome {
        let mut outcome = PushOutcome::default();
        let keep = self.current.map_or(0, |i| i + 1);
        outcome.dropped.extend(self.entries.drain(keep..));

        if entry.deleted.is_none() && self.current().is_some_and(|c| c.same_state(&entry)) {
            debug!("History: '{}' matches the current entry", entry.action);
            outcome.coalesced = true;
            return outcome;
        }

        self.entries.push(entry);
        self.current = Some(self.entries.len() - 1);

        while self.entries.len() > self.max_entries {
            outcome.dropped.push(self.entries.remove(0));
            self.current = self.current.map(|i| i.saturating_sub(1));
        }
        outcome
    }

    /// Step back one entry
    pub fn undo(&mut self) -> Option<HistoryStep> {
        let index = match self.current {
            Some(i) if i > 0 => i,
            _ => {
                debug!("Undo: no earlier entry");
                return None;
            }
        };
        let undone = self.entries[index].deleted;
        self.current = Some(index - 1);
        let target = &self.entries[index - 1];
        Some(HistoryStep {
            deleted: undone,
            hat: target.hat.clone(),
            shirt: target.shirt.clone(),
        })
    }

    /// Step forward one entry
    pub fn redo(&mut self) -> Option<HistoryStep> {
        let next = self.current.map_or(0, |i| i + 1);
        let Some(entry) = self.entries.get(next) else {
            debug!("Redo: no later entry");
            return None;
        };
        self.current = Some(next);
        Some(HistoryStep {
            deleted: entry.deleted,
            hat: entry.hat.clone(),
            shirt: entry.shirt.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SceneNode;
    use glam::Vec3;

    fn graph_with_group() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let group = graph.insert(SceneNode::group("Crown"));
        graph.insert_child(group, SceneNode::group("Band"));
        (graph, group)
    }

    fn entry_at(graph: &mut SceneGraph, group: NodeId, x: f32) -> HistoryEntry {
        graph.get_mut(group).unwrap().transform.translation.x = x;
        HistoryEntry::new(format!("x={x}"), GroupSnapshot::capture(graph, group), None)
    }

    #[test]
    fn test_undo_redo_bounds_are_no_ops() {
        let (mut graph, group) = graph_with_group();
        let mut history = History::new(50);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.push(entry_at(&mut graph, group, 1.0));
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.current_index(), Some(0));
    }

    #[test]
    fn test_commit_then_undo_restores_snapshot() {
        let (mut graph, group) = graph_with_group();
        let mut history = History::new(50);
        history.push(entry_at(&mut graph, group, 1.0));
        history.push(entry_at(&mut graph, group, 2.0));

        let step = history.undo().unwrap();
        step.hat.unwrap().apply(&mut graph);
        assert_eq!(graph.get(group).unwrap().transform.translation.x, 1.0);

        let step = history.redo().unwrap();
        step.hat.unwrap().apply(&mut graph);
        assert_eq!(graph.get(group).unwrap().transform.translation.x, 2.0);
    }

    #[test]
    fn test_push_after_undo_discards_redo_tail() {
        let (mut graph, group) = graph_with_group();
        let mut history = History::new(50);
        for x in [1.0, 2.0, 3.0] {
            history.push(entry_at(&mut graph, group, x));
        }
        history.undo();
        history.undo();

        let outcome = history.push(entry_at(&mut graph, group, 9.0));
        assert_eq!(outcome.dropped.len(), 2);
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_eviction_shifts_index() {
        let (mut graph, group) = graph_with_group();
        let mut history = History::new(3);
        for x in 1..=5 {
            history.push(entry_at(&mut graph, group, x as f32));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_index(), Some(2));
        assert_eq!(history.entries()[0].action, "x=3");
    }

    #[test]
    fn test_identical_commit_coalesces() {
        let (mut graph, group) = graph_with_group();
        let mut history = History::new(50);
        history.push(entry_at(&mut graph, group, 1.0));
        let outcome = history.push(entry_at(&mut graph, group, 1.0));
        assert!(outcome.coalesced);
        assert_eq!(history.len(), 1);

        // Deletions are always recorded
        let deleted = DeletedNode {
            node: group,
            parent: None,
            index: 0,
            category: Some(WearableCategory::Hat),
        };
        let outcome = history.push(entry_at(&mut graph, group, 1.0).with_deleted(deleted));
        assert!(!outcome.coalesced);
        assert_eq!(history.len(), 2);
        assert!(history.owns_deleted(group));
    }

    #[test]
    fn test_apply_skips_reparented_children() {
        let (mut graph, group) = graph_with_group();
        let band = graph.children(group)[0];
        let snapshot = GroupSnapshot::capture(&graph, group).unwrap();

        graph.get_mut(band).unwrap().transform.translation = Vec3::ONE;
        graph.detach(band);
        snapshot.apply(&mut graph);
        assert_eq!(graph.get(band).unwrap().transform.translation, Vec3::ONE);
    }
}
