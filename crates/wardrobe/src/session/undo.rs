//! Undo and redo against the scene.

use avatar_ipc::{CoreToUi, WearableCategory};
use tracing::{debug, warn};

use super::Wardrobe;
use crate::bones::{BoneRole, find_bone};
use crate::graph::NodeId;
use crate::history::{DeletedNode, GroupSnapshot};

impl Wardrobe {
    /// Step back one history entry. Returns false at the earliest entry.
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.history.undo() else {
            return false;
        };
        if let Some(deleted) = step.deleted {
            self.restore_deleted(&deleted);
        }
        self.apply_snapshots([step.hat, step.shirt]);
        debug!("Undo -> {:?}", self.history.current().map(|e| e.action.as_str()));
        true
    }

    /// Step forward one history entry. Returns false at the latest entry.
    pub fn redo(&mut self) -> bool {
        let Some(step) = self.history.redo() else {
            return false;
        };
        if let Some(deleted) = step.deleted {
            self.detach_deleted(&deleted);
        }
        self.apply_snapshots([step.hat, step.shirt]);
        debug!("Redo -> {:?}", self.history.current().map(|e| e.action.as_str()));
        true
    }

    fn apply_snapshots(&mut self, snapshots: [Option<GroupSnapshot>; 2]) {
        for snapshot in snapshots.into_iter().flatten() {
            snapshot.apply(&mut self.graph);
        }
        self.refresh_manipulator();
    }

    /// Where a wearable goes back when its recorded parent has been freed,
    /// e.g. the head bone of a replaced character
    fn fallback_parent(&self, category: WearableCategory) -> Option<NodeId> {
        let root = self.character.as_ref()?.root;
        match category {
            WearableCategory::Hat => Some(find_bone(&self.graph, root, BoneRole::Head).unwrap_or(root)),
            WearableCategory::Shirt => Some(root),
        }
    }

    /// Put a deleted node back where it was removed from
    fn restore_deleted(&mut self, deleted: &DeletedNode) {
        if !self.graph.contains(deleted.node) {
            warn!("Deleted node no longer exists; nothing to restore");
            return;
        }
        let parent = deleted.parent.unwrap_or(self.scene_root);
        let restored = if self.graph.contains(parent) {
            self.graph.insert_at(parent, deleted.node, deleted.index)
        } else {
            match deleted.category.and_then(|c| self.fallback_parent(c)) {
                Some(fallback) => {
                    debug!(
                        "Former parent of '{}' is gone; restoring onto the current character",
                        self.graph.name(deleted.node).unwrap_or_default()
                    );
                    self.graph.append_child(fallback, deleted.node)
                }
                None => false,
            }
        };
        if !restored {
            warn!(
                "Could not restore '{}': its parent is gone",
                self.graph.name(deleted.node).unwrap_or_default()
            );
            return;
        }

        if let Some(category) = deleted.category {
            if let Some(current) = self.wearable(category)
                && current != deleted.node
            {
                debug!("Restored {} replaces the current one", category);
                self.destroy_wearable(category);
            }
            *self.slot_mut(category) = Some(deleted.node);
            self.emit(CoreToUi::RemoveAvailabilityChanged {
                category,
                enabled: true,
            });
        }
        self.publish_selectables();
    }
}
