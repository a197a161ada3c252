//! Selection, edit mode and deletion.

use avatar_ipc::{CoreToUi, GizmoMode, Transform3D, WearableCategory};
use glam::Vec3;
use tracing::{debug, info};

use super::Wardrobe;
use crate::error::WardrobeError;
use crate::graph::NodeId;
use crate::history::DeletedNode;
use crate::manipulate::ManipulatorTarget;
use crate::pick::{Ray, pick_nearest};

/// History label for gizmo edits
pub const TRANSFORM_ACTION: &str = "Transform object";

impl Wardrobe {
    /// Wearable category whose subtree contains `node`
    fn owning_category(&self, node: NodeId) -> Option<WearableCategory> {
        WearableCategory::ALL.into_iter().find(|c| {
            self.wearable(*c)
                .is_some_and(|group| self.graph.is_ancestor_or_self(group, node))
        })
    }

    /// Selectable identifier of `node`. Nodes below a group's direct
    /// children report the id of the child they belong to.
    pub fn selectable_id(&self, node: NodeId) -> Option<String> {
        let category = self.owning_category(node)?;
        let group = self.wearable(category)?;
        if node == group {
            return Some(category.as_str().to_string());
        }
        self.graph
            .children(group)
            .iter()
            .position(|child| self.graph.is_ancestor_or_self(*child, node))
            .map(|index| format!("{}_{}", category.as_str(), index))
    }

    /// Node behind a selectable identifier
    pub fn resolve_selectable(&self, id: &str) -> Option<NodeId> {
        let (prefix, index) = match id.split_once('_') {
            Some((prefix, index)) => (prefix, Some(index.parse::<usize>().ok()?)),
            None => (id, None),
        };
        let category = WearableCategory::ALL.into_iter().find(|c| c.as_str() == prefix)?;
        let group = self.wearable(category)?;
        match index {
            None => Some(group),
            Some(i) => self.graph.children(group).get(i).copied(),
        }
    }

    /// Selectable id of the current selection
    pub fn selected_id(&self) -> Option<String> {
        self.selected.and_then(|node| self.selectable_id(node))
    }

    fn attach_manipulator(&mut self, node: NodeId) {
        let Some(transform) = self.graph.get(node).map(|n| n.transform) else {
            return;
        };
        let id = self.selectable_id(node).unwrap_or_default();
        self.manipulator.attach(&ManipulatorTarget {
            node,
            id: id.clone(),
            transform,
        });
        self.manipulator.set_mode(self.gizmo_mode);
        self.emit(CoreToUi::GizmoAttached {
            id,
            mode: self.gizmo_mode,
        });
    }

    /// Re-attach the manipulator so it picks up a changed transform
    pub(super) fn refresh_manipulator(&mut self) {
        if let Some(node) = self.selected {
            self.manipulator.detach();
            self.attach_manipulator(node);
        }
    }

    /// Drop the selection without recording anything
    pub(super) fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.manipulator.detach();
            self.dragging = false;
            self.emit(CoreToUi::GizmoDetached);
            self.emit(CoreToUi::SelectionChanged { selected_id: None });
        }
    }

    /// Make `node` the edit target.
    ///
    /// Only hat and shirt nodes can be selected, and only in edit mode.
    /// Switching away from a previous target records it first. Returns
    /// false if nothing changed.
    pub fn select_node(&mut self, node: NodeId) -> bool {
        if !self.edit_mode {
            debug!("Selection ignored outside edit mode");
            return false;
        }
        if self.owning_category(node).is_none() {
            debug!("Node is not part of a wearable");
            return false;
        }
        if self.selected == Some(node) {
            return false;
        }
        if self.selected.is_some() {
            self.commit(TRANSFORM_ACTION);
            self.manipulator.detach();
        }
        self.selected = Some(node);
        self.gizmo_mode = GizmoMode::Translate;
        self.attach_manipulator(node);
        info!("Selected '{}'", self.graph.name(node).unwrap_or_default());
        let selected_id = self.selectable_id(node);
        self.emit(CoreToUi::SelectionChanged { selected_id });
        true
    }

    /// Select from the selectable list. An empty id deselects.
    pub fn select_by_id(&mut self, id: &str) -> Result<(), WardrobeError> {
        if id.is_empty() {
            self.deselect();
            return Ok(());
        }
        let Some(node) = self.resolve_selectable(id) else {
            let error = WardrobeError::UnknownSelection(id.to_string());
            self.alert(&error);
            return Err(error);
        };
        self.select_node(node);
        Ok(())
    }

    /// Select the nearest wearable node hit by a world-space ray.
    /// A miss deselects.
    pub fn pick(&mut self, origin: Vec3, direction: Vec3) -> Option<NodeId> {
        if !self.edit_mode {
            return None;
        }
        let ray = Ray::new(origin, direction)?;
        let candidates: Vec<NodeId> = [self.hat, self.shirt]
            .into_iter()
            .flatten()
            .flat_map(|group| self.graph.descendants(group))
            .filter(|id| self.graph.get(*id).is_some_and(|n| n.geometry().is_some()))
            .collect();

        match pick_nearest(&self.graph, &candidates, &ray) {
            Some(hit) => {
                self.select_node(hit.node);
                Some(hit.node)
            }
            None => {
                self.deselect();
                None
            }
        }
    }

    /// Record the current target and drop the selection
    pub fn deselect(&mut self) {
        if self.selected.is_some() {
            self.commit(TRANSFORM_ACTION);
            self.clear_selection();
        }
    }

    pub fn set_edit_mode(&mut self, enabled: bool) {
        if enabled {
            self.edit_mode = true;
            self.publish_selectables();
        } else {
            self.deselect();
            self.edit_mode = false;
        }
        info!("Edit mode {}", if enabled { "on" } else { "off" });
    }

    /// Gizmo drag started or ended. Orbit is off while dragging and a
    /// finished drag is recorded.
    pub fn drag_changed(&mut self, dragging: bool) {
        if self.dragging == dragging {
            return;
        }
        self.dragging = dragging;
        self.emit(CoreToUi::OrbitControlsChanged { enabled: !dragging });
        if !dragging && self.selected.is_some() {
            self.commit(TRANSFORM_ACTION);
        }
    }

    /// Set the local transform of a selectable node. Not recorded until
    /// the next commit.
    pub fn set_transform(&mut self, id: &str, transform: Transform3D) -> Result<(), WardrobeError> {
        let Some(node) = self.resolve_selectable(id).and_then(|n| self.graph.get_mut(n)) else {
            return Err(WardrobeError::UnknownSelection(id.to_string()));
        };
        node.transform = transform.into();
        Ok(())
    }

    pub fn set_gizmo_mode(&mut self, mode: GizmoMode) {
        self.gizmo_mode = mode;
        self.manipulator.set_mode(mode);
        self.emit(CoreToUi::GizmoModeChanged { mode });
    }

    /// Delete the selected node. Undo brings it back.
    pub fn delete_selected(&mut self) -> bool {
        let Some(node) = self.selected else {
            debug!("Nothing selected to delete");
            return false;
        };
        let name = self.graph.name(node).unwrap_or_default().to_string();
        self.delete_node(node, format!("Delete {}", name))
    }

    /// Remove the current wearable of `category`. Undo brings it back.
    pub fn remove_wearable(&mut self, category: WearableCategory) -> bool {
        let Some(group) = self.wearable(category) else {
            return false;
        };
        self.deselect();
        let name = self.wearable_name(category).unwrap_or_default().to_string();
        self.delete_node(group, format!("Remove {}", name))
    }

    fn delete_node(&mut self, node: NodeId, action: String) -> bool {
        let Some(index) = self.graph.sibling_index(node) else {
            return false;
        };
        let category = WearableCategory::ALL
            .into_iter()
            .find(|c| self.wearable(*c) == Some(node));
        let deleted = DeletedNode {
            node,
            parent: self.graph.parent(node),
            index,
            category,
        };
        self.commit_deletion(action, deleted);
        self.detach_deleted(&deleted);
        self.persist();
        true
    }

    /// Take a deleted node out of the scene and clear what referred to it
    pub(super) fn detach_deleted(&mut self, deleted: &DeletedNode) {
        if self.selected.is_some_and(|s| self.graph.is_ancestor_or_self(deleted.node, s)) {
            self.clear_selection();
        }
        self.graph.detach(deleted.node);
        if let Some(category) = deleted.category
            && self.wearable(category) == Some(deleted.node)
        {
            *self.slot_mut(category) = None;
            self.emit(CoreToUi::RemoveAvailabilityChanged {
                category,
                enabled: false,
            });
        }
        info!("Removed '{}'", self.graph.name(deleted.node).unwrap_or_default());
        self.publish_selectables();
    }
}
