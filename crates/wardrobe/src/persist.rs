//! Persisted wearable transforms
//!
//! The whole map is stored as JSON under a single key:
//!
//! ```json
//! { "hats": { "Crown": { "position": {..}, "rotation": {..}, "scale": {..},
//!                        "quaternion": {..}, "world_space": true, "children": [..] } },
//!   "shirts": { .. } }
//! ```
//!
//! Hats parented to a bone are recorded in world space so the record stays
//! valid whichever bone parents the hat on reload. Shirts are recorded in
//! local space.

use std::collections::BTreeMap;

use avatar_ipc::WearableCategory;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::graph::{NodeId, NodeTransform, SceneGraph};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3Record {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuatRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl From<Vec3> for Vec3Record {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Record> for Vec3 {
    fn from(v: Vec3Record) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Position, Euler rotation, scale and quaternion of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub position: Vec3Record,
    /// XYZ Euler angles in radians, same orientation as `quaternion`
    pub rotation: Vec3Record,
    pub scale: Vec3Record,
    pub quaternion: QuatRecord,
}

impl From<&NodeTransform> for TransformRecord {
    fn from(t: &NodeTransform) -> Self {
        let q = t.rotation;
        Self {
            position: t.translation.into(),
            rotation: t.euler().into(),
            scale: t.scale.into(),
            quaternion: QuatRecord {
                x: q.x,
                y: q.y,
                z: q.z,
                w: q.w,
            },
        }
    }
}

impl TransformRecord {
    /// The quaternion is authoritative; the Euler triple is informational
    pub fn to_transform(&self) -> NodeTransform {
        let q = Quat::from_xyzw(self.quaternion.x, self.quaternion.y, self.quaternion.z, self.quaternion.w);
        let mut transform = NodeTransform::from_translation(self.position.into());
        if q.length_squared() > 0.0 {
            transform.set_rotation(q);
        } else {
            transform.set_euler(self.rotation.into());
        }
        transform.scale = self.scale.into();
        transform
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub name: String,
    pub index: usize,
    #[serde(flatten)]
    pub transform: TransformRecord,
    pub visible: bool,
}

/// Saved transform of one wearable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTransform {
    #[serde(flatten)]
    pub transform: TransformRecord,
    /// Group transform is in world space rather than parent space
    #[serde(default)]
    pub world_space: bool,
    #[serde(default)]
    pub children: Vec<ChildRecord>,
}

/// Every saved wearable, by logical name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedPositions {
    #[serde(default)]
    pub hats: BTreeMap<String, PersistedTransform>,
    #[serde(default)]
    pub shirts: BTreeMap<String, PersistedTransform>,
}

impl PersistedPositions {
    pub fn category(&self, category: WearableCategory) -> &BTreeMap<String, PersistedTransform> {
        match category {
            WearableCategory::Hat => &self.hats,
            WearableCategory::Shirt => &self.shirts,
        }
    }

    fn category_mut(&mut self, category: WearableCategory) -> &mut BTreeMap<String, PersistedTransform> {
        match category {
            WearableCategory::Hat => &mut self.hats,
            WearableCategory::Shirt => &mut self.shirts,
        }
    }

    pub fn get(&self, category: WearableCategory, name: &str) -> Option<&PersistedTransform> {
        self.category(category).get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.hats.keys().chain(self.shirts.keys()).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hats.is_empty() && self.shirts.is_empty()
    }
}

/// Record one wearable group
pub fn capture_group(graph: &SceneGraph, group: NodeId, category: WearableCategory) -> Option<PersistedTransform> {
    let node = graph.get(group)?;
    let parent_is_bone = node
        .parent()
        .and_then(|p| graph.get(p))
        .is_some_and(|p| p.is_bone);
    let world_space = category == WearableCategory::Hat && parent_is_bone;
    let transform = if world_space {
        graph.world_transform(group)
    } else {
        node.transform
    };

    let children = node
        .children()
        .iter()
        .enumerate()
        .filter_map(|(index, child)| {
            let c = graph.get(*child)?;
            Some(ChildRecord {
                name: c.name.clone(),
                index,
                transform: (&c.transform).into(),
                visible: c.visible,
            })
        })
        .collect();

    Some(PersistedTransform {
        transform: (&transform).into(),
        world_space,
        children,
    })
}

/// Record the current hat and shirt, keyed by their logical names
pub fn capture(graph: &SceneGraph, hat: Option<NodeId>, shirt: Option<NodeId>) -> PersistedPositions {
    let mut positions = PersistedPositions::default();
    for (category, group) in [(WearableCategory::Hat, hat), (WearableCategory::Shirt, shirt)] {
        let Some(group) = group else { continue };
        let Some(name) = graph.get(group).and_then(|n| n.tag.as_ref()).map(|t| t.name.clone()) else {
            continue;
        };
        if let Some(record) = capture_group(graph, group, category) {
            positions.category_mut(category).insert(name, record);
        }
    }
    positions
}

/// Apply a saved record to a wearable group and its children
pub fn apply_saved(graph: &mut SceneGraph, group: NodeId, saved: &PersistedTransform) {
    let transform = saved.transform.to_transform();
    if saved.world_space {
        graph.set_world_transform(group, &transform);
    } else if let Some(node) = graph.get_mut(group) {
        node.transform = transform;
    }

    let children = graph.children(group).to_vec();
    for record in &saved.children {
        let Some(child) = children.get(record.index) else { continue };
        let Some(node) = graph.get_mut(*child) else { continue };
        if node.name != record.name {
            debug!("Saved child '{}' does not match '{}', skipping", record.name, node.name);
            continue;
        }
        node.transform = record.transform.to_transform();
        node.visible = record.visible;
    }
}

/// Persisted positions under one key of a durable store
pub struct PositionStore {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl PositionStore {
    pub fn new(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the stored map
    pub fn write(&mut self, positions: &PersistedPositions) -> Result<(), StoreError> {
        let text = serde_json::to_string(positions)?;
        self.store.set(&self.key, text)
    }

    /// Best-effort read. Missing or unreadable content is `None`.
    pub fn read(&self) -> Option<PersistedPositions> {
        let text = match self.store.get(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read saved positions: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(positions) => Some(positions),
            Err(e) => {
                warn!("Saved positions are unreadable: {}", e);
                None
            }
        }
    }

    /// Saved transform of one wearable, if any
    pub fn load(&self, category: WearableCategory, name: &str) -> Option<PersistedTransform> {
        self.read()?.get(category, name).cloned()
    }
}

impl std::fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionStore").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{SceneNode, WearableTag};
    use crate::store::MemoryStore;

    fn tagged(name: &str, category: WearableCategory) -> SceneNode {
        let mut node = SceneNode::group(name);
        node.tag = Some(WearableTag {
            category,
            name: name.to_string(),
        });
        node
    }

    fn scene() -> (SceneGraph, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("OG").with_transform(NodeTransform::from_translation(Vec3::Y)));
        let head = graph.insert_child(root, SceneNode::bone("Head"));
        let hat = graph.insert_child(
            head,
            tagged("Crown", WearableCategory::Hat).with_transform(NodeTransform::from_translation(Vec3::X)),
        );
        graph.insert_child(hat, SceneNode::group("Band"));
        let shirt = graph.insert_child(
            root,
            tagged("Tux", WearableCategory::Shirt).with_transform(NodeTransform::from_translation(Vec3::Z)),
        );
        (graph, hat, shirt)
    }

    #[test]
    fn test_capture_spaces() {
        let (graph, hat, shirt) = scene();
        let positions = capture(&graph, Some(hat), Some(shirt));

        let crown = positions.get(WearableCategory::Hat, "Crown").unwrap();
        assert!(crown.world_space);
        assert!(Vec3::from(crown.transform.position).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
        assert_eq!(crown.children.len(), 1);
        assert_eq!(crown.children[0].name, "Band");

        let tux = positions.get(WearableCategory::Shirt, "Tux").unwrap();
        assert!(!tux.world_space);
        assert_eq!(Vec3::from(tux.transform.position), Vec3::Z);
    }

    #[test]
    fn test_write_then_load() {
        let (graph, hat, shirt) = scene();
        let store = MemoryStore::new();
        let mut positions = PositionStore::new(Box::new(store.clone()), "avatarBuilder_positions");
        positions.write(&capture(&graph, Some(hat), Some(shirt))).unwrap();

        let raw = store.get("avatarBuilder_positions").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for field in ["position", "rotation", "scale", "quaternion"] {
            assert!(value["hats"]["Crown"].get(field).is_some(), "missing {field}");
            assert!(value["shirts"]["Tux"].get(field).is_some(), "missing {field}");
        }

        assert!(positions.load(WearableCategory::Shirt, "Tux").is_some());
        assert!(positions.load(WearableCategory::Shirt, "Crown").is_none());
    }

    #[test]
    fn test_unreadable_store_is_absent() {
        let mut store = MemoryStore::new();
        store.set("avatarBuilder_positions", "{ broken".to_string()).unwrap();
        let positions = PositionStore::new(Box::new(store), "avatarBuilder_positions");
        assert!(positions.read().is_none());
        assert!(positions.load(WearableCategory::Hat, "Crown").is_none());

        let empty = PositionStore::new(Box::new(MemoryStore::new()), "avatarBuilder_positions");
        assert!(empty.read().is_none());
    }

    #[test]
    fn test_apply_world_space_record() {
        let (mut graph, hat, shirt) = scene();
        let saved = capture(&graph, Some(hat), Some(shirt));

        graph.get_mut(hat).unwrap().transform = NodeTransform::IDENTITY;
        let band = graph.children(hat)[0];
        graph.get_mut(band).unwrap().visible = false;

        apply_saved(&mut graph, hat, saved.get(WearableCategory::Hat, "Crown").unwrap());
        assert!(graph.get(hat).unwrap().transform.translation.abs_diff_eq(Vec3::X, 1e-5));
        assert!(graph.get(band).unwrap().visible);
    }
}
