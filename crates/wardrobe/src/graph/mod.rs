//! Arena scene graph
//!
//! Nodes live in a generational arena and refer to each other by [`NodeId`].
//! Parent links are plain ids; ownership is the arena itself, and a node is
//! only freed by [`SceneGraph::remove_subtree`]. World transforms are
//! computed from the parent chain on every read, so there is no cached
//! matrix to go stale after an ancestor moves.

mod bounds;
mod node;
mod transform;

pub use bounds::Aabb;
pub use node::*;
pub use transform::NodeTransform;

use std::collections::HashMap;

use glam::{Mat4, Vec3};

/// Handle to a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Hierarchy of named nodes with transforms and optional geometry
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a detached node. Parent and child links of `node` are ignored.
    pub fn insert(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    /// Insert a node and append it to `parent`
    pub fn insert_child(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.insert(node);
        self.append_child(parent, id);
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Position of `id` among its parent's children
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// True if `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Detach `id` from its parent. Returns the former parent and sibling index.
    pub fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id)?;
        if let Some(p) = self.get_mut(parent) {
            p.children.remove(index);
        }
        if let Some(n) = self.get_mut(id) {
            n.parent = None;
        }
        Some((parent, index))
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    /// Returns false if either node is missing or the link would form a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let index = self.children(parent).len();
        self.insert_at(parent, child, index)
    }

    /// Insert `child` under `parent` at `index` (clamped to the child count)
    pub fn insert_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> bool {
        if !self.contains(parent) || !self.contains(child) || self.is_ancestor_or_self(child, parent) {
            return false;
        }
        self.detach(child);
        let Some(p) = self.get_mut(parent) else {
            return false;
        };
        let index = index.min(p.children.len());
        p.children.insert(index, child);
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        true
    }

    /// Detach `id` and free it together with all its descendants
    pub fn remove_subtree(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        for node in self.descendants(id) {
            let slot = &mut self.slots[node.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
    }

    /// `root` and all its descendants, depth-first pre-order
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First node in the subtree whose name equals `name`
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.name(*id) == Some(name))
    }

    pub fn local_matrix(&self, id: NodeId) -> Mat4 {
        self.get(id)
            .map(|n| n.transform.matrix())
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Composition of the parent chain's local transforms
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get(node_id) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// World matrix of the parent of `id`, identity for roots
    pub fn parent_world_matrix(&self, id: NodeId) -> Mat4 {
        self.parent(id)
            .map(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn world_transform(&self, id: NodeId) -> NodeTransform {
        NodeTransform::from_matrix(self.world_matrix(id))
    }

    /// Express a world-space transform relative to `space` (or world if `None`)
    pub fn world_to_local(&self, space: Option<NodeId>, world: &NodeTransform) -> NodeTransform {
        let parent = space.map(|s| self.world_matrix(s)).unwrap_or(Mat4::IDENTITY);
        NodeTransform::from_matrix(parent.inverse() * world.matrix())
    }

    /// Express a world-space point relative to `space`
    pub fn world_to_local_point(&self, space: NodeId, point: Vec3) -> Vec3 {
        self.world_matrix(space).inverse().transform_point3(point)
    }

    /// Set the local transform of `id` so that its world transform becomes `world`
    pub fn set_world_transform(&mut self, id: NodeId, world: &NodeTransform) {
        let local = self.world_to_local(self.parent(id), world);
        if let Some(node) = self.get_mut(id) {
            node.transform = local;
        }
    }

    /// World-space bounds of the node's own geometry
    pub fn world_bounds(&self, id: NodeId) -> Aabb {
        match self.get(id).and_then(|n| n.geometry()) {
            Some(geometry) => geometry.local_bounds().transformed(&self.world_matrix(id)),
            None => Aabb::EMPTY,
        }
    }

    /// World-space bounds of all geometry in the subtree
    pub fn subtree_bounds(&self, root: NodeId) -> Aabb {
        self.descendants(root)
            .into_iter()
            .fold(Aabb::EMPTY, |acc, id| acc.union(self.world_bounds(id)))
    }

    /// Copy the subtree rooted at `src_root` of `source` into this graph.
    ///
    /// The copy is detached. Skeleton references pointing inside the copied
    /// subtree are remapped; references pointing outside it are dropped.
    pub fn copy_subtree(&mut self, source: &SceneGraph, src_root: NodeId) -> Option<NodeId> {
        if !source.contains(src_root) {
            return None;
        }
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        for src in source.descendants(src_root) {
            let Some(node) = source.get(src) else {
                continue;
            };
            let id = self.insert(node.clone());
            mapping.insert(src, id);
            if let Some(parent) = node.parent.and_then(|p| mapping.get(&p)).copied() {
                self.append_child(parent, id);
            }
        }
        for id in mapping.values().copied().collect::<Vec<_>>() {
            if let Some(geometry) = self.get_mut(id).and_then(|n| n.kind.geometry_mut())
                && let Some(skeleton) = geometry.skeleton.take()
            {
                let remapped: Vec<NodeId> = skeleton.iter().filter_map(|b| mapping.get(b).copied()).collect();
                geometry.skeleton = (!remapped.is_empty()).then_some(remapped);
            }
        }
        mapping.get(&src_root).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-4)
    }

    #[test]
    fn test_world_transform_composes_parent_chain() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(
            SceneNode::group("root").with_transform(NodeTransform::from_trs(
                Vec3::new(1.0, 0.0, 0.0),
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::splat(2.0),
            )),
        );
        let child = graph.insert_child(
            root,
            SceneNode::group("child").with_transform(NodeTransform::from_translation(Vec3::X)),
        );

        // Child offset (1,0,0) scaled by 2 and turned 90 degrees about Z becomes (0,2,0)
        let world = graph.world_transform(child);
        assert!(approx(world.translation, Vec3::new(1.0, 2.0, 0.0)));

        // Moving the parent is reflected immediately
        graph.get_mut(root).unwrap().transform.translation = Vec3::ZERO;
        assert!(approx(graph.world_transform(child).translation, Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_insert_at_and_detach_preserve_order() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("root"));
        let a = graph.insert_child(root, SceneNode::group("a"));
        let b = graph.insert_child(root, SceneNode::group("b"));
        let c = graph.insert_child(root, SceneNode::group("c"));

        assert_eq!(graph.detach(b), Some((root, 1)));
        assert_eq!(graph.children(root), &[a, c]);

        assert!(graph.insert_at(root, b, 1));
        assert_eq!(graph.children(root), &[a, b, c]);
        assert_eq!(graph.sibling_index(c), Some(2));
    }

    #[test]
    fn test_cycles_rejected() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("root"));
        let child = graph.insert_child(root, SceneNode::group("child"));
        assert!(!graph.append_child(child, root));
        assert!(!graph.append_child(root, root));
    }

    #[test]
    fn test_removed_ids_go_stale() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("root"));
        let child = graph.insert_child(root, SceneNode::group("child"));
        graph.remove_subtree(root);

        assert!(!graph.contains(root));
        assert!(!graph.contains(child));

        let reused = graph.insert(SceneNode::group("new"));
        assert!(graph.contains(reused));
        assert_ne!(reused, root);
        assert_ne!(reused, child);
    }

    #[test]
    fn test_world_to_local_inverts_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(SceneNode::group("parent").with_transform(NodeTransform::from_trs(
            Vec3::new(0.5, 1.0, -2.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(1.0, 2.0, 1.0),
        )));
        let world = NodeTransform::from_trs(Vec3::new(3.0, 1.0, 0.0), Quat::from_rotation_x(0.3), Vec3::ONE);
        let local = graph.world_to_local(Some(parent), &world);
        let child = graph.insert_child(parent, SceneNode::group("child").with_transform(local));
        assert!(approx(graph.world_transform(child).translation, world.translation));
    }

    #[test]
    fn test_copy_subtree_remaps_skeleton() {
        let mut source = SceneGraph::new();
        let root = source.insert(SceneNode::group("Scene"));
        let bone = source.insert_child(root, SceneNode::bone("Head"));
        let mut geometry = Geometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], None);
        geometry.skeleton = Some(vec![bone]);
        source.insert_child(root, SceneNode::new("Body", NodeKind::Mesh(geometry)));

        let mut live = SceneGraph::new();
        let copy = live.copy_subtree(&source, root).unwrap();
        let new_bone = live.find_by_name(copy, "Head").unwrap();
        let mesh = live.find_by_name(copy, "Body").unwrap();

        let skeleton = live.get(mesh).unwrap().geometry().unwrap().skeleton.clone().unwrap();
        assert_eq!(skeleton, vec![new_bone]);
        assert_eq!(live.len(), 3);
    }
}
