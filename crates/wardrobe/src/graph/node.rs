//! Scene node payloads.

use avatar_ipc::WearableCategory;
use glam::Vec3;

use super::{Aabb, NodeId, NodeTransform};

/// Per-vertex skinning attributes (four influences per vertex)
#[derive(Debug, Clone, PartialEq)]
pub struct SkinAttributes {
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
}

/// Vertex data of a mesh or curve node, in the node's local space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    /// Triangle (mesh) or segment (curve) indices; `None` means sequential
    pub indices: Option<Vec<u32>>,
    pub skin: Option<SkinAttributes>,
    /// Joints of the skin binding this geometry is deformed by
    pub skeleton: Option<Vec<NodeId>>,
}

impl Geometry {
    pub fn new(positions: Vec<Vec3>, indices: Option<Vec<u32>>) -> Self {
        Self {
            positions,
            indices,
            skin: None,
            skeleton: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some() || self.skeleton.is_some()
    }

    /// Drop skin attributes and the skeleton binding so the geometry renders as a static mesh
    pub fn strip_skinning(&mut self) {
        self.skin = None;
        self.skeleton = None;
    }

    /// Vertex triples of each triangle
    pub fn triangles(&self) -> Vec<[Vec3; 3]> {
        let fetch = |i: u32| self.positions.get(i as usize).copied();
        match &self.indices {
            Some(indices) => indices
                .chunks_exact(3)
                .filter_map(|tri| Some([fetch(tri[0])?, fetch(tri[1])?, fetch(tri[2])?]))
                .collect(),
            None => self
                .positions
                .chunks_exact(3)
                .map(|tri| [tri[0], tri[1], tri[2]])
                .collect(),
        }
    }
}

/// Closed set of node kinds
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeKind {
    #[default]
    Group,
    Mesh(Geometry),
    /// Line geometry, used by printed text and decals
    Curve(Geometry),
}

impl NodeKind {
    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            NodeKind::Group => None,
            NodeKind::Mesh(g) | NodeKind::Curve(g) => Some(g),
        }
    }

    pub fn geometry_mut(&mut self) -> Option<&mut Geometry> {
        match self {
            NodeKind::Group => None,
            NodeKind::Mesh(g) | NodeKind::Curve(g) => Some(g),
        }
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, NodeKind::Curve(_))
    }
}

/// Identifies a wearable wrapper group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WearableTag {
    pub category: WearableCategory,
    pub name: String,
}

/// A node of the scene graph
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Display name, not unique
    pub name: String,
    pub transform: NodeTransform,
    pub kind: NodeKind,
    /// Skeletal joint flag
    pub is_bone: bool,
    pub visible: bool,
    pub tag: Option<WearableTag>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: NodeTransform::IDENTITY,
            kind,
            is_bone: false,
            visible: true,
            tag: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn bone(name: impl Into<String>) -> Self {
        Self {
            is_bone: true,
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.kind.geometry()
    }
}
