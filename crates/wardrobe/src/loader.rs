//! Asset requests and the glTF asset source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use avatar_config::BuilderConfig;
use avatar_ipc::AssetKind;
use glam::{Quat, Vec3};
use gltf::mesh::Mode;
use tracing::{debug, info};

use crate::error::AssetError;
use crate::graph::{Geometry, NodeId, NodeKind, NodeTransform, SceneGraph, SceneNode, SkinAttributes};

/// A resolved request for one model file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub kind: AssetKind,
    /// Logical name
    pub name: String,
    /// Category folder, e.g. `WEARABLES/Hats`
    pub folder: String,
    /// Percent-encoded relative path, e.g. `WEARABLES/Hats/Top%20Hat.glb`
    pub url: String,
    /// Plain relative file path
    pub file: PathBuf,
    /// Picked by the user from disk rather than the catalog
    pub user_file: bool,
}

impl AssetRequest {
    pub fn new(config: &BuilderConfig, kind: AssetKind, name: &str) -> Self {
        let folder_name = match kind {
            AssetKind::Fur => &config.fur_folder,
            AssetKind::Hat => &config.hat_folder,
            AssetKind::Shirt => &config.shirt_folder,
        };
        let folder = config.category_dir(folder_name);
        let file_name = format!("{}.{}", name, config.extension);
        let url = folder
            .split('/')
            .chain(std::iter::once(file_name.as_str()))
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            kind,
            name: name.to_string(),
            file: Path::new(&folder).join(&file_name),
            folder,
            url,
            user_file: false,
        }
    }

    /// A base character model picked by the user. The path is used as is.
    pub fn user_file(path: &str) -> Self {
        let file = PathBuf::from(path);
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        let folder = file
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            kind: AssetKind::Fur,
            name,
            folder,
            url: path.to_string(),
            file,
            user_file: true,
        }
    }

    /// File name with extension
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// A parsed asset: a scene graph and its root
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub graph: SceneGraph,
    pub root: NodeId,
}

/// Capability that turns a request into a scene graph
pub trait AssetSource: Send + Sync {
    fn load(&self, request: &AssetRequest) -> Result<LoadedAsset, AssetError>;
}

/// Loads `.glb`/`.gltf` files below a root directory
#[derive(Debug, Clone)]
pub struct GltfAssetSource {
    root: PathBuf,
}

impl GltfAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for GltfAssetSource {
    fn load(&self, request: &AssetRequest) -> Result<LoadedAsset, AssetError> {
        let path = self.root.join(&request.file);
        if !path.exists() {
            return Err(AssetError::NotFound(request.url.clone()));
        }
        import_gltf(&path)
    }
}

/// Import a glTF file into a scene graph.
///
/// Triangle primitives become meshes, line primitives become curves and
/// point primitives are skipped. Nodes listed as skin joints are flagged as
/// bones, and skinned meshes keep their joint list and skin attributes.
pub fn import_gltf(path: &Path) -> Result<LoadedAsset, AssetError> {
    let (document, buffers, _images) = gltf::import(path)?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::NoScene(path.to_path_buf()))?;

    let mut graph = SceneGraph::new();
    let root = graph.insert(SceneNode::group(scene.name().unwrap_or("Scene")));
    let mut ids: HashMap<usize, NodeId> = HashMap::new();
    // Per-primitive child nodes split out of a multi-primitive mesh node
    let mut split: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    let mut stack: Vec<(gltf::Node, NodeId)> = scene.nodes().collect::<Vec<_>>().into_iter().rev().map(|n| (n, root)).collect();
    while let Some((node, parent)) = stack.pop() {
        let name = node.name().unwrap_or_default().to_string();
        let (t, r, s) = node.transform().decomposed();
        let transform = NodeTransform::from_trs(Vec3::from_array(t), Quat::from_array(r).normalize(), Vec3::from_array(s));

        let mut primitives: Vec<NodeKind> = Vec::new();
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if let Some(kind) = read_primitive(&primitive, &buffers) {
                    primitives.push(kind);
                }
            }
        }

        // A single primitive is the node itself; several become child nodes
        let id = if primitives.len() == 1 {
            let kind = primitives.remove(0);
            graph.insert_child(parent, SceneNode::new(name.clone(), kind).with_transform(transform))
        } else {
            let id = graph.insert_child(parent, SceneNode::group(name.clone()).with_transform(transform));
            let parts: Vec<NodeId> = primitives
                .into_iter()
                .map(|kind| graph.insert_child(id, SceneNode::new(name.clone(), kind)))
                .collect();
            if !parts.is_empty() {
                split.insert(id, parts);
            }
            id
        };
        ids.insert(node.index(), id);
        stack.extend(node.children().collect::<Vec<_>>().into_iter().rev().map(|c| (c, id)));
    }

    // Skins reference nodes anywhere in the document, so bind them once all nodes exist
    for node in document.nodes() {
        let Some(skin) = node.skin() else { continue };
        let joints: Vec<NodeId> = skin.joints().filter_map(|j| ids.get(&j.index()).copied()).collect();
        for joint in &joints {
            if let Some(bone) = graph.get_mut(*joint) {
                bone.is_bone = true;
            }
        }
        let Some(owner) = ids.get(&node.index()).copied() else { continue };
        let mut targets = vec![owner];
        targets.extend(split.get(&owner).into_iter().flatten().copied());
        for target in targets {
            if let Some(geometry) = graph.get_mut(target).and_then(|n| n.kind.geometry_mut()) {
                geometry.skeleton = Some(joints.clone());
            }
        }
    }

    info!("Imported {:?}: {} nodes", path, graph.len());
    Ok(LoadedAsset { graph, root })
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<NodeKind> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from_array).collect();
    let indices: Option<Vec<u32>> = reader.read_indices().map(|i| i.into_u32().collect());

    let skin = match (reader.read_joints(0), reader.read_weights(0)) {
        (Some(joints), Some(weights)) => Some(SkinAttributes {
            joints: joints.into_u16().collect(),
            weights: weights.into_f32().collect(),
        }),
        _ => None,
    };

    let mode = primitive.mode();
    let indices = match mode {
        Mode::TriangleStrip | Mode::TriangleFan => {
            let sequence = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
            Some(triangulate(mode, &sequence))
        }
        _ => indices,
    };
    let mut geometry = Geometry::new(positions, indices);
    geometry.skin = skin;

    match mode {
        Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan => Some(NodeKind::Mesh(geometry)),
        Mode::Lines | Mode::LineStrip | Mode::LineLoop => Some(NodeKind::Curve(geometry)),
        Mode::Points => {
            debug!("Skipping point primitive");
            None
        }
    }
}

/// Expand strip and fan index sequences into a triangle list
fn triangulate(mode: Mode, sequence: &[u32]) -> Vec<u32> {
    let mut out = Vec::new();
    if sequence.len() < 3 {
        return out;
    }
    for i in 0..sequence.len() - 2 {
        let tri = match mode {
            Mode::TriangleFan => [sequence[0], sequence[i + 1], sequence[i + 2]],
            _ if i % 2 == 0 => [sequence[i], sequence[i + 1], sequence[i + 2]],
            _ => [sequence[i + 1], sequence[i], sequence[i + 2]],
        };
        out.extend(tri);
    }
    out
}
