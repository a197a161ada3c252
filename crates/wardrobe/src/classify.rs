//! Wearable geometry classification
//!
//! Accessory assets are authored as full scenes: besides the accessory they
//! often carry the author's helper shapes and a copy of the body they were
//! modelled on. Classification walks an asset and keeps only accessory
//! geometry. Each exclusion is an [`ExclusionRule`] checked in order; the
//! first rule that matches decides, and the rejection is recorded with the
//! rule so asset authors can be told why a node was dropped.

use std::collections::HashMap;

use avatar_ipc::WearableCategory;
use glam::Vec3;
use tracing::debug;

use crate::constants::*;
use crate::graph::{Aabb, Geometry, NodeId, NodeTransform, SceneGraph, SceneNode};

/// Name, vertex count and local size of one base character mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseMeshSignature {
    pub vertex_count: usize,
    pub size: Vec3,
}

/// Meshes of the current base character, keyed by exact name
#[derive(Debug, Clone, Default)]
pub struct BaseBodyIndex {
    meshes: HashMap<String, BaseMeshSignature>,
}

impl BaseBodyIndex {
    pub fn from_character(graph: &SceneGraph, root: NodeId) -> Self {
        let mut meshes = HashMap::new();
        for id in graph.descendants(root) {
            let Some(node) = graph.get(id) else { continue };
            let Some(geometry) = node.geometry() else { continue };
            if node.kind.is_curve() {
                continue;
            }
            meshes.entry(node.name.clone()).or_insert(BaseMeshSignature {
                vertex_count: geometry.vertex_count(),
                size: geometry.local_bounds().size(),
            });
        }
        Self { meshes }
    }

    pub fn get(&self, name: &str) -> Option<&BaseMeshSignature> {
        self.meshes.get(name)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// A geometry node under consideration
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub id: NodeId,
    pub name: &'a str,
    /// Lower-cased name
    pub key: String,
    pub is_curve: bool,
    pub geometry: &'a Geometry,
    /// Bounds in the asset's world space
    pub bounds: Aabb,
}

/// Ordered exclusion rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionRule {
    Placeholder,
    BodyPart,
    BaseBodyMatch,
    BulkBody,
}

/// Rules in the order they are checked
pub const EXCLUSION_RULES: [ExclusionRule; 4] = [
    ExclusionRule::Placeholder,
    ExclusionRule::BodyPart,
    ExclusionRule::BaseBodyMatch,
    ExclusionRule::BulkBody,
];

impl ExclusionRule {
    /// Explanation given to asset authors
    pub fn rationale(self) -> &'static str {
        match self {
            ExclusionRule::Placeholder => {
                "name marks an authoring helper shape (cone, sphere, geo, placeholder), or the mesh is a tiny round primitive"
            }
            ExclusionRule::BodyPart => {
                "name contains an anatomical token (head, body, teeth, eye, ...); wearables must not ship body parts"
            }
            ExclusionRule::BaseBodyMatch => {
                "name, vertex count and size match a mesh of the loaded base character"
            }
            ExclusionRule::BulkBody => {
                "bounding box is body-sized and centred on the body; treated as a bundled copy of the base body"
            }
        }
    }

    pub fn applies_to(self, category: WearableCategory) -> bool {
        match self {
            ExclusionRule::Placeholder | ExclusionRule::BodyPart => true,
            ExclusionRule::BaseBodyMatch | ExclusionRule::BulkBody => category == WearableCategory::Shirt,
        }
    }

    pub fn matches(self, candidate: &Candidate<'_>, category: WearableCategory, base: Option<&BaseBodyIndex>) -> bool {
        match self {
            ExclusionRule::Placeholder => is_placeholder(candidate, category),
            ExclusionRule::BodyPart => is_body_part(&candidate.key, category),
            // Decals never duplicate the body
            ExclusionRule::BaseBodyMatch => {
                !candidate.is_curve && base.is_some_and(|index| matches_base_mesh(candidate, index))
            }
            ExclusionRule::BulkBody => !candidate.is_curve && is_bulk_body(&candidate.bounds),
        }
    }
}

fn is_placeholder(candidate: &Candidate<'_>, category: WearableCategory) -> bool {
    let tokens = match category {
        WearableCategory::Hat => HAT_PLACEHOLDER_TOKENS,
        WearableCategory::Shirt => SHIRT_PLACEHOLDER_TOKENS,
    };
    if tokens.iter().any(|t| candidate.key.contains(t)) {
        return true;
    }
    category == WearableCategory::Shirt && !candidate.is_curve && is_tiny_primitive(&candidate.bounds)
}

fn is_tiny_primitive(bounds: &Aabb) -> bool {
    if bounds.is_empty() {
        return false;
    }
    let size = bounds.size();
    size.max_element() < TINY_PRIMITIVE_MAX
        && (size.x - size.z).abs() < TINY_PRIMITIVE_ROUNDNESS
        && size.y < TINY_PRIMITIVE_MAX
}

/// Anatomical name test on a lower-cased name
pub fn is_body_part(key: &str, category: WearableCategory) -> bool {
    if key.starts_with(GENERIC_BODY_PREFIX) {
        return true;
    }
    if BODY_PART_TOKENS.iter().any(|t| key.contains(t)) {
        return true;
    }
    if category == WearableCategory::Shirt && SHIRT_BODY_PART_TOKENS.iter().any(|t| key.contains(t)) {
        return true;
    }
    key.contains(EYE_TOKEN) && !EYE_EXCEPTIONS.iter().any(|e| key.contains(e))
}

fn matches_base_mesh(candidate: &Candidate<'_>, index: &BaseBodyIndex) -> bool {
    let Some(base) = index.get(candidate.name) else {
        return false;
    };
    let geometry = candidate.geometry;
    if geometry.positions.is_empty() {
        return true;
    }
    let size = geometry.local_bounds().size();
    geometry.vertex_count().abs_diff(base.vertex_count) < IDENTITY_VERTEX_TOLERANCE
        && (size - base.size).abs().max_element() < IDENTITY_SIZE_TOLERANCE
}

fn is_bulk_body(bounds: &Aabb) -> bool {
    if bounds.is_empty() {
        return false;
    }
    let size = bounds.size();
    let center = bounds.center();
    let very_large = size.y > BULK_VERY_TALL || (size.x > BULK_VERY_WIDE && size.z > BULK_VERY_WIDE);
    let large = size.y > BULK_TALL || (size.x > BULK_WIDE && size.z > BULK_WIDE && size.y > BULK_WIDE_MIN_HEIGHT);
    let centred =
        center.y.abs() < BULK_CENTER_Y && center.x.abs() < BULK_CENTER_XZ && center.z.abs() < BULK_CENTER_XZ;
    very_large || (large && centred)
}

/// A node kept for attachment
#[derive(Debug, Clone)]
pub struct RetainedNode {
    /// Node in the source asset
    pub source: NodeId,
    /// Detached deep copy with skinning stripped
    pub node: SceneNode,
    /// Authored world transform in the source asset
    pub world: NodeTransform,
}

impl RetainedNode {
    pub fn is_curve(&self) -> bool {
        self.node.kind.is_curve()
    }
}

/// A node dropped by classification
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub node: NodeId,
    pub name: String,
    /// `None` for nodes pruned with a placeholder subtree
    pub rule: Option<ExclusionRule>,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub retained: Vec<RetainedNode>,
    pub rejected: Vec<Rejection>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}

/// Walk an accessory asset and keep its wearable geometry.
///
/// Never fails. The asset graph is not modified.
pub fn classify(
    asset: &SceneGraph,
    root: NodeId,
    category: WearableCategory,
    base: Option<&BaseBodyIndex>,
) -> Classification {
    let mut result = Classification::default();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let Some(node) = asset.get(id) else { continue };

        if node.name.to_lowercase().contains(PLACEHOLDER_NODE_NAME) {
            for pruned in asset.descendants(id) {
                if asset.get(pruned).is_some_and(|n| n.geometry().is_some()) {
                    result.rejected.push(Rejection {
                        node: pruned,
                        name: asset.name(pruned).unwrap_or_default().to_string(),
                        rule: None,
                    });
                }
            }
            continue;
        }
        stack.extend(node.children().iter().rev().copied());

        let Some(geometry) = node.geometry() else { continue };
        let is_curve = node.kind.is_curve();
        if is_curve && category != WearableCategory::Shirt {
            continue;
        }

        let candidate = Candidate {
            id,
            name: &node.name,
            key: node.name.to_lowercase(),
            is_curve,
            geometry,
            bounds: asset.world_bounds(id),
        };

        let rule = EXCLUSION_RULES
            .iter()
            .copied()
            .filter(|r| r.applies_to(category))
            .find(|r| r.matches(&candidate, category, base));

        match rule {
            Some(rule) => {
                debug!("Excluding '{}' from {}: {}", node.name, category, rule.rationale());
                result.rejected.push(Rejection {
                    node: id,
                    name: node.name.clone(),
                    rule: Some(rule),
                });
            }
            None => {
                let mut copy = node.clone();
                if let Some(geometry) = copy.kind.geometry_mut() {
                    geometry.strip_skinning();
                }
                result.retained.push(RetainedNode {
                    source: id,
                    node: copy,
                    world: asset.world_transform(id),
                });
            }
        }
    }

    result
}
