//! Skeletal joint lookup by role.

use tracing::debug;

use crate::constants::{BODY_BONE_EXCLUSION, BODY_BONE_NAMES, HEAD_BONE_NAMES};
use crate::graph::{NodeId, SceneGraph};

/// Joint a wearable category anchors to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneRole {
    Head,
    Body,
}

impl BoneRole {
    /// Name keywords in priority order
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            BoneRole::Head => HEAD_BONE_NAMES,
            BoneRole::Body => BODY_BONE_NAMES,
        }
    }

    fn excludes(self, key: &str) -> bool {
        match self {
            BoneRole::Head => false,
            BoneRole::Body => key.contains(BODY_BONE_EXCLUSION),
        }
    }
}

/// Find the joint for `role` under `root`.
///
/// Joints reachable through the hierarchy are searched first; if none
/// matches, the bone lists of every skin binding in the hierarchy are
/// searched.
pub fn find_bone(graph: &SceneGraph, root: NodeId, role: BoneRole) -> Option<NodeId> {
    let nodes = graph.descendants(root);

    let hierarchy: Vec<NodeId> = nodes
        .iter()
        .copied()
        .filter(|id| graph.get(*id).is_some_and(|n| n.is_bone))
        .collect();
    if let Some(bone) = best_match(graph, &hierarchy, role) {
        return Some(bone);
    }

    let mut skinned: Vec<NodeId> = Vec::new();
    for id in &nodes {
        let skeleton = graph
            .get(*id)
            .and_then(|n| n.geometry())
            .and_then(|g| g.skeleton.as_ref());
        for bone in skeleton.into_iter().flatten() {
            if graph.contains(*bone) && !skinned.contains(bone) {
                skinned.push(*bone);
            }
        }
    }
    let found = best_match(graph, &skinned, role);
    if found.is_some() {
        debug!("Resolved {:?} bone through a skin binding", role);
    }
    found
}

fn best_match(graph: &SceneGraph, candidates: &[NodeId], role: BoneRole) -> Option<NodeId> {
    let keyed: Vec<(NodeId, String)> = candidates
        .iter()
        .filter_map(|id| graph.name(*id).map(|n| (*id, n.to_lowercase())))
        .filter(|(_, key)| !role.excludes(key))
        .collect();

    for keyword in role.keywords() {
        if let Some((id, _)) = keyed.iter().find(|(_, key)| key == keyword) {
            return Some(*id);
        }
    }
    for keyword in role.keywords() {
        if let Some((id, _)) = keyed.iter().find(|(_, key)| key.contains(keyword)) {
            return Some(*id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Geometry, NodeKind, SceneNode};
    use glam::Vec3;

    #[test]
    fn test_exact_name_beats_substring() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("OG"));
        let spine = graph.insert_child(root, SceneNode::bone("Spine"));
        graph.insert_child(spine, SceneNode::bone("HeadTop_End"));
        let head = graph.insert_child(spine, SceneNode::bone("Head"));

        assert_eq!(find_bone(&graph, root, BoneRole::Head), Some(head));
        assert_eq!(find_bone(&graph, root, BoneRole::Body), Some(spine));
    }

    #[test]
    fn test_body_role_skips_head_names() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("OG"));
        graph.insert_child(root, SceneNode::bone("head_body_ctrl"));
        let chest = graph.insert_child(root, SceneNode::bone("Chest_01"));

        assert_eq!(find_bone(&graph, root, BoneRole::Body), Some(chest));
    }

    #[test]
    fn test_non_bones_ignored() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("OG"));
        graph.insert_child(root, SceneNode::group("Head"));
        assert_eq!(find_bone(&graph, root, BoneRole::Head), None);
    }

    #[test]
    fn test_falls_back_to_skin_bone_list() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("OG"));
        // Skeleton kept outside the character hierarchy
        let armature = graph.insert(SceneNode::group("Armature"));
        let head = graph.insert_child(armature, SceneNode::bone("mixamorig:Head"));

        let mut geometry = Geometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], None);
        geometry.skeleton = Some(vec![head]);
        graph.insert_child(root, SceneNode::new("Body", NodeKind::Mesh(geometry)));

        assert_eq!(find_bone(&graph, root, BoneRole::Head), Some(head));
        assert_eq!(find_bone(&graph, root, BoneRole::Body), None);
    }
}
