//! Wearable attachment
//!
//! Retained nodes come out of a foreign asset hierarchy. Attachment happens
//! in two phases:
//!
//! 1. Each retained node is re-parented under a fresh wrapper group and its
//!    authored world transform is re-expressed in the wrapper's local space,
//!    so re-parenting alone does not move it on screen.
//! 2. The wrapper is placed on the character. Shirts go under the character
//!    root unchanged. Hats go under the head bone with a fixed calibrated
//!    transform, or under the root (degraded) when there is no head bone.
//!
//! The wrapper is assembled detached and linked into the character as the
//! last step, so a wearable is either fully attached or not at all.

use std::f32::consts::PI;

use avatar_config::HatCalibration;
use avatar_ipc::{AttachmentAlignment, WearableCategory};
use glam::{Quat, Vec3};
use tracing::{info, warn};

use crate::bones::{BoneRole, find_bone};
use crate::classify::RetainedNode;
use crate::graph::{NodeId, NodeTransform, SceneGraph, SceneNode, WearableTag};

/// Where a wrapper ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub group: NodeId,
    pub parent: NodeId,
    pub alignment: AttachmentAlignment,
}

/// Half turn about X correcting decal authoring space against the character's forward axis
pub fn decal_correction() -> Quat {
    Quat::from_rotation_x(PI)
}

/// The calibrated hat wrapper transform
pub fn calibrated_transform(calibration: &HatCalibration) -> NodeTransform {
    let mut transform = NodeTransform::from_translation(Vec3::from_array(calibration.position));
    transform.set_rotation(Quat::from_array(calibration.quaternion));
    transform.scale = Vec3::from_array(calibration.scale);
    transform
}

/// Phase 1 for a single node: reset it, link it under `wrapper` and give it
/// the local transform that reproduces `authored_world`.
pub fn adopt_node(graph: &mut SceneGraph, wrapper: NodeId, node: SceneNode, authored_world: &NodeTransform) -> NodeId {
    let id = graph.insert(node.with_transform(NodeTransform::IDENTITY));
    graph.append_child(wrapper, id);
    let local = graph.world_to_local(Some(wrapper), authored_world);
    if let Some(node) = graph.get_mut(id) {
        node.transform = local;
    }
    id
}

/// Build a detached wrapper group holding the retained nodes
pub fn build_wrapper(graph: &mut SceneGraph, retained: Vec<RetainedNode>, tag: WearableTag) -> NodeId {
    let mut wrapper = SceneNode::group(tag.name.clone());
    wrapper.tag = Some(tag);
    let wrapper = graph.insert(wrapper);

    for retained in retained {
        let is_curve = retained.is_curve();
        let id = adopt_node(graph, wrapper, retained.node, &retained.world);
        if is_curve && let Some(node) = graph.get_mut(id) {
            let rotation = node.transform.rotation * decal_correction();
            node.transform.set_rotation(rotation);
        }
    }
    wrapper
}

/// Attach retained geometry to the character.
///
/// Returns `None` when there is nothing to attach.
pub fn attach(
    graph: &mut SceneGraph,
    retained: Vec<RetainedNode>,
    category: WearableCategory,
    character_root: NodeId,
    name: &str,
    calibration: &HatCalibration,
) -> Option<Attachment> {
    if retained.is_empty() || !graph.contains(character_root) {
        return None;
    }

    let count = retained.len();
    let tag = WearableTag {
        category,
        name: name.to_string(),
    };
    let group = build_wrapper(graph, retained, tag);

    let (parent, alignment) = match category {
        WearableCategory::Shirt => (character_root, AttachmentAlignment::Root),
        WearableCategory::Hat => match find_bone(graph, character_root, BoneRole::Head) {
            Some(bone) => {
                if let Some(node) = graph.get_mut(group) {
                    node.transform = calibrated_transform(calibration);
                }
                (bone, AttachmentAlignment::Calibrated)
            }
            None => {
                warn!("No head bone found for hat '{}'; attaching at the character root", name);
                (character_root, AttachmentAlignment::Degraded)
            }
        },
    };

    graph.append_child(parent, group);
    info!(
        "Attached {} '{}' ({} nodes) under '{}' [{:?}]",
        category,
        name,
        count,
        graph.name(parent).unwrap_or_default(),
        alignment
    );

    Some(Attachment {
        group,
        parent,
        alignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::graph::{Geometry, NodeKind};
    use glam::EulerRot;

    fn mesh(name: &str) -> SceneNode {
        SceneNode::new(
            name,
            NodeKind::Mesh(Geometry::new(vec![Vec3::ZERO, Vec3::X * 0.2, Vec3::Y * 0.2], None)),
        )
    }

    fn character(head_rotation: Quat, with_head: bool) -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("OG"));
        let spine = graph.insert_child(
            root,
            SceneNode::bone("Spine").with_transform(NodeTransform::from_translation(Vec3::Y)),
        );
        if with_head {
            graph.insert_child(
                spine,
                SceneNode::bone("Head").with_transform(NodeTransform::from_trs(
                    Vec3::new(0.0, 0.5, 0.1),
                    head_rotation,
                    Vec3::splat(1.3),
                )),
            );
        }
        (graph, root)
    }

    fn hat_asset() -> (SceneGraph, NodeId) {
        let mut asset = SceneGraph::new();
        let root = asset.insert(
            SceneNode::group("Scene").with_transform(NodeTransform::from_translation(Vec3::new(0.0, 2.0, 0.0))),
        );
        asset.insert_child(
            root,
            mesh("Crown").with_transform(NodeTransform::from_trs(
                Vec3::new(0.1, 0.2, 0.3),
                Quat::from_rotation_y(0.4),
                Vec3::splat(0.5),
            )),
        );
        (asset, root)
    }

    #[test]
    fn test_adopt_preserves_world_transform() {
        let mut graph = SceneGraph::new();
        let wrapper = graph.insert(SceneNode::group("wrapper").with_transform(NodeTransform::from_trs(
            Vec3::new(-1.0, 0.5, 2.0),
            Quat::from_euler(EulerRot::XYZ, 0.2, 1.0, -0.3),
            Vec3::new(2.0, 2.0, 2.0),
        )));
        let world = NodeTransform::from_trs(
            Vec3::new(0.3, 1.7, -0.4),
            Quat::from_euler(EulerRot::XYZ, -0.5, 0.1, 0.9),
            Vec3::splat(0.75),
        );

        let id = adopt_node(&mut graph, wrapper, mesh("Brim"), &world);
        let after = graph.world_transform(id);
        assert!(after.abs_diff_eq(&world, 1e-4), "{after:?} != {world:?}");
        assert_eq!(graph.parent(id), Some(wrapper));
    }

    #[test]
    fn test_hat_calibrated_independent_of_bone_orientation() {
        let calibration = HatCalibration::default();
        let (asset, asset_root) = hat_asset();

        let mut locals = Vec::new();
        for rotation in [Quat::IDENTITY, Quat::from_euler(EulerRot::XYZ, 0.7, -1.2, 0.4)] {
            let (mut graph, root) = character(rotation, true);
            let retained = classify(&asset, asset_root, WearableCategory::Hat, None).retained;
            let attachment = attach(&mut graph, retained, WearableCategory::Hat, root, "Crown", &calibration).unwrap();

            assert_eq!(attachment.alignment, AttachmentAlignment::Calibrated);
            assert_eq!(graph.name(attachment.parent), Some("Head"));
            locals.push(graph.get(attachment.group).unwrap().transform);
        }

        assert_eq!(locals[0], locals[1]);
        let t = locals[0];
        assert!(t.translation.abs_diff_eq(Vec3::new(-0.607745, 0.0, 0.005627), 1e-6));
        assert!(t.rotation.abs_diff_eq(Quat::from_xyzw(0.0, 0.0, -0.707107, 0.707107), 1e-5));
        assert!((t.euler().z - (-1.570796)).abs() < 1e-4);
    }

    #[test]
    fn test_hat_without_head_bone_degrades_to_root() {
        let (asset, asset_root) = hat_asset();
        let (mut graph, root) = character(Quat::IDENTITY, false);
        let retained = classify(&asset, asset_root, WearableCategory::Hat, None).retained;

        let attachment =
            attach(&mut graph, retained, WearableCategory::Hat, root, "Crown", &HatCalibration::default()).unwrap();
        assert_eq!(attachment.alignment, AttachmentAlignment::Degraded);
        assert_eq!(attachment.parent, root);
        assert_eq!(graph.get(attachment.group).unwrap().transform, NodeTransform::IDENTITY);

        // Root is identity, so the crown keeps its authored world placement
        let crown = graph.children(attachment.group)[0];
        let expected = asset.world_transform(asset.find_by_name(asset_root, "Crown").unwrap());
        assert!(graph.world_transform(crown).abs_diff_eq(&expected, 1e-4));
    }

    #[test]
    fn test_shirt_goes_to_root_and_decals_turn() {
        let mut asset = SceneGraph::new();
        let root = asset.insert(SceneNode::group("Scene"));
        asset.insert_child(root, mesh("Tux"));
        asset.insert_child(
            root,
            SceneNode::new(
                "Logo_Curve",
                NodeKind::Curve(Geometry::new(vec![Vec3::ZERO, Vec3::X * 0.2], None)),
            ),
        );

        let (mut graph, char_root) = character(Quat::IDENTITY, true);
        let retained = classify(&asset, root, WearableCategory::Shirt, None).retained;
        let attachment =
            attach(&mut graph, retained, WearableCategory::Shirt, char_root, "Tux", &HatCalibration::default())
                .unwrap();

        assert_eq!(attachment.parent, char_root);
        assert_eq!(attachment.alignment, AttachmentAlignment::Root);
        let tag = graph.get(attachment.group).unwrap().tag.clone().unwrap();
        assert_eq!(tag.name, "Tux");

        let children = graph.children(attachment.group).to_vec();
        assert_eq!(children.len(), 2);
        let decal = graph.get(children[1]).unwrap();
        assert!(decal.transform.rotation.abs_diff_eq(decal_correction(), 1e-5));
    }

    #[test]
    fn test_nothing_to_attach() {
        let (mut graph, root) = character(Quat::IDENTITY, true);
        let before = graph.len();
        assert!(attach(&mut graph, Vec::new(), WearableCategory::Hat, root, "Empty", &HatCalibration::default()).is_none());
        assert_eq!(graph.len(), before);
    }
}
