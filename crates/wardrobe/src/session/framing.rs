//! First-load placement of a base character.

use glam::Vec3;
use tracing::debug;

use crate::constants::{
    FRAMING_CENTERED_EPSILON, FRAMING_DROP, FRAMING_MAX_EXTENT, FRAMING_MIN_EXTENT, FRAMING_TARGET_SIZE,
};
use crate::graph::{NodeId, SceneGraph};

/// Centre and scale a freshly loaded character.
///
/// A model already centred at the origin keeps its authored placement and
/// is only rescaled when its largest extent is far outside the viewing
/// range. Anything else is moved to the origin, dropped slightly below it
/// and scaled to [`FRAMING_TARGET_SIZE`].
pub fn frame_character(graph: &mut SceneGraph, root: NodeId) {
    let bounds = graph.subtree_bounds(root);
    if bounds.is_empty() {
        return;
    }
    let center = bounds.center();
    let max_dim = bounds.size().max_element();
    let Some(node) = graph.get_mut(root) else { return };

    let near_origin = |v: Vec3| v.abs().max_element() < FRAMING_CENTERED_EPSILON;
    let fit = if max_dim > f32::EPSILON {
        FRAMING_TARGET_SIZE / max_dim
    } else {
        1.0
    };

    if near_origin(center) && near_origin(node.transform.translation) {
        if max_dim > FRAMING_MAX_EXTENT || max_dim < FRAMING_MIN_EXTENT {
            debug!("Rescaling centred model by {:.3}", fit);
            node.transform.scale *= fit;
        }
    } else {
        debug!("Centring model (centre {:?}, scale {:.3})", center, fit);
        node.transform.translation -= center;
        node.transform.translation.y -= FRAMING_DROP;
        node.transform.translation.x = 0.0;
        node.transform.scale *= fit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Geometry, NodeKind, SceneNode};

    fn model(min: Vec3, max: Vec3) -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::group("OG"));
        graph.insert_child(root, SceneNode::new("Body", NodeKind::Mesh(Geometry::new(vec![min, max], None))));
        (graph, root)
    }

    #[test]
    fn test_centred_model_keeps_placement() {
        let (mut graph, root) = model(Vec3::splat(-0.5), Vec3::splat(0.5));
        frame_character(&mut graph, root);
        let transform = graph.get(root).unwrap().transform;
        assert_eq!(transform.translation, Vec3::ZERO);
        assert_eq!(transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_huge_centred_model_is_rescaled() {
        let (mut graph, root) = model(Vec3::splat(-10.0), Vec3::splat(10.0));
        frame_character(&mut graph, root);
        let transform = graph.get(root).unwrap().transform;
        assert!(transform.scale.abs_diff_eq(Vec3::splat(0.1), 1e-6));
        assert_eq!(transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_offset_model_is_centred() {
        let (mut graph, root) = model(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 6.0, 4.0));
        frame_character(&mut graph, root);
        let transform = graph.get(root).unwrap().transform;
        // Centre (1.5, 4, 3.5), largest extent 4
        assert!(transform.translation.abs_diff_eq(Vec3::new(0.0, -4.9, -3.5), 1e-5));
        assert!(transform.scale.abs_diff_eq(Vec3::splat(0.5), 1e-6));
    }
}
