//! Ray picking against wearable geometry.
//!
//! Meshes are tested triangle by triangle with the Moller-Trumbore
//! algorithm; curves have no area, so they are tested against their world
//! bounding box.

use glam::Vec3;

use crate::graph::{NodeId, NodeKind, SceneGraph};

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// World-space ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized direction
    pub direction: Vec3,
}

impl Ray {
    /// Returns `None` for a zero-length direction
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }
}

/// Nearest intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub distance: f32,
}

/// Moller-Trumbore ray-triangle intersection. Returns the hit distance.
pub fn ray_triangle_intersection(origin: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    (t >= EPSILON).then_some(t)
}

/// True if the node and all its ancestors are visible
pub fn is_visible_in_tree(graph: &SceneGraph, id: NodeId) -> bool {
    let mut current = Some(id);
    while let Some(node_id) = current {
        match graph.get(node_id) {
            Some(node) if node.visible => current = node.parent(),
            _ => return false,
        }
    }
    true
}

/// Distance along `ray` to the geometry of `id`
pub fn intersect_node(graph: &SceneGraph, id: NodeId, ray: &Ray) -> Option<f32> {
    let node = graph.get(id)?;
    match &node.kind {
        NodeKind::Group => None,
        NodeKind::Curve(_) => graph.world_bounds(id).ray_intersection(ray.origin, ray.direction),
        NodeKind::Mesh(geometry) => {
            let world = graph.world_matrix(id);
            geometry
                .triangles()
                .into_iter()
                .filter_map(|[a, b, c]| {
                    ray_triangle_intersection(
                        ray.origin,
                        ray.direction,
                        world.transform_point3(a),
                        world.transform_point3(b),
                        world.transform_point3(c),
                    )
                })
                .min_by(|a, b| a.total_cmp(b))
        }
    }
}

/// Nearest visible candidate hit by `ray`
pub fn pick_nearest(graph: &SceneGraph, candidates: &[NodeId], ray: &Ray) -> Option<PickHit> {
    candidates
        .iter()
        .filter(|id| is_visible_in_tree(graph, **id))
        .filter_map(|id| {
            intersect_node(graph, *id, ray).map(|distance| PickHit {
                node: *id,
                distance,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
