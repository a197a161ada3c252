//! Direct-manipulation capability driven by the edit session.

use avatar_ipc::GizmoMode;

use crate::graph::{NodeId, NodeTransform};

/// Object handed to the gizmo
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulatorTarget {
    pub node: NodeId,
    /// Selectable identifier (`hat`, `shirt_1`, ...)
    pub id: String,
    /// Local transform at attach time
    pub transform: NodeTransform,
}

/// On-screen transform gizmo.
///
/// Drags are reported back through [`crate::Wardrobe::drag_changed`] and
/// transform edits through [`crate::Wardrobe::set_transform`].
pub trait Manipulator: Send + Sync {
    fn attach(&mut self, target: &ManipulatorTarget);
    fn detach(&mut self);
    fn set_mode(&mut self, mode: GizmoMode);
}

/// Manipulator for headless use
#[derive(Debug, Default)]
pub struct NullManipulator;

impl Manipulator for NullManipulator {
    fn attach(&mut self, _target: &ManipulatorTarget) {}
    fn detach(&mut self) {}
    fn set_mode(&mut self, _mode: GizmoMode) {}
}
