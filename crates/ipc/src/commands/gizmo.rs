//! Gizmo command types for transform operations.

use serde::{Deserialize, Serialize};

/// Transform gizmo operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

/// Commands for controlling the transform gizmo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GizmoCommand {
    /// Set the active gizmo mode (G/R/S keys)
    SetMode(GizmoMode),
    /// Drag started (`true`) or ended (`false`)
    DragChanged { dragging: bool },
}
