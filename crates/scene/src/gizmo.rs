//! Gizmo binding for the wardrobe's manipulator.
//!
//! The wardrobe drives a [`ChannelManipulator`]; its calls arrive here as
//! [`GizmoEvent`]s and are folded into the [`GizmoBinding`] resource, which
//! a renderer reads to draw the gizmo on the right object.

use avatar_ipc::GizmoMode;
use bevy::prelude::*;
use tokio::sync::mpsc;
use wardrobe::{Manipulator, ManipulatorTarget};

#[derive(Debug, Clone, PartialEq)]
pub enum GizmoEvent {
    Attach(ManipulatorTarget),
    Detach,
    SetMode(GizmoMode),
}

/// [`Manipulator`] that forwards every call over a channel
pub struct ChannelManipulator {
    sender: mpsc::UnboundedSender<GizmoEvent>,
}

impl ChannelManipulator {
    fn send(&self, event: GizmoEvent) {
        if self.sender.send(event).is_err() {
            debug!("Gizmo binding dropped");
        }
    }
}

impl Manipulator for ChannelManipulator {
    fn attach(&mut self, target: &ManipulatorTarget) {
        self.send(GizmoEvent::Attach(target.clone()));
    }

    fn detach(&mut self) {
        self.send(GizmoEvent::Detach);
    }

    fn set_mode(&mut self, mode: GizmoMode) {
        self.send(GizmoEvent::SetMode(mode));
    }
}

/// Current gizmo target and mode
#[derive(Resource)]
pub struct GizmoBinding {
    pub target: Option<ManipulatorTarget>,
    pub mode: GizmoMode,
    receiver: mpsc::UnboundedReceiver<GizmoEvent>,
}

impl GizmoBinding {
    /// Fold pending manipulator calls into the binding
    pub fn apply_pending(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            match event {
                GizmoEvent::Attach(target) => self.target = Some(target),
                GizmoEvent::Detach => self.target = None,
                GizmoEvent::SetMode(mode) => self.mode = mode,
            }
        }
    }
}

pub(crate) fn channel() -> (ChannelManipulator, GizmoBinding) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        ChannelManipulator { sender },
        GizmoBinding {
            target: None,
            mode: GizmoMode::Translate,
            receiver,
        },
    )
}

pub(crate) fn sync_gizmo(mut binding: ResMut<GizmoBinding>) {
    binding.apply_pending();
}
