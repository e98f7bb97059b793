//! Bridge between the scene graph and an on-screen manipulation widget.
//!
//! The widget works on world matrices; nodes store local transforms. Each
//! frame the bridge hands the widget the node's world matrix, maps whatever
//! comes back into the parent's space and writes it onto the node. A drag
//! gesture (widget `in_use` going true then false) yields at most one
//! [`TransformCommand`] for the whole drag.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::editor::history::TransformCommand;
use crate::scene::transform::{decompose, invert_or_identity};
use crate::scene::{NodeHandle, Scene, TransformChannel};
use crate::settings::SnapSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GizmoOperation {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl GizmoOperation {
    /// Transform channel this operation edits.
    #[must_use]
    pub fn channel(self) -> TransformChannel {
        match self {
            Self::Translate => TransformChannel::Position,
            Self::Rotate => TransformChannel::Rotation,
            Self::Scale => TransformChannel::Scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GizmoMode {
    #[default]
    World,
    Local,
}

/// Everything the widget needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoRequest {
    pub view: Mat4,
    pub projection: Mat4,
    pub operation: GizmoOperation,
    pub mode: GizmoMode,
    /// Per-axis snap increment (degrees for rotation), if snapping.
    pub snap: Option<Vec3>,
}

/// What the widget reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GizmoResponse {
    /// The matrix was modified this frame.
    pub changed: bool,
    /// The user is currently dragging a handle.
    pub in_use: bool,
}

/// External manipulation widget, e.g. an ImGuizmo binding.
pub trait ManipulationWidget {
    /// Draws the gizmo and edits `world` in place.
    fn manipulate(&mut self, request: &GizmoRequest, world: &mut Mat4) -> GizmoResponse;
}

/// Gesture state of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ManipulationState {
    #[default]
    Idle,
    Dragging {
        target: NodeHandle,
        operation: GizmoOperation,
        /// Value of the edited channel when the drag began.
        before: Vec3,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ManipulationBridge {
    pub operation: GizmoOperation,
    pub mode: GizmoMode,
    pub snap: SnapSettings,
    state: ManipulationState,
}

impl ManipulationBridge {
    #[must_use]
    pub fn new(operation: GizmoOperation, mode: GizmoMode, snap: SnapSettings) -> Self {
        Self {
            operation,
            mode,
            snap,
            state: ManipulationState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> ManipulationState {
        self.state
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ManipulationState::Dragging { .. })
    }

    /// Drops the current gesture without producing a command.
    pub fn reset(&mut self) {
        self.state = ManipulationState::Idle;
    }

    fn snap_increment(&self) -> Option<Vec3> {
        if !self.snap.enabled {
            return None;
        }
        let step = match self.operation {
            GizmoOperation::Translate => self.snap.translate,
            GizmoOperation::Rotate => self.snap.rotate_degrees,
            GizmoOperation::Scale => self.snap.scale,
        };
        Some(Vec3::splat(step))
    }

    /// Ends the current gesture, if any, and returns its command.
    ///
    /// No command is produced when the channel ended where it started or
    /// the node no longer exists.
    pub fn finish(&mut self, scene: &Scene) -> Option<TransformCommand> {
        let ManipulationState::Dragging {
            target,
            operation,
            before,
        } = std::mem::take(&mut self.state)
        else {
            return None;
        };

        let channel = operation.channel();
        let after = scene.get_node(target)?.transform.get(channel);
        if after == before {
            log::debug!("{operation:?} gesture on {target:?} ended without change");
            return None;
        }
        log::debug!("{operation:?} gesture on {target:?}: {before} -> {after}");
        Some(TransformCommand::new(target, channel, before, after))
    }

    /// Runs one frame of manipulation for `target`.
    ///
    /// Returns the gesture's command on the frame the drag ends. Switching
    /// target or operation mid-drag ends the old gesture first.
    pub fn update(
        &mut self,
        scene: &mut Scene,
        target: Option<NodeHandle>,
        view: Mat4,
        projection: Mat4,
        widget: &mut dyn ManipulationWidget,
    ) -> Option<TransformCommand> {
        if let ManipulationState::Dragging {
            target: dragging,
            operation,
            ..
        } = self.state
            && (Some(dragging) != target || operation != self.operation || !scene.contains(dragging))
        {
            return self.finish(scene);
        }

        let target = target?;
        let node = scene.get_node(target)?;

        // Snapshot before the widget writes anything this frame
        let channel = self.operation.channel();
        let before = node.transform.get(channel);

        let local = node.local_matrix();
        let parent_world = scene.parent_world_matrix(target);
        let mut world = parent_world.map_or(local, |parent| parent * local);

        let request = GizmoRequest {
            view,
            projection,
            operation: self.operation,
            mode: self.mode,
            snap: self.snap_increment(),
        };
        let response = widget.manipulate(&request, &mut world);

        if response.changed {
            self.write_back(scene, target, parent_world, &world);
        }

        match (self.is_dragging(), response.in_use) {
            (false, true) => {
                self.state = ManipulationState::Dragging {
                    target,
                    operation: self.operation,
                    before,
                };
                None
            }
            (true, false) => self.finish(scene),
            _ => None,
        }
    }

    fn write_back(&self, scene: &mut Scene, target: NodeHandle, parent_world: Option<Mat4>, world: &Mat4) {
        let local = match parent_world {
            Some(parent) => invert_or_identity(&parent) * *world,
            None => *world,
        };

        let mut components = decompose(&local);
        if !components.is_finite() {
            log::warn!("Gizmo produced a non-finite transform for {target:?}; ignoring");
            return;
        }
        if self.snap.enabled && self.operation == GizmoOperation::Rotate && self.snap.rotate_degrees > 0.0 {
            let step = self.snap.rotate_degrees;
            components.rotation_degrees = (components.rotation_degrees / step).round() * step;
        }

        if let Some(node) = scene.get_node_mut(target) {
            node.transform.position = components.position;
            node.transform.set_rotation_degrees(components.rotation_degrees);
            node.transform.scale = components.scale;
        }
    }
}
