//! Editor layer
//!
//! Everything that sits between user input and the scene graph:
//! - gizmo: world-space widget ↔ local-space node bridge, one command per drag
//! - history: undoable commands and the undo/redo stacks
//! - camera: the free-flying editor camera
//! - session: the `Editor` value tying it all together

pub mod camera;
pub mod gizmo;
pub mod history;
pub mod session;

pub use camera::EditorCamera;
pub use gizmo::{
    GizmoMode, GizmoOperation, GizmoRequest, GizmoResponse, ManipulationBridge, ManipulationState,
    ManipulationWidget,
};
pub use history::{Command, CommandStack, TransformCommand};
pub use session::Editor;
