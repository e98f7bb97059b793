#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod editor;
pub mod errors;
pub mod io;
pub mod resources;
pub mod scene;
pub mod settings;

pub use editor::{Editor, EditorCamera, GizmoMode, GizmoOperation, ManipulationWidget};
pub use errors::{Result, StippleError};
pub use io::LoadReport;
pub use resources::{MeshImporter, MeshLibrary, TextureRegistry};
pub use scene::{InstanceId, InstanceKind, Light, LightKind, Node, NodeHandle, Scene, Transform};
pub use settings::EditorSettings;
