//! Editor Settings
//!
//! Tunables for the editor session, loadable from a JSON file. Every field
//! has a default, so a settings file only needs the keys it changes:
//!
//! ```json
//! { "spawn_distance": 8.0, "snap": { "enabled": true, "rotate_degrees": 45.0 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::editor::gizmo::{GizmoMode, GizmoOperation};
use crate::errors::Result;

/// Gizmo snapping increments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    pub enabled: bool,
    pub translate: f32,
    /// Rotation increment in degrees.
    pub rotate_degrees: f32,
    pub scale: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            translate: 0.5,
            rotate_degrees: 90.0,
            scale: 0.1,
        }
    }
}

/// Perspective parameters of the editor camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub move_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            move_speed: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Distance in front of the camera used by "spawn in front".
    pub spawn_distance: f32,
    pub snap: SnapSettings,
    pub default_operation: GizmoOperation,
    pub default_mode: GizmoMode,
    /// Undo entries kept; `0` means unbounded.
    pub max_history: usize,
    pub camera: CameraSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            spawn_distance: 5.0,
            snap: SnapSettings::default(),
            default_operation: GizmoOperation::Translate,
            default_mode: GizmoMode::World,
            max_history: 256,
            camera: CameraSettings::default(),
        }
    }
}

impl EditorSettings {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&text)?;
        log::info!("Loaded editor settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
