//! Per-instance surface parameters.
//!
//! These are consumed by the renderer; the editor core only stores,
//! edits and persists them.

use glam::{Vec2, Vec4};

/// Basic surface parameters applied before the hatching pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub tiling: Vec2,
    pub offset: Vec2,
    pub albedo: Vec4,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            tiling: Vec2::ONE,
            offset: Vec2::ZERO,
            albedo: Vec4::ONE,
        }
    }
}

/// Crosshatch layering mode of the hatching shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrosshatchMode {
    /// Single stroke direction.
    #[default]
    Single = 0,
    /// Second layer of strokes at `angle2`.
    Cross = 1,
    /// Extra detail layer driven by the `layer_*` knobs.
    Layered = 2,
}

impl CrosshatchMode {
    #[must_use]
    pub fn ordinal(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Single),
            1 => Some(Self::Cross),
            2 => Some(Self::Layered),
            _ => None,
        }
    }
}

/// Screen-space radial pattern: the hatching rotates around (center_x, center_z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialPattern {
    pub center_x: f32,
    pub center_z: f32,
    pub radius: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    /// Radians.
    pub instance_angle: f32,
}

impl Default for RadialPattern {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_z: 0.0,
            radius: 1.0,
            rotation_speed: 0.0,
            instance_angle: 0.0,
        }
    }
}

/// The non-photorealistic hatching knobs of one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HatchingParams {
    pub ink_color: Vec4,
    pub epsilon: f32,
    pub stroke_multiplier: f32,
    /// Primary stroke angle, radians.
    pub angle1: f32,
    /// Cross stroke angle, radians.
    pub angle2: f32,
    pub pattern_scale: f32,
    pub line_thickness: f32,
    pub transparency: f32,
    pub crosshatch_mode: CrosshatchMode,
    pub layer_pattern_scale: f32,
    pub layer_stroke_multiplier: f32,
    pub layer_angle: f32,
    pub layer_line_thickness: f32,
    pub radial: RadialPattern,
}

impl Default for HatchingParams {
    fn default() -> Self {
        Self {
            ink_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            epsilon: 0.01,
            stroke_multiplier: 1.0,
            angle1: std::f32::consts::FRAC_PI_4,
            angle2: -std::f32::consts::FRAC_PI_4,
            pattern_scale: 1.0,
            line_thickness: 0.5,
            transparency: 1.0,
            crosshatch_mode: CrosshatchMode::Single,
            layer_pattern_scale: 2.0,
            layer_stroke_multiplier: 1.0,
            layer_angle: 0.0,
            layer_line_thickness: 0.25,
            radial: RadialPattern::default(),
        }
    }
}
