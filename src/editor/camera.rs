use glam::{Mat4, Vec3};

use crate::settings::CameraSettings;

/// Pitch is kept just short of straight up/down so `forward` never
/// becomes parallel to the up axis.
const PITCH_LIMIT: f32 = 89.0_f32 * crate::scene::transform::DEG_TO_RAD;

/// Free-flying editor camera (yaw/pitch, perspective projection).
#[derive(Debug, Clone, PartialEq)]
pub struct EditorCamera {
    pub position: Vec3,
    /// Radians around +Y; `0` looks down -Z.
    pub yaw: f32,
    /// Radians, positive looks up.
    pub pitch: f32,

    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub move_speed: f32,
}

impl Default for EditorCamera {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}

impl EditorCamera {
    #[must_use]
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 10.0),
            yaw: 0.0,
            pitch: 0.0,
            fov: settings.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: settings.near,
            far: settings.far,
            move_speed: settings.move_speed,
        }
    }

    /// Unit view direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, -cy * cp).normalize()
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Point `distance` units straight ahead.
    #[must_use]
    pub fn spawn_point(&self, distance: f32) -> Vec3 {
        self.position + self.forward() * distance
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves along forward/right/up by `input` scaled with `move_speed * dt`.
    pub fn fly(&mut self, input: Vec3, dt: f32) {
        let step = self.move_speed * dt;
        self.position += (self.right() * input.x + Vec3::Y * input.y + self.forward() * input.z) * step;
    }

    /// Turns the camera towards `target`. Does nothing if already there.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(dir) = (target - self.position).try_normalize() else {
            return;
        };
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = (-dir.x).atan2(-dir.z);
    }

    /// Places the camera `distance` units from `target`, keeping the current
    /// view direction, so `target` ends up centered.
    pub fn focus(&mut self, target: Vec3, distance: f32) {
        self.position = target - self.forward() * distance;
    }
}
