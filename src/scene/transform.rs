use glam::{EulerRot, Mat4, Quat, Vec3};

/// Degrees to radians. The only conversion factor used at the widget boundary.
pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;
/// Radians to degrees, the reciprocal of [`DEG_TO_RAD`].
pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

/// Determinant magnitude below which a matrix is treated as singular.
pub const SINGULAR_EPSILON: f32 = 1e-8;

/// Which of the three local transform vectors an edit touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformChannel {
    Position,
    Rotation,
    Scale,
}

/// Position, Euler rotation in degrees, and scale recovered from a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponents {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

impl TransformComponents {
    /// `false` when the source matrix was degenerate and produced NaN/inf.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation_degrees.is_finite() && self.scale.is_finite()
    }
}

/// Builds the Euler rotation: X first, then Y, then Z (`Rz * Ry * Rx`).
#[inline]
#[must_use]
pub fn rotation_from_euler(radians: Vec3) -> Quat {
    Quat::from_euler(EulerRot::ZYX, radians.z, radians.y, radians.x)
}

/// Local-to-parent matrix from position, Euler degrees and scale.
///
/// The result is `T * Rz * Ry * Rx * S` with column vectors.
#[must_use]
pub fn compose(position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Mat4 {
    compose_radians(position, rotation_degrees * DEG_TO_RAD, scale)
}

/// Same as [`compose`] for rotations already in radians (the storage unit).
#[must_use]
pub fn compose_radians(position: Vec3, rotation_radians: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation_from_euler(rotation_radians), position)
}

/// Inverse of [`compose`].
///
/// Faithful for matrices built by `compose` from non-zero scales with the
/// Y rotation inside (-90°, 90°). Degenerate input yields non-finite
/// components; check [`TransformComponents::is_finite`].
#[must_use]
pub fn decompose(matrix: &Mat4) -> TransformComponents {
    let (scale, rotation, position) = matrix.to_scale_rotation_translation();
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    TransformComponents {
        position,
        rotation_degrees: Vec3::new(x, y, z) * RAD_TO_DEG,
        scale,
    }
}

/// `a * b`: applies `b` first, then `a`.
#[inline]
#[must_use]
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    *a * *b
}

/// Inverts `matrix`, or returns `None` when it is (near) singular.
#[must_use]
pub fn try_invert(matrix: &Mat4) -> Option<Mat4> {
    let det = matrix.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return None;
    }
    Some(matrix.inverse())
}

/// Inverts `matrix`, falling back to identity for a singular matrix.
#[must_use]
pub fn invert_or_identity(matrix: &Mat4) -> Mat4 {
    try_invert(matrix).unwrap_or_else(|| {
        log::warn!("Singular matrix in inversion, using identity instead");
        Mat4::IDENTITY
    })
}

/// Local transform of a node.
///
/// These three vectors fully determine the local matrix; nothing else on a
/// node feeds into it. Rotation is stored in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X, then Y, then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new() -> Self {
        Self::IDENTITY
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Local-to-parent matrix.
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        compose_radians(self.position, self.rotation, self.scale)
    }

    /// Overwrites position/rotation/scale from a decomposed matrix.
    ///
    /// Returns `false` and leaves the transform alone if the matrix is
    /// degenerate. Shear is lost.
    pub fn apply_local_matrix(&mut self, matrix: &Mat4) -> bool {
        let parts = decompose(matrix);
        if !parts.is_finite() {
            log::warn!("Refusing to apply a degenerate matrix to a transform");
            return false;
        }
        self.position = parts.position;
        self.rotation = parts.rotation_degrees * DEG_TO_RAD;
        self.scale = parts.scale;
        true
    }

    #[must_use]
    pub fn rotation_degrees(&self) -> Vec3 {
        self.rotation * RAD_TO_DEG
    }

    pub fn set_rotation_degrees(&mut self, degrees: Vec3) {
        self.rotation = degrees * DEG_TO_RAD;
    }

    /// Reads one channel. Rotation comes back in radians.
    #[must_use]
    pub fn get(&self, channel: TransformChannel) -> Vec3 {
        match channel {
            TransformChannel::Position => self.position,
            TransformChannel::Rotation => self.rotation,
            TransformChannel::Scale => self.scale,
        }
    }

    /// Writes one channel. Rotation is taken in radians.
    pub fn set(&mut self, channel: TransformChannel, value: Vec3) {
        match channel {
            TransformChannel::Position => self.position = value,
            TransformChannel::Rotation => self.rotation = value,
            TransformChannel::Scale => self.scale = value,
        }
    }

    /// `true` if no scale axis is close to zero.
    #[must_use]
    pub fn has_invertible_scale(&self) -> bool {
        self.scale.abs().min_element() > f32::EPSILON
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
