use glam::{Vec3, Vec4};

/// Kind of light carried by a `light` instance.
///
/// The discriminant is the ordinal written to scene files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightKind {
    #[default]
    Directional = 0,
    Point = 1,
    Spot = 2,
}

impl LightKind {
    #[must_use]
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Directional),
            1 => Some(Self::Point),
            2 => Some(Self::Spot),
            _ => None,
        }
    }
}

/// Per-axis sinusoidal motion around a light's base position.
///
/// Each axis follows `amplitude * sin(frequency * t + phase)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitAnimation {
    pub enabled: bool,
    pub amplitude: Vec3,
    pub frequency: Vec3,
    pub phase: Vec3,
}

impl OrbitAnimation {
    /// Offset from the base position at time `t` seconds.
    #[must_use]
    pub fn offset_at(&self, t: f32) -> Vec3 {
        let arg = self.frequency * t + self.phase;
        self.amplitude * Vec3::new(arg.x.sin(), arg.y.sin(), arg.z.sin())
    }
}

impl Default for OrbitAnimation {
    fn default() -> Self {
        Self {
            enabled: false,
            amplitude: Vec3::ZERO,
            frequency: Vec3::ONE,
            phase: Vec3::ZERO,
        }
    }
}

/// Light data owned by a `light` instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub direction: Vec3,
    pub intensity: f32,
    pub range: f32,
    /// Full cone angle in degrees, spot lights only.
    pub cone_angle: f32,
    pub color: Vec4,
    pub animation: OrbitAnimation,
    /// Reference origin for [`OrbitAnimation`].
    pub base_position: Vec3,
}

impl Light {
    #[must_use]
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn new_directional(direction: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            direction,
            intensity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn new_point(range: f32, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point,
            range,
            intensity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn new_spot(direction: Vec3, range: f32, cone_angle: f32, intensity: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            direction,
            range,
            cone_angle,
            intensity,
            ..Self::default()
        }
    }

    /// Animated local position at time `t`, or `None` if the animation is off.
    #[must_use]
    pub fn animated_position(&self, t: f32) -> Option<Vec3> {
        self.animation
            .enabled
            .then(|| self.base_position + self.animation.offset_at(t))
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            direction: Vec3::NEG_Y,
            intensity: 1.0,
            range: 10.0,
            cone_angle: 45.0,
            color: Vec4::ONE,
            animation: OrbitAnimation::default(),
            base_position: Vec3::ZERO,
        }
    }
}
