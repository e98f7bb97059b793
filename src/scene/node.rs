use std::fmt;

use glam::{Mat4, Vec3, Vec4};

use crate::resources::{MeshHandle, TextureHandle};
use crate::scene::NodeHandle;
use crate::scene::light::Light;
use crate::scene::material::{HatchingParams, MaterialParams};
use crate::scene::transform::Transform;

/// Separator between the logical asset name and the submesh index in an
/// imported instance's type tag, e.g. `barrel#2`.
pub const SUBMESH_DELIMITER: char = '#';

/// Stable, user-visible instance identifier. Persisted in scene files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Never allocated and never accepted from a scene file.
    pub const RESERVED: InstanceId = InstanceId(u32::MAX);
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometry the editor can create without an importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinShape {
    Cube,
    Sphere,
    Plane,
    Cylinder,
    Cone,
    Torus,
}

impl BuiltinShape {
    pub const ALL: [BuiltinShape; 6] = [
        Self::Cube,
        Self::Sphere,
        Self::Plane,
        Self::Cylinder,
        Self::Cone,
        Self::Torus,
    ];

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Sphere => "sphere",
            Self::Plane => "plane",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Torus => "torus",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.tag() == tag)
    }
}

/// The type tag of an instance.
///
/// The set is open: anything that is not a built-in tag names an imported
/// mesh as `asset#submesh`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    Shape(BuiltinShape),
    Light,
    Text,
    ComicBubble,
    ComicBorder,
    Imported { asset: String, submesh: u32 },
}

impl InstanceKind {
    /// Parses a type tag as written by [`fmt::Display`].
    ///
    /// Never fails: unknown tags are imported meshes. A tag without a
    /// numeric `#index` suffix refers to submesh 0 of the whole tag.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "light" => return Self::Light,
            "text" => return Self::Text,
            "comicbubble" => return Self::ComicBubble,
            "comicborder" => return Self::ComicBorder,
            _ => {}
        }
        if let Some(shape) = BuiltinShape::from_tag(tag) {
            return Self::Shape(shape);
        }
        if let Some((asset, index)) = tag.rsplit_once(SUBMESH_DELIMITER)
            && let Ok(submesh) = index.parse::<u32>()
        {
            return Self::Imported {
                asset: asset.to_string(),
                submesh,
            };
        }
        Self::Imported {
            asset: tag.to_string(),
            submesh: 0,
        }
    }

    #[must_use]
    pub fn imported(asset: impl Into<String>, submesh: u32) -> Self {
        Self::Imported {
            asset: asset.into(),
            submesh,
        }
    }

    #[must_use]
    pub fn is_light(&self) -> bool {
        matches!(self, Self::Light)
    }

    /// Kinds that carry a text payload.
    #[must_use]
    pub fn has_text(&self) -> bool {
        matches!(self, Self::Text | Self::ComicBubble | Self::ComicBorder)
    }

    #[must_use]
    pub fn is_imported(&self) -> bool {
        matches!(self, Self::Imported { .. })
    }

    /// Display name used when spawning without an explicit name.
    #[must_use]
    pub fn default_name(&self) -> String {
        match self {
            Self::Shape(shape) => capitalize(shape.tag()),
            Self::Light => "Light".to_string(),
            Self::Text => "Text".to_string(),
            Self::ComicBubble => "Bubble".to_string(),
            Self::ComicBorder => "Border".to_string(),
            Self::Imported { asset, .. } => asset.clone(),
        }
    }
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(shape) => f.write_str(shape.tag()),
            Self::Light => f.write_str("light"),
            Self::Text => f.write_str("text"),
            Self::ComicBubble => f.write_str("comicbubble"),
            Self::ComicBorder => f.write_str("comicborder"),
            Self::Imported { asset, submesh } => write!(f, "{asset}{SUBMESH_DELIMITER}{submesh}"),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// What the renderer draws for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryRef {
    /// Nothing drawable (lights, text, unresolved imports).
    #[default]
    None,
    Shape(BuiltinShape),
    Imported { mesh: MeshHandle, submesh: u32 },
}

/// One placeable scene element (an "instance").
///
/// # Hierarchy
///
/// - `parent`: non-owning handle to the parent (`None` for root-level nodes)
/// - `children`: handles of owned children
///
/// Both sides are edited only through [`Scene`](crate::scene::Scene) so
/// they stay in agreement.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: InstanceId,
    pub name: String,
    pub kind: InstanceKind,
    /// Variant index for multi-submesh imports.
    pub mesh_variant: i32,

    pub transform: Transform,
    /// Derived every evaluation pass. Never authoritative.
    pub world_position: Vec3,

    pub geometry: GeometryRef,
    pub material: MaterialParams,
    pub hatching: HatchingParams,
    pub override_color: Vec4,
    pub texture: Option<TextureHandle>,
    pub noise_texture: Option<TextureHandle>,
    pub selected: bool,
    /// Draw the light gizmo; only meaningful for lights.
    pub show_debug_visual: bool,

    /// `Some` exactly when `kind` is [`InstanceKind::Light`].
    pub light: Option<Light>,
    /// Payload for text-like kinds.
    pub text: Option<String>,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
}

impl Node {
    /// Creates a detached node with kind-appropriate defaults.
    #[must_use]
    pub fn new(id: InstanceId, kind: InstanceKind, name: impl Into<String>) -> Self {
        let geometry = match &kind {
            InstanceKind::Shape(shape) => GeometryRef::Shape(*shape),
            _ => GeometryRef::None,
        };
        let light = kind.is_light().then(Light::default);
        let text = kind.has_text().then(String::new);
        let show_debug_visual = kind.is_light();

        Self {
            id,
            name: name.into(),
            kind,
            mesh_variant: 0,
            transform: Transform::new(),
            world_position: Vec3::ZERO,
            geometry,
            material: MaterialParams::default(),
            hatching: HatchingParams::default(),
            override_color: Vec4::ONE,
            texture: None,
            noise_texture: None,
            selected: false,
            show_debug_visual,
            light,
            text,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.local_matrix()
    }
}
