//! Scene graph module
//!
//! Manages the instance hierarchy and its per-node data:
//! - Node: one placeable instance (hierarchy links, transform, shading, light)
//! - Transform: local position / Euler rotation / scale and the matrix math
//! - Scene: the arena-backed container and its hierarchy operations
//! - transform_system: world-matrix evaluation, decoupled from Scene
//! - Light / material: per-instance data consumed by the renderer

pub mod light;
pub mod material;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;
pub mod wrapper;

pub use light::{Light, LightKind, OrbitAnimation};
pub use material::{CrosshatchMode, HatchingParams, MaterialParams, RadialPattern};
pub use node::{BuiltinShape, GeometryRef, InstanceId, InstanceKind, Node};
pub use scene::Scene;
pub use transform::{Transform, TransformChannel, TransformComponents};
pub use wrapper::SceneNode;

use slotmap::new_key_type;

new_key_type! {
    /// Generation-checked handle of a node in a [`Scene`].
    pub struct NodeHandle;
}
