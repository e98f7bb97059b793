//! Shared resource lookups
//!
//! The editor core never creates GPU resources; it refers to them through
//! handles that the registries here map to names and source files:
//! - TextureRegistry: texture name ↔ handle (scene file name resolution)
//! - MeshLibrary: imported meshes by logical name, plus their source path
//! - MeshImporter: the external import service

pub mod mesh;
pub mod registry;

pub use mesh::{ImportedMesh, MeshAsset, MeshImporter, MeshLibrary, SubMesh};
pub use registry::{GpuResourceId, TextureEntry, TextureRegistry};

use slotmap::new_key_type;

new_key_type! {
    pub struct TextureHandle;
    pub struct MeshHandle;
}
