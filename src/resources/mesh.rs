//! Imported mesh assets.
//!
//! The import itself is delegated to a [`MeshImporter`]; the library keeps
//! the result keyed by a logical name together with the source path, which
//! is what the scene's companion import map persists.

use std::path::{Path, PathBuf};

use glam::Mat4;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::errors::Result;
use crate::resources::registry::TextureRegistry;
use crate::resources::{MeshHandle, TextureHandle};

/// One submesh returned by the importer.
#[derive(Debug, Clone)]
pub struct SubMesh {
    pub name: String,
    /// Flat xyz triples.
    pub positions: Vec<f32>,
    /// Flat xyz triples, same length as `positions` (may be empty).
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// Node transform of the submesh inside the source file.
    pub transform: Mat4,
    /// Name of the diffuse texture, if the source material has one.
    pub diffuse_texture: Option<String>,
}

impl SubMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Everything the importer produced for one source file.
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub submeshes: Vec<SubMesh>,
}

/// External mesh-import service, keyed by file path.
pub trait MeshImporter {
    fn import(&mut self, path: &Path) -> Result<ImportedMesh>;
}

/// A loaded asset and where it came from.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub logical_name: String,
    pub source_path: PathBuf,
    pub mesh: ImportedMesh,
    /// Registered diffuse texture per submesh.
    pub textures: Vec<Option<TextureHandle>>,
}

/// Imported meshes by logical name.
#[derive(Debug, Default)]
pub struct MeshLibrary {
    map: SlotMap<MeshHandle, MeshAsset>,
    lookup: FxHashMap<String, MeshHandle>,
}

impl MeshLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports `path` under `logical_name`.
    ///
    /// A name that is already loaded is returned as-is without touching the
    /// importer. Diffuse textures are registered by name.
    pub fn load(
        &mut self,
        importer: &mut dyn MeshImporter,
        logical_name: &str,
        path: &Path,
        textures: &mut TextureRegistry,
    ) -> Result<MeshHandle> {
        if let Some(&handle) = self.lookup.get(logical_name) {
            return Ok(handle);
        }

        let mesh = importer.import(path)?;
        let submesh_textures = mesh
            .submeshes
            .iter()
            .map(|sub| {
                let name = sub.diffuse_texture.as_deref()?;
                textures
                    .add(name)
                    .inspect_err(|err| log::warn!("Dropping diffuse texture of '{}': {err}", sub.name))
                    .ok()
            })
            .collect();

        log::info!(
            "Imported '{}' from {} ({} submesh(es))",
            logical_name,
            path.display(),
            mesh.submeshes.len()
        );

        let handle = self.map.insert(MeshAsset {
            logical_name: logical_name.to_string(),
            source_path: path.to_path_buf(),
            mesh,
            textures: submesh_textures,
        });
        self.lookup.insert(logical_name.to_string(), handle);
        Ok(handle)
    }

    #[must_use]
    pub fn get(&self, handle: MeshHandle) -> Option<&MeshAsset> {
        self.map.get(handle)
    }

    #[must_use]
    pub fn get_handle(&self, logical_name: &str) -> Option<MeshHandle> {
        self.lookup.get(logical_name).copied()
    }

    /// Picks a logical name not yet used in the library, based on `stem`.
    #[must_use]
    pub fn unique_name(&self, stem: &str) -> String {
        if !self.lookup.contains_key(stem) {
            return stem.to_string();
        }
        (1..)
            .map(|i| format!("{stem}_{i}"))
            .find(|candidate| !self.lookup.contains_key(candidate))
            .unwrap_or_else(|| stem.to_string())
    }

    /// `(logical name, source path)` pairs sorted by name.
    #[must_use]
    pub fn sources(&self) -> Vec<(String, PathBuf)> {
        let mut sources: Vec<_> = self
            .map
            .values()
            .map(|asset| (asset.logical_name.clone(), asset.source_path.clone()))
            .collect();
        sources.sort();
        sources
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.lookup.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
