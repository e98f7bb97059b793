//! Texture name registry.
//!
//! Maps human-readable texture names to opaque handles. The renderer owns
//! the actual GPU textures and attaches its own resource id to each entry;
//! the editor core only needs the name ↔ handle mapping, which the scene
//! serializer uses to write names and resolve them back on load.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::errors::{Result, StippleError};
use crate::io::TEXTURE_NONE;
use crate::resources::TextureHandle;

/// Opaque renderer-side id of a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuResourceId(pub u64);

#[derive(Debug, Clone)]
pub struct TextureEntry {
    pub name: String,
    pub resource: Option<GpuResourceId>,
}

/// Name ↔ handle registry for textures.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    map: SlotMap<TextureHandle, TextureEntry>,
    lookup: FxHashMap<String, TextureHandle>,
}

impl TextureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, returning the existing handle if it is already known.
    ///
    /// `none` is refused: scene files use it for "no texture".
    pub fn add(&mut self, name: &str) -> Result<TextureHandle> {
        if name == TEXTURE_NONE {
            return Err(StippleError::ReservedTextureName(name.to_string()));
        }
        if let Some(&handle) = self.lookup.get(name) {
            return Ok(handle);
        }
        let handle = self.map.insert(TextureEntry {
            name: name.to_string(),
            resource: None,
        });
        self.lookup.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Registers `name` bound to a renderer resource.
    ///
    /// Re-registering a known name rebinds its resource.
    pub fn add_with_resource(&mut self, name: &str, resource: GpuResourceId) -> Result<TextureHandle> {
        let handle = self.add(name)?;
        if let Some(entry) = self.map.get_mut(handle) {
            entry.resource = Some(resource);
        }
        Ok(handle)
    }

    #[must_use]
    pub fn get_handle(&self, name: &str) -> Option<TextureHandle> {
        self.lookup.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, handle: TextureHandle) -> Option<&str> {
        self.map.get(handle).map(|entry| entry.name.as_str())
    }

    #[must_use]
    pub fn resource_of(&self, handle: TextureHandle) -> Option<GpuResourceId> {
        self.map.get(handle).and_then(|entry| entry.resource)
    }

    /// Drops a texture. Nodes still holding the handle resolve to nothing.
    pub fn remove(&mut self, handle: TextureHandle) -> Option<TextureEntry> {
        let entry = self.map.remove(handle)?;
        self.lookup.remove(&entry.name);
        Some(entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Registered names in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.values().map(|entry| entry.name.as_str())
    }
}
