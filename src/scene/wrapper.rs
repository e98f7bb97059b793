//! Chainable node operation wrapper.
//!
//! [`SceneNode`] borrows a [`Scene`] mutably and provides a fluent API
//! for editing one instance without `get_node_mut().unwrap()` chains.
//!
//! All methods silently no-op when the handle is stale.
//!
//! # Example
//!
//! ```rust,ignore
//! scene.node(handle)
//!     .set_position(0.0, 3.0, 0.0)
//!     .set_rotation_degrees(0.0, 45.0, 0.0)
//!     .set_scale(2.0)
//!     .set_name("Crate");
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Vec3, Vec4};

use crate::scene::NodeHandle;
use crate::scene::light::Light;
use crate::scene::scene::Scene;

/// Temporary mutable borrow of a scene node for chainable operations.
pub struct SceneNode<'a> {
    scene: &'a mut Scene,
    handle: NodeHandle,
}

impl<'a> SceneNode<'a> {
    #[inline]
    pub fn new(scene: &'a mut Scene, handle: NodeHandle) -> Self {
        Self { scene, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    // -- Transform setters (chainable) --

    /// Sets the node's local position.
    #[inline]
    pub fn set_position(self, x: f32, y: f32, z: f32) -> Self {
        self.set_position_vec(Vec3::new(x, y, z))
    }

    /// Sets the node's local position from a Vec3.
    #[inline]
    pub fn set_position_vec(self, pos: Vec3) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.transform.position = pos;
        }
        self
    }

    /// Sets Euler rotation in radians.
    #[inline]
    pub fn set_rotation(self, x: f32, y: f32, z: f32) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.transform.rotation = Vec3::new(x, y, z);
        }
        self
    }

    /// Sets Euler rotation in degrees.
    #[inline]
    pub fn set_rotation_degrees(self, x: f32, y: f32, z: f32) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.transform.set_rotation_degrees(Vec3::new(x, y, z));
        }
        self
    }

    /// Sets uniform scale.
    #[inline]
    pub fn set_scale(self, s: f32) -> Self {
        self.set_scale_xyz(s, s, s)
    }

    /// Sets non-uniform scale.
    #[inline]
    pub fn set_scale_xyz(self, x: f32, y: f32, z: f32) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.transform.scale = Vec3::new(x, y, z);
        }
        self
    }

    // -- Other properties --

    #[inline]
    pub fn set_name(self, name: &str) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.name = name.to_string();
        }
        self
    }

    #[inline]
    pub fn set_override_color(self, color: Vec4) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.override_color = color;
        }
        self
    }

    /// Sets the text payload (no-op for kinds without text).
    #[inline]
    pub fn set_text(self, text: &str) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle)
            && node.kind.has_text()
        {
            node.text = Some(text.to_string());
        }
        self
    }

    /// Replaces the light data (no-op for non-light nodes).
    #[inline]
    pub fn set_light(self, light: Light) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle)
            && node.kind.is_light()
        {
            node.light = Some(light);
        }
        self
    }
}
