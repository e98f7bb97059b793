use std::path::Path;

use glam::Vec3;

use crate::editor::camera::EditorCamera;
use crate::editor::gizmo::{ManipulationBridge, ManipulationWidget};
use crate::editor::history::CommandStack;
use crate::errors::{Result, StippleError};
use crate::io::{LoadReport, load_scene_file, save_scene_file};
use crate::resources::{MeshImporter, MeshLibrary, TextureRegistry};
use crate::scene::{GeometryRef, InstanceKind, NodeHandle, Scene};
use crate::settings::EditorSettings;

/// One editing session.
///
/// Owns the scene together with everything that refers into it (history,
/// gizmo state, selection) so structural edits can keep them consistent.
#[derive(Debug)]
pub struct Editor {
    pub scene: Scene,
    pub history: CommandStack,
    pub gizmo: ManipulationBridge,
    pub textures: TextureRegistry,
    pub meshes: MeshLibrary,
    pub camera: EditorCamera,
    pub settings: EditorSettings,

    selection: Option<NodeHandle>,
    /// Seconds since the session started, drives light animation.
    elapsed: f32,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Editor {
    #[must_use]
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            scene: Scene::new(),
            history: CommandStack::with_capacity_limit(settings.max_history),
            gizmo: ManipulationBridge::new(settings.default_operation, settings.default_mode, settings.snap),
            textures: TextureRegistry::new(),
            meshes: MeshLibrary::new(),
            camera: EditorCamera::new(&settings.camera),
            settings,
            selection: None,
            elapsed: 0.0,
        }
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    pub fn spawn_at_origin(&mut self, kind: InstanceKind) -> NodeHandle {
        self.spawn_at(kind, Vec3::ZERO)
    }

    /// Spawns `spawn_distance` units in front of the camera.
    pub fn spawn_in_front(&mut self, kind: InstanceKind) -> NodeHandle {
        let position = self.camera.spawn_point(self.settings.spawn_distance);
        self.spawn_at(kind, position)
    }

    fn spawn_at(&mut self, kind: InstanceKind, position: Vec3) -> NodeHandle {
        let name = kind.default_name();
        let is_light = kind.is_light();
        let handle = self.scene.spawn_at(kind, name, position);
        if is_light
            && let Some(light) = self.scene.get_node_mut(handle).and_then(|n| n.light.as_mut())
        {
            light.base_position = position;
        }
        handle
    }

    /// Imports `path` and spawns one node per submesh in front of the camera.
    ///
    /// Submesh nodes are parented under the first one so the asset moves as
    /// a unit.
    pub fn import_mesh(&mut self, importer: &mut dyn MeshImporter, path: &Path) -> Result<Vec<NodeHandle>> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| StippleError::MeshImport {
                path: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })?;
        let logical_name = self.meshes.unique_name(&stem);
        let mesh = self.meshes.load(importer, &logical_name, path, &mut self.textures)?;
        let Some(asset) = self.meshes.get(mesh) else {
            return Ok(Vec::new());
        };

        let origin = self.camera.spawn_point(self.settings.spawn_distance);
        let parts: Vec<_> = asset
            .mesh
            .submeshes
            .iter()
            .zip(asset.textures.iter().copied().chain(std::iter::repeat(None)))
            .enumerate()
            .map(|(i, (sub, texture))| (i, sub.name.clone(), texture))
            .collect();

        let mut spawned = Vec::with_capacity(parts.len());
        for (index, name, texture) in parts {
            let submesh = u32::try_from(index).unwrap_or(u32::MAX);
            let kind = InstanceKind::imported(logical_name.clone(), submesh);
            let name = if name.is_empty() { format!("{logical_name}_{index}") } else { name };
            let position = if spawned.is_empty() { origin } else { Vec3::ZERO };
            let handle = self.scene.spawn_at(kind, name, position);
            if let Some(node) = self.scene.get_node_mut(handle) {
                node.geometry = GeometryRef::Imported { mesh, submesh };
                node.mesh_variant = i32::try_from(index).unwrap_or(i32::MAX);
                node.texture = texture;
            }
            if let Some(&first) = spawned.first() {
                self.scene.attach(handle, first)?;
            }
            spawned.push(handle);
        }
        self.scene.update_world_positions();
        Ok(spawned)
    }

    // ========================================================================
    // Selection & structure
    // ========================================================================

    #[must_use]
    pub fn selection(&self) -> Option<NodeHandle> {
        self.selection
    }

    /// Selects `handle` exclusively; `None` or a stale handle clears it.
    pub fn select(&mut self, handle: Option<NodeHandle>) {
        if let Some(old) = self.selection.take()
            && let Some(node) = self.scene.get_node_mut(old)
        {
            node.selected = false;
        }
        if let Some(new) = handle
            && let Some(node) = self.scene.get_node_mut(new)
        {
            node.selected = true;
            self.selection = Some(new);
        }
    }

    /// Destroys `handle` with its subtree. Returns how many nodes went away.
    ///
    /// Commands targeting removed nodes are dropped from the history.
    pub fn delete(&mut self, handle: NodeHandle) -> usize {
        let removed = self.scene.destroy_subtree(handle);
        if removed.is_empty() {
            return 0;
        }
        self.history.prune(&removed);
        if self.selection.is_some_and(|s| removed.contains(&s)) {
            self.selection = None;
            self.gizmo.reset();
        }
        log::info!("Deleted {} node(s)", removed.len());
        removed.len()
    }

    pub fn delete_selected(&mut self) -> usize {
        self.selection.map_or(0, |handle| self.delete(handle))
    }

    pub fn set_parent(&mut self, child: NodeHandle, parent: NodeHandle) -> Result<()> {
        self.scene.attach(child, parent)?;
        self.scene.update_world_positions();
        Ok(())
    }

    pub fn unparent(&mut self, child: NodeHandle) -> Result<()> {
        self.scene.detach(child)?;
        self.scene.update_world_positions();
        Ok(())
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.scene);
        if undone {
            self.scene.update_world_positions();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.scene);
        if redone {
            self.scene.update_world_positions();
        }
        redone
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// Advances light animation by `dt` seconds and refreshes world positions.
    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        self.scene.animate_lights(self.elapsed);
        self.scene.update_world_positions();
    }

    /// Runs the gizmo on the current selection for one frame.
    ///
    /// Returns `true` when a gesture finished and was recorded.
    pub fn manipulate(&mut self, widget: &mut dyn ManipulationWidget) -> bool {
        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        let command = self
            .gizmo
            .update(&mut self.scene, self.selection, view, projection, widget);
        self.scene.update_world_positions();

        match command {
            Some(command) => {
                self.history.execute(Box::new(command), &mut self.scene);
                true
            }
            None => false,
        }
    }

    /// Moves the camera so `handle` is centered at spawn distance.
    pub fn teleport_camera_to(&mut self, handle: NodeHandle) -> bool {
        let Some(node) = self.scene.get_node(handle) else {
            return false;
        };
        self.camera.focus(node.world_position, self.settings.spawn_distance);
        true
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn save(&self, path: &Path) -> Result<usize> {
        save_scene_file(path, &self.scene, &self.textures, &self.meshes)
    }

    /// Replaces the scene with the contents of `path`.
    ///
    /// On success the selection, gizmo gesture and history are reset; on an
    /// I/O error the session is left as it was.
    pub fn load(&mut self, path: &Path, importer: Option<&mut dyn MeshImporter>) -> Result<LoadReport> {
        let report = load_scene_file(path, &mut self.scene, &mut self.textures, &mut self.meshes, importer)?;
        self.selection = None;
        self.gizmo.reset();
        self.history.clear();
        self.elapsed = 0.0;
        Ok(report)
    }
}
