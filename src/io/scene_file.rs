//! Text scene format.
//!
//! One node per line, fields whitespace-separated in a fixed order (see
//! [`FIELD_NAMES`]). The writer walks the graph depth-first pre-order so
//! parents precede children, but the reader does not rely on it: parent
//! ids are stashed and resolved in a second pass once every node exists.
//!
//! Loading is tolerant. A malformed line is skipped and reported, an
//! unknown parent id leaves the node at root level, and an imported mesh
//! that cannot be resolved leaves the node without geometry.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use glam::{Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{RecordError, Result, StippleError};
use crate::io::import_map::{ImportMap, import_map_path};
use crate::io::tokenizer::{quote, tokenize};
use crate::resources::{MeshImporter, MeshLibrary, TextureHandle, TextureRegistry};
use crate::scene::light::{Light, LightKind, OrbitAnimation};
use crate::scene::material::{CrosshatchMode, HatchingParams, RadialPattern};
use crate::scene::node::{GeometryRef, InstanceId, InstanceKind, Node};
use crate::scene::{NodeHandle, Scene};

/// Written in place of a texture name when a node has none.
pub const TEXTURE_NONE: &str = "none";

/// Field names in record order. Used for error messages.
pub const FIELD_NAMES: [&str; 66] = [
    "id", "type", "name", "meshNumber",
    "px", "py", "pz", "rx", "ry", "rz", "sx", "sy", "sz",
    "cr", "cg", "cb", "ca",
    "textureName", "noiseTextureName", "parentID",
    "lightType", "dx", "dy", "dz", "intensity", "range", "coneAngle", "lr", "lg", "lb", "la",
    "inkR", "inkG", "inkB", "inkA", "epsilon", "strokeMult", "angle1", "angle2",
    "patternScale", "lineThickness", "transparency", "crosshatchMode",
    "layerPatternScale", "layerStrokeMult", "layerAngle", "layerLineThickness",
    "centerX", "centerZ", "radius", "rotationSpeed", "instanceAngle",
    "baseX", "baseY", "baseZ",
    "ampX", "ampY", "ampZ", "freqX", "freqY", "freqZ", "phaseX", "phaseY", "phaseZ",
    "animEnabled", "textContent",
];

/// Number of fields in one record.
pub const FIELD_COUNT: usize = FIELD_NAMES.len();

// ============================================================================
// Records
// ============================================================================

/// One parsed line: the node plus its unresolved references.
#[derive(Debug, Clone)]
pub struct SceneRecord {
    /// Hierarchy links are empty; texture handles are unset.
    pub node: Node,
    pub parent_id: Option<InstanceId>,
    pub texture: Option<String>,
    pub noise_texture: Option<String>,
}

fn push_vec3(out: &mut Vec<String>, v: Vec3) {
    out.extend([v.x, v.y, v.z].iter().map(f32::to_string));
}

fn push_vec4(out: &mut Vec<String>, v: Vec4) {
    out.extend([v.x, v.y, v.z, v.w].iter().map(f32::to_string));
}

fn texture_field(name: Option<&str>) -> String {
    quote(name.unwrap_or(TEXTURE_NONE)).into_owned()
}

/// Formats one node as a record line (without the trailing newline).
#[must_use]
pub fn format_record(
    node: &Node,
    parent_id: Option<InstanceId>,
    texture: Option<&str>,
    noise_texture: Option<&str>,
) -> String {
    let mut f: Vec<String> = Vec::with_capacity(FIELD_COUNT);

    f.push(node.id.to_string());
    f.push(quote(&node.kind.to_string()).into_owned());
    f.push(quote(&node.name).into_owned());
    f.push(node.mesh_variant.to_string());

    push_vec3(&mut f, node.transform.position);
    push_vec3(&mut f, node.transform.rotation);
    push_vec3(&mut f, node.transform.scale);
    push_vec4(&mut f, node.override_color);

    f.push(texture_field(texture));
    f.push(texture_field(noise_texture));
    f.push(parent_id.map_or_else(|| "-1".to_string(), |id| id.to_string()));

    // Non-light nodes still carry the light columns
    let light = node.light.unwrap_or_default();
    f.push(light.kind.ordinal().to_string());
    push_vec3(&mut f, light.direction);
    f.push(light.intensity.to_string());
    f.push(light.range.to_string());
    f.push(light.cone_angle.to_string());
    push_vec4(&mut f, light.color);

    let h = &node.hatching;
    push_vec4(&mut f, h.ink_color);
    f.push(h.epsilon.to_string());
    f.push(h.stroke_multiplier.to_string());
    f.push(h.angle1.to_string());
    f.push(h.angle2.to_string());
    f.push(h.pattern_scale.to_string());
    f.push(h.line_thickness.to_string());
    f.push(h.transparency.to_string());
    f.push(h.crosshatch_mode.ordinal().to_string());
    f.push(h.layer_pattern_scale.to_string());
    f.push(h.layer_stroke_multiplier.to_string());
    f.push(h.layer_angle.to_string());
    f.push(h.layer_line_thickness.to_string());
    f.push(h.radial.center_x.to_string());
    f.push(h.radial.center_z.to_string());
    f.push(h.radial.radius.to_string());
    f.push(h.radial.rotation_speed.to_string());
    f.push(h.radial.instance_angle.to_string());

    push_vec3(&mut f, light.base_position);
    push_vec3(&mut f, light.animation.amplitude);
    push_vec3(&mut f, light.animation.frequency);
    push_vec3(&mut f, light.animation.phase);
    f.push(if light.animation.enabled { "1" } else { "0" }.to_string());

    f.push(quote(node.text.as_deref().unwrap_or("")).into_owned());

    debug_assert_eq!(f.len(), FIELD_COUNT);
    f.join(" ")
}

/// Cursor over the tokens of one record.
struct Fields {
    tokens: std::vec::IntoIter<String>,
    index: usize,
    line: usize,
}

impl Fields {
    fn field_name(&self) -> &'static str {
        FIELD_NAMES.get(self.index).copied().unwrap_or("<extra>")
    }

    fn next_str(&mut self) -> std::result::Result<String, RecordError> {
        let field = self.field_name();
        let token = self
            .tokens
            .next()
            .ok_or_else(|| RecordError::new(self.line, field, "missing"))?;
        self.index += 1;
        Ok(token)
    }

    fn next_parsed<T: std::str::FromStr>(&mut self) -> std::result::Result<T, RecordError> {
        let field = self.field_name();
        let token = self.next_str()?;
        token
            .parse::<T>()
            .map_err(|_| RecordError::new(self.line, field, format!("cannot parse '{token}'")))
    }

    fn next_f32(&mut self) -> std::result::Result<f32, RecordError> {
        self.next_parsed::<f32>()
    }

    fn next_vec3(&mut self) -> std::result::Result<Vec3, RecordError> {
        Ok(Vec3::new(self.next_f32()?, self.next_f32()?, self.next_f32()?))
    }

    fn next_vec4(&mut self) -> std::result::Result<Vec4, RecordError> {
        Ok(Vec4::new(
            self.next_f32()?,
            self.next_f32()?,
            self.next_f32()?,
            self.next_f32()?,
        ))
    }

    fn next_texture(&mut self) -> std::result::Result<Option<String>, RecordError> {
        let name = self.next_str()?;
        Ok((name != TEXTURE_NONE).then_some(name))
    }

    fn finish(mut self) -> std::result::Result<(), RecordError> {
        if self.tokens.next().is_some() {
            return Err(RecordError::new(
                self.line,
                "<extra>",
                format!("more than {FIELD_COUNT} fields"),
            ));
        }
        Ok(())
    }
}

/// Parses one record line. `line` is the 1-based line number for errors.
pub fn parse_record(text: &str, line: usize) -> std::result::Result<SceneRecord, RecordError> {
    let tokens = tokenize(text).map_err(|e| RecordError::new(line, "<line>", e.to_string()))?;
    let mut f = Fields {
        tokens: tokens.into_iter(),
        index: 0,
        line,
    };

    let id = InstanceId(f.next_parsed::<u32>()?);
    if id == InstanceId::RESERVED {
        return Err(RecordError::new(line, "id", format!("id {id} is reserved")));
    }
    let kind = InstanceKind::parse(&f.next_str()?);
    let name = f.next_str()?;
    let mut node = Node::new(id, kind, name);
    node.mesh_variant = f.next_parsed::<i32>()?;

    node.transform.position = f.next_vec3()?;
    node.transform.rotation = f.next_vec3()?;
    node.transform.scale = f.next_vec3()?;
    node.world_position = node.transform.position;
    node.override_color = f.next_vec4()?;

    let texture = f.next_texture()?;
    let noise_texture = f.next_texture()?;
    let parent_id = match f.next_parsed::<i64>()? {
        -1 => None,
        raw => Some(InstanceId(u32::try_from(raw).map_err(|_| {
            RecordError::new(line, "parentID", format!("invalid parent id {raw}"))
        })?)),
    };

    let light_ordinal = f.next_parsed::<u32>()?;
    let kind = LightKind::from_ordinal(light_ordinal).ok_or_else(|| {
        RecordError::new(line, "lightType", format!("unknown light type {light_ordinal}"))
    })?;
    let direction = f.next_vec3()?;
    let intensity = f.next_f32()?;
    let range = f.next_f32()?;
    let cone_angle = f.next_f32()?;
    let color = f.next_vec4()?;

    let ink_color = f.next_vec4()?;
    let epsilon = f.next_f32()?;
    let stroke_multiplier = f.next_f32()?;
    let angle1 = f.next_f32()?;
    let angle2 = f.next_f32()?;
    let pattern_scale = f.next_f32()?;
    let line_thickness = f.next_f32()?;
    let transparency = f.next_f32()?;
    let mode_ordinal = f.next_parsed::<i32>()?;
    let crosshatch_mode = CrosshatchMode::from_ordinal(mode_ordinal).ok_or_else(|| {
        RecordError::new(line, "crosshatchMode", format!("unknown mode {mode_ordinal}"))
    })?;
    let layer_pattern_scale = f.next_f32()?;
    let layer_stroke_multiplier = f.next_f32()?;
    let layer_angle = f.next_f32()?;
    let layer_line_thickness = f.next_f32()?;
    let radial = RadialPattern {
        center_x: f.next_f32()?,
        center_z: f.next_f32()?,
        radius: f.next_f32()?,
        rotation_speed: f.next_f32()?,
        instance_angle: f.next_f32()?,
    };
    node.hatching = HatchingParams {
        ink_color,
        epsilon,
        stroke_multiplier,
        angle1,
        angle2,
        pattern_scale,
        line_thickness,
        transparency,
        crosshatch_mode,
        layer_pattern_scale,
        layer_stroke_multiplier,
        layer_angle,
        layer_line_thickness,
        radial,
    };

    let base_position = f.next_vec3()?;
    let amplitude = f.next_vec3()?;
    let frequency = f.next_vec3()?;
    let phase = f.next_vec3()?;
    let enabled = match f.next_str()?.as_str() {
        "0" => false,
        "1" => true,
        other => {
            return Err(RecordError::new(
                line,
                "animEnabled",
                format!("expected 0 or 1, found '{other}'"),
            ));
        }
    };
    let text = f.next_str()?;
    f.finish()?;

    if node.kind.is_light() {
        node.light = Some(Light {
            kind,
            direction,
            intensity,
            range,
            cone_angle,
            color,
            animation: OrbitAnimation {
                enabled,
                amplitude,
                frequency,
                phase,
            },
            base_position,
        });
    }
    if node.kind.has_text() || !text.is_empty() {
        node.text = Some(text);
    }

    Ok(SceneRecord {
        node,
        parent_id,
        texture,
        noise_texture,
    })
}

// ============================================================================
// Writing
// ============================================================================

/// Writes every node of `scene` depth-first pre-order. Returns the node count.
pub fn write_scene<W: Write>(scene: &Scene, textures: &TextureRegistry, out: &mut W) -> Result<usize> {
    let order = scene.depth_first();
    for &handle in &order {
        let Some(node) = scene.get_node(handle) else {
            continue;
        };
        let parent_id = node
            .parent()
            .and_then(|p| scene.get_node(p))
            .map(|p| p.id);
        let texture = node.texture.and_then(|t| textures.name_of(t));
        let noise = node.noise_texture.and_then(|t| textures.name_of(t));
        writeln!(out, "{}", format_record(node, parent_id, texture, noise))?;
    }
    Ok(order.len())
}

/// Writes the scene file and its companion import map.
pub fn save_scene_file(
    path: &Path,
    scene: &Scene,
    textures: &TextureRegistry,
    meshes: &MeshLibrary,
) -> Result<usize> {
    let mut out = BufWriter::new(File::create(path)?);
    let count = write_scene(scene, textures, &mut out)?;
    out.flush()?;

    let map: ImportMap = meshes.sources().into_iter().collect();
    let map_path = import_map_path(path);
    let mut map_out = BufWriter::new(File::create(&map_path)?);
    map.write_to(&mut map_out)?;
    map_out.flush()?;

    log::info!(
        "Saved {} node(s) to {} ({} imported asset(s) in {})",
        count,
        path.display(),
        map.len(),
        map_path.display()
    );
    Ok(count)
}

// ============================================================================
// Reading
// ============================================================================

/// Result of the parse pass: good records plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct ParsedScene {
    pub records: Vec<SceneRecord>,
    pub skipped: Vec<RecordError>,
}

/// Parses every non-blank line. Only I/O errors abort.
pub fn read_scene<R: BufRead>(input: R) -> Result<ParsedScene> {
    let mut parsed = ParsedScene::default();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(&line, index + 1) {
            Ok(record) => parsed.records.push(record),
            Err(err) => {
                log::warn!("Skipping malformed scene record: {err}");
                parsed.skipped.push(err);
            }
        }
    }
    Ok(parsed)
}

/// What happened while rebuilding a scene.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Nodes now in the scene.
    pub loaded: usize,
    /// Lines that failed to parse.
    pub skipped: Vec<RecordError>,
    /// Records dropped because their id was already taken.
    pub duplicate_ids: Vec<InstanceId>,
    /// Records the scene refused for another reason, such as a reserved id.
    pub rejected_ids: Vec<InstanceId>,
    /// Nodes whose parent id did not resolve; placed at root level.
    pub orphaned: Vec<InstanceId>,
    /// Imported-mesh nodes left without geometry.
    pub unresolved_meshes: Vec<InstanceId>,
    /// Texture names not present in the registry.
    pub unresolved_textures: Vec<String>,
}

impl LoadReport {
    /// `true` if every record loaded with every reference resolved.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.duplicate_ids.is_empty()
            && self.rejected_ids.is_empty()
            && self.orphaned.is_empty()
            && self.unresolved_meshes.is_empty()
            && self.unresolved_textures.is_empty()
    }
}

/// Collaborators needed to resolve references while loading.
pub struct LoadContext<'a, 'i> {
    pub textures: &'a mut TextureRegistry,
    pub meshes: &'a mut MeshLibrary,
    pub import_map: &'a ImportMap,
    pub importer: Option<&'a mut (dyn MeshImporter + 'i)>,
}

impl LoadContext<'_, '_> {
    fn resolve_texture(&self, name: Option<&String>, report: &mut LoadReport) -> Option<TextureHandle> {
        let name = name?;
        let handle = self.textures.get_handle(name);
        if handle.is_none() && !report.unresolved_textures.contains(name) {
            log::warn!("Texture '{name}' is not registered; dropping reference");
            report.unresolved_textures.push(name.clone());
        }
        handle
    }
}

/// Replaces the contents of `scene` with `parsed`.
///
/// Nodes are inserted first, then parent links resolved in file order.
/// The id counter ends up past every loaded id.
pub fn rebuild_scene(scene: &mut Scene, parsed: ParsedScene, ctx: &mut LoadContext<'_, '_>) -> LoadReport {
    let mut report = LoadReport {
        skipped: parsed.skipped,
        ..LoadReport::default()
    };

    scene.clear();

    let mut failed_assets: FxHashSet<String> = FxHashSet::default();
    let mut pending: Vec<(NodeHandle, InstanceId, InstanceId)> = Vec::new();
    let mut handles: FxHashMap<InstanceId, NodeHandle> = FxHashMap::default();

    for record in parsed.records {
        let SceneRecord {
            mut node,
            parent_id,
            texture,
            noise_texture,
        } = record;

        // Meshes first: importing registers their diffuse textures
        if let InstanceKind::Imported { asset, submesh } = &node.kind {
            node.geometry = resolve_mesh(ctx, asset, *submesh, &mut failed_assets);
            if node.geometry == GeometryRef::None {
                report.unresolved_meshes.push(node.id);
            }
        }
        node.texture = ctx.resolve_texture(texture.as_ref(), &mut report);
        node.noise_texture = ctx.resolve_texture(noise_texture.as_ref(), &mut report);

        let id = node.id;
        match scene.insert_loaded(node) {
            Ok(handle) => {
                handles.insert(id, handle);
                if let Some(parent_id) = parent_id {
                    pending.push((handle, id, parent_id));
                }
            }
            Err(StippleError::DuplicateId(_)) => {
                log::warn!("Skipping record: instance {id} already loaded");
                report.duplicate_ids.push(id);
            }
            Err(err) => {
                log::warn!("Skipping record: {err}");
                report.rejected_ids.push(id);
            }
        }
    }

    // Second pass: parent edges
    for (child, child_id, parent_id) in pending {
        let Some(&parent) = handles.get(&parent_id) else {
            log::warn!("Instance {child_id} references missing parent {parent_id}; keeping it at root level");
            report.orphaned.push(child_id);
            continue;
        };
        if let Err(err) = scene.attach(child, parent) {
            log::warn!("Instance {child_id} cannot be parented to {parent_id}: {err}");
            report.orphaned.push(child_id);
        }
    }

    scene.update_world_positions();
    report.loaded = scene.len();
    report
}

fn resolve_mesh(
    ctx: &mut LoadContext<'_, '_>,
    asset: &str,
    submesh: u32,
    failed: &mut FxHashSet<String>,
) -> GeometryRef {
    let imported = |mesh| GeometryRef::Imported { mesh, submesh };

    if let Some(mesh) = ctx.meshes.get_handle(asset) {
        return imported(mesh);
    }
    if failed.contains(asset) {
        return GeometryRef::None;
    }

    let Some(path) = ctx.import_map.get(asset) else {
        log::warn!("Imported asset '{asset}' is not in the import map");
        failed.insert(asset.to_string());
        return GeometryRef::None;
    };
    let Some(importer) = ctx.importer.as_deref_mut() else {
        log::warn!("No mesh importer available to reload '{asset}'");
        failed.insert(asset.to_string());
        return GeometryRef::None;
    };

    match ctx.meshes.load(importer, asset, path, ctx.textures) {
        Ok(mesh) => imported(mesh),
        Err(err) => {
            log::warn!("{err}");
            failed.insert(asset.to_string());
            GeometryRef::None
        }
    }
}

/// Loads a scene file and its import map into `scene`.
///
/// The scene is only cleared after the file has been read in full, so an
/// I/O failure leaves it untouched. A missing import map is treated as
/// empty.
pub fn load_scene_file(
    path: &Path,
    scene: &mut Scene,
    textures: &mut TextureRegistry,
    meshes: &mut MeshLibrary,
    importer: Option<&mut dyn MeshImporter>,
) -> Result<LoadReport> {
    let file = File::open(path).inspect_err(|e| {
        log::error!("Cannot open scene file {}: {e}", path.display());
    })?;
    let parsed = read_scene(BufReader::new(file))?;

    let map_path = import_map_path(path);
    let import_map = match File::open(&map_path) {
        Ok(file) => ImportMap::read_from(BufReader::new(file))?.0,
        Err(e) => {
            log::warn!("No import map at {} ({e}); imported meshes will not reload", map_path.display());
            ImportMap::new()
        }
    };

    let mut ctx = LoadContext {
        textures,
        meshes,
        import_map: &import_map,
        importer,
    };
    let report = rebuild_scene(scene, parsed, &mut ctx);

    log::info!(
        "Loaded {} node(s) from {} ({} skipped, {} orphaned, {} without geometry)",
        report.loaded,
        path.display(),
        report.skipped.len(),
        report.orphaned.len(),
        report.unresolved_meshes.len()
    );
    Ok(report)
}
