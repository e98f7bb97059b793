//! Scene file tests
//!
//! Tests for:
//! - save → clear → load round trip of hierarchy, transforms, lights, text
//! - id counter after load
//! - string escaping in names and text, including line breaks
//! - reserved instance id and texture name
//! - tolerant loading: malformed lines, duplicate ids, missing parents,
//!   unknown textures, unresolvable meshes
//! - import map companion file and mesh re-import

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Result;
use glam::{Vec3, Vec4};
use stipple::errors::StippleError;
use stipple::io::{
    FIELD_COUNT, ImportMap, LoadContext, ParsedScene, format_record, import_map_path, load_scene_file,
    parse_record, read_scene, rebuild_scene, save_scene_file, tokenize, write_scene,
};
use stipple::resources::{ImportedMesh, MeshImporter, MeshLibrary, SubMesh, TextureRegistry};
use stipple::scene::{
    BuiltinShape, CrosshatchMode, GeometryRef, InstanceId, InstanceKind, Light, LightKind, Node, OrbitAnimation,
    Scene,
};

const EPSILON: f32 = 1e-4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stipple_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Importer that fabricates a two-submesh asset and counts calls.
#[derive(Default)]
struct FakeImporter {
    calls: usize,
    fail: bool,
}

impl MeshImporter for FakeImporter {
    fn import(&mut self, path: &Path) -> stipple::Result<ImportedMesh> {
        self.calls += 1;
        if self.fail {
            return Err(StippleError::MeshImport {
                path: path.display().to_string(),
                reason: "unsupported".to_string(),
            });
        }
        let submesh = |name: &str, texture: Option<&str>| SubMesh {
            name: name.to_string(),
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
            transform: glam::Mat4::IDENTITY,
            diffuse_texture: texture.map(str::to_string),
        };
        Ok(ImportedMesh {
            submeshes: vec![submesh("hull", Some("hull_diffuse.png")), submesh("mast", None)],
        })
    }
}

struct Fixture {
    scene: Scene,
    textures: TextureRegistry,
    meshes: MeshLibrary,
}

impl Fixture {
    fn new() -> Self {
        Self {
            scene: Scene::new(),
            textures: TextureRegistry::new(),
            meshes: MeshLibrary::new(),
        }
    }

    fn save_to_string(&self) -> String {
        let mut out = Vec::new();
        write_scene(&self.scene, &self.textures, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn load_from_str(&mut self, text: &str, import_map: &ImportMap) -> stipple::LoadReport {
        let parsed = read_scene(Cursor::new(text)).unwrap();
        let mut ctx = LoadContext {
            textures: &mut self.textures,
            meshes: &mut self.meshes,
            import_map,
            importer: None,
        };
        rebuild_scene(&mut self.scene, parsed, &mut ctx)
    }
}

/// Sun (spot, animated) > Crate (textured, rotated) > Sign (text);
/// plus a root-level bubble.
fn populate(f: &mut Fixture) {
    let brick = f.textures.add("brick.png").unwrap();
    let noise = f.textures.add("noise 01.png").unwrap();

    let sun = f.scene.spawn_at(InstanceKind::Light, "Sun", Vec3::new(0.0, 10.0, 0.0));
    let mut light = Light::new_spot(Vec3::new(0.0, -1.0, 0.2), 25.0, 30.0, 3.5);
    light.color = Vec4::new(1.0, 0.9, 0.8, 1.0);
    light.base_position = Vec3::new(0.0, 10.0, 0.0);
    light.animation = OrbitAnimation {
        enabled: true,
        amplitude: Vec3::new(2.0, 0.5, 0.0),
        frequency: Vec3::new(0.5, 1.0, 1.0),
        phase: Vec3::new(0.0, 1.5, 0.0),
    };
    f.scene.node(sun).set_light(light);

    let crate_node = f.scene.spawn(InstanceKind::Shape(BuiltinShape::Cube), "Big Crate");
    f.scene
        .node(crate_node)
        .set_position(1.5, -2.0, 0.25)
        .set_rotation_degrees(10.0, 20.0, 30.0)
        .set_scale_xyz(1.0, 2.0, 0.5)
        .set_override_color(Vec4::new(0.2, 0.4, 0.6, 0.8));
    {
        let node = f.scene.get_node_mut(crate_node).unwrap();
        node.texture = Some(brick);
        node.noise_texture = Some(noise);
        node.mesh_variant = 3;
        node.hatching.crosshatch_mode = CrosshatchMode::Layered;
        node.hatching.angle1 = 0.7;
        node.hatching.radial.radius = 4.0;
    }

    let sign = f.scene.spawn(InstanceKind::Text, "Sign");
    f.scene.node(sign).set_text(r#"He said "hi""#);

    f.scene.attach(crate_node, sun).unwrap();
    f.scene.attach(sign, crate_node).unwrap();

    let bubble = f.scene.spawn(InstanceKind::ComicBubble, "");
    f.scene.node(bubble).set_text("multi word\tpayload \\ done");
}

fn compare_nodes(a: &Node, b: &Node) {
    assert_eq!(a.id, b.id);
    assert_eq!(a.name, b.name);
    assert_eq!(a.kind, b.kind);
    assert_eq!(a.mesh_variant, b.mesh_variant);
    assert!(vec3_approx(a.transform.position, b.transform.position));
    assert!(vec3_approx(a.transform.rotation, b.transform.rotation));
    assert!(vec3_approx(a.transform.scale, b.transform.scale));
    assert_eq!(a.override_color, b.override_color);
    assert_eq!(a.hatching, b.hatching);
    assert_eq!(a.light, b.light);
    assert_eq!(a.text, b.text);
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn save_clear_load_round_trip() {
    init_logger();
    let mut f = Fixture::new();
    populate(&mut f);
    f.scene.update_world_positions();

    let before: Vec<Node> = f
        .scene
        .depth_first()
        .into_iter()
        .map(|h| f.scene.get_node(h).unwrap().clone())
        .collect();
    let text = f.save_to_string();
    assert_eq!(text.lines().count(), 4);

    f.scene.clear();
    let report = f.load_from_str(&text, &ImportMap::new());
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.loaded, 4);
    f.scene.validate().unwrap();

    let after: Vec<Node> = f
        .scene
        .depth_first()
        .into_iter()
        .map(|h| f.scene.get_node(h).unwrap().clone())
        .collect();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        compare_nodes(a, b);
    }

    // Hierarchy edges by id
    let sun = f.scene.handle_of(before[0].id).unwrap();
    let crate_node = f.scene.handle_of(before[1].id).unwrap();
    let sign = f.scene.handle_of(before[2].id).unwrap();
    assert_eq!(f.scene.get_node(crate_node).unwrap().parent(), Some(sun));
    assert_eq!(f.scene.get_node(sign).unwrap().parent(), Some(crate_node));

    // Texture references resolve to the same registry entries
    let node = f.scene.get_node(crate_node).unwrap();
    assert_eq!(f.textures.name_of(node.texture.unwrap()), Some("brick.png"));
    assert_eq!(f.textures.name_of(node.noise_texture.unwrap()), Some("noise 01.png"));

    let light = f.scene.get_node(sun).unwrap().light.unwrap();
    assert_eq!(light.kind, LightKind::Spot);
    assert!(light.animation.enabled);

    // Derived world position recomputed
    assert!(vec3_approx(f.scene.get_node(sun).unwrap().world_position, Vec3::new(0.0, 10.0, 0.0)));
}

#[test]
fn id_after_load_exceeds_loaded_ids() {
    let mut f = Fixture::new();
    populate(&mut f);
    let text = f.save_to_string();

    // A fresh scene starts its counter at 1
    let mut g = Fixture::new();
    g.load_from_str(&text, &ImportMap::new());
    let max = g.scene.max_id().unwrap();
    let fresh = g.scene.spawn(InstanceKind::Shape(BuiltinShape::Torus), "Fresh");
    assert!(g.scene.get_node(fresh).unwrap().id > max);
    g.scene.validate().unwrap();
}

#[test]
fn second_save_is_identical() {
    let mut f = Fixture::new();
    populate(&mut f);
    let first = f.save_to_string();
    f.load_from_str(&first, &ImportMap::new());
    assert_eq!(f.save_to_string(), first);
}

// ============================================================================
// Record format
// ============================================================================

#[test]
fn record_has_fixed_field_count() {
    let node = Node::new(InstanceId(7), InstanceKind::Shape(BuiltinShape::Plane), "Floor");
    let line = format_record(&node, None, None, None);
    let tokens = tokenize(&line).unwrap();
    assert_eq!(tokens.len(), FIELD_COUNT);
    assert_eq!(tokens[0], "7");
    assert_eq!(tokens[1], "plane");
    assert_eq!(tokens[17], "none");
    assert_eq!(tokens[18], "none");
    assert_eq!(tokens[19], "-1");
    assert_eq!(tokens[FIELD_COUNT - 1], "");
}

#[test]
fn quotes_in_text_survive() {
    let mut node = Node::new(InstanceId(1), InstanceKind::Text, "Quote \"me\"");
    node.text = Some(r#"He said "hi""#.to_string());
    let line = format_record(&node, Some(InstanceId(9)), None, None);
    assert!(line.contains(r#""He said \"hi\"""#), "{line}");

    let record = parse_record(&line, 1).unwrap();
    assert_eq!(record.node.text.as_deref(), Some(r#"He said "hi""#));
    assert_eq!(record.node.name, "Quote \"me\"");
    assert_eq!(record.parent_id, Some(InstanceId(9)));
}

#[test]
fn multi_line_text_stays_on_one_record() {
    init_logger();
    let mut f = Fixture::new();
    let bubble = f.scene.spawn(InstanceKind::ComicBubble, "Two\nLines");
    f.scene.node(bubble).set_text("Hello\nworld\r\n!");
    let text = f.save_to_string();
    assert_eq!(text.lines().count(), 1, "{text}");

    let mut g = Fixture::new();
    let report = g.load_from_str(&text, &ImportMap::new());
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.loaded, 1);
    let id = f.scene.get_node(bubble).unwrap().id;
    let loaded = g.scene.find_by_id(id).unwrap();
    assert_eq!(loaded.name, "Two\nLines");
    assert_eq!(loaded.text.as_deref(), Some("Hello\nworld\r\n!"));
}

#[test]
fn reserved_id_is_skipped_and_counter_stays_usable() {
    init_logger();
    let reserved = Node::new(InstanceId::RESERVED, InstanceKind::Shape(BuiltinShape::Cube), "Max");
    let near_max = Node::new(InstanceId(u32::MAX - 1), InstanceKind::Shape(BuiltinShape::Cube), "Near");
    let text = format!(
        "{}\n{}\n",
        format_record(&reserved, None, None, None),
        format_record(&near_max, None, None, None)
    );

    let mut f = Fixture::new();
    let report = f.load_from_str(&text, &ImportMap::new());
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].field, "id");
    assert!(
        report.skipped[0].to_string().starts_with("Scene record line 1 field 'id'"),
        "{}",
        report.skipped[0]
    );
    assert!(f.scene.find_by_id(InstanceId::RESERVED).is_none());

    let a = f.scene.spawn(InstanceKind::Shape(BuiltinShape::Sphere), "A");
    let b = f.scene.spawn(InstanceKind::Shape(BuiltinShape::Sphere), "B");
    let id_a = f.scene.get_node(a).unwrap().id;
    let id_b = f.scene.get_node(b).unwrap().id;
    assert_ne!(id_a, id_b);
    assert_ne!(id_a, InstanceId::RESERVED);
    assert_ne!(id_b, InstanceId(u32::MAX - 1));
    assert_eq!(f.scene.len(), 3);
    f.scene.validate().unwrap();
}

#[test]
fn texture_named_none_is_refused() {
    let mut textures = TextureRegistry::new();
    assert!(matches!(
        textures.add("none"),
        Err(StippleError::ReservedTextureName(name)) if name == "none"
    ));
    assert!(textures.is_empty());

    // An unset texture still reads back as no texture
    let node = Node::new(InstanceId(1), InstanceKind::Shape(BuiltinShape::Cube), "Cube");
    let record = parse_record(&format_record(&node, None, None, None), 1).unwrap();
    assert_eq!(record.texture, None);
}

#[test]
fn rotation_is_written_in_radians() {
    let mut node = Node::new(InstanceId(1), InstanceKind::Shape(BuiltinShape::Cube), "Cube");
    node.transform.set_rotation_degrees(Vec3::new(180.0, 0.0, 0.0));
    let tokens = tokenize(&format_record(&node, None, None, None)).unwrap();
    let rx: f32 = tokens[7].parse().unwrap();
    assert!((rx - std::f32::consts::PI).abs() < EPSILON);
}

#[test]
fn imported_kind_tag_round_trips() {
    let node = Node::new(InstanceId(2), InstanceKind::imported("ship", 3), "Ship");
    let record = parse_record(&format_record(&node, None, None, None), 1).unwrap();
    assert_eq!(record.node.kind, InstanceKind::imported("ship", 3));
}

#[test]
fn malformed_records_are_rejected() {
    let node = Node::new(InstanceId(1), InstanceKind::Shape(BuiltinShape::Cube), "Cube");
    let good = format_record(&node, None, None, None);

    // Too few fields
    let short: Vec<&str> = good.split(' ').take(20).collect();
    let err = parse_record(&short.join(" "), 3).unwrap_err();
    assert_eq!(err.line, 3);

    // Too many fields
    assert!(parse_record(&format!("{good} extra"), 1).is_err());

    // Bad float
    let mut tokens = tokenize(&good).unwrap();
    tokens[4] = "abc".to_string();
    let err = parse_record(&tokens.join(" "), 1).unwrap_err();
    assert_eq!(err.field, "px");

    // Bad animEnabled flag
    let mut tokens = tokenize(&good).unwrap();
    tokens[64] = "2".to_string();
    let bad_flag = tokens
        .iter()
        .map(|t| if t.is_empty() { "\"\"".to_string() } else { t.clone() })
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(parse_record(&bad_flag, 1).unwrap_err().field, "animEnabled");
}

// ============================================================================
// Tolerant loading
// ============================================================================

#[test]
fn bad_lines_are_skipped_and_counted() {
    init_logger();
    let mut f = Fixture::new();
    f.scene.spawn(InstanceKind::Shape(BuiltinShape::Cube), "A");
    f.scene.spawn(InstanceKind::Shape(BuiltinShape::Sphere), "B");
    let text = f.save_to_string();

    let broken = format!("{text}\n   \nthis is not a record\n");
    let mut g = Fixture::new();
    let report = g.load_from_str(&broken, &ImportMap::new());
    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped.len(), 1);
    g.scene.validate().unwrap();
}

#[test]
fn duplicate_ids_keep_first_record() {
    let a = Node::new(InstanceId(5), InstanceKind::Shape(BuiltinShape::Cube), "First");
    let b = Node::new(InstanceId(5), InstanceKind::Shape(BuiltinShape::Cube), "Second");
    let text = format!(
        "{}\n{}\n",
        format_record(&a, None, None, None),
        format_record(&b, None, None, None)
    );

    let mut f = Fixture::new();
    let report = f.load_from_str(&text, &ImportMap::new());
    assert_eq!(report.duplicate_ids, vec![InstanceId(5)]);
    assert_eq!(f.scene.find_by_id(InstanceId(5)).unwrap().name, "First");
}

#[test]
fn missing_parent_places_node_at_root() {
    let child = Node::new(InstanceId(2), InstanceKind::Shape(BuiltinShape::Cube), "Orphan");
    let text = format_record(&child, Some(InstanceId(99)), None, None);

    let mut f = Fixture::new();
    let report = f.load_from_str(&text, &ImportMap::new());
    assert_eq!(report.orphaned, vec![InstanceId(2)]);
    let h = f.scene.handle_of(InstanceId(2)).unwrap();
    assert!(f.scene.root_nodes().contains(&h));
    f.scene.validate().unwrap();
}

#[test]
fn children_before_parents_still_link() {
    let parent = Node::new(InstanceId(1), InstanceKind::Shape(BuiltinShape::Cube), "Parent");
    let child = Node::new(InstanceId(2), InstanceKind::Shape(BuiltinShape::Cube), "Child");
    let text = format!(
        "{}\n{}\n",
        format_record(&child, Some(InstanceId(1)), None, None),
        format_record(&parent, None, None, None)
    );

    let mut f = Fixture::new();
    assert!(f.load_from_str(&text, &ImportMap::new()).is_clean());
    let p = f.scene.handle_of(InstanceId(1)).unwrap();
    let c = f.scene.handle_of(InstanceId(2)).unwrap();
    assert_eq!(f.scene.get_node(c).unwrap().parent(), Some(p));
}

#[test]
fn parent_cycle_in_file_is_broken() {
    let a = Node::new(InstanceId(1), InstanceKind::Shape(BuiltinShape::Cube), "A");
    let b = Node::new(InstanceId(2), InstanceKind::Shape(BuiltinShape::Cube), "B");
    let text = format!(
        "{}\n{}\n",
        format_record(&a, Some(InstanceId(2)), None, None),
        format_record(&b, Some(InstanceId(1)), None, None)
    );

    let mut f = Fixture::new();
    let report = f.load_from_str(&text, &ImportMap::new());
    assert_eq!(report.orphaned.len(), 1);
    f.scene.validate().unwrap();
}

#[test]
fn unknown_texture_resolves_to_none() {
    let node = Node::new(InstanceId(1), InstanceKind::Shape(BuiltinShape::Cube), "Cube");
    let text = format_record(&node, None, Some("missing.png"), None);

    let mut f = Fixture::new();
    let report = f.load_from_str(&text, &ImportMap::new());
    assert_eq!(report.unresolved_textures, vec!["missing.png".to_string()]);
    assert!(f.scene.find_by_id(InstanceId(1)).unwrap().texture.is_none());
    assert!(f.textures.is_empty());
}

#[test]
fn imported_node_without_source_has_no_geometry() {
    let node = Node::new(InstanceId(1), InstanceKind::imported("ghost", 0), "Ghost");
    let text = format_record(&node, None, None, None);

    let mut f = Fixture::new();
    let report = f.load_from_str(&text, &ImportMap::new());
    assert_eq!(report.unresolved_meshes, vec![InstanceId(1)]);
    assert_eq!(f.scene.find_by_id(InstanceId(1)).unwrap().geometry, GeometryRef::None);
}

#[test]
fn read_scene_ignores_blank_lines() {
    let parsed: ParsedScene = read_scene(Cursor::new("\n\n   \n")).unwrap();
    assert!(parsed.records.is_empty());
    assert!(parsed.skipped.is_empty());
}

// ============================================================================
// Files and import map
// ============================================================================

#[test]
fn import_map_path_uses_stem() {
    let path = Path::new("/tmp/levels/harbor.txt");
    assert_eq!(import_map_path(path), PathBuf::from("/tmp/levels/harbor_imp_obj_map.txt"));
}

#[test]
fn import_map_round_trip_and_bad_lines() -> Result<()> {
    let mut map = ImportMap::new();
    map.insert("ship", "/assets/my ship.obj");
    map.insert("rock", "rock.fbx");

    let mut out = Vec::new();
    map.write_to(&mut out)?;
    let mut text = String::from_utf8(out)?;
    text.push_str("only_one_field\n");

    let (read, skipped) = ImportMap::read_from(Cursor::new(text))?;
    assert_eq!(read, map);
    assert_eq!(skipped.len(), 1);
    Ok(())
}

#[test]
fn file_round_trip_reimports_meshes() -> Result<()> {
    init_logger();
    let dir = temp_dir("reimport");
    let scene_path = dir.join("harbor.txt");
    let source = dir.join("ship.obj");

    let mut f = Fixture::new();
    let mut importer = FakeImporter::default();
    let mesh = f.meshes.load(&mut importer, "ship", &source, &mut f.textures)?;
    let hull = f.scene.spawn(InstanceKind::imported("ship", 0), "Hull");
    let mast = f.scene.spawn(InstanceKind::imported("ship", 1), "Mast");
    f.scene.get_node_mut(hull).unwrap().geometry = GeometryRef::Imported { mesh, submesh: 0 };
    f.scene.get_node_mut(mast).unwrap().geometry = GeometryRef::Imported { mesh, submesh: 1 };
    f.scene.attach(mast, hull)?;

    assert_eq!(save_scene_file(&scene_path, &f.scene, &f.textures, &f.meshes)?, 2);
    assert!(import_map_path(&scene_path).exists());

    // Fresh session: meshes must come back through the importer, once
    let mut g = Fixture::new();
    let mut importer = FakeImporter::default();
    let report = load_scene_file(&scene_path, &mut g.scene, &mut g.textures, &mut g.meshes, Some(&mut importer))?;

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(importer.calls, 1);
    assert_eq!(g.meshes.len(), 1);
    assert!(g.textures.get_handle("hull_diffuse.png").is_some());

    let mast = g.scene.find_by_name("Mast").unwrap();
    let node = g.scene.get_node(mast).unwrap();
    assert!(matches!(node.geometry, GeometryRef::Imported { submesh: 1, .. }));
    assert_eq!(node.parent(), g.scene.find_by_name("Hull"));

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn failed_import_is_attempted_once() -> Result<()> {
    let dir = temp_dir("failed_import");
    let scene_path = dir.join("scene.txt");
    let text = [
        format_record(&Node::new(InstanceId(1), InstanceKind::imported("ship", 0), "A"), None, None, None),
        format_record(&Node::new(InstanceId(2), InstanceKind::imported("ship", 1), "B"), None, None, None),
    ]
    .join("\n");
    std::fs::write(&scene_path, text)?;
    std::fs::write(import_map_path(&scene_path), "ship ship.obj\n")?;

    let mut f = Fixture::new();
    let mut importer = FakeImporter {
        fail: true,
        ..FakeImporter::default()
    };
    let report = load_scene_file(&scene_path, &mut f.scene, &mut f.textures, &mut f.meshes, Some(&mut importer))?;

    assert_eq!(importer.calls, 1);
    assert_eq!(report.unresolved_meshes.len(), 2);
    assert_eq!(report.loaded, 2);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn missing_file_leaves_scene_untouched() {
    let mut f = Fixture::new();
    populate(&mut f);
    let count = f.scene.len();

    let result = load_scene_file(
        Path::new("/definitely/not/here/scene.txt"),
        &mut f.scene,
        &mut f.textures,
        &mut f.meshes,
        None,
    );
    assert!(matches!(result, Err(StippleError::IoError(_))));
    assert_eq!(f.scene.len(), count);
}
