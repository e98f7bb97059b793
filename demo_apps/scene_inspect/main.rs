//! Usage: `scene_inspect [scene.txt] [settings.json]`
//!
//! Without a scene path a small sample scene is built, saved to the temp
//! directory and loaded back.

use std::path::{Path, PathBuf};

use glam::Vec3;
use stipple::scene::{BuiltinShape, Light, NodeHandle, OrbitAnimation, Scene};
use stipple::{Editor, EditorSettings, InstanceKind, LoadReport};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let scene_path = args.next().map(PathBuf::from);
    let settings = match args.next() {
        Some(path) => EditorSettings::load(Path::new(&path))?,
        None => EditorSettings::default(),
    };

    let mut editor = Editor::new(settings);
    let path = match scene_path {
        Some(path) => path,
        None => write_sample(&mut editor)?,
    };

    let report = editor.load(&path, None)?;
    editor.update(0.0);

    println!("{}", path.display());
    for &root in editor.scene.root_nodes() {
        print_subtree(&editor.scene, root, 0);
    }
    print_report(&report);
    Ok(())
}

fn write_sample(editor: &mut Editor) -> anyhow::Result<PathBuf> {
    let floor = editor.spawn_at_origin(InstanceKind::Shape(BuiltinShape::Plane));
    editor.scene.node(floor).set_scale_xyz(10.0, 1.0, 10.0);

    let table = editor.spawn_at_origin(InstanceKind::Shape(BuiltinShape::Cube));
    editor.scene.node(table).set_position(0.0, 0.5, 0.0).set_name("Table");
    editor.set_parent(table, floor)?;

    let note = editor.spawn_at_origin(InstanceKind::ComicBubble);
    editor.scene.node(note).set_position(0.0, 1.5, 0.0).set_text("What is \"this\"?");
    editor.set_parent(note, table)?;

    let lamp = editor.spawn_in_front(InstanceKind::Light);
    let mut light = Light::new_point(15.0, 2.0);
    light.base_position = Vec3::new(0.0, 4.0, 0.0);
    light.animation = OrbitAnimation {
        enabled: true,
        amplitude: Vec3::new(3.0, 0.0, 3.0),
        frequency: Vec3::splat(0.5),
        phase: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
    };
    editor.scene.node(lamp).set_light(light);

    let path = std::env::temp_dir().join("stipple_sample_scene.txt");
    editor.save(&path)?;
    log::info!("Wrote sample scene to {}", path.display());
    Ok(path)
}

fn print_subtree(scene: &Scene, handle: NodeHandle, depth: usize) {
    let Some(node) = scene.get_node(handle) else {
        return;
    };
    let p = node.world_position;
    println!(
        "{:indent$}#{} {} [{}] at ({:.2}, {:.2}, {:.2})",
        "",
        node.id,
        node.name,
        node.kind,
        p.x,
        p.y,
        p.z,
        indent = depth * 2
    );
    for &child in node.children() {
        print_subtree(scene, child, depth + 1);
    }
}

fn print_report(report: &LoadReport) {
    println!("loaded: {}", report.loaded);
    if report.is_clean() {
        return;
    }
    for err in &report.skipped {
        println!("skipped: {err}");
    }
    for id in &report.duplicate_ids {
        println!("duplicate id: {id}");
    }
    for id in &report.rejected_ids {
        println!("rejected id: {id}");
    }
    for id in &report.orphaned {
        println!("missing parent, moved to root: #{id}");
    }
    for id in &report.unresolved_meshes {
        println!("no geometry: #{id}");
    }
    for name in &report.unresolved_textures {
        println!("unknown texture: {name}");
    }
}
