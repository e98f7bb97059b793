//! Scene persistence
//!
//! - tokenizer: whitespace/quoted-string splitting shared by both files
//! - scene_file: the one-record-per-line scene format and its loader
//! - import_map: the companion `<stem>_imp_obj_map.txt` file

pub mod import_map;
pub mod scene_file;
pub mod tokenizer;

pub use import_map::{IMPORT_MAP_SUFFIX, ImportMap, import_map_path};
pub use scene_file::{
    FIELD_COUNT, LoadContext, LoadReport, ParsedScene, SceneRecord, TEXTURE_NONE, format_record,
    load_scene_file, parse_record, read_scene, rebuild_scene, save_scene_file, write_scene,
};
pub use tokenizer::{TokenError, Tokenizer, quote, tokenize};
