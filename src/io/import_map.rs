//! Companion file mapping imported-mesh logical names to source paths.
//!
//! Imported multi-mesh assets cannot be rebuilt from the scene file alone,
//! so next to `scene.txt` the editor keeps `scene_imp_obj_map.txt` with one
//! `logicalName sourcePath` pair per line, quoted like scene records.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::errors::{Result, StippleError};
use crate::io::tokenizer::{quote, tokenize};

/// Suffix appended to the scene file stem.
pub const IMPORT_MAP_SUFFIX: &str = "_imp_obj_map.txt";

/// Path of the companion import map for `scene_path`.
#[must_use]
pub fn import_map_path(scene_path: &Path) -> PathBuf {
    let stem = scene_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{stem}{IMPORT_MAP_SUFFIX}");
    match scene_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Logical name → source path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    entries: FxHashMap<String, PathBuf>,
}

impl ImportMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical_name: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(logical_name.into(), path.into());
    }

    #[must_use]
    pub fn get(&self, logical_name: &str) -> Option<&Path> {
        self.entries.get(logical_name).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes one pair per line, sorted by logical name.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        for name in names {
            let path = self.entries[name].to_string_lossy();
            writeln!(out, "{} {}", quote(name), quote(&path))?;
        }
        Ok(())
    }

    /// Reads pairs, skipping blank lines.
    ///
    /// Malformed lines are logged and skipped; the second tuple element
    /// holds their errors.
    pub fn read_from<R: BufRead>(input: R) -> Result<(Self, Vec<StippleError>)> {
        let mut map = Self::new();
        let mut skipped = Vec::new();

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = index + 1;

            match tokenize(&line) {
                Ok(tokens) if tokens.len() == 2 => {
                    let mut tokens = tokens.into_iter();
                    if let (Some(name), Some(path)) = (tokens.next(), tokens.next()) {
                        map.insert(name, path);
                    }
                }
                Ok(tokens) => {
                    let err = StippleError::ImportMap {
                        line: line_no,
                        reason: format!("expected 2 fields, found {}", tokens.len()),
                    };
                    log::warn!("{err}");
                    skipped.push(err);
                }
                Err(e) => {
                    let err = StippleError::ImportMap {
                        line: line_no,
                        reason: e.to_string(),
                    };
                    log::warn!("{err}");
                    skipped.push(err);
                }
            }
        }

        Ok((map, skipped))
    }
}

impl FromIterator<(String, PathBuf)> for ImportMap {
    fn from_iter<T: IntoIterator<Item = (String, PathBuf)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
