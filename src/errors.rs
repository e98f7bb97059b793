//! Error Types
//!
//! This module defines the error types used throughout the editor core.
//!
//! # Overview
//!
//! The main error type [`StippleError`] covers every failure mode the core
//! can report:
//! - Hierarchy edits that would break the scene graph invariants
//! - Scene file and import map parsing failures
//! - Mesh import failures reported by the external importer
//! - File I/O and settings decoding errors
//!
//! None of these are fatal: editor operations log them and leave the scene
//! untouched.
//!
//! # Usage
//!
//! Fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, StippleError>`.
//!
//! ```rust,ignore
//! use stipple::errors::{StippleError, Result};
//!
//! fn reparent(scene: &mut Scene, child: NodeHandle, parent: NodeHandle) -> Result<()> {
//!     scene.attach(child, parent)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::scene::InstanceId;

/// The main error type for the editor core.
#[derive(Error, Debug)]
pub enum StippleError {
    // ========================================================================
    // Scene Graph Errors
    // ========================================================================
    /// A handle did not resolve to a live node.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The requested parenting would create a cycle or attach a node to itself.
    #[error("Invalid hierarchy edit: {0}")]
    InvalidHierarchy(String),

    /// Two live nodes would share the same instance id.
    #[error("Duplicate instance id: {0}")]
    DuplicateId(InstanceId),

    /// A loaded node carries an id the scene cannot allocate past.
    #[error("Instance id out of range: {0}")]
    IdOutOfRange(InstanceId),

    /// A structural invariant check failed.
    #[error("Scene graph invariant violated: {0}")]
    InvariantViolated(String),

    // ========================================================================
    // Scene File Errors
    // ========================================================================
    /// A single scene record could not be parsed.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The name is the scene file's placeholder for "no texture".
    #[error("Texture name '{0}' is reserved")]
    ReservedTextureName(String),

    /// A line of the import map could not be parsed.
    #[error("Import map line {line}: {reason}")]
    ImportMap {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    // ========================================================================
    // Import Errors
    // ========================================================================
    /// The mesh importer failed to load a source file.
    #[error("Mesh import failed for '{path}': {reason}")]
    MeshImport {
        /// Source path handed to the importer
        path: String,
        /// Importer-provided reason
        reason: String,
    },

    // ========================================================================
    // I/O & Settings Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON settings decoding error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A malformed field inside one scene-file record.
///
/// Loading skips the offending line and keeps going; the error is logged
/// and counted in the load report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Scene record line {line} field '{field}': {reason}")]
pub struct RecordError {
    /// 1-based line number in the scene file
    pub line: usize,
    /// Name of the field that failed
    pub field: &'static str,
    /// What was wrong with it
    pub reason: String,
}

impl RecordError {
    pub fn new(line: usize, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            line,
            field,
            reason: reason.into(),
        }
    }
}

/// Alias for `Result<T, StippleError>`.
pub type Result<T> = std::result::Result<T, StippleError>;
