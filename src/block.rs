//! Core data model for hosted blocks.
//!
//! A "block" is a pluggable viewer/editor for a file or folder. The host
//! invokes it with the file's content, a context describing where the file
//! lives, and whatever metadata was previously persisted for this block
//! instance. All of these shapes cross the sandbox boundary as JSON, so
//! field names here follow the wire format, not Rust convention.

use serde::{Deserialize, Serialize};

/// Identifies which block plugin is being hosted. Immutable per render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    /// Path to the entry file within the block's bundle, e.g. "index.tsx".
    pub entry: String,
    /// File extensions this block applies to. None = all files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

/// Where the viewed file lives: repo coordinates plus the file path.
///
/// The host serializes this into every bridge message so replies can be
/// routed; the sandboxed block receives it frozen as a prop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileContext {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub sha: String,
}

/// One named snippet in a styleguide block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub title: String,
    /// UI markup fragment rendered against the viewed stylesheet.
    pub code: String,
}

/// Everything a styleguide block instance persists, saved as one opaque
/// metadata blob on the parent file. The whole list is the unit of save;
/// there is no per-component persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleguideMetadata {
    pub components: Vec<ComponentDefinition>,
}

/// A single file of a block's built bundle, as produced by the build step.
/// Transient: produced per preview render, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleFile {
    /// Id-qualified relative path, e.g. "styleguide/index.js".
    pub name: String,
    pub content: String,
}
