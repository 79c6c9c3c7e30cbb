//! Seam to the external Sandbox Runner.
//!
//! Executing the virtual file set in an isolated frame is somebody else's
//! job; this crate only prepares the files and speaks the bridge protocol.
//! The runner is reached through a trait so hosts can plug in whatever
//! isolation backend they have.

use crate::bundle::FileSet;
use anyhow::Result;

/// Tooling preset the runner should boot the file set with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePreset {
    React,
    ReactTs,
}

impl TemplatePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplatePreset::React => "react",
            TemplatePreset::ReactTs => "react-ts",
        }
    }
}

/// Executes a virtual file set in an isolated frame and keeps the preview
/// live. `autorun` starts execution immediately instead of waiting for a
/// user gesture.
pub trait SandboxRunner: Send + Sync {
    fn run(&self, files: &FileSet, template: TemplatePreset, autorun: bool) -> Result<()>;
}
