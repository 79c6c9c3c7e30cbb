//! # Block Sandbox
//!
//! Host-side machinery for sandboxed "block" previews: given a block
//! descriptor, user-authored source, file content, and persisted metadata,
//! compose the virtual file set an external Sandbox Runner executes in an
//! isolated frame, and speak the postMessage-style bridge protocol the
//! sandboxed code uses to talk back.
//!
//! ## Isolation Guarantees
//!
//! - **No shared memory with the sandbox**: every value crossing the
//!   boundary is serialized into the generated entry script
//! - **No framework double-instancing**: imports from the framework root
//!   module are stripped from user bundles before injection
//! - **No cross-preview delivery**: every message carries its bridge's
//!   instance id; responses for other instances or origins are skipped
//! - **No unbounded waits**: correlated requests time out after 5 minutes
//!   and release their channel subscription either way
//!
//! ## Usage
//!
//! ```rust,ignore
//! use block_sandbox::{build_file_set, Bridge, BlockProps, MessageChannel};
//!
//! let channel = MessageChannel::new();
//! let bridge = Bridge::new(channel.clone(), "https://blocks.example");
//! let files = build_file_set(&bundle, &props, &bridge)?;
//! runner.run(&files, TemplatePreset::ReactTs, true)?;
//! ```

mod block;
mod bridge;
mod bundle;
mod inject;
mod loader;
mod message;
mod preview;
mod rewrite;
mod runner;
mod sanitize;

pub use block::{Block, BundleFile, ComponentDefinition, FileContext, StyleguideMetadata};
pub use bridge::{Bridge, BridgeError, MessageChannel, RESPONSE_TIMEOUT};
pub use bundle::{build_file_set, normalized_entry_name, FileSet, ENTRY_PATH, SHELL_PATH};
pub use inject::{synthesize_entry, BlockProps};
pub use loader::{DirSourceLoader, HttpSourceLoader, SourceLoader};
pub use message::{BridgeMessage, Envelope};
pub use preview::{Preview, PreviewState};
pub use rewrite::strip_framework_imports;
pub use runner::{SandboxRunner, TemplatePreset};
pub use sanitize::validate_props;
