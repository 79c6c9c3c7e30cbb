//! Preview orchestration: load raw block source, compose the virtual file
//! set, and hand it to the Sandbox Runner.
//!
//! A preview owns one bridge (and therefore one instance id) for its whole
//! mount lifetime. Reloads are generation-guarded: the block's entry can
//! change while a load is still in flight, and two in-flight loads may
//! resolve in either order, so each refresh takes a generation number and a
//! resolution belonging to a superseded generation is discarded.

use crate::bridge::{Bridge, MessageChannel};
use crate::block::BundleFile;
use crate::bundle::{build_file_set, FileSet};
use crate::inject::BlockProps;
use crate::loader::SourceLoader;
use crate::runner::{SandboxRunner, TemplatePreset};
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// What the host should render for this preview right now.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewState {
    /// Placeholder until the bundle has loaded at least once. A failed load
    /// leaves the preview here.
    Loading,
    /// The file set currently executing in the sandbox.
    Ready { files: FileSet },
}

/// One mounted sandboxed preview.
pub struct Preview<L, R> {
    loader: L,
    runner: R,
    bridge: Bridge,
    state: Mutex<PreviewState>,
    generation: AtomicU64,
}

impl<L: SourceLoader, R: SandboxRunner> Preview<L, R> {
    pub fn new(loader: L, runner: R, channel: MessageChannel, origin: impl Into<String>) -> Self {
        Self {
            loader,
            runner,
            bridge: Bridge::new(channel, origin),
            state: Mutex::new(PreviewState::Loading),
            generation: AtomicU64::new(0),
        }
    }

    /// This preview's bridge; its instance id is stable for the mount.
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn state(&self) -> PreviewState {
        self.state.lock().expect("preview state lock poisoned").clone()
    }

    /// (Re)load the block's raw source and run the resulting file set.
    ///
    /// Call again whenever the block's entry identifier or the viewed
    /// content changes. Returns Ok(false) when this refresh was superseded
    /// by a newer one while its load was in flight; the stale result is
    /// discarded. A load error propagates and leaves the state at Loading.
    pub async fn refresh(&self, props: &BlockProps<'_>) -> Result<bool> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let source_path = format!("{}/{}", props.block.id, props.block.entry);
        let source = self.loader.load(&source_path).await?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding superseded bundle load");
            return Ok(false);
        }

        let entry_file = props
            .block
            .entry
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or("index.js");
        let bundle = vec![BundleFile {
            name: format!("{}/{}", props.block.id, entry_file),
            content: source,
        }];

        let files = build_file_set(&bundle, props, &self.bridge)?;
        self.runner.run(&files, TemplatePreset::ReactTs, true)?;

        *self.state.lock().expect("preview state lock poisoned") =
            PreviewState::Ready { files };
        Ok(true)
    }
}
