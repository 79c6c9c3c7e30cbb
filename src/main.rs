//! Block Sandbox CLI
//!
//! Single-shot mode:
//!   block-sandbox <blocks-dir> <request-json>
//!
//! Server mode (persistent process, reads from stdin):
//!   block-sandbox --server <blocks-dir>
//!
//! A request describes one preview render:
//!   {"block":{"id":"styleguide","type":"file","title":"Styleguide",
//!     "description":"","entry":"index.tsx"},
//!    "context":{"owner":"octocat","repo":"css","path":"style.css","sha":""},
//!    "content":"* {color: red;}","metadata":{"components":[]}}
//!
//! Response (server mode):
//!   Status:Ok
//!   Length:1234
//!
//!   {"/App.js":"...","/public/index.html":"..."}
//!
//! Error response:
//!   Status:Error
//!   Length:42
//!
//!   no source at 'styleguide/index.tsx'

use anyhow::{anyhow, Result};
use block_sandbox::{
    Block, BlockProps, DirSourceLoader, FileSet, MessageChannel, Preview, PreviewState,
    SandboxRunner, TemplatePreset,
};
use serde::Deserialize;
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::info;

/// Origin baked into the bridge when a request doesn't carry one.
const DEFAULT_ORIGIN: &str = "http://localhost:3000";

#[derive(Deserialize)]
struct BundleRequest {
    block: Block,
    context: Value,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tree: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// The CLI only composes file sets; executing them is the embedding host's
/// job, so the runner here does nothing.
struct NoopRunner;

impl SandboxRunner for NoopRunner {
    fn run(&self, _files: &FileSet, _template: TemplatePreset, _autorun: bool) -> Result<()> {
        Ok(())
    }
}

fn print_usage() {
    eprintln!("Block Sandbox - virtual file-set bundler for sandboxed block previews");
    eprintln!();
    eprintln!("Single-shot mode:");
    eprintln!("  block-sandbox <blocks-dir> <request-json>");
    eprintln!();
    eprintln!("Server mode (persistent process):");
    eprintln!("  block-sandbox --server <blocks-dir>");
    eprintln!();
    eprintln!("Examples:");
    eprintln!(
        "  block-sandbox ./dist '{{\"block\":{{\"id\":\"styleguide\",\"type\":\"file\",\"title\":\"\",\"description\":\"\",\"entry\":\"index.tsx\"}},\"context\":{{}}}}'"
    );
    eprintln!("  block-sandbox --server ./dist");
}

/// Compose the file set for one render request.
async fn bundle_once(blocks_dir: &str, request: &BundleRequest) -> Result<FileSet> {
    let loader = DirSourceLoader::new(blocks_dir)?;
    let origin = request
        .origin
        .clone()
        .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
    let preview = Preview::new(loader, NoopRunner, MessageChannel::new(), origin);

    let props = BlockProps {
        block: &request.block,
        context: &request.context,
        content: request.content.as_deref(),
        tree: request.tree.as_ref(),
        metadata: request.metadata.as_ref(),
    };
    preview.refresh(&props).await?;

    match preview.state() {
        PreviewState::Ready { files } => Ok(files),
        PreviewState::Loading => Err(anyhow!("bundle did not load")),
    }
}

/// Run in single-shot mode: print the composed file set as JSON to stdout.
async fn run_single_shot(blocks_dir: &str, request_json: &str) -> Result<()> {
    let request: BundleRequest = serde_json::from_str(request_json)
        .map_err(|e| anyhow!("Invalid request JSON: {}", e))?;

    let files = bundle_once(blocks_dir, &request).await?;
    println!("{}", serde_json::to_string_pretty(&files)?);

    Ok(())
}

/// Run in server mode: one JSON request per stdin line, framed responses on
/// stdout.
async fn run_server(blocks_dir: &str) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut reader = stdin.lock();

    info!("server ready, reading from stdin");

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            // EOF - stdin closed, exit gracefully
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: BundleRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                write_response(&mut stdout, false, &format!("Invalid request JSON: {}", e))?;
                continue;
            }
        };

        match bundle_once(blocks_dir, &request).await {
            Ok(files) => {
                let body = serde_json::to_string(&files)?;
                write_response(&mut stdout, true, &body)?;
            }
            Err(e) => {
                write_response(&mut stdout, false, &e.to_string())?;
            }
        }
    }

    info!("server shutting down");
    Ok(())
}

/// Write response in length-prefixed protocol
fn write_response(stdout: &mut std::io::Stdout, ok: bool, body: &str) -> Result<()> {
    let status = if ok { "Ok" } else { "Error" };
    let length = body.len();

    writeln!(stdout, "Status:{}", status)?;
    writeln!(stdout, "Length:{}", length)?;
    writeln!(stdout)?; // Empty line separator
    write!(stdout, "{}", body)?;
    stdout.flush()?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Err(anyhow!("Missing required arguments"));
    }

    // Check for server mode
    if args[1] == "--server" {
        if args.len() < 3 {
            print_usage();
            return Err(anyhow!("Server mode requires blocks-dir argument"));
        }
        return run_server(&args[2]).await;
    }

    // Single-shot mode
    if args.len() < 3 {
        print_usage();
        return Err(anyhow!("Missing required arguments"));
    }

    run_single_shot(&args[1], &args[2]).await
}
