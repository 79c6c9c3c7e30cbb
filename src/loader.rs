//! Raw block-source loaders.
//!
//! The preview orchestrator needs the text of a block's built bundle before
//! it can compose a virtual file set. Two loaders are provided behind one
//! async trait:
//! - [`DirSourceLoader`]: reads from a single allowed directory. Path
//!   traversal is blocked via canonicalization and only block source
//!   extensions are readable.
//! - [`HttpSourceLoader`]: fetches over HTTP(S) from an origin allowlist,
//!   with redirects disabled so a response can't bounce outside it.

use anyhow::{anyhow, Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

/// Loads the raw text of a block bundle file.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    async fn load(&self, path: &str) -> Result<String>;
}

/// A loader that restricts all reads to a single directory.
pub struct DirSourceLoader {
    allowed_dir: PathBuf,
}

impl DirSourceLoader {
    /// Create a loader that only reads from `allowed_dir`.
    pub fn new(allowed_dir: impl AsRef<Path>) -> Result<Self, Error> {
        let canonical = allowed_dir
            .as_ref()
            .canonicalize()
            .map_err(|e| anyhow!("Failed to canonicalize allowed_dir: {}", e))?;

        if !canonical.is_dir() {
            return Err(anyhow!("allowed_dir must be a directory"));
        }

        Ok(Self {
            allowed_dir: canonical,
        })
    }

    /// Check if a path is within the allowed directory.
    /// Uses canonicalization to resolve symlinks and prevent traversal.
    fn is_path_allowed(&self, path: &Path) -> bool {
        match path.canonicalize() {
            Ok(canonical) => canonical.starts_with(&self.allowed_dir),
            Err(_) => false,
        }
    }

    /// Validate the extension is a block source file.
    fn is_extension_allowed(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("js") | Some("mjs") | Some("jsx") | Some("ts") | Some("tsx") | Some("css") | Some("json")
        )
    }
}

#[async_trait]
impl SourceLoader for DirSourceLoader {
    async fn load(&self, path: &str) -> Result<String> {
        if Path::new(path).is_absolute() {
            return Err(anyhow!("Absolute paths are forbidden: {}", path));
        }

        let full = self.allowed_dir.join(path);

        if !self.is_path_allowed(&full) {
            return Err(anyhow!(
                "Access denied: '{}' is outside the allowed directory",
                path
            ));
        }

        if !Self::is_extension_allowed(&full) {
            return Err(anyhow!("Not a block source file: {}", path));
        }

        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| anyhow!("Failed to read '{}': {}", path, e))
    }
}

/// A loader that fetches raw source over HTTP(S) from allowed origins only.
pub struct HttpSourceLoader {
    client: reqwest::Client,
    /// Allowed origins (e.g., "https://blocks.example.com").
    /// An origin is scheme + host + port.
    allowed_origins: Vec<String>,
}

impl HttpSourceLoader {
    pub fn new(allowed_origins: Vec<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            // A redirect could jump outside the allowlist.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            allowed_origins,
        })
    }

    pub fn is_origin_allowed(&self, url: &Url) -> bool {
        if self.allowed_origins.is_empty() {
            return false;
        }
        let origin = url.origin().ascii_serialization();
        self.allowed_origins.iter().any(|allowed| origin == *allowed)
    }
}

#[async_trait]
impl SourceLoader for HttpSourceLoader {
    async fn load(&self, path: &str) -> Result<String> {
        let url = Url::parse(path).map_err(|e| anyhow!("Invalid URL '{}': {}", path, e))?;

        if !self.is_origin_allowed(&url) {
            return Err(anyhow!(
                "Load blocked: origin '{}' is not in the allowlist. Allowed: {:?}",
                url.origin().ascii_serialization(),
                self.allowed_origins
            ));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Load failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Load failed: '{}' returned {}",
                path,
                response.status()
            ));
        }

        response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body: {}", e))
    }
}
