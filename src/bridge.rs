//! Bridge protocol codec - the host side of the sandbox message channel.
//!
//! Communication with a sandboxed preview is pure message passing over one
//! global channel shared by every preview (the postMessage model). Outbound
//! events are fire-and-forget; `github-data--request` is the one correlated
//! request/response pair, bounded by a five minute timeout.
//!
//! Correlation rules:
//! - Every message carries its bridge's instance id; inbound messages for a
//!   different instance are skipped without logging (expected on a shared
//!   channel, not an error).
//! - Request ids are a process-unique UUID prefix plus a per-bridge counter,
//!   so two bridges can never mint colliding ids.
//! - A response settles a request only if origin, instance id, and request
//!   id all match. Exactly one outcome (response or timeout) occurs per
//!   request, and the channel subscription is dropped on settlement.

use crate::message::{BridgeMessage, Envelope};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

/// How long a correlated request waits for its response before failing.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Buffered envelopes per subscriber before a slow one starts lagging.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// No matching response arrived within [`RESPONSE_TIMEOUT`].
    #[error("Timeout")]
    Timeout,

    #[error("message channel closed")]
    ChannelClosed,
}

/// The global message channel every preview shares.
///
/// Broadcast-backed: each subscriber sees every envelope and is responsible
/// for filtering by origin and instance id, exactly like frames sharing a
/// window message channel.
#[derive(Clone)]
pub struct MessageChannel {
    tx: broadcast::Sender<Envelope>,
}

impl MessageChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Post an envelope to every current subscriber. Fire-and-forget: having
    /// no subscribers is not an error.
    pub fn post(&self, origin: &str, message: BridgeMessage) {
        let _ = self.tx.send(Envelope {
            origin: origin.to_string(),
            message,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Host-side reply to a `github-data--request`. The caller must echo the
    /// request's instance id and request id or the reply will be skipped.
    pub fn respond_github_data(
        &self,
        origin: &str,
        instance_id: &str,
        context: Value,
        request_id: &str,
        data: Value,
    ) {
        self.post(
            origin,
            BridgeMessage::GitHubDataResponse {
                id: instance_id.to_string(),
                context,
                request_id: request_id.to_string(),
                data,
            },
        );
    }

    /// Number of live subscribers. Only meaningful for tests asserting that
    /// request listeners are released on settlement.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One sandboxed preview's communication identity.
///
/// The instance id is generated once when the preview mounts and is stable
/// for that mount's lifetime; remounts get a fresh bridge.
pub struct Bridge {
    instance_id: String,
    origin: String,
    channel: MessageChannel,
    request_prefix: String,
    counter: AtomicU64,
}

impl Bridge {
    /// Create a bridge posting from (and trusting responses from) `origin`.
    pub fn new(channel: MessageChannel, origin: impl Into<String>) -> Self {
        Self {
            instance_id: format!("sandboxed-block-{}", Uuid::new_v4()),
            origin: origin.into(),
            channel,
            request_prefix: format!("github-data--request--{}", Uuid::new_v4()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The origin this bridge posts from and trusts responses from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn next_request_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}--{}", self.request_prefix, n)
    }

    // ------------------------------------------------------------------
    // Fire-and-forget events
    // ------------------------------------------------------------------

    /// Ask the host to persist new metadata for this block instance.
    pub fn send_update_metadata(
        &self,
        context: &Value,
        block: &Value,
        path: &str,
        metadata: Value,
        current_metadata: Value,
    ) {
        self.channel.post(
            &self.origin,
            BridgeMessage::UpdateMetadata {
                id: self.instance_id.clone(),
                context: context.clone(),
                metadata,
                path: path.to_string(),
                block: block.clone(),
                current_metadata,
            },
        );
    }

    /// Ask the host to navigate to another path.
    pub fn send_navigate_to_path(&self, context: &Value, path: &str) {
        self.channel.post(
            &self.origin,
            BridgeMessage::NavigateToPath {
                id: self.instance_id.clone(),
                context: context.clone(),
                path: path.to_string(),
            },
        );
    }

    /// Ask the host to replace the viewed file's content.
    pub fn send_update_file(&self, context: &Value, content: &str) {
        self.channel.post(
            &self.origin,
            BridgeMessage::UpdateFile {
                id: self.instance_id.clone(),
                context: context.clone(),
                content: content.to_string(),
            },
        );
    }

    // ------------------------------------------------------------------
    // Correlated request/response
    // ------------------------------------------------------------------

    /// Post a `github-data--request` and wait for its correlated response.
    ///
    /// Resolves with the first inbound envelope whose origin, instance id,
    /// and request id all match; fails with [`BridgeError::Timeout`] after
    /// [`RESPONSE_TIMEOUT`]. Whichever happens first wins, and the channel
    /// subscription is dropped either way.
    pub async fn request_github_data(
        &self,
        context: &Value,
        request_type: &str,
        config: Value,
    ) -> Result<Value, BridgeError> {
        let request_id = self.next_request_id();

        // Subscribe before posting so a synchronous responder can't race
        // ahead of the listener.
        let mut rx = self.channel.subscribe();

        self.channel.post(
            &self.origin,
            BridgeMessage::GitHubDataRequest {
                id: self.instance_id.clone(),
                context: context.clone(),
                request_id: request_id.clone(),
                request_type: request_type.to_string(),
                config,
            },
        );

        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if envelope.origin != self.origin {
                            trace!(origin = %envelope.origin, "skipping envelope from foreign origin");
                            continue;
                        }
                        match envelope.message {
                            BridgeMessage::GitHubDataResponse {
                                id,
                                request_id: response_request_id,
                                data,
                                ..
                            } => {
                                if id != self.instance_id {
                                    trace!(%id, "skipping response for another bridge instance");
                                    continue;
                                }
                                if response_request_id != request_id {
                                    trace!(%response_request_id, "skipping response for another request");
                                    continue;
                                }
                                return Ok(data);
                            }
                            _ => continue,
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        trace!(skipped, "bridge subscriber lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(BridgeError::ChannelClosed);
                    }
                }
            }
        };

        match tokio::time::timeout(RESPONSE_TIMEOUT, wait).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout),
        }
    }
}
