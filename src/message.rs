//! Wire schema for host <-> sandbox bridge messages.
//!
//! Every message carries the instance id of the bridge that created it. The
//! host may be running several sandboxed previews at once over the same
//! global message channel, so the id is the only thing that lets replies be
//! routed to the right preview. Field and tag names are the wire format and
//! must not be renamed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A bridge message, tagged by its `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Sandbox asks the host to persist new metadata for this block instance.
    #[serde(rename = "update-metadata")]
    UpdateMetadata {
        id: String,
        context: Value,
        metadata: Value,
        path: String,
        block: Value,
        #[serde(rename = "currentMetadata")]
        current_metadata: Value,
    },

    /// Sandbox asks the host to navigate its own UI to another path.
    #[serde(rename = "navigate-to-path")]
    NavigateToPath {
        id: String,
        context: Value,
        path: String,
    },

    /// Sandbox asks the host to replace the viewed file's content.
    #[serde(rename = "update-file")]
    UpdateFile {
        id: String,
        context: Value,
        content: String,
    },

    /// Sandbox asks the host to fetch arbitrary data on its behalf.
    /// `request_id` correlates the eventual response.
    #[serde(rename = "github-data--request")]
    GitHubDataRequest {
        id: String,
        context: Value,
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "requestType")]
        request_type: String,
        config: Value,
    },

    /// Host's reply to a `GitHubDataRequest` with the same `request_id`.
    #[serde(rename = "github-data--response")]
    GitHubDataResponse {
        id: String,
        context: Value,
        #[serde(rename = "requestId")]
        request_id: String,
        data: Value,
    },
}

impl BridgeMessage {
    /// The bridge-instance id this message belongs to.
    pub fn instance_id(&self) -> &str {
        match self {
            BridgeMessage::UpdateMetadata { id, .. }
            | BridgeMessage::NavigateToPath { id, .. }
            | BridgeMessage::UpdateFile { id, .. }
            | BridgeMessage::GitHubDataRequest { id, .. }
            | BridgeMessage::GitHubDataResponse { id, .. } => id,
        }
    }
}

/// A message plus the origin it was posted from, mirroring the origin
/// tagging that `postMessage` delivery provides. Receivers must check the
/// origin before acting on the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: String,
    pub message: BridgeMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_metadata_wire_format() {
        let msg = BridgeMessage::UpdateMetadata {
            id: "sandboxed-block-1".to_string(),
            context: json!({ "path": "style.css" }),
            metadata: json!({ "components": [] }),
            path: "style.css".to_string(),
            block: json!({ "id": "styleguide" }),
            current_metadata: json!({}),
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "update-metadata");
        assert_eq!(value["currentMetadata"], json!({}));
        assert!(value.get("current_metadata").is_none());
    }

    #[test]
    fn test_request_round_trip() {
        let wire = json!({
            "type": "github-data--request",
            "id": "sandboxed-block-2",
            "context": {},
            "requestId": "github-data--request--abc--1",
            "requestType": "commits",
            "config": { "path": "src/" },
        });

        let msg: BridgeMessage = serde_json::from_value(wire.clone()).unwrap();
        match &msg {
            BridgeMessage::GitHubDataRequest { request_id, request_type, .. } => {
                assert_eq!(request_id, "github-data--request--abc--1");
                assert_eq!(request_type, "commits");
            }
            other => panic!("wrong variant: {:?}", other),
        }
        assert_eq!(serde_json::to_value(&msg).unwrap(), wire);
    }

    #[test]
    fn test_instance_id_accessor() {
        let msg = BridgeMessage::NavigateToPath {
            id: "sandboxed-block-3".to_string(),
            context: json!({}),
            path: "README.md".to_string(),
        };
        assert_eq!(msg.instance_id(), "sandboxed-block-3");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let wire = json!({ "type": "shutdown", "id": "x" });
        assert!(serde_json::from_value::<BridgeMessage>(wire).is_err());
    }
}
