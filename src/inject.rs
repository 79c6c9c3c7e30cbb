//! Host-bridge entry script synthesis.
//!
//! The sandboxed frame cannot share memory or closures with the host, so
//! everything the block needs crosses the boundary as text: the rewritten
//! entry source is embedded verbatim, and context, content, tree, and
//! metadata are baked in as JSON literals frozen at synthesis time. The
//! four host-communication callbacks are generated around the bridge's
//! instance id; request ids combine a prefix minted fresh per synthesis
//! with a locally incrementing counter so concurrent in-sandbox requests
//! never collide, in this script or across re-synthesized ones.

use crate::block::Block;
use crate::bridge::Bridge;
use crate::sanitize::validate_props;
use anyhow::{Context as _, Result};
use serde_json::Value;
use uuid::Uuid;

/// The serializable props a block is rendered with, frozen at synthesis
/// time. References only; nothing here is owned or mutated.
#[derive(Debug, Clone, Copy)]
pub struct BlockProps<'a> {
    pub block: &'a Block,
    pub context: &'a Value,
    pub content: Option<&'a str>,
    pub tree: Option<&'a Value>,
    pub metadata: Option<&'a Value>,
}

impl BlockProps<'_> {
    /// The viewed file's path, as carried inside the context object.
    pub fn context_path(&self) -> &str {
        self.context
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Generate the glue script that runs inside the sandbox: wraps the user's
/// default-exported component, feeds it the frozen props, wires up the four
/// host callbacks, and mounts it at the shell's root element.
pub fn synthesize_entry(
    rewritten_entry: &str,
    props: &BlockProps<'_>,
    bridge: &Bridge,
) -> Result<String> {
    validate_props(props.context).context("invalid context")?;
    if let Some(tree) = props.tree {
        validate_props(tree).context("invalid tree")?;
    }
    if let Some(metadata) = props.metadata {
        validate_props(metadata).context("invalid metadata")?;
    }

    let context_json = serde_json::to_string(props.context)?;
    let path_json = serde_json::to_string(props.context_path())?;
    let block_json = serde_json::to_string(props.block)?;
    let content_json = serde_json::to_string(&props.content)?;
    let tree_json = serde_json::to_string(&props.tree)?;
    let metadata_json = match props.metadata {
        Some(metadata) => serde_json::to_string(metadata)?,
        None => "{}".to_string(),
    };

    // Fresh per-synthesis prefix: the generated script's sub-counter restarts
    // at 0 every synthesis, and the host-side codec mints from its own
    // bridge-scoped prefix, so sharing a prefix with either would let two id
    // streams collide.
    let request_prefix = format!("github-data--request--{}", Uuid::new_v4());

    Ok(format!(
        r#"import React from "react";
import ReactDOM from "react-dom";

{entry}

const Block = BlockBundle.default;

const onUpdateMetadata = (newMetadata) => {{
  window.parent.postMessage({{
    type: "update-metadata",
    id: "{id}",
    context: {context},
    metadata: newMetadata,
    path: {path},
    block: {block},
    currentMetadata: {metadata},
  }}, "*");
}};

const onNavigateToPath = (path) => {{
  window.parent.postMessage({{
    type: "navigate-to-path",
    id: "{id}",
    context: {context},
    path,
  }}, "*");
}};

export default function WrappedBlock() {{
  const onRequestUpdateContent = (content) => {{
    window.parent.postMessage({{
      type: "update-file",
      id: "{id}",
      context: {context},
      content: content,
    }}, "*");
  }};

  let uniqueId = 0;
  const getUniqueId = () => {{
    uniqueId++;
    return uniqueId;
  }};

  const onRequestGitHubData = React.useCallback((requestType, config) => {{
    // for responses to this specific request
    const requestId = "{request_prefix}--" + getUniqueId();
    window.parent.postMessage({{
      type: "github-data--request",
      id: "{id}",
      context: {context},
      requestId,
      requestType,
      config,
    }}, "*");

    return new Promise((resolve, reject) => {{
      const onMessage = (event) => {{
        if (event.origin !== "{origin}") return;
        if (event.data.type !== "github-data--response") return;
        if (event.data.id !== "{id}") return;
        if (event.data.requestId !== requestId) return;
        window.removeEventListener("message", onMessage);
        resolve(event.data.data);
      }};
      window.addEventListener("message", onMessage);
      const maxDelay = 1000 * 60 * 5;
      window.setTimeout(() => {{
        window.removeEventListener("message", onMessage);
        reject(new Error("Timeout"));
      }}, maxDelay);
    }});
  }}, []);

  return <Block
    context={{{context}}}
    content={{{content}}}
    tree={{{tree}}}
    metadata={{{metadata}}}
    onUpdateMetadata={{onUpdateMetadata}}
    onNavigateToPath={{onNavigateToPath}}
    onRequestUpdateContent={{onRequestUpdateContent}}
    onRequestGitHubData={{onRequestGitHubData}}
  />;
}}

ReactDOM.render(<WrappedBlock />, document.getElementById("root"));
"#,
        entry = rewritten_entry,
        id = bridge.instance_id(),
        context = context_json,
        path = path_json,
        block = block_json,
        metadata = metadata_json,
        content = content_json,
        tree = tree_json,
        request_prefix = request_prefix,
        origin = bridge.origin(),
    ))
}
