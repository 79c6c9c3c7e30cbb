//! Virtual file-set builder.
//!
//! Given a block's built bundle plus the viewed file's content and context,
//! composes the complete set of virtual files handed to the Sandbox Runner:
//! a synthesized HTML shell (base stylesheet + all CSS inlined), the
//! rewritten and bridge-wrapped entry script, and any remaining bundle files
//! passed through untouched. The set is regenerated from scratch on every
//! relevant input change; nothing is patched incrementally.

use crate::block::BundleFile;
use crate::bridge::Bridge;
use crate::inject::{synthesize_entry, BlockProps};
use crate::rewrite::strip_framework_imports;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the synthesized HTML shell lives in every file set.
pub const SHELL_PATH: &str = "/public/index.html";

/// Where the synthesized entry module lives in every file set.
pub const ENTRY_PATH: &str = "/App.js";

/// Stylesheet linked by the shell before any block CSS.
const BASE_STYLESHEET_URL: &str = "https://unpkg.com/@primer/css@^16.0.0/dist/primer.css";

/// Extensions a block entry may be authored in. They all normalize to the
/// single runtime script extension.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "jsx"];

/// Mapping from absolute virtual path to file content, handed once per
/// render to the Sandbox Runner. Ordered so serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet(BTreeMap<String, String>);

impl FileSet {
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.0.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Canonical entry file name for a block: the last segment of its entry
/// path with any source extension normalized to the runtime one.
pub fn normalized_entry_name(entry: &str) -> String {
    let file = entry
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("index.js");
    normalize_script_name(file)
}

fn normalize_script_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if SOURCE_EXTENSIONS.contains(&ext) => format!("{}.js", stem),
        _ => name.to_string(),
    }
}

/// Root-relative virtual path for a pass-through bundle file.
fn virtual_path(name: &str) -> String {
    format!("/{}", name.trim_start_matches('/'))
}

/// Compose the virtual file set for one preview render.
///
/// Bundle file names arrive id-qualified ("styleguide/index.js"); the block
/// id prefix is stripped so the sandbox sees root-relative paths. CSS files
/// are consumed into the shell and never appear standalone in the output.
/// A bundle with no matching entry file degrades to an empty main content
/// rather than an error; the preview then renders nothing.
pub fn build_file_set(
    bundle: &[BundleFile],
    props: &BlockProps<'_>,
    bridge: &Bridge,
) -> Result<FileSet> {
    let entry_name = normalized_entry_name(&props.block.entry);
    let id_prefix = format!("{}/", props.block.id);

    let renamed: Vec<BundleFile> = bundle
        .iter()
        .map(|file| BundleFile {
            name: file
                .name
                .strip_prefix(&id_prefix)
                .unwrap_or(&file.name)
                .to_string(),
            content: file.content.clone(),
        })
        .collect();

    let main_content = renamed
        .iter()
        .find(|file| normalize_script_name(&file.name) == entry_name)
        .map(|file| file.content.as_str())
        .unwrap_or("");

    let mut style_blocks = Vec::new();
    // The viewed file is the block's stylesheet; it styles the preview too.
    if let Some(content) = props.content {
        style_blocks.push(format!("<style>{}</style>", content));
    }
    for file in &renamed {
        if file.name.ends_with(".css") {
            style_blocks.push(format!("<style>{}</style>", file.content));
        }
    }

    let shell = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Custom block</title>
</head>
<body>
<!-- this won't load if added to the head -->
<link href="{}" rel="stylesheet" />
{}
<div id="root"></div>
</body>
</html>"#,
        BASE_STYLESHEET_URL,
        style_blocks.join("\n")
    );

    let rewritten = strip_framework_imports(main_content);
    let entry_script = synthesize_entry(&rewritten, props, bridge)?;

    let mut files = FileSet::default();
    files.insert(SHELL_PATH, shell);
    for file in &renamed {
        let is_entry = normalize_script_name(&file.name) == entry_name;
        if is_entry || file.name.ends_with(".css") {
            continue;
        }
        files.insert(virtual_path(&file.name), file.content.clone());
    }
    files.insert(ENTRY_PATH, entry_script);

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::bridge::MessageChannel;
    use serde_json::json;

    fn styleguide_block(entry: &str) -> Block {
        Block {
            id: "styleguide".to_string(),
            kind: "file".to_string(),
            title: "Styleguide".to_string(),
            description: "Edit and preview components".to_string(),
            entry: entry.to_string(),
            extensions: None,
        }
    }

    fn test_bridge() -> Bridge {
        Bridge::new(MessageChannel::new(), "https://blocks.example")
    }

    #[test]
    fn test_entry_name_normalization() {
        assert_eq!(normalized_entry_name("index.tsx"), "index.js");
        assert_eq!(normalized_entry_name("index.ts"), "index.js");
        assert_eq!(normalized_entry_name("index.jsx"), "index.js");
        assert_eq!(normalized_entry_name("index.js"), "index.js");
        assert_eq!(normalized_entry_name("blocks/styleguide/main.tsx"), "main.js");
        assert_eq!(normalized_entry_name(""), "index.js");
        // Non-script files pass through.
        assert_eq!(normalized_entry_name("styles.css"), "styles.css");
    }

    #[test]
    fn test_styleguide_end_to_end() {
        let block = styleguide_block("index.tsx");
        let context = json!({ "path": "style.css" });
        let bundle = vec![BundleFile {
            name: "styleguide/index.tsx".to_string(),
            content: "import React from 'react'; export default () => <div/>;".to_string(),
        }];
        let props = BlockProps {
            block: &block,
            context: &context,
            content: Some("* {color: red;}"),
            tree: None,
            metadata: None,
        };

        let files = build_file_set(&bundle, &props, &test_bridge()).unwrap();

        let shell = files.get(SHELL_PATH).unwrap();
        assert!(shell.contains("color: red"));
        assert!(shell.contains(r#"<div id="root"></div>"#));

        // The user bundle's framework import is gone; the single remaining
        // "react" import is the harness's own re-exposure at the top.
        let entry = files.get(ENTRY_PATH).unwrap();
        assert!(!entry.contains("from 'react'"));
        assert_eq!(entry.matches("from \"react\"").count(), 1);
        assert!(entry.contains("export default () => <div/>;"));
    }

    #[test]
    fn test_css_files_are_inlined_never_standalone() {
        let block = styleguide_block("index.js");
        let context = json!({});
        let bundle = vec![
            BundleFile {
                name: "styleguide/index.js".to_string(),
                content: "export default () => null;".to_string(),
            },
            BundleFile {
                name: "styleguide/theme.css".to_string(),
                content: ".btn { border: none; }".to_string(),
            },
        ];
        let props = BlockProps {
            block: &block,
            context: &context,
            content: None,
            tree: None,
            metadata: None,
        };

        let files = build_file_set(&bundle, &props, &test_bridge()).unwrap();

        assert!(!files.contains("/theme.css"));
        assert!(files
            .get(SHELL_PATH)
            .unwrap()
            .contains("<style>.btn { border: none; }</style>"));
        for (path, _) in files.iter() {
            assert!(!path.ends_with(".css"), "standalone CSS leaked: {}", path);
        }
    }

    #[test]
    fn test_other_files_pass_through_untouched() {
        let block = styleguide_block("index.js");
        let context = json!({});
        let bundle = vec![
            BundleFile {
                name: "styleguide/index.js".to_string(),
                content: "export default () => null;".to_string(),
            },
            BundleFile {
                name: "styleguide/utils.js".to_string(),
                content: "export const x = 1;".to_string(),
            },
        ];
        let props = BlockProps {
            block: &block,
            context: &context,
            content: None,
            tree: None,
            metadata: None,
        };

        let files = build_file_set(&bundle, &props, &test_bridge()).unwrap();
        assert_eq!(files.get("/utils.js"), Some("export const x = 1;"));
    }

    #[test]
    fn test_missing_entry_degrades_to_empty_main_content() {
        let block = styleguide_block("index.tsx");
        let context = json!({});
        let bundle = vec![BundleFile {
            name: "styleguide/helpers.js".to_string(),
            content: "export const y = 2;".to_string(),
        }];
        let props = BlockProps {
            block: &block,
            context: &context,
            content: None,
            tree: None,
            metadata: None,
        };

        // No throw: the entry script is synthesized around empty content.
        let files = build_file_set(&bundle, &props, &test_bridge()).unwrap();
        let entry = files.get(ENTRY_PATH).unwrap();
        assert!(entry.contains("const Block = BlockBundle.default;"));
        assert!(files.contains("/helpers.js"));
    }

    #[test]
    fn test_set_regenerated_per_render_with_fixed_paths() {
        let block = styleguide_block("index.js");
        let context = json!({});
        let bundle = vec![BundleFile {
            name: "styleguide/index.js".to_string(),
            content: "export default () => null;".to_string(),
        }];
        let props = BlockProps {
            block: &block,
            context: &context,
            content: None,
            tree: None,
            metadata: None,
        };
        let bridge = test_bridge();

        let first = build_file_set(&bundle, &props, &bridge).unwrap();
        let second = build_file_set(&bundle, &props, &bridge).unwrap();

        // Same layout every time; the entry script itself differs per build
        // (each one carries a freshly minted request-id prefix).
        let paths = |set: &FileSet| set.iter().map(|(p, _)| p.to_string()).collect::<Vec<_>>();
        assert_eq!(paths(&first), paths(&second));
        assert_eq!(first.get(SHELL_PATH), second.get(SHELL_PATH));
        assert!(first.contains(ENTRY_PATH));
        assert_eq!(first.len(), 2);
    }
}
