//! Rewrites user bundles so they can run inside the sandbox harness.
//!
//! The harness already provides the UI framework globally; a bundle that
//! re-imports it from the framework root module would instantiate a second
//! copy and break hooks/rendering. We strip exactly those imports and leave
//! everything else byte-identical. This is a textual, best-effort rewrite,
//! not a parse: good enough for built bundles, which emit imports in
//! predictable form.

use regex::Regex;
use std::sync::OnceLock;

/// The framework root module whose imports the sandbox harness provides.
/// Sub-path imports ("react-dom", "react/jsx-runtime") are left alone.
const FRAMEWORK_MODULE: &str = "react";

fn framework_import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Binding list may span lines (named imports are often formatted one
        // per line) but can never contain quotes, so the lazy match cannot
        // run across an adjacent import of a different module.
        Regex::new(&format!(
            r#"import[\s\w{{}},*]+?from\s*["']{}["'];?"#,
            FRAMEWORK_MODULE
        ))
        .unwrap()
    })
}

/// Remove every import statement that imports exclusively from the framework
/// root module. All other imports and code are untouched; input without a
/// matching import is returned unchanged, and the rewrite is idempotent.
pub fn strip_framework_imports(source: &str) -> String {
    framework_import_pattern().replace_all(source, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_default_import() {
        let source = r#"import React from "react";
export default () => <div/>;"#;
        let out = strip_framework_imports(source);
        assert!(!out.contains("react"));
        assert!(out.contains("export default () => <div/>;"));
    }

    #[test]
    fn test_strips_named_and_mixed_imports() {
        let source = "import React, { useState, useEffect } from 'react';\nconst x = 1;";
        let out = strip_framework_imports(source);
        assert!(!out.contains("from 'react'"));
        assert!(out.contains("const x = 1;"));
    }

    #[test]
    fn test_strips_namespace_import() {
        let out = strip_framework_imports(r#"import * as React from "react";"#);
        assert!(!out.contains("react"));
    }

    #[test]
    fn test_strips_multiline_import_list() {
        let source = "import {\n  useState,\n  useMemo,\n} from \"react\";\nlet a;";
        let out = strip_framework_imports(source);
        assert!(!out.contains("useMemo"));
        assert!(out.contains("let a;"));
    }

    #[test]
    fn test_strips_multiple_occurrences() {
        let source = concat!(
            "import React from \"react\";\n",
            "import \"./app.css\";\n",
            "import { useState } from 'react';\n",
        );
        let out = strip_framework_imports(source);
        assert!(!out.contains("'react'"));
        assert!(!out.contains("\"react\""));
        assert!(out.contains("import \"./app.css\";"));
    }

    #[test]
    fn test_leaves_other_imports_untouched() {
        let source = concat!(
            "import ReactDOM from \"react-dom\";\n",
            "import styles from \"./styles.css\";\n",
            "import { thing } from \"not-react\";\n",
        );
        assert_eq!(strip_framework_imports(source), source);
    }

    #[test]
    fn test_no_match_returns_input_unchanged() {
        let source = "const a = \"react\"; // just a string";
        assert_eq!(strip_framework_imports(source), source);
    }

    #[test]
    fn test_idempotent() {
        let source = "import React from 'react';\nimport x from './x';\nexport default x;";
        let once = strip_framework_imports(source);
        assert_eq!(strip_framework_imports(&once), once);
    }

    #[test]
    fn test_does_not_cross_adjacent_imports() {
        // A lazy pattern must not start at the first import and swallow
        // everything up to a later "react".
        let source = "import a from \"./a\";\nimport React from \"react\";\n";
        let out = strip_framework_imports(source);
        assert!(out.contains("import a from \"./a\";"));
        assert!(!out.contains("React"));
    }
}
