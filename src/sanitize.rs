//! Validates props before they are baked into a synthesized entry script.
//!
//! Context, tree, and metadata are embedded into generated JavaScript as
//! JSON literals and later parsed inside the sandbox. A metadata blob
//! carrying `__proto__` or friends would pollute Object.prototype the moment
//! the sandboxed frame parses it, so those keys are rejected outright.
//! Depth is capped to keep a hostile blob from blowing the embedded literal
//! up into a stack-busting parse.

use anyhow::{anyhow, Result};
use serde_json::Value;

/// Maximum recursion depth for nested objects/arrays
const MAX_DEPTH: usize = 32;

/// Keys that could be used for prototype pollution
const DANGEROUS_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Check a props value for embedding into generated script text.
///
/// # Errors
/// Returns an error if:
/// - A dangerous key (`__proto__`, `constructor`, `prototype`) is found
/// - Nesting depth exceeds MAX_DEPTH (32)
pub fn validate_props(value: &Value) -> Result<()> {
    validate_recursive(value, 0)
}

fn validate_recursive(value: &Value, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(anyhow!(
            "Props nesting too deep (max {} levels)",
            MAX_DEPTH
        ));
    }

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                if DANGEROUS_KEYS.contains(&key.as_str()) {
                    return Err(anyhow!(
                        "Prototype pollution attempt: '{}' key is forbidden in props",
                        key
                    ));
                }
                validate_recursive(val, depth + 1)?;
            }
            Ok(())
        }
        Value::Array(arr) => {
            for item in arr {
                validate_recursive(item, depth + 1)?;
            }
            Ok(())
        }
        // Primitives are safe
        _ => Ok(()),
    }
}
