//! Filesystem-safe labels for folder and file names.

use crate::constants::UNKNOWN_LABEL;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const WHITESPACE_RUN_PATTERN: &str = r"\s+";
const FORBIDDEN_CHARS_PATTERN: &str = r#"[\\/:*?"<>|]"#;

/// Cached regex for collapsing whitespace runs.
static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

/// Cached regex for characters that are invalid in Windows path segments.
static FORBIDDEN_CHARS: OnceLock<Regex> = OnceLock::new();

/// Normalizes text into a single path segment.
///
/// Trims the input, collapses whitespace runs into one space and replaces each of
/// `\ / : * ? " < > |` with `_`. The relative segments `.` and `..` become `_` so a
/// label never leaves its parent folder. Length is not limited.
pub fn sanitize(text: &str) -> String {
    let whitespace = WHITESPACE_RUN.get_or_init(|| {
        Regex::new(WHITESPACE_RUN_PATTERN).expect("WHITESPACE_RUN_PATTERN is a valid regex pattern")
    });
    let forbidden = FORBIDDEN_CHARS.get_or_init(|| {
        Regex::new(FORBIDDEN_CHARS_PATTERN)
            .expect("FORBIDDEN_CHARS_PATTERN is a valid regex pattern")
    });

    let collapsed = whitespace.replace_all(text.trim(), " ");
    let cleaned = forbidden.replace_all(&collapsed, "_");
    match &*cleaned {
        "." | ".." => "_".to_string(),
        _ => cleaned.into_owned(),
    }
}

/// Sanitizes an arbitrary JSON value. Absent or `null` values become `"Unknown"`.
pub fn sanitize_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN_LABEL.to_string(),
        Some(v) => sanitize(&value_to_text(v)),
    }
}

/// Text form of a JSON value: strings unquoted, everything else as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
