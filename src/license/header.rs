//! Locating a required license header near the top of a source file.
//!
//! The file is canonicalized the same way license texts are, so comment
//! syntax, copyright lines and reflowing do not matter. A header counts only
//! if it starts within the first `threshold` characters of the canonical
//! content.

use std::path::Path;

use regex::Regex;
use serde::Serialize;

use crate::error::HeaderError;
use crate::license::canonical::{canonicalize, canonicalize_pattern};

pub const DEFAULT_THRESHOLD: usize = 80;

/// How far into a file to look for NUL bytes.
const BINARY_SNIFF_LEN: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

/// NUL bytes near the start or invalid UTF-8 mean binary.
pub fn detect_content(bytes: &[u8]) -> ContentKind {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) || std::str::from_utf8(bytes).is_err() {
        ContentKind::Binary
    } else {
        ContentKind::Text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HeaderOutcome {
    /// Header found; `start` is a char offset into the canonical content.
    Present { start: usize, matched: String },
    Missing,
    /// Not applicable (binary, unreadable).
    Ignored { reason: String },
}

impl HeaderOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// Comment prefix written in front of each header line, by file extension.
pub fn line_prefix(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "rs" | "go" | "java" | "kt" | "scala" | "c" | "h" | "cc" | "cpp" | "hpp" | "cs" | "js"
        | "jsx" | "ts" | "tsx" | "swift" | "dart" | "proto" | "groovy" => "//",
        "sh" | "bash" | "py" | "rb" | "pl" | "toml" | "yaml" | "yml" | "r" | "cmake" | "dockerfile"
        | "tf" | "conf" | "properties" => "#",
        "sql" | "lua" | "hs" | "ada" => "--",
        "lisp" | "el" | "clj" | "ini" | "asm" => ";",
        "tex" | "erl" | "m" => "%",
        "xml" | "html" | "htm" | "md" | "vue" | "svg" => "<!--",
        "bat" | "cmd" => "REM",
        "vb" | "bas" => "'",
        _ => "",
    }
}

/// Compile a header regex template for one comment style.
///
/// Every template line gets `prefix` in front, then goes through the
/// pattern-safe part of canonicalization so it lines up with canonicalized
/// file content. Matching is case-insensitive.
pub fn compile_pattern(template: &str, prefix: &str) -> Result<Regex, HeaderError> {
    let prefixed: Vec<String> = template
        .lines()
        .map(|line| {
            if prefix.is_empty() {
                line.to_string()
            } else {
                format!("{prefix} {line}")
            }
        })
        .collect();
    let normalized = canonicalize_pattern(&prefixed.join("\n"));
    Ok(Regex::new(&format!("(?i){normalized}"))?)
}

/// Look for the header in `bytes`.
///
/// `expected_license` must already be canonical. An empty one is skipped
/// and only `expected_pattern` is tried.
pub fn locate(
    bytes: &[u8],
    expected_license: &str,
    expected_pattern: Option<&Regex>,
    threshold: usize,
) -> HeaderOutcome {
    if detect_content(bytes) == ContentKind::Binary {
        return HeaderOutcome::Ignored {
            reason: "binary file".to_string(),
        };
    }
    let text = String::from_utf8_lossy(bytes);
    let content = canonicalize(&text);

    if !expected_license.is_empty() {
        if let Some(at) = content.find(expected_license) {
            let start = char_offset(&content, at);
            if start < threshold {
                return HeaderOutcome::Present {
                    start,
                    matched: expected_license.to_string(),
                };
            }
        }
    }

    if let Some(pattern) = expected_pattern {
        if let Some(found) = pattern.find(&content) {
            let start = char_offset(&content, found.start());
            if start < threshold {
                return HeaderOutcome::Present {
                    start,
                    matched: found.as_str().to_string(),
                };
            }
        }
    }

    HeaderOutcome::Missing
}

/// Boolean form of [`locate`]; binary files are not a failure.
pub fn header_present(
    bytes: &[u8],
    expected_license: &str,
    expected_pattern: Option<&Regex>,
    threshold: usize,
) -> bool {
    !matches!(
        locate(bytes, expected_license, expected_pattern, threshold),
        HeaderOutcome::Missing
    )
}

fn char_offset(s: &str, byte_index: usize) -> usize {
    s[..byte_index].chars().count()
}
