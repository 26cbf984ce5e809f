//! Header checks over a source tree.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use glob::Pattern;
use indicatif::ProgressBar;
use rayon::prelude::*;
use regex::Regex;

use crate::error::HeaderError;
use crate::license::canonical::canonicalize;
use crate::license::header::{self, HeaderOutcome, DEFAULT_THRESHOLD};
use crate::models::{FileResult, HeaderReport};

/// Every comment prefix [`header::line_prefix`] can return.
const PREFIXES: &[&str] = &["", "//", "#", "--", ";", "%", "<!--", "REM", "'"];

/// Expected header for one run, prepared once and shared across files.
#[derive(Debug, Clone)]
pub struct HeaderChecker {
    expected: String,
    patterns: HashMap<&'static str, Regex>,
    threshold: usize,
}

impl HeaderChecker {
    /// `content` is the literal header text, `pattern` an optional regex
    /// template. Either may be empty but not both.
    pub fn new(content: &str, pattern: Option<&str>, threshold: usize) -> Result<Self, HeaderError> {
        let expected = canonicalize(content);
        let mut patterns = HashMap::new();
        if let Some(template) = pattern.filter(|p| !p.trim().is_empty()) {
            for prefix in PREFIXES {
                patterns.insert(*prefix, header::compile_pattern(template, prefix)?);
            }
        }
        if expected.is_empty() && patterns.is_empty() {
            return Err(HeaderError::NothingToMatch);
        }
        Ok(Self {
            expected,
            patterns,
            threshold,
        })
    }

    pub fn with_default_threshold(content: &str, pattern: Option<&str>) -> Result<Self, HeaderError> {
        Self::new(content, pattern, DEFAULT_THRESHOLD)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Check the content of one file. The file's extension picks the comment
    /// style used for the pattern.
    pub fn check(&self, path: &Path, bytes: &[u8]) -> HeaderOutcome {
        let pattern = self.patterns.get(header::line_prefix(path));
        header::locate(bytes, &self.expected, pattern, self.threshold)
    }
}

/// Expand `include` globs under `root`, drop anything matching `exclude`, and
/// return the regular files sorted.
pub fn collect_files(root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>, HeaderError> {
    let excluded = exclude
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut files = BTreeSet::new();
    for pattern in include {
        let full = root.join(pattern);
        let entries = glob::glob(&full.to_string_lossy())?;
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable path");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if excluded.iter().any(|p| p.matches_path(relative)) {
                tracing::trace!(path = %relative.display(), "excluded");
                continue;
            }
            files.insert(path);
        }
    }
    Ok(files.into_iter().collect())
}

/// Check every file in `files`. Files are independent and processed in
/// parallel; results come back in the order given.
pub fn check_files(checker: &HeaderChecker, files: &[PathBuf], progress: Option<&ProgressBar>) -> HeaderReport {
    let files = files
        .par_iter()
        .map(|path| {
            let outcome = match std::fs::read(path) {
                Ok(bytes) => checker.check(path, &bytes),
                Err(err) => HeaderOutcome::Ignored {
                    reason: format!("unreadable: {err}"),
                },
            };
            if let Some(pb) = progress {
                pb.inc(1);
            }
            if matches!(outcome, HeaderOutcome::Missing) {
                tracing::debug!(path = %path.display(), "license header missing");
            }
            FileResult {
                path: path.clone(),
                outcome,
            }
        })
        .collect();
    HeaderReport { files }
}

/// [`collect_files`] followed by [`check_files`].
pub fn check_paths(
    root: &Path,
    include: &[String],
    exclude: &[String],
    checker: &HeaderChecker,
) -> Result<HeaderReport, HeaderError> {
    let files = collect_files(root, include, exclude)?;
    tracing::info!(files = files.len(), root = %root.display(), "checking license headers");
    Ok(check_files(checker, &files, None))
}
