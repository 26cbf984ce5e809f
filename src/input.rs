//! Dependency lists handed to `deps resolve` / `deps check`.
//!
//! ```toml
//! [[dependency]]
//! name = "serde"
//! version = "1.0.200"
//! license = "MIT OR Apache-2.0"
//!
//! [[dependency]]
//! name = "vendored-lib"
//! version = "0.3.1"
//! license-file = "vendor/vendored-lib/LICENSE"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::DependencyRecord;

#[derive(Debug, Deserialize)]
struct InputFile {
    #[serde(default)]
    dependency: Vec<DependencyRecord>,
}

/// Parse a dependency list. `license-file` entries are read relative to the
/// list's own directory; one that cannot be read leaves the record without
/// text so it ends up skipped instead of failing the whole batch.
pub fn load_dependencies(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading dependency list {}", path.display()))?;
    let input: InputFile = toml::from_str(&content)
        .with_context(|| format!("parsing dependency list {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut records = input.dependency;
    for record in &mut records {
        if record.license_text.is_some() {
            continue;
        }
        let Some(file) = &record.license_file else {
            continue;
        };
        let full = base.join(file);
        match std::fs::read(&full) {
            Ok(bytes) => record.license_text = Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => tracing::warn!(
                dependency = %record.name,
                path = %full.display(),
                error = %err,
                "license file not readable"
            ),
        }
    }
    tracing::debug!(count = records.len(), "loaded dependency list");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_license_file_relative_to_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("vendor")).unwrap();
        std::fs::write(dir.path().join("vendor/LICENSE"), "Some license text").unwrap();
        let list = dir.path().join("deps.toml");
        std::fs::write(
            &list,
            r#"
[[dependency]]
name = "serde"
version = "1.0.200"
license = "MIT OR Apache-2.0"

[[dependency]]
name = "vendored"
version = "0.1.0"
license-file = "vendor/LICENSE"

[[dependency]]
name = "broken"
license-file = "vendor/MISSING"
"#,
        )
        .unwrap();

        let records = load_dependencies(&list).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].license.as_deref(), Some("MIT OR Apache-2.0"));
        assert_eq!(records[1].license_text.as_deref(), Some("Some license text"));
        assert!(records[2].license_text.is_none());
        assert_eq!(records[2].version, "");
    }

    #[test]
    fn test_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("deps.toml");
        std::fs::write(&list, "").unwrap();
        assert!(load_dependencies(&list).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("deps.toml");
        std::fs::write(&list, "[[dependency]]\nversion = 3\n").unwrap();
        assert!(load_dependencies(&list).is_err());
    }
}
