use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::license::compatibility::Policy;
use crate::license::header::DEFAULT_THRESHOLD;

/// Root configuration, deserialized from `.license-lint/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub header: HeaderConfig,
    pub dependency: DependencyConfig,
}

/// What `header check` looks for and where.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HeaderConfig {
    /// Literal header text. Comment markers and copyright lines are ignored.
    pub content: String,
    /// Regex template tried when the literal text is not found.
    pub pattern: Option<String>,
    /// The header must start within this many characters of canonical content.
    pub threshold: usize,
    /// Globs, relative to the project root, of files to check.
    pub paths: Vec<String>,
    /// Globs of files to leave out.
    pub paths_ignore: Vec<String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            content: String::new(),
            pattern: None,
            threshold: DEFAULT_THRESHOLD,
            paths: vec!["**/*".to_string()],
            paths_ignore: vec![
                ".git/**".to_string(),
                "target/**".to_string(),
                "node_modules/**".to_string(),
                "**/*.lock".to_string(),
                "**/*.md".to_string(),
                "**/*.json".to_string(),
                "LICENSE*".to_string(),
                "COPYING*".to_string(),
                "NOTICE*".to_string(),
                ".license-lint/**".to_string(),
            ],
        }
    }
}

/// How `deps check` judges dependency licenses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DependencyConfig {
    /// SPDX id of the project's own license.
    pub main_license: Option<String>,
    #[serde(flatten)]
    pub policy: Policy,
    /// Dependencies with no identifiable license fail the check.
    pub fail_on_unknown: bool,
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

/// Candidate config files after an explicit override, most specific first.
fn search_paths(project_path: &Path) -> Vec<PathBuf> {
    let mut paths = vec![project_path.join(".license-lint").join("config.toml")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("license-lint").join("config.toml"));
    }
    paths
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.license-lint/config.toml`
/// 3. `~/.config/license-lint/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    for candidate in search_paths(project_path) {
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "using config file");
            return read_config(&candidate);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(Config::default())
}
