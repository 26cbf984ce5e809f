//! Read-only name → bytes stores for reference templates and matrices.
//!
//! The engine never touches the filesystem for its reference data. It is
//! handed an [`AssetStore`] at construction time: [`EmbeddedAssets`] in the
//! binary, [`MemoryAssets`] when a test wants a synthetic corpus.

use std::collections::BTreeMap;

/// Directory holding full-body license templates.
pub const LICENSE_TEMPLATES: &str = "lcs-templates";
/// Directory holding header and short-form templates.
pub const HEADER_TEMPLATES: &str = "header-templates";
/// Directory holding one compatibility matrix per main license.
pub const COMPATIBILITY: &str = "compatibility";

pub trait AssetStore: Sync {
    /// Full names (`dir/file`) of the assets directly under `dir`, sorted.
    fn list(&self, dir: &str) -> Vec<String>;

    fn get(&self, name: &str) -> Option<&[u8]>;
}

macro_rules! embed {
    ($($path:literal),* $(,)?) => {
        &[$(($path, include_bytes!(concat!("../assets/", $path)) as &[u8])),*]
    };
}

static EMBEDDED: &[(&str, &[u8])] = embed![
    "lcs-templates/0BSD.txt",
    "lcs-templates/Apache-2.0.txt",
    "lcs-templates/BSD-2-Clause.txt",
    "lcs-templates/BSD-3-Clause.txt",
    "lcs-templates/BSL-1.0.txt",
    "lcs-templates/ISC.txt",
    "lcs-templates/MIT.txt",
    "lcs-templates/Unlicense.txt",
    "lcs-templates/Zlib.txt",
    "header-templates/AGPL-3.0-or-later.txt",
    "header-templates/Apache-2.0.txt",
    "header-templates/GPL-2.0-or-later.txt",
    "header-templates/GPL-3.0-or-later.txt",
    "header-templates/LGPL-2.1-or-later.txt",
    "header-templates/LGPL-3.0-or-later.txt",
    "header-templates/MPL-2.0.txt",
    "compatibility/Apache-2.0.toml",
    "compatibility/GPL-3.0-or-later.toml",
    "compatibility/MIT.toml",
];

/// The reference data compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

impl AssetStore for EmbeddedAssets {
    fn list(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = EMBEDDED
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| in_dir(name, dir))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    fn get(&self, name: &str) -> Option<&[u8]> {
        EMBEDDED
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, bytes)| *bytes)
    }
}

/// An owned store, filled by hand.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.insert(name.into(), bytes.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetStore for MemoryAssets {
    fn list(&self, dir: &str) -> Vec<String> {
        // BTreeMap keys are already sorted
        self.entries
            .keys()
            .filter(|name| in_dir(name, dir))
            .cloned()
            .collect()
    }

    fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }
}

fn in_dir(name: &str, dir: &str) -> bool {
    name.strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|file| !file.is_empty() && !file.contains('/'))
}
