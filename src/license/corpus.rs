//! Reference corpus: canonical license templates plus compatibility matrices.
//!
//! Built once from an [`AssetStore`] and immutable afterwards. Everything
//! that identifies or evaluates licenses borrows a `&Corpus`.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use crate::assets::{AssetStore, COMPATIBILITY, HEADER_TEMPLATES, LICENSE_TEMPLATES};
use crate::error::CorpusError;
use crate::license::canonical::canonicalize;
use crate::license::compatibility::CompatibilityMatrix;

/// Which template group a reference text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// A complete license body, as found in a LICENSE file.
    Full,
    /// A short-form notice, as found at the top of a source file.
    Header,
}

#[derive(Debug, Clone)]
pub struct ReferenceTemplate {
    /// SPDX ID: the asset file name without its extension.
    pub spdx_id: String,
    pub asset: String,
    pub kind: TemplateKind,
    pub canonical: String,
}

#[derive(Debug, Default)]
pub struct Corpus {
    templates: Vec<ReferenceTemplate>,
    matrices: HashMap<String, CompatibilityMatrix>,
}

impl Corpus {
    /// Load every template and matrix from `store`.
    ///
    /// Templates are canonicalized in parallel; the first failure aborts the
    /// whole load so a run never starts on a partial corpus.
    pub fn load(store: &dyn AssetStore) -> Result<Self, CorpusError> {
        let mut sources: Vec<(String, TemplateKind)> = Vec::new();
        sources.extend(
            store
                .list(LICENSE_TEMPLATES)
                .into_iter()
                .map(|name| (name, TemplateKind::Full)),
        );
        sources.extend(
            store
                .list(HEADER_TEMPLATES)
                .into_iter()
                .map(|name| (name, TemplateKind::Header)),
        );

        let templates = sources
            .par_iter()
            .map(|(asset, kind)| load_template(store, asset, *kind))
            .collect::<Result<Vec<_>, _>>()?;
        check_overlaps(&templates)?;

        let parsed = store
            .list(COMPATIBILITY)
            .par_iter()
            .map(|asset| {
                let bytes = store
                    .get(asset)
                    .ok_or_else(|| CorpusError::MissingAsset(asset.clone()))?;
                CompatibilityMatrix::from_toml(asset, bytes)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut matrices = HashMap::with_capacity(parsed.len());
        for matrix in parsed {
            let key = matrix.license.to_ascii_lowercase();
            if matrices.contains_key(&key) {
                return Err(CorpusError::DuplicateMatrix(matrix.license));
            }
            matrices.insert(key, matrix);
        }

        tracing::info!(
            templates = templates.len(),
            matrices = matrices.len(),
            "loaded license corpus"
        );

        Ok(Self { templates, matrices })
    }

    pub fn templates(&self) -> &[ReferenceTemplate] {
        &self.templates
    }

    /// Matrix row for a main license, looked up case-insensitively.
    pub fn matrix(&self, main_license: &str) -> Option<&CompatibilityMatrix> {
        self.matrices.get(&main_license.trim().to_ascii_lowercase())
    }

    /// Main licenses that have a matrix row, sorted.
    pub fn main_licenses(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.matrices.values().map(|m| m.license.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

fn load_template(
    store: &dyn AssetStore,
    asset: &str,
    kind: TemplateKind,
) -> Result<ReferenceTemplate, CorpusError> {
    let bytes = store
        .get(asset)
        .ok_or_else(|| CorpusError::MissingAsset(asset.to_string()))?;
    let text = std::str::from_utf8(bytes).map_err(|_| CorpusError::InvalidUtf8 {
        name: asset.to_string(),
    })?;

    let canonical = canonicalize(text);
    if canonical.is_empty() {
        return Err(CorpusError::EmptyTemplate {
            name: asset.to_string(),
        });
    }

    Ok(ReferenceTemplate {
        spdx_id: spdx_id_from_asset(asset),
        asset: asset.to_string(),
        kind,
        canonical,
    })
}

/// `lcs-templates/Apache-2.0.txt` → `Apache-2.0`.
fn spdx_id_from_asset(asset: &str) -> String {
    let path = Path::new(asset);
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(asset)
        .to_string()
}

/// Two templates for different licenses where one is a prefix of the other
/// would make a first-hit search answer differently from run to run.
fn check_overlaps(templates: &[ReferenceTemplate]) -> Result<(), CorpusError> {
    for (i, a) in templates.iter().enumerate() {
        for b in &templates[i + 1..] {
            if a.spdx_id == b.spdx_id {
                continue;
            }
            if a.canonical.starts_with(&b.canonical) || b.canonical.starts_with(&a.canonical) {
                return Err(CorpusError::OverlappingTemplates {
                    first: a.asset.clone(),
                    second: b.asset.clone(),
                });
            }
        }
    }
    Ok(())
}
