//! Compatibility of dependency licenses with a project's main license.
//!
//! Each main license has one matrix row listing other licenses as
//! compatible, weak-compatible (allowed only when the policy opts in) or
//! incompatible, with FSF-free / OSI-approved flags per entry. Anything the
//! row does not list is rejected.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompatibilityError, CorpusError, ExpressionError};
use crate::license::corpus::Corpus;
use crate::license::expression::{self, LicenseExpression, LicenseTerm};
use crate::license::spdx;

/// Global policy switches, fixed for the duration of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Policy {
    pub require_fsf_free: bool,
    pub require_osi_approved: bool,
    pub allow_weak_compatible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    Compatible,
    WeakCompatible,
    Incompatible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatrixEntry {
    pub id: String,
    #[serde(default)]
    pub fsf_free: bool,
    #[serde(default)]
    pub osi_approved: bool,
}

/// Matrix files accept either a bare id or a table with flags.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntrySpec {
    Id(String),
    Full(MatrixEntry),
}

impl From<EntrySpec> for MatrixEntry {
    fn from(spec: EntrySpec) -> Self {
        match spec {
            EntrySpec::Id(id) => MatrixEntry {
                id,
                fsf_free: false,
                osi_approved: false,
            },
            EntrySpec::Full(entry) => entry,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct MatrixFile {
    license: Option<String>,
    #[serde(default)]
    compatible: Vec<EntrySpec>,
    #[serde(default)]
    weak_compatible: Vec<EntrySpec>,
    #[serde(default)]
    incompatible: Vec<EntrySpec>,
}

/// One main license's row.
#[derive(Debug, Clone)]
pub struct CompatibilityMatrix {
    pub license: String,
    entries: HashMap<String, (Relation, MatrixEntry)>,
}

impl CompatibilityMatrix {
    /// Parse a TOML matrix. The main license defaults to the file stem.
    pub fn from_toml(asset: &str, bytes: &[u8]) -> Result<Self, CorpusError> {
        let text = std::str::from_utf8(bytes).map_err(|_| CorpusError::InvalidUtf8 {
            name: asset.to_string(),
        })?;
        let file: MatrixFile = toml::from_str(text).map_err(|source| CorpusError::InvalidMatrix {
            name: asset.to_string(),
            source,
        })?;

        let license = file.license.unwrap_or_else(|| {
            Path::new(asset)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(asset)
                .to_string()
        });

        let mut matrix = Self {
            license,
            entries: HashMap::new(),
        };
        let groups = [
            (Relation::Compatible, file.compatible),
            (Relation::WeakCompatible, file.weak_compatible),
            (Relation::Incompatible, file.incompatible),
        ];
        for (relation, specs) in groups {
            for spec in specs {
                matrix.insert(relation, spec.into())?;
            }
        }
        Ok(matrix)
    }

    fn insert(&mut self, relation: Relation, entry: MatrixEntry) -> Result<(), CorpusError> {
        let key = entry.id.to_ascii_lowercase();
        if let Some((existing, _)) = self.entries.get(&key) {
            if *existing != relation {
                return Err(CorpusError::OverlappingSets {
                    main: self.license.clone(),
                    license: entry.id,
                });
            }
        }
        self.entries.insert(key, (relation, entry));
        Ok(())
    }

    /// Find `id`, falling back to its deprecated/explicit GNU spelling.
    pub fn lookup(&self, id: &str) -> Option<(Relation, &MatrixEntry)> {
        let found = self.entries.get(&id.to_ascii_lowercase()).or_else(|| {
            spdx::deprecated_alias(id).and_then(|alias| self.entries.get(&alias.to_ascii_lowercase()))
        });
        found.map(|(relation, entry)| (*relation, entry))
    }

    pub fn ids(&self, relation: Relation) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .entries
            .values()
            .filter(|(r, _)| *r == relation)
            .map(|(_, entry)| entry.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    Compatible,
    WeakCompatible,
    Incompatible,
    WeakNotAllowed,
    NotFsfFree,
    NotOsiApproved,
    NotListed,
    Ambiguous,
    Unidentified,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::Compatible => "compatible",
            Reason::WeakCompatible => "weak-compatible (allowed by policy)",
            Reason::Incompatible => "incompatible",
            Reason::WeakNotAllowed => "weak-compatible (not allowed by policy)",
            Reason::NotFsfFree => "not FSF free",
            Reason::NotOsiApproved => "not OSI approved",
            Reason::NotListed => "not listed for main license",
            Reason::Ambiguous => "ambiguous expression (mixed AND/OR)",
            Reason::Unidentified => "license could not be identified",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermDecision {
    pub license: String,
    pub accepted: bool,
    pub reason: Reason,
}

/// Verdict for one license field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub accepted: bool,
    pub reason: Reason,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<TermDecision>,
}

impl Decision {
    fn rejected(reason: Reason) -> Self {
        Self {
            accepted: false,
            reason,
            terms: Vec::new(),
        }
    }
}

/// Evaluates license fields against one main license's row.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    matrix: &'a CompatibilityMatrix,
    policy: Policy,
}

impl<'a> Evaluator<'a> {
    /// Fails when the corpus has no row for `main_license`; no verdict can be
    /// trusted without one.
    pub fn new(corpus: &'a Corpus, main_license: &str, policy: Policy) -> Result<Self, CompatibilityError> {
        let matrix = corpus
            .matrix(main_license)
            .ok_or_else(|| CompatibilityError::NoCompatibilityEntry(main_license.to_string()))?;
        Ok(Self { matrix, policy })
    }

    pub fn main_license(&self) -> &str {
        &self.matrix.license
    }

    /// Evaluate a resolved license id or flat SPDX expression.
    pub fn evaluate(&self, license: &str) -> Decision {
        let normalized = spdx::normalize(license);
        let expr = match expression::parse(&normalized) {
            Ok(expr) => expr,
            Err(ExpressionError::Empty) => return Decision::rejected(Reason::Unidentified),
            Err(ExpressionError::Ambiguous(raw)) => {
                tracing::warn!(expression = %raw, "rejecting ambiguous license expression");
                return Decision::rejected(Reason::Ambiguous);
            }
        };
        self.evaluate_expression(&expr)
    }

    pub fn evaluate_expression(&self, expr: &LicenseExpression) -> Decision {
        let terms: Vec<TermDecision> = expr.terms().iter().map(|t| self.decide_term(t)).collect();
        let accepted = expr.combine(terms.iter().map(|t| t.accepted));

        // Report the term that settled the outcome.
        let reason = terms
            .iter()
            .find(|t| t.accepted == accepted)
            .or_else(|| terms.first())
            .map(|t| t.reason)
            .unwrap_or(Reason::Unidentified);

        Decision {
            accepted,
            reason,
            terms: if expr.is_compound() { terms } else { Vec::new() },
        }
    }

    fn decide_term(&self, term: &LicenseTerm) -> TermDecision {
        let id = spdx::normalize(term.base_id());
        let (accepted, reason) = match self.matrix.lookup(&id) {
            None => (false, Reason::NotListed),
            Some((Relation::Incompatible, _)) => (false, Reason::Incompatible),
            Some((Relation::Compatible, entry)) => self.gate(entry, Reason::Compatible),
            Some((Relation::WeakCompatible, entry)) => {
                if self.policy.allow_weak_compatible {
                    self.gate(entry, Reason::WeakCompatible)
                } else {
                    (false, Reason::WeakNotAllowed)
                }
            }
        };
        TermDecision {
            license: id,
            accepted,
            reason,
        }
    }

    fn gate(&self, entry: &MatrixEntry, ok: Reason) -> (bool, Reason) {
        if self.policy.require_fsf_free && !entry.fsf_free {
            (false, Reason::NotFsfFree)
        } else if self.policy.require_osi_approved && !entry.osi_approved {
            (false, Reason::NotOsiApproved)
        } else {
            (true, ok)
        }
    }
}

/// One-shot form of [`Evaluator::evaluate`].
pub fn evaluate(
    corpus: &Corpus,
    main_license: &str,
    license: &str,
    policy: Policy,
) -> Result<Decision, CompatibilityError> {
    Ok(Evaluator::new(corpus, main_license, policy)?.evaluate(license))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;

    fn row(matrix: &str) -> Corpus {
        let store = MemoryAssets::new().with("compatibility/main.toml", matrix);
        Corpus::load(&store).unwrap()
    }

    const MIT_ROW: &str = r#"
license = "MIT"

[[compatible]]
id = "BSD-3-Clause"
fsf-free = true
osi-approved = true

[[compatible]]
id = "CC0-1.0"
fsf-free = true
osi-approved = false

[[compatible]]
id = "Custom-Permissive"
fsf-free = false
osi-approved = true

[[weak-compatible]]
id = "MPL-2.0"
fsf-free = true
osi-approved = true
"#;

    const APACHE_ROW: &str = r#"
license = "Apache-2.0"
incompatible = ["LGPL-2.0"]

[[compatible]]
id = "Apache-2.0"
fsf-free = true
osi-approved = true

[[compatible]]
id = "MIT"
fsf-free = true
osi-approved = true

[[compatible]]
id = "BSD-2-Clause"
fsf-free = true
osi-approved = true
"#;

    fn weak(allow: bool) -> Policy {
        Policy {
            allow_weak_compatible: allow,
            ..Policy::default()
        }
    }

    #[test]
    fn test_compatible_accepts_regardless_of_weak_flag() {
        let corpus = row(MIT_ROW);
        for allow in [false, true] {
            let d = evaluate(&corpus, "MIT", "BSD-3-Clause", weak(allow)).unwrap();
            assert!(d.accepted);
            assert_eq!(d.reason, Reason::Compatible);
        }
    }

    #[test]
    fn test_weak_compatible_needs_opt_in() {
        let corpus = row(MIT_ROW);
        let d = evaluate(&corpus, "MIT", "MPL-2.0", weak(false)).unwrap();
        assert!(!d.accepted);
        assert_eq!(d.reason, Reason::WeakNotAllowed);

        let d = evaluate(&corpus, "MIT", "MPL-2.0", weak(true)).unwrap();
        assert!(d.accepted);
        assert_eq!(d.reason, Reason::WeakCompatible);
    }

    #[test]
    fn test_or_expression_accepts() {
        let corpus = row(APACHE_ROW);
        let d = evaluate(&corpus, "Apache-2.0", "Apache-2.0 OR MIT", Policy::default()).unwrap();
        assert!(d.accepted);
        assert_eq!(d.terms.len(), 2);
    }

    #[test]
    fn test_and_expression_rejects_on_one_failure() {
        let corpus = row(APACHE_ROW);
        let d = evaluate(
            &corpus,
            "Apache-2.0",
            "LGPL-2.1-only AND MIT AND BSD-2-Clause",
            Policy::default(),
        )
        .unwrap();
        assert!(!d.accepted);
        assert_eq!(d.reason, Reason::NotListed);
        assert_eq!(d.terms[0].license, "LGPL-2.1-only");
        assert!(d.terms[1].accepted && d.terms[2].accepted);
    }

    #[test]
    fn test_incompatible_rejects() {
        let corpus = row(APACHE_ROW);
        let d = evaluate(&corpus, "apache-2.0", "LGPL-2.0", weak(true)).unwrap();
        assert!(!d.accepted);
        assert_eq!(d.reason, Reason::Incompatible);
    }

    #[test]
    fn test_fsf_gate() {
        let corpus = row(MIT_ROW);
        let strict = Policy {
            require_fsf_free: true,
            ..Policy::default()
        };
        let d = evaluate(&corpus, "MIT", "Custom-Permissive", strict).unwrap();
        assert!(!d.accepted);
        assert_eq!(d.reason, Reason::NotFsfFree);

        let d = evaluate(&corpus, "MIT", "Custom-Permissive", Policy::default()).unwrap();
        assert!(d.accepted);
    }

    #[test]
    fn test_osi_gate_applies_to_weak_too() {
        let corpus = row(MIT_ROW);
        let strict = Policy {
            require_osi_approved: true,
            ..Policy::default()
        };
        let d = evaluate(&corpus, "MIT", "CC0-1.0", strict).unwrap();
        assert_eq!(d.reason, Reason::NotOsiApproved);

        let mut no_fsf = MIT_ROW.replace(
            "id = \"MPL-2.0\"\nfsf-free = true",
            "id = \"MPL-2.0\"\nfsf-free = false",
        );
        no_fsf.push('\n');
        let corpus = row(&no_fsf);
        let policy = Policy {
            require_fsf_free: true,
            allow_weak_compatible: true,
            ..Policy::default()
        };
        let d = evaluate(&corpus, "MIT", "MPL-2.0", policy).unwrap();
        assert_eq!(d.reason, Reason::NotFsfFree);
    }

    #[test]
    fn test_unlisted_rejects_under_any_policy() {
        let corpus = row(MIT_ROW);
        for policy in [
            Policy::default(),
            weak(true),
            Policy {
                require_fsf_free: true,
                require_osi_approved: true,
                allow_weak_compatible: true,
            },
        ] {
            let d = evaluate(&corpus, "MIT", "Totally-Unknown-1.0", policy).unwrap();
            assert!(!d.accepted);
            assert_eq!(d.reason, Reason::NotListed);
        }
    }

    #[test]
    fn test_missing_main_license_is_fatal() {
        let corpus = row(MIT_ROW);
        let err = evaluate(&corpus, "GPL-3.0-only", "MIT", Policy::default()).unwrap_err();
        assert_eq!(err, CompatibilityError::NoCompatibilityEntry("GPL-3.0-only".into()));
    }

    #[test]
    fn test_ambiguous_and_empty_reject() {
        let corpus = row(APACHE_ROW);
        let d = evaluate(&corpus, "Apache-2.0", "MIT OR Apache-2.0 AND BSD-2-Clause", weak(true)).unwrap();
        assert!(!d.accepted);
        assert_eq!(d.reason, Reason::Ambiguous);

        let d = evaluate(&corpus, "Apache-2.0", "  ", weak(true)).unwrap();
        assert_eq!(d.reason, Reason::Unidentified);
    }

    #[test]
    fn test_alias_and_exception() {
        let corpus = row(APACHE_ROW);
        let d = evaluate(&corpus, "Apache-2.0", "MIT License", Policy::default()).unwrap();
        assert!(d.accepted);
        let d = evaluate(&corpus, "Apache-2.0", "MIT WITH Some-exception", Policy::default()).unwrap();
        assert!(d.accepted);
    }

    #[test]
    fn test_overlapping_sets_rejected_at_load() {
        let store = MemoryAssets::new().with(
            "compatibility/MIT.toml",
            "compatible = [\"GPL-3.0\"]\nincompatible = [\"gpl-3.0\"]\n",
        );
        let err = Corpus::load(&store).unwrap_err();
        assert!(matches!(err, CorpusError::OverlappingSets { .. }));
    }

    #[test]
    fn test_main_license_defaults_to_file_stem() {
        let matrix = CompatibilityMatrix::from_toml("compatibility/ISC.toml", b"compatible = [\"MIT\"]").unwrap();
        assert_eq!(matrix.license, "ISC");
        assert_eq!(matrix.ids(Relation::Compatible), vec!["MIT"]);
    }
}
