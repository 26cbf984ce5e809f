use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Offender};
use crate::license::compatibility::Decision;
use crate::license::header::HeaderOutcome;

/// A dependency as handed over by an ecosystem resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencyRecord {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Machine-readable license field (SPDX id or expression).
    #[serde(default)]
    pub license: Option<String>,
    /// Raw LICENSE text, used when there is no license field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_text: Option<String>,
    /// LICENSE file to read into `license_text`, relative to the input file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<PathBuf>,
}

/// Where a resolved license came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseSource {
    /// The record's license field.
    Field,
    /// Identified from LICENSE text against the reference corpus.
    Text,
}

impl std::fmt::Display for LicenseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseSource::Field => write!(f, "field"),
            LicenseSource::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Error,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Warn => write!(f, "warn"),
            Verdict::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyResult {
    pub name: String,
    pub version: String,
    pub license: String,
    pub source: LicenseSource,
    pub decision: Decision,
}

impl DependencyResult {
    pub fn verdict(&self) -> Verdict {
        if self.decision.accepted {
            Verdict::Pass
        } else {
            Verdict::Error
        }
    }
}

/// Output of `deps resolve`: the license a record resolves to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub name: String,
    pub version: String,
    pub license: Option<String>,
    pub source: Option<LicenseSource>,
}

/// A dependency whose license could not be determined.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDependency {
    pub name: String,
    pub version: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub main_license: String,
    pub resolved: Vec<DependencyResult>,
    pub skipped: Vec<SkippedDependency>,
}

impl Report {
    pub fn rejected(&self) -> impl Iterator<Item = &DependencyResult> {
        self.resolved.iter().filter(|r| !r.decision.accepted)
    }

    /// Fail with every incompatible dependency, plus every unknown one when
    /// `fail_on_unknown` is set.
    pub fn check(&self, fail_on_unknown: bool) -> Result<(), CheckError> {
        let mut offenders: Vec<Offender> = self
            .rejected()
            .map(|r| Offender {
                name: r.name.clone(),
                version: r.version.clone(),
                license: r.license.clone(),
            })
            .collect();
        if fail_on_unknown {
            offenders.extend(self.skipped.iter().map(|s| Offender {
                name: s.name.clone(),
                version: s.version.clone(),
                license: "unknown".to_string(),
            }));
        }
        if offenders.is_empty() {
            Ok(())
        } else {
            Err(CheckError::Incompatible(offenders))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: HeaderOutcome,
}

impl FileResult {
    pub fn verdict(&self) -> Verdict {
        match self.outcome {
            HeaderOutcome::Present { .. } => Verdict::Pass,
            HeaderOutcome::Ignored { .. } => Verdict::Warn,
            HeaderOutcome::Missing => Verdict::Error,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HeaderReport {
    pub files: Vec<FileResult>,
}

impl HeaderReport {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.files.iter().filter(|f| f.verdict() == verdict).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(Verdict::Error) > 0
    }
}
