//! Batch evaluation of dependency licenses against a main license.

use rayon::prelude::*;

use crate::error::CompatibilityError;
use crate::license::compatibility::{Evaluator, Policy};
use crate::license::corpus::Corpus;
use crate::license::identifier::identify;
use crate::models::{DependencyRecord, DependencyResult, LicenseSource, Report, Resolution, SkippedDependency};

enum Outcome {
    Resolved(DependencyResult),
    Skipped(SkippedDependency),
}

/// Determine a record's license: the license field when it is non-blank,
/// else whatever its LICENSE text identifies as.
pub fn resolve_license(corpus: &Corpus, record: &DependencyRecord) -> Option<(String, LicenseSource)> {
    if let Some(field) = record.license.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        return Some((field.to_string(), LicenseSource::Field));
    }
    let text = record.license_text.as_deref()?;
    identify(corpus, text).map(|found| (found.spdx_id, LicenseSource::Text))
}

/// Resolve every record's license without judging it, in input order.
pub fn resolve_all(corpus: &Corpus, records: &[DependencyRecord]) -> Vec<Resolution> {
    records
        .par_iter()
        .map(|record| {
            let resolved = resolve_license(corpus, record);
            Resolution {
                name: record.name.clone(),
                version: record.version.clone(),
                license: resolved.as_ref().map(|(license, _)| license.clone()),
                source: resolved.map(|(_, source)| source),
            }
        })
        .collect()
}

/// Evaluate every record against `main_license`.
///
/// Records are independent and processed in parallel; the report keeps input
/// order. A missing matrix row for `main_license` fails the whole batch.
pub fn evaluate_dependencies(
    corpus: &Corpus,
    main_license: &str,
    policy: Policy,
    records: &[DependencyRecord],
) -> Result<Report, CompatibilityError> {
    let evaluator = Evaluator::new(corpus, main_license, policy)?;
    tracing::info!(
        main = %evaluator.main_license(),
        dependencies = records.len(),
        "evaluating dependency licenses"
    );

    let outcomes: Vec<Outcome> = records
        .par_iter()
        .map(|record| evaluate_one(corpus, &evaluator, record))
        .collect();

    let mut report = Report {
        main_license: evaluator.main_license().to_string(),
        ..Report::default()
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Resolved(result) => report.resolved.push(result),
            Outcome::Skipped(skipped) => report.skipped.push(skipped),
        }
    }
    Ok(report)
}

fn evaluate_one(corpus: &Corpus, evaluator: &Evaluator<'_>, record: &DependencyRecord) -> Outcome {
    let Some((license, source)) = resolve_license(corpus, record) else {
        let reason = if record.license_text.is_some() {
            "license text not recognised"
        } else {
            "no license field or license text"
        };
        tracing::warn!(dependency = %record.name, reason, "license unknown");
        return Outcome::Skipped(SkippedDependency {
            name: record.name.clone(),
            version: record.version.clone(),
            reason: reason.to_string(),
        });
    };

    let decision = evaluator.evaluate(&license);
    if !decision.accepted {
        tracing::debug!(dependency = %record.name, license = %license, reason = %decision.reason, "rejected");
    }
    Outcome::Resolved(DependencyResult {
        name: record.name.clone(),
        version: record.version.clone(),
        license,
        source,
        decision,
    })
}
