use std::collections::HashMap;
use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::license::header::HeaderOutcome;
use crate::license::identifier::{Identification, MatchedBy};
use crate::models::{FileResult, HeaderReport, Report, Resolution, Verdict};

fn banner(subject: &str) {
    println!("\n {} v{}", "license-lint".bold(), env!("CARGO_PKG_VERSION"));
    println!(" {}\n", subject);
}

fn bold(title: &str) -> Cell {
    Cell::new(title).add_attribute(Attribute::Bold)
}

fn verdict_cell(verdict: Verdict) -> Cell {
    let (text, color) = match verdict {
        Verdict::Pass => ("✓ pass", Color::Green),
        Verdict::Warn => ("⚠ warn", Color::Yellow),
        Verdict::Error => ("✗ error", Color::Red),
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Center)
}

fn new_table(header: Vec<Cell>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn summary_box(title: &str, total_label: &str, total: usize, rows: [(usize, String); 3]) {
    let [(pass, pass_extra), (warn, warn_extra), (error, error_extra)] = rows;
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", title.bold());
    println!(" │  {:<48} │", format!("{total_label:<19}: {total}"));
    println!(
        " │  {:<48} │",
        format!("{}  Pass            : {:>4}  {}", "✓".green(), pass, pass_extra)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Warn            : {:>4}  {}", "⚠".yellow(), warn, warn_extra)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Error           : {:>4}  {}", "✗".red(), error, error_extra)
    );
    println!(" └────────────────────────────────────────────────────┘\n");
}

fn quiet_line(total: usize, pass: usize, warn: usize, error: usize) {
    println!(
        "Total: {}  Pass: {}  Warn: {}  Error: {}",
        total,
        pass.to_string().green(),
        warn.to_string().yellow(),
        error.to_string().red(),
    );
}

/// Render a `deps check` report. Rejected dependencies count as errors and
/// unknown ones as warnings.
pub fn render_dependencies(report: &Report, verbose: bool, quiet: bool) {
    let pass_count = report.resolved.iter().filter(|r| r.decision.accepted).count();
    let error_count = report.resolved.len() - pass_count;
    let warn_count = report.skipped.len();
    let total = report.resolved.len() + report.skipped.len();

    if quiet {
        quiet_line(total, pass_count, warn_count, error_count);
        return;
    }

    banner(&format!("Main license: {}", report.main_license));
    summary_box(
        "SUMMARY",
        "Total dependencies",
        total,
        [
            (pass_count, summarize_licenses(report, true)),
            (warn_count, String::new()),
            (error_count, summarize_licenses(report, false)),
        ],
    );

    if error_count > 0 {
        println!(" {} Incompatible dependencies:\n", "[ERROR]".red().bold());
        dependency_table(report, false);
        println!();
    }

    if warn_count > 0 {
        println!(" {} Dependencies with unknown license:\n", "[WARN]".yellow().bold());
        let mut table = new_table(vec![bold("Name"), bold("Version"), bold("Reason"), bold("Verdict")]);
        for skipped in &report.skipped {
            table.add_row(vec![
                Cell::new(&skipped.name),
                Cell::new(&skipped.version),
                Cell::new(&skipped.reason).fg(Color::DarkGrey),
                verdict_cell(Verdict::Warn),
            ]);
        }
        println!("{}", table);
        println!();
    }

    if verbose && pass_count > 0 {
        println!(" {} All compatible dependencies:\n", "[PASS]".green().bold());
        dependency_table(report, true);
        println!();
    }
}

fn dependency_table(report: &Report, accepted: bool) {
    let mut table = new_table(vec![
        bold("Name"),
        bold("Version"),
        bold("License"),
        bold("Source"),
        bold("Reason"),
        bold("Verdict"),
    ]);

    for dep in report.resolved.iter().filter(|r| r.decision.accepted == accepted) {
        let reason = if dep.decision.terms.is_empty() {
            dep.decision.reason.to_string()
        } else {
            dep.decision
                .terms
                .iter()
                .map(|t| format!("{}: {}", t.license, t.reason))
                .collect::<Vec<_>>()
                .join("\n")
        };
        table.add_row(vec![
            Cell::new(&dep.name),
            Cell::new(&dep.version),
            Cell::new(&dep.license),
            Cell::new(dep.source.to_string()),
            Cell::new(reason),
            verdict_cell(dep.verdict()),
        ]);
    }

    println!("{}", table);
}

fn summarize_licenses(report: &Report, accepted: bool) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for dep in report.resolved.iter().filter(|r| r.decision.accepted == accepted) {
        *counts.entry(dep.license.as_str()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{} ({})", lic, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

/// Render `deps resolve` output.
pub fn render_resolutions(resolutions: &[Resolution], quiet: bool) {
    let resolved = resolutions.iter().filter(|r| r.license.is_some()).count();
    if quiet {
        println!("Total: {}  Resolved: {}  Unknown: {}", resolutions.len(), resolved, resolutions.len() - resolved);
        return;
    }

    let mut table = new_table(vec![bold("Name"), bold("Version"), bold("License"), bold("Source")]);
    for r in resolutions {
        let license = match &r.license {
            Some(license) => Cell::new(license),
            None => Cell::new("unknown").fg(Color::DarkGrey),
        };
        let source = r.source.map(|s| s.to_string()).unwrap_or_default();
        table.add_row(vec![Cell::new(&r.name), Cell::new(&r.version), license, Cell::new(source)]);
    }
    println!("{}", table);
}

/// Render a `header check` report. Paths are shown relative to `root`.
pub fn render_headers(report: &HeaderReport, root: &Path, verbose: bool, quiet: bool) {
    let pass_count = report.count(Verdict::Pass);
    let warn_count = report.count(Verdict::Warn);
    let error_count = report.count(Verdict::Error);

    if quiet {
        quiet_line(report.files.len(), pass_count, warn_count, error_count);
        return;
    }

    banner(&format!("Checking: {}", root.display()));
    summary_box(
        "HEADERS",
        "Files checked",
        report.files.len(),
        [
            (pass_count, String::new()),
            (warn_count, String::new()),
            (error_count, String::new()),
        ],
    );

    if error_count > 0 {
        println!(" {} Files missing the license header:\n", "[ERROR]".red().bold());
        file_table(report, root, Verdict::Error);
        println!();
    }

    if warn_count > 0 {
        println!(" {} Files not checked:\n", "[WARN]".yellow().bold());
        file_table(report, root, Verdict::Warn);
        println!();
    }

    if verbose && pass_count > 0 {
        println!(" {} Files with a license header:\n", "[PASS]".green().bold());
        file_table(report, root, Verdict::Pass);
        println!();
    }
}

fn file_table(report: &HeaderReport, root: &Path, verdict: Verdict) {
    let mut table = new_table(vec![bold("File"), bold("Detail"), bold("Verdict")]);
    for file in report.files.iter().filter(|f| f.verdict() == verdict) {
        table.add_row(vec![
            Cell::new(relative(file, root)),
            Cell::new(detail(&file.outcome)),
            verdict_cell(verdict),
        ]);
    }
    println!("{}", table);
}

fn relative(file: &FileResult, root: &Path) -> String {
    file.path.strip_prefix(root).unwrap_or(&file.path).display().to_string()
}

fn detail(outcome: &HeaderOutcome) -> String {
    match outcome {
        HeaderOutcome::Present { start, .. } => format!("found at offset {start}"),
        HeaderOutcome::Missing => "no header near the top of the file".to_string(),
        HeaderOutcome::Ignored { reason } => reason.clone(),
    }
}

/// Render `identify` output.
pub fn render_identification(path: &Path, found: Option<&Identification>) {
    match found {
        Some(id) => {
            let how = match id.matched_by {
                MatchedBy::Statement => "multi-license statement".to_string(),
                MatchedBy::Template(kind) => format!("{kind:?} template").to_lowercase(),
            };
            println!("{}: {} ({})", path.display(), id.spdx_id.green().bold(), how);
        }
        None => println!("{}: {}", path.display(), "unidentified".yellow()),
    }
}
