//! `license-lint` — check license headers and dependency license compatibility.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and set up logging from `-v`.
//! 2. Load config ([`license_lint::config::load_config`]).
//! 3. Run the subcommand against the embedded reference corpus.
//! 4. Render the requested report.
//! 5. Exit `0` (clean), `1` (check failures) or `2` (the run could not complete).

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, DepsAction, HeaderAction, ReportFormat};
use license_lint::config::{load_config, Config};
use license_lint::license::identifier::identify;
use license_lint::report::terminal;
use license_lint::{deps, headers, input, Corpus, EmbeddedAssets, HeaderChecker};

const EXIT_FAILURES: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    match &cli.command {
        Command::Header {
            action: HeaderAction::Check { path },
        } => {
            let root = path.canonicalize().unwrap_or_else(|_| path.clone());
            let config = load_config(&root, cli.config.as_deref())?;
            header_check(cli, &root, &config)
        }
        Command::Deps {
            action: DepsAction::Resolve { input },
        } => deps_resolve(cli, input),
        Command::Deps {
            action: DepsAction::Check { input, main_license },
        } => {
            let config = load_config(Path::new("."), cli.config.as_deref())?;
            deps_check(cli, input, main_license.as_deref(), &config)
        }
        Command::Identify { file } => identify_file(cli, file),
    }
}

fn load_corpus() -> Result<Corpus> {
    Corpus::load(&EmbeddedAssets).context("loading the reference corpus")
}

fn header_check(cli: &Cli, root: &Path, config: &Config) -> Result<u8> {
    let header = &config.header;
    let checker = HeaderChecker::new(&header.content, header.pattern.as_deref(), header.threshold)?;
    let files = headers::collect_files(root, &header.paths, &header.paths_ignore)?;
    tracing::info!(files = files.len(), root = %root.display(), "checking license headers");

    let pb = progress_bar(cli, files.len() as u64)?;
    let report = headers::check_files(&checker, &files, pb.as_ref());
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match cli.format {
        ReportFormat::Terminal => terminal::render_headers(&report, root, cli.verbose > 0, cli.quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(if report.has_failures() { EXIT_FAILURES } else { 0 })
}

fn deps_resolve(cli: &Cli, list: &Path) -> Result<u8> {
    let records = input::load_dependencies(list)?;
    let corpus = load_corpus()?;
    let resolutions = deps::resolve_all(&corpus, &records);

    match cli.format {
        ReportFormat::Terminal => terminal::render_resolutions(&resolutions, cli.quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&resolutions)?),
    }
    Ok(0)
}

fn deps_check(cli: &Cli, list: &Path, main_license: Option<&str>, config: &Config) -> Result<u8> {
    let Some(main_license) = main_license.or(config.dependency.main_license.as_deref()) else {
        bail!("no main license: pass --main-license or set dependency.main-license in the config");
    };

    let records = input::load_dependencies(list)?;
    let corpus = load_corpus()?;
    let report = deps::evaluate_dependencies(&corpus, main_license, config.dependency.policy, &records)?;

    match cli.format {
        ReportFormat::Terminal => terminal::render_dependencies(&report, cli.verbose > 0, cli.quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    match report.check(config.dependency.fail_on_unknown) {
        Ok(()) => Ok(0),
        Err(e) => {
            tracing::error!("{e}");
            Ok(EXIT_FAILURES)
        }
    }
}

fn identify_file(cli: &Cli, file: &Path) -> Result<u8> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let corpus = load_corpus()?;
    let found = identify(&corpus, &text);

    match cli.format {
        ReportFormat::Terminal => terminal::render_identification(file, found.as_ref()),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
    }
    Ok(if found.is_some() { 0 } else { EXIT_FAILURES })
}

fn progress_bar(cli: &Cli, len: u64) -> Result<Option<ProgressBar>> {
    if cli.quiet || cli.format == ReportFormat::Json {
        return Ok(None);
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(Some(pb))
}
