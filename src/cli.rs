use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "license-lint",
    about = "Check license headers and dependency license compatibility",
    version
)]
pub struct Cli {
    /// Config file [default: ./.license-lint/config.toml, fallback ~/.config/license-lint/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT", global = true)]
    pub format: ReportFormat,

    /// More log output (-v info, -vv debug, -vvv trace); also lists passing entries
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print summary line
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// License headers in source files
    Header {
        #[command(subcommand)]
        action: HeaderAction,
    },
    /// Dependency license compatibility
    Deps {
        #[command(subcommand)]
        action: DepsAction,
    },
    /// Print the SPDX id a license text is recognised as
    Identify {
        /// LICENSE file to identify
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum HeaderAction {
    /// Check that configured files start with the configured header
    Check {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum DepsAction {
    /// Show the license each dependency resolves to
    Resolve {
        /// TOML file with a `[[dependency]]` list
        #[arg(long)]
        input: PathBuf,
    },
    /// Fail when a dependency license is incompatible with the main license
    Check {
        /// TOML file with a `[[dependency]]` list
        #[arg(long)]
        input: PathBuf,

        /// Main license; overrides `dependency.main-license` from the config
        #[arg(long, value_name = "SPDX")]
        main_license: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
