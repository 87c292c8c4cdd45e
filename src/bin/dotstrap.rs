// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotstrap::{
    path::{default_defaults_file, default_source_dir, home_dir},
    Defaults, ErrorPolicy, InquirePrompter, Materializer, Outcome, OverwritePolicy, SourceEntry,
    SourceTree,
};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const BANNER: &str = "======================================================";

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "dotstrap [options] [<dotstrap-command>]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(flatten)]
    pub layout: LayoutOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Some(Command::Install(opts)) => run_install(self.layout, opts),
            Some(Command::List) => run_list(self.layout),
            Some(Command::Status) => run_status(self.layout),
            None => run_install(self.layout, InstallOptions::default()),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Materialize dotfiles into home directory (default).
    #[command(override_usage = "dotstrap install [options]")]
    Install(InstallOptions),

    /// List dotfiles and where they would land.
    #[command(override_usage = "dotstrap list [options]")]
    List,

    /// Show whether each target is missing, identical, or differs.
    #[command(override_usage = "dotstrap status [options]")]
    Status,
}

#[derive(Args, Clone, Debug)]
struct LayoutOptions {
    /// Source tree of dotfiles [default: ./dotfiles].
    #[arg(short, long, global = true, value_name = "path")]
    pub source: Option<PathBuf>,

    /// Home directory to materialize into [default: user's home].
    #[arg(long, global = true, value_name = "path")]
    pub home: Option<PathBuf>,

    /// Defaults document for templates [default: ./defaults.toml].
    #[arg(short, long, global = true, value_name = "path")]
    pub defaults: Option<PathBuf>,
}

impl LayoutOptions {
    fn source_tree(&self) -> Result<SourceTree> {
        let source = match &self.source {
            Some(source) => source.clone(),
            None => default_source_dir(std::env::current_dir()?),
        };

        Ok(SourceTree::open(source)?)
    }

    fn materializer(&self) -> Result<Materializer> {
        let home = match &self.home {
            Some(home) => home.clone(),
            None => home_dir()?,
        };
        let defaults = match &self.defaults {
            Some(defaults) => Defaults::load(defaults)?,
            None => Defaults::load(default_defaults_file(std::env::current_dir()?))?,
        };

        Ok(Materializer::new(home, defaults))
    }
}

#[derive(Parser, Clone, Debug, Default)]
#[command(author, about, long_about)]
struct InstallOptions {
    /// Overwrite conflicting targets without asking.
    #[arg(short, long)]
    pub always_overwrite: bool,

    /// Keep going after a failed entry, and report failures at the end.
    #[arg(short, long)]
    pub keep_going: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_install(layout: LayoutOptions, opts: InstallOptions) -> Result<()> {
    info!("{BANNER}");
    info!("Symlinking files");
    info!("{BANNER}");

    let entries = layout.source_tree()?.entries()?;
    info!("processing:");
    for entry in &entries {
        info!("\t{entry}");
    }

    let error_policy = if opts.keep_going {
        ErrorPolicy::CollectAndReport
    } else {
        ErrorPolicy::AbortOnFirstError
    };
    let policy = if opts.always_overwrite {
        OverwritePolicy::Always
    } else {
        OverwritePolicy::Unset
    };

    let report = layout
        .materializer()?
        .with_error_policy(error_policy)
        .run(&entries, policy, &mut InquirePrompter::new())?;

    let declined = report
        .records
        .iter()
        .filter(|record| matches!(record.outcome, Outcome::Declined))
        .count();
    if declined > 0 {
        warn!("kept {declined} existing file(s) in place");
    }

    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} of {} dotfile(s) failed", report.records.len());
    }

    info!("materialized {} dotfile(s)", report.records.len());
    Ok(())
}

fn run_list(layout: LayoutOptions) -> Result<()> {
    let entries = layout.source_tree()?.entries()?;
    let home = match layout.home {
        Some(home) => home,
        None => home_dir()?,
    };

    for entry in entries {
        println!("{}", describe(&entry, entry.target_path(&home).display()));
    }

    Ok(())
}

fn run_status(layout: LayoutOptions) -> Result<()> {
    let entries = layout.source_tree()?.entries()?;
    let states = layout.materializer()?.status(&entries)?;

    for (entry, (target, state)) in entries.iter().zip(states) {
        println!("{state:<9}  {}", describe(entry, target.display()));
    }

    Ok(())
}

fn describe(entry: &SourceEntry, target: impl std::fmt::Display) -> String {
    let kind = if entry.kind().is_template() {
        "render"
    } else {
        "link"
    };
    format!("{entry} => {target} ({kind})")
}
