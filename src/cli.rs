use anyhow::{Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::commands::CommandReport;
use crate::commands::build::BuildOptions;
use crate::commands::inspect::InspectOptions;
use crate::commands::merge::MergeOptions;
use crate::commands::mirror::MirrorOptions;
use crate::commands::status::StatusOptions;
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    name = "scriptorium-index",
    version,
    about = "Build and publish the search index for a digitized manuscript catalogue"
)]
struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log warnings and errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan the catalogue and publish a fresh search index
    Build(BuildArgs),
    /// Update the published index from what changed in the catalogue
    Merge(MergeArgs),
    /// Copy every manuscript's metadata into a local tree
    Mirror(MirrorArgs),
    /// Summarize a published or local index
    Inspect(InspectArgs),
    /// Show resolved configuration and environment
    Status(StatusArgs),
}

#[derive(Debug, Parser)]
struct BuildArgs {
    /// Read the catalogue from a local directory instead of the bucket
    #[arg(long, value_name = "DIR")]
    from_dir: Option<PathBuf>,

    /// Also write the index to this path
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the configured local copy
    #[arg(long)]
    save_local: bool,

    /// Skip the store upload
    #[arg(long)]
    no_upload: bool,

    /// Report what would happen; download and publish nothing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct MergeArgs {
    /// Read the catalogue from a local directory instead of the bucket
    #[arg(long, value_name = "DIR")]
    from_dir: Option<PathBuf>,

    /// Merge against this index file instead of the published one
    #[arg(long, value_name = "FILE")]
    prior: Option<PathBuf>,

    /// Also write the index to this path
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the configured local copy
    #[arg(long)]
    save_local: bool,

    /// Skip the store upload
    #[arg(long)]
    no_upload: bool,

    /// Report the merge plan; download and publish nothing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct MirrorArgs {
    /// Destination directory for the mirrored metadata
    #[arg(value_name = "DIR")]
    to: PathBuf,

    /// Read the catalogue from a local directory instead of the bucket
    #[arg(long, value_name = "DIR")]
    from_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct InspectArgs {
    /// Read the index from this file instead of the store
    #[arg(long, value_name = "FILE")]
    path: Option<PathBuf>,

    /// Read the published index from a local directory tree
    #[arg(long, value_name = "DIR")]
    from_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct StatusArgs {
    /// Probe this local directory instead of the bucket
    #[arg(long, value_name = "DIR")]
    from_dir: Option<PathBuf>,

    /// Check that the configured store answers
    #[arg(long)]
    probe: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let report = dispatch(cli.command)?;
    render_report(&report, cli.json)?;
    if !report.ok {
        bail!(
            "{} finished with {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}

fn dispatch(command: Command) -> Result<CommandReport> {
    match command {
        Command::Build(args) => commands::build::run(&BuildOptions {
            from_dir: args.from_dir,
            output: args.output,
            save_local: args.save_local,
            no_upload: args.no_upload,
            dry_run: args.dry_run,
        }),
        Command::Merge(args) => commands::merge::run(&MergeOptions {
            from_dir: args.from_dir,
            prior: args.prior,
            output: args.output,
            save_local: args.save_local,
            no_upload: args.no_upload,
            dry_run: args.dry_run,
        }),
        Command::Mirror(args) => commands::mirror::run(&MirrorOptions {
            from_dir: args.from_dir,
            to: args.to,
        }),
        Command::Inspect(args) => commands::inspect::run(&InspectOptions {
            path: args.path,
            from_dir: args.from_dir,
        }),
        Command::Status(args) => commands::status::run(&StatusOptions {
            from_dir: args.from_dir,
            probe: args.probe,
        }),
    }
}

fn render_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!(
        "[{}] {}",
        report.command,
        if report.ok { "ok" } else { "failed" }
    );
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        eprintln!("  issue: {issue}");
    }
    Ok(())
}
