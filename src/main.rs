use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use dbcontext_splitter::cli::Cli;
use dbcontext_splitter::error::SplitError;
use dbcontext_splitter::splitter::{self, RunReport};
use dbcontext_splitter::unit::Destination;
use dbcontext_splitter::{config, diff};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", style("error:").red().bold());
            let code = e.downcast_ref::<SplitError>().map_or(1, SplitError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    let source = cli.dbcontext.clone();
    let options = cli.into_options(config);

    let report = splitter::split(&source, &options)
        .with_context(|| format!("Failed to split '{}'", source.display()))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("{}", style("Create configuration files:").bold());

    if report.block_count() == 0 {
        println!("    No entity definitions found.");
        return;
    }

    for write in &report.writes {
        match write.destination {
            Destination::Standalone => println!("    {}", write.path.display()),
            Destination::Embedded => {
                println!("    {} {}", write.path.display(), style("(appended)").dim())
            }
        }
    }

    for warning in &report.warnings {
        println!("{} {warning}", style("warning:").yellow().bold());
    }

    if report.dry_run {
        println!();
        println!("{}", style("Dry run, nothing was written. DbContext changes:").bold());
        if let Some(rewritten) = &report.rewritten {
            println!("{}", diff::generate_custom_diff(&report.original, rewritten));
        }
        return;
    }

    if let Some((document_backup, unit_backups)) = report.backups.split_first() {
        println!("{}", style("Backup DbContext file:").bold());
        println!("    Original file path: {}", report.document_path.display());
        println!("    Backup file path: {}", document_backup.display());
        for backup in unit_backups {
            println!("    Backup file path: {}", backup.display());
        }
    }
}
