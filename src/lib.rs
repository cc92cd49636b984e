//! uniquify - content-based image deduplication
//!
//! Walks a directory tree, fingerprints every image by content, groups
//! identical files, writes a report of the groups and optionally copies one
//! file per group (plus every non-image file) into a mirrored output tree.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod placement;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::cli::Cli;
use crate::config::{RunConfig, Settings};
use crate::duplicates::{DuplicateFinder, FinderError, ScanOutcome, ScanSummary};
use crate::error::ExitCode;
use crate::output::{render_summary, to_rows, ReportKind, ReportWriter, RunArtifacts};
use crate::placement::{prepare_output, PlacementPlan};
use crate::progress::Progress;
use crate::scanner::ScanError;

/// Entry point shared by the binary and integration tests.
///
/// # Errors
///
/// Returns an error for fatal failures: bad configuration, unreadable input
/// root, unusable output directory, destination collisions, report write
/// failures and interruption.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);

    let settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = RunConfig::from_cli(&cli, settings);
    run(&config)
}

/// Run the full pipeline for an already resolved configuration.
///
/// # Errors
///
/// See [`run_app`].
pub fn run(config: &RunConfig) -> Result<ExitCode> {
    if !config.color {
        yansi::disable();
    }
    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    validate_input(config)?;
    if config.place {
        if let Some(output) = &config.output_path {
            prepare_output(output, &config.input_path, config.clean_output)?;
        }
    }
    if config.include_report || config.include_duplicate_report {
        fs::create_dir_all(&config.report_dir).with_context(|| {
            format!("Cannot create report directory {}", config.report_dir.display())
        })?;
    }

    let progress = Arc::new(Progress::new(!config.show_progress));
    let finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);
    let (outcome, summary) = DuplicateFinder::new(finder_config).find(&config.input_path)?;

    // Passthrough files are placed even when there is nothing to deduplicate.
    let plan = match (config.place, &config.output_path) {
        (true, Some(output)) => Some((
            PlacementPlan::from_outcome(&outcome, &config.placement)?,
            output,
        )),
        _ => None,
    };

    let mut artifacts = RunArtifacts::default();
    if outcome.is_empty() {
        log::warn!(
            "No candidate files under {}, no report written",
            config.input_path.display()
        );
    } else {
        write_reports(config, &outcome, &mut artifacts)?;
    }

    if handler.is_shutdown_requested() {
        return Err(FinderError::Interrupted.into());
    }

    if let Some((plan, output)) = plan {
        log::info!("Placing {} files into {}", plan.len(), output.display());
        artifacts.placement = Some(plan.execute(output));
    }

    if !config.quiet {
        print!("{}", render_summary(&summary, &artifacts));
    }

    Ok(exit_code(&summary, &artifacts))
}

fn validate_input(config: &RunConfig) -> Result<()> {
    let input = &config.input_path;
    let metadata = fs::metadata(input).map_err(|e| ScanError::from_io(input, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(input.clone()).into());
    }
    Ok(())
}

fn write_reports(
    config: &RunConfig,
    outcome: &ScanOutcome,
    artifacts: &mut RunArtifacts,
) -> Result<()> {
    let timestamp = Utc::now();

    if config.include_report {
        let rows = to_rows(outcome.grouped.entries())?;
        let path = ReportWriter::new(&rows, config.report_format).write_file(
            &config.report_dir,
            ReportKind::Full,
            timestamp,
        )?;
        artifacts.reports.push(path);
    }

    if config.include_duplicate_report {
        let rows = to_rows(outcome.grouped.duplicates())?;
        let path = ReportWriter::new(&rows, config.report_format).write_file(
            &config.report_dir,
            ReportKind::Duplicates,
            timestamp,
        )?;
        artifacts.reports.push(path);
    }

    Ok(())
}

/// Per-file failures win over the duplicate count.
fn exit_code(summary: &ScanSummary, artifacts: &RunArtifacts) -> ExitCode {
    let copy_failures = artifacts
        .placement
        .as_ref()
        .is_some_and(|p| !p.failures.is_empty());

    if summary.has_errors() || copy_failures {
        ExitCode::PartialSuccess
    } else if summary.duplicates_found == 0 {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}
