//! Console run summary.

use std::fmt::Write as _;
use std::path::PathBuf;

use yansi::Paint;

use crate::duplicates::ScanSummary;
use crate::placement::PlacementReport;

/// Files produced by a run, for the summary.
#[derive(Debug, Default)]
pub struct RunArtifacts {
    /// Report files written
    pub reports: Vec<PathBuf>,
    /// Placement result, when placement ran
    pub placement: Option<PlacementReport>,
}

/// Render the end-of-run summary shown on stdout.
#[must_use]
pub fn render_summary(summary: &ScanSummary, artifacts: &RunArtifacts) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Summary".bold());

    let line = |out: &mut String, label: &str, value: String| {
        let _ = writeln!(out, "  {:<22} {}", label.dim(), value);
    };

    line(&mut out, "Files found", summary.files_found.to_string());
    line(&mut out, "Candidates", summary.candidates_kept.to_string());
    line(&mut out, "Passthrough", summary.passthrough.to_string());
    line(&mut out, "Groups", summary.groups_found.to_string());
    line(
        &mut out,
        "Duplicate groups",
        summary.duplicate_groups.to_string(),
    );
    let duplicates = summary.duplicates_found.to_string();
    line(
        &mut out,
        "Duplicates",
        if summary.duplicates_found > 0 {
            duplicates.yellow().bold().to_string()
        } else {
            duplicates.green().to_string()
        },
    );
    line(&mut out, "Bytes hashed", summary.bytes_hashed_display());
    line(
        &mut out,
        "Duration",
        format!("{:.2}s", summary.scan_duration.as_secs_f64()),
    );

    let count = |n: usize| {
        if n > 0 {
            n.to_string().red().to_string()
        } else {
            n.to_string().dim().to_string()
        }
    };
    line(&mut out, "Walk errors", count(summary.walk_errors));
    line(&mut out, "Probe failures", count(summary.probe_failures));
    line(
        &mut out,
        "Fingerprint failures",
        count(summary.fingerprint_failures),
    );
    if summary.skipped_symlinks > 0 {
        line(
            &mut out,
            "Symlinks skipped",
            summary.skipped_symlinks.to_string().yellow().to_string(),
        );
    }
    for path in &summary.failure_samples {
        let _ = writeln!(out, "    {} {}", "!".red(), path.display());
    }

    if let Some(placement) = &artifacts.placement {
        line(&mut out, "Files placed", placement.copied.to_string());
        if !placement.failures.is_empty() {
            line(
                &mut out,
                "Copy failures",
                placement.failures.len().to_string().red().to_string(),
            );
            for failure in placement.failures.iter().take(5) {
                let _ = writeln!(
                    out,
                    "    {} {}: {}",
                    "!".red(),
                    failure.placement.source.display(),
                    failure.error
                );
            }
        }
    }

    for report in &artifacts.reports {
        line(&mut out, "Report", report.display().to_string().cyan().to_string());
    }

    out
}
