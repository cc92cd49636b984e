//! Report output for dedup results.
//!
//! - [`rows`]: derive display rows from the grouped sequence
//! - [`report`]: render rows as CSV or JSON files
//! - [`summary`]: the console summary printed after a run
//!
//! # Example
//!
//! ```no_run
//! use uniquify::duplicates::DuplicateFinder;
//! use uniquify::output::{to_rows, ReportFormat, ReportWriter};
//! use std::path::Path;
//!
//! let (outcome, _) = DuplicateFinder::with_defaults().find(Path::new(".")).unwrap();
//! let rows = to_rows(outcome.grouped.duplicates()).unwrap();
//! println!("{}", ReportWriter::new(&rows, ReportFormat::Csv).to_string().unwrap());
//! ```

pub mod report;
pub mod rows;
pub mod summary;

// Re-export main types
pub use report::{report_path, ReportError, ReportFormat, ReportKind, ReportWriter};
pub use rows::{split_groups, to_rows, ReportRow, RowError};
pub use summary::{render_summary, RunArtifacts};
