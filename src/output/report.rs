//! Report rendering.
//!
//! # CSV
//!
//! Columns `Filename`, `Path`, `Link`. A blank row is written before every
//! row that opens a new group, except the very first row, so groups read as
//! blocks when the file is opened in a spreadsheet.
//!
//! # JSON
//!
//! An object with a generation timestamp and an array of groups, each group
//! an array of rows.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rows::{split_groups, ReportRow};
use crate::scanner::path_utils::file_url;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error during writing.
    #[error("I/O error writing {path}: {source}")]
    Io {
        /// Report file being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Report file format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated values (spreadsheet friendly)
    #[default]
    Csv,
    /// JSON document
    Json,
}

impl ReportFormat {
    /// File extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which report is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Every fingerprinted candidate
    Full,
    /// Only members of groups with two or more files
    Duplicates,
}

impl ReportKind {
    fn file_stem(self) -> &'static str {
        match self {
            Self::Full => "uqreport",
            Self::Duplicates => "uqreport_duplicates",
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    filename: &'a str,
    path: &'a str,
    link: String,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    group_count: usize,
    row_count: usize,
    groups: Vec<Vec<JsonRow<'a>>>,
}

/// Renders report rows in a chosen format.
pub struct ReportWriter<'a> {
    rows: &'a [ReportRow],
    format: ReportFormat,
}

impl<'a> ReportWriter<'a> {
    /// Create a new report writer.
    #[must_use]
    pub fn new(rows: &'a [ReportRow], format: ReportFormat) -> Self {
        Self { rows, format }
    }

    /// Write the report to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if writing or serialization fails.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        match self.format {
            ReportFormat::Csv => self.write_csv(writer),
            ReportFormat::Json => self.write_json(writer),
        }
    }

    fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["Filename", "Path", "Link"])?;

        for (idx, row) in self.rows.iter().enumerate() {
            if row.new_group_boundary && idx > 0 {
                csv_writer.write_record(["", "", ""])?;
            }
            csv_writer.write_record([
                row.filename.as_str(),
                row.directory.as_str(),
                file_url(&row.absolute_path).as_str(),
            ])?;
        }

        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    fn write_json<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let groups: Vec<Vec<JsonRow<'_>>> = split_groups(self.rows)
            .into_iter()
            .map(|g| {
                g.iter()
                    .map(|row| JsonRow {
                        filename: &row.filename,
                        path: &row.directory,
                        link: file_url(&row.absolute_path),
                    })
                    .collect()
            })
            .collect();

        let report = JsonReport {
            generated_at: Utc::now().to_rfc3339(),
            group_count: groups.len(),
            row_count: self.rows.len(),
            groups,
        };
        serde_json::to_writer_pretty(writer, &report)?;
        Ok(())
    }

    /// Render the report as a string.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if serialization fails.
    pub fn to_string(&self) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }

    /// Write the report into `dir` with a timestamped name and return its path.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` if the file cannot be created.
    pub fn write_file(
        &self,
        dir: &Path,
        kind: ReportKind,
        timestamp: DateTime<Utc>,
    ) -> Result<PathBuf, ReportError> {
        let path = report_path(dir, kind, self.format, timestamp);
        let file = File::create(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("Wrote report {}", path.display());
        Ok(path)
    }
}

/// `<dir>/<stem>_<unix millis>.<ext>`
#[must_use]
pub fn report_path(
    dir: &Path,
    kind: ReportKind,
    format: ReportFormat,
    timestamp: DateTime<Utc>,
) -> PathBuf {
    dir.join(format!(
        "{}_{}.{}",
        kind.file_stem(),
        timestamp.timestamp_millis(),
        format.extension()
    ))
}
