//! Report row derivation.
//!
//! Turns the tagged, sorted sequence into display rows: each path is
//! canonicalized and split into file name and directory, and the group-start
//! flag is carried over so a renderer knows where to put separator lines.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::TaggedEntry;

/// Errors that can occur while building report rows.
#[derive(Debug, Error)]
pub enum RowError {
    /// The file no longer resolves to a real path.
    #[error("Cannot resolve {path}: {source}")]
    Canonicalize {
        /// Path that failed to resolve
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One rendered line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// File name component
    pub filename: String,
    /// Directory containing the file (canonical)
    pub directory: String,
    /// Canonical absolute path
    pub absolute_path: PathBuf,
    /// True on the first row of each group
    pub new_group_boundary: bool,
}

/// Build report rows from tagged entries, preserving their order.
///
/// # Errors
///
/// Returns [`RowError::Canonicalize`] if any path no longer exists.
pub fn to_rows<'a, I>(entries: I) -> Result<Vec<ReportRow>, RowError>
where
    I: IntoIterator<Item = &'a TaggedEntry>,
{
    entries
        .into_iter()
        .map(|tagged| {
            let path = &tagged.entry.entry.path;
            let absolute = std::fs::canonicalize(path).map_err(|source| RowError::Canonicalize {
                path: path.clone(),
                source,
            })?;
            let filename = absolute
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let directory = absolute
                .parent()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(ReportRow {
                filename,
                directory,
                absolute_path: absolute,
                new_group_boundary: tagged.starts_group,
            })
        })
        .collect()
}

/// Split rows into groups at each boundary.
#[must_use]
pub fn split_groups(rows: &[ReportRow]) -> Vec<&[ReportRow]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.new_group_boundary {
            groups.push(&rows[start..i]);
            start = i;
        }
    }
    if start < rows.len() {
        groups.push(&rows[start..]);
    }
    groups
}
