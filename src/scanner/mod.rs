//! Scanner module for directory traversal, candidate filtering and fingerprinting.
//!
//! This module provides functionality for:
//! - Directory walking using jwalk, partitioned into candidates and passthrough files
//! - Candidate filtering by image extension plus an open probe
//! - Content fingerprinting with BLAKE3 or SHA-256 (streaming)
//! - Unicode path normalization for destination keys
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`filter`]: Candidate filter (extension allow-list, open probe)
//! - [`hasher`]: Streaming file fingerprints
//! - [`path_utils`]: NFC normalization helpers
//!
//! # Example
//!
//! ```no_run
//! use uniquify::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("./photos"), WalkerConfig::default());
//! let discovery = walker.discover().unwrap();
//! println!(
//!     "{} candidates, {} passthrough",
//!     discovery.candidates.len(),
//!     discovery.passthrough.len()
//! );
//! ```

pub mod filter;
pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use filter::{CandidateFilter, DEFAULT_IMAGE_EXTENSIONS};
pub use hasher::{hash_to_hex, hex_to_hash, Fingerprint, FingerprintAlgorithm, Hasher};
pub use walker::{Discovery, WalkDiagnostics, Walker};

/// A file discovered under the scan root.
///
/// Identifies a filesystem object by path only. Entries are immutable once
/// discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path to the file, as produced by the walker (root-prefixed)
    pub path: PathBuf,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of this entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Candidate filter applied to every discovered file.
    pub filter: CandidateFilter,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool, filter: CandidateFilter) -> Self {
        Self {
            follow_symlinks,
            filter,
        }
    }
}

/// Errors that can occur during directory scanning.
///
/// Only the scan root produces a fatal `ScanError`; failures below the root
/// are counted in [`WalkDiagnostics`].
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur while fingerprinting a file.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(error),
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }

    /// Whether this error was caused by a shutdown request.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::Interrupted)
    }
}
