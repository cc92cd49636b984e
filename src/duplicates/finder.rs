//! Dedup pipeline orchestration.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the core pipeline over one root:
//! 1. **Walk** - discover files and split them into candidates and passthrough
//! 2. **Fingerprint** - hash candidates, sequentially or on a bounded pool
//! 3. **Group** - sort by fingerprint and tag group boundaries
//!
//! Per-file failures never abort the run; they are summarised in
//! [`ScanSummary`]. Only an unreadable root is fatal.
//!
//! # Example
//!
//! ```no_run
//! use uniquify::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (outcome, summary) = finder.find(Path::new("./photos")).unwrap();
//!
//! println!("{} groups, {} duplicates", summary.groups_found, summary.duplicates_found);
//! for rep in outcome.grouped.representatives() {
//!     println!("keep {}", rep.entry.path.display());
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::scheduler::{fingerprint_all, FingerprintFailure, SchedulerConfig};
use super::{group, GroupedSequence};
use crate::progress::ProgressCallback;
use crate::scanner::{
    CandidateFilter, FileEntry, FingerprintAlgorithm, Hasher, ScanError, WalkDiagnostics, Walker,
    WalkerConfig,
};

/// Number of failing paths shown in the summary.
pub const SUMMARY_SAMPLE_PATHS: usize = 5;

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Walker configuration (symlinks, candidate filter).
    pub walker: WalkerConfig,
    /// Fingerprint algorithm.
    pub algorithm: FingerprintAlgorithm,
    /// Scheduling knobs for fingerprinting.
    pub scheduler: SchedulerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker", &self.walker)
            .field("algorithm", &self.algorithm)
            .field("scheduler", &self.scheduler)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl FinderConfig {
    /// Set the candidate filter.
    #[must_use]
    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.walker.filter = filter;
        self
    }

    /// Follow symbolic links while walking.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.walker.follow_symlinks = follow;
        self
    }

    /// Set the fingerprint algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: FingerprintAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the number of hash worker threads (0 = available parallelism).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.scheduler.io_threads = threads;
        self
    }

    /// Set the candidate count below which hashing runs sequentially.
    #[must_use]
    pub fn with_sequential_threshold(mut self, threshold: usize) -> Self {
        self.scheduler.sequential_threshold = threshold;
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a run.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Regular files discovered under the root
    pub files_found: usize,
    /// Files that passed the candidate filter
    pub candidates_kept: usize,
    /// Files passed through untouched
    pub passthrough: usize,
    /// Entries whose metadata or listing could not be read
    pub walk_errors: usize,
    /// Image files that could not be opened during discovery
    pub probe_failures: usize,
    /// Symlinks left out of the walk (not followed, target not a file)
    pub skipped_symlinks: usize,
    /// Candidates excluded because hashing failed
    pub fingerprint_failures: usize,
    /// Number of groups (distinct fingerprints)
    pub groups_found: usize,
    /// Groups with two or more members
    pub duplicate_groups: usize,
    /// Redundant copies (fingerprinted candidates minus groups)
    pub duplicates_found: usize,
    /// Bytes read while fingerprinting
    pub bytes_hashed: u64,
    /// Sample paths of per-file failures
    pub failure_samples: Vec<PathBuf>,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl ScanSummary {
    /// Whether any per-file problem was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.walk_errors + self.probe_failures + self.fingerprint_failures > 0
    }

    /// Bytes hashed as a human-readable string.
    #[must_use]
    pub fn bytes_hashed_display(&self) -> String {
        bytesize::ByteSize::b(self.bytes_hashed).to_string()
    }
}

/// Everything a run produced besides the summary.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Root the scan was run against
    pub root: PathBuf,
    /// Fingerprinted candidates, sorted and tagged
    pub grouped: GroupedSequence,
    /// Non-candidate files, in walk order
    pub passthrough: Vec<FileEntry>,
    /// Candidates that could not be fingerprinted
    pub failures: Vec<FingerprintFailure>,
    /// Walk-level diagnostics
    pub diagnostics: WalkDiagnostics,
}

impl ScanOutcome {
    /// True when there was nothing to deduplicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grouped.is_empty()
    }

    /// Fail with [`FinderError::EmptyInput`] when no candidate survived.
    ///
    /// # Errors
    ///
    /// Returns `FinderError::EmptyInput` for an empty outcome.
    pub fn require_candidates(&self) -> Result<&Self, FinderError> {
        if self.is_empty() {
            Err(FinderError::EmptyInput(self.root.clone()))
        } else {
            Ok(self)
        }
    }
}

/// Errors that can occur during a run.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// No candidate files were found (or all of them failed).
    #[error("No candidate files found under {0}")]
    EmptyInput(PathBuf),

    /// The scan root could not be read.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Runs walk, fingerprint and grouping for one root.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::with_algorithm(config.algorithm);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Run the pipeline over `root`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError::Scan` if the root cannot be read, and
    /// `FinderError::Interrupted` if shutdown was requested.
    pub fn find(&self, root: &Path) -> Result<(ScanOutcome, ScanSummary), FinderError> {
        let start_time = Instant::now();
        log::info!("Starting scan of {}", root.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut walker = Walker::new(root, self.config.walker.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
        }
        let discovery = walker.discover()?;
        if discovery.diagnostics.interrupted {
            return Err(FinderError::Interrupted);
        }

        let mut scheduler = self.config.scheduler.clone();
        if let Some(ref flag) = self.config.shutdown_flag {
            scheduler.shutdown_flag = Some(Arc::clone(flag));
        }
        if let Some(ref callback) = self.config.progress_callback {
            scheduler.progress_callback = Some(Arc::clone(callback));
        }

        let candidates_kept = discovery.candidates.len();
        let sizes: HashMap<PathBuf, u64> = discovery
            .candidates
            .iter()
            .filter_map(|e| std::fs::metadata(&e.path).ok().map(|m| (e.path.clone(), m.len())))
            .collect();
        let batch = fingerprint_all(discovery.candidates, &self.hasher, &scheduler);
        if batch.interrupted {
            return Err(FinderError::Interrupted);
        }

        let bytes_hashed: u64 = batch
            .entries
            .iter()
            .filter_map(|e| sizes.get(&e.entry.path))
            .sum();

        let grouped = group(batch.entries);
        if log::log_enabled!(log::Level::Debug) {
            for members in grouped.groups().filter(|g| g.len() > 1) {
                log::debug!(
                    "Duplicate group {}: {} files",
                    members[0].entry.fingerprint_hex(),
                    members.len()
                );
            }
        }

        let mut failure_samples: Vec<PathBuf> = discovery
            .diagnostics
            .samples
            .iter()
            .cloned()
            .chain(batch.failures.iter().map(|f| f.entry.path.clone()))
            .collect();
        failure_samples.truncate(SUMMARY_SAMPLE_PATHS);

        let summary = ScanSummary {
            files_found: discovery.diagnostics.files_found,
            candidates_kept,
            passthrough: discovery.passthrough.len(),
            walk_errors: discovery.diagnostics.unreadable,
            probe_failures: discovery.diagnostics.probe_failures,
            skipped_symlinks: discovery.diagnostics.skipped_symlinks,
            fingerprint_failures: batch.failures.len(),
            groups_found: grouped.group_count(),
            duplicate_groups: grouped.duplicate_group_count(),
            duplicates_found: grouped.redundant_count(),
            bytes_hashed,
            failure_samples,
            scan_duration: start_time.elapsed(),
            interrupted: false,
        };

        log::info!(
            "Scan complete: {} groups, {} duplicates, {} fingerprint failures",
            summary.groups_found,
            summary.duplicates_found,
            summary.fingerprint_failures
        );

        let outcome = ScanOutcome {
            root: root.to_path_buf(),
            grouped,
            passthrough: discovery.passthrough,
            failures: batch.failures,
            diagnostics: discovery.diagnostics,
        };

        Ok((outcome, summary))
    }
}
