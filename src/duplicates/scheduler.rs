//! Fingerprint scheduling.
//!
//! # Overview
//!
//! Candidates are fingerprinted by a [`FingerprintStrategy`]:
//!
//! - [`SequentialExecutor`] hashes files one after another on the calling thread.
//! - [`PoolExecutor`] fans files out over a bounded rayon pool.
//!
//! [`select_strategy`] picks one from the candidate count, so small batches
//! skip pool start-up entirely. Both strategies honour the same contract:
//! one result per candidate, failures recorded instead of aborting the batch,
//! no promise about output order (grouping always sorts).
//!
//! # Example
//!
//! ```no_run
//! use uniquify::duplicates::{select_strategy, SchedulerConfig};
//! use uniquify::scanner::{FileEntry, Hasher};
//!
//! let candidates = vec![FileEntry::new("a.jpg"), FileEntry::new("b.jpg")];
//! let strategy = select_strategy(candidates.len(), &SchedulerConfig::default());
//! let batch = strategy.fingerprint_all(candidates, &Hasher::new());
//! println!("{} hashed, {} failed", batch.entries.len(), batch.failures.len());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::FingerprintedEntry;
use crate::progress::ProgressCallback;
use crate::scanner::{FileEntry, HashError, Hasher};

/// Below this many candidates the sequential executor is used.
pub const DEFAULT_SEQUENTIAL_THRESHOLD: usize = 8;

/// A candidate that could not be fingerprinted.
#[derive(Debug, Clone)]
pub struct FingerprintFailure {
    /// The candidate that failed
    pub entry: FileEntry,
    /// Why it failed
    pub error: HashError,
}

/// Output of a fingerprinting pass.
#[derive(Debug, Clone, Default)]
pub struct FingerprintBatch {
    /// Successfully fingerprinted candidates, in no particular order
    pub entries: Vec<FingerprintedEntry>,
    /// Candidates excluded because hashing failed
    pub failures: Vec<FingerprintFailure>,
    /// Whether hashing stopped early on a shutdown request
    pub interrupted: bool,
}

impl FingerprintBatch {
    /// Paths of all failed candidates.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<PathBuf> {
        self.failures.iter().map(|f| f.entry.path.clone()).collect()
    }

    /// Fold one per-file result into the batch.
    fn push(&mut self, entry: FileEntry, result: Result<crate::scanner::Fingerprint, HashError>) {
        match result {
            Ok(fingerprint) => self.entries.push(FingerprintedEntry { entry, fingerprint }),
            Err(error) if error.is_interrupted() => self.interrupted = true,
            Err(error) => {
                log::warn!("Failed to fingerprint {}: {}", entry.path.display(), error);
                self.failures.push(FingerprintFailure { entry, error });
            }
        }
    }
}

/// Scheduling knobs.
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Worker threads for the pool; 0 means available parallelism.
    pub io_threads: usize,
    /// Candidate count below which hashing runs sequentially.
    pub sequential_threshold: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("io_threads", &self.io_threads)
            .field("sequential_threshold", &self.sequential_threshold)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            io_threads: 0,
            sequential_threshold: DEFAULT_SEQUENTIAL_THRESHOLD,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl SchedulerConfig {
    /// Set the number of worker threads (0 = available parallelism).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the sequential threshold.
    #[must_use]
    pub fn with_sequential_threshold(mut self, threshold: usize) -> Self {
        self.sequential_threshold = threshold;
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

    /// Resolved pool size.
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        if self.io_threads > 0 {
            self.io_threads
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A way of running the fingerprinter over every candidate.
pub trait FingerprintStrategy {
    /// Fingerprint every candidate.
    ///
    /// Never fails as a whole: per-file errors end up in
    /// [`FingerprintBatch::failures`].
    fn fingerprint_all(&self, candidates: Vec<FileEntry>, hasher: &Hasher) -> FingerprintBatch;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Hashes candidates one by one on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct SequentialExecutor {
    config: SchedulerConfig,
}

impl SequentialExecutor {
    /// Create a sequential executor.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }
}

impl FingerprintStrategy for SequentialExecutor {
    fn fingerprint_all(&self, candidates: Vec<FileEntry>, hasher: &Hasher) -> FingerprintBatch {
        let mut batch = FingerprintBatch::default();
        for (idx, entry) in candidates.into_iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::debug!("Fingerprint: Shutdown requested, skipping remaining files");
                batch.interrupted = true;
                break;
            }
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(idx + 1, entry.path.to_string_lossy().as_ref());
            }
            let result = hasher.fingerprint(&entry.path);
            batch.push(entry, result);
        }
        batch
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Hashes candidates on a bounded rayon pool.
#[derive(Debug, Clone)]
pub struct PoolExecutor {
    threads: usize,
    config: SchedulerConfig,
}

impl PoolExecutor {
    /// Create a pool executor with `threads` workers.
    #[must_use]
    pub fn new(threads: usize, config: SchedulerConfig) -> Self {
        Self {
            threads: threads.max(1),
            config,
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl FingerprintStrategy for PoolExecutor {
    fn fingerprint_all(&self, candidates: Vec<FileEntry>, hasher: &Hasher) -> FingerprintBatch {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("uniquify-hash-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Failed to start {} hash workers ({}), hashing sequentially", self.threads, e);
                return SequentialExecutor::new(self.config.clone())
                    .fingerprint_all(candidates, hasher);
            }
        };

        let completed = AtomicUsize::new(0);
        let config = &self.config;

        let results: Vec<(FileEntry, Option<Result<crate::scanner::Fingerprint, HashError>>)> =
            pool.install(|| {
                candidates
                    .into_par_iter()
                    .map(|entry| {
                        if config.is_shutdown_requested() {
                            return (entry, None);
                        }
                        let result = hasher.fingerprint(&entry.path);
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if let Some(ref callback) = config.progress_callback {
                            callback.on_progress(done, entry.path.to_string_lossy().as_ref());
                        }
                        (entry, Some(result))
                    })
                    .collect()
            });

        let mut batch = FingerprintBatch::default();
        for (entry, result) in results {
            match result {
                Some(result) => batch.push(entry, result),
                None => batch.interrupted = true,
            }
        }
        batch
    }

    fn name(&self) -> &'static str {
        "pool"
    }
}

/// Choose a strategy for `candidate_count` candidates.
#[must_use]
pub fn select_strategy(
    candidate_count: usize,
    config: &SchedulerConfig,
) -> Box<dyn FingerprintStrategy> {
    let threads = config.effective_threads();
    if candidate_count < config.sequential_threshold || threads <= 1 {
        Box::new(SequentialExecutor::new(config.clone()))
    } else {
        Box::new(PoolExecutor::new(threads, config.clone()))
    }
}

/// Fingerprint all candidates with the strategy chosen for their count.
#[must_use]
pub fn fingerprint_all(
    candidates: Vec<FileEntry>,
    hasher: &Hasher,
    config: &SchedulerConfig,
) -> FingerprintBatch {
    let total = candidates.len();
    let strategy = select_strategy(total, config);
    log::info!(
        "Fingerprinting {} candidates ({} {})",
        total,
        strategy.name(),
        hasher.algorithm()
    );

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("fingerprint", total);
    }
    let batch = strategy.fingerprint_all(candidates, hasher);
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("fingerprint");
    }

    if batch.interrupted {
        log::info!("Fingerprinting interrupted by shutdown signal");
    }
    log::info!(
        "Fingerprinting complete: {} hashed, {} failed",
        batch.entries.len(),
        batch.failures.len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_candidates(dir: &TempDir, contents: &[&[u8]]) -> Vec<FileEntry> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let path = dir.path().join(format!("img_{i}.jpg"));
                fs::write(&path, c).unwrap();
                FileEntry::new(path)
            })
            .collect()
    }

    fn sorted_pairs(batch: &FingerprintBatch) -> Vec<(PathBuf, crate::scanner::Fingerprint)> {
        let mut pairs: Vec<_> = batch
            .entries
            .iter()
            .map(|e| (e.entry.path.clone(), e.fingerprint))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_select_strategy_below_threshold_is_sequential() {
        let config = SchedulerConfig::default().with_io_threads(4);
        assert_eq!(select_strategy(3, &config).name(), "sequential");
        assert_eq!(select_strategy(0, &config).name(), "sequential");
    }

    #[test]
    fn test_select_strategy_above_threshold_is_pool() {
        let config = SchedulerConfig::default()
            .with_io_threads(4)
            .with_sequential_threshold(2);
        assert_eq!(select_strategy(2, &config).name(), "pool");
    }

    #[test]
    fn test_select_strategy_single_thread_is_sequential() {
        let config = SchedulerConfig::default()
            .with_io_threads(1)
            .with_sequential_threshold(0);
        assert_eq!(select_strategy(100, &config).name(), "sequential");
    }

    #[test]
    fn test_sequential_and_pool_agree() {
        let dir = TempDir::new().unwrap();
        let candidates = create_candidates(&dir, &[b"a", b"b", b"a", b"c", b"dd", b"b"]);
        let hasher = Hasher::new();

        let seq = SequentialExecutor::default().fingerprint_all(candidates.clone(), &hasher);
        let pool = PoolExecutor::new(3, SchedulerConfig::default())
            .fingerprint_all(candidates.clone(), &hasher);

        assert_eq!(seq.entries.len(), candidates.len());
        assert_eq!(sorted_pairs(&seq), sorted_pairs(&pool));
        assert!(seq.failures.is_empty() && pool.failures.is_empty());
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        let mut candidates = create_candidates(&dir, &[b"x", b"y"]);
        candidates.insert(1, FileEntry::new(dir.path().join("vanished.jpg")));

        for strategy in [
            Box::new(SequentialExecutor::default()) as Box<dyn FingerprintStrategy>,
            Box::new(PoolExecutor::new(2, SchedulerConfig::default())),
        ] {
            let batch = strategy.fingerprint_all(candidates.clone(), &Hasher::new());
            assert_eq!(batch.entries.len(), 2, "{}", strategy.name());
            assert_eq!(batch.failures.len(), 1);
            assert_eq!(batch.failed_paths(), vec![dir.path().join("vanished.jpg")]);
            assert!(matches!(batch.failures[0].error, HashError::NotFound(_)));
        }
    }

    #[test]
    fn test_empty_candidates() {
        let batch = fingerprint_all(Vec::new(), &Hasher::new(), &SchedulerConfig::default());
        assert!(batch.entries.is_empty());
        assert!(batch.failures.is_empty());
        assert!(!batch.interrupted);
    }

    #[test]
    fn test_shutdown_skips_everything() {
        let dir = TempDir::new().unwrap();
        let candidates = create_candidates(&dir, &[b"a", b"b", b"c"]);
        let config = SchedulerConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true)));

        let seq = SequentialExecutor::new(config.clone()).fingerprint_all(candidates.clone(), &Hasher::new());
        assert!(seq.interrupted);
        assert!(seq.entries.is_empty());

        let pool = PoolExecutor::new(2, config).fingerprint_all(candidates, &Hasher::new());
        assert!(pool.interrupted);
        assert!(pool.entries.is_empty());
        assert!(pool.failures.is_empty());
    }

    #[test]
    fn test_effective_threads() {
        assert_eq!(SchedulerConfig::default().with_io_threads(3).effective_threads(), 3);
        assert!(SchedulerConfig::default().effective_threads() >= 1);
    }
}
