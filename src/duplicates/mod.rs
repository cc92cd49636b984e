//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Fingerprint scheduling (sequential or bounded pool)
//! - Sort-and-scan grouping with group-start tags
//! - Pipeline orchestration and run statistics

pub mod finder;
pub mod groups;
pub mod scheduler;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanOutcome, ScanSummary};
pub use groups::{group, FingerprintedEntry, GroupedSequence, TaggedEntry};
pub use scheduler::{
    fingerprint_all, select_strategy, FingerprintBatch, FingerprintFailure, FingerprintStrategy,
    PoolExecutor, SchedulerConfig, SequentialExecutor, DEFAULT_SEQUENTIAL_THRESHOLD,
};
