//! Output-tree placement.
//!
//! Every surviving file (one representative per group plus every passthrough
//! file) is copied to `output / <path relative to the input root>`, keeping
//! the subdirectory structure. The full plan is built and checked for
//! destination collisions before anything is copied, so a collision never
//! leaves a half-written tree behind.
//!
//! # Example
//!
//! ```no_run
//! use uniquify::duplicates::DuplicateFinder;
//! use uniquify::placement::{prepare_output, PlacementOptions, PlacementPlan};
//! use std::path::Path;
//!
//! let input = Path::new("./photos");
//! let output = Path::new("./photos-unique");
//! prepare_output(output, input, false).unwrap();
//!
//! let (outcome, _) = DuplicateFinder::with_defaults().find(input).unwrap();
//! let plan = PlacementPlan::from_outcome(&outcome, &PlacementOptions::default()).unwrap();
//! let report = plan.execute(output);
//! println!("copied {} files", report.copied);
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use filetime::FileTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::ScanOutcome;
use crate::scanner::path_utils::{destination_key, relative_to};

/// Name of the probe file used to check that the output is writable.
const WRITE_PROBE: &str = ".uniquify-write-probe";

/// Errors that can occur while planning or preparing placement.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Two different sources would be written to the same destination.
    #[error("Destination collision at {destination}: {first} and {second}")]
    DestinationCollision {
        /// Destination path relative to the output root
        destination: PathBuf,
        /// Source planned first
        first: PathBuf,
        /// Source that collided with it
        second: PathBuf,
    },

    /// A source file does not live under the input root.
    #[error("{path} is not under input root {root}")]
    OutsideRoot {
        /// Offending source
        path: PathBuf,
        /// Input root
        root: PathBuf,
    },

    /// The output directory is inside the input tree.
    #[error("Output directory {output} is inside input directory {input}")]
    OutputInsideInput {
        /// Output directory
        output: PathBuf,
        /// Input directory
        input: PathBuf,
    },

    /// The input tree is inside the output directory.
    #[error("Input directory {input} is inside output directory {output}")]
    InputInsideOutput {
        /// Input directory
        input: PathBuf,
        /// Output directory
        output: PathBuf,
    },

    /// The output directory cannot be created or written.
    #[error("Output directory {path} is not writable: {source}")]
    OutputNotWritable {
        /// Output directory
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// What to do when two sources map to the same destination.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Abort before copying anything
    #[default]
    Fail,
    /// Rename later sources to `name~N.ext`
    Suffix,
}

/// Placement planning options.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementOptions {
    /// Collision handling.
    pub policy: CollisionPolicy,
    /// Treat destinations differing only by case as the same path.
    pub case_insensitive: bool,
}

/// One file to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Source path under the input root
    pub source: PathBuf,
    /// Destination relative to the output root
    pub relative: PathBuf,
}

/// A validated, collision-free list of copies.
#[derive(Debug, Clone, Default)]
pub struct PlacementPlan {
    /// Copies in placement order (representatives first, then passthrough)
    pub items: Vec<Placement>,
}

/// A copy that failed during execution.
#[derive(Debug)]
pub struct CopyFailure {
    /// The placement that failed
    pub placement: Placement,
    /// Why it failed
    pub error: std::io::Error,
}

/// Result of executing a plan.
#[derive(Debug, Default)]
pub struct PlacementReport {
    /// Files copied successfully
    pub copied: usize,
    /// Copies that failed
    pub failures: Vec<CopyFailure>,
}

impl PlacementPlan {
    /// Plan placement for `sources` relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::DestinationCollision`] under
    /// [`CollisionPolicy::Fail`], or [`PlacementError::OutsideRoot`] for a
    /// source outside `root`.
    pub fn build<'a, I>(
        root: &Path,
        sources: I,
        options: &PlacementOptions,
    ) -> Result<Self, PlacementError>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut taken: HashMap<String, PathBuf> = HashMap::new();
        let mut items = Vec::new();

        for source in sources {
            let relative =
                relative_to(root, source).ok_or_else(|| PlacementError::OutsideRoot {
                    path: source.to_path_buf(),
                    root: root.to_path_buf(),
                })?;

            let key = destination_key(&relative, options.case_insensitive);
            let relative = match taken.get(&key) {
                None => relative,
                Some(first) => match options.policy {
                    CollisionPolicy::Fail => {
                        return Err(PlacementError::DestinationCollision {
                            destination: relative,
                            first: first.clone(),
                            second: source.to_path_buf(),
                        });
                    }
                    CollisionPolicy::Suffix => {
                        let renamed = (1..)
                            .map(|n| suffixed(&relative, n))
                            .find(|candidate| {
                                !taken.contains_key(&destination_key(
                                    candidate,
                                    options.case_insensitive,
                                ))
                            })
                            .unwrap_or(relative);
                        log::warn!(
                            "Destination collision: {} placed as {}",
                            source.display(),
                            renamed.display()
                        );
                        renamed
                    }
                },
            };

            taken.insert(
                destination_key(&relative, options.case_insensitive),
                source.to_path_buf(),
            );
            items.push(Placement {
                source: source.to_path_buf(),
                relative,
            });
        }

        Ok(Self { items })
    }

    /// Plan placement for a scan outcome: representatives, then passthrough.
    ///
    /// # Errors
    ///
    /// See [`PlacementPlan::build`].
    pub fn from_outcome(
        outcome: &ScanOutcome,
        options: &PlacementOptions,
    ) -> Result<Self, PlacementError> {
        let representatives = outcome.grouped.representatives();
        let sources = representatives
            .iter()
            .map(|e| e.entry.path.as_path())
            .chain(outcome.passthrough.iter().map(|e| e.path.as_path()));
        Self::build(&outcome.root, sources, options)
    }

    /// Number of planned copies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copy every planned file under `output`.
    ///
    /// Per-file failures are collected; the remaining files are still copied.
    #[must_use]
    pub fn execute(&self, output: &Path) -> PlacementReport {
        let mut report = PlacementReport::default();
        for placement in &self.items {
            let dest = output.join(&placement.relative);
            match copy_preserving_mtime(&placement.source, &dest) {
                Ok(()) => {
                    log::trace!("Placed {} -> {}", placement.source.display(), dest.display());
                    report.copied += 1;
                }
                Err(error) => {
                    log::warn!("Failed to place {}: {}", placement.source.display(), error);
                    report.failures.push(CopyFailure {
                        placement: placement.clone(),
                        error,
                    });
                }
            }
        }
        log::info!(
            "Placed {} files into {} ({} failed)",
            report.copied,
            output.display(),
            report.failures.len()
        );
        report
    }
}

/// `dir/name.ext` -> `dir/name~n.ext`
fn suffixed(relative: &Path, n: usize) -> PathBuf {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match relative.extension() {
        Some(ext) => format!("{stem}~{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}~{n}"),
    };
    relative.with_file_name(name)
}

fn copy_preserving_mtime(source: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)?;
    let metadata = fs::metadata(source)?;
    filetime::set_file_mtime(dest, FileTime::from_last_modification_time(&metadata))?;
    Ok(())
}

/// Validate and prepare the output directory before any output is produced.
///
/// The output and input trees must be disjoint; this is checked before the
/// output directory is created, so a rejected run leaves no trace. Then the
/// directory is created, checked for writability and, with `clean`, emptied.
///
/// # Errors
///
/// Returns [`PlacementError::OutputInsideInput`],
/// [`PlacementError::InputInsideOutput`] or
/// [`PlacementError::OutputNotWritable`].
pub fn prepare_output(output: &Path, input: &Path, clean: bool) -> Result<(), PlacementError> {
    let not_writable = |source| PlacementError::OutputNotWritable {
        path: output.to_path_buf(),
        source,
    };

    let output_abs = resolve_lexically(output).map_err(not_writable)?;
    if let Ok(input_abs) = fs::canonicalize(input) {
        if output_abs.starts_with(&input_abs) {
            return Err(PlacementError::OutputInsideInput {
                output: output_abs,
                input: input_abs,
            });
        }
        if input_abs.starts_with(&output_abs) {
            return Err(PlacementError::InputInsideOutput {
                input: input_abs,
                output: output_abs,
            });
        }
    }

    fs::create_dir_all(output).map_err(not_writable)?;

    let probe = output.join(WRITE_PROBE);
    fs::write(&probe, b"").map_err(not_writable)?;
    fs::remove_file(&probe).map_err(not_writable)?;

    if clean {
        clean_directory(output);
    }
    Ok(())
}

/// Absolute form of a path that may not exist yet: the nearest existing
/// ancestor is canonicalized and the missing tail is appended lexically.
fn resolve_lexically(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = fs::canonicalize(ancestor) else {
            continue;
        };
        let tail = absolute.strip_prefix(ancestor).unwrap_or(Path::new(""));
        for component in tail.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir => {}
                other => resolved.push(other),
            }
        }
        return Ok(resolved);
    }
    Ok(absolute)
}

/// Remove everything inside `dir`, logging entries that cannot be removed.
fn clean_directory(dir: &Path) {
    log::info!("Cleaning {}", dir.display());
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to list {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let result = match entry.file_type() {
            Ok(t) if t.is_dir() => fs::remove_dir_all(&path),
            _ => fs::remove_file(&path),
        };
        if let Err(e) = result {
            log::warn!("Failed to delete {}: {}", path.display(), e);
        }
    }
}
