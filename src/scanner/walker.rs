//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker::discover`] visits every file under a root and partitions them
//! into dedup candidates and passthrough files using the
//! [`CandidateFilter`](super::CandidateFilter). Directories are never entries.
//!
//! Only the root itself can fail the walk. Anything that goes wrong below the
//! root (an unreadable subdirectory, a file that vanishes before it can be
//! stat'ed, an image that cannot be opened) is counted in
//! [`WalkDiagnostics`] so mass permission problems stay visible.
//!
//! # Example
//!
//! ```no_run
//! use uniquify::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Pictures"), WalkerConfig::default());
//! let discovery = walker.discover().unwrap();
//! for entry in &discovery.candidates {
//!     println!("{}", entry.path.display());
//! }
//! eprintln!("{} unreadable entries", discovery.diagnostics.unreadable);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{CandidateFilter, FileEntry, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Maximum number of failing paths kept as samples.
pub const MAX_DIAGNOSTIC_SAMPLES: usize = 10;

/// Counters for problems found below the scan root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkDiagnostics {
    /// Regular files discovered (candidates + passthrough)
    pub files_found: usize,
    /// Entries whose metadata or directory listing could not be read
    pub unreadable: usize,
    /// Image files that failed the open probe and became passthrough
    pub probe_failures: usize,
    /// Symlinks not followed whose target is not a regular file
    pub skipped_symlinks: usize,
    /// First few failing paths, for operator display
    pub samples: Vec<PathBuf>,
    /// Whether the walk stopped early on a shutdown request
    pub interrupted: bool,
}

impl WalkDiagnostics {
    /// Total number of per-entry problems.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.unreadable + self.probe_failures
    }

    fn sample(&mut self, path: &Path) {
        if self.samples.len() < MAX_DIAGNOSTIC_SAMPLES {
            self.samples.push(path.to_path_buf());
        }
    }

    fn record_unreadable(&mut self, path: &Path) {
        self.unreadable += 1;
        self.sample(path);
    }

    fn record_probe_failure(&mut self, path: &Path) {
        self.probe_failures += 1;
        self.sample(path);
    }
}

/// Result of walking a root.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Files eligible for dedup, in walk order
    pub candidates: Vec<FileEntry>,
    /// Files passed through untouched, in walk order
    pub passthrough: Vec<FileEntry>,
    /// Per-entry problem counters
    pub diagnostics: WalkDiagnostics,
}

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn filter(&self) -> &CandidateFilter {
        &self.config.filter
    }

    /// Make sure the root is a readable directory.
    fn check_root(&self) -> Result<(), ScanError> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        std::fs::read_dir(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        Ok(())
    }

    /// Walk the tree and partition files into candidates and passthrough.
    ///
    /// Ordering is walk order: children of each directory are visited by
    /// file name, but the overall sequence is not globally sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] only when the root cannot be read.
    pub fn discover(&self) -> Result<Discovery, ScanError> {
        self.check_root()?;

        let mut discovery = Discovery::default();
        if let Some(ref callback) = self.progress {
            callback.on_phase_start("walking", 0);
        }

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        for entry_result in walk_dir {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                discovery.diagnostics.interrupted = true;
                break;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    discovery.diagnostics.record_unreadable(&path);
                    continue;
                }
            };

            let path = entry.path();
            if let Some(ref e) = entry.read_children_error {
                log::warn!("Cannot read directory {}: {}", path.display(), e);
                discovery.diagnostics.record_unreadable(&path);
            }
            if path == self.root {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() && !self.config.follow_symlinks {
                // Not deduplicated, but a link to a file is still carried
                // through to the output as a copy of its target.
                match std::fs::metadata(&path) {
                    Ok(m) if m.is_file() => {
                        log::trace!("Passthrough (symlink): {}", path.display());
                        discovery.diagnostics.files_found += 1;
                        discovery.passthrough.push(FileEntry::new(path));
                    }
                    _ => {
                        log::debug!("Skipping symlink: {}", path.display());
                        discovery.diagnostics.skipped_symlinks += 1;
                    }
                }
                continue;
            }

            let metadata = if self.config.follow_symlinks {
                std::fs::metadata(&path)
            } else {
                std::fs::symlink_metadata(&path)
            };

            match metadata {
                Ok(m) if m.is_file() => {}
                Ok(_) => {
                    log::trace!("Skipping non-regular file: {}", path.display());
                    continue;
                }
                Err(e) => {
                    log::warn!("Cannot stat {}: {}", path.display(), e);
                    discovery.diagnostics.record_unreadable(&path);
                    discovery.diagnostics.files_found += 1;
                    discovery.passthrough.push(FileEntry::new(path));
                    continue;
                }
            }

            discovery.diagnostics.files_found += 1;
            if let Some(ref callback) = self.progress {
                callback.on_progress(
                    discovery.diagnostics.files_found,
                    path.to_string_lossy().as_ref(),
                );
            }

            self.classify(path, &mut discovery);
        }

        if let Some(ref callback) = self.progress {
            callback.on_phase_end("walking");
        }

        log::info!(
            "Discovered {} files: {} candidates, {} passthrough, {} unreadable, {} symlinks skipped",
            discovery.diagnostics.files_found,
            discovery.candidates.len(),
            discovery.passthrough.len(),
            discovery.diagnostics.unreadable,
            discovery.diagnostics.skipped_symlinks
        );

        Ok(discovery)
    }

    /// Route one regular file through the candidate filter.
    fn classify(&self, path: PathBuf, discovery: &mut Discovery) {
        if !self.filter().matches_extension(&path) {
            log::trace!("Passthrough (extension): {}", path.display());
            discovery.passthrough.push(FileEntry::new(path));
            return;
        }

        match CandidateFilter::probe(&path) {
            Ok(()) => discovery.candidates.push(FileEntry::new(path)),
            Err(e) => {
                log::warn!("Cannot open {}, passing through: {}", path.display(), e);
                discovery.diagnostics.record_probe_failure(&path);
                discovery.passthrough.push(FileEntry::new(path));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    /// Create a test directory with images, a note and a nested image.
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        File::create(dir.path().join("a.jpg"))
            .unwrap()
            .write_all(b"image a")
            .unwrap();
        File::create(dir.path().join("B.PNG"))
            .unwrap()
            .write_all(b"image b")
            .unwrap();
        File::create(dir.path().join("notes.txt"))
            .unwrap()
            .write_all(b"notes")
            .unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        File::create(subdir.join("nested.gif"))
            .unwrap()
            .write_all(b"nested")
            .unwrap();

        dir
    }

    fn names(entries: &[FileEntry]) -> Vec<String> {
        let mut names: Vec<String> = entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_discover_partitions_files() {
        let dir = create_test_dir();
        let discovery = Walker::new(dir.path(), WalkerConfig::default())
            .discover()
            .unwrap();

        assert_eq!(names(&discovery.candidates), vec!["B.PNG", "a.jpg", "nested.gif"]);
        assert_eq!(names(&discovery.passthrough), vec!["notes.txt"]);
        assert_eq!(discovery.diagnostics.files_found, 4);
        assert_eq!(discovery.diagnostics.error_count(), 0);
        assert!(!discovery.diagnostics.interrupted);
    }

    #[test]
    fn test_discover_paths_are_under_root() {
        let dir = create_test_dir();
        let discovery = Walker::new(dir.path(), WalkerConfig::default())
            .discover()
            .unwrap();

        for entry in discovery.candidates.iter().chain(&discovery.passthrough) {
            assert!(entry.path.starts_with(dir.path()));
            assert!(entry.path.is_file());
        }
    }

    #[test]
    fn test_discover_keeps_empty_and_hidden_files() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("empty.jpg")).unwrap();
        fs::write(dir.path().join(".hidden.png"), b"x").unwrap();

        let discovery = Walker::new(dir.path(), WalkerConfig::default())
            .discover()
            .unwrap();
        assert_eq!(names(&discovery.candidates), vec![".hidden.png", "empty.jpg"]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = TempDir::new().unwrap();
        let discovery = Walker::new(dir.path(), WalkerConfig::default())
            .discover()
            .unwrap();

        assert!(discovery.candidates.is_empty());
        assert!(discovery.passthrough.is_empty());
        assert_eq!(discovery.diagnostics, WalkDiagnostics::default());
    }

    #[test]
    fn test_discover_nonexistent_root() {
        let walker = Walker::new(
            Path::new("/nonexistent/uniquify/12345"),
            WalkerConfig::default(),
        );
        assert!(matches!(walker.discover(), Err(ScanError::NotFound(_))));
    }

    #[test]
    fn test_discover_root_is_file() {
        let dir = create_test_dir();
        let walker = Walker::new(&dir.path().join("a.jpg"), WalkerConfig::default());
        assert!(matches!(walker.discover(), Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn test_discover_with_all_files_filter() {
        let dir = create_test_dir();
        let config = WalkerConfig::new(false, CandidateFilter::new().with_all_files(true));
        let discovery = Walker::new(dir.path(), config).discover().unwrap();

        assert_eq!(discovery.candidates.len(), 4);
        assert!(discovery.passthrough.is_empty());
    }

    #[test]
    fn test_discover_shutdown_flag() {
        let dir = create_test_dir();
        let shutdown = Arc::new(AtomicBool::new(true));
        let discovery = Walker::new(dir.path(), WalkerConfig::default())
            .with_shutdown_flag(Arc::clone(&shutdown))
            .discover()
            .unwrap();

        assert!(discovery.diagnostics.interrupted);
        assert!(discovery.candidates.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_discover_passes_symlinks_through_by_default() {
        let dir = create_test_dir();
        std::os::unix::fs::symlink(dir.path().join("a.jpg"), dir.path().join("link.jpg")).unwrap();

        std::os::unix::fs::symlink(dir.path().join("nowhere.jpg"), dir.path().join("broken.jpg"))
            .unwrap();

        let discovery = Walker::new(dir.path(), WalkerConfig::default())
            .discover()
            .unwrap();
        assert!(!names(&discovery.candidates).contains(&"link.jpg".to_string()));
        assert!(names(&discovery.passthrough).contains(&"link.jpg".to_string()));
        assert!(!names(&discovery.passthrough).contains(&"broken.jpg".to_string()));
        assert_eq!(discovery.diagnostics.skipped_symlinks, 1);

        let config = WalkerConfig::new(true, CandidateFilter::new());
        let discovery = Walker::new(dir.path(), config).discover().unwrap();
        assert!(names(&discovery.candidates).contains(&"link.jpg".to_string()));
    }

    #[test]
    #[cfg(unix)]
    fn test_discover_counts_unopenable_images() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_test_dir();
        let locked = dir.path().join("locked.jpg");
        fs::write(&locked, b"secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to root
        if File::open(&locked).is_ok() {
            return;
        }

        let discovery = Walker::new(dir.path(), WalkerConfig::default())
            .discover()
            .unwrap();
        assert_eq!(discovery.diagnostics.probe_failures, 1);
        assert_eq!(discovery.diagnostics.samples, vec![locked.clone()]);
        assert!(discovery.passthrough.iter().any(|e| e.path == locked));
        assert!(!discovery.candidates.iter().any(|e| e.path == locked));
    }

    #[test]
    #[cfg(unix)]
    fn test_discover_counts_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_test_dir();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.jpg"), b"hidden").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let discovery = Walker::new(dir.path(), WalkerConfig::default()).discover();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let discovery = discovery.unwrap();
        assert_eq!(discovery.diagnostics.unreadable, 1);
        assert_eq!(discovery.diagnostics.samples, vec![locked]);
        assert!(!names(&discovery.candidates).contains(&"hidden.jpg".to_string()));
    }
}
