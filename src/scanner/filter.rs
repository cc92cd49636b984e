//! Candidate filter.
//!
//! A file is a dedup candidate when its extension (case-insensitive) is on
//! the image allow-list and it can be opened for reading. Everything else is
//! a passthrough file: copied through untouched, never an error.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

/// Image container extensions recognised by default.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "jfif", "png", "gif", "bmp", "dib", "tif", "tiff", "webp", "ico",
    "heic", "heif", "avif", "ppm", "pgm", "pbm", "pnm", "tga", "dds", "psd",
];

/// Decides whether a discovered file participates in dedup.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    /// Lowercase extensions without the leading dot
    extensions: BTreeSet<String>,
    /// Accept any extension (the open probe still applies)
    all_files: bool,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            all_files: false,
        }
    }
}

impl CandidateFilter {
    /// Create a filter with the default image allow-list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add extensions to the allow-list. Leading dots and case are ignored.
    #[must_use]
    pub fn with_extra_extensions<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extra {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() {
                self.extensions.insert(ext);
            }
        }
        self
    }

    /// Treat every file as a candidate, regardless of extension.
    #[must_use]
    pub fn with_all_files(mut self, all_files: bool) -> Self {
        self.all_files = all_files;
        self
    }

    /// Extensions on the allow-list, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Stage one: extension allow-list.
    #[must_use]
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.all_files {
            return true;
        }
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// Stage two: open probe. The handle is dropped immediately.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from `File::open`.
    pub fn probe(path: &Path) -> std::io::Result<()> {
        File::open(path).map(drop)
    }

    /// Whether `path` is a dedup candidate.
    #[must_use]
    pub fn is_candidate(&self, path: &Path) -> bool {
        self.matches_extension(path) && Self::probe(path).is_ok()
    }
}
