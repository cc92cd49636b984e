//! Layered configuration.
//!
//! [`Settings`] are resolved with figment from, lowest priority first:
//!
//! 1. built-in defaults
//! 2. the config file (`--config FILE`, or `uniquify/config.toml` in the
//!    platform config directory)
//! 3. `UNIQUIFY_*` environment variables (e.g. `UNIQUIFY_IO_THREADS=4`)
//!
//! CLI flags are applied last, when [`RunConfig::from_cli`] folds the
//! settings and the parsed [`Cli`] into the immutable configuration that a
//! run is driven by.
//!
//! ```toml
//! io_threads = 4
//! sequential_threshold = 8
//! algorithm = "sha256"
//! extra_extensions = ["raw", "cr2"]
//! report_format = "json"
//! report_dir = "/var/tmp/reports"
//! follow_symlinks = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::duplicates::{FinderConfig, DEFAULT_SEQUENTIAL_THRESHOLD};
use crate::output::ReportFormat;
use crate::placement::PlacementOptions;
use crate::scanner::{CandidateFilter, FingerprintAlgorithm};

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "UNIQUIFY_";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),

    /// A provider produced invalid values.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Persistent settings shared by every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hashing threads (0 = available parallelism).
    pub io_threads: usize,
    /// Candidate count below which hashing runs sequentially.
    pub sequential_threshold: usize,
    /// Fingerprint digest.
    pub algorithm: FingerprintAlgorithm,
    /// Extensions added to the image allow-list.
    pub extra_extensions: Vec<String>,
    /// Report file format.
    pub report_format: ReportFormat,
    /// Where report files go (current directory when unset).
    pub report_dir: Option<PathBuf>,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            io_threads: 0,
            sequential_threshold: DEFAULT_SEQUENTIAL_THRESHOLD,
            algorithm: FingerprintAlgorithm::default(),
            extra_extensions: Vec::new(),
            report_format: ReportFormat::default(),
            report_dir: None,
            follow_symlinks: false,
        }
    }
}

impl Settings {
    /// Platform config file location, if a home directory can be found.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "uniquify").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Provider stack without the environment layer.
    #[must_use]
    pub fn file_figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(path))
    }

    /// Full provider stack: defaults, file, environment.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = match path {
            Some(path) => Self::file_figment(path),
            None => Figment::from(Serialized::defaults(Self::default())),
        };
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings.
    ///
    /// An explicit `path` must exist; the platform default may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] for a missing explicit file and
    /// [`ConfigError::Invalid`] when any layer fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::MissingFile(explicit.to_path_buf()));
                }
                Some(explicit.to_path_buf())
            }
            None => Self::default_path(),
        };

        match &path {
            Some(p) => log::debug!("Loading settings from {}", p.display()),
            None => log::debug!("No config directory, using defaults"),
        }

        let settings: Self = Self::figment(path.as_deref())
            .extract()
            .map_err(Box::new)?;
        Ok(settings)
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root to deduplicate.
    pub input_path: PathBuf,
    /// Where unique files are placed.
    pub output_path: Option<PathBuf>,
    /// Write the full report.
    pub include_report: bool,
    /// Write the duplicates-only report.
    pub include_duplicate_report: bool,
    /// Copy unique files to `output_path`.
    pub place: bool,
    /// Empty the output directory first.
    pub clean_output: bool,
    /// Placement collision handling.
    pub placement: PlacementOptions,
    /// Directory for report files.
    pub report_dir: PathBuf,
    /// Report file format.
    pub report_format: ReportFormat,
    /// Fingerprint digest.
    pub algorithm: FingerprintAlgorithm,
    /// Hashing threads (0 = available parallelism).
    pub io_threads: usize,
    /// Sequential hashing below this many candidates.
    pub sequential_threshold: usize,
    /// Candidate filter.
    pub filter: CandidateFilter,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Draw progress bars.
    pub show_progress: bool,
    /// Color the console summary.
    pub color: bool,
    /// Print only errors.
    pub quiet: bool,
}

impl RunConfig {
    /// Fold CLI flags over loaded settings.
    #[must_use]
    pub fn from_cli(cli: &Cli, settings: Settings) -> Self {
        let filter = CandidateFilter::new()
            .with_extra_extensions(&settings.extra_extensions)
            .with_extra_extensions(&cli.extensions)
            .with_all_files(cli.all_files);

        Self {
            input_path: cli.input.clone(),
            output_path: cli.output.clone(),
            include_report: !cli.no_report,
            include_duplicate_report: cli.duplicate_report,
            place: cli.output.is_some(),
            clean_output: cli.clean_output,
            placement: PlacementOptions {
                policy: cli.on_collision,
                case_insensitive: cli.case_insensitive_output,
            },
            report_dir: cli
                .report_dir
                .clone()
                .or(settings.report_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            report_format: cli.report_format.unwrap_or(settings.report_format),
            algorithm: cli.algorithm.unwrap_or(settings.algorithm),
            io_threads: cli.io_threads.unwrap_or(settings.io_threads),
            sequential_threshold: cli
                .sequential_threshold
                .unwrap_or(settings.sequential_threshold),
            filter,
            follow_symlinks: cli.follow_symlinks || settings.follow_symlinks,
            show_progress: !cli.quiet && !cli.no_progress,
            color: !cli.no_color,
            quiet: cli.quiet,
        }
    }

    /// Finder configuration for this run (without shutdown or progress hooks).
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_filter(self.filter.clone())
            .with_follow_symlinks(self.follow_symlinks)
            .with_algorithm(self.algorithm)
            .with_io_threads(self.io_threads)
            .with_sequential_threshold(self.sequential_threshold)
    }
}
