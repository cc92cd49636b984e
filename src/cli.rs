//! Command-line interface definitions.
//!
//! Options that can also come from the config file are `Option`s here so that
//! an absent flag falls through to the layered settings.
//!
//! ```bash
//! # Report only, written to the current directory
//! uniquify ~/Pictures
//!
//! # Report plus a deduplicated copy of the tree
//! uniquify ~/Pictures -o ~/Pictures-unique --clean-output
//!
//! # Also write the duplicates-only report, as JSON, with SHA-256
//! uniquify ~/Pictures --duplicate-report --report-format json --algorithm sha256
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::output::ReportFormat;
use crate::placement::CollisionPolicy;
use crate::scanner::FingerprintAlgorithm;

/// Find byte-identical images in a directory tree.
///
/// uniquify fingerprints every image under PATH, writes a report of the
/// groups of identical files and, with --output, copies one file per group
/// (plus every non-image file) into a new tree.
#[derive(Debug, Parser)]
#[command(name = "uniquify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to deduplicate
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Copy unique files into this directory, mirroring the input layout
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Empty the output directory before placing files
    #[arg(long, requires = "output")]
    pub clean_output: bool,

    /// What to do when two files map to the same output path
    #[arg(long, value_enum, default_value = "fail")]
    pub on_collision: CollisionPolicy,

    /// Treat output paths differing only by case as colliding
    #[arg(long, requires = "output")]
    pub case_insensitive_output: bool,

    /// Do not write the full report
    #[arg(long)]
    pub no_report: bool,

    /// Also write a report listing only files that have duplicates
    #[arg(long)]
    pub duplicate_report: bool,

    /// Directory for report files [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Report file format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub report_format: Option<ReportFormat>,

    /// Content digest used as the fingerprint
    #[arg(long, value_enum, value_name = "ALGO")]
    pub algorithm: Option<FingerprintAlgorithm>,

    /// Number of hashing threads (0 = number of CPUs)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Hash sequentially when there are fewer candidates than this
    #[arg(long, value_name = "N")]
    pub sequential_threshold: Option<usize>,

    /// Extra file extension to treat as an image (repeatable)
    #[arg(short = 'e', long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Consider every file a candidate regardless of extension
    #[arg(long)]
    pub all_files: bool,

    /// Follow symbolic links during the walk
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Configuration file [default: platform config dir]
    #[arg(long, value_name = "FILE", env = "UNIQUIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}
