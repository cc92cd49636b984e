use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;
use uniquify::cli::Cli;
use uniquify::config::{ConfigError, RunConfig, Settings};
use uniquify::output::ReportFormat;
use uniquify::scanner::FingerprintAlgorithm;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ENV_VARS: &[&str] = &[
    "UNIQUIFY_IO_THREADS",
    "UNIQUIFY_ALGORITHM",
    "UNIQUIFY_REPORT_FORMAT",
    "UNIQUIFY_FOLLOW_SYMLINKS",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(dir: &std::path::Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
io_threads = 2
sequential_threshold = 32
algorithm = "sha256"
extra_extensions = ["raw", ".CR2"]
report_format = "json"
report_dir = "/tmp/uq-reports"
follow_symlinks = true
"#,
    );

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert_eq!(settings.io_threads, 2);
    assert_eq!(settings.sequential_threshold, 32);
    assert_eq!(settings.algorithm, FingerprintAlgorithm::Sha256);
    assert_eq!(settings.extra_extensions, vec!["raw", ".CR2"]);
    assert_eq!(settings.report_format, ReportFormat::Json);
    assert_eq!(settings.report_dir, Some(PathBuf::from("/tmp/uq-reports")));
    assert!(settings.follow_symlinks);
}

#[test]
fn test_config_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "io_threads = 2\nalgorithm = \"sha256\"\n");

    std::env::set_var("UNIQUIFY_IO_THREADS", "12");
    let settings = Settings::load(Some(path.as_path()));
    clear_env();

    let settings = settings.unwrap();
    assert_eq!(settings.io_threads, 12);
    assert_eq!(settings.algorithm, FingerprintAlgorithm::Sha256);
}

#[test]
fn test_config_hierarchy_defaults_file_env_cli() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "io_threads = 2\nreport_format = \"json\"\nalgorithm = \"sha256\"\n",
    );

    std::env::set_var("UNIQUIFY_REPORT_FORMAT", "csv");
    let settings = Settings::load(Some(path.as_path()));
    clear_env();

    let cli = Cli::try_parse_from(["uniquify", "/photos", "--io-threads", "5"]).unwrap();
    let config = RunConfig::from_cli(&cli, settings.unwrap());

    // default
    assert_eq!(config.sequential_threshold, 8);
    // file
    assert_eq!(config.algorithm, FingerprintAlgorithm::Sha256);
    // env over file
    assert_eq!(config.report_format, ReportFormat::Csv);
    // cli over file
    assert_eq!(config.io_threads, 5);
}

#[test]
fn test_config_unknown_field_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "folow_symlinks = true\n");

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert!(!settings.follow_symlinks);
}

#[test]
fn test_config_invalid_value_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "algorithm = \"md5\"\n");

    let result = Settings::load(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_config_missing_explicit_file() {
    let dir = tempdir().unwrap();
    let result = Settings::load(Some(dir.path().join("absent.toml").as_path()));
    assert!(matches!(result, Err(ConfigError::MissingFile(_))));
}
