use chrono::Utc;
use std::fs;
use tempfile::tempdir;
use uniquify::duplicates::DuplicateFinder;
use uniquify::output::{to_rows, ReportFormat, ReportKind, ReportWriter};

fn scenario() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.jpg"), b"same").unwrap();
    fs::write(dir.path().join("b.jpg"), b"same").unwrap();
    fs::write(dir.path().join("c.jpg"), b"different").unwrap();
    fs::write(dir.path().join("notes.txt"), b"text").unwrap();
    dir
}

#[test]
fn test_full_csv_report_layout() {
    let input = scenario();
    let reports = tempdir().unwrap();

    let (outcome, _) = DuplicateFinder::with_defaults().find(input.path()).unwrap();
    let rows = to_rows(outcome.grouped.entries()).unwrap();
    let path = ReportWriter::new(&rows, ReportFormat::Csv)
        .write_file(reports.path(), ReportKind::Full, Utc::now())
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("uqreport_") && name.ends_with(".csv"));

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    // Header, 3 rows, one separator between the two groups.
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Filename,Path,Link");
    assert_eq!(lines.iter().filter(|l| **l == ",,").count(), 1);
    assert_ne!(lines[1], ",,");
    assert!(lines[1..].iter().all(|l| *l == ",," || l.contains("file://")));
    assert!(!content.contains("notes.txt"));
}

#[test]
fn test_duplicate_csv_report_lists_group_members() {
    let input = scenario();
    let reports = tempdir().unwrap();

    let (outcome, _) = DuplicateFinder::with_defaults().find(input.path()).unwrap();
    let rows = to_rows(outcome.grouped.duplicates()).unwrap();
    assert_eq!(rows.len(), 2);

    let path = ReportWriter::new(&rows, ReportFormat::Csv)
        .write_file(reports.path(), ReportKind::Duplicates, Utc::now())
        .unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("a.jpg,"));
    assert!(lines[2].starts_with("b.jpg,"));
}

#[test]
fn test_json_report_groups() {
    let input = scenario();
    let (outcome, _) = DuplicateFinder::with_defaults().find(input.path()).unwrap();
    let rows = to_rows(outcome.grouped.entries()).unwrap();

    let json = ReportWriter::new(&rows, ReportFormat::Json).to_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["group_count"], 2);
    assert_eq!(value["row_count"], 3);
    let mut sizes: Vec<usize> = value["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g.as_array().unwrap().len())
        .collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1, 2]);
}

#[test]
fn test_rows_fail_for_file_removed_after_scan() {
    let input = scenario();
    let (outcome, _) = DuplicateFinder::with_defaults().find(input.path()).unwrap();
    fs::remove_file(input.path().join("c.jpg")).unwrap();

    assert!(to_rows(outcome.grouped.entries()).is_err());
}
