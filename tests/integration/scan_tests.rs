use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;
use uniquify::duplicates::{DuplicateFinder, FinderConfig};
use uniquify::output::to_rows;
use uniquify::scanner::{CandidateFilter, FingerprintAlgorithm};

fn write(path: &std::path::Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (outcome, summary) = DuplicateFinder::with_defaults().find(dir.path()).unwrap();

    assert!(outcome.is_empty());
    assert!(outcome.grouped.representatives().is_empty());
    assert!(outcome.grouped.duplicates().is_empty());
    assert!(to_rows(outcome.grouped.entries()).unwrap().is_empty());
    assert_eq!(summary.files_found, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_reference_scenario() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.jpg"), b"same pixels");
    write(&dir.path().join("b.jpg"), b"same pixels");
    write(&dir.path().join("c.jpg"), b"other pixels");
    write(&dir.path().join("notes.txt"), b"shopping list");

    let (outcome, summary) = DuplicateFinder::with_defaults().find(dir.path()).unwrap();

    assert_eq!(summary.candidates_kept, 3);
    assert_eq!(outcome.passthrough.len(), 1);
    assert!(outcome.passthrough[0].path.ends_with("notes.txt"));

    let reps = outcome.grouped.representatives();
    assert_eq!(reps.len(), 2);
    let rep_names: Vec<_> = reps
        .iter()
        .map(|r| r.entry.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    // a.jpg sorts before b.jpg within the shared group.
    assert!(rep_names.contains(&"a.jpg".to_string()));
    assert!(rep_names.contains(&"c.jpg".to_string()));

    let full = to_rows(outcome.grouped.entries()).unwrap();
    assert_eq!(full.len(), 3);
    assert_eq!(full.iter().filter(|r| r.new_group_boundary).count(), 2);

    let dups = to_rows(outcome.grouped.duplicates()).unwrap();
    let dup_names: Vec<_> = dups.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(dup_names, vec!["a.jpg", "b.jpg"]);
    assert!(dups[0].new_group_boundary);
    assert!(!dups[1].new_group_boundary);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("2019").join("summer");
    fs::create_dir_all(&sub).unwrap();
    write(&dir.path().join("beach.png"), b"waves");
    write(&sub.join("beach-copy.PNG"), b"waves");
    write(&sub.join("sunset.png"), b"orange");

    let (outcome, summary) = DuplicateFinder::with_defaults().find(dir.path()).unwrap();

    assert_eq!(summary.candidates_kept, 3);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicates_found, 1);
    assert_eq!(outcome.grouped.representatives().len(), 2);
}

#[test]
fn test_scan_extra_extensions_and_all_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.raw"), b"sensor");
    write(&dir.path().join("b.raw"), b"sensor");
    write(&dir.path().join("c.dat"), b"sensor");

    let (_, defaults) = DuplicateFinder::with_defaults().find(dir.path()).unwrap();
    assert_eq!(defaults.candidates_kept, 0);
    assert_eq!(defaults.passthrough, 3);

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_filter(CandidateFilter::new().with_extra_extensions(["raw"])),
    );
    let (_, extra) = finder.find(dir.path()).unwrap();
    assert_eq!(extra.candidates_kept, 2);
    assert_eq!(extra.duplicates_found, 1);

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_filter(CandidateFilter::new().with_all_files(true)),
    );
    let (outcome, all) = finder.find(dir.path()).unwrap();
    assert_eq!(all.candidates_kept, 3);
    assert_eq!(all.duplicates_found, 2);
    assert_eq!(outcome.grouped.group_count(), 1);
}

#[test]
fn test_scan_algorithms_agree_on_grouping() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        write(&dir.path().join(format!("img{i:02}.gif")), format!("frame{}", i % 4).as_bytes());
    }

    let blake = DuplicateFinder::new(FinderConfig::default());
    let sha = DuplicateFinder::new(FinderConfig::default().with_algorithm(FingerprintAlgorithm::Sha256));

    let (a, _) = blake.find(dir.path()).unwrap();
    let (b, _) = sha.find(dir.path()).unwrap();

    let sizes = |o: &uniquify::duplicates::ScanOutcome| {
        let mut s: Vec<usize> = o.grouped.groups().map(<[_]>::len).collect();
        s.sort_unstable();
        s
    };
    assert_eq!(sizes(&a), vec![3, 3, 3, 3]);
    assert_eq!(sizes(&a), sizes(&b));
}

#[test]
fn test_scan_zero_byte_images_are_duplicates() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1.jpg")).unwrap();
    File::create(dir.path().join("empty2.jpg")).unwrap();

    let (outcome, summary) = DuplicateFinder::with_defaults().find(dir.path()).unwrap();
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(outcome.grouped.duplicates().len(), 2);
}
