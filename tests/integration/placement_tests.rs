use filetime::FileTime;
use std::fs;
use tempfile::tempdir;
use uniquify::duplicates::DuplicateFinder;
use uniquify::placement::{
    prepare_output, CollisionPolicy, PlacementError, PlacementOptions, PlacementPlan,
};

#[test]
fn test_place_representatives_and_passthrough() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let sub = input.path().join("album");
    fs::create_dir(&sub).unwrap();
    fs::write(input.path().join("a.jpg"), b"same").unwrap();
    fs::write(sub.join("b.jpg"), b"same").unwrap();
    fs::write(sub.join("c.jpg"), b"other").unwrap();
    fs::write(sub.join("notes.txt"), b"notes").unwrap();

    let mtime = FileTime::from_unix_time(1_234_567_890, 0);
    filetime::set_file_mtime(sub.join("c.jpg"), mtime).unwrap();

    let (outcome, _) = DuplicateFinder::with_defaults().find(input.path()).unwrap();
    let plan = PlacementPlan::from_outcome(&outcome, &PlacementOptions::default()).unwrap();
    assert_eq!(plan.len(), 3);

    let report = plan.execute(output.path());
    assert_eq!(report.copied, 3);
    assert!(report.failures.is_empty());

    let placed_a = output.path().join("a.jpg").exists();
    let placed_b = output.path().join("album/b.jpg").exists();
    assert!(placed_a ^ placed_b, "exactly one copy of the duplicate is placed");
    assert!(output.path().join("album/c.jpg").exists());
    assert_eq!(
        fs::read(output.path().join("album/notes.txt")).unwrap(),
        b"notes"
    );

    let copied = fs::metadata(output.path().join("album/c.jpg")).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&copied), mtime);
}

#[test]
fn test_case_collision_detected_before_copying() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("Photo.jpg"), b"one").unwrap();
    fs::write(input.path().join("photo.jpg"), b"two").unwrap();

    let (outcome, _) = DuplicateFinder::with_defaults().find(input.path()).unwrap();
    let options = PlacementOptions {
        policy: CollisionPolicy::Fail,
        case_insensitive: true,
    };
    let result = PlacementPlan::from_outcome(&outcome, &options);

    assert!(matches!(
        result,
        Err(PlacementError::DestinationCollision { .. })
    ));
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn test_case_collision_suffix_policy() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("Photo.jpg"), b"one").unwrap();
    fs::write(input.path().join("photo.jpg"), b"two").unwrap();

    let (outcome, _) = DuplicateFinder::with_defaults().find(input.path()).unwrap();
    let options = PlacementOptions {
        policy: CollisionPolicy::Suffix,
        case_insensitive: true,
    };
    let report = PlacementPlan::from_outcome(&outcome, &options)
        .unwrap()
        .execute(output.path());

    assert_eq!(report.copied, 2);
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 2);
}

#[test]
fn test_prepare_output_rejects_nested_output() {
    let input = tempdir().unwrap();
    let nested = input.path().join("deduped");
    let result = prepare_output(&nested, input.path(), false);
    assert!(matches!(result, Err(PlacementError::OutputInsideInput { .. })));
}

#[test]
fn test_prepare_output_cleans_when_asked() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(output.path().join("leftover.jpg"), b"old").unwrap();

    prepare_output(output.path(), input.path(), false).unwrap();
    assert!(output.path().join("leftover.jpg").exists());

    prepare_output(output.path(), input.path(), true).unwrap();
    assert!(!output.path().join("leftover.jpg").exists());
}
