//! Integration tests for organizing a folder end to end.
//!
//! Tests cover:
//! - Planning and executing against a CSV reference list
//! - Sidecars following their video
//! - Idempotence of a second run
//! - Undo restoring the original tree
//! - Rename collisions diverted to the duplicates folder

use episode_organizer::core::executor::ExecuteOptions;
use episode_organizer::core::journal::{latest_restore_point, list_restore_points};
use episode_organizer::core::session::Session;
use episode_organizer::models::config::Config;
use episode_organizer::models::plan::{Category, DuplicateReason};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

const SERIES: &str = "Thomas & Friends (1984)";

const REFERENCE: &str = "\
Number,Title,SeriesEpisode,AirDate,AltTitles
001,Thomas & Gordon,s01e01,1984-10-09,
002,Edward's Day Out,s01e02,1984-10-16,
003,Edward & Gordon,s01e03,1984-10-23,
,The Movie,m01,2000-07-14,Thomas and the Magic Railroad
";

fn touch(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Build `<temp>/<series>` with a reference list under `data/`.
fn library(temp: &TempDir) -> PathBuf {
    let root = temp.path().join(SERIES);
    touch(&root.join("data/episodes.csv"), REFERENCE);
    root
}

fn open(root: &Path) -> Session {
    Session::open(root, &root.join("data/episodes.csv"), Config::default()).unwrap()
}

fn quiet(session: &Session) -> ExecuteOptions {
    ExecuteOptions {
        show_progress: false,
        ..session.execute_options()
    }
}

/// Every file under `root` except journals, relative to `root`.
fn files(root: &Path) -> BTreeSet<PathBuf> {
    let journals = root.join("cleanup/restore_points");
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && !e.path().starts_with(&journals))
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

fn populate(root: &Path) {
    touch(&root.join("001 - Thomas & Gordon.mp4"), "ep1");
    touch(&root.join("001 - Thomas & Gordon.en.srt"), "sub");
    touch(&root.join("001 - Thomas & Gordon-thumb.jpg"), "img");
    touch(&root.join("downloads/Edward's Day Out.mkv"), "ep2");
    touch(&root.join("downloads/random clip.mkv"), "???");
    touch(&root.join("The Movie.mkv"), "movie");
}

#[test]
fn test_organize_folder() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    populate(&root);

    let mut session = open(&root);
    let plan = session.build_plan().unwrap();
    assert_eq!(plan.count(Category::ProposedRename), 3);
    assert_eq!(plan.count(Category::Unmatched), 1);

    let options = quiet(&session);
    let report = session.execute(&plan, options).unwrap();
    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(report.renamed, 3);
    assert_eq!(report.unknown_moved, 1);
    assert_eq!(report.sidecars_moved, 2);

    let expected: BTreeSet<PathBuf> = [
        "Season 1/Thomas & Friends (1984) - s01e01 - Thomas & Gordon.mp4",
        "Season 1/Thomas & Friends (1984) - s01e01 - Thomas & Gordon.en.srt",
        "Season 1/Thomas & Friends (1984) - s01e01 - Thomas & Gordon-thumb.jpg",
        "Season 1/Thomas & Friends (1984) - s01e02 - Edward's Day Out.mkv",
        "Movies/Thomas & Friends (1984) - The Movie (2000)/Thomas & Friends (1984) - The Movie (2000).mkv",
        "cleanup/unknown/downloads/random clip.mkv",
        "data/episodes.csv",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(files(session.root()), expected);
    assert!(!session.root().join("downloads").exists());
}

#[test]
fn test_second_run_has_nothing_to_do() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    populate(&root);

    let mut session = open(&root);
    let plan = session.build_plan().unwrap();
    let options = quiet(&session);
    session.execute(&plan, options).unwrap();

    let plan = session.build_plan().unwrap();
    assert_eq!(plan.pending_actions(), 0);
    assert_eq!(plan.count(Category::Skipped), 3);
}

#[test]
fn test_undo_restores_original_tree() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    populate(&root);
    let before = files(&root);

    let mut session = open(&root);
    let plan = session.build_plan().unwrap();
    let options = quiet(&session);
    let report = session.execute(&plan, options).unwrap();
    let journal = report.restore_point.unwrap();
    assert_eq!(list_restore_points(session.root()).unwrap().len(), 1);

    let undo = session.undo_latest(false).unwrap();
    assert!(undo.is_success(), "errors: {:?}", undo.errors);
    assert!(undo.journal_deleted);
    assert!(!journal.exists());
    assert_eq!(latest_restore_point(session.root()).unwrap(), None);

    assert_eq!(files(session.root()), before);
    assert!(session.root().join("downloads").is_dir());
    assert!(!session.root().join("Season 1").exists());
    assert!(!session.root().join("Movies").exists());
    assert!(!session.root().join("cleanup/unknown").exists());
}

#[test]
fn test_rename_collision_moved_aside() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    touch(&root.join("a/001 - Thomas & Gordon.mp4"), "first");
    touch(&root.join("b/Thomas & Gordon.mp4"), "second");

    let mut session = open(&root);
    let plan = session.build_plan().unwrap();
    assert_eq!(plan.count(Category::ProposedRename), 1);
    assert_eq!(plan.count(Category::Duplicate), 1);
    assert_eq!(plan.duplicates[0].reason, DuplicateReason::RenameCollision);

    let options = quiet(&session);
    let report = session.execute(&plan, options).unwrap();
    assert!(report.is_success());

    let root = session.root();
    let target = root.join("Season 1/Thomas & Friends (1984) - s01e01 - Thomas & Gordon.mp4");
    assert_eq!(fs::read_to_string(target).unwrap(), "first");
    assert_eq!(
        fs::read_to_string(root.join("cleanup/duplicates/b/Thomas & Gordon.mp4")).unwrap(),
        "second"
    );
}

#[test]
fn test_series_folder_created_under_other_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("incoming");
    touch(&root.join("data/episodes.csv"), REFERENCE);
    touch(&root.join("s01e03 - Edward & Gordon.avi"), "ep3");

    let config = Config {
        series_name: Some(SERIES.to_string()),
        ..Default::default()
    };
    let mut session = Session::open(&root, &root.join("data/episodes.csv"), config).unwrap();
    let plan = session.build_plan().unwrap();
    let options = quiet(&session);
    session.execute(&plan, options).unwrap();

    assert!(session
        .root()
        .join("Thomas & Friends (1984)/Season 1/Thomas & Friends (1984) - s01e03 - Edward & Gordon.avi")
        .exists());
}

#[test]
fn test_composite_output_is_left_alone() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    touch(&root.join("S01E01-E02.mkv"), "double");

    let mut session = open(&root);
    let plan = session.build_plan().unwrap();
    assert_eq!(plan.count(Category::ProposedRename), 1);
    let options = quiet(&session);
    session.execute(&plan, options).unwrap();

    let organized = session
        .root()
        .join("Season 1/Thomas & Friends (1984) - s01e01e02 - Thomas & Gordon + Edward's Day Out.mkv");
    assert!(organized.exists());

    let plan = session.build_plan().unwrap();
    assert_eq!(plan.pending_actions(), 0);
    assert_eq!(plan.count(Category::Skipped), 1);
    assert_eq!(plan.count(Category::Discrepancy), 0);
}
