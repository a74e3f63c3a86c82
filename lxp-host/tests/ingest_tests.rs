//! Ingestion pipeline tests, below the HTTP layer

mod helpers;

use std::path::Path;

use lxp_common::scorm::{render_launcher, EntrySource, LauncherOptions};
use lxp_host::ingest::{IngestError, Ingestor};
use tempfile::TempDir;

use helpers::zip_bytes;

struct Fixture {
    dir: TempDir,
    ingestor: Ingestor,
}

impl Fixture {
    fn new(cleanup_depth: u32) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let launcher = render_launcher(&LauncherOptions::default());
        let ingestor = Ingestor::new(dir.path().join("courses"), cleanup_depth, launcher);
        Self { dir, ingestor }
    }

    /// Write a zip to disk and return its path
    fn archive(&self, name: &str, entries: &[(&str, &str)]) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, zip_bytes(entries)).unwrap();
        path
    }

    fn course(&self, id: &str) -> std::path::PathBuf {
        self.ingestor.course_dir(id)
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_ingest_creates_storage_root() {
    let fx = Fixture::new(0);
    assert!(!fx.ingestor.storage_root().exists());

    let archive = fx.archive("c1.zip", &[("index.html", "hello")]);
    let outcome = fx.ingestor.ingest(&archive, "c1", "Course One").await.unwrap();

    assert_eq!(outcome.course_id, "c1");
    assert_eq!(outcome.launch_url, "/scorm-packages/c1/scorm-launcher.html");
    assert_eq!(outcome.files_extracted, 1);
    assert_eq!(outcome.files_removed, 0);
    assert_eq!(outcome.entry_point.file, "index.html");
    assert_eq!(outcome.entry_point.source, EntrySource::Candidate);
    assert_eq!(read(&fx.course("c1").join("index.html")), "hello");
}

#[tokio::test]
async fn test_entry_point_follows_candidate_order() {
    let fx = Fixture::new(0);

    let archive = fx.archive(
        "c1.zip",
        &[
            ("launch.html", "l"),
            ("story.html", "s"),
            ("index_lms.html", "i"),
        ],
    );
    let outcome = fx.ingestor.ingest(&archive, "c1", "Course").await.unwrap();
    assert_eq!(outcome.entry_point.file, "index_lms.html");

    let archive = fx.archive("c2.zip", &[("launch.html", "l"), ("story.html", "s")]);
    let outcome = fx.ingestor.ingest(&archive, "c2", "Course").await.unwrap();
    assert_eq!(outcome.entry_point.file, "story.html");
}

#[tokio::test]
async fn test_entry_point_from_directory_listing() {
    let fx = Fixture::new(0);

    let archive = fx.archive("c1.zip", &[("lesson_one.html", "x"), ("style.css", "y")]);
    let outcome = fx.ingestor.ingest(&archive, "c1", "Course").await.unwrap();

    assert_eq!(outcome.entry_point.file, "lesson_one.html");
    assert_eq!(outcome.entry_point.source, EntrySource::Listing);
}

#[tokio::test]
async fn test_launcher_is_never_the_entry_point() {
    let fx = Fixture::new(0);

    // slides.html sorts after scorm-launcher.html in the course directory
    let archive = fx.archive("c1.zip", &[("slides.html", "s")]);
    let outcome = fx.ingestor.ingest(&archive, "c1", "Course").await.unwrap();

    assert_ne!(outcome.entry_point.file, "scorm-launcher.html");
    assert_eq!(outcome.entry_point.file, "slides.html");
    assert_eq!(outcome.entry_point.source, EntrySource::Listing);

    let archive = fx.archive("c2.zip", &[("notes.txt", "n")]);
    let outcome = fx.ingestor.ingest(&archive, "c2", "Course").await.unwrap();
    assert_eq!(outcome.entry_point.file, "index.html");
    assert_eq!(outcome.entry_point.source, EntrySource::Fallback);
}

#[tokio::test]
async fn test_every_course_gets_the_same_launcher() {
    let fx = Fixture::new(0);

    let a = fx.archive("a.zip", &[("story.html", "a")]);
    let b = fx.archive("b.zip", &[("index.html", "b")]);
    fx.ingestor.ingest(&a, "a", "A").await.unwrap();
    fx.ingestor.ingest(&b, "b", "B").await.unwrap();

    let launcher_a = read(&fx.course("a").join("scorm-launcher.html"));
    let launcher_b = read(&fx.course("b").join("scorm-launcher.html"));
    assert_eq!(launcher_a, launcher_b);
    assert_eq!(launcher_a, fx.ingestor.launcher());
}

#[tokio::test]
async fn test_reupload_keeps_nested_directories_at_depth_zero() {
    let fx = Fixture::new(0);

    let first = fx.archive(
        "v1.zip",
        &[("old.html", "old"), ("lib/", ""), ("lib/old.js", "old")],
    );
    fx.ingestor.ingest(&first, "c1", "Course").await.unwrap();

    let second = fx.archive("v2.zip", &[("story.html", "new"), ("lib/new.js", "new")]);
    let outcome = fx.ingestor.ingest(&second, "c1", "Course").await.unwrap();

    // old.html and the previous launcher
    assert_eq!(outcome.files_removed, 2);

    let course = fx.course("c1");
    assert!(!course.join("old.html").exists());
    assert!(course.join("lib/old.js").exists(), "Nested stale file survives");
    assert!(course.join("lib/new.js").exists());
    assert!(course.join("story.html").exists());
}

#[tokio::test]
async fn test_reupload_clears_nested_directories_with_depth() {
    let fx = Fixture::new(u32::MAX);

    let first = fx.archive(
        "v1.zip",
        &[("old.html", "old"), ("lib/", ""), ("lib/old.js", "old"), ("media/a.mp3", "a")],
    );
    fx.ingestor.ingest(&first, "c1", "Course").await.unwrap();

    let second = fx.archive("v2.zip", &[("story.html", "new"), ("lib/new.js", "new")]);
    fx.ingestor.ingest(&second, "c1", "Course").await.unwrap();

    let course = fx.course("c1");
    assert!(!course.join("old.html").exists());
    assert!(!course.join("lib/old.js").exists());
    assert!(!course.join("media").exists(), "Emptied directory is removed");
    assert!(course.join("lib/new.js").exists());
}

#[tokio::test]
async fn test_corrupt_archive_leaves_course_untouched() {
    let fx = Fixture::new(0);

    let good = fx.archive("good.zip", &[("story.html", "v1")]);
    fx.ingestor.ingest(&good, "c1", "Course").await.unwrap();

    let corrupt = fx.dir.path().join("corrupt.zip");
    std::fs::write(&corrupt, b"PK but not really").unwrap();
    let err = fx.ingestor.ingest(&corrupt, "c1", "Course").await.unwrap_err();

    assert!(matches!(err, IngestError::Extract(_)));
    assert!(!err.is_client_error());
    assert!(err.details().is_some());
    assert_eq!(read(&fx.course("c1").join("story.html")), "v1");
}

#[tokio::test]
async fn test_missing_archive_is_upload_error() {
    let fx = Fixture::new(0);

    let err = fx
        .ingestor
        .ingest(&fx.dir.path().join("absent.zip"), "c1", "Course")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Upload(_)));
    assert!(!fx.course("c1").exists());
}

#[tokio::test]
async fn test_entries_escaping_course_dir_are_skipped() {
    let fx = Fixture::new(0);

    let archive = fx.archive(
        "evil.zip",
        &[("../escaped.html", "evil"), ("story.html", "ok")],
    );
    let outcome = fx.ingestor.ingest(&archive, "c1", "Course").await.unwrap();

    assert_eq!(outcome.files_extracted, 1);
    assert!(!fx.ingestor.storage_root().join("escaped.html").exists());
    assert!(fx.course("c1").join("story.html").exists());
}

#[tokio::test]
async fn test_invalid_course_ids_are_rejected() {
    let fx = Fixture::new(0);
    let archive = fx.archive("c.zip", &[("index.html", "x")]);

    for id in ["", "  ", "..", ".git", "a/b", "a\\b"] {
        let err = fx.ingestor.ingest(&archive, id, "Course").await.unwrap_err();
        assert!(err.is_client_error(), "id {id:?} should be rejected");
    }

    let err = fx.ingestor.ingest(&archive, "c1", "").await.unwrap_err();
    assert_eq!(err.to_string(), "Course name and ID are required");
    assert!(!fx.ingestor.storage_root().exists());
}
