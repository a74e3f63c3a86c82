//! Course package ingestion
//!
//! `ingest` turns an uploaded zip into a served course:
//!
//! 1. Open the archive and read its central directory. Nothing on disk is
//!    touched until this succeeds, so a corrupt upload leaves the previous
//!    version of the course in place.
//! 2. Ensure the storage root exists; clear or create `<root>/<course_id>`.
//! 3. Unpack every entry, overwriting on name collision.
//! 4. Write the launcher document next to the content.
//! 5. Resolve the entry point over the unpacked tree.
//!
//! Clearing honors `cleanup_depth`: at 0 only top-level files go and nested
//! directories from the previous upload survive alongside the new ones.
//! Each level above 0 descends one directory further and removes
//! directories left empty.
//!
//! Concurrent uploads to the same course id are not serialized.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use lxp_common::scorm::{launch_url, resolve_entry_point, EntryPoint, FsProbe, LAUNCHER_FILE_NAME};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Ingestion failures, in pipeline order
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to read uploaded package")]
    Upload(#[source] io::Error),

    #[error("Failed to create course directory")]
    Directory(#[source] io::Error),

    #[error("Failed to extract SCORM package")]
    Extract(String),

    #[error("Failed to create launcher file")]
    Launcher(#[source] io::Error),

    #[error("Failed to process SCORM package")]
    Task(String),
}

impl IngestError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestError::InvalidInput(_))
    }

    /// Description of the underlying cause, if there is one
    pub fn details(&self) -> Option<String> {
        match self {
            IngestError::InvalidInput(_) => None,
            IngestError::Upload(e) | IngestError::Directory(e) | IngestError::Launcher(e) => {
                Some(e.to_string())
            }
            IngestError::Extract(msg) | IngestError::Task(msg) => Some(msg.clone()),
        }
    }
}

/// Course ids become directory names, so they must be one plain path component
pub fn is_safe_course_id(course_id: &str) -> bool {
    !course_id.is_empty()
        && !course_id.starts_with('.')
        && !course_id.contains(['/', '\\', '\0'])
}

/// Outcome of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub course_id: String,
    pub launch_url: String,
    pub entry_point: EntryPoint,
    pub files_extracted: usize,
    pub files_removed: usize,
}

/// Unpacks course archives under a storage root
#[derive(Debug, Clone)]
pub struct Ingestor {
    storage_root: PathBuf,
    cleanup_depth: u32,
    launcher: Arc<str>,
}

impl Ingestor {
    pub fn new(
        storage_root: impl Into<PathBuf>,
        cleanup_depth: u32,
        launcher: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            storage_root: storage_root.into(),
            cleanup_depth,
            launcher: launcher.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// The launcher document written into every course
    pub fn launcher(&self) -> &str {
        &self.launcher
    }

    pub fn course_dir(&self, course_id: &str) -> PathBuf {
        self.storage_root.join(course_id)
    }

    /// Replace the course `course_id` with the contents of `archive`
    pub async fn ingest(
        &self,
        archive: &Path,
        course_id: &str,
        course_name: &str,
    ) -> Result<IngestOutcome, IngestError> {
        if course_id.trim().is_empty() || course_name.trim().is_empty() {
            return Err(IngestError::InvalidInput(
                "Course name and ID are required".to_string(),
            ));
        }
        if !is_safe_course_id(course_id) {
            return Err(IngestError::InvalidInput(format!("Invalid course ID: {course_id}")));
        }

        info!("Ingesting course {} ({})", course_id, course_name);

        let job = UnpackJob {
            archive: archive.to_path_buf(),
            storage_root: self.storage_root.clone(),
            course_dir: self.course_dir(course_id),
            cleanup_depth: self.cleanup_depth,
            launcher: Arc::clone(&self.launcher),
        };
        let (files_removed, files_extracted) = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;

        let entry_point = resolve_entry_point(&FsProbe::new(self.course_dir(course_id))).await;
        info!(
            "✓ Course {} ready: {} files extracted, {} stale files removed, entry point {}",
            course_id, files_extracted, files_removed, entry_point.file
        );

        Ok(IngestOutcome {
            course_id: course_id.to_string(),
            launch_url: launch_url(course_id),
            entry_point,
            files_extracted,
            files_removed,
        })
    }
}

/// Blocking half of ingestion, run off the async executor
struct UnpackJob {
    archive: PathBuf,
    storage_root: PathBuf,
    course_dir: PathBuf,
    cleanup_depth: u32,
    launcher: Arc<str>,
}

impl UnpackJob {
    /// Returns (files removed, files extracted)
    fn run(self) -> Result<(usize, usize), IngestError> {
        let file = File::open(&self.archive).map_err(IngestError::Upload)?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| IngestError::Extract(e.to_string()))?;

        fs::create_dir_all(&self.storage_root).map_err(IngestError::Directory)?;
        let removed = if self.course_dir.is_dir() {
            clear_course_dir(&self.course_dir, self.cleanup_depth).map_err(IngestError::Directory)?
        } else {
            fs::create_dir_all(&self.course_dir).map_err(IngestError::Directory)?;
            0
        };

        debug!("Extracting {} into {}", self.archive.display(), self.course_dir.display());
        let extracted = extract_all(&mut archive, &self.course_dir)?;

        fs::write(self.course_dir.join(LAUNCHER_FILE_NAME), self.launcher.as_bytes())
            .map_err(IngestError::Launcher)?;

        Ok((removed, extracted))
    }
}

/// Remove files from `dir`, descending `depth` levels into subdirectories.
/// A file that cannot be removed is logged and skipped.
pub fn clear_course_dir(dir: &Path, depth: u32) -> io::Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            if depth == 0 {
                continue;
            }
            removed += clear_course_dir(&path, depth - 1)?;
            if fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)?;
            }
        } else {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Error cleaning file {}: {}", path.display(), e),
            }
        }
    }

    Ok(removed)
}

fn extract_all(archive: &mut ZipArchive<File>, dest: &Path) -> Result<usize, IngestError> {
    let extract_err = |e: io::Error| IngestError::Extract(e.to_string());
    let mut written = 0;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| IngestError::Extract(e.to_string()))?;

        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!("Skipping archive entry outside the course directory: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(extract_err)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(extract_err)?;
        }
        let mut out = File::create(&target).map_err(extract_err)?;
        io::copy(&mut entry, &mut out).map_err(extract_err)?;
        written += 1;
    }

    Ok(written)
}

static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Uploaded archive parked in the temp directory; deleted on drop
#[derive(Debug)]
pub struct TempArchive {
    path: PathBuf,
}

impl TempArchive {
    /// Create `<temp_dir>/<unix-millis>-<seq>-<name>` and open it for writing
    pub async fn create(
        temp_dir: &Path,
        original_name: &str,
    ) -> io::Result<(Self, tokio::fs::File)> {
        tokio::fs::create_dir_all(temp_dir).await?;

        let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
        let file_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            seq,
            sanitize_file_name(original_name)
        );
        let path = temp_dir.join(file_name);
        let file = tokio::fs::File::create(&path).await?;

        Ok((Self { path }, file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed temp upload {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Error cleaning up temp file {}: {}", self.path.display(), e),
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "package.zip".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_course_ids() {
        assert!(is_safe_course_id("c1"));
        assert!(is_safe_course_id("intro-to-rust_2026"));
        assert!(!is_safe_course_id(""));
        assert!(!is_safe_course_id(".."));
        assert!(!is_safe_course_id(".hidden"));
        assert!(!is_safe_course_id("a/b"));
        assert!(!is_safe_course_id("a\\b"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("course.zip"), "course.zip");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\my course.zip"), "my_course.zip");
        assert_eq!(sanitize_file_name(".."), "package.zip");
        assert_eq!(sanitize_file_name(""), "package.zip");
    }

    fn tree(root: &Path) {
        fs::write(root.join("old.html"), "old").unwrap();
        fs::create_dir_all(root.join("assets/img")).unwrap();
        fs::write(root.join("assets/app.js"), "js").unwrap();
        fs::write(root.join("assets/img/logo.png"), "png").unwrap();
    }

    #[test]
    fn test_clear_depth_zero_keeps_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        tree(dir.path());

        assert_eq!(clear_course_dir(dir.path(), 0).unwrap(), 1);
        assert!(!dir.path().join("old.html").exists());
        assert!(dir.path().join("assets/app.js").exists());
        assert!(dir.path().join("assets/img/logo.png").exists());
    }

    #[test]
    fn test_clear_depth_one_keeps_second_level() {
        let dir = tempfile::tempdir().unwrap();
        tree(dir.path());

        assert_eq!(clear_course_dir(dir.path(), 1).unwrap(), 2);
        assert!(!dir.path().join("assets/app.js").exists());
        assert!(dir.path().join("assets/img/logo.png").exists());
    }

    #[test]
    fn test_clear_unbounded_empties_directory() {
        let dir = tempfile::tempdir().unwrap();
        tree(dir.path());

        assert_eq!(clear_course_dir(dir.path(), u32::MAX).unwrap(), 3);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_temp_archive_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let (temp, _file) = TempArchive::create(&dir.path().join("uploads"), "pkg.zip")
            .await
            .unwrap();
        let path = temp.path().to_path_buf();

        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("-pkg.zip"));
        drop(temp);
        assert!(!path.exists());
    }
}
