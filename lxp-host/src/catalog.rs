//! Read-only view over the storage root
//!
//! Each subdirectory of the storage root is a course. Its display name comes
//! from the `<title>` of an optional `meta.xml` and defaults to the directory
//! name. A missing storage root reads as an empty catalog.

use std::io;
use std::path::Path;

use lxp_common::scorm::launch_url;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Optional per-course metadata file
pub const METADATA_FILE: &str = "meta.xml";

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title>(.*?)</title>").expect("title pattern is valid"));

/// One entry of `GET /api/courses`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    pub launch_url: String,
}

/// Body of `GET /api/courses/:courseId/exists`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatus {
    pub course_id: String,
    pub exists: bool,
    pub launch_url: Option<String>,
}

/// Title carried by a metadata document, if any
pub fn extract_title(metadata: &str) -> Option<String> {
    TITLE
        .captures(metadata)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|title| !title.is_empty())
}

async fn course_name(course_dir: &Path, course_id: &str) -> String {
    match tokio::fs::read_to_string(course_dir.join(METADATA_FILE)).await {
        Ok(content) => extract_title(&content).unwrap_or_else(|| course_id.to_string()),
        Err(_) => {
            debug!("No metadata found for course: {}", course_id);
            course_id.to_string()
        }
    }
}

/// Enumerate courses under `storage_root`, sorted by id
pub async fn list_courses(storage_root: &Path) -> io::Result<Vec<CourseSummary>> {
    let mut entries = match tokio::fs::read_dir(storage_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut courses = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let id = entry.file_name().to_string_lossy().into_owned();
        let name = course_name(&entry.path(), &id).await;
        courses.push(CourseSummary {
            launch_url: launch_url(&id),
            id,
            name,
        });
    }

    courses.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(courses)
}

/// Is there an extracted course directory for `course_id`?
pub async fn course_status(storage_root: &Path, course_id: &str) -> CourseStatus {
    let exists = tokio::fs::metadata(storage_root.join(course_id))
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);

    CourseStatus {
        course_id: course_id.to_string(),
        exists,
        launch_url: exists.then(|| launch_url(course_id)),
    }
}
