//! Package upload endpoint
//!
//! `POST /api/upload-scorm` takes a multipart form with the archive in the
//! `scormPackage` field plus `courseName` and `courseId` text fields. The
//! archive is streamed to the temp directory, ingested, and the temp file is
//! removed whatever the outcome.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::ingest::TempArchive;
use crate::AppState;

/// Multipart field carrying the archive
pub const PACKAGE_FIELD: &str = "scormPackage";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub course_id: String,
    pub launch_url: String,
    pub entry_point: String,
}

fn malformed(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Malformed upload: {e}"))
}

/// POST /api/upload-scorm
pub async fn upload_scorm(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut archive: Option<TempArchive> = None;
    let mut course_name: Option<String> = None;
    let mut course_id: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            PACKAGE_FIELD => {
                let original = field.file_name().unwrap_or("package.zip").to_string();
                let (temp, mut file) =
                    TempArchive::create(&state.config.temp_dir, &original).await?;

                while let Some(chunk) = field.chunk().await.map_err(malformed)? {
                    file.write_all(&chunk).await?;
                }
                file.flush().await?;

                info!("Upload received: {}", original);
                archive = Some(temp);
            }
            "courseName" => course_name = Some(field.text().await.map_err(malformed)?),
            "courseId" => course_id = Some(field.text().await.map_err(malformed)?),
            other => warn!("Ignoring unexpected upload field: {}", other),
        }
    }

    let Some(archive) = archive else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    let course_name = course_name.unwrap_or_default();
    let course_id = course_id.unwrap_or_default();
    if course_name.is_empty() || course_id.is_empty() {
        return Err(ApiError::BadRequest(
            "Course name and ID are required".to_string(),
        ));
    }

    let outcome = state
        .ingestor
        .ingest(archive.path(), &course_id, &course_name)
        .await?;
    drop(archive);

    Ok(Json(UploadResponse {
        message: "SCORM package uploaded and processed successfully".to_string(),
        course_id: outcome.course_id,
        launch_url: outcome.launch_url,
        entry_point: outcome.entry_point.file,
    }))
}

/// Upload route with its own body limit, independent of the JSON limit
pub fn upload_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/api/upload-scorm",
        post(upload_scorm).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}
