//! Progress endpoints
//!
//! `POST /api/progress` merges a patch of SCORM values into the record for a
//! (user, course) pair. `GET /api/progress/:userId/:courseId` returns that
//! record as a one-element array, or an empty array when nothing was stored.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use lxp_common::ProgressRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Body of `POST /api/progress`
///
/// Fields are optional at the serde level so that absent fields produce the
/// same 400 as empty ones.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub progress_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// One element of the `GET /api/progress/...` array
#[derive(Debug, Serialize)]
pub struct ProgressEntry {
    pub user_id: String,
    pub course_id: String,
    #[serde(flatten)]
    pub record: ProgressRecord,
}

/// POST /api/progress
pub async fn save_progress(
    State(state): State<AppState>,
    payload: Result<Json<SaveProgressRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let user_id = request.user_id.filter(|s| !s.is_empty());
    let course_id = request.course_id.filter(|s| !s.is_empty());
    let progress_data = request.progress_data.filter(|v| !v.is_null());

    let (Some(user_id), Some(course_id), Some(progress_data)) = (user_id, course_id, progress_data)
    else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    let Value::Object(patch) = progress_data else {
        return Err(ApiError::BadRequest("progressData must be a JSON object".to_string()));
    };

    debug!("Progress for {}/{}: {} keys", user_id, course_id, patch.len());
    state.progress.record_progress(&user_id, &course_id, patch)?;

    Ok(Json(MessageResponse {
        message: "Progress saved successfully".to_string(),
    }))
}

/// GET /api/progress/:userId/:courseId
pub async fn get_progress(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<ProgressEntry>>> {
    let entries = state
        .progress
        .read_progress(&user_id, &course_id)?
        .map(|record| ProgressEntry {
            user_id,
            course_id,
            record,
        })
        .into_iter()
        .collect();

    Ok(Json(entries))
}

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/api/progress", post(save_progress))
        .route("/api/progress/:user_id/:course_id", get(get_progress))
}
