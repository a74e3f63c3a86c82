//! Course query endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::error;

use crate::catalog::{self, CourseStatus, CourseSummary};
use crate::error::{ApiError, ApiResult};
use crate::ingest::is_safe_course_id;
use crate::AppState;

/// GET /api/courses
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<CourseSummary>>> {
    let courses = catalog::list_courses(&state.config.storage_root)
        .await
        .map_err(|e| {
            error!("Error listing courses: {}", e);
            ApiError::Internal("Failed to list courses".to_string())
        })?;

    Ok(Json(courses))
}

/// GET /api/courses/:course_id/exists
pub async fn course_exists(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseStatus>> {
    if !is_safe_course_id(&course_id) {
        return Err(ApiError::BadRequest(format!("Invalid course ID: {course_id}")));
    }

    Ok(Json(catalog::course_status(&state.config.storage_root, &course_id).await))
}

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:course_id/exists", get(course_exists))
}
