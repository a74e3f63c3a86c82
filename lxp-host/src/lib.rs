//! lxp-host library - SCORM package hosting service
//!
//! Accepts zipped SCORM packages, unpacks them under a storage root next to a
//! generated launcher page, serves the result statically, and records the
//! progress the launcher's SCORM API shim reports.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, Method,
    },
    Router,
};
use chrono::{DateTime, Utc};
use lxp_common::config::HostConfig;
use lxp_common::scorm::launcher::PACKAGES_MOUNT;
use lxp_common::scorm::{render_launcher, LauncherOptions};
use lxp_common::ProgressStore;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod api;
pub mod catalog;
pub mod client;
pub mod error;
pub mod ingest;

pub use crate::error::{ApiError, ApiResult};
use crate::ingest::Ingestor;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HostConfig>,
    /// Progress records, behind the storage seam
    pub progress: Arc<dyn ProgressStore>,
    /// Package ingestion, holding the rendered launcher
    pub ingestor: Arc<Ingestor>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: HostConfig, progress: Arc<dyn ProgressStore>) -> Self {
        let launcher = render_launcher(&LauncherOptions {
            default_user_id: config.default_user_id.clone(),
            ..LauncherOptions::default()
        });
        let ingestor = Ingestor::new(config.storage_root.clone(), config.cleanup_depth, launcher);

        Self {
            config: Arc::new(config),
            progress,
            ingestor: Arc::new(ingestor),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ]);

    let packages = ServeDir::new(&state.config.storage_root);

    Router::new()
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .merge(api::progress_routes())
        .merge(api::course_routes())
        .merge(api::upload_routes(state.config.max_upload_bytes))
        .nest_service(PACKAGES_MOUNT, packages)
        .layer(DefaultBodyLimit::max(state.config.max_json_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
