//! Launcher document rendering
//!
//! Every course directory receives the same `scorm-launcher.html`: a page that
//! embeds the course in an iframe, resolves the entry point in the browser and
//! publishes `window.API` / `window.API_1484_11`. The page is rendered once
//! from `launcher.html` with the resolver constants from
//! [`entry_point`](super::entry_point), so browser and server agree on the
//! candidate order.

use serde::Serialize;

use super::entry_point::{DEFAULT_ENTRY, ENTRY_CANDIDATES, LISTING_LINK_PATTERN};

/// File name the launcher is written under inside each course directory
pub const LAUNCHER_FILE_NAME: &str = "scorm-launcher.html";

/// URL prefix extracted courses are served under
pub const PACKAGES_MOUNT: &str = "/scorm-packages";

/// Progress write endpoint the shim posts to
pub const PROGRESS_ENDPOINT: &str = "/api/progress";

const LAUNCHER_TEMPLATE: &str = include_str!("launcher.html");

/// Values substituted into the launcher template
#[derive(Debug, Clone)]
pub struct LauncherOptions {
    pub default_user_id: String,
    pub progress_endpoint: String,
}

impl Default for LauncherOptions {
    fn default() -> Self {
        Self {
            default_user_id: "test-user".to_string(),
            progress_endpoint: PROGRESS_ENDPOINT.to_string(),
        }
    }
}

/// Public URL of a course's launcher
pub fn launch_url(course_id: &str) -> String {
    format!("{PACKAGES_MOUNT}/{course_id}/{LAUNCHER_FILE_NAME}")
}

/// Produce the launcher document
pub fn render_launcher(options: &LauncherOptions) -> String {
    LAUNCHER_TEMPLATE
        .replace("{{ENTRY_CANDIDATES}}", &js_literal(&ENTRY_CANDIDATES))
        .replace("{{DEFAULT_ENTRY}}", &js_literal(&DEFAULT_ENTRY))
        .replace("{{LAUNCHER_FILE}}", &js_literal(&LAUNCHER_FILE_NAME))
        .replace("{{LISTING_PATTERN}}", &js_literal(&LISTING_LINK_PATTERN))
        .replace("{{PROGRESS_ENDPOINT}}", &js_literal(&options.progress_endpoint))
        .replace("{{DEFAULT_USER_ID}}", &js_literal(&options.default_user_id))
}

/// JSON literal safe to place inside an inline `<script>`
fn js_literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}
