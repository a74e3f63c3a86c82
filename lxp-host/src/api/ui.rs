//! Status page at `/`

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::catalog;
use crate::AppState;

pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(root_page))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Endpoint overview plus links to every extracted course
async fn root_page(State(state): State<AppState>) -> impl IntoResponse {
    let courses_list = match catalog::list_courses(&state.config.storage_root).await {
        Ok(courses) if courses.is_empty() => "<li>No courses available</li>".to_string(),
        Ok(courses) => courses
            .iter()
            .map(|course| {
                format!(
                    r#"<li><a href="{}" target="_blank">{}</a> <small>({})</small></li>"#,
                    escape_html(&course.launch_url),
                    escape_html(&course.name),
                    escape_html(&course.id)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => format!("<li>Error listing courses: {}</li>", escape_html(&e.to_string())),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SCORM LXP Backend</title>
    <style>
        body {{ font-family: system-ui, -apple-system, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }}
        h1 {{ color: #333; border-bottom: 2px solid #0066cc; padding-bottom: 10px; }}
        li {{ margin-bottom: 8px; }}
        .endpoint {{ background: #f5f5f5; padding: 4px 8px; border-radius: 4px; font-family: monospace; }}
        a {{ color: #0066cc; text-decoration: none; }}
    </style>
</head>
<body>
    <h1>SCORM LXP Backend</h1>
    <p>API Endpoints:</p>
    <ul>
        <li><span class="endpoint">POST /api/progress</span> - Save progress data</li>
        <li><span class="endpoint">GET /api/progress/:userId/:courseId</span> - Progress for one user and course</li>
        <li><span class="endpoint">POST /api/upload-scorm</span> - Upload and process a SCORM package</li>
        <li><span class="endpoint">GET /api/courses</span> - List available courses</li>
        <li><span class="endpoint">GET /api/courses/:courseId/exists</span> - Check whether a course exists</li>
        <li><span class="endpoint">GET /health</span> - Health check</li>
    </ul>
    <h2>Available SCORM courses:</h2>
    <ul>
        {courses_list}
    </ul>
    <p><small>lxp-host v{version}</small></p>
</body>
</html>
"#,
        version = env!("CARGO_PKG_VERSION"),
    ))
}
