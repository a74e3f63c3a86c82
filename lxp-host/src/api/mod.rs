//! HTTP API handlers for lxp-host

pub mod courses;
pub mod health;
pub mod progress;
pub mod ui;
pub mod upload;

pub use courses::course_routes;
pub use health::health_routes;
pub use progress::progress_routes;
pub use ui::ui_routes;
pub use upload::upload_routes;
