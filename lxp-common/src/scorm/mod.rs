//! SCORM runtime support: entry-point discovery, the API shim and the
//! launcher page that carries both into the browser.

pub mod entry_point;
pub mod launcher;
pub mod runtime;

pub use entry_point::{resolve_entry_point, EntryPoint, EntryProbe, EntrySource, FsProbe};
pub use launcher::{launch_url, render_launcher, LauncherOptions, LAUNCHER_FILE_NAME};
pub use runtime::{
    LifecycleEvent, ProgressSink, ProgressUpdate, Scorm2004, ScormRuntime, SessionContext,
    StoreSink,
};
