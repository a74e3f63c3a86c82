//! SCORM runtime API shim
//!
//! Course content expects a synchronous, always-available API object. The
//! shim answers every call immediately with a fixed SCORM status string and
//! pushes state changes to a [`ProgressSink`] on a detached task. The caller
//! never waits on that write and never learns whether it failed; failures
//! only show up in the log.
//!
//! [`ScormRuntime`] carries the SCORM 1.2 method set (`LMSInitialize`, ...).
//! [`Scorm2004`] exposes the SCORM 2004 names (`Initialize`, ...) and
//! delegates every call to a runtime. `GetValue` always answers empty:
//! stored progress is not fed back into the course.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::progress::{ProgressPatch, ProgressStore};
use crate::Result;

/// Success return for boolean-style SCORM calls
pub const SCORM_TRUE: &str = "true";
/// `GetLastError` answer
pub const NO_ERROR_CODE: &str = "0";
/// `GetErrorString` answer
pub const NO_ERROR_STRING: &str = "No error";
/// `GetDiagnostic` answer
pub const NO_DIAGNOSTIC: &str = "No diagnostic information";
/// Course id used when the launcher path carries none
pub const UNKNOWN_COURSE: &str = "unknown";

/// Lifecycle notification for the page embedding the launcher
///
/// Serializes to the `postMessage` payload the browser launcher sends:
/// `{"type": "SCORM_INITIALIZE", "courseId": "c1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    #[serde(rename = "SCORM_INITIALIZE")]
    Initialize {
        #[serde(rename = "courseId")]
        course_id: String,
    },
    #[serde(rename = "SCORM_FINISH")]
    Finish {
        #[serde(rename = "courseId")]
        course_id: String,
    },
}

/// One progress write, shaped like the `POST /api/progress` body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub user_id: String,
    pub course_id: String,
    pub progress_data: ProgressPatch,
}

/// Destination of progress writes issued by the shim
pub trait ProgressSink: Send + Sync + 'static {
    fn submit(&self, update: ProgressUpdate) -> BoxFuture<'static, Result<()>>;
}

/// Sink writing straight into a progress store
pub struct StoreSink {
    store: Arc<dyn ProgressStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }
}

impl ProgressSink for StoreSink {
    fn submit(&self, update: ProgressUpdate) -> BoxFuture<'static, Result<()>> {
        let result = self
            .store
            .record_progress(&update.user_id, &update.course_id, update.progress_data)
            .map(|_| ());
        Box::pin(async move { result })
    }
}

/// Identity of one launcher session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    pub course_id: String,
}

impl SessionContext {
    /// Derive the session the way the launcher page does: the course id is
    /// the second path segment of the launcher URL
    /// (`/scorm-packages/<course>/scorm-launcher.html`), the user id comes
    /// from the `userId` query parameter or falls back to `default_user`.
    pub fn from_launch_path(path: &str, user_id: Option<&str>, default_user: &str) -> Self {
        let course_id = path
            .split('/')
            .nth(2)
            .filter(|segment| !segment.is_empty())
            .unwrap_or(UNKNOWN_COURSE);
        let user_id = user_id.filter(|u| !u.is_empty()).unwrap_or(default_user);

        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
        }
    }
}

/// SCORM 1.2 API object for one session
pub struct ScormRuntime {
    session: SessionContext,
    sink: Arc<dyn ProgressSink>,
    events: broadcast::Sender<LifecycleEvent>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl ScormRuntime {
    pub fn new(session: SessionContext, sink: Arc<dyn ProgressSink>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            session,
            sink,
            events,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Listen for lifecycle events, the native counterpart of the parent frame
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// SCORM 2004 view over this runtime
    pub fn as_2004(&self) -> Scorm2004<'_> {
        Scorm2004 { inner: self }
    }

    #[allow(non_snake_case)]
    pub fn LMSInitialize(&self) -> &'static str {
        info!("SCORM API initialized for course {}", self.session.course_id);
        self.notify(LifecycleEvent::Initialize {
            course_id: self.session.course_id.clone(),
        });
        SCORM_TRUE
    }

    #[allow(non_snake_case)]
    pub fn LMSFinish(&self) -> &'static str {
        info!("SCORM session finished for course {}", self.session.course_id);
        self.notify(LifecycleEvent::Finish {
            course_id: self.session.course_id.clone(),
        });
        SCORM_TRUE
    }

    #[allow(non_snake_case)]
    pub fn LMSGetValue(&self, element: &str) -> String {
        debug!("LMSGetValue called with: {}", element);
        String::new()
    }

    /// Returns at once; the write runs on a detached task
    #[allow(non_snake_case)]
    pub fn LMSSetValue(&self, element: &str, value: &str) -> &'static str {
        debug!("SCORM data: {} = {}", element, value);

        let mut progress_data = ProgressPatch::new();
        progress_data.insert(element.to_string(), Value::String(value.to_string()));
        let update = ProgressUpdate {
            user_id: self.session.user_id.clone(),
            course_id: self.session.course_id.clone(),
            progress_data,
        };

        self.dispatch(update);
        SCORM_TRUE
    }

    #[allow(non_snake_case)]
    pub fn LMSCommit(&self, _param: &str) -> &'static str {
        debug!("LMSCommit called");
        SCORM_TRUE
    }

    #[allow(non_snake_case)]
    pub fn LMSGetLastError(&self) -> &'static str {
        NO_ERROR_CODE
    }

    #[allow(non_snake_case)]
    pub fn LMSGetErrorString(&self, _code: &str) -> &'static str {
        NO_ERROR_STRING
    }

    #[allow(non_snake_case)]
    pub fn LMSGetDiagnostic(&self, _code: &str) -> &'static str {
        NO_DIAGNOSTIC
    }

    /// Wait for writes dispatched so far. Tools call this before exiting;
    /// the SCORM methods themselves never do.
    pub async fn flush(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.in_flight.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Progress write task failed: {}", e);
            }
        }
    }

    fn notify(&self, event: LifecycleEvent) {
        // No subscriber means nobody embeds us; that is fine.
        let _ = self.events.send(event);
    }

    fn dispatch(&self, update: ProgressUpdate) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                "No async runtime available, dropping progress write for {}",
                update.course_id
            );
            return;
        };

        let sink = Arc::clone(&self.sink);
        let handle = runtime.spawn(async move {
            if let Err(e) = sink.submit(update).await {
                warn!("Error saving progress: {}", e);
            }
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}

/// SCORM 2004 (`API_1484_11`) names, delegating to a [`ScormRuntime`]
pub struct Scorm2004<'a> {
    inner: &'a ScormRuntime,
}

#[allow(non_snake_case)]
impl Scorm2004<'_> {
    pub fn Initialize(&self, _param: &str) -> &'static str {
        self.inner.LMSInitialize()
    }

    pub fn Terminate(&self, _param: &str) -> &'static str {
        self.inner.LMSFinish()
    }

    pub fn GetValue(&self, element: &str) -> String {
        self.inner.LMSGetValue(element)
    }

    pub fn SetValue(&self, element: &str, value: &str) -> &'static str {
        self.inner.LMSSetValue(element, value)
    }

    pub fn Commit(&self, param: &str) -> &'static str {
        self.inner.LMSCommit(param)
    }

    pub fn GetLastError(&self) -> &'static str {
        self.inner.LMSGetLastError()
    }

    pub fn GetErrorString(&self, code: &str) -> &'static str {
        self.inner.LMSGetErrorString(code)
    }

    pub fn GetDiagnostic(&self, code: &str) -> &'static str {
        self.inner.LMSGetDiagnostic(code)
    }
}
