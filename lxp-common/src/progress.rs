//! Per-user, per-course SCORM progress
//!
//! A progress record maps SCORM data model element names
//! (`cmi.core.lesson_status`, `cmi.suspend_data`, ...) to the last value a
//! course set for them. Writes are shallow merges: a patch touches only the
//! keys it names, and the last write for a key wins. No history is kept.
//!
//! Handlers hold the store as `Arc<dyn ProgressStore>` so a durable backend
//! can replace [`InMemoryProgressStore`] without touching them.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::Result;

/// Partial update: element name → new value
pub type ProgressPatch = Map<String, Value>;

/// Latest known values for one (user, course) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRecord {
    pub progress: Map<String, Value>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Value currently stored for `element`, if any
    pub fn get(&self, element: &str) -> Option<&Value> {
        self.progress.get(element)
    }
}

/// Render timestamps as RFC 3339 UTC with millisecond precision
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(
    ts: &DateTime<Utc>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

/// Storage seam for progress records
pub trait ProgressStore: Send + Sync {
    /// Merge `patch` into the record for (user, course), creating it if absent,
    /// and stamp the current time. Returns the record as stored.
    fn record_progress(&self, user_id: &str, course_id: &str, patch: ProgressPatch)
        -> Result<ProgressRecord>;

    /// Current record for (user, course); `None` when nothing was ever written
    fn read_progress(&self, user_id: &str, course_id: &str) -> Result<Option<ProgressRecord>>;
}

/// Process-wide in-memory store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    records: RwLock<HashMap<String, HashMap<String, ProgressRecord>>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (user, course) pairs with a record
    pub fn len(&self) -> usize {
        self.records.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn record_progress(
        &self,
        user_id: &str,
        course_id: &str,
        patch: ProgressPatch,
    ) -> Result<ProgressRecord> {
        let mut records = self.records.write();
        let record = records
            .entry(user_id.to_string())
            .or_default()
            .entry(course_id.to_string())
            .or_insert_with(|| ProgressRecord {
                progress: Map::new(),
                updated_at: Utc::now(),
            });

        record.progress.extend(patch);
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    fn read_progress(&self, user_id: &str, course_id: &str) -> Result<Option<ProgressRecord>> {
        Ok(self
            .records
            .read()
            .get(user_id)
            .and_then(|courses| courses.get(course_id))
            .cloned())
    }
}
