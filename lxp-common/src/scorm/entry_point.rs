//! SCORM entry-point discovery
//!
//! Course archives arrive without a parsed manifest, so the file to load first
//! is found heuristically:
//!
//! 1. Probe [`ENTRY_CANDIDATES`] in order; the first that exists wins.
//! 2. Otherwise fetch a listing of the course root and take the basename of
//!    the first `href="....html"` it mentions. The listing is scanned with a
//!    regex, not parsed: broken markup is normal input here.
//! 3. Otherwise fall back to [`DEFAULT_ENTRY`].
//!
//! Resolution never fails. Probe errors count as "not found". Probing is
//! sequential because the candidate order decides the winner.
//!
//! The launcher page runs the same algorithm in the browser; the candidate
//! list and default are injected into it from here.

use std::future::Future;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::launcher::LAUNCHER_FILE_NAME;

/// Well-known entry files, most specific authoring-tool layouts last
pub const ENTRY_CANDIDATES: [&str; 6] = [
    "index.html",
    "index_lms.html",
    "story.html",
    "launch.html",
    "scormdriver/indexAPI.html",
    "shared/launchpage.html",
];

/// Entry used when neither probing nor the listing turns anything up
pub const DEFAULT_ENTRY: &str = "index.html";

/// Pattern matched against listing bodies
pub const LISTING_LINK_PATTERN: &str = r#"href=['"](.*?\.html)['"]"#;

static LISTING_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(LISTING_LINK_PATTERN).expect("listing link pattern is valid"));

/// Where a resolved entry point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Candidate,
    Listing,
    Fallback,
}

/// Result of entry-point resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Path relative to the course root
    pub file: String,
    pub source: EntrySource,
}

/// Existence checks against a course root
///
/// Implementations swallow their own failures: an unreachable candidate is
/// reported as absent, an unreadable listing as `None`.
pub trait EntryProbe {
    /// Does `candidate` (relative to the course root) exist?
    fn exists(&self, candidate: &str) -> impl Future<Output = bool> + Send;

    /// Raw listing body for the course root, if one can be obtained
    fn listing(&self) -> impl Future<Output = Option<String>> + Send;
}

/// Run the three-step resolution against `probe`
pub async fn resolve_entry_point<P: EntryProbe>(probe: &P) -> EntryPoint {
    for candidate in ENTRY_CANDIDATES {
        if probe.exists(candidate).await {
            debug!("Entry point candidate found: {}", candidate);
            return EntryPoint {
                file: candidate.to_string(),
                source: EntrySource::Candidate,
            };
        }
        debug!("Entry point candidate not found: {}", candidate);
    }

    if let Some(body) = probe.listing().await {
        if let Some(file) = scan_listing(&body) {
            debug!("Entry point taken from listing: {}", file);
            return EntryPoint {
                file,
                source: EntrySource::Listing,
            };
        }
    }

    EntryPoint {
        file: DEFAULT_ENTRY.to_string(),
        source: EntrySource::Fallback,
    }
}

/// Basename of the first `.html` hyperlink in a listing body
///
/// The launcher sits next to the content and is never its own entry point.
pub fn scan_listing(body: &str) -> Option<String> {
    LISTING_LINK
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().rsplit('/').next())
        .find(|name| !name.is_empty() && *name != LAUNCHER_FILE_NAME)
        .map(str::to_string)
}

/// Probe backed by an extracted course directory
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl EntryProbe for FsProbe {
    async fn exists(&self, candidate: &str) -> bool {
        tokio::fs::metadata(self.root.join(candidate))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Synthesizes an index page: one anchor per regular file, sorted by name
    async fn listing(&self) -> Option<String> {
        let mut entries = tokio::fs::read_dir(&self.root).await.ok()?;
        let mut names = Vec::new();

        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        let body = names
            .iter()
            .map(|name| format!("<a href=\"{name}\">{name}</a>"))
            .collect::<Vec<_>>()
            .join("\n");
        Some(body)
    }
}
