//! HTTP-side counterparts of the launcher's browser behavior
//!
//! [`HttpProbe`] resolves a hosted course's entry point the way the launcher
//! page does, with HEAD requests relative to the launcher location.
//! [`HttpProgressSink`] posts shim writes to `/api/progress`.

use futures::future::BoxFuture;
use lxp_common::scorm::launcher::PROGRESS_ENDPOINT;
use lxp_common::scorm::{EntryProbe, ProgressSink, ProgressUpdate};
use lxp_common::{Error, Result};
use reqwest::{Client, Url};
use tracing::debug;

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::InvalidInput(format!("Invalid URL {raw}: {e}")))
}

/// Probe a course served over HTTP
///
/// `base` is the launcher URL or the course directory URL (with trailing
/// slash); candidates resolve against it like relative links in a page.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    base: Url,
}

impl HttpProbe {
    pub fn new(client: Client, base: &str) -> Result<Self> {
        Ok(Self {
            client,
            base: parse_url(base)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl EntryProbe for HttpProbe {
    async fn exists(&self, candidate: &str) -> bool {
        let Ok(url) = self.base.join(candidate) else {
            return false;
        };
        match self.client.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Entry candidate unreachable: {} ({})", candidate, e);
                false
            }
        }
    }

    async fn listing(&self) -> Option<String> {
        let url = self.base.join("./").ok()?;
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }
}

/// Sink posting progress updates to a running host
#[derive(Debug, Clone)]
pub struct HttpProgressSink {
    client: Client,
    endpoint: Url,
}

impl HttpProgressSink {
    /// `server` is the host's base URL, e.g. `http://localhost:3000`
    pub fn new(client: Client, server: &str) -> Result<Self> {
        let endpoint = parse_url(server)?
            .join(PROGRESS_ENDPOINT)
            .map_err(|e| Error::InvalidInput(format!("Invalid server URL {server}: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl ProgressSink for HttpProgressSink {
    fn submit(&self, update: ProgressUpdate) -> BoxFuture<'static, Result<()>> {
        let request = self.client.post(self.endpoint.clone()).json(&update);
        Box::pin(async move {
            let response = request.send().await.map_err(|e| Error::Http(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Http(format!("progress endpoint answered {status}")));
            }
            Ok(())
        })
    }
}
