//! Backend access: one call per endpoint, every failure normalized to
//! [`FetchError`].
//!
//! The HTTP client sits behind [`Transport`] so the engine can be driven by
//! a scripted transport in tests. No retries and no timeouts beyond the
//! transport's own; a failed call is simply reported and the next tick
//! tries again.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shogun_protocol::{
    ashigaru_output_path, AshigaruStatusResponse, CommandRequest, CommandResponse,
    DashboardPayload, PaneOutputResponse, PaneTarget, ASHIGARU_STATUS_PATH, COMMAND_PATH,
    DASHBOARD_PATH,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::FetchError;
use crate::types::{DashboardSnapshot, WorkerId, WorkerStatusEntry};

/// Raw request/response exchange with the backend.
///
/// Implementations return the response body for 2xx responses and a
/// [`FetchError`] for everything else.
pub trait Transport: Send + Sync {
    fn get(&self, path: &str) -> Result<String, FetchError>;
    fn post_json(&self, path: &str, body: &Value) -> Result<String, FetchError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP Transport
// ═══════════════════════════════════════════════════════════════════════════════

pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> Result<String, FetchError> {
        let response = self.agent.get(&self.url(path)).call();
        read_body(response)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<String, FetchError> {
        let response = self.agent.post(&self.url(path)).send_json(body);
        read_body(response)
    }
}

fn read_body(response: Result<ureq::Response, ureq::Error>) -> Result<String, FetchError> {
    match response {
        Ok(response) => response
            .into_string()
            .map_err(|err| FetchError::Transport(err.to_string())),
        Err(ureq::Error::Status(code, response)) => Err(FetchError::Status {
            code,
            body: response.into_string().unwrap_or_default(),
        }),
        Err(ureq::Error::Transport(err)) => Err(FetchError::Transport(err.to_string())),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Snapshot Fetcher
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SnapshotFetcher {
    transport: Arc<dyn Transport>,
}

impl SnapshotFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn http(base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(HttpTransport::new(base_url)))
    }

    /// Fetches the dashboard. A payload carrying `error` is still `Ok`; the
    /// caller decides what an in-band error means for the view.
    pub fn fetch_dashboard(&self) -> Result<DashboardSnapshot, FetchError> {
        let payload: DashboardPayload = self.get_json(DASHBOARD_PATH)?;
        Ok(DashboardSnapshot::from(payload))
    }

    pub fn fetch_pane(&self, target: PaneTarget) -> Result<PaneOutputResponse, FetchError> {
        self.get_json(&target.path())
    }

    pub fn fetch_worker_output(&self, worker: &WorkerId) -> Result<PaneOutputResponse, FetchError> {
        self.get_json(&ashigaru_output_path(worker.as_str()))
    }

    pub fn fetch_worker_statuses(&self) -> Result<Vec<WorkerStatusEntry>, FetchError> {
        let response: AshigaruStatusResponse = self.get_json(ASHIGARU_STATUS_PATH)?;
        Ok(response
            .statuses
            .into_iter()
            .map(WorkerStatusEntry::from)
            .collect())
    }

    /// Posts a command. A non-2xx answer whose body is a command response is
    /// passed through so its `error` reaches the operator.
    pub fn post_command(&self, request: &CommandRequest) -> Result<CommandResponse, FetchError> {
        let body = serde_json::to_value(request)
            .map_err(|err| FetchError::Decode(err.to_string()))?;
        match self.transport.post_json(COMMAND_PATH, &body) {
            Ok(raw) => decode(COMMAND_PATH, &raw),
            Err(FetchError::Status { code, body }) => {
                match serde_json::from_str::<CommandResponse>(&body) {
                    Ok(response) if response.error.is_some() => Ok(response),
                    _ => Err(FetchError::Status { code, body }),
                }
            }
            Err(err) => Err(err),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let raw = self.transport.get(path).map_err(|err| {
            debug!(path, error = %err, "Fetch failed");
            err
        })?;
        decode(path, &raw)
    }
}

fn decode<T: DeserializeOwned>(path: &str, raw: &str) -> Result<T, FetchError> {
    serde_json::from_str(raw).map_err(|err| {
        debug!(path, error = %err, "Response decode failed");
        FetchError::Decode(err.to_string())
    })
}
