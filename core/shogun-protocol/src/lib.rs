//! HTTP wire types for the shogun dashboard backend.
//!
//! This crate is shared by every dashboard client to prevent schema drift.
//! The backend derives these payloads from a hand-edited dashboard.md, so the
//! decoders are lenient: absent or `null` collections decode as empty, and
//! table rows keep their header-keyed shape so callers can resolve columns
//! across dashboard revisions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DASHBOARD_PATH: &str = "/api/dashboard";
pub const COMMAND_PATH: &str = "/api/command";
pub const ASHIGARU_STATUS_PATH: &str = "/api/pane/ashigaru/status";

/// Status value the backend assigns to candidates awaiting review.
pub const PENDING_STATUS: &str = "承認待ち";

// Column aliases for header-keyed table rows, in lookup priority order.
pub const WORKER_KEYS: &[&str] = &["担当", "足軽", "worker"];
pub const TASK_KEYS: &[&str] = &["任務", "タスク", "task"];
pub const PROJECT_KEYS: &[&str] = &["プロジェクト", "戦場", "project"];
pub const STATUS_KEYS: &[&str] = &["状態", "status"];
pub const COMPLETED_ID_KEYS: &[&str] = &["時刻", "time", "id", "ID"];
pub const COMPLETED_PROJECT_KEYS: &[&str] = &["戦場", "プロジェクト", "project"];
pub const RESULT_KEYS: &[&str] = &["結果", "result"];

/// Agent panes exposed by `GET /api/pane/{target}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneTarget {
    Shogun,
    Karo,
}

impl PaneTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            PaneTarget::Shogun => "shogun",
            PaneTarget::Karo => "karo",
        }
    }

    pub fn path(self) -> String {
        format!("/api/pane/{}", self.as_str())
    }
}

pub fn ashigaru_output_path(worker_id: &str) -> String {
    format!("/api/ashigaru/{}/output", worker_id)
}

// ─────────────────────────────────────────────────────────────────────────────
// GET /api/dashboard
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_updated: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_required: Vec<ActionItemWire>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub in_progress: Vec<TableRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_today: Vec<TableRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_reports: Vec<CompletedReportWire>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skill_candidates: Vec<SkillCandidateWire>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generated_skills: Vec<GeneratedSkillWire>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub waiting: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inquiries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionItemWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// One markdown table row keyed by its column header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableRow(pub Map<String, Value>);

impl TableRow {
    /// Returns the first non-blank cell among `keys`.
    pub fn pick(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedReportWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cmd_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: CompletedReportContent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedReportContent {
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillCandidateWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default)]
    pub generality: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedSkillWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub languages: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub design_doc: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Panes
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `GET /api/pane/{shogun|karo}` and `GET /api/ashigaru/{id}/output`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaneOutputResponse {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AshigaruStatusResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub statuses: Vec<AshigaruStatusWire>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AshigaruStatusWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub num: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// POST /api/command
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>) -> Result<Self, ErrorInfo> {
        let request = Self {
            command: command.into(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.command.trim().is_empty() {
            return Err(ErrorInfo::new("empty_command", "command is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_dashboard_payload() {
        let payload: DashboardPayload = serde_json::from_value(json!({
            "last_updated": "2026-01-30 12:00",
            "action_required": [{"title": "API key", "content": "**urgent**"}],
            "in_progress": [{"担当": "足軽1", "プロジェクト": "web", "任務": "login form"}],
            "completed_today": [{"時刻": "09:00", "戦場": "web", "任務": "setup", "結果": "done"}],
            "completed_reports": [{"cmd_id": "cmd_001", "content": {"order": "build", "result": "ok"}}],
            "skill_candidates": [{"name": "md-lint", "description": "", "source": "cmd_001", "status": "承認待ち"}],
            "generated_skills": [{"name": "tidy", "languages": "rust", "created_at": "2026-01-29"}],
            "waiting": ["ashigaru3"],
            "inquiries": []
        }))
        .unwrap();

        assert_eq!(payload.last_updated, "2026-01-30 12:00");
        assert_eq!(payload.action_required[0].title, "API key");
        assert_eq!(payload.in_progress[0].pick(WORKER_KEYS).as_deref(), Some("足軽1"));
        assert_eq!(payload.completed_reports[0].content.result.as_deref(), Some("ok"));
        assert_eq!(payload.skill_candidates[0].status.as_deref(), Some(PENDING_STATUS));
        assert_eq!(payload.generated_skills[0].design_doc, None);
        assert_eq!(payload.waiting, vec!["ashigaru3".to_string()]);
        assert!(payload.error.is_none());
    }

    #[test]
    fn null_and_missing_collections_decode_empty() {
        let payload: DashboardPayload = serde_json::from_value(json!({
            "last_updated": null,
            "action_required": null,
            "waiting": null
        }))
        .unwrap();

        assert_eq!(payload.last_updated, "");
        assert!(payload.action_required.is_empty());
        assert!(payload.in_progress.is_empty());
        assert!(payload.waiting.is_empty());
    }

    #[test]
    fn error_only_payload_decodes() {
        let payload: DashboardPayload =
            serde_json::from_value(json!({"error": "Dashboard path not configured."})).unwrap();
        assert_eq!(payload.error.as_deref(), Some("Dashboard path not configured."));
    }

    #[test]
    fn table_row_pick_follows_alias_priority() {
        let row: TableRow =
            serde_json::from_value(json!({"worker": "ashigaru2", "足軽": "足軽5"})).unwrap();
        assert_eq!(row.pick(WORKER_KEYS).as_deref(), Some("足軽5"));
    }

    #[test]
    fn table_row_pick_skips_blank_cells() {
        let row: TableRow = serde_json::from_value(json!({"担当": "  ", "worker": "ashigaru2"})).unwrap();
        assert_eq!(row.pick(WORKER_KEYS).as_deref(), Some("ashigaru2"));
        assert_eq!(row.pick(STATUS_KEYS), None);
    }

    #[test]
    fn status_num_accepts_numbers_and_strings() {
        let response: AshigaruStatusResponse = serde_json::from_value(json!({
            "statuses": [
                {"id": "ashigaru1", "num": 1, "status": "busy"},
                {"id": "ashigaru2", "num": "2", "status": "idle"},
                {"id": "ashigaru3", "num": "x"}
            ]
        }))
        .unwrap();
        let nums: Vec<_> = response.statuses.iter().map(|s| s.num).collect();
        assert_eq!(nums, vec![Some(1), Some(2), None]);
    }

    #[test]
    fn pane_paths_match_backend_routes() {
        assert_eq!(PaneTarget::Shogun.path(), "/api/pane/shogun");
        assert_eq!(PaneTarget::Karo.path(), "/api/pane/karo");
        assert_eq!(ashigaru_output_path("ashigaru4"), "/api/ashigaru/ashigaru4/output");
    }

    #[test]
    fn command_request_rejects_blank_text() {
        assert!(CommandRequest::new("   \n").is_err());
        assert_eq!(CommandRequest::new("出陣").unwrap().command, "出陣");
    }

    #[test]
    fn command_response_defaults_to_failure() {
        let response: CommandResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!response.success);
        assert!(response.error.is_none());
    }
}
