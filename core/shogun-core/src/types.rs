//! Core types shared by every dashboard client.
//!
//! Snapshots are built from the wire payload once and never mutated after;
//! every renderer reads them by reference.

use serde::{Deserialize, Serialize};
use shogun_protocol::{
    AshigaruStatusWire, DashboardPayload, TableRow, COMPLETED_ID_KEYS, COMPLETED_PROJECT_KEYS,
    PENDING_STATUS, PROJECT_KEYS, RESULT_KEYS, STATUS_KEYS, TASK_KEYS, WORKER_KEYS,
};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Worker Identity
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical worker identifier, always `ashigaru<N>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    /// Keeps the digits verbatim: `03` stays `ashigaru03`, which is the id the
    /// backend addresses.
    pub fn from_digits(digits: &str) -> Self {
        Self(format!("ashigaru{}", digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn number(&self) -> Option<u32> {
        self.0.strip_prefix("ashigaru")?.parse().ok()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dashboard Snapshot
// ═══════════════════════════════════════════════════════════════════════════════

/// One complete poll response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub last_updated: String,
    pub action_required: Vec<ActionItem>,
    pub in_progress: Vec<WorkItem>,
    pub completed_today: Vec<CompletedItem>,
    pub completed_reports: Vec<CompletedReport>,
    pub skill_candidates: Vec<SkillCandidate>,
    pub generated_skills: Vec<GeneratedSkill>,
    pub waiting: Vec<String>,
    pub inquiries: Vec<String>,
    pub error: Option<String>,
}

impl DashboardSnapshot {
    pub fn action_count(&self) -> usize {
        self.action_required.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_today.len()
    }

    pub fn pending_candidates(&self) -> usize {
        count_pending(&self.skill_candidates)
    }
}

pub fn count_pending(candidates: &[SkillCandidate]) -> usize {
    candidates.iter().filter(|c| c.status.is_pending()).count()
}

impl From<DashboardPayload> for DashboardSnapshot {
    fn from(payload: DashboardPayload) -> Self {
        Self {
            last_updated: payload.last_updated,
            action_required: payload
                .action_required
                .into_iter()
                .map(|item| ActionItem {
                    title: item.title,
                    content: item.content,
                })
                .collect(),
            in_progress: payload.in_progress.iter().map(WorkItem::from_row).collect(),
            completed_today: payload
                .completed_today
                .iter()
                .map(CompletedItem::from_row)
                .collect(),
            completed_reports: payload
                .completed_reports
                .into_iter()
                .map(|report| CompletedReport {
                    cmd_id: report.cmd_id,
                    order: report.content.order,
                    result: report.content.result,
                })
                .collect(),
            skill_candidates: payload
                .skill_candidates
                .into_iter()
                .map(|candidate| SkillCandidate {
                    status: SkillStatus::from_wire(candidate.status.as_deref()),
                    name: candidate.name,
                    description: candidate.description,
                    source: candidate.source,
                    generality: candidate.generality,
                })
                .collect(),
            generated_skills: payload
                .generated_skills
                .into_iter()
                .map(|skill| GeneratedSkill {
                    name: skill.name,
                    description: skill.description,
                    languages: skill.languages,
                    created_at: skill.created_at,
                    design_doc: skill.design_doc,
                })
                .collect(),
            waiting: payload.waiting,
            inquiries: payload.inquiries,
            error: payload.error.filter(|e| !e.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionItem {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItem {
    pub worker_label: Option<String>,
    pub task: Option<String>,
    pub project: Option<String>,
    pub status: Option<String>,
}

impl WorkItem {
    pub fn from_row(row: &TableRow) -> Self {
        Self {
            worker_label: row.pick(WORKER_KEYS),
            task: row.pick(TASK_KEYS),
            project: row.pick(PROJECT_KEYS),
            status: row.pick(STATUS_KEYS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedItem {
    pub id: Option<String>,
    pub project: Option<String>,
    pub task: Option<String>,
    pub result: Option<String>,
}

impl CompletedItem {
    pub fn from_row(row: &TableRow) -> Self {
        Self {
            id: row.pick(COMPLETED_ID_KEYS),
            project: row.pick(COMPLETED_PROJECT_KEYS),
            task: row.pick(TASK_KEYS),
            result: row.pick(RESULT_KEYS),
        }
    }
}

/// Detail block for a finished command (`### cmd_XXX 完了報告`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedReport {
    pub cmd_id: String,
    pub order: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillStatus {
    Pending,
    Other(String),
}

impl SkillStatus {
    /// Absent status means pending: the backend omits it for fresh candidates.
    pub fn from_wire(status: Option<&str>) -> Self {
        match status.map(str::trim) {
            None | Some("") => SkillStatus::Pending,
            Some(PENDING_STATUS) => SkillStatus::Pending,
            Some(other) => SkillStatus::Other(other.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SkillStatus::Pending)
    }

    pub fn label(&self) -> &str {
        match self {
            SkillStatus::Pending => PENDING_STATUS,
            SkillStatus::Other(label) => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCandidate {
    pub name: String,
    pub description: String,
    pub source: String,
    pub generality: Option<String>,
    pub status: SkillStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedSkill {
    pub name: String,
    pub description: Option<String>,
    pub languages: Option<String>,
    pub created_at: Option<String>,
    pub design_doc: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Worker Status
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Busy,
    Idle,
    Unknown,
}

impl WorkerStatus {
    pub fn from_wire(status: Option<&str>) -> Self {
        match status.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("busy") => WorkerStatus::Busy,
            Some("idle") => WorkerStatus::Idle,
            _ => WorkerStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStatusEntry {
    pub id: String,
    pub display_number: Option<u32>,
    pub status: WorkerStatus,
}

impl From<AshigaruStatusWire> for WorkerStatusEntry {
    fn from(wire: AshigaruStatusWire) -> Self {
        let display_number = wire
            .num
            .or_else(|| wire.id.strip_prefix("ashigaru").and_then(|n| n.parse().ok()));
        Self {
            status: WorkerStatus::from_wire(wire.status.as_deref()),
            id: wire.id,
            display_number,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Command History
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHistoryEntry {
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionId {
    ActionRequired,
    InProgress,
    CompletedToday,
    SkillCandidates,
    GeneratedSkills,
    Waiting,
    Inquiries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapsePolicy {
    /// Collapsed when empty, open when populated, on every applied snapshot.
    ContentDerived,
    /// Operator-controlled only; starts at `default`.
    Persisted { default: bool },
}

impl SectionId {
    pub const ALL: [SectionId; 7] = [
        SectionId::ActionRequired,
        SectionId::InProgress,
        SectionId::CompletedToday,
        SectionId::SkillCandidates,
        SectionId::GeneratedSkills,
        SectionId::Waiting,
        SectionId::Inquiries,
    ];

    /// Stable identifier used for element ids and preference keys.
    pub fn key(self) -> &'static str {
        match self {
            SectionId::ActionRequired => "action-required",
            SectionId::InProgress => "in-progress",
            SectionId::CompletedToday => "completed-today",
            SectionId::SkillCandidates => "skill-candidates",
            SectionId::GeneratedSkills => "generated-skills",
            SectionId::Waiting => "waiting",
            SectionId::Inquiries => "inquiries",
        }
    }

    pub fn title_key(self) -> &'static str {
        match self {
            SectionId::ActionRequired => "section.actionRequired",
            SectionId::InProgress => "section.inProgress",
            SectionId::CompletedToday => "section.completedToday",
            SectionId::SkillCandidates => "section.skillCandidates",
            SectionId::GeneratedSkills => "section.generatedSkills",
            SectionId::Waiting => "section.waiting",
            SectionId::Inquiries => "section.inquiries",
        }
    }

    pub fn collapse_policy(self) -> CollapsePolicy {
        match self {
            SectionId::CompletedToday => CollapsePolicy::Persisted { default: true },
            _ => CollapsePolicy::ContentDerived,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> DashboardPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_snapshot_resolves_row_aliases() {
        let snapshot = DashboardSnapshot::from(payload(json!({
            "in_progress": [{"足軽": "足軽2", "タスク": "lint", "戦場": "api"}],
            "completed_today": [{"time": "10:00", "project": "api", "task": "ci", "result": "ok"}]
        })));

        let work = &snapshot.in_progress[0];
        assert_eq!(work.worker_label.as_deref(), Some("足軽2"));
        assert_eq!(work.task.as_deref(), Some("lint"));
        assert_eq!(work.project.as_deref(), Some("api"));
        assert_eq!(work.status, None);

        let done = &snapshot.completed_today[0];
        assert_eq!(done.id.as_deref(), Some("10:00"));
        assert_eq!(done.result.as_deref(), Some("ok"));
    }

    #[test]
    fn test_skill_status_pending_literal_and_absent() {
        assert!(SkillStatus::from_wire(Some("承認待ち")).is_pending());
        assert!(SkillStatus::from_wire(None).is_pending());
        assert!(!SkillStatus::from_wire(Some("承認済み")).is_pending());
        assert!(!SkillStatus::from_wire(Some("pending")).is_pending());
    }

    #[test]
    fn test_blank_error_is_not_an_error() {
        let snapshot = DashboardSnapshot::from(payload(json!({"error": " "})));
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_worker_status_entry_falls_back_to_id_number() {
        let entry = WorkerStatusEntry::from(AshigaruStatusWire {
            id: "ashigaru7".to_string(),
            num: None,
            status: Some("BUSY".to_string()),
        });
        assert_eq!(entry.display_number, Some(7));
        assert_eq!(entry.status, WorkerStatus::Busy);
    }

    #[test]
    fn test_worker_id_number() {
        assert_eq!(WorkerId::from_digits("12").number(), Some(12));
        assert_eq!(WorkerId::from_digits("03").number(), Some(3));
        assert_eq!(WorkerId::from_digits("3").as_str(), "ashigaru3");
    }

    #[test]
    fn test_section_keys_roundtrip() {
        for section in SectionId::ALL {
            assert_eq!(SectionId::from_key(section.key()), Some(section));
        }
        assert_eq!(SectionId::from_key("nope"), None);
    }

    #[test]
    fn test_only_completed_section_is_persisted() {
        assert_eq!(
            SectionId::CompletedToday.collapse_policy(),
            CollapsePolicy::Persisted { default: true }
        );
        assert_eq!(
            SectionId::Waiting.collapse_policy(),
            CollapsePolicy::ContentDerived
        );
    }
}
