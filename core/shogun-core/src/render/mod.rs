//! View-models for every dashboard surface and the adapters that present them.
//!
//! [`sections`] projects snapshots into [`RenderedSection`]s without touching
//! any state. [`html`] and [`text`] bind a complete [`DashboardView`] to
//! markup or to a terminal; neither calls back into the engine.

pub mod html;
pub mod markdown;
pub mod sections;
pub mod text;

use crate::dispatch::MessageKind;
use crate::panes::PaneBody;
use crate::types::{CollapsePolicy, CommandHistoryEntry, SectionId, WorkerId, WorkerStatus};

use markdown::Block;

/// What an applied snapshot does to a section's collapsed flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseHint {
    ForceCollapsed,
    ForceOpen,
    /// Operator-controlled; the stored flag stands.
    Keep,
}

impl CollapseHint {
    pub fn from_content(section: SectionId, has_content: bool) -> Self {
        match section.collapse_policy() {
            CollapsePolicy::Persisted { .. } => CollapseHint::Keep,
            CollapsePolicy::ContentDerived if has_content => CollapseHint::ForceOpen,
            CollapsePolicy::ContentDerived => CollapseHint::ForceCollapsed,
        }
    }

    pub fn forced(self) -> Option<bool> {
        match self {
            CollapseHint::ForceCollapsed => Some(true),
            CollapseHint::ForceOpen => Some(false),
            CollapseHint::Keep => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub id: SectionId,
    pub title: String,
    pub toggle_hint: String,
    pub hint: CollapseHint,
    pub collapsed: bool,
    pub badge: Option<SkillBadge>,
    pub body: SectionBody,
    pub reports: Option<ReportsView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Loading(String),
    /// Localized "none" placeholder.
    Empty(String),
    ActionItems(Vec<ActionItemView>),
    Table(TableView),
    SkillCards(Vec<SkillCardView>),
    GeneratedSkills(Vec<GeneratedSkillView>),
    List(Vec<String>),
}

/// Pending skill candidate summary shown at the top of the action section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillBadge {
    pub count: usize,
    pub label: String,
    pub count_label: String,
    pub status_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItemView {
    pub title: String,
    pub blocks: Vec<Block>,
    pub delete: DeleteControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteControl {
    Available { tooltip: String, confirm_prompt: String },
    Sending(String),
    Sent(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<TableRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowView {
    pub cells: Vec<String>,
    /// Set for rows that open a worker's detail view.
    pub worker_id: Option<WorkerId>,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportsView {
    pub title: String,
    pub order_label: String,
    pub result_label: String,
    pub items: Vec<ReportItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItemView {
    pub cmd_id: String,
    pub order: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCardView {
    pub name: String,
    pub description: String,
    pub source: String,
    pub generality: Option<String>,
    pub status_label: String,
    pub pending_badge: Option<String>,
    pub controls: ReviewControls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewControls {
    /// Not pending; nothing to review.
    None,
    Buttons { approve: String, reject: String },
    ReasonInput { placeholder: String, confirm: String },
    Status(String),
    Failed { message: String, approve: String, reject: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSkillView {
    pub name: String,
    pub description: Option<String>,
    /// Pre-labelled metadata lines (languages, creation date, design doc).
    pub meta: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Whole Dashboard
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub language: String,
    pub page_title: String,
    pub header: HeaderView,
    pub workers: WorkerStripView,
    pub shogun: PaneView,
    pub karo: KaroView,
    pub command: CommandPanelView,
    pub history: HistoryView,
    pub sections: Vec<RenderedSection>,
    pub modal: Option<PaneView>,
    pub skill_review: Option<SkillReviewView>,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub title: String,
    pub last_updated_label: String,
    /// `-` until a snapshot with a non-blank value is applied.
    pub last_updated: String,
    pub auto_refresh_label: String,
    pub auto_refresh: bool,
    pub notifications_label: String,
    pub language_label: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStripView {
    pub title: String,
    pub entries: Vec<WorkerChip>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerChip {
    pub id: String,
    pub label: String,
    pub status: WorkerStatus,
    pub status_label: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneView {
    pub title: String,
    pub body: PaneBody,
    pub updating: Option<String>,
    pub auto_refresh: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KaroView {
    pub label: String,
    pub badge: Option<String>,
    pub badge_title: String,
    /// Present while the karo terminal is expanded.
    pub pane: Option<PaneView>,
    pub close_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPanelView {
    pub title: String,
    pub placeholder: String,
    pub input: String,
    pub submit_label: String,
    pub busy: bool,
    pub message: Option<(MessageKind, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryView {
    pub title: String,
    pub empty_label: String,
    pub entries: Vec<CommandHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillReviewView {
    pub title: String,
    pub empty_label: String,
    pub close_label: String,
    pub cards: Vec<SkillCardView>,
}
