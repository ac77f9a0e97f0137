//! All mutable dashboard state, and every transition on it.
//!
//! [`AppState`] is plain data plus methods: no I/O besides preference
//! writes, no threads. The engine wraps it in a mutex, performs network
//! calls outside the lock, and hands results back here through the
//! `apply_*` methods, which discard responses that arrive out of order.

use std::collections::HashMap;
use std::time::Instant;

use shogun_protocol::{PaneOutputResponse, PaneTarget};
use tracing::{debug, warn};

use crate::dispatch::{CommandPanel, Deletions, Reviews};
use crate::error::FetchError;
use crate::i18n::Localizer;
use crate::notifier::{Differencer, NotificationDecision};
use crate::panes::{
    worker_status_label, KaroPane, Pane, PaneContent, WorkerModal, WorkerStrip, KARO_LABELS,
    MODAL_LABELS, SHOGUN_LABELS,
};
use crate::preferences::{collapsed_key, CommandHistory, Preferences, KEY_NOTIFICATIONS};
use crate::render::sections::{self, default_collapsed, RenderContext};
use crate::render::{
    CommandPanelView, DashboardView, HeaderView, HistoryView, KaroView, PaneView,
    SkillReviewView, WorkerChip, WorkerStripView,
};
use crate::scheduler::{RequestTracker, Ticket};
use crate::types::{DashboardSnapshot, SectionId, WorkerId, WorkerStatus, WorkerStatusEntry};

/// One generation counter per independent request stream.
#[derive(Debug, Clone, Default)]
pub struct Trackers {
    pub dashboard: RequestTracker,
    pub workers: RequestTracker,
    pub shogun: RequestTracker,
    pub karo: RequestTracker,
    pub modal: RequestTracker,
}

#[derive(Debug)]
pub struct AppState {
    pub localizer: Localizer,
    pub prefs: Preferences,
    pub differencer: Differencer,
    pub trackers: Trackers,
    snapshot: Option<DashboardSnapshot>,
    collapsed: HashMap<SectionId, bool>,
    pub header_error: Option<String>,
    pub workers: WorkerStrip,
    pub shogun: Pane,
    pub karo: KaroPane,
    pub modal: Option<WorkerModal>,
    pub reviews: Reviews,
    pub deletions: Deletions,
    pub history: CommandHistory,
    pub command: CommandPanel,
    pub notifications_enabled: bool,
    /// Whether the dashboard is the focused, visible surface.
    pub page_visible: bool,
    pub skill_review_open: bool,
    pub auto_refresh: bool,
    pub shogun_auto_refresh: bool,
}

impl AppState {
    /// Restores language, history, collapse flags and notification opt-in.
    pub fn new(prefs: Preferences) -> Self {
        let localizer = Localizer::from_preferences(&prefs);
        let history = CommandHistory::load(&prefs);
        let collapsed = SectionId::ALL
            .into_iter()
            .map(|section| {
                let value = match collapsed_key(section) {
                    Some(key) => prefs.get(key, default_collapsed(section)),
                    None => default_collapsed(section),
                };
                (section, value)
            })
            .collect();
        let notifications_enabled = prefs.get(KEY_NOTIFICATIONS, false);

        Self {
            localizer,
            prefs,
            differencer: Differencer::new(),
            trackers: Trackers::default(),
            snapshot: None,
            collapsed,
            header_error: None,
            workers: WorkerStrip::default(),
            shogun: Pane::default(),
            karo: KaroPane::default(),
            modal: None,
            reviews: Reviews::default(),
            deletions: Deletions::default(),
            history,
            command: CommandPanel::default(),
            notifications_enabled,
            page_visible: false,
            skill_review_open: false,
            auto_refresh: true,
            shogun_auto_refresh: true,
        }
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_collapsed(&self, section: SectionId) -> bool {
        self.collapsed
            .get(&section)
            .copied()
            .unwrap_or_else(|| default_collapsed(section))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Poll results
    // ─────────────────────────────────────────────────────────────────────

    /// Applies a dashboard poll result.
    ///
    /// Only a successful, error-free payload replaces the snapshot. Failures
    /// keep the previous render and surface in the header instead.
    pub fn apply_dashboard(
        &mut self,
        ticket: Ticket,
        result: Result<DashboardSnapshot, FetchError>,
    ) -> NotificationDecision {
        if !self.trackers.dashboard.accept(ticket) {
            debug!(?ticket, "Discarding stale dashboard response");
            return NotificationDecision::default();
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "Dashboard fetch failed");
                self.header_error = Some(err.message());
                return NotificationDecision::default();
            }
        };
        if let Some(error) = &snapshot.error {
            warn!(error = %error, "Dashboard payload reported an error");
            self.header_error = Some(error.clone());
            return NotificationDecision::default();
        }

        self.header_error = None;
        let decision = self.differencer.evaluate(&snapshot);
        for (section, hint) in sections::collapse_hints(&snapshot) {
            if let Some(collapsed) = hint.forced() {
                self.collapsed.insert(section, collapsed);
            }
        }
        self.reviews
            .retain_names(snapshot.skill_candidates.iter().map(|c| c.name.as_str()));
        self.deletions
            .retain_titles(snapshot.action_required.iter().map(|a| a.title.as_str()));
        self.snapshot = Some(snapshot);
        decision
    }

    /// Worker statuses are best effort: a failure keeps the previous strip.
    pub fn apply_worker_statuses(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<WorkerStatusEntry>, FetchError>,
    ) {
        if !self.trackers.workers.accept(ticket) {
            return;
        }
        match result {
            Ok(entries) => self.workers.replace(entries),
            Err(err) => debug!(error = %err, "Worker status fetch failed"),
        }
    }

    pub fn begin_pane(&mut self, target: PaneTarget) -> Ticket {
        match target {
            PaneTarget::Shogun => {
                self.shogun.begin_refresh();
                self.trackers.shogun.begin()
            }
            PaneTarget::Karo => {
                self.karo.pane.begin_refresh();
                self.trackers.karo.begin()
            }
        }
    }

    pub fn apply_pane(
        &mut self,
        target: PaneTarget,
        ticket: Ticket,
        result: Result<PaneOutputResponse, FetchError>,
    ) {
        match target {
            PaneTarget::Shogun => {
                if self.trackers.shogun.accept(ticket) {
                    self.shogun.apply(PaneContent::from_result(&result));
                }
            }
            PaneTarget::Karo => {
                if self.trackers.karo.accept(ticket) {
                    self.karo.apply(&result);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Worker modal
    // ─────────────────────────────────────────────────────────────────────

    pub fn open_worker(&mut self, worker: WorkerId) -> Ticket {
        self.modal = Some(WorkerModal::open(worker));
        self.trackers.modal.begin()
    }

    /// Starts a refresh of the open modal; `None` when no modal is open.
    pub fn refresh_worker(&mut self) -> Option<(WorkerId, Ticket)> {
        let modal = self.modal.as_mut()?;
        modal.pane.begin_refresh();
        let worker = modal.worker.clone();
        Some((worker, self.trackers.modal.begin()))
    }

    /// Applies output for `worker` unless the modal was closed, switched to
    /// another worker, or a newer request was already applied.
    pub fn apply_worker_output(
        &mut self,
        worker: &WorkerId,
        ticket: Ticket,
        result: Result<PaneOutputResponse, FetchError>,
    ) {
        let Some(modal) = self.modal.as_mut().filter(|m| &m.worker == worker) else {
            return;
        };
        if self.trackers.modal.accept(ticket) {
            modal.pane.apply(PaneContent::from_result(&result));
        }
    }

    pub fn close_worker(&mut self) {
        self.modal = None;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operator preferences
    // ─────────────────────────────────────────────────────────────────────

    /// Flips a section. Operator-owned flags are persisted; content-derived
    /// ones last until the next applied snapshot.
    pub fn toggle_section(&mut self, section: SectionId) -> bool {
        let collapsed = !self.is_collapsed(section);
        self.collapsed.insert(section, collapsed);
        if let Some(key) = collapsed_key(section) {
            self.prefs.set(key, &collapsed);
        }
        collapsed
    }

    pub fn set_language(&mut self, code: &str) -> bool {
        self.localizer.set_language(code, &mut self.prefs)
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
        self.prefs.set(KEY_NOTIFICATIONS, &enabled);
    }

    pub fn record_command(&mut self, text: &str, timestamp_ms: i64) {
        self.history.push(text, timestamp_ms);
        self.history.save(&mut self.prefs);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Projection
    // ─────────────────────────────────────────────────────────────────────

    pub fn view(&self, now: Instant) -> DashboardView {
        let l = &self.localizer;
        let ctx = RenderContext {
            localizer: l,
            collapsed: &self.collapsed,
            reviews: &self.reviews,
            deletions: &self.deletions,
        };

        let last_updated = self
            .snapshot
            .as_ref()
            .map(|s| s.last_updated.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or("-")
            .to_string();

        let header = HeaderView {
            title: l.t("header.title").to_string(),
            last_updated_label: l.t("header.lastUpdated").to_string(),
            last_updated,
            auto_refresh_label: l.t("header.autoRefresh").to_string(),
            auto_refresh: self.auto_refresh,
            notifications_label: l
                .t(if self.notifications_enabled {
                    "notify.enabled"
                } else {
                    "notify.disabled"
                })
                .to_string(),
            language_label: format!("{} {}", l.t("lang.label"), l.language().code()),
            error: self
                .header_error
                .as_ref()
                .map(|e| format!("{} {}", l.t("header.error"), e)),
        };

        let workers = WorkerStripView {
            title: l.t("workers.title").to_string(),
            entries: self
                .workers
                .entries()
                .iter()
                .map(|entry| WorkerChip {
                    id: entry.id.clone(),
                    label: match entry.display_number {
                        Some(n) => format!("{}{}", l.t("workers.title"), n),
                        None => entry.id.clone(),
                    },
                    status: entry.status,
                    status_label: worker_status_label(entry.status, l).to_string(),
                    highlighted: entry.status == WorkerStatus::Busy,
                })
                .collect(),
        };

        let shogun = PaneView {
            title: l.t(SHOGUN_LABELS.title).to_string(),
            body: self.shogun.view(&SHOGUN_LABELS, l),
            updating: self.shogun.updating_label(&SHOGUN_LABELS, l),
            auto_refresh: Some(self.shogun_auto_refresh),
        };

        let karo = KaroView {
            label: l.t("karo.label").to_string(),
            badge: self.karo.badge_label(l),
            badge_title: l.t("karo.badgeTitle").to_string(),
            pane: self.karo.expanded.then(|| PaneView {
                title: l.t(KARO_LABELS.title).to_string(),
                body: self.karo.pane.view(&KARO_LABELS, l),
                updating: self.karo.pane.updating_label(&KARO_LABELS, l),
                auto_refresh: None,
            }),
            close_label: l.t("karo.close").to_string(),
        };

        let busy = self.command.state == crate::dispatch::ControlState::Busy;
        let command = CommandPanelView {
            title: l.t("command.title").to_string(),
            placeholder: l.t("command.placeholder").to_string(),
            input: self.command.input.clone(),
            submit_label: l
                .t(if busy { "command.sending" } else { "command.submit" })
                .to_string(),
            busy,
            message: self
                .command
                .message(now)
                .map(|m| (m.kind, m.text.clone())),
        };

        let history = HistoryView {
            title: l.t("history.title").to_string(),
            empty_label: l.t("history.empty").to_string(),
            entries: self.history.entries().to_vec(),
        };

        let modal = self.modal.as_ref().map(|modal| PaneView {
            title: modal.title(l),
            body: modal.pane.view(&MODAL_LABELS, l),
            updating: modal.pane.updating_label(&MODAL_LABELS, l),
            auto_refresh: None,
        });

        let skill_review = self.skill_review_open.then(|| SkillReviewView {
            title: l.t("skill.modalTitle").to_string(),
            empty_label: l.t("skill.empty").to_string(),
            close_label: l.t("modal.close").to_string(),
            cards: self
                .snapshot
                .iter()
                .flat_map(|s| s.skill_candidates.iter())
                .map(|candidate| sections::skill_card(candidate, &ctx))
                .collect(),
        });

        DashboardView {
            language: l.language().code().to_string(),
            page_title: l.t("page.title").to_string(),
            header,
            workers,
            shogun,
            karo,
            command,
            history,
            sections: sections::render_all(self.snapshot.as_ref(), &ctx),
            modal,
            skill_review,
            footer: l.t("footer.text").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::preferences::{MemoryStore, KEY_COMPLETED_COLLAPSED, KEY_LANGUAGE};
    use crate::render::SectionBody;
    use crate::types::{ActionItem, WorkItem};

    fn state() -> AppState {
        let mut prefs = Preferences::new(Box::new(MemoryStore::default()));
        prefs.set(KEY_LANGUAGE, "en");
        AppState::new(prefs)
    }

    fn snapshot_with_work(task: &str) -> DashboardSnapshot {
        DashboardSnapshot {
            last_updated: "12:00".to_string(),
            in_progress: vec![WorkItem {
                worker_label: Some("ashigaru1".to_string()),
                task: Some(task.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_restores_language_from_preferences() {
        assert_eq!(state().localizer.language(), Language::En);
    }

    #[test]
    fn test_fetch_failure_keeps_previous_snapshot() {
        let mut state = state();
        let ticket = state.trackers.dashboard.begin();
        state.apply_dashboard(ticket, Ok(snapshot_with_work("lint")));

        let ticket = state.trackers.dashboard.begin();
        state.apply_dashboard(ticket, Err(FetchError::Transport("refused".into())));

        assert_eq!(state.snapshot().unwrap().in_progress[0].task.as_deref(), Some("lint"));
        let view = state.view(Instant::now());
        assert_eq!(view.header.error.as_deref(), Some("Fetch error: refused"));
        assert_eq!(view.header.last_updated, "12:00");
    }

    #[test]
    fn test_payload_error_is_not_applied() {
        let mut state = state();
        let ticket = state.trackers.dashboard.begin();
        let decision = state.apply_dashboard(
            ticket,
            Ok(DashboardSnapshot {
                error: Some("dashboard.md missing".to_string()),
                ..Default::default()
            }),
        );
        assert!(decision.is_empty());
        assert!(state.snapshot().is_none());
        assert!(state.header_error.is_some());
        assert!(state.differencer.baseline().is_none());
    }

    #[test]
    fn test_stale_dashboard_response_is_discarded() {
        let mut state = state();
        let slow = state.trackers.dashboard.begin();
        let fast = state.trackers.dashboard.begin();
        state.apply_dashboard(fast, Ok(snapshot_with_work("new")));
        state.apply_dashboard(slow, Ok(snapshot_with_work("old")));
        assert_eq!(state.snapshot().unwrap().in_progress[0].task.as_deref(), Some("new"));
    }

    #[test]
    fn test_snapshot_forces_content_derived_collapse() {
        let mut state = state();
        state.toggle_section(SectionId::InProgress);
        assert!(state.is_collapsed(SectionId::InProgress));
        let stored: Option<bool> = state.prefs.get("shogun-gui-collapsed-in-progress", None);
        assert_eq!(stored, None);

        let ticket = state.trackers.dashboard.begin();
        state.apply_dashboard(ticket, Ok(snapshot_with_work("lint")));
        assert!(!state.is_collapsed(SectionId::InProgress));
        assert!(state.is_collapsed(SectionId::Waiting));
        assert!(state.is_collapsed(SectionId::CompletedToday));
    }

    #[test]
    fn test_completed_toggle_persists() {
        let mut state = state();
        assert!(!state.toggle_section(SectionId::CompletedToday));
        let reloaded: bool = state.prefs.get(KEY_COMPLETED_COLLAPSED, true);
        assert!(!reloaded);

        let ticket = state.trackers.dashboard.begin();
        state.apply_dashboard(ticket, Ok(DashboardSnapshot::default()));
        assert!(!state.is_collapsed(SectionId::CompletedToday));
    }

    #[test]
    fn test_worker_output_for_closed_modal_is_ignored() {
        let mut state = state();
        let first = state.open_worker(WorkerId::from_digits("1"));
        let second = state.open_worker(WorkerId::from_digits("2"));

        let output = |text: &str| {
            Ok(PaneOutputResponse {
                output: Some(text.to_string()),
                ..Default::default()
            })
        };
        state.apply_worker_output(&WorkerId::from_digits("1"), first, output("one"));
        assert_eq!(state.modal.as_ref().unwrap().pane.content, PaneContent::Loading);

        state.apply_worker_output(&WorkerId::from_digits("2"), second, output("two"));
        assert_eq!(
            state.modal.as_ref().unwrap().pane.content,
            PaneContent::Output("two".to_string())
        );

        state.close_worker();
        let (worker, ticket) = (WorkerId::from_digits("2"), state.trackers.modal.begin());
        state.apply_worker_output(&worker, ticket, output("late"));
        assert!(state.modal.is_none());
    }

    #[test]
    fn test_view_projects_header_and_sections() {
        let mut state = state();
        let view = state.view(Instant::now());
        assert_eq!(view.header.last_updated, "-");
        assert!(matches!(view.sections[0].body, SectionBody::Loading(_)));

        let ticket = state.trackers.dashboard.begin();
        state.apply_dashboard(
            ticket,
            Ok(DashboardSnapshot {
                action_required: vec![ActionItem {
                    title: "Key".to_string(),
                    content: String::new(),
                }],
                ..Default::default()
            }),
        );
        state.set_language("ja");
        let view = state.view(Instant::now());
        assert_eq!(view.language, "ja");
        assert_eq!(view.sections[0].title, "要対応");
        assert!(!view.sections[0].collapsed);
    }

    #[test]
    fn test_history_records_newest_first() {
        let mut state = state();
        state.record_command("first", 1);
        state.record_command("second", 2);
        let view = state.view(Instant::now());
        assert_eq!(view.history.entries[0].text, "second");
        assert_eq!(CommandHistory::load(&state.prefs).entries().len(), 2);
    }
}
