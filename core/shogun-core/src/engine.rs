//! Composition root: wires fetcher, dispatcher, schedulers, notifications and
//! a view sink around one shared [`AppState`].
//!
//! Every operation follows the same shape: take the lock to record intent and
//! get a ticket, release it for the network call, take it again to apply the
//! result and project a view, release it, then present. The lock is never
//! held across I/O, so operator input is not blocked by a slow backend.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use shogun_protocol::PaneTarget;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::config::DashboardConfig;
use crate::dispatch::{CommandAccepted, CommandDispatcher, Confirmer, DeleteOutcome, ReviewAction};
use crate::error::{DispatchError, Result};
use crate::fetcher::SnapshotFetcher;
use crate::notifier::{should_deliver, NotificationCapability, NotificationSink};
use crate::preferences::Preferences;
use crate::render::DashboardView;
use crate::scheduler::Scheduler;
use crate::types::{DashboardSnapshot, SectionId, WorkerId};

pub type SharedState = Arc<Mutex<AppState>>;

/// Presents projected views. Implementations must not call back into the
/// engine from `present`.
pub trait ViewSink: Send + Sync {
    fn present(&self, view: &DashboardView);
}

/// Sink that drops every view, for one-shot commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ViewSink for NullSink {
    fn present(&self, _view: &DashboardView) {}
}

/// The shared half of the engine, captured by scheduler threads.
struct Core {
    state: SharedState,
    fetcher: SnapshotFetcher,
    dispatcher: CommandDispatcher,
    notifier: Arc<dyn NotificationSink>,
    sink: Arc<dyn ViewSink>,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn present(&self) {
        let view = self.lock().view(Instant::now());
        self.sink.present(&view);
    }

    fn refresh_dashboard(&self) {
        let (ticket, worker_ticket) = {
            let mut state = self.lock();
            (state.trackers.dashboard.begin(), state.trackers.workers.begin())
        };
        let result = self.fetcher.fetch_dashboard();
        let statuses = self.fetcher.fetch_worker_statuses();
        let capability = self.notifier.capability();

        let (notifications, view) = {
            let mut state = self.lock();
            let decision = state.apply_dashboard(ticket, result);
            state.apply_worker_statuses(worker_ticket, statuses);
            let notifications = if decision.is_empty() {
                Vec::new()
            } else if should_deliver(state.notifications_enabled, capability, state.page_visible) {
                decision.notifications(&state.localizer)
            } else {
                debug!(?decision, "Notification suppressed");
                Vec::new()
            };
            (notifications, state.view(Instant::now()))
        };

        for notification in &notifications {
            info!(tag = %notification.tag, "Delivering notification");
            if let Err(err) = self.notifier.deliver(notification) {
                warn!(error = %err, "Notification delivery failed");
            }
        }
        self.sink.present(&view);
    }

    /// The operator clicked a notification: the dashboard is in front again.
    fn activate(&self, tag: &str) {
        debug!(tag, "Notification activated");
        self.lock().page_visible = true;
        if let Err(err) = self.notifier.dismiss(tag) {
            warn!(error = %err, tag, "Notification dismissal failed");
        }
        self.present();
    }

    fn refresh_pane(&self, target: PaneTarget, show_progress: bool) {
        let ticket = self.lock().begin_pane(target);
        if show_progress {
            self.present();
        }
        let result = self.fetcher.fetch_pane(target);
        let view = {
            let mut state = self.lock();
            state.apply_pane(target, ticket, result);
            state.view(Instant::now())
        };
        self.sink.present(&view);
    }

    fn load_worker(&self, worker: WorkerId, ticket: crate::scheduler::Ticket) {
        self.present();
        let result = self.fetcher.fetch_worker_output(&worker);
        let view = {
            let mut state = self.lock();
            state.apply_worker_output(&worker, ticket, result);
            state.view(Instant::now())
        };
        self.sink.present(&view);
    }

    /// Runs one dispatch with the shared busy/idle handling of the command
    /// panel, then records history on success.
    fn send_command(&self, text: &str) -> std::result::Result<CommandAccepted, DispatchError> {
        {
            let mut state = self.lock();
            state.command.begin()?;
            state.command.input = text.to_string();
        }
        self.present();

        let result = self.dispatcher.send(text);
        {
            let mut state = self.lock();
            let now = Instant::now();
            match &result {
                Ok(accepted) => {
                    let localizer = state.localizer;
                    state.command.succeed(&localizer, now);
                    state.record_command(&accepted.command, chrono::Utc::now().timestamp_millis());
                }
                Err(err) => {
                    let localizer = state.localizer;
                    state.command.fail(err, &localizer, now);
                }
            }
        }
        self.present();
        result
    }

    fn finish_review(
        &self,
        name: &str,
        action: ReviewAction,
        command: String,
    ) -> std::result::Result<CommandAccepted, DispatchError> {
        self.present();
        let result = self.dispatcher.send(&command);
        {
            let mut state = self.lock();
            let localizer = state.localizer;
            state.reviews.finish(name, action, &result, &localizer);
        }
        self.present();
        result
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════════════

pub struct DashboardEngine {
    core: Arc<Core>,
    config: DashboardConfig,
    dashboard_timer: Scheduler,
    shogun_timer: Scheduler,
    karo_timer: Scheduler,
}

impl DashboardEngine {
    pub fn new(
        config: DashboardConfig,
        fetcher: SnapshotFetcher,
        prefs: Preferences,
        notifier: Arc<dyn NotificationSink>,
        sink: Arc<dyn ViewSink>,
    ) -> Self {
        let mut state = AppState::new(prefs);
        state.auto_refresh = config.auto_refresh;
        state.shogun_auto_refresh = config.shogun_auto_refresh;

        let core = Core {
            state: Arc::new(Mutex::new(state)),
            dispatcher: CommandDispatcher::new(fetcher.clone()),
            fetcher,
            notifier,
            sink,
        };
        let core = Arc::new(core);
        let weak: Weak<Core> = Arc::downgrade(&core);
        core.notifier.set_activation_handler(Arc::new(move |tag: &str| {
            if let Some(core) = weak.upgrade() {
                core.activate(tag);
            }
        }));
        Self {
            core,
            config,
            dashboard_timer: Scheduler::new("dashboard"),
            shogun_timer: Scheduler::new("shogun"),
            karo_timer: Scheduler::new("karo"),
        }
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.core.state)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Starts the karo loop, and the dashboard and shogun loops if their
    /// auto-refresh is on.
    pub fn start(&mut self) -> Result<()> {
        let (auto, shogun_auto) = {
            let state = self.core.lock();
            (state.auto_refresh, state.shogun_auto_refresh)
        };
        if auto {
            self.start_dashboard_timer()?;
        } else {
            self.core.refresh_dashboard();
        }
        if shogun_auto {
            self.start_shogun_timer()?;
        }
        let core = Arc::clone(&self.core);
        self.karo_timer.start(self.config.karo_interval(), move || {
            core.refresh_pane(PaneTarget::Karo, false)
        })?;
        info!(base_url = %self.config.base_url, "Dashboard engine started");
        Ok(())
    }

    pub fn stop(&mut self) {
        self.dashboard_timer.stop();
        self.shogun_timer.stop();
        self.karo_timer.stop();
        debug!("Dashboard engine stopped");
    }

    fn start_dashboard_timer(&mut self) -> Result<()> {
        let core = Arc::clone(&self.core);
        self.dashboard_timer
            .start(self.config.dashboard_interval(), move || core.refresh_dashboard())
    }

    fn start_shogun_timer(&mut self) -> Result<()> {
        let core = Arc::clone(&self.core);
        self.shogun_timer.start(self.config.shogun_interval(), move || {
            core.refresh_pane(PaneTarget::Shogun, false)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────────────────

    /// One dashboard poll on the calling thread.
    pub fn refresh_dashboard(&self) {
        self.core.refresh_dashboard();
    }

    /// Manual pane refresh: shows the updating state, then the result.
    pub fn refresh_pane(&self, target: PaneTarget) {
        self.core.refresh_pane(target, true);
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) -> Result<()> {
        self.core.lock().auto_refresh = enabled;
        if enabled {
            self.start_dashboard_timer()?;
        } else {
            self.dashboard_timer.stop();
            self.core.present();
        }
        Ok(())
    }

    pub fn set_shogun_auto_refresh(&mut self, enabled: bool) -> Result<()> {
        self.core.lock().shogun_auto_refresh = enabled;
        if enabled {
            self.start_shogun_timer()?;
        } else {
            self.shogun_timer.stop();
            self.core.present();
        }
        Ok(())
    }

    pub fn toggle_karo(&self) -> bool {
        let expanded = {
            let mut state = self.core.lock();
            state.karo.expanded = !state.karo.expanded;
            state.karo.expanded
        };
        self.core.present();
        expanded
    }

    // ─────────────────────────────────────────────────────────────────────
    // Worker modal
    // ─────────────────────────────────────────────────────────────────────

    /// Opens the detail view for the worker behind an in-progress label.
    /// Returns false for labels that resolve to no worker.
    pub fn open_worker_label(&self, label: &str) -> bool {
        match crate::identity::resolve(label) {
            Some(worker) => {
                self.open_worker(worker);
                true
            }
            None => false,
        }
    }

    pub fn open_worker(&self, worker: WorkerId) {
        let ticket = self.core.lock().open_worker(worker.clone());
        self.core.load_worker(worker, ticket);
    }

    pub fn refresh_worker(&self) {
        let Some((worker, ticket)) = self.core.lock().refresh_worker() else {
            return;
        };
        self.core.load_worker(worker, ticket);
    }

    pub fn close_worker(&self) {
        self.core.lock().close_worker();
        self.core.present();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────

    pub fn send_command(&self, text: &str) -> std::result::Result<CommandAccepted, DispatchError> {
        self.core.send_command(text)
    }

    pub fn approve_skill(&self, name: &str) -> std::result::Result<CommandAccepted, DispatchError> {
        let command = {
            let mut state = self.core.lock();
            let candidate = find_candidate(state.snapshot(), name)?;
            state.reviews.begin_approve(&candidate)?
        };
        self.core.finish_review(name, ReviewAction::Approve, command)
    }

    /// Reveals the rejection reason input. Nothing is sent yet.
    pub fn begin_reject(&self, name: &str) -> std::result::Result<(), DispatchError> {
        {
            let mut state = self.core.lock();
            let candidate = find_candidate(state.snapshot(), name)?;
            state.reviews.open_reject(&candidate)?;
        }
        self.core.present();
        Ok(())
    }

    pub fn confirm_reject(
        &self,
        name: &str,
        reason: Option<&str>,
    ) -> std::result::Result<CommandAccepted, DispatchError> {
        let command = self.core.lock().reviews.begin_confirm_reject(name, reason)?;
        self.core.finish_review(name, ReviewAction::Reject, command)
    }

    /// Asks `confirmer` first; a declined confirmation sends nothing.
    pub fn delete_action(
        &self,
        title: &str,
        confirmer: &dyn Confirmer,
    ) -> std::result::Result<DeleteOutcome, DispatchError> {
        let prompt = self.core.lock().localizer.t("action.deleteConfirm").to_string();
        if !confirmer.confirm(&prompt) {
            debug!(title, "Deletion declined");
            return Ok(DeleteOutcome::Declined);
        }

        let command = self.core.lock().deletions.begin(title)?;
        self.core.present();
        let result = self.core.dispatcher.send(&command);
        self.core.lock().deletions.finish(title, &result);
        self.core.present();
        result.map(|_| DeleteOutcome::Sent)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Preferences and surfaces
    // ─────────────────────────────────────────────────────────────────────

    pub fn toggle_section(&self, section: SectionId) -> bool {
        let collapsed = self.core.lock().toggle_section(section);
        self.core.present();
        collapsed
    }

    pub fn set_language(&self, code: &str) -> bool {
        let accepted = self.core.lock().set_language(code);
        if accepted {
            self.core.present();
        }
        accepted
    }

    /// Turning notifications on first asks the platform; the opt-in flips
    /// only once permission is granted. Returns the resulting capability.
    pub fn set_notifications(&self, enabled: bool) -> NotificationCapability {
        if !enabled {
            self.core.lock().set_notifications_enabled(false);
            self.core.present();
            return self.core.notifier.capability();
        }
        let capability = match self.core.notifier.capability() {
            NotificationCapability::Granted => NotificationCapability::Granted,
            NotificationCapability::NotGranted => self.core.notifier.request_permission(),
            NotificationCapability::Unsupported => NotificationCapability::Unsupported,
        };
        if capability == NotificationCapability::Granted {
            self.core.lock().set_notifications_enabled(true);
        }
        self.core.present();
        capability
    }

    pub fn set_page_visible(&self, visible: bool) {
        self.core.lock().page_visible = visible;
    }

    pub fn open_skill_review(&self) {
        self.core.lock().skill_review_open = true;
        self.core.present();
    }

    pub fn close_skill_review(&self) {
        self.core.lock().skill_review_open = false;
        self.core.present();
    }

    pub fn present(&self) {
        self.core.present();
    }

    pub fn view(&self) -> DashboardView {
        self.core.lock().view(Instant::now())
    }

    pub fn snapshot(&self) -> Option<DashboardSnapshot> {
        self.core.lock().snapshot().cloned()
    }
}

impl Drop for DashboardEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn find_candidate(
    snapshot: Option<&DashboardSnapshot>,
    name: &str,
) -> std::result::Result<crate::types::SkillCandidate, DispatchError> {
    snapshot
        .and_then(|s| s.skill_candidates.iter().find(|c| c.name == name))
        .cloned()
        .ok_or_else(|| DispatchError::NotPending(name.to_string()))
}
