use serde_json::{json, Value};
use shogun_core::dispatch::DeleteOutcome;
use shogun_core::notifier::{
    ActivationHandler, Notification, NotificationCapability, NotificationSink, TAG_ACTION_REQUIRED,
};
use shogun_core::preferences::{JsonFileStore, Preferences};
use shogun_core::render::{DashboardView, SectionBody};
use shogun_core::{
    DashboardConfig, DashboardEngine, DispatchError, FetchError, SectionId, SnapshotFetcher,
    Transport, ViewSink,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Backend double: fixed answers per path, with every call recorded.
#[derive(Default)]
struct Backend {
    answers: Mutex<HashMap<String, Result<String, FetchError>>>,
    calls: Mutex<Vec<String>>,
    posted: Mutex<Vec<Value>>,
}

impl Backend {
    fn answer(&self, path: &str, response: Result<String, FetchError>) {
        self.answers
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    fn answer_json(&self, path: &str, body: Value) {
        self.answer(path, Ok(body.to_string()));
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn posted_commands(&self) -> Vec<String> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .filter_map(|body| body["command"].as_str().map(str::to_string))
            .collect()
    }
}

impl Transport for Backend {
    fn get(&self, path: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(path.to_string());
        self.answers
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Status {
                    code: 404,
                    body: String::new(),
                })
            })
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<String, FetchError> {
        self.posted.lock().unwrap().push(body.clone());
        self.get(path)
    }
}

#[derive(Default)]
struct CapturedViews(Mutex<Vec<DashboardView>>);

impl CapturedViews {
    fn last(&self) -> DashboardView {
        self.0.lock().unwrap().last().cloned().expect("a view was presented")
    }
}

impl ViewSink for CapturedViews {
    fn present(&self, view: &DashboardView) {
        self.0.lock().unwrap().push(view.clone());
    }
}

/// Notification double with a fixed platform answer. Activation handlers are
/// kept so a test can click a delivered notification.
struct RecordingNotifier {
    capability: NotificationCapability,
    delivered: Mutex<Vec<Notification>>,
    dismissed: Mutex<Vec<String>>,
    on_activate: Mutex<Option<ActivationHandler>>,
}

impl RecordingNotifier {
    fn with_capability(capability: NotificationCapability) -> Self {
        Self {
            capability,
            delivered: Mutex::new(Vec::new()),
            dismissed: Mutex::new(Vec::new()),
            on_activate: Mutex::new(None),
        }
    }

    fn delivered_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    fn click(&self, tag: &str) {
        let handler = self.on_activate.lock().unwrap().clone();
        (handler.expect("engine installed a handler"))(tag);
    }
}

impl NotificationSink for RecordingNotifier {
    fn capability(&self) -> NotificationCapability {
        self.capability
    }

    fn request_permission(&self) -> NotificationCapability {
        self.capability
    }

    fn deliver(&self, notification: &Notification) -> shogun_core::Result<()> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn set_activation_handler(&self, handler: ActivationHandler) {
        *self.on_activate.lock().unwrap() = Some(handler);
    }

    fn dismiss(&self, tag: &str) -> shogun_core::Result<()> {
        self.dismissed.lock().unwrap().push(tag.to_string());
        Ok(())
    }
}

struct Harness {
    backend: Arc<Backend>,
    views: Arc<CapturedViews>,
    notifier: Arc<RecordingNotifier>,
    engine: DashboardEngine,
    _temp: TempDir,
}

fn harness() -> Harness {
    let temp = TempDir::new().unwrap();
    let prefs = Preferences::new(Box::new(
        JsonFileStore::open(temp.path().join("preferences.json")).unwrap(),
    ));
    harness_with(temp, prefs)
}

fn harness_with(temp: TempDir, prefs: Preferences) -> Harness {
    harness_with_notifier(temp, prefs, NotificationCapability::Granted)
}

fn harness_with_notifier(
    temp: TempDir,
    mut prefs: Preferences,
    capability: NotificationCapability,
) -> Harness {
    if prefs.get::<Option<String>>("shogun-gui-lang", None).is_none() {
        prefs.set("shogun-gui-lang", "en");
    }
    let backend = Arc::new(Backend::default());
    let views = Arc::new(CapturedViews::default());
    let notifier = Arc::new(RecordingNotifier::with_capability(capability));
    let engine = DashboardEngine::new(
        DashboardConfig::default(),
        SnapshotFetcher::new(backend.clone()),
        prefs,
        notifier.clone(),
        views.clone(),
    );
    Harness {
        backend,
        views,
        notifier,
        engine,
        _temp: temp,
    }
}

fn dashboard(body: Value) -> Value {
    let mut base = json!({
        "last_updated": "2026-10-18 09:00",
        "action_required": [],
        "in_progress": [],
        "completed_today": [],
        "skill_candidates": [],
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), body.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

fn section(view: &DashboardView, id: SectionId) -> shogun_core::render::RenderedSection {
    view.sections
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .expect("section is rendered")
}

#[test]
fn test_pending_candidate_badge_with_empty_actions() {
    let h = harness();
    h.backend.answer_json(
        "/api/dashboard",
        dashboard(json!({
            "skill_candidates": [{
                "name": "lint-fixer",
                "description": "Fixes lint",
                "source": "cmd_12",
                "status": "承認待ち"
            }]
        })),
    );

    h.engine.refresh_dashboard();
    let action = section(&h.views.last(), SectionId::ActionRequired);

    let badge = action.badge.expect("badge present");
    assert_eq!(badge.count, 1);
    assert!(!action.collapsed);
    assert!(matches!(action.body, SectionBody::Empty(_)));
}

#[test]
fn test_empty_command_fails_without_network() {
    let h = harness();

    let result = h.engine.send_command("   ");

    assert!(matches!(result, Err(DispatchError::EmptyCommand)));
    assert!(result.unwrap_err().is_validation());
    assert_eq!(h.backend.call_count(), 0);
    let command = h.views.last().command;
    assert!(!command.busy);
    assert!(command.message.is_some());
}

#[test]
fn test_fetch_failures_keep_last_table() {
    let h = harness();
    h.backend.answer_json(
        "/api/dashboard",
        dashboard(json!({
            "in_progress": [{"担当": "足軽2", "任務": "lint", "状態": "作業中"}]
        })),
    );
    h.engine.refresh_dashboard();
    let before = section(&h.views.last(), SectionId::InProgress);

    h.backend.answer(
        "/api/dashboard",
        Err(FetchError::Transport("connection refused".to_string())),
    );
    h.engine.refresh_dashboard();
    h.engine.refresh_dashboard();

    let view = h.views.last();
    assert_eq!(section(&view, SectionId::InProgress), before);
    assert!(view.header.error.is_some());
    assert_eq!(view.header.last_updated, "2026-10-18 09:00");

    h.backend
        .answer_json("/api/dashboard", dashboard(json!({})));
    h.engine.refresh_dashboard();
    assert!(h.views.last().header.error.is_none());
}

#[test]
fn test_language_survives_reload() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("preferences.json");
    {
        let prefs = Preferences::new(Box::new(JsonFileStore::open(&path).unwrap()));
        let h = harness_with(TempDir::new().unwrap(), prefs);
        assert!(h.engine.set_language("ja"));
        assert!(!h.engine.set_language("fr"));
    }

    let prefs = Preferences::new(Box::new(JsonFileStore::open(&path).unwrap()));
    let h = harness_with(temp, prefs);
    assert_eq!(h.engine.view().language, "ja");
}

#[test]
fn test_successful_command_is_recorded() {
    let h = harness();
    h.backend
        .answer_json("/api/command", json!({"success": true}));

    let accepted = h.engine.send_command("  進軍せよ  ").unwrap();

    assert_eq!(accepted.command, "進軍せよ");
    assert_eq!(h.backend.posted_commands(), vec!["進軍せよ"]);
    let history = h.views.last().history;
    assert_eq!(history.entries.len(), 1);
    assert_eq!(history.entries[0].text, "進軍せよ");
    assert!(h.views.last().command.input.is_empty());
}

#[test]
fn test_failed_command_keeps_input() {
    let h = harness();
    h.backend.answer(
        "/api/command",
        Err(FetchError::Status {
            code: 500,
            body: String::new(),
        }),
    );

    assert!(h.engine.send_command("attack the east gate").is_err());

    let command = h.views.last().command;
    assert_eq!(command.input, "attack the east gate");
    assert!(!command.busy);
}

#[test]
fn test_rejected_command_surfaces_reason() {
    let h = harness();
    h.backend.answer(
        "/api/command",
        Err(FetchError::Status {
            code: 400,
            body: json!({"success": false, "error": "queue full"}).to_string(),
        }),
    );

    let err = h.engine.send_command("attack").unwrap_err();

    assert_eq!(err.reason().as_deref(), Some("queue full"));
    assert!(h.views.last().history.entries.is_empty());
}

#[test]
fn test_declined_delete_sends_nothing() {
    let h = harness();
    let decline = |_: &str| false;

    let outcome = h.engine.delete_action("Deploy", &decline).unwrap();

    assert_eq!(outcome, DeleteOutcome::Declined);
    assert!(h.backend.posted_commands().is_empty());
}

#[test]
fn test_confirmed_delete_posts_command() {
    let h = harness();
    h.backend
        .answer_json("/api/command", json!({"success": true}));
    let accept = |_: &str| true;

    let outcome = h.engine.delete_action("Deploy", &accept).unwrap();

    assert_eq!(outcome, DeleteOutcome::Sent);
    let posted = h.backend.posted_commands();
    assert_eq!(posted.len(), 1);
    assert!(posted[0].contains("Deploy"));
}

#[test]
fn test_approve_requires_pending_candidate() {
    let h = harness();
    h.backend.answer_json("/api/dashboard", dashboard(json!({})));
    h.engine.refresh_dashboard();

    let err = h.engine.approve_skill("ghost").unwrap_err();

    assert!(matches!(err, DispatchError::NotPending(_)));
    assert!(h.backend.posted_commands().is_empty());
}

#[test]
fn test_notifications_follow_counter_increase() {
    let h = harness();
    assert_eq!(
        h.engine.set_notifications(true),
        NotificationCapability::Granted
    );
    h.backend.answer_json("/api/dashboard", dashboard(json!({})));
    h.engine.refresh_dashboard();
    assert!(h.notifier.delivered.lock().unwrap().is_empty());

    h.backend.answer_json(
        "/api/dashboard",
        dashboard(json!({
            "action_required": [{"title": "Review PR", "content": "**now**"}]
        })),
    );
    h.engine.refresh_dashboard();

    assert_eq!(h.notifier.delivered.lock().unwrap().len(), 1);
}

fn one_action() -> Value {
    dashboard(json!({
        "action_required": [{"title": "Review PR", "content": "**now**"}]
    }))
}

#[test]
fn test_denied_permission_keeps_notifications_off() {
    let temp = TempDir::new().unwrap();
    let prefs_path = temp.path().join("preferences.json");
    let prefs = Preferences::new(Box::new(JsonFileStore::open(prefs_path.clone()).unwrap()));
    let h = harness_with_notifier(temp, prefs, NotificationCapability::NotGranted);

    assert_eq!(
        h.engine.set_notifications(true),
        NotificationCapability::NotGranted
    );
    assert!(!h.engine.state().lock().unwrap().notifications_enabled);

    h.backend.answer_json("/api/dashboard", dashboard(json!({})));
    h.engine.refresh_dashboard();
    h.backend.answer_json("/api/dashboard", one_action());
    h.engine.refresh_dashboard();

    assert_eq!(h.notifier.delivered_count(), 0);
    let reopened = Preferences::new(Box::new(JsonFileStore::open(prefs_path).unwrap()));
    assert_eq!(
        reopened.get::<Option<bool>>("shogun-gui-notifications", None),
        None
    );
}

#[test]
fn test_visible_dashboard_suppresses_notifications() {
    let h = harness();
    h.engine.set_notifications(true);
    h.engine.set_page_visible(true);
    h.backend.answer_json("/api/dashboard", dashboard(json!({})));
    h.engine.refresh_dashboard();

    h.backend.answer_json("/api/dashboard", one_action());
    h.engine.refresh_dashboard();

    assert_eq!(h.notifier.delivered_count(), 0);
}

#[test]
fn test_clicking_notification_focuses_dashboard() {
    let h = harness();
    h.engine.set_notifications(true);
    h.backend.answer_json("/api/dashboard", dashboard(json!({})));
    h.engine.refresh_dashboard();
    h.backend.answer_json("/api/dashboard", one_action());
    h.engine.refresh_dashboard();
    let delivered = h.notifier.delivered.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].tag, TAG_ACTION_REQUIRED);
    let presented = h.views.0.lock().unwrap().len();

    h.notifier.click(&delivered[0].tag);

    assert!(h.engine.state().lock().unwrap().page_visible);
    assert_eq!(
        *h.notifier.dismissed.lock().unwrap(),
        vec![TAG_ACTION_REQUIRED.to_string()]
    );
    assert!(h.views.0.lock().unwrap().len() > presented);

    // In front now, so the next increase stays quiet.
    h.backend.answer_json(
        "/api/dashboard",
        dashboard(json!({
            "action_required": [
                {"title": "Review PR", "content": "**now**"},
                {"title": "Sign off", "content": "today"}
            ]
        })),
    );
    h.engine.refresh_dashboard();
    assert_eq!(h.notifier.delivered_count(), 1);
}

#[test]
fn test_worker_modal_loads_output() {
    let h = harness();
    h.backend.answer_json(
        "/api/ashigaru/ashigaru3/output",
        json!({"output": "line one\nline two"}),
    );

    assert!(h.engine.open_worker_label("足軽3"));
    assert!(!h.engine.open_worker_label("家老"));

    let modal = h.views.last().modal.expect("modal open");
    assert!(modal.title.contains('3'));

    h.engine.close_worker();
    assert!(h.views.last().modal.is_none());
}
