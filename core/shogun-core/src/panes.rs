//! Terminal pane sub-views: shogun, karo, a worker's detail modal, and the
//! worker status strip.
//!
//! Unlike the dashboard sections, panes do not keep stale content on
//! failure; a failed fetch replaces the pane body with the error.

use shogun_protocol::PaneOutputResponse;

use crate::error::FetchError;
use crate::i18n::Localizer;
use crate::types::{WorkerId, WorkerStatus, WorkerStatusEntry};

/// Lines of pane output kept visible in bounded views.
pub const TAIL_LINES: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaneContent {
    #[default]
    Loading,
    Output(String),
    NoOutput,
    PayloadError(String),
    FetchFailed(String),
}

impl PaneContent {
    /// A payload `error` wins over an empty output.
    pub fn from_response(response: &PaneOutputResponse) -> Self {
        if let Some(error) = response.error.as_deref().filter(|e| !e.trim().is_empty()) {
            return PaneContent::PayloadError(error.to_string());
        }
        match response.output.as_deref() {
            Some(output) if !output.trim().is_empty() => PaneContent::Output(output.to_string()),
            _ => PaneContent::NoOutput,
        }
    }

    pub fn from_result(result: &Result<PaneOutputResponse, FetchError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(err) => PaneContent::FetchFailed(err.message()),
        }
    }
}

/// A pane's content plus whether a refresh is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pane {
    pub content: PaneContent,
    pub in_flight: bool,
}

impl Pane {
    pub fn begin_refresh(&mut self) {
        self.in_flight = true;
    }

    pub fn apply(&mut self, content: PaneContent) {
        self.content = content;
        self.in_flight = false;
    }

    pub fn view(&self, labels: &PaneLabels, localizer: &Localizer) -> PaneBody {
        match &self.content {
            PaneContent::Loading => PaneBody::Loading(localizer.t(labels.loading).to_string()),
            PaneContent::Output(output) => PaneBody::Output(output.clone()),
            PaneContent::NoOutput => PaneBody::Message {
                text: localizer.t(labels.no_output).to_string(),
                is_error: false,
            },
            PaneContent::PayloadError(error) => PaneBody::Message {
                text: format!("{} {}", localizer.t(labels.error), error),
                is_error: true,
            },
            PaneContent::FetchFailed(error) => PaneBody::Message {
                text: format!("{} {}", localizer.t(labels.fetch_failed), error),
                is_error: true,
            },
        }
    }

    /// "Updating" label while a refresh runs over existing content.
    pub fn updating_label(&self, labels: &PaneLabels, localizer: &Localizer) -> Option<String> {
        (self.in_flight && self.content != PaneContent::Loading)
            .then(|| localizer.t(labels.updating).to_string())
    }
}

/// Translation keys for one pane's states.
#[derive(Debug, Clone, Copy)]
pub struct PaneLabels {
    pub title: &'static str,
    pub loading: &'static str,
    pub updating: &'static str,
    pub error: &'static str,
    pub no_output: &'static str,
    pub fetch_failed: &'static str,
}

pub const SHOGUN_LABELS: PaneLabels = PaneLabels {
    title: "shogun.title",
    loading: "shogun.loading",
    updating: "shogun.updating",
    error: "shogun.error",
    no_output: "shogun.noOutput",
    fetch_failed: "shogun.fetchFailed",
};

pub const KARO_LABELS: PaneLabels = PaneLabels {
    title: "karo.title",
    loading: "karo.loading",
    updating: "karo.updating",
    error: "karo.error",
    no_output: "karo.noOutput",
    fetch_failed: "karo.fetchFailed",
};

pub const MODAL_LABELS: PaneLabels = PaneLabels {
    title: "modal.ashigaruTitle",
    loading: "modal.loading",
    updating: "modal.updating",
    error: "modal.error",
    no_output: "modal.noOutput",
    fetch_failed: "modal.fetchFailed",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneBody {
    Loading(String),
    Output(String),
    Message { text: String, is_error: bool },
}

/// The last `lines` lines of `output`.
pub fn tail(output: &str, lines: usize) -> &str {
    if lines == 0 {
        return "";
    }
    let body = output.trim_end_matches('\n');
    match body.rmatch_indices('\n').nth(lines - 1) {
        Some((index, _)) => &output[index + 1..],
        None => output,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Karo
// ═══════════════════════════════════════════════════════════════════════════════

/// Karo pane: polled like the shogun pane, with a busy/idle badge and a
/// collapsible terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KaroPane {
    pub pane: Pane,
    pub status: WorkerStatus,
    pub expanded: bool,
}

impl Default for KaroPane {
    fn default() -> Self {
        Self {
            pane: Pane::default(),
            status: WorkerStatus::Unknown,
            expanded: false,
        }
    }
}

impl KaroPane {
    pub fn apply(&mut self, result: &Result<PaneOutputResponse, FetchError>) {
        if let Ok(response) = result {
            self.status = WorkerStatus::from_wire(response.status.as_deref());
        }
        self.pane.apply(PaneContent::from_result(result));
    }

    pub fn badge_label(&self, localizer: &Localizer) -> Option<String> {
        match self.status {
            WorkerStatus::Busy => Some(localizer.t("karo.busy").to_string()),
            WorkerStatus::Idle => Some(localizer.t("karo.idle").to_string()),
            WorkerStatus::Unknown => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Worker Modal
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerModal {
    pub worker: WorkerId,
    pub pane: Pane,
}

impl WorkerModal {
    pub fn open(worker: WorkerId) -> Self {
        Self {
            worker,
            pane: Pane {
                content: PaneContent::Loading,
                in_flight: true,
            },
        }
    }

    pub fn title(&self, localizer: &Localizer) -> String {
        match self.worker.number() {
            Some(number) => localizer.t_n(MODAL_LABELS.title, number),
            None => self.worker.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Worker Status Strip
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStrip {
    entries: Vec<WorkerStatusEntry>,
}

impl WorkerStrip {
    /// Replaces the strip, ordered by display number; unnumbered entries last.
    pub fn replace(&mut self, mut entries: Vec<WorkerStatusEntry>) {
        entries.sort_by(|a, b| {
            (a.display_number.is_none(), a.display_number, &a.id)
                .cmp(&(b.display_number.is_none(), b.display_number, &b.id))
        });
        self.entries = entries;
    }

    pub fn entries(&self) -> &[WorkerStatusEntry] {
        &self.entries
    }
}

pub fn worker_status_label(status: WorkerStatus, localizer: &Localizer) -> &'static str {
    let key = match status {
        WorkerStatus::Busy => "workers.busy",
        WorkerStatus::Idle => "workers.idle",
        WorkerStatus::Unknown => "workers.unknown",
    };
    localizer.t(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;

    fn response(output: Option<&str>, error: Option<&str>) -> PaneOutputResponse {
        PaneOutputResponse {
            output: output.map(str::to_string),
            error: error.map(str::to_string),
            status: None,
        }
    }

    #[test]
    fn payload_error_wins_over_missing_output() {
        assert_eq!(
            PaneContent::from_response(&response(None, Some("session missing"))),
            PaneContent::PayloadError("session missing".to_string())
        );
        assert_eq!(
            PaneContent::from_response(&response(Some("x"), Some("boom"))),
            PaneContent::PayloadError("boom".to_string())
        );
    }

    #[test]
    fn blank_output_is_no_output() {
        assert_eq!(
            PaneContent::from_response(&response(Some("  \n"), None)),
            PaneContent::NoOutput
        );
    }

    #[test]
    fn fetch_failure_replaces_content() {
        let mut pane = Pane::default();
        pane.apply(PaneContent::Output("old".to_string()));
        pane.apply(PaneContent::from_result(&Err(FetchError::Status {
            code: 500,
            body: String::new(),
        })));
        let body = pane.view(&SHOGUN_LABELS, &Localizer::new(Language::En));
        assert_eq!(
            body,
            PaneBody::Message {
                text: "Fetch failed: HTTP error: 500".to_string(),
                is_error: true
            }
        );
    }

    #[test]
    fn updating_label_only_over_existing_content() {
        let localizer = Localizer::new(Language::Ja);
        let mut pane = Pane::default();
        pane.begin_refresh();
        assert_eq!(pane.updating_label(&SHOGUN_LABELS, &localizer), None);

        pane.apply(PaneContent::Output("x".to_string()));
        pane.begin_refresh();
        assert_eq!(
            pane.updating_label(&SHOGUN_LABELS, &localizer).as_deref(),
            Some("更新中...")
        );
    }

    #[test]
    fn tail_keeps_latest_lines() {
        assert_eq!(tail("a\nb\nc\nd\n", 2), "c\nd\n");
        assert_eq!(tail("a\nb", 5), "a\nb");
        assert_eq!(tail("", 3), "");
    }

    #[test]
    fn karo_badge_tracks_status() {
        let localizer = Localizer::new(Language::En);
        let mut karo = KaroPane::default();
        assert_eq!(karo.badge_label(&localizer), None);
        karo.apply(&Ok(PaneOutputResponse {
            output: Some("working".to_string()),
            error: None,
            status: Some("busy".to_string()),
        }));
        assert_eq!(karo.badge_label(&localizer).as_deref(), Some("Busy"));
    }

    #[test]
    fn modal_title_uses_worker_number() {
        let modal = WorkerModal::open(WorkerId::from_digits("4"));
        assert_eq!(modal.title(&Localizer::new(Language::Ja)), "足軽4 進行状況");
        assert_eq!(modal.title(&Localizer::new(Language::En)), "Ashigaru 4 Status");
    }

    #[test]
    fn strip_sorts_by_number() {
        let entry = |id: &str, num: Option<u32>, status| WorkerStatusEntry {
            id: id.to_string(),
            display_number: num,
            status,
        };
        let mut strip = WorkerStrip::default();
        strip.replace(vec![
            entry("ashigaru10", Some(10), WorkerStatus::Idle),
            entry("mystery", None, WorkerStatus::Unknown),
            entry("ashigaru2", Some(2), WorkerStatus::Busy),
        ]);
        let ids: Vec<_> = strip.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ashigaru2", "ashigaru10", "mystery"]);
    }
}
