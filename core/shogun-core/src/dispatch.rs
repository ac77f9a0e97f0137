//! Command dispatch and the optimistic UI state around it.
//!
//! Free-text commands, skill approvals, skill rejections and action-item
//! deletions all go through [`CommandDispatcher::send`]. The latter three
//! synthesize a Japanese instruction for the shogun; the backend reads these
//! verbatim, so they do not follow the UI language.

use shogun_protocol::CommandRequest;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::DispatchError;
use crate::fetcher::SnapshotFetcher;
use crate::i18n::Localizer;
use crate::types::SkillCandidate;

/// How long an inline command message stays visible.
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);

pub fn approve_command(name: &str) -> String {
    format!("スキル化候補「{}」を承認する。スキルを作成せよ。", name)
}

pub fn reject_command(name: &str, reason: Option<&str>) -> String {
    let mut command = format!("スキル化候補「{}」を否認する。", name);
    if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
        command.push_str(" 理由: ");
        command.push_str(reason);
    }
    command
}

pub fn delete_command(title: &str) -> String {
    format!("dashboard.md の要対応「{}」を削除せよ。", title)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAccepted {
    pub command: String,
}

#[derive(Clone)]
pub struct CommandDispatcher {
    fetcher: SnapshotFetcher,
}

impl CommandDispatcher {
    pub fn new(fetcher: SnapshotFetcher) -> Self {
        Self { fetcher }
    }

    /// Sends `text` to the shogun. Blank text fails validation without
    /// touching the network.
    pub fn send(&self, text: &str) -> Result<CommandAccepted, DispatchError> {
        let request =
            CommandRequest::new(text.trim()).map_err(|_| DispatchError::EmptyCommand)?;
        let response = self.fetcher.post_command(&request).map_err(|err| {
            warn!(error = %err, "Command post failed");
            DispatchError::from(err)
        })?;
        if !response.success {
            let reason = response.error.filter(|e| !e.trim().is_empty());
            warn!(reason = ?reason, "Command rejected");
            return Err(DispatchError::Rejected { reason });
        }
        info!(command = %request.command, "Command accepted");
        Ok(CommandAccepted {
            command: request.command,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Command Panel
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Idle,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Warning,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMessage {
    pub kind: MessageKind,
    pub text: String,
    pub expires_at: Instant,
}

/// Free-text command input, its submit control and the inline message.
#[derive(Debug, Clone, Default)]
pub struct CommandPanel {
    pub state: ControlState,
    pub input: String,
    message: Option<InlineMessage>,
}

impl CommandPanel {
    pub fn begin(&mut self) -> Result<(), DispatchError> {
        if self.state == ControlState::Busy {
            return Err(DispatchError::Busy);
        }
        self.state = ControlState::Busy;
        Ok(())
    }

    pub fn succeed(&mut self, localizer: &Localizer, now: Instant) {
        self.state = ControlState::Idle;
        self.input.clear();
        self.show(MessageKind::Success, localizer.t("command.success").to_string(), now);
    }

    pub fn fail(&mut self, err: &DispatchError, localizer: &Localizer, now: Instant) {
        self.state = ControlState::Idle;
        if err.is_validation() {
            self.show(MessageKind::Warning, localizer.t("command.emptyWarning").to_string(), now);
            return;
        }
        self.show(MessageKind::Failure, failure_text(err, localizer), now);
    }

    pub fn message(&self, now: Instant) -> Option<&InlineMessage> {
        self.message.as_ref().filter(|m| m.expires_at > now)
    }

    fn show(&mut self, kind: MessageKind, text: String, now: Instant) {
        self.message = Some(InlineMessage {
            kind,
            text,
            expires_at: now + MESSAGE_TTL,
        });
    }
}

/// "failure prefix + reason", with the localized unknown-error fallback.
pub fn failure_text(err: &DispatchError, localizer: &Localizer) -> String {
    let reason = err
        .reason()
        .unwrap_or_else(|| localizer.t("command.unknownError").to_string());
    format!("{} {}", localizer.t("command.failure"), reason)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Skill Review
// ═══════════════════════════════════════════════════════════════════════════════

/// Review progress for one candidate. No entry means untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    ReasonInput,
    Sending,
    Approved,
    Rejected,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct Reviews {
    states: HashMap<String, ReviewState>,
}

impl Reviews {
    pub fn get(&self, name: &str) -> Option<&ReviewState> {
        self.states.get(name)
    }

    /// Marks `candidate` as sending an approval and returns the command.
    pub fn begin_approve(&mut self, candidate: &SkillCandidate) -> Result<String, DispatchError> {
        self.ensure_reviewable(candidate)?;
        self.states
            .insert(candidate.name.clone(), ReviewState::Sending);
        Ok(approve_command(&candidate.name))
    }

    /// Reveals the reason input. Nothing is sent yet.
    pub fn open_reject(&mut self, candidate: &SkillCandidate) -> Result<(), DispatchError> {
        self.ensure_reviewable(candidate)?;
        self.states
            .insert(candidate.name.clone(), ReviewState::ReasonInput);
        Ok(())
    }

    /// Sends the rejection for a candidate whose reason input is open.
    pub fn begin_confirm_reject(
        &mut self,
        name: &str,
        reason: Option<&str>,
    ) -> Result<String, DispatchError> {
        match self.states.get(name) {
            Some(ReviewState::ReasonInput) => {
                self.states.insert(name.to_string(), ReviewState::Sending);
                Ok(reject_command(name, reason))
            }
            _ => Err(DispatchError::ReviewNotOpen(name.to_string())),
        }
    }

    pub fn finish(
        &mut self,
        name: &str,
        action: ReviewAction,
        result: &Result<CommandAccepted, DispatchError>,
        localizer: &Localizer,
    ) {
        let state = match (result, action) {
            (Ok(_), ReviewAction::Approve) => ReviewState::Approved,
            (Ok(_), ReviewAction::Reject) => ReviewState::Rejected,
            (Err(err), _) => ReviewState::Failed(format!(
                "{} {}",
                localizer.t("skill.sendFailed"),
                err.reason()
                    .unwrap_or_else(|| localizer.t("command.unknownError").to_string())
            )),
        };
        self.states.insert(name.to_string(), state);
    }

    /// Drops state for candidates no longer on the dashboard.
    pub fn retain_names<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = names.into_iter().collect();
        self.states.retain(|name, _| keep.contains(name.as_str()));
    }

    fn ensure_reviewable(&self, candidate: &SkillCandidate) -> Result<(), DispatchError> {
        if !candidate.status.is_pending() {
            return Err(DispatchError::NotPending(candidate.name.clone()));
        }
        if matches!(self.states.get(&candidate.name), Some(ReviewState::Sending)) {
            return Err(DispatchError::Busy);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Action Item Deletion
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteState {
    Sending,
    Sent,
    Failed(String),
}

/// Asks the operator to confirm a destructive request.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirmer for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    Sent,
}

#[derive(Debug, Clone, Default)]
pub struct Deletions {
    states: HashMap<String, DeleteState>,
}

impl Deletions {
    pub fn get(&self, title: &str) -> Option<&DeleteState> {
        self.states.get(title)
    }

    pub fn begin(&mut self, title: &str) -> Result<String, DispatchError> {
        if matches!(self.states.get(title), Some(DeleteState::Sending)) {
            return Err(DispatchError::Busy);
        }
        self.states.insert(title.to_string(), DeleteState::Sending);
        Ok(delete_command(title))
    }

    pub fn finish(&mut self, title: &str, result: &Result<CommandAccepted, DispatchError>) {
        let state = match result {
            Ok(_) => DeleteState::Sent,
            Err(err) => DeleteState::Failed(err.to_string()),
        };
        self.states.insert(title.to_string(), state);
    }

    pub fn retain_titles<'a>(&mut self, titles: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = titles.into_iter().collect();
        self.states.retain(|title, _| keep.contains(title.as_str()));
    }
}
