//! Snapshot differencing and notification delivery.
//!
//! The [`Differencer`] compares collection counts between successive applied
//! snapshots. Its first evaluation only records a baseline, so opening the
//! dashboard never replays everything already on it. Whether a decision is
//! shown is a separate question answered by [`should_deliver`].

use std::sync::Arc;

use crate::error::Result;
use crate::i18n::Localizer;
use crate::types::DashboardSnapshot;

pub const TAG_ACTION_REQUIRED: &str = "shogun-action-required";
pub const TAG_COMPLETED: &str = "shogun-completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub action_required: usize,
    pub completed: usize,
}

impl Counts {
    pub fn of(snapshot: &DashboardSnapshot) -> Self {
        Self {
            action_required: snapshot.action_count(),
            completed: snapshot.completed_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub previous: usize,
    pub current: usize,
}

/// Which counters grew since the previous evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationDecision {
    pub action_required: Option<Delta>,
    pub completed: Option<Delta>,
}

impl NotificationDecision {
    pub fn is_empty(&self) -> bool {
        self.action_required.is_none() && self.completed.is_none()
    }

    /// One notification per grown counter, action-required first.
    pub fn notifications(&self, localizer: &Localizer) -> Vec<Notification> {
        let mut notifications = Vec::new();
        if let Some(delta) = self.action_required {
            notifications.push(Notification {
                title: localizer.t("notify.actionTitle").to_string(),
                body: localizer.t_n("notify.actionBody", delta.current),
                tag: TAG_ACTION_REQUIRED.to_string(),
            });
        }
        if let Some(delta) = self.completed {
            notifications.push(Notification {
                title: localizer.t("notify.completedTitle").to_string(),
                body: localizer.t_n("notify.completedBody", delta.current),
                tag: TAG_COMPLETED.to_string(),
            });
        }
        notifications
    }
}

#[derive(Debug, Clone, Default)]
pub struct Differencer {
    baseline: Option<Counts>,
}

impl Differencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self) -> Option<Counts> {
        self.baseline
    }

    /// Compares `snapshot` against the stored counts, then stores its counts.
    pub fn evaluate(&mut self, snapshot: &DashboardSnapshot) -> NotificationDecision {
        let current = Counts::of(snapshot);
        let decision = match self.baseline {
            None => NotificationDecision::default(),
            Some(previous) => NotificationDecision {
                action_required: grew(previous.action_required, current.action_required),
                completed: grew(previous.completed, current.completed),
            },
        };
        self.baseline = Some(current);
        decision
    }
}

fn grew(previous: usize, current: usize) -> Option<Delta> {
    (current > previous).then_some(Delta { previous, current })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Delivery
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCapability {
    Unsupported,
    NotGranted,
    Granted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Replaces an earlier notification with the same tag where supported.
    pub tag: String,
}

/// Platform notification surface.
pub trait NotificationSink: Send + Sync {
    fn capability(&self) -> NotificationCapability;

    /// Asks the platform for permission and returns the resulting capability.
    fn request_permission(&self) -> NotificationCapability;

    fn deliver(&self, notification: &Notification) -> Result<()>;

    /// Installs the callback run with a notification's tag when the operator
    /// activates it. Sinks without click support ignore it.
    fn set_activation_handler(&self, _handler: ActivationHandler) {}

    /// Withdraws the notification carrying `tag`, if still shown.
    fn dismiss(&self, _tag: &str) -> Result<()> {
        Ok(())
    }
}

/// Called with the tag of an activated notification.
pub type ActivationHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Sink for environments without notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNotifications;

impl NotificationSink for NoNotifications {
    fn capability(&self) -> NotificationCapability {
        NotificationCapability::Unsupported
    }

    fn request_permission(&self) -> NotificationCapability {
        NotificationCapability::Unsupported
    }

    fn deliver(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }
}

/// A decision is shown only to an operator who opted in, on a platform that
/// granted permission, while the dashboard is not the visible surface.
pub fn should_deliver(
    opted_in: bool,
    capability: NotificationCapability,
    page_visible: bool,
) -> bool {
    opted_in && capability == NotificationCapability::Granted && !page_visible
}
