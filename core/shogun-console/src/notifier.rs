//! Desktop notifications through the platform notifier command.
//!
//! `notify-send` on Linux, `osascript` on macOS. Neither has a permission
//! prompt, so an available command is reported as granted.
//!
//! `notify-send` is run with a default action and `--wait` on its own thread;
//! clicking the notification prints the action name, which is forwarded to
//! the activation handler. AppleScript notifications cannot report clicks.

use std::process::{Command, Output};
use std::sync::OnceLock;
use std::thread;

use shogun_core::notifier::{ActivationHandler, Notification, NotificationCapability, NotificationSink};
use shogun_core::{Result, ShogunError};
use tracing::{debug, warn};

const DEFAULT_ACTION: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    NotifySend,
    Osascript,
}

pub struct DesktopNotifier {
    backend: Option<Backend>,
    on_activate: OnceLock<ActivationHandler>,
}

impl DesktopNotifier {
    pub fn detect() -> Self {
        let backend = if cfg!(target_os = "macos") {
            Some(Backend::Osascript)
        } else if cfg!(target_os = "linux") && command_exists("notify-send") {
            Some(Backend::NotifySend)
        } else {
            None
        };
        debug!(?backend, "Notification backend detected");
        Self::with_backend(backend)
    }

    fn with_backend(backend: Option<Backend>) -> Self {
        Self {
            backend,
            on_activate: OnceLock::new(),
        }
    }
}

impl NotificationSink for DesktopNotifier {
    fn capability(&self) -> NotificationCapability {
        match self.backend {
            Some(_) => NotificationCapability::Granted,
            None => NotificationCapability::Unsupported,
        }
    }

    fn request_permission(&self) -> NotificationCapability {
        self.capability()
    }

    fn deliver(&self, notification: &Notification) -> Result<()> {
        match self.backend {
            None => Ok(()),
            Some(Backend::NotifySend) => self.deliver_with_action(notification),
            Some(Backend::Osascript) => {
                let output = Command::new("osascript")
                    .arg("-e")
                    .arg(apple_script(notification))
                    .output()
                    .map_err(|source| ShogunError::Io {
                        context: "running osascript notifier".to_string(),
                        source,
                    })?;
                log_failure(&output);
                Ok(())
            }
        }
    }

    fn set_activation_handler(&self, handler: ActivationHandler) {
        if self.on_activate.set(handler).is_err() {
            debug!("Activation handler already installed");
        }
    }

    fn dismiss(&self, tag: &str) -> Result<()> {
        // A clicked notify-send notification is already closed by the server.
        debug!(tag, "Notification dismissed");
        Ok(())
    }
}

impl DesktopNotifier {
    /// `--wait` blocks until the notification closes, so the command runs on
    /// a short-lived thread that reports a click back to the engine.
    fn deliver_with_action(&self, notification: &Notification) -> Result<()> {
        let mut command = Command::new("notify-send");
        command.args(notify_send_args(notification));
        let handler = self.on_activate.get().cloned();
        let tag = notification.tag.clone();

        thread::Builder::new()
            .name("shogun-notify".to_string())
            .spawn(move || match command.output() {
                Ok(output) => {
                    log_failure(&output);
                    if is_activation(&output.stdout) {
                        if let Some(handler) = handler {
                            handler(&tag);
                        }
                    }
                }
                Err(err) => warn!(error = %err, "Failed to run notify-send"),
            })
            .map_err(|source| ShogunError::Io {
                context: "spawning notify-send thread".to_string(),
                source,
            })?;
        Ok(())
    }
}

fn notify_send_args(notification: &Notification) -> Vec<String> {
    vec![
        "--app-name=shogun-gui".to_string(),
        format!(
            "--hint=string:x-canonical-private-synchronous:{}",
            notification.tag
        ),
        format!("--action={}=Open", DEFAULT_ACTION),
        "--wait".to_string(),
        notification.title.clone(),
        notification.body.clone(),
    ]
}

/// `notify-send --wait` prints the invoked action's name; dismissal prints
/// nothing.
fn is_activation(stdout: &[u8]) -> bool {
    String::from_utf8_lossy(stdout).trim() == DEFAULT_ACTION
}

fn log_failure(output: &Output) {
    if !output.status.success() {
        warn!(
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr),
            "Notifier command failed"
        );
    }
}

fn command_exists(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn apple_script(notification: &Notification) -> String {
    format!(
        "display notification {} with title {}",
        quote(&notification.body),
        quote(&notification.title)
    )
}

/// AppleScript string literal.
fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apple_script_escapes_quotes() {
        let script = apple_script(&Notification {
            title: "Shogun".to_string(),
            body: r#"say "hi" \o/"#.to_string(),
            tag: "completed".to_string(),
        });
        assert_eq!(
            script,
            r#"display notification "say \"hi\" \\o/" with title "Shogun""#
        );
    }

    #[test]
    fn test_notify_send_waits_for_default_action() {
        let args = notify_send_args(&Notification {
            title: "Shogun".to_string(),
            body: "1 item needs you".to_string(),
            tag: "shogun-action-required".to_string(),
        });
        assert!(args.contains(&"--action=default=Open".to_string()));
        assert!(args.contains(&"--wait".to_string()));
        assert_eq!(args[args.len() - 2..], ["Shogun", "1 item needs you"]);
    }

    #[test]
    fn test_only_default_action_activates() {
        assert!(is_activation(b"default\n"));
        assert!(!is_activation(b""));
        assert!(!is_activation(b"other\n"));
    }

    #[test]
    fn test_missing_backend_is_unsupported() {
        let notifier = DesktopNotifier::with_backend(None);
        assert_eq!(notifier.capability(), NotificationCapability::Unsupported);
        assert_eq!(
            notifier.request_permission(),
            NotificationCapability::Unsupported
        );
    }
}
