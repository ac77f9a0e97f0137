//! Live terminal view and slash-command input for `watch`.
//!
//! The engine's schedulers redraw the screen through [`TerminalSink`]; the
//! main thread reads operator lines from stdin and maps them onto engine
//! operations. Any line that is not a slash command is sent as a command.
//!
//! A terminal cannot report focus. Clicking a notification marks the
//! dashboard visible; the next handled input line marks it hidden again, so
//! later increases notify once the operator goes back to other work.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shogun_core::dispatch::DeleteOutcome;
use shogun_core::notifier::NotificationCapability;
use shogun_core::render::text;
use shogun_core::{DashboardEngine, DashboardView, SectionId, ViewSink};
use shogun_protocol::PaneTarget;
use tracing::{info, warn};

const HELP: &str = "\
/lang <ja|en>            switch language
/toggle <section>        collapse or expand a section
/notify <on|off>         desktop notifications
/approve <skill>         approve a skill candidate
/reject <skill> [reason] reject a skill candidate
/reject \"<skill>\" [reason] or /reject <skill> | [reason]
/delete <title>          remove an action-required item
/worker <label>          open a worker's output
/close                   close the worker view
/refresh [shogun|karo|worker]
/skills                  show or hide the skill review list
/karo                    expand or collapse the karo pane
/auto [shogun]           toggle auto-refresh
/history                 show recent commands
/quit";

/// Redraws the whole screen for every presented view, except while an input
/// prompt holds the screen.
#[derive(Debug, Default)]
pub struct TerminalSink {
    paused: Arc<AtomicBool>,
}

impl TerminalSink {
    pub fn gate(&self) -> RedrawGate {
        RedrawGate(Arc::clone(&self.paused))
    }
}

impl ViewSink for TerminalSink {
    fn present(&self, view: &DashboardView) {
        if self.paused.load(Ordering::Acquire) {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\x1b[2J\x1b[H{}\n> ", text::render_view(view));
        let _ = stdout.flush();
    }
}

/// Suspends [`TerminalSink`] redraws while held.
#[derive(Debug, Clone, Default)]
pub struct RedrawGate(Arc<AtomicBool>);

impl RedrawGate {
    pub fn pause(&self) -> PausedRedraws<'_> {
        self.0.store(true, Ordering::Release);
        PausedRedraws(&self.0)
    }
}

pub struct PausedRedraws<'a>(&'a AtomicBool);

impl Drop for PausedRedraws<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Send(String),
    Lang(String),
    Toggle(SectionId),
    Notify(bool),
    Approve(String),
    Reject { name: String, reason: Option<String> },
    Delete(String),
    Worker(String),
    Close,
    Refresh(Option<RefreshTarget>),
    Skills,
    Karo,
    Auto { shogun: bool },
    History,
    Quit,
    Help(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTarget {
    Pane(PaneTarget),
    Worker,
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Send(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let required = |arg: &str| (!arg.is_empty()).then(|| arg.to_string());
    let usage = || Input::Help(Some(format!("usage: /{}", name)));

    match name {
        "lang" => required(arg).map(Input::Lang).unwrap_or_else(usage),
        "toggle" => SectionId::from_key(arg)
            .map(Input::Toggle)
            .unwrap_or_else(|| {
                let keys: Vec<&str> = SectionId::ALL.iter().map(|s| s.key()).collect();
                Input::Help(Some(format!("sections: {}", keys.join(", "))))
            }),
        "notify" => match arg {
            "on" => Input::Notify(true),
            "off" => Input::Notify(false),
            _ => usage(),
        },
        "approve" => required(arg).map(Input::Approve).unwrap_or_else(usage),
        "reject" => match split_reject(arg) {
            Some((name, reason)) => Input::Reject {
                name: name.to_string(),
                reason: required(reason),
            },
            None => usage(),
        },
        "delete" => required(arg).map(Input::Delete).unwrap_or_else(usage),
        "worker" => required(arg).map(Input::Worker).unwrap_or_else(usage),
        "close" => Input::Close,
        "refresh" => match arg {
            "" => Input::Refresh(None),
            "shogun" => Input::Refresh(Some(RefreshTarget::Pane(PaneTarget::Shogun))),
            "karo" => Input::Refresh(Some(RefreshTarget::Pane(PaneTarget::Karo))),
            "worker" => Input::Refresh(Some(RefreshTarget::Worker)),
            _ => usage(),
        },
        "skills" => Input::Skills,
        "karo" => Input::Karo,
        "auto" => match arg {
            "" => Input::Auto { shogun: false },
            "shogun" => Input::Auto { shogun: true },
            _ => usage(),
        },
        "history" => Input::History,
        "quit" | "exit" => Input::Quit,
        _ => Input::Help(None),
    }
}

/// Splits `/reject` arguments into a skill name and a possibly empty reason.
/// A name containing spaces is either double-quoted or ended with `|`;
/// otherwise the first word is the name.
fn split_reject(arg: &str) -> Option<(&str, &str)> {
    let (name, reason) = if let Some(quoted) = arg.strip_prefix('"') {
        let (name, rest) = quoted.split_once('"')?;
        let rest = rest.trim_start();
        (name, rest.strip_prefix('|').unwrap_or(rest))
    } else if let Some(split) = arg.split_once('|') {
        split
    } else {
        arg.split_once(char::is_whitespace).unwrap_or((arg, ""))
    };
    let name = name.trim();
    (!name.is_empty()).then(|| (name, reason.trim()))
}

/// Asks on stdin; only `y` or `yes` confirms. Redraws stay paused until the
/// answer is read.
struct StdinConfirmer<'a> {
    gate: &'a RedrawGate,
}

impl shogun_core::Confirmer for StdinConfirmer<'_> {
    fn confirm(&self, prompt: &str) -> bool {
        let _paused = self.gate.pause();
        print!("\n{} [y/N] ", prompt);
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Runs until `/quit` or end of input.
pub fn run(engine: &mut DashboardEngine, gate: &RedrawGate) -> Result<(), String> {
    engine
        .start()
        .map_err(|e| format!("Failed to start polling: {}", e))?;

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => return Err(format!("Failed to read input: {}", err)),
        }
        let outcome = handle(engine, gate, parse_line(&line));
        engine.set_page_visible(false);
        match outcome {
            Ok(true) => {}
            Ok(false) => break,
            Err(message) => {
                warn!(error = %message, "Console input failed");
                eprintln!("{}", message);
            }
        }
    }

    engine.stop();
    info!("Console closed");
    Ok(())
}

/// Applies one input. Returns false when the console should exit.
fn handle(engine: &mut DashboardEngine, gate: &RedrawGate, input: Input) -> Result<bool, String> {
    match input {
        Input::Empty => engine.present(),
        Input::Quit => return Ok(false),
        Input::Help(message) => {
            if let Some(message) = message {
                println!("{}", message);
            }
            println!("{}", HELP);
        }
        Input::Send(text) => {
            // The command panel shows the outcome.
            let _ = engine.send_command(&text);
        }
        Input::Lang(code) => {
            if !engine.set_language(&code) {
                return Err(format!("Unsupported language: {}", code));
            }
        }
        Input::Toggle(section) => {
            engine.toggle_section(section);
        }
        Input::Notify(enabled) => {
            let capability = engine.set_notifications(enabled);
            if enabled && capability != NotificationCapability::Granted {
                return Err(format!("Notifications unavailable ({:?})", capability));
            }
        }
        Input::Approve(name) => {
            engine.approve_skill(&name).map_err(|e| e.to_string())?;
        }
        Input::Reject { name, reason } => {
            engine.begin_reject(&name).map_err(|e| e.to_string())?;
            engine
                .confirm_reject(&name, reason.as_deref())
                .map_err(|e| e.to_string())?;
        }
        Input::Delete(title) => {
            match engine.delete_action(&title, &StdinConfirmer { gate }) {
                Ok(DeleteOutcome::Declined) => engine.present(),
                Ok(DeleteOutcome::Sent) => {}
                Err(err) => return Err(err.to_string()),
            }
        }
        Input::Worker(label) => {
            if !engine.open_worker_label(&label) {
                return Err(format!("No worker matches '{}'", label));
            }
        }
        Input::Close => engine.close_worker(),
        Input::Refresh(None) => engine.refresh_dashboard(),
        Input::Refresh(Some(RefreshTarget::Pane(target))) => engine.refresh_pane(target),
        Input::Refresh(Some(RefreshTarget::Worker)) => engine.refresh_worker(),
        Input::Skills => {
            if engine.view().skill_review.is_some() {
                engine.close_skill_review();
            } else {
                engine.open_skill_review();
            }
        }
        Input::Karo => {
            engine.toggle_karo();
        }
        Input::Auto { shogun: false } => {
            let enabled = !engine.view().header.auto_refresh;
            engine
                .set_auto_refresh(enabled)
                .map_err(|e| e.to_string())?;
        }
        Input::Auto { shogun: true } => {
            let enabled = !engine.view().shogun.auto_refresh.unwrap_or(false);
            engine
                .set_shogun_auto_refresh(enabled)
                .map_err(|e| e.to_string())?;
        }
        Input::History => {
            let history = engine.view().history;
            println!("{}", crate::format_history(&history));
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_are_sent() {
        assert_eq!(parse_line("  進軍せよ "), Input::Send("進軍せよ".to_string()));
        assert_eq!(parse_line("   "), Input::Empty);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_line("/lang en"), Input::Lang("en".to_string()));
        assert_eq!(parse_line("/notify on"), Input::Notify(true));
        assert_eq!(
            parse_line("/toggle in-progress"),
            Input::Toggle(SectionId::InProgress)
        );
        assert_eq!(
            parse_line("/refresh karo"),
            Input::Refresh(Some(RefreshTarget::Pane(PaneTarget::Karo)))
        );
        assert_eq!(parse_line("/auto shogun"), Input::Auto { shogun: true });
        assert_eq!(parse_line("/quit"), Input::Quit);
    }

    #[test]
    fn test_reject_reason_is_optional() {
        assert_eq!(
            parse_line("/reject lint-fixer too narrow"),
            Input::Reject {
                name: "lint-fixer".to_string(),
                reason: Some("too narrow".to_string()),
            }
        );
        assert_eq!(
            parse_line("/reject lint-fixer"),
            Input::Reject {
                name: "lint-fixer".to_string(),
                reason: None,
            }
        );
    }

    #[test]
    fn test_reject_names_with_spaces() {
        let reject = |name: &str, reason: Option<&str>| Input::Reject {
            name: name.to_string(),
            reason: reason.map(str::to_string),
        };
        assert_eq!(
            parse_line(r#"/reject "lint fixer" too narrow"#),
            reject("lint fixer", Some("too narrow"))
        );
        assert_eq!(
            parse_line(r#"/reject "lint fixer""#),
            reject("lint fixer", None)
        );
        assert_eq!(
            parse_line("/reject lint fixer | too narrow"),
            reject("lint fixer", Some("too narrow"))
        );
        assert_eq!(
            parse_line(r#"/reject "lint fixer" | too narrow"#),
            reject("lint fixer", Some("too narrow"))
        );
        assert_eq!(parse_line("/reject lint fixer |"), reject("lint fixer", None));
    }

    #[test]
    fn test_malformed_reject_shows_usage() {
        let usage = Input::Help(Some("usage: /reject".to_string()));
        assert_eq!(parse_line("/reject"), usage);
        assert_eq!(parse_line(r#"/reject "lint fixer"#), usage);
        assert_eq!(parse_line("/reject | reason"), usage);
    }

    #[test]
    fn test_prompt_pauses_redraws() {
        let sink = TerminalSink::default();
        let gate = sink.gate();
        {
            let _paused = gate.pause();
            assert!(sink.paused.load(Ordering::Acquire));
        }
        assert!(!gate.0.load(Ordering::Acquire));
    }

    #[test]
    fn test_missing_arguments_show_usage() {
        assert_eq!(
            parse_line("/delete"),
            Input::Help(Some("usage: /delete".to_string()))
        );
        assert!(matches!(parse_line("/toggle nowhere"), Input::Help(Some(_))));
        assert_eq!(parse_line("/unknown"), Input::Help(None));
    }
}
