//! Plain-text binding for terminals.
//!
//! Collapsed sections print only their heading. Pane output is cut to its
//! latest lines so the freshest activity stays on screen.

use std::fmt::Write;

use super::markdown::{self, Block};
use super::{
    DashboardView, DeleteControl, PaneView, RenderedSection, ReviewControls, SectionBody,
    SkillCardView,
};
use crate::dispatch::MessageKind;
use crate::panes::{tail, PaneBody, TAIL_LINES};

pub fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();
    let header = &view.header;
    let _ = writeln!(out, "=== {} ===", header.title);
    let _ = writeln!(
        out,
        "{} {}   {} [{}]   {}   {}",
        header.last_updated_label,
        header.last_updated,
        header.auto_refresh_label,
        if header.auto_refresh { "x" } else { " " },
        header.notifications_label,
        header.language_label
    );
    if let Some(error) = &header.error {
        let _ = writeln!(out, "!! {}", error);
    }

    if !view.workers.entries.is_empty() {
        let chips: Vec<String> = view
            .workers
            .entries
            .iter()
            .map(|chip| {
                if chip.highlighted {
                    format!("*{}:{}*", chip.label, chip.status_label)
                } else {
                    format!("{}:{}", chip.label, chip.status_label)
                }
            })
            .collect();
        let _ = writeln!(out, "{} {}", view.workers.title, chips.join("  "));
    }

    let karo = &view.karo;
    let _ = writeln!(out, "{} {}", karo.label, karo.badge.as_deref().unwrap_or("-"));
    if let Some(pane) = &karo.pane {
        out.push_str(&render_pane(pane));
    }
    out.push('\n');

    for section in &view.sections {
        out.push_str(&render_section(section));
    }

    out.push_str(&render_pane(&view.shogun));

    let command = &view.command;
    if command.busy {
        let _ = writeln!(out, "[{}]", command.submit_label);
    }
    if let Some((kind, text)) = &command.message {
        let marker = match kind {
            MessageKind::Success => "ok",
            MessageKind::Warning => "!",
            MessageKind::Failure => "x",
        };
        let _ = writeln!(out, "({}) {}", marker, text);
    }

    if let Some(modal) = &view.modal {
        out.push('\n');
        out.push_str(&render_pane(modal));
    }
    if let Some(review) = &view.skill_review {
        let _ = writeln!(out, "\n--- {} ---", review.title);
        if review.cards.is_empty() {
            let _ = writeln!(out, "  {}", review.empty_label);
        }
        for card in &review.cards {
            out.push_str(&render_skill_card(card));
        }
    }
    out
}

pub fn render_section(section: &RenderedSection) -> String {
    let mut out = String::new();
    let marker = if section.collapsed { "▸" } else { "▾" };
    let _ = write!(out, "{} {} [{}]", marker, section.title, section.id.key());
    if let Some(badge) = &section.badge {
        let _ = write!(
            out,
            "  <{} {} {}>",
            badge.label, badge.count_label, badge.status_label
        );
    }
    out.push('\n');
    if section.collapsed {
        return out;
    }

    match &section.body {
        SectionBody::Loading(label) | SectionBody::Empty(label) => {
            let _ = writeln!(out, "  {}", label);
        }
        SectionBody::ActionItems(items) => {
            for item in items {
                let state = match &item.delete {
                    DeleteControl::Available { .. } => String::new(),
                    DeleteControl::Sending(label)
                    | DeleteControl::Sent(label)
                    | DeleteControl::Failed(label) => format!(" ({})", label),
                };
                let _ = writeln!(out, "  • {}{}", item.title, state);
                for line in render_blocks(&item.blocks).lines() {
                    let _ = writeln!(out, "      {}", line);
                }
            }
        }
        SectionBody::Table(table) => {
            let _ = writeln!(out, "  {}", table.headers.join(" | "));
            for row in &table.rows {
                let link = row
                    .worker_id
                    .as_ref()
                    .map(|id| format!("  → {}", id))
                    .unwrap_or_default();
                let _ = writeln!(out, "  {}{}", row.cells.join(" | "), link);
            }
        }
        SectionBody::SkillCards(cards) => {
            for card in cards {
                out.push_str(&render_skill_card(card));
            }
        }
        SectionBody::GeneratedSkills(skills) => {
            for skill in skills {
                let _ = writeln!(out, "  • {}", skill.name);
                if let Some(description) = &skill.description {
                    let _ = writeln!(out, "      {}", description);
                }
                if !skill.meta.is_empty() {
                    let _ = writeln!(out, "      {}", skill.meta.join(" | "));
                }
            }
        }
        SectionBody::List(items) => {
            for item in items {
                let _ = writeln!(out, "  - {}", item);
            }
        }
    }

    if let Some(reports) = &section.reports {
        let _ = writeln!(out, "  {}", reports.title);
        for report in &reports.items {
            let _ = writeln!(out, "    {}", report.cmd_id);
            if let Some(order) = &report.order {
                let _ = writeln!(out, "      {} {}", reports.order_label, order);
            }
            if let Some(result) = &report.result {
                let _ = writeln!(out, "      {} {}", reports.result_label, result);
            }
        }
    }
    out
}

/// Markdown blocks as terminal text: bold dropped, tables pipe-joined.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Line(spans) => {
                let _ = writeln!(out, "{}", markdown::plain(spans));
            }
            Block::Table { header, rows } => {
                let row_text = |cells: &Vec<markdown::Cell>| {
                    cells
                        .iter()
                        .map(|cell| markdown::plain(cell))
                        .collect::<Vec<_>>()
                        .join(" | ")
                };
                let _ = writeln!(out, "{}", row_text(header));
                for row in rows {
                    let _ = writeln!(out, "{}", row_text(row));
                }
            }
        }
    }
    out
}

fn render_skill_card(card: &SkillCardView) -> String {
    let mut out = String::new();
    let badge = card
        .pending_badge
        .as_deref()
        .map(|b| format!(" {}", b))
        .unwrap_or_default();
    let _ = writeln!(out, "  • {}{}", card.name, badge);
    let _ = writeln!(out, "      {}", card.description);
    let mut meta = vec![card.source.clone()];
    meta.extend(card.generality.clone());
    meta.push(card.status_label.clone());
    let _ = writeln!(out, "      {}", meta.join(" | "));
    match &card.controls {
        ReviewControls::None => {}
        ReviewControls::Buttons { approve, reject } => {
            let _ = writeln!(out, "      [{}] [{}]", approve, reject);
        }
        ReviewControls::ReasonInput { placeholder, confirm } => {
            let _ = writeln!(out, "      {} → [{}]", placeholder, confirm);
        }
        ReviewControls::Status(label) => {
            let _ = writeln!(out, "      {}", label);
        }
        ReviewControls::Failed { message, approve, reject } => {
            let _ = writeln!(out, "      {}  [{}] [{}]", message, approve, reject);
        }
    }
    out
}

fn render_pane(pane: &PaneView) -> String {
    let mut out = String::new();
    let _ = write!(out, "--- {} ---", pane.title);
    if let Some(updating) = &pane.updating {
        let _ = write!(out, " ({})", updating);
    }
    out.push('\n');
    match &pane.body {
        PaneBody::Loading(label) => {
            let _ = writeln!(out, "{}", label);
        }
        PaneBody::Output(text) => {
            out.push_str(tail(text, TAIL_LINES));
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        PaneBody::Message { text, is_error } => {
            let _ = writeln!(out, "{}{}", if *is_error { "!! " } else { "" }, text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CollapseHint, TableRowView, TableView};
    use crate::types::{SectionId, WorkerId};

    fn section(collapsed: bool, body: SectionBody) -> RenderedSection {
        RenderedSection {
            id: SectionId::InProgress,
            title: "In Progress".to_string(),
            toggle_hint: String::new(),
            hint: CollapseHint::ForceOpen,
            collapsed,
            badge: None,
            body,
            reports: None,
        }
    }

    #[test]
    fn collapsed_section_prints_heading_only() {
        let text = render_section(&section(true, SectionBody::List(vec!["x".into()])));
        assert_eq!(text, "▸ In Progress [in-progress]\n");
    }

    #[test]
    fn table_rows_show_worker_link() {
        let text = render_section(&section(
            false,
            SectionBody::Table(TableView {
                headers: vec!["Worker".into(), "Task".into()],
                rows: vec![TableRowView {
                    cells: vec!["足軽1".into(), "lint".into()],
                    worker_id: Some(WorkerId::from_digits("1")),
                    tooltip: None,
                }],
            }),
        ));
        assert!(text.contains("  Worker | Task\n"));
        assert!(text.contains("  足軽1 | lint  → ashigaru1\n"));
    }

    #[test]
    fn markdown_tables_flatten() {
        let text = render_blocks(&markdown::parse("**Note**\n| a | b |\n|---|---|\n| 1 | 2 |"));
        assert_eq!(text, "Note\na | b\n1 | 2\n");
    }
}
