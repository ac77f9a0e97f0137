//! HTML binding for dashboard view-models.
//!
//! Every dynamic string passes through [`escape_html`]. Element ids and
//! `data-*` attributes match what the dashboard page's script binds to.

use std::fmt::Write;

use super::markdown::{Block, Span};
use super::{
    ActionItemView, DashboardView, DeleteControl, GeneratedSkillView, PaneView, RenderedSection,
    ReviewControls, SectionBody, SkillCardView, TableView,
};
use crate::dispatch::MessageKind;
use crate::panes::PaneBody;

/// Escapes text for element content and quoted attributes. Absent input is
/// the empty string.
pub fn escape_html(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn esc(text: &str) -> String {
    escape_html(Some(text))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Page
// ═══════════════════════════════════════════════════════════════════════════════

pub fn render_page(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n",
        esc(&view.language),
        esc(&view.page_title)
    );

    let header = &view.header;
    let _ = write!(
        out,
        "<header><h1>{}</h1><span class=\"last-updated\">{} <span id=\"last-updated\">{}</span></span>",
        esc(&header.title),
        esc(&header.last_updated_label),
        esc(&header.last_updated)
    );
    let _ = write!(
        out,
        "<label><input type=\"checkbox\" id=\"auto-refresh\"{}> {}</label><span class=\"notify-toggle\">{}</span>",
        checked(header.auto_refresh),
        esc(&header.auto_refresh_label),
        esc(&header.notifications_label)
    );
    if let Some(error) = &header.error {
        let _ = write!(out, "<div class=\"error-banner\" role=\"alert\">{}</div>", esc(error));
    }
    out.push_str("</header>\n");

    out.push_str(&render_workers(view));
    out.push_str(&render_pane("shogun-pane", &view.shogun));

    let karo = &view.karo;
    let _ = write!(
        out,
        "<div id=\"karo\"><button class=\"karo-badge\" title=\"{}\">{} {}</button>",
        esc(&karo.badge_title),
        esc(&karo.label),
        esc(karo.badge.as_deref().unwrap_or("-"))
    );
    if let Some(pane) = &karo.pane {
        out.push_str(&render_pane("karo-pane", pane));
        let _ = write!(out, "<button class=\"karo-close\">{}</button>", esc(&karo.close_label));
    }
    out.push_str("</div>\n");

    let command = &view.command;
    let _ = write!(
        out,
        "<section id=\"command\"><h2>{}</h2><textarea placeholder=\"{}\">{}</textarea><button{}>{}</button>",
        esc(&command.title),
        esc(&command.placeholder),
        esc(&command.input),
        if command.busy { " disabled" } else { "" },
        esc(&command.submit_label)
    );
    if let Some((kind, text)) = &command.message {
        let class = match kind {
            MessageKind::Success => "success",
            MessageKind::Warning => "warning",
            MessageKind::Failure => "error",
        };
        let _ = write!(out, "<div class=\"command-message {}\">{}</div>", class, esc(text));
    }
    let _ = write!(out, "<h3>{}</h3>", esc(&view.history.title));
    if view.history.entries.is_empty() {
        let _ = write!(out, "<div class=\"empty\">{}</div>", esc(&view.history.empty_label));
    } else {
        out.push_str("<ul class=\"history\">");
        for entry in &view.history.entries {
            let _ = write!(
                out,
                "<li data-timestamp=\"{}\">{}</li>",
                entry.timestamp,
                esc(&entry.text)
            );
        }
        out.push_str("</ul>");
    }
    out.push_str("</section>\n");

    for section in &view.sections {
        out.push_str(&render_section(section));
    }

    if let Some(modal) = &view.modal {
        let _ = write!(out, "<div id=\"ashigaru-modal\" aria-hidden=\"false\">{}</div>\n", render_pane("modal-output", modal));
    }
    if let Some(review) = &view.skill_review {
        let _ = write!(
            out,
            "<div id=\"skill-modal\" aria-hidden=\"false\"><h2>{}</h2>",
            esc(&review.title)
        );
        if review.cards.is_empty() {
            let _ = write!(out, "<div class=\"empty\">{}</div>", esc(&review.empty_label));
        }
        for card in &review.cards {
            out.push_str(&render_skill_card(card));
        }
        let _ = write!(out, "<button data-close-modal>{}</button></div>\n", esc(&review.close_label));
    }

    let _ = write!(out, "<footer>{}</footer>\n</body>\n</html>\n", esc(&view.footer));
    out
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

fn render_workers(view: &DashboardView) -> String {
    let mut out = format!(
        "<div id=\"ashigaru-status\"><span class=\"label\">{}</span>",
        esc(&view.workers.title)
    );
    for chip in &view.workers.entries {
        let _ = write!(
            out,
            "<span class=\"worker-chip{}\" data-ashigaru-id=\"{}\" title=\"{}\">{}</span>",
            if chip.highlighted { " busy" } else { "" },
            esc(&chip.id),
            esc(&chip.status_label),
            esc(&chip.label)
        );
    }
    out.push_str("</div>\n");
    out
}

fn render_pane(id: &str, pane: &PaneView) -> String {
    let mut out = format!("<div class=\"pane\" id=\"{}\"><h2>{}</h2>", esc(id), esc(&pane.title));
    if let Some(auto) = pane.auto_refresh {
        let _ = write!(out, "<input type=\"checkbox\" class=\"pane-auto\"{}>", checked(auto));
    }
    if let Some(updating) = &pane.updating {
        let _ = write!(out, "<span class=\"updating\">{}</span>", esc(updating));
    }
    match &pane.body {
        PaneBody::Loading(label) => {
            let _ = write!(out, "<pre class=\"loading\">{}</pre>", esc(label));
        }
        PaneBody::Output(text) => {
            let _ = write!(out, "<pre>{}</pre>", esc(text));
        }
        PaneBody::Message { text, is_error } => {
            let _ = write!(
                out,
                "<pre class=\"{}\">{}</pre>",
                if *is_error { "error" } else { "empty" },
                esc(text)
            );
        }
    }
    out.push_str("</div>\n");
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════════════

pub fn render_section(section: &RenderedSection) -> String {
    let mut out = format!(
        "<section id=\"{}\" class=\"section{}\"><h2 title=\"{}\">{}</h2>",
        section.id.key(),
        if section.collapsed { " collapsed" } else { "" },
        esc(&section.toggle_hint),
        esc(&section.title)
    );
    out.push_str("<div class=\"content\">");
    if let Some(badge) = &section.badge {
        let _ = write!(
            out,
            "<button class=\"skill-badge\" data-count=\"{}\">{} {} {}</button>",
            badge.count,
            esc(&badge.label),
            esc(&badge.count_label),
            esc(&badge.status_label)
        );
    }
    match &section.body {
        SectionBody::Loading(label) => {
            let _ = write!(out, "<div class=\"loading\">{}</div>", esc(label));
        }
        SectionBody::Empty(label) => {
            let _ = write!(out, "<div class=\"empty\">{}</div>", esc(label));
        }
        SectionBody::ActionItems(items) => {
            for item in items {
                out.push_str(&render_action_item(item));
            }
        }
        SectionBody::Table(table) => out.push_str(&render_table(table)),
        SectionBody::SkillCards(cards) => {
            for card in cards {
                out.push_str(&render_skill_card(card));
            }
        }
        SectionBody::GeneratedSkills(skills) => {
            for skill in skills {
                out.push_str(&render_generated_skill(skill));
            }
        }
        SectionBody::List(items) => {
            out.push_str("<ul>");
            for item in items {
                let _ = write!(out, "<li>{}</li>", esc(item));
            }
            out.push_str("</ul>");
        }
    }
    if let Some(reports) = &section.reports {
        let _ = write!(out, "<div class=\"reports\"><h3>{}</h3>", esc(&reports.title));
        for report in &reports.items {
            let _ = write!(out, "<div class=\"report\"><h4>{}</h4>", esc(&report.cmd_id));
            if let Some(order) = &report.order {
                let _ = write!(out, "<p>{} {}</p>", esc(&reports.order_label), esc(order));
            }
            if let Some(result) = &report.result {
                let _ = write!(out, "<p>{} {}</p>", esc(&reports.result_label), esc(result));
            }
            out.push_str("</div>");
        }
        out.push_str("</div>");
    }
    out.push_str("</div></section>\n");
    out
}

fn render_action_item(item: &ActionItemView) -> String {
    let mut out = format!("<div class=\"action-item\"><h3>{}</h3>", esc(&item.title));
    match &item.delete {
        DeleteControl::Available { tooltip, .. } => {
            let _ = write!(
                out,
                "<button class=\"action-delete\" data-title=\"{}\" title=\"{}\">×</button>",
                esc(&item.title),
                esc(tooltip)
            );
        }
        DeleteControl::Sending(label) | DeleteControl::Sent(label) | DeleteControl::Failed(label) => {
            let _ = write!(out, "<span class=\"action-delete-state\">{}</span>", esc(label));
        }
    }
    let _ = write!(out, "<div class=\"content\">{}</div></div>", render_blocks(&item.blocks));
    out
}

/// Markdown blocks as HTML: lines joined by `<br>`, tables as `<table>`.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut previous_was_line = false;
    for block in blocks {
        match block {
            Block::Line(spans) => {
                if previous_was_line {
                    out.push_str("<br>");
                }
                out.push_str(&render_spans(spans));
                previous_was_line = true;
            }
            Block::Table { header, rows } => {
                out.push_str("<table class=\"md-table\"><thead><tr>");
                for cell in header {
                    let _ = write!(out, "<th>{}</th>", render_spans(cell));
                }
                out.push_str("</tr></thead><tbody>");
                for row in rows {
                    out.push_str("<tr>");
                    for cell in row {
                        let _ = write!(out, "<td>{}</td>", render_spans(cell));
                    }
                    out.push_str("</tr>");
                }
                out.push_str("</tbody></table>");
                previous_was_line = false;
            }
        }
    }
    out
}

fn render_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) => esc(text),
            Span::Bold(text) => format!("<strong>{}</strong>", esc(text)),
        })
        .collect()
}

fn render_table(table: &TableView) -> String {
    let mut out = String::from("<table><thead><tr>");
    for header in &table.headers {
        let _ = write!(out, "<th>{}</th>", esc(header));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        match &row.worker_id {
            Some(id) => {
                let _ = write!(
                    out,
                    "<tr data-ashigaru-id=\"{}\" title=\"{}\">",
                    esc(id.as_str()),
                    escape_html(row.tooltip.as_deref())
                );
            }
            None => out.push_str("<tr>"),
        }
        for cell in &row.cells {
            let _ = write!(out, "<td>{}</td>", esc(cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

fn render_skill_card(card: &SkillCardView) -> String {
    let mut out = format!(
        "<div class=\"skill-card\" data-skill-name=\"{}\"><h3>{}</h3>",
        esc(&card.name),
        esc(&card.name)
    );
    if let Some(badge) = &card.pending_badge {
        let _ = write!(out, "<span class=\"pending-badge\">{}</span>", esc(badge));
    }
    let _ = write!(
        out,
        "<div class=\"description\">{}</div><div class=\"meta\">{}",
        esc(&card.description),
        esc(&card.source)
    );
    if let Some(generality) = &card.generality {
        let _ = write!(out, " | {}", esc(generality));
    }
    let _ = write!(out, " | {}</div>", esc(&card.status_label));
    match &card.controls {
        ReviewControls::None => {}
        ReviewControls::Buttons { approve, reject } => {
            let _ = write!(
                out,
                "<div class=\"skill-actions\"><button class=\"skill-approve\">{}</button><button class=\"skill-reject\">{}</button></div>",
                esc(approve),
                esc(reject)
            );
        }
        ReviewControls::ReasonInput { placeholder, confirm } => {
            let _ = write!(
                out,
                "<div class=\"skill-actions\"><input class=\"skill-reason\" placeholder=\"{}\"><button class=\"skill-reject-confirm\">{}</button></div>",
                esc(placeholder),
                esc(confirm)
            );
        }
        ReviewControls::Status(label) => {
            let _ = write!(out, "<div class=\"skill-status\">{}</div>", esc(label));
        }
        ReviewControls::Failed { message, approve, reject } => {
            let _ = write!(
                out,
                "<div class=\"skill-status error\">{}</div><div class=\"skill-actions\"><button class=\"skill-approve\">{}</button><button class=\"skill-reject\">{}</button></div>",
                esc(message),
                esc(approve),
                esc(reject)
            );
        }
    }
    out.push_str("</div>");
    out
}

fn render_generated_skill(skill: &GeneratedSkillView) -> String {
    let mut out = format!(
        "<div class=\"skill-card\"><h3>{}</h3><div class=\"description\">{}</div>",
        esc(&skill.name),
        escape_html(skill.description.as_deref())
    );
    if !skill.meta.is_empty() {
        let meta: Vec<String> = skill.meta.iter().map(|m| esc(m)).collect();
        let _ = write!(out, "<div class=\"meta\">{}</div>", meta.join(" | "));
    }
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markdown;
    use crate::render::{CollapseHint, SkillBadge};
    use crate::types::SectionId;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(None), "");
        assert_eq!(escape_html(Some("")), "");
        assert_eq!(
            escape_html(Some("<b>\"x\" & 'y'</b>")),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_blocks_render_bold_breaks_and_tables() {
        let html = render_blocks(&markdown::parse("**a** <b>\nnext\n| h |\n|---|\n| v |"));
        assert_eq!(
            html,
            "<strong>a</strong> &lt;b&gt;<br>next<table class=\"md-table\"><thead><tr><th>h</th></tr></thead><tbody><tr><td>v</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_section_renders_badge_and_empty_placeholder() {
        let section = RenderedSection {
            id: SectionId::ActionRequired,
            title: "要対応".to_string(),
            toggle_hint: "クリックで開閉".to_string(),
            hint: CollapseHint::ForceOpen,
            collapsed: false,
            badge: Some(SkillBadge {
                count: 1,
                label: "スキル化候補".to_string(),
                count_label: "1件".to_string(),
                status_label: "【承認待ち】".to_string(),
            }),
            body: SectionBody::Empty("なし".to_string()),
            reports: None,
        };
        let html = render_section(&section);
        assert!(html.contains("id=\"action-required\""));
        assert!(html.contains("data-count=\"1\""));
        assert!(html.contains("<div class=\"empty\">なし</div>"));
        assert!(!html.contains("collapsed"));
    }

    #[test]
    fn test_interactive_rows_carry_worker_id() {
        use crate::render::TableRowView;
        use crate::types::WorkerId;

        let html = render_table(&TableView {
            headers: vec!["担当".to_string()],
            rows: vec![TableRowView {
                cells: vec!["足軽2".to_string()],
                worker_id: Some(WorkerId::from_digits("2")),
                tooltip: Some("クリックで詳細表示".to_string()),
            }],
        });
        assert!(html.contains("<tr data-ashigaru-id=\"ashigaru2\" title=\"クリックで詳細表示\">"));
    }
}
