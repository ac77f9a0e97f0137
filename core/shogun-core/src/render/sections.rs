//! Snapshot-to-section projection.
//!
//! Every function here is a pure projection of its inputs. Empty
//! collections render the localized placeholder; the collapse hint tells the
//! caller whether an applied snapshot forces the section open or shut.

use std::collections::HashMap;

use crate::dispatch::{DeleteState, Deletions, ReviewState, Reviews};
use crate::i18n::Localizer;
use crate::identity;
use crate::types::{
    count_pending, ActionItem, CollapsePolicy, CompletedItem, CompletedReport, DashboardSnapshot,
    GeneratedSkill, SectionId, SkillCandidate, WorkItem,
};

use super::markdown;
use super::{
    ActionItemView, CollapseHint, DeleteControl, GeneratedSkillView, RenderedSection,
    ReportItemView, ReportsView, ReviewControls, SectionBody, SkillBadge, SkillCardView,
    TableRowView, TableView,
};

const MISSING_CELL: &str = "-";

/// Everything besides the snapshot that a projection reads.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub localizer: &'a Localizer,
    pub collapsed: &'a HashMap<SectionId, bool>,
    pub reviews: &'a Reviews,
    pub deletions: &'a Deletions,
}

/// Collapsed flag for a section nobody has touched yet.
pub fn default_collapsed(section: SectionId) -> bool {
    match section.collapse_policy() {
        CollapsePolicy::Persisted { default } => default,
        CollapsePolicy::ContentDerived => false,
    }
}

/// Projects every section, or loading placeholders before the first snapshot.
pub fn render_all(snapshot: Option<&DashboardSnapshot>, ctx: &RenderContext) -> Vec<RenderedSection> {
    let Some(snapshot) = snapshot else {
        return SectionId::ALL
            .into_iter()
            .map(|section| loading(section, ctx))
            .collect();
    };
    vec![
        action_required(&snapshot.action_required, &snapshot.skill_candidates, ctx),
        in_progress(&snapshot.in_progress, ctx),
        completed_today(&snapshot.completed_today, &snapshot.completed_reports, ctx),
        skill_candidates(&snapshot.skill_candidates, ctx),
        generated_skills(&snapshot.generated_skills, ctx),
        plain_list(SectionId::Waiting, &snapshot.waiting, ctx),
        plain_list(SectionId::Inquiries, &snapshot.inquiries, ctx),
    ]
}

/// The collapse change each section receives when `snapshot` is applied.
pub fn collapse_hints(snapshot: &DashboardSnapshot) -> Vec<(SectionId, CollapseHint)> {
    SectionId::ALL
        .into_iter()
        .map(|section| {
            let has_content = match section {
                SectionId::ActionRequired => {
                    !snapshot.action_required.is_empty() || snapshot.pending_candidates() > 0
                }
                SectionId::InProgress => !snapshot.in_progress.is_empty(),
                SectionId::CompletedToday => !snapshot.completed_today.is_empty(),
                SectionId::SkillCandidates => !snapshot.skill_candidates.is_empty(),
                SectionId::GeneratedSkills => !snapshot.generated_skills.is_empty(),
                SectionId::Waiting => !snapshot.waiting.is_empty(),
                SectionId::Inquiries => !snapshot.inquiries.is_empty(),
            };
            (section, CollapseHint::from_content(section, has_content))
        })
        .collect()
}

pub fn loading(section: SectionId, ctx: &RenderContext) -> RenderedSection {
    let body = SectionBody::Loading(ctx.localizer.t("section.loading").to_string());
    build(section, CollapseHint::Keep, body, ctx)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Action Required
// ═══════════════════════════════════════════════════════════════════════════════

/// Action items, headed by a badge when skill candidates await review.
pub fn action_required(
    items: &[ActionItem],
    candidates: &[SkillCandidate],
    ctx: &RenderContext,
) -> RenderedSection {
    let l = ctx.localizer;
    let pending = count_pending(candidates);
    let badge = (pending > 0).then(|| SkillBadge {
        count: pending,
        label: l.t("skill.badge").to_string(),
        count_label: l.t_n("skill.badgeCount", pending),
        status_label: l.t("skill.badgeStatus").to_string(),
    });

    let body = if items.is_empty() {
        empty(ctx)
    } else {
        SectionBody::ActionItems(
            items
                .iter()
                .map(|item| ActionItemView {
                    title: item.title.clone(),
                    blocks: markdown::parse(&item.content),
                    delete: delete_control(ctx.deletions.get(&item.title), l),
                })
                .collect(),
        )
    };

    let hint = CollapseHint::from_content(
        SectionId::ActionRequired,
        !items.is_empty() || badge.is_some(),
    );
    let mut section = build(SectionId::ActionRequired, hint, body, ctx);
    section.badge = badge;
    section
}

fn delete_control(state: Option<&DeleteState>, l: &Localizer) -> DeleteControl {
    match state {
        None => DeleteControl::Available {
            tooltip: l.t("action.deleteTitle").to_string(),
            confirm_prompt: l.t("action.deleteConfirm").to_string(),
        },
        Some(DeleteState::Sending) => DeleteControl::Sending(l.t("action.sending").to_string()),
        Some(DeleteState::Sent) => DeleteControl::Sent(l.t("action.sent").to_string()),
        Some(DeleteState::Failed(_)) => DeleteControl::Failed(l.t("action.failed").to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════════════

pub fn in_progress(items: &[WorkItem], ctx: &RenderContext) -> RenderedSection {
    let l = ctx.localizer;
    let body = if items.is_empty() {
        empty(ctx)
    } else {
        SectionBody::Table(TableView {
            headers: headers(l, &["table.worker", "table.task", "table.project", "table.status"]),
            rows: items
                .iter()
                .map(|item| {
                    let worker_id = item.worker_label.as_deref().and_then(identity::resolve);
                    TableRowView {
                        cells: vec![
                            cell(&item.worker_label),
                            cell(&item.task),
                            cell(&item.project),
                            item.status
                                .clone()
                                .unwrap_or_else(|| l.t("table.defaultStatus").to_string()),
                        ],
                        tooltip: worker_id
                            .as_ref()
                            .map(|_| l.t("table.clickDetail").to_string()),
                        worker_id,
                    }
                })
                .collect(),
        })
    };
    let hint = CollapseHint::from_content(SectionId::InProgress, !items.is_empty());
    build(SectionId::InProgress, hint, body, ctx)
}

pub fn completed_today(
    items: &[CompletedItem],
    reports: &[CompletedReport],
    ctx: &RenderContext,
) -> RenderedSection {
    let l = ctx.localizer;
    let body = if items.is_empty() {
        empty(ctx)
    } else {
        SectionBody::Table(TableView {
            headers: headers(l, &["table.time", "table.project", "table.task", "table.result"]),
            rows: items
                .iter()
                .map(|item| TableRowView {
                    cells: vec![
                        cell(&item.id),
                        cell(&item.project),
                        cell(&item.task),
                        cell(&item.result),
                    ],
                    worker_id: None,
                    tooltip: None,
                })
                .collect(),
        })
    };
    let mut section = build(SectionId::CompletedToday, CollapseHint::Keep, body, ctx);
    section.reports = (!reports.is_empty()).then(|| ReportsView {
        title: l.t("report.title").to_string(),
        order_label: l.t("report.order").to_string(),
        result_label: l.t("report.result").to_string(),
        items: reports
            .iter()
            .map(|report| ReportItemView {
                cmd_id: report.cmd_id.clone(),
                order: report.order.clone(),
                result: report.result.clone(),
            })
            .collect(),
    });
    section
}

// ═══════════════════════════════════════════════════════════════════════════════
// Skills
// ═══════════════════════════════════════════════════════════════════════════════

pub fn skill_candidates(items: &[SkillCandidate], ctx: &RenderContext) -> RenderedSection {
    let body = if items.is_empty() {
        empty(ctx)
    } else {
        SectionBody::SkillCards(items.iter().map(|c| skill_card(c, ctx)).collect())
    };
    let hint = CollapseHint::from_content(SectionId::SkillCandidates, !items.is_empty());
    build(SectionId::SkillCandidates, hint, body, ctx)
}

/// One candidate card, shared by the section and the review surface.
pub fn skill_card(candidate: &SkillCandidate, ctx: &RenderContext) -> SkillCardView {
    let l = ctx.localizer;
    let pending = candidate.status.is_pending();
    let source = non_blank(&candidate.source).unwrap_or_else(|| l.t("skill.unknownSource"));

    SkillCardView {
        name: candidate.name.clone(),
        description: non_blank(&candidate.description)
            .unwrap_or_else(|| l.t("skill.noDescription"))
            .to_string(),
        source: format!("{} {}", l.t("skill.source"), source),
        generality: candidate
            .generality
            .as_deref()
            .and_then(non_blank)
            .map(|g| format!("{} {}", l.t("skill.generality"), g)),
        status_label: candidate.status.label().to_string(),
        pending_badge: pending.then(|| l.t("skill.pendingBadge").to_string()),
        controls: review_controls(pending, ctx.reviews.get(&candidate.name), l),
    }
}

fn review_controls(pending: bool, state: Option<&ReviewState>, l: &Localizer) -> ReviewControls {
    let buttons = || ReviewControls::Buttons {
        approve: l.t("skill.approve").to_string(),
        reject: l.t("skill.reject").to_string(),
    };
    match (pending, state) {
        (_, Some(ReviewState::Sending)) => ReviewControls::Status(l.t("skill.sending").to_string()),
        (_, Some(ReviewState::Approved)) => {
            ReviewControls::Status(l.t("skill.approved").to_string())
        }
        (_, Some(ReviewState::Rejected)) => {
            ReviewControls::Status(l.t("skill.rejected").to_string())
        }
        (false, _) => ReviewControls::None,
        (true, Some(ReviewState::ReasonInput)) => ReviewControls::ReasonInput {
            placeholder: l.t("skill.rejectReason").to_string(),
            confirm: l.t("skill.rejectConfirm").to_string(),
        },
        (true, Some(ReviewState::Failed(message))) => ReviewControls::Failed {
            message: message.clone(),
            approve: l.t("skill.approve").to_string(),
            reject: l.t("skill.reject").to_string(),
        },
        (true, None) => buttons(),
    }
}

pub fn generated_skills(items: &[GeneratedSkill], ctx: &RenderContext) -> RenderedSection {
    let l = ctx.localizer;
    let body = if items.is_empty() {
        empty(ctx)
    } else {
        SectionBody::GeneratedSkills(
            items
                .iter()
                .map(|skill| {
                    let labelled = [
                        ("skill.supportedLangs", &skill.languages),
                        ("skill.createdAt", &skill.created_at),
                        ("skill.designDoc", &skill.design_doc),
                    ];
                    GeneratedSkillView {
                        name: skill.name.clone(),
                        description: skill.description.as_deref().and_then(non_blank).map(str::to_string),
                        meta: labelled
                            .into_iter()
                            .filter_map(|(key, value)| {
                                let value = value.as_deref().and_then(non_blank)?;
                                Some(format!("{} {}", l.t(key), value))
                            })
                            .collect(),
                    }
                })
                .collect(),
        )
    };
    let hint = CollapseHint::from_content(SectionId::GeneratedSkills, !items.is_empty());
    build(SectionId::GeneratedSkills, hint, body, ctx)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Lists
// ═══════════════════════════════════════════════════════════════════════════════

pub fn plain_list(section: SectionId, items: &[String], ctx: &RenderContext) -> RenderedSection {
    let body = if items.is_empty() {
        empty(ctx)
    } else {
        SectionBody::List(items.to_vec())
    };
    build(section, CollapseHint::from_content(section, !items.is_empty()), body, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn build(
    section: SectionId,
    hint: CollapseHint,
    body: SectionBody,
    ctx: &RenderContext,
) -> RenderedSection {
    let collapsed = ctx
        .collapsed
        .get(&section)
        .copied()
        .unwrap_or_else(|| hint.forced().unwrap_or_else(|| default_collapsed(section)));
    RenderedSection {
        id: section,
        title: ctx.localizer.t(section.title_key()).to_string(),
        toggle_hint: ctx.localizer.t("section.toggle").to_string(),
        hint,
        collapsed,
        badge: None,
        body,
        reports: None,
    }
}

fn empty(ctx: &RenderContext) -> SectionBody {
    SectionBody::Empty(ctx.localizer.t("empty.none").to_string())
}

fn headers(l: &Localizer, keys: &[&'static str]) -> Vec<String> {
    keys.iter().map(|key| l.t(key).to_string()).collect()
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING_CELL.to_string())
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::types::SkillStatus;

    struct Fixture {
        localizer: Localizer,
        collapsed: HashMap<SectionId, bool>,
        reviews: Reviews,
        deletions: Deletions,
    }

    impl Fixture {
        fn new(language: Language) -> Self {
            Self {
                localizer: Localizer::new(language),
                collapsed: HashMap::new(),
                reviews: Reviews::default(),
                deletions: Deletions::default(),
            }
        }

        fn ctx(&self) -> RenderContext<'_> {
            RenderContext {
                localizer: &self.localizer,
                collapsed: &self.collapsed,
                reviews: &self.reviews,
                deletions: &self.deletions,
            }
        }
    }

    fn candidate(name: &str, status: Option<&str>) -> SkillCandidate {
        SkillCandidate {
            name: name.to_string(),
            description: String::new(),
            source: String::new(),
            generality: None,
            status: SkillStatus::from_wire(status),
        }
    }

    #[test]
    fn test_pending_candidate_badges_empty_action_section() {
        let fixture = Fixture::new(Language::Ja);
        let section = action_required(&[], &[candidate("lint", Some("承認待ち"))], &fixture.ctx());

        let badge = section.badge.expect("badge");
        assert_eq!(badge.count, 1);
        assert_eq!(badge.count_label, "1件");
        assert_eq!(section.body, SectionBody::Empty("なし".to_string()));
        assert_eq!(section.hint, CollapseHint::ForceOpen);
    }

    #[test]
    fn test_empty_sections_force_collapse() {
        let fixture = Fixture::new(Language::En);
        let section = in_progress(&[], &fixture.ctx());
        assert_eq!(section.body, SectionBody::Empty("None".to_string()));
        assert_eq!(section.hint, CollapseHint::ForceCollapsed);
        assert!(section.collapsed);
    }

    #[test]
    fn test_completed_section_keeps_operator_choice() {
        let mut fixture = Fixture::new(Language::Ja);
        let section = completed_today(&[CompletedItem::default()], &[], &fixture.ctx());
        assert_eq!(section.hint, CollapseHint::Keep);
        assert!(section.collapsed);

        fixture.collapsed.insert(SectionId::CompletedToday, false);
        let section = completed_today(&[], &[], &fixture.ctx());
        assert!(!section.collapsed);
    }

    #[test]
    fn test_in_progress_rows_resolve_worker_ids() {
        let fixture = Fixture::new(Language::Ja);
        let items = vec![
            WorkItem {
                worker_label: Some("足軽3".to_string()),
                task: Some("lint".to_string()),
                project: None,
                status: None,
            },
            WorkItem {
                worker_label: Some("家老".to_string()),
                ..Default::default()
            },
        ];
        let section = in_progress(&items, &fixture.ctx());
        let SectionBody::Table(table) = section.body else {
            panic!("expected table");
        };
        assert_eq!(table.rows[0].worker_id.as_ref().map(|id| id.as_str()), Some("ashigaru3"));
        assert_eq!(table.rows[0].tooltip.as_deref(), Some("クリックで詳細表示"));
        assert_eq!(table.rows[0].cells, vec!["足軽3", "lint", "-", "戦闘中"]);
        assert_eq!(table.rows[1].worker_id, None);
        assert_eq!(table.rows[1].tooltip, None);
    }

    #[test]
    fn test_skill_card_fallbacks() {
        let fixture = Fixture::new(Language::En);
        let card = skill_card(&candidate("lint", None), &fixture.ctx());
        assert_eq!(card.description, "No description");
        assert_eq!(card.source, "Source: Unknown");
        assert!(card.pending_badge.is_some());
        assert!(matches!(card.controls, ReviewControls::Buttons { .. }));

        let reviewed = skill_card(&candidate("old", Some("承認済み")), &fixture.ctx());
        assert_eq!(reviewed.controls, ReviewControls::None);
        assert_eq!(reviewed.pending_badge, None);
    }

    #[test]
    fn test_skill_card_follows_review_state() {
        let mut fixture = Fixture::new(Language::En);
        let lint = candidate("lint", None);
        fixture.reviews.open_reject(&lint).unwrap();
        assert!(matches!(
            skill_card(&lint, &fixture.ctx()).controls,
            ReviewControls::ReasonInput { .. }
        ));

        fixture.reviews.begin_confirm_reject("lint", None).unwrap();
        assert_eq!(
            skill_card(&lint, &fixture.ctx()).controls,
            ReviewControls::Status("Sending...".to_string())
        );
    }

    #[test]
    fn test_action_items_carry_markdown_and_delete_state() {
        let mut fixture = Fixture::new(Language::En);
        fixture.deletions.begin("API key").unwrap();
        let items = vec![ActionItem {
            title: "API key".to_string(),
            content: "**rotate** now".to_string(),
        }];
        let section = action_required(&items, &[], &fixture.ctx());
        let SectionBody::ActionItems(views) = section.body else {
            panic!("expected items");
        };
        assert_eq!(views[0].blocks.len(), 1);
        assert_eq!(views[0].delete, DeleteControl::Sending("Sending...".to_string()));
        assert!(section.badge.is_none());
    }

    #[test]
    fn test_render_all_before_first_snapshot_is_loading() {
        let fixture = Fixture::new(Language::Ja);
        let sections = render_all(None, &fixture.ctx());
        assert_eq!(sections.len(), SectionId::ALL.len());
        assert!(sections
            .iter()
            .all(|s| s.body == SectionBody::Loading("読込中...".to_string())));
    }

    #[test]
    fn test_generated_skill_meta_skips_blank_fields() {
        let fixture = Fixture::new(Language::En);
        let section = generated_skills(
            &[GeneratedSkill {
                name: "fmt".to_string(),
                description: Some("formatter".to_string()),
                languages: Some("rust".to_string()),
                created_at: Some(" ".to_string()),
                design_doc: None,
            }],
            &fixture.ctx(),
        );
        let SectionBody::GeneratedSkills(skills) = section.body else {
            panic!("expected skills");
        };
        assert_eq!(skills[0].meta, vec!["Languages: rust"]);
    }

    #[test]
    fn test_collapse_hints_cover_every_section() {
        let snapshot = DashboardSnapshot {
            waiting: vec!["karo".to_string()],
            ..Default::default()
        };
        let hints: HashMap<_, _> = collapse_hints(&snapshot).into_iter().collect();
        assert_eq!(hints.len(), SectionId::ALL.len());
        assert_eq!(hints[&SectionId::Waiting], CollapseHint::ForceOpen);
        assert_eq!(hints[&SectionId::Inquiries], CollapseHint::ForceCollapsed);
        assert_eq!(hints[&SectionId::CompletedToday], CollapseHint::Keep);
    }
}
