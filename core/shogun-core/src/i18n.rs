//! Display strings and language selection.
//!
//! Lookup order is active language, then Japanese, then the key itself, so a
//! missing translation shows up as a raw key instead of an empty label.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::preferences::{Preferences, KEY_LANGUAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ja,
    En,
}

pub const FALLBACK_LANGUAGE: Language = Language::Ja;

impl Language {
    pub const SUPPORTED: [Language; 2] = [Language::Ja, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|language| language.code() == code.trim())
    }

    /// Picks Japanese for any locale mentioning `ja`, English otherwise.
    pub fn from_locale(locale: &str) -> Self {
        if locale.contains("ja") {
            Language::Ja
        } else {
            Language::En
        }
    }

    /// Reads the first non-empty of `LC_ALL`, `LC_MESSAGES`, `LANG`.
    pub fn detect() -> Self {
        let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .into_iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
            .unwrap_or_default();
        Self::from_locale(&locale)
    }
}

/// Translation dictionaries keyed by language.
pub struct Catalog {
    dictionaries: HashMap<Language, HashMap<&'static str, &'static str>>,
}

impl Catalog {
    pub fn new(entries: &[(Language, &[(&'static str, &'static str)])]) -> Self {
        let dictionaries = entries
            .iter()
            .map(|(language, pairs)| (*language, pairs.iter().copied().collect()))
            .collect();
        Self { dictionaries }
    }

    fn lookup(&self, language: Language, key: &str) -> Option<&'static str> {
        self.dictionaries.get(&language)?.get(key).copied()
    }
}

pub static CATALOG: Lazy<Catalog> =
    Lazy::new(|| Catalog::new(&[(Language::Ja, JA), (Language::En, EN)]));

/// Resolves keys against the active language.
#[derive(Clone, Copy)]
pub struct Localizer {
    language: Language,
    catalog: &'static Catalog,
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("language", &self.language)
            .finish()
    }
}

impl Localizer {
    pub fn new(language: Language) -> Self {
        Self::with_catalog(language, &CATALOG)
    }

    pub fn with_catalog(language: Language, catalog: &'static Catalog) -> Self {
        Self { language, catalog }
    }

    /// Saved language if any, otherwise one-time locale detection.
    ///
    /// Detection is not persisted; the choice becomes sticky only once the
    /// operator picks a language.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        let saved: Option<String> = prefs.get(KEY_LANGUAGE, None);
        let language = saved
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or_else(Language::detect);
        Self::new(language)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        let found: Option<&'a str> = self
            .catalog
            .lookup(self.language, key)
            .or_else(|| self.catalog.lookup(FALLBACK_LANGUAGE, key));
        found.unwrap_or(key)
    }

    /// `t` with `{N}` replaced by `n`.
    pub fn t_n(&self, key: &str, n: impl std::fmt::Display) -> String {
        self.t(key).replace("{N}", &n.to_string())
    }

    /// Switches language and persists the choice. Unknown codes are ignored.
    ///
    /// Returns whether the language was accepted. Callers re-project every
    /// translated surface afterwards.
    pub fn set_language(&mut self, code: &str, prefs: &mut Preferences) -> bool {
        let Some(language) = Language::from_code(code) else {
            debug!(code, "Ignoring unsupported language");
            return false;
        };
        self.language = language;
        prefs.set(KEY_LANGUAGE, language.code());
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dictionaries
// ═══════════════════════════════════════════════════════════════════════════════

const JA: &[(&str, &str)] = &[
    ("page.title", "戦況報告 - multi-agent-shogun"),
    ("page.description", "multi-agent-shogun 戦況ダッシュボード"),
    ("header.title", "戦況報告"),
    ("header.lastUpdated", "最終更新:"),
    ("header.autoRefresh", "自動更新 (5秒)"),
    ("header.error", "取得エラー:"),
    ("command.title", "上様へのご下命"),
    ("command.placeholder", "ご命令をお書きください..."),
    ("command.submit", "出陣！"),
    ("command.sending", "送信中..."),
    ("command.emptyWarning", "ご命令をお書きください"),
    ("command.success", "ご下命を将軍にお伝えいたしました"),
    ("command.failure", "送信失敗:"),
    ("command.unknownError", "不明なエラー"),
    ("history.title", "ご下命履歴"),
    ("history.empty", "履歴なし"),
    ("shogun.title", "将軍 進行状況"),
    ("shogun.refresh", "更新"),
    ("shogun.autoRefresh", "自動更新"),
    ("shogun.loading", "読込中..."),
    ("shogun.updating", "更新中..."),
    ("shogun.error", "エラー:"),
    ("shogun.noOutput", "（出力なし）"),
    ("shogun.fetchFailed", "取得失敗:"),
    ("karo.label", "家老:"),
    ("karo.busy", "処理中"),
    ("karo.idle", "待機中"),
    ("karo.title", "家老 進行状況"),
    ("karo.close", "▲ 閉じる"),
    ("karo.loading", "読込中..."),
    ("karo.badgeTitle", "クリックで家老ターミナル表示/非表示"),
    ("karo.error", "エラー:"),
    ("karo.noOutput", "（出力なし）"),
    ("karo.fetchFailed", "取得失敗"),
    ("karo.updating", "更新中..."),
    ("section.actionRequired", "要対応"),
    ("section.inProgress", "進行中"),
    ("section.completedToday", "本日の戦果"),
    ("section.skillCandidates", "スキル化候補"),
    ("section.generatedSkills", "生成されたスキル"),
    ("section.waiting", "待機中"),
    ("section.inquiries", "伺い事項"),
    ("section.loading", "読込中..."),
    ("section.toggle", "クリックで開閉"),
    ("empty.none", "なし"),
    ("empty.cssContent", "無"),
    ("table.worker", "担当"),
    ("table.task", "任務"),
    ("table.project", "戦場"),
    ("table.status", "状態"),
    ("table.defaultStatus", "戦闘中"),
    ("table.clickDetail", "クリックで詳細表示"),
    ("table.time", "時刻"),
    ("table.result", "結果"),
    ("report.title", "完了報告"),
    ("report.order", "指令:"),
    ("report.result", "結果:"),
    ("workers.title", "足軽"),
    ("workers.busy", "作業中"),
    ("workers.idle", "待機"),
    ("workers.unknown", "不明"),
    ("modal.ashigaruTitle", "足軽{N} 進行状況"),
    ("modal.loading", "読込中..."),
    ("modal.updating", "更新中..."),
    ("modal.refresh", "更新"),
    ("modal.close", "閉じる"),
    ("modal.error", "エラー:"),
    ("modal.noOutput", "（出力なし）"),
    ("modal.fetchFailed", "取得失敗:"),
    ("skill.badge", "スキル化候補"),
    ("skill.badgeCount", "{N}件"),
    ("skill.badgeStatus", "【承認待ち】"),
    ("skill.modalTitle", "スキル化候補一覧"),
    ("skill.empty", "スキル化候補はありません"),
    ("skill.noDescription", "説明なし"),
    ("skill.unknownSource", "不明"),
    ("skill.pendingBadge", "🔔 承認待ち"),
    ("skill.source", "発見元:"),
    ("skill.generality", "汎用性:"),
    ("skill.approve", "承認"),
    ("skill.reject", "否認"),
    ("skill.approved", "承認済み"),
    ("skill.rejected", "否認済み"),
    ("skill.sending", "送信中..."),
    ("skill.sendFailed", "送信失敗:"),
    ("skill.rejectReason", "否認理由（省略可）"),
    ("skill.rejectConfirm", "否認を送信"),
    ("skill.supportedLangs", "対応言語:"),
    ("skill.createdAt", "生成日:"),
    ("skill.designDoc", "設計書:"),
    ("action.deleteTitle", "この項目の削除を将軍に指示"),
    ("action.deleteConfirm", "この要対応項目の削除を将軍に指示しますか？"),
    ("action.sending", "送信中..."),
    ("action.sent", "✓ 送信済み"),
    ("action.failed", "× 失敗"),
    ("notify.toggle", "通知"),
    ("notify.enabled", "通知: オン"),
    ("notify.disabled", "通知: オフ"),
    ("notify.denied", "通知が許可されていません"),
    ("notify.unsupported", "この環境は通知に対応していません"),
    ("notify.actionTitle", "🚨 要対応が増えました"),
    ("notify.actionBody", "要対応 {N}件"),
    ("notify.completedTitle", "✅ 戦果が増えました"),
    ("notify.completedBody", "本日の戦果 {N}件"),
    ("lang.label", "言語"),
    ("footer.text", "戦国AIオーケストレーション"),
];

const EN: &[(&str, &str)] = &[
    ("page.title", "Battle Report - multi-agent-shogun"),
    ("page.description", "multi-agent-shogun Battle Dashboard"),
    ("header.title", "Battle Report"),
    ("header.lastUpdated", "Last updated:"),
    ("header.autoRefresh", "Auto-refresh (5s)"),
    ("header.error", "Fetch error:"),
    ("command.title", "Orders to the Shogun"),
    ("command.placeholder", "Enter your orders..."),
    ("command.submit", "Deploy!"),
    ("command.sending", "Sending..."),
    ("command.emptyWarning", "Please enter your orders"),
    ("command.success", "Your orders have been delivered to the Shogun"),
    ("command.failure", "Send failed:"),
    ("command.unknownError", "Unknown error"),
    ("history.title", "Order history"),
    ("history.empty", "No history"),
    ("shogun.title", "Shogun Status"),
    ("shogun.refresh", "Refresh"),
    ("shogun.autoRefresh", "Auto-refresh"),
    ("shogun.loading", "Loading..."),
    ("shogun.updating", "Updating..."),
    ("shogun.error", "Error:"),
    ("shogun.noOutput", "(No output)"),
    ("shogun.fetchFailed", "Fetch failed:"),
    ("karo.label", "Karo:"),
    ("karo.busy", "Busy"),
    ("karo.idle", "Idle"),
    ("karo.title", "Karo Status"),
    ("karo.close", "▲ Close"),
    ("karo.loading", "Loading..."),
    ("karo.badgeTitle", "Click to toggle Karo terminal"),
    ("karo.error", "Error:"),
    ("karo.noOutput", "(No output)"),
    ("karo.fetchFailed", "Fetch failed"),
    ("karo.updating", "Updating..."),
    ("section.actionRequired", "Action Required"),
    ("section.inProgress", "In Progress"),
    ("section.completedToday", "Today's Results"),
    ("section.skillCandidates", "Skill Candidates"),
    ("section.generatedSkills", "Generated Skills"),
    ("section.waiting", "Waiting"),
    ("section.inquiries", "Inquiries"),
    ("section.loading", "Loading..."),
    ("section.toggle", "Click to expand or collapse"),
    ("empty.none", "None"),
    ("empty.cssContent", "None"),
    ("table.worker", "Worker"),
    ("table.task", "Task"),
    ("table.project", "Project"),
    ("table.status", "Status"),
    ("table.defaultStatus", "In battle"),
    ("table.clickDetail", "Click for details"),
    ("table.time", "Time"),
    ("table.result", "Result"),
    ("report.title", "Completion reports"),
    ("report.order", "Order:"),
    ("report.result", "Result:"),
    ("workers.title", "Ashigaru"),
    ("workers.busy", "Busy"),
    ("workers.idle", "Idle"),
    ("workers.unknown", "Unknown"),
    ("modal.ashigaruTitle", "Ashigaru {N} Status"),
    ("modal.loading", "Loading..."),
    ("modal.updating", "Updating..."),
    ("modal.refresh", "Refresh"),
    ("modal.close", "Close"),
    ("modal.error", "Error:"),
    ("modal.noOutput", "(No output)"),
    ("modal.fetchFailed", "Fetch failed:"),
    ("skill.badge", "Skill Candidates"),
    ("skill.badgeCount", "{N}"),
    ("skill.badgeStatus", "[Pending]"),
    ("skill.modalTitle", "Skill Candidates"),
    ("skill.empty", "No skill candidates"),
    ("skill.noDescription", "No description"),
    ("skill.unknownSource", "Unknown"),
    ("skill.pendingBadge", "🔔 Pending"),
    ("skill.source", "Source:"),
    ("skill.generality", "Generality:"),
    ("skill.approve", "Approve"),
    ("skill.reject", "Reject"),
    ("skill.approved", "Approved"),
    ("skill.rejected", "Rejected"),
    ("skill.sending", "Sending..."),
    ("skill.sendFailed", "Send failed:"),
    ("skill.rejectReason", "Reason (optional)"),
    ("skill.rejectConfirm", "Send rejection"),
    ("skill.supportedLangs", "Languages:"),
    ("skill.createdAt", "Created:"),
    ("skill.designDoc", "Design doc:"),
    ("action.deleteTitle", "Request Shogun to delete this item"),
    ("action.deleteConfirm", "Request Shogun to delete this action item?"),
    ("action.sending", "Sending..."),
    ("action.sent", "✓ Sent"),
    ("action.failed", "× Failed"),
    ("notify.toggle", "Notifications"),
    ("notify.enabled", "Notifications: on"),
    ("notify.disabled", "Notifications: off"),
    ("notify.denied", "Notification permission was not granted"),
    ("notify.unsupported", "Notifications are not supported here"),
    ("notify.actionTitle", "🚨 New action required"),
    ("notify.actionBody", "{N} items need attention"),
    ("notify.completedTitle", "✅ New results"),
    ("notify.completedBody", "{N} completed today"),
    ("lang.label", "Language"),
    ("footer.text", "Sengoku AI Orchestration"),
];
