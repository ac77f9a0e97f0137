//! Compiled regex patterns.
//!
//! Compiled once on first use. Worker label formats follow what the
//! orchestrator writes into dashboard.md; update them together with the
//! backend's table headers.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Worker Labels
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_WORKER_ASCII: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ashigaru(\d+)").unwrap());
pub static RE_WORKER_LOCALIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"足軽(\d+)").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Markdown Subset
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_MD_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
pub static RE_MD_TABLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s|:\-]+$").unwrap());
