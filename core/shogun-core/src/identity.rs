//! Canonical worker ids from free-form worker labels.
//!
//! Labels come from a hand-edited table, so the same worker can appear as
//! `ashigaru3`, `Ashigaru3 (lint)` or `足軽3`. All of them map to `ashigaru3`.
//! The digits are kept as written, so `ashigaru03` stays `ashigaru03`.

use crate::patterns::{RE_WORKER_ASCII, RE_WORKER_LOCALIZED};
use crate::types::WorkerId;

/// Resolves a worker label to its canonical id.
///
/// The ASCII form is tried first, so a label carrying both forms resolves
/// through the ASCII number.
pub fn resolve(label: &str) -> Option<WorkerId> {
    let captures = RE_WORKER_ASCII
        .captures(label)
        .or_else(|| RE_WORKER_LOCALIZED.captures(label))?;
    Some(WorkerId::from_digits(captures.get(1)?.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(label: &str) -> Option<String> {
        resolve(label).map(|id| id.as_str().to_string())
    }

    #[test]
    fn ascii_label_resolves() {
        assert_eq!(id("ashigaru3").as_deref(), Some("ashigaru3"));
        assert_eq!(id("Ashigaru12 (review)").as_deref(), Some("ashigaru12"));
        assert_eq!(id("ASHIGARU1").as_deref(), Some("ashigaru1"));
    }

    #[test]
    fn localized_label_resolves() {
        assert_eq!(id("足軽1").as_deref(), Some("ashigaru1"));
        assert_eq!(id("担当: 足軽8号").as_deref(), Some("ashigaru8"));
    }

    #[test]
    fn ascii_form_wins_over_localized() {
        assert_eq!(id("足軽2 / ashigaru5").as_deref(), Some("ashigaru5"));
    }

    #[test]
    fn unrelated_labels_do_not_resolve() {
        assert_eq!(id("家老"), None);
        assert_eq!(id("ashigaru"), None);
        assert_eq!(id("足軽"), None);
        assert_eq!(id(""), None);
        assert_eq!(id("-"), None);
    }

    #[test]
    fn digits_are_kept_verbatim() {
        assert_eq!(id("ashigaru03").as_deref(), Some("ashigaru03"));
        assert_eq!(id("足軽07").as_deref(), Some("ashigaru07"));
        assert_eq!(
            id("ashigaru99999999999").as_deref(),
            Some("ashigaru99999999999")
        );
    }

    #[test]
    fn oversized_ascii_number_still_wins() {
        assert_eq!(
            id("ashigaru99999999999 足軽2").as_deref(),
            Some("ashigaru99999999999")
        );
    }

    #[test]
    fn same_label_same_id() {
        assert_eq!(resolve("足軽4"), resolve("足軽4"));
    }
}
