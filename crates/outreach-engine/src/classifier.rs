//! Outcome classification under uncertainty.
//!
//! Ties and ambiguity always resolve to `Failed`: a false negative costs
//! a retry later, a false positive corrupts the ledger and the trust put
//! in it.

use outreach_core::OutcomeKind;

/// Page-text markers used to disambiguate outcomes.
///
/// Marker matching against a changing external site is the most
/// drift-prone part of the system, so the sets are data rather than
/// code: these defaults match the layouts seen today, and runs can
/// extend them from configuration.
#[derive(Debug, Clone)]
pub struct StateMarkers {
    /// The relationship already exists or awaits approval. Lowercase.
    pub already_done: Vec<String>,
    /// The action visibly took effect. Lowercase.
    pub confirmation: Vec<String>,
}

impl Default for StateMarkers {
    fn default() -> Self {
        Self {
            already_done: vec![
                "pending".to_string(),
                "invitation sent".to_string(),
                "already connected".to_string(),
                "1st degree".to_string(),
            ],
            confirmation: vec![
                "invitation sent".to_string(),
                "request sent".to_string(),
                "your invitation".to_string(),
                "message sent".to_string(),
            ],
        }
    }
}

impl StateMarkers {
    /// Defaults plus extra markers supplied at configuration time.
    pub fn with_extra(already_done: &[String], confirmation: &[String]) -> Self {
        let mut markers = Self::default();
        markers
            .already_done
            .extend(already_done.iter().map(|m| m.to_lowercase()));
        markers
            .confirmation
            .extend(confirmation.iter().map(|m| m.to_lowercase()));
        markers
    }

    pub fn matches_already_done(&self, page_text: &str) -> bool {
        let lower = page_text.to_lowercase();
        self.already_done.iter().any(|marker| lower.contains(marker))
    }

    pub fn matches_confirmation(&self, page_text: &str) -> bool {
        let lower = page_text.to_lowercase();
        self.confirmation.iter().any(|marker| lower.contains(marker))
    }
}

/// Classify one attempt. Evaluated strictly in order:
///
/// 1. nothing located + already-done marker on the page -> `AlreadyDone`
/// 2. nothing located otherwise -> `Failed` ("control not located")
/// 3. action performed + confirmation marker -> `Succeeded`
/// 4. action performed, no confirmation within the bounded wait -> `Failed`
///
/// `located` carries the description of the strategy that matched, which
/// flows into the diagnostic so ledger rows stay explainable.
pub fn classify(
    markers: &StateMarkers,
    located: Option<&str>,
    performed: bool,
    page_before: &str,
    page_after: &str,
) -> (OutcomeKind, Option<String>) {
    let Some(strategy) = located else {
        if markers.matches_already_done(page_before) {
            return (
                OutcomeKind::AlreadyDone,
                Some("page shows existing relationship state".to_string()),
            );
        }
        return (OutcomeKind::Failed, Some("control not located".to_string()));
    };

    if performed && markers.matches_confirmation(page_after) {
        return (
            OutcomeKind::Succeeded,
            Some(format!("located via {}", strategy)),
        );
    }

    if performed {
        return (
            OutcomeKind::Failed,
            Some("no confirmation observed".to_string()),
        );
    }

    // Located but never acted on: an action-step error already produced
    // its own record upstream; reaching here still must not claim success.
    (OutcomeKind::Failed, Some("action not performed".to_string()))
}
