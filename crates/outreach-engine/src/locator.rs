//! Multi-strategy element resolution.
//!
//! Strategies for a control role are tried strictly in priority order; a
//! later strategy runs only when every earlier one found nothing on the
//! current page. The whole pass is read-only (only `find_all` calls are
//! issued), so a locate can be retried without side effects.

use crate::session::{LocatorQuery, PageSession};
use crate::Result;
use outreach_core::ActionRole;
use tracing::debug;

/// Which control the orchestrator wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRole {
    /// The page's primary connect control.
    Connect,
    /// The page's primary message control.
    Message,
    /// The "add a note" affordance inside the invite dialog.
    AddNote,
    /// The note/message input field.
    NoteField,
    /// The final send/confirm control.
    Send,
}

impl ControlRole {
    /// The primary control for the configured action.
    pub fn primary(role: ActionRole) -> Self {
        match role {
            ActionRole::Connect => ControlRole::Connect,
            ActionRole::Message => ControlRole::Message,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlRole::Connect => "connect",
            ControlRole::Message => "message",
            ControlRole::AddNote => "add-note",
            ControlRole::NoteField => "note-field",
            ControlRole::Send => "send",
        }
    }
}

/// One deterministic rule for finding a control.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Match by visible text within elements selected by `css`.
    ByText { css: String, needle: String },

    /// Match by attribute value within elements selected by `css`.
    ByAttribute {
        css: String,
        attribute: String,
        value: String,
    },

    /// Match purely structurally by CSS selector.
    BySelector { css: String },

    /// Composite: require a container region to exist, then match by
    /// text within it. Cuts false positives from unrelated controls
    /// elsewhere on the page that carry similar labels.
    ByRegionThenText {
        region_css: String,
        css: String,
        needle: String,
    },
}

/// A strategy plus the label it is reported under when it matches.
#[derive(Debug, Clone)]
pub struct StrategySpec {
    pub description: &'static str,
    pub strategy: Strategy,
}

impl StrategySpec {
    fn new(description: &'static str, strategy: Strategy) -> Self {
        Self {
            description,
            strategy,
        }
    }
}

/// A located control and the rule that found it, for diagnosis.
#[derive(Debug)]
pub struct LocatedControl<H> {
    pub handle: H,
    pub strategy: &'static str,
}

/// Ordered default strategies for a control role.
///
/// The selectors mirror the layouts seen in the wild: visible label
/// first, then accessibility attributes, then region-scoped sweeps of
/// decreasing precision.
pub fn strategies_for(role: ControlRole) -> Vec<StrategySpec> {
    match role {
        ControlRole::Connect => vec![
            StrategySpec::new(
                "visible connect button",
                Strategy::ByText {
                    css: "button".to_string(),
                    needle: "Connect".to_string(),
                },
            ),
            StrategySpec::new(
                "connect via aria-label",
                Strategy::ByAttribute {
                    css: "button".to_string(),
                    attribute: "aria-label".to_string(),
                    value: "Connect".to_string(),
                },
            ),
            StrategySpec::new(
                "invite via aria-label",
                Strategy::ByAttribute {
                    css: "button".to_string(),
                    attribute: "aria-label".to_string(),
                    value: "Invite".to_string(),
                },
            ),
            StrategySpec::new(
                "profile actions region",
                Strategy::ByRegionThenText {
                    region_css: ".pvs-profile-actions".to_string(),
                    css: "button".to_string(),
                    needle: "Connect".to_string(),
                },
            ),
            StrategySpec::new(
                "main content sweep",
                Strategy::ByRegionThenText {
                    region_css: "main".to_string(),
                    css: "button".to_string(),
                    needle: "Connect".to_string(),
                },
            ),
        ],
        ControlRole::Message => vec![
            StrategySpec::new(
                "visible message button",
                Strategy::ByText {
                    css: "button".to_string(),
                    needle: "Message".to_string(),
                },
            ),
            StrategySpec::new(
                "message via aria-label",
                Strategy::ByAttribute {
                    css: "button".to_string(),
                    attribute: "aria-label".to_string(),
                    value: "Message".to_string(),
                },
            ),
            StrategySpec::new(
                "main content sweep",
                Strategy::ByRegionThenText {
                    region_css: "main".to_string(),
                    css: "button".to_string(),
                    needle: "Message".to_string(),
                },
            ),
        ],
        ControlRole::AddNote => vec![
            StrategySpec::new(
                "add-note by text",
                Strategy::ByText {
                    css: "button".to_string(),
                    needle: "Add a note".to_string(),
                },
            ),
            StrategySpec::new(
                "add-note via aria-label",
                Strategy::ByAttribute {
                    css: "button".to_string(),
                    attribute: "aria-label".to_string(),
                    value: "Add a note".to_string(),
                },
            ),
        ],
        ControlRole::NoteField => vec![
            StrategySpec::new(
                "named message textarea",
                Strategy::BySelector {
                    css: "textarea[name='message']".to_string(),
                },
            ),
            StrategySpec::new(
                "dialog textarea",
                Strategy::ByRegionThenText {
                    region_css: "div[role='dialog']".to_string(),
                    css: "textarea".to_string(),
                    needle: String::new(),
                },
            ),
            StrategySpec::new(
                "editable text region",
                Strategy::BySelector {
                    css: "div[contenteditable='true']".to_string(),
                },
            ),
        ],
        ControlRole::Send => vec![
            StrategySpec::new(
                "send button by text",
                Strategy::ByText {
                    css: "button".to_string(),
                    needle: "Send".to_string(),
                },
            ),
            StrategySpec::new(
                "done button by text",
                Strategy::ByText {
                    css: "button".to_string(),
                    needle: "Done".to_string(),
                },
            ),
            StrategySpec::new(
                "send-now via aria-label",
                Strategy::ByAttribute {
                    css: "button".to_string(),
                    attribute: "aria-label".to_string(),
                    value: "Send now".to_string(),
                },
            ),
            StrategySpec::new(
                "dialog action sweep",
                Strategy::ByRegionThenText {
                    region_css: "div[role='dialog']".to_string(),
                    css: "button".to_string(),
                    needle: "Send".to_string(),
                },
            ),
        ],
    }
}

/// Locate the control for `role` using the default strategy table.
///
/// Returns `Ok(None)`, never an error, when every strategy is
/// exhausted; the caller decides how that classifies.
pub async fn locate<S: PageSession>(
    session: &S,
    role: ControlRole,
) -> Result<Option<LocatedControl<S::Handle>>> {
    locate_with(session, role.as_str(), &strategies_for(role)).await
}

/// Locate with an explicit strategy table, for callers (and tests) that
/// need something other than the defaults.
pub async fn locate_with<S: PageSession>(
    session: &S,
    role_name: &str,
    strategies: &[StrategySpec],
) -> Result<Option<LocatedControl<S::Handle>>> {
    for spec in strategies {
        match try_strategy(session, &spec.strategy).await? {
            Some(handle) => {
                debug!("Located {} control via {}", role_name, spec.description);
                return Ok(Some(LocatedControl {
                    handle,
                    strategy: spec.description,
                }));
            }
            None => {
                debug!("Strategy '{}' found nothing for {}", spec.description, role_name);
            }
        }
    }

    debug!("All strategies exhausted for {} control", role_name);
    Ok(None)
}

async fn try_strategy<S: PageSession>(
    session: &S,
    strategy: &Strategy,
) -> Result<Option<S::Handle>> {
    let query = match strategy {
        Strategy::ByText { css, needle } => LocatorQuery::TextContains {
            css: css.clone(),
            needle: needle.clone(),
        },
        Strategy::ByAttribute {
            css,
            attribute,
            value,
        } => LocatorQuery::AttributeContains {
            css: css.clone(),
            name: attribute.clone(),
            value: value.clone(),
        },
        Strategy::BySelector { css } => LocatorQuery::Css(css.clone()),
        Strategy::ByRegionThenText {
            region_css,
            css,
            needle,
        } => {
            // Sub-lookup: the region must exist before anything inside
            // it counts as a match.
            let regions = session.find_all(&LocatorQuery::Css(region_css.clone())).await?;
            if regions.is_empty() {
                return Ok(None);
            }
            LocatorQuery::TextContains {
                css: format!("{} {}", region_css, css),
                needle: needle.clone(),
            }
        }
    };

    let mut matches = session.find_all(&query).await?;
    if matches.is_empty() {
        Ok(None)
    } else {
        Ok(Some(matches.remove(0)))
    }
}
