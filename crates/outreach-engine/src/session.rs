//! Capability contract expected from the browser-session collaborator.

use crate::Result;
use async_trait::async_trait;

/// Describes how to find elements on the current page.
///
/// Text and attribute matching are substring-based and case-insensitive,
/// which is what the heterogeneous page layouts actually require; exact
/// matching is expressed through a precise CSS selector instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorQuery {
    /// All elements matching a CSS selector.
    Css(String),

    /// Elements matching `css` whose visible text contains `needle`.
    TextContains { css: String, needle: String },

    /// Elements matching `css` whose attribute `name` contains `value`.
    AttributeContains {
        css: String,
        name: String,
        value: String,
    },
}

/// Narrow surface over one exclusively-owned browser page.
///
/// Every method either succeeds or fails with a distinguishable error;
/// none silently returns stale state. `find_all` must be read-only so
/// the locator can be retried safely.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Opaque handle to an interactive element on the current page.
    type Handle: Send + Sync;

    async fn navigate(&self, url: &str) -> Result<()>;

    async fn find_all(&self, query: &LocatorQuery) -> Result<Vec<Self::Handle>>;

    async fn click(&self, handle: &Self::Handle) -> Result<()>;

    async fn type_text(&self, handle: &Self::Handle, text: &str) -> Result<()>;

    /// Visible text of the whole page, for state-marker matching.
    async fn page_text(&self) -> Result<String>;

    /// Capture a diagnostic artifact (screenshot) under `label`.
    ///
    /// A no-op when diagnostics are disabled; never fails the run.
    async fn capture(&self, label: &str);
}
