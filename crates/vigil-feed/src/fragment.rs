//! Alert fragment payloads and fingerprint extraction.
//!
//! The alerting hub answers each fragment fetch with a JSON object
//! carrying a rendered markup string for the alert list, a total count,
//! and a server timestamp. Different backend pages spell the fields
//! differently (`html`, `rows_html`), so deserialization accepts the
//! known aliases. Optional modal/pagination sub-fragments ride along
//! and are swapped independently by the UI when present.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

/// A row identifier attribute in the rendered markup, e.g.
/// `data-fingerprint="a1b2c3"`. Scanned with a regex rather than a
/// document query so that bare row fragments (no enclosing table)
/// parse the same as full documents.
static FINGERPRINT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-fingerprint\s*=\s*["']([^"']+)["']"#).expect("fingerprint regex")
});

/// Markup tags, stripped when turning a row into display text.
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

/// One table row in the fragment markup.
static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<tr\b[^>]*>(.*?)</tr>").expect("row regex")
});

/// Server-rendered alert list fragment.
///
/// Immutable once received; each applied fragment replaces the prior
/// one entirely.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AlertFragment {
    /// Rendered alert list markup
    #[serde(alias = "html", alias = "rows_html")]
    pub markup: String,

    /// Total alert count reported by the server
    #[serde(alias = "alert_count")]
    pub count: u64,

    /// Server timestamp of the rendering
    pub timestamp: DateTime<Utc>,

    /// Optional modal markup, swapped independently when present
    #[serde(default, alias = "modals_html")]
    pub modals_markup: Option<String>,

    /// Optional pagination markup, swapped independently when present
    #[serde(default, alias = "pagination_html")]
    pub pagination_markup: Option<String>,
}

/// One alert row extracted from fragment markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRow {
    /// Opaque stable identifier, the reconciliation key
    pub fingerprint: String,
    /// Tag-stripped row text for display
    pub text: String,
}

impl AlertFragment {
    /// Extract the set of fingerprints present in the markup.
    ///
    /// Works on bare row fragments: the scan keys on the per-row
    /// identifier attribute, not on document structure.
    pub fn fingerprints(&self) -> HashSet<String> {
        FINGERPRINT_ATTR
            .captures_iter(&self.markup)
            .map(|cap| cap[1].to_string())
            .collect()
    }

    /// Extract display rows in markup order.
    ///
    /// Rows without a fingerprint attribute (spacer/expansion rows)
    /// are skipped.
    pub fn rows(&self) -> Vec<AlertRow> {
        ROW.captures_iter(&self.markup)
            .filter_map(|row| {
                let full = row.get(0)?.as_str();
                let fingerprint = FINGERPRINT_ATTR.captures(full)?[1].to_string();
                let inner = row.get(1)?.as_str();
                Some(AlertRow {
                    fingerprint,
                    text: strip_tags(inner),
                })
            })
            .collect()
    }
}

/// Collapse markup into a single line of display text.
fn strip_tags(markup: &str) -> String {
    let text = TAG.replace_all(markup, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
