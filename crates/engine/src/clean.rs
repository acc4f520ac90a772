//! Source text normalization.

use std::sync::LazyLock;

use regex::Regex;

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("hardcoded regex"));
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("hardcoded regex"));

/// Collapse runs of blank lines and horizontal whitespace.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let collapsed = BLANK_RUNS.replace_all(text, "\n\n");
    SPACE_RUNS.replace_all(&collapsed, " ").trim().to_owned()
}

/// Merge the cleaned source texts into one labeled context string.
pub fn build_source_context(ppt_text: &str, website_text: &str) -> String {
    format!("SOURCE: PRESENTATION\n{ppt_text}\n\nSOURCE: WEBSITE\n{website_text}")
        .trim()
        .to_owned()
}
