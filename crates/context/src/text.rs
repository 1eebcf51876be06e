//! Character-level text helpers shared by every context stage.
//!
//! All lengths are counted in `char`s, never bytes, so truncation is
//! always boundary-safe.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Appended to any text cut to fit a cap. Counted inside the cap.
pub const TRUNCATION_MARKER: &str = "...";

const MARKER_CHARS: usize = 3;

// Static patterns; compilation cannot fail at runtime.
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s*").expect("static pattern"));
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-•*][ \t]*").expect("static pattern"));
static ORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]*").expect("static pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([.,;:!?])\s*").expect("static pattern"));

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` to at most `cap` characters, ending in [`TRUNCATION_MARKER`] when cut.
///
/// Returns the text and whether it was cut.
pub fn truncate_chars(text: &str, cap: usize) -> (String, bool) {
    if char_len(text) <= cap {
        return (text.to_string(), false);
    }
    if cap <= MARKER_CHARS {
        return (text.chars().take(cap).collect(), true);
    }
    let mut out: String = text.chars().take(cap - MARKER_CHARS).collect();
    out.push_str(TRUNCATION_MARKER);
    (out, true)
}

/// Make untrusted record text safe to embed in a prompt.
///
/// Trims, turns control characters into spaces and collapses whitespace
/// runs to a single space.
pub fn sanitize(text: &str) -> String {
    let printable: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize summary text so formatting noise does not read as change.
///
/// Case-folds, strips heading, bullet and ordered-list markers, collapses
/// whitespace and evens out spacing around punctuation.
pub fn normalize_for_comparison(text: &str) -> String {
    let lowered = text.to_lowercase();
    let trimmed = lowered.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let no_headings = HEADING.replace_all(trimmed, "");
    let no_bullets = BULLET.replace_all(&no_headings, "");
    let no_numbers = ORDERED.replace_all(&no_bullets, "");
    let collapsed = WHITESPACE.replace_all(&no_numbers, " ");
    let spaced = PUNCTUATION.replace_all(&collapsed, "$1 ");
    spaced.trim().to_string()
}
