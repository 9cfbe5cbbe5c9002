//! Plain-text excerpts of rich-markup note content.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Default excerpt length for list rows.
pub const DEFAULT_EXCERPT_CHARS: usize = 150;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>")
        .expect("valid script/style regex")
});
static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</?[A-Za-z!][^>]*>").expect("valid html tag regex"));
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(amp|lt|gt|quot|apos|nbsp|#39);").expect("valid html entity regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Derives a single-line plain-text excerpt.
///
/// Rules:
/// - `<script>`/`<style>` blocks are dropped, other tags become spaces.
/// - Common named entities are decoded.
/// - Whitespace is collapsed and trimmed.
/// - At most `max_chars` characters are kept; `...` marks truncation.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let without_blocks = SCRIPT_STYLE_RE.replace_all(content, " ");
    let without_tags = HTML_TAG_RE.replace_all(&without_blocks, " ");
    let decoded = ENTITY_RE.replace_all(&without_tags, |caps: &Captures<'_>| {
        let decoded = match &caps[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "apos" | "#39" => "'",
            _ => " ",
        };
        decoded.to_string()
    });
    let normalized = WHITESPACE_RE.replace_all(&decoded, " ");
    let trimmed = normalized.trim();

    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(max_chars).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str("...");
    truncated
}
