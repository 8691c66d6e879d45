//! Document roster parsing
//!
//! Brainlift documents introduce their experts under a fixed label followed
//! by enumerated bullets:
//!
//! ```text
//! DOK1: Experts
//! - Expert 1
//!   - Who: David Yeager, PhD;
//!   - Focus: wise feedback
//!   - Why Follow: ...
//!   - Where: X: @davidscottyeager
//! - Expert 2
//!   ...
//! ```
//!
//! Only the bounded window after the label is scanned.

use regex::Regex;
use std::sync::OnceLock;

use crate::ExpertMention;

/// Label that opens the roster section.
pub const ROSTER_MARKER: &str = "DOK1: Experts";

/// Characters scanned after the marker (marker included).
pub const ROSTER_WINDOW_CHARS: usize = 5000;

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)-\s*expert\s+\d+").unwrap())
}

fn who_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)-\s*who:[ \t]*((?:&amp;|[^;\n])+)").unwrap())
}

fn where_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)-\s*where:[ \t]*(.+)").unwrap())
}

fn focus_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)-\s*focus:[ \t]*(.+)").unwrap())
}

fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@[A-Za-z0-9_]+").unwrap())
}

/// Byte offset `max_chars` characters past `start`, clamped to the text end.
fn window_end(text: &str, start: usize, max_chars: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(max_chars)
        .map(|(offset, _)| start + offset)
        .unwrap_or(text.len())
}

/// Extract the roster bullets from a document.
///
/// Returns an empty list when the marker is absent. Blocks without a
/// non-empty `Who` field are skipped; `Where` contributes its first `@handle`
/// and `Focus` defaults to an empty description.
pub fn parse_roster(document_text: &str) -> Vec<ExpertMention> {
    let Some(start) = document_text.find(ROSTER_MARKER) else {
        return Vec::new();
    };
    let end = window_end(document_text, start, ROSTER_WINDOW_CHARS);
    let section = &document_text[start..end];

    // The first chunk is the marker line and any preamble before bullet 1.
    bullet_re()
        .split(section)
        .skip(1)
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<ExpertMention> {
    let who = who_re().captures(block)?.get(1)?.as_str().trim();
    let who = who
        .strip_suffix(';')
        .or_else(|| who.strip_suffix('.'))
        .unwrap_or(who)
        .trim();
    if who.is_empty() {
        return None;
    }

    let handle = where_re()
        .captures(block)
        .and_then(|caps| caps.get(1))
        .and_then(|field| handle_re().find(field.as_str()))
        .map(|m| m.as_str().to_string());

    let focus_description = focus_re()
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Some(ExpertMention {
        name: who.to_string(),
        handle,
        focus_description,
    })
}
