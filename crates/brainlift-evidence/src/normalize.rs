//! Expert name canonicalization
//!
//! Roster entries arrive as free text ("Dr. Judith C. Hochman",
//! "David Yeager, PhD", "Hochman &amp; Wexler (authors)"). Everything
//! downstream keys on the cleaned form produced here.

use regex::Regex;
use std::sync::OnceLock;

fn suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i),?\s*\b(?:ph\.?d|dr|m\.d|ed\.d|jr|sr)\b\.?,?").unwrap()
    })
}

fn parenthetical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\([^)]*\)").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn co_author_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*&\s*|\s+and\s+").unwrap())
}

/// One cleanup pass. `normalize` iterates this to a fixpoint.
fn clean_once(raw: &str) -> String {
    let decoded = raw.replace("&amp;", "&");
    let without_parens = parenthetical_re().replace_all(&decoded, "");
    let without_suffixes = suffix_re().replace_all(&without_parens, "");
    whitespace_re()
        .replace_all(&without_suffixes, " ")
        .trim()
        .to_string()
}

/// Canonicalize a raw expert name.
///
/// Strips academic and honorific suffixes (PhD, Ph.D., Dr., M.D., Ed.D.,
/// Jr., Sr.), parenthetical asides, decodes `&amp;`, collapses whitespace and
/// trims. Total: unknown input passes through after cleanup.
///
/// Each pass only shortens the string or rewrites whitespace, so iterating to
/// a fixpoint terminates and makes the result idempotent.
pub fn normalize(raw: &str) -> String {
    let mut current = clean_once(raw);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Split a jointly named entry ("Hochman & Wexler", "Kirschner and Hendrick")
/// into individual names.
///
/// Names without a conjunction come back as a single element. Empty parts are
/// dropped, so a bare "&" yields nothing.
pub fn split_co_authors(name: &str) -> Vec<String> {
    let decoded = name.replace("&amp;", "&");
    let cleaned = whitespace_re().replace_all(&decoded, " ");
    let cleaned = cleaned.trim();
    if !co_author_re().is_match(cleaned) {
        return if cleaned.is_empty() {
            vec![]
        } else {
            vec![cleaned.to_string()]
        };
    }

    co_author_re()
        .split(cleaned)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
