//! Surname-based citation counting
//!
//! Prose usually cites people by surname only, so counting keys on the last
//! token of the canonical name. Common surnames over-count; full-name
//! matching would under-count far more often.

use regex::Regex;

use crate::normalize::normalize;

/// Tokens this short are too ambiguous to count ("Li", "Ng", initials).
pub const MIN_DISTINCTIVE_TOKEN_CHARS: usize = 4;

/// Lowercased last token of the normalized name, edge punctuation removed.
pub fn distinctive_token(canonical_name: &str) -> Option<String> {
    let normalized = normalize(canonical_name);
    let last = normalized.split_whitespace().last()?;
    let token = last
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Count case-insensitive whole-word occurrences of the name's distinctive
/// token in `text`.
///
/// Returns 0 when the token has three characters or fewer.
pub fn count_mentions(text: &str, canonical_name: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let Some(token) = distinctive_token(canonical_name) else {
        return 0;
    };
    if token.chars().count() < MIN_DISTINCTIVE_TOKEN_CHARS {
        return 0;
    }

    let pattern = format!(r"(?i)\b{}\b", regex::escape(&token));
    match Regex::new(&pattern) {
        Ok(re) => u32::try_from(re.find_iter(text).count()).unwrap_or(u32::MAX),
        Err(err) => {
            tracing::debug!(token = %token, error = %err, "surname pattern rejected");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whole_word_surname_hits() {
        let text = "Yeager argues... (Yeager, 2019). yeager's study; not Yeagerton.";
        assert_eq!(count_mentions(text, "David Yeager"), 3);
    }

    #[test]
    fn short_surnames_are_suppressed() {
        let text = "Lee Lee Lee";
        assert_eq!(count_mentions(text, "Harper Lee"), 0);
        assert_eq!(count_mentions("J. J.", "Rod J."), 0);
    }

    #[test]
    fn single_token_names_still_count() {
        assert_eq!(count_mentions("Wexler and Hochman; Wexler again", "Wexler"), 2);
    }

    #[test]
    fn suffixes_do_not_become_the_token() {
        assert_eq!(distinctive_token("David Yeager, PhD").as_deref(), Some("yeager"));
        assert_eq!(count_mentions("Yeager", "David Yeager, PhD"), 1);
    }

    #[test]
    fn empty_inputs_count_zero() {
        assert_eq!(count_mentions("", "David Yeager"), 0);
        assert_eq!(count_mentions("anything", ""), 0);
        assert_eq!(distinctive_token("   "), None);
    }
}
