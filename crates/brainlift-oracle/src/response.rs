//! Oracle response extraction and validation
//!
//! Models wrap their answer in prose, code fences, or an `{"experts": [...]}`
//! object. We take the first balanced JSON array in the text and validate it
//! entry by entry; bad entries are dropped, not fatal.

use brainlift_evidence::{ExpertSource, MAX_RANK_SCORE, MIN_RANK_SCORE};
use serde_json::Value;

use crate::OracleError;

/// A validated ranking entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleEntry {
    pub name: String,
    pub rank_score: u8,
    pub rationale: String,
    pub source: ExpertSource,
    pub twitter_handle: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRanking {
    pub accepted: Vec<OracleEntry>,
    pub dropped: usize,
}

/// Every `[`/`]` pair that opens outside a JSON string, ordered by the
/// opening offset. One pass from the first `[`; unmatched brackets are
/// ignored.
fn bracket_pairs(text: &str) -> Vec<(usize, usize)> {
    let Some(first) = text.find('[') else {
        return Vec::new();
    };
    let mut open = Vec::new();
    let mut pairs = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in text.as_bytes()[first..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => open.push(first + offset),
            b']' => {
                if let Some(start) = open.pop() {
                    pairs.push((start, first + offset));
                }
            }
            _ => {}
        }
    }
    pairs.sort_unstable_by_key(|&(start, _)| start);
    pairs
}

/// The first substring of `text` that is a well-formed JSON array.
pub fn extract_json_array(text: &str) -> Option<&str> {
    bracket_pairs(text)
        .into_iter()
        .map(|(start, end)| &text[start..=end])
        .find(|candidate| matches!(serde_json::from_str::<Value>(candidate), Ok(Value::Array(_))))
}

fn validate_entry(value: &Value) -> Result<OracleEntry, String> {
    let obj = value.as_object().ok_or("entry is not an object")?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or("missing name")?;

    let raw_score = obj
        .get("rankScore")
        .and_then(Value::as_f64)
        .ok_or("missing numeric rankScore")?;
    if raw_score.fract() != 0.0
        || raw_score < f64::from(MIN_RANK_SCORE)
        || raw_score > f64::from(MAX_RANK_SCORE)
    {
        return Err(format!("rankScore {raw_score} is not an integer in 1..=10"));
    }

    let rationale = obj
        .get("rationale")
        .and_then(Value::as_str)
        .ok_or("missing rationale")?;

    let source = obj
        .get("source")
        .and_then(Value::as_str)
        .and_then(ExpertSource::parse)
        .ok_or("source must be listed, verification, or cited")?;

    let twitter_handle = match obj.get("twitterHandle") {
        None | Some(Value::Null) => None,
        Some(Value::String(h)) => Some(h.trim().to_string()).filter(|h| !h.is_empty()),
        Some(_) => return Err("twitterHandle must be a string or null".to_string()),
    };

    Ok(OracleEntry {
        name: name.to_string(),
        rank_score: raw_score as u8,
        rationale: rationale.trim().to_string(),
        source,
        twitter_handle,
    })
}

/// Extract and validate the oracle's reply.
///
/// Errors only when no JSON array can be found at all; an array whose
/// entries are all invalid yields an empty `accepted` list.
pub fn parse_oracle_response(text: &str) -> Result<ParsedRanking, OracleError> {
    let array = extract_json_array(text)
        .ok_or_else(|| OracleError::InvalidResponse("no JSON array in oracle reply".to_string()))?;
    let items: Vec<Value> = serde_json::from_str(array)
        .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

    let mut parsed = ParsedRanking::default();
    for (index, item) in items.iter().enumerate() {
        match validate_entry(item) {
            Ok(entry) => parsed.accepted.push(entry),
            Err(reason) => {
                tracing::warn!(index, %reason, "dropping invalid oracle entry");
                parsed.dropped += 1;
            }
        }
    }
    Ok(parsed)
}
