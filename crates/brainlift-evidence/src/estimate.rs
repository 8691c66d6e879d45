//! Deterministic impact score
//!
//! Used whenever the ranking oracle is unavailable or returns nothing usable.
//!
//! ```text
//! base   = 6 if listed in the roster, else 3
//! weight = total citations / max(batch max citations, 1)
//! raw    = base + min(weight * 4, 4) + 0.5 * score-5 citations
//! score  = clamp(round(raw), 1, 10)
//! ```

use crate::{EvidenceProfile, MAX_RANK_SCORE, MIN_RANK_SCORE};

const LISTED_BASE: f64 = 6.0;
const CITED_BASE: f64 = 3.0;
const MAX_CITATION_BONUS: f64 = 4.0;
const SCORE5_WEIGHT: f64 = 0.5;

/// Highest total citation count in the batch, never below 1.
pub fn batch_max_citations(profiles: &[EvidenceProfile]) -> u64 {
    profiles
        .iter()
        .map(EvidenceProfile::total_citations)
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Fallback 1-10 score for one profile against its batch maximum.
///
/// Monotone in each input: more citations, more score-5 citations, or roster
/// membership never lowers the result.
pub fn estimate_score(profile: &EvidenceProfile, max_citations_in_batch: u64) -> u8 {
    let base = if profile.is_in_dok1_section {
        LISTED_BASE
    } else {
        CITED_BASE
    };
    let weight = profile.total_citations() as f64 / max_citations_in_batch.max(1) as f64;
    let citation_bonus = (weight * MAX_CITATION_BONUS).min(MAX_CITATION_BONUS);
    let score5_bonus = f64::from(profile.score5_fact_citations) * SCORE5_WEIGHT;

    let raw = (base + citation_bonus + score5_bonus).round();
    raw.clamp(f64::from(MIN_RANK_SCORE), f64::from(MAX_RANK_SCORE)) as u8
}

/// Short rationale quoting the raw counts behind a fallback score.
pub fn fallback_rationale(profile: &EvidenceProfile) -> String {
    let mut rationale = format!(
        "{} citations, {} score-5 facts",
        profile.total_citations(),
        profile.score5_fact_citations
    );
    if profile.is_in_dok1_section {
        rationale.push_str(", listed");
    }
    rationale
}
