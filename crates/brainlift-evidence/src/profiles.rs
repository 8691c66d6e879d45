//! Evidence profile construction
//!
//! Seeds one profile per canonical individual from the roster, then gathers
//! each profile's evidence independently against shared, read-only inputs.
//! Gathering is a pure `seed -> profile` map, so it runs in parallel.

use rayon::prelude::*;
use std::collections::HashMap;

use crate::citations::{count_mentions, distinctive_token};
use crate::normalize::{normalize, split_co_authors};
use crate::overrides::CitationOverrides;
use crate::{EvidenceProfile, ExpertMention, Fact, ReadingListItem, MAX_FACT_SCORE};

/// Lowercased evidence pools, computed once per run.
struct Corpus<'a> {
    /// (statement + note + source, is score-5)
    facts: Vec<(String, bool)>,
    authors: Vec<String>,
    original_text: &'a str,
}

impl<'a> Corpus<'a> {
    fn new(facts: &[Fact], original_text: &'a str, reading_list: &[ReadingListItem]) -> Self {
        Self {
            facts: facts
                .iter()
                .map(|f| (f.evidence_text().to_lowercase(), f.score == MAX_FACT_SCORE))
                .collect(),
            authors: reading_list.iter().map(|r| r.author.to_lowercase()).collect(),
            original_text,
        }
    }
}

/// One profile per canonical name, in first-seen roster order.
///
/// Co-authored bullets are split so each person gets a profile carrying the
/// bullet's handle and focus. A repeated name keeps its first entry and only
/// fills in a handle or description the first entry lacked.
fn seed_profiles(mentions: &[ExpertMention]) -> Vec<EvidenceProfile> {
    let mut arena: Vec<EvidenceProfile> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mention in mentions {
        let canonical = normalize(&mention.name);
        for name in split_co_authors(&canonical) {
            let key = name.to_lowercase();
            match index.get(&key) {
                Some(&slot) => {
                    let existing = &mut arena[slot];
                    if existing.twitter_handle.is_none() {
                        existing.twitter_handle = mention.handle.clone();
                    }
                    if existing.description.is_empty() {
                        existing.description = mention.focus_description.clone();
                    }
                }
                None => {
                    index.insert(key, arena.len());
                    arena.push(EvidenceProfile::listed(
                        &name,
                        mention.handle.clone(),
                        &mention.focus_description,
                    ));
                }
            }
        }
    }

    arena
}

fn gather_evidence(
    seed: EvidenceProfile,
    corpus: &Corpus<'_>,
    overrides: &dyn CitationOverrides,
) -> EvidenceProfile {
    let mut profile = seed;

    if let Some(fixed) = overrides.lookup(&profile.key()) {
        profile.fact_citations = fixed;
        profile.reading_list_mentions = 0;
        tracing::debug!(
            expert = %profile.canonical_name,
            fact_citations = fixed,
            "citation override applied"
        );
        return profile;
    }

    let Some(last_name) = distinctive_token(&profile.canonical_name) else {
        return profile;
    };

    let mut fact_mentions: u32 = 0;
    let mut score5: u32 = 0;
    for (text, is_top) in &corpus.facts {
        if text.contains(&last_name) {
            fact_mentions += 1;
            if *is_top {
                score5 += 1;
            }
        }
    }

    let reading_list_mentions = corpus
        .authors
        .iter()
        .filter(|author| author.contains(&last_name))
        .count() as u32;
    let content_mentions = count_mentions(corpus.original_text, &profile.canonical_name);

    // Both sides estimate the same signal; take the stronger one.
    profile.fact_citations = fact_mentions.max(content_mentions.saturating_add(reading_list_mentions));
    profile.reading_list_mentions = reading_list_mentions;
    profile.score5_fact_citations = score5;

    tracing::debug!(
        expert = %profile.canonical_name,
        fact_mentions,
        content_mentions,
        reading_list_mentions,
        score5,
        "evidence gathered"
    );
    profile
}

/// Build one evidence profile per canonical individual named in `mentions`.
///
/// A name found in `overrides` takes the fixed count, zero reading-list
/// mentions, and no further counting. Every other profile gets:
/// - facts whose statement, note, or source contain the surname (and how many
///   of those are score-5),
/// - reading-list items whose author contains the surname,
/// - `fact_citations = max(fact hits, text mentions + reading-list hits)`.
pub fn build_profiles(
    mentions: &[ExpertMention],
    facts: &[Fact],
    original_text: &str,
    reading_list: &[ReadingListItem],
    overrides: &dyn CitationOverrides,
) -> Vec<EvidenceProfile> {
    let seeds = seed_profiles(mentions);
    if seeds.is_empty() {
        return seeds;
    }

    let corpus = Corpus::new(facts, original_text, reading_list);
    seeds
        .into_par_iter()
        .map(|seed| gather_evidence(seed, &corpus, overrides))
        .collect()
}
