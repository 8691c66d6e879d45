//! Prompt rendering for the ranking oracle

use brainlift_evidence::EvidenceProfile;

use crate::{OracleRequest, RankingContext};

pub const SYSTEM_PROMPT: &str = r#"You stack-rank researchers by their measured impact on one document.

For each expert you get:
1. citation counts (facts, notes, sources)
2. whether the document lists them in its DOK1 Experts section
3. how many score-5 (fully verified) facts cite them

Assign each expert an integer rankScore from 1 to 10:
- most citations plus score-5 support: 9-10
- moderate citations: 6-8
- few citations: 4-5
- barely mentioned: 1-3

Rules:
1. Experts with different metrics must not share a score. Equal scores are only allowed for identical metrics.
2. Base each rationale on the numbers given, under 50 characters.
3. Copy Twitter handles exactly; use null when none is given.
4. source is "listed" for DOK1 section experts, "cited" for experts found in notes, "verification" for experts surfaced while verifying facts.

Reply with JSON only:
{"experts": [{"name": "Full Name", "rankScore": 10, "rationale": "15 citations, 8 score-5 facts", "source": "listed", "twitterHandle": "@handle"}]}

Sort by rankScore descending."#;

/// One line per profile. Order carries no meaning.
pub fn render_evidence_table(profiles: &[EvidenceProfile]) -> String {
    profiles
        .iter()
        .map(|p| {
            let handle = p
                .twitter_handle
                .as_deref()
                .map(|h| format!(" ({h})"))
                .unwrap_or_default();
            let roster = if p.is_in_dok1_section {
                "IN DOK1 EXPERTS SECTION"
            } else {
                "not in DOK1 section"
            };
            format!(
                "- {}{}: {} total citations ({} in facts, {} in notes, {} in sources), {} reading-list mentions, {} score-5 verified facts, {}",
                p.canonical_name,
                handle,
                p.total_citations(),
                p.fact_citations,
                p.note_citations,
                p.source_citations,
                p.reading_list_mentions,
                p.score5_fact_citations,
                roster
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_request(
    profiles: &[EvidenceProfile],
    context: &RankingContext,
    max_citations: u64,
) -> OracleRequest {
    OracleRequest {
        evidence_table: render_evidence_table(profiles),
        title: context.title.clone(),
        description: context.description.clone(),
        max_citations,
    }
}

pub fn render_user_prompt(request: &OracleRequest) -> String {
    format!(
        "Stack rank these experts by their measured impact on this brainlift.\n\n\
         **Brainlift:** {}\n\
         **Description:** {}\n\n\
         **Expert impact metrics:**\n{}\n\n\
         **Maximum citations by any expert:** {}\n\n\
         More citations means a higher score. Experts with different citation counts must not receive the same score.",
        request.title, request.description, request.evidence_table, request.max_citations
    )
}
