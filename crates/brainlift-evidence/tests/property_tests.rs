//! Property-based tests for the evidence engine
//!
//! 1. Name normalization is idempotent
//! 2. Short surnames never count
//! 3. Overrides always win
//! 4. Evidence sides combine by max, not sum
//! 5. The fallback estimator is bounded and monotone

use brainlift_evidence::*;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Raw roster-ish names with titles, suffixes, asides and entities mixed in.
fn raw_name_strategy() -> impl Strategy<Value = String> {
    let part = prop_oneof![
        "[A-Z][a-z]{1,10}",
        Just("Dr.".to_string()),
        Just("PhD".to_string()),
        Just("Ph.D.".to_string()),
        Just("Jr.".to_string()),
        Just(",".to_string()),
        Just("&amp;".to_string()),
        Just("&amp;amp;".to_string()),
        Just("(aside)".to_string()),
        Just("((nested) x)".to_string()),
        Just("and".to_string()),
        Just("\t".to_string()),
    ];
    prop::collection::vec(part, 0..8).prop_map(|parts| parts.join(" "))
}

fn surname_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{3,10}".prop_filter("not an honorific", |s| {
        !matches!(s.to_lowercase().as_str(), "phd")
    })
}

fn profile_strategy() -> impl Strategy<Value = EvidenceProfile> {
    (any::<bool>(), 0u32..200, 0u32..200, 0u32..200, 0u32..40).prop_map(
        |(listed, facts, notes, sources, score5)| EvidenceProfile {
            canonical_name: "Generated Expert".to_string(),
            fact_citations: facts,
            note_citations: notes,
            source_citations: sources,
            is_in_dok1_section: listed,
            score5_fact_citations: score5,
            ..Default::default()
        },
    )
}

fn mention(name: &str) -> ExpertMention {
    ExpertMention {
        name: name.to_string(),
        handle: None,
        focus_description: String::new(),
    }
}

// ============================================================================
// Normalization
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn normalize_is_idempotent(raw in raw_name_strategy()) {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_arbitrary_text(raw in "\\PC{0,40}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalized_names_have_no_double_spaces(raw in raw_name_strategy()) {
        let out = normalize(&raw);
        prop_assert!(!out.contains("  "));
        prop_assert_eq!(out.trim(), out.as_str());
    }

    #[test]
    fn co_author_parts_are_trimmed_and_conjunction_free(
        a in surname_strategy(),
        b in surname_strategy(),
        sep in prop_oneof![Just(" & "), Just("&"), Just(" and "), Just(" AND ")],
    ) {
        let parts = split_co_authors(&format!("{a}{sep}{b}"));
        prop_assert_eq!(parts, vec![a, b]);
    }
}

// ============================================================================
// Citation counting
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn short_surnames_never_count(
        first in "[A-Z][a-z]{3,8}",
        last in "[A-Z][a-z]{0,2}",
        text in "[A-Za-z ]{0,200}",
    ) {
        let name = format!("{first} {last}");
        prop_assume!(normalize(&name) == name);
        let doubled = format!("{text} {last} {last} {text}");
        prop_assert_eq!(count_mentions(&doubled, &name), 0);
    }

    #[test]
    fn every_inserted_surname_is_counted(last in surname_strategy(), n in 0usize..12) {
        let name = format!("Test {last}");
        let text = vec![last.as_str(); n].join(", ");
        prop_assert_eq!(count_mentions(&text, &name), n as u32);
    }
}

// ============================================================================
// Profile building
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn override_precedence(
        fixed in 0u32..50,
        hits in 0usize..20,
        text_hits in 0usize..20,
    ) {
        let facts = vec![
            Fact { fact: "Hendrick on memory".to_string(), note: None, source: None, score: 5 };
            hits
        ];
        let reading = vec![ReadingListItem { author: "Carl Hendrick".to_string(), ..Default::default() }];
        let text = "Hendrick ".repeat(text_hits);
        let table = StaticOverrides::new([("carl hendrick", fixed)]);

        let profiles = build_profiles(&[mention("Carl Hendrick")], &facts, &text, &reading, &table);
        prop_assert_eq!(profiles.len(), 1);
        prop_assert_eq!(profiles[0].fact_citations, fixed);
        prop_assert_eq!(profiles[0].reading_list_mentions, 0);
    }

    #[test]
    fn evidence_sides_combine_by_max(
        fact_hits in 0usize..15,
        text_hits in 0usize..15,
        reading_hits in 0usize..5,
    ) {
        let facts = vec![
            Fact { fact: "Kirschner et al.".to_string(), note: None, source: None, score: 3 };
            fact_hits
        ];
        let reading = vec![
            ReadingListItem { author: "Paul A. Kirschner".to_string(), ..Default::default() };
            reading_hits
        ];
        let text = "Kirschner ".repeat(text_hits);

        let profiles = build_profiles(&[mention("Paul Kirschner")], &facts, &text, &reading, &NoOverrides);
        let expected = (fact_hits as u32).max(text_hits as u32 + reading_hits as u32);
        prop_assert_eq!(profiles[0].fact_citations, expected);
        prop_assert_eq!(profiles[0].reading_list_mentions, reading_hits as u32);
    }
}

// ============================================================================
// Estimator
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn score_is_always_in_range(profile in profile_strategy(), max in 0u64..1000) {
        let score = estimate_score(&profile, max);
        prop_assert!((1..=10).contains(&score));
    }

    #[test]
    fn more_citations_never_lower_the_score(
        profile in profile_strategy(),
        extra in 0u32..100,
        max in 1u64..1000,
    ) {
        let mut more = profile.clone();
        more.fact_citations += extra;
        prop_assert!(estimate_score(&more, max) >= estimate_score(&profile, max));
    }

    #[test]
    fn more_score5_citations_never_lower_the_score(
        profile in profile_strategy(),
        extra in 0u32..20,
        max in 1u64..1000,
    ) {
        let mut more = profile.clone();
        more.score5_fact_citations += extra;
        prop_assert!(estimate_score(&more, max) >= estimate_score(&profile, max));
    }

    #[test]
    fn roster_membership_never_lowers_the_score(profile in profile_strategy(), max in 1u64..1000) {
        let mut listed = profile.clone();
        listed.is_in_dok1_section = true;
        let mut unlisted = profile;
        unlisted.is_in_dok1_section = false;
        prop_assert!(estimate_score(&listed, max) >= estimate_score(&unlisted, max));
    }
}

#[test]
fn extreme_evidence_clamps_to_ten() {
    let profile = EvidenceProfile {
        fact_citations: u32::MAX,
        note_citations: u32::MAX,
        source_citations: u32::MAX,
        score5_fact_citations: u32::MAX,
        is_in_dok1_section: true,
        ..Default::default()
    };
    assert_eq!(estimate_score(&profile, 1), 10);
}
