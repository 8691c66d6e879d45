//! Document-level scenarios: roster text in, scored profiles out.

use brainlift_evidence::*;

fn yeager_fact(i: usize, score: u8) -> Fact {
    Fact {
        fact: format!("Claim {i} about wise feedback"),
        note: Some("Yeager et al. replicated this".to_string()),
        source: None,
        score,
    }
}

#[test]
fn listed_expert_with_fact_support() {
    let text = "Title\nDOK1: Experts\n- Expert 1\n  - Who: David Yeager, PhD;\n  - Where: @davidscottyeager\n  - Focus: wise feedback";
    let facts = vec![
        yeager_fact(1, 5),
        yeager_fact(2, 4),
        yeager_fact(3, 3),
        yeager_fact(4, 4),
    ];

    let mentions = parse_roster(text);
    let profiles = build_profiles(&mentions, &facts, text, &[], &NoOverrides);

    assert_eq!(profiles.len(), 1);
    let p = &profiles[0];
    assert_eq!(p.canonical_name, "David Yeager");
    assert_eq!(p.twitter_handle.as_deref(), Some("@davidscottyeager"));
    assert!(p.is_in_dok1_section);
    assert!(p.fact_citations >= 4);
    assert_eq!(p.score5_fact_citations, 1);

    let score = estimate_score(p, batch_max_citations(&profiles));
    // listed base 6 + full citation bonus 4 + 0.5, clamped
    assert!(score > 6);
    assert_eq!(score, 10);
}

#[test]
fn document_without_roster_yields_nothing() {
    let text = "A brainlift about phonics with no expert section at all.";
    let mentions = parse_roster(text);
    assert!(mentions.is_empty());
    assert!(build_profiles(&mentions, &[], text, &[], &NoOverrides).is_empty());
}

#[test]
fn joint_roster_entry_becomes_two_people() {
    let text = "DOK1: Experts\n- Expert 1\n  - Who: Hochman & Wexler;\n  - Focus: The Writing Revolution\n";
    let facts = vec![
        Fact {
            fact: "Sentence expansion builds syntax".to_string(),
            note: None,
            source: Some("Hochman (2017)".to_string()),
            score: 5,
        },
        Fact {
            fact: "Knowledge gaps limit comprehension".to_string(),
            note: Some("Wexler, The Knowledge Gap".to_string()),
            source: None,
            score: 4,
        },
    ];
    let profiles = build_profiles(&parse_roster(text), &facts, "", &[], &NoOverrides);

    let names: Vec<_> = profiles.iter().map(|p| p.canonical_name.as_str()).collect();
    assert_eq!(names, vec!["Hochman", "Wexler"]);
    assert!(profiles.iter().all(|p| !p.canonical_name.contains('&')));

    assert_eq!(profiles[0].fact_citations, 1);
    assert_eq!(profiles[0].score5_fact_citations, 1);
    assert_eq!(profiles[1].fact_citations, 1);
    assert_eq!(profiles[1].score5_fact_citations, 0);
}

#[test]
fn html_encoded_joint_entry_keeps_both_people() {
    let text = "DOK1: Experts\n- Expert 1\n  - Who: Judith Hochman &amp; Natalie Wexler;\n  - Focus: writing\n";
    let facts = vec![Fact {
        fact: "Example campus study".to_string(),
        note: Some("Wexler 2019".to_string()),
        source: None,
        score: 4,
    }];
    let profiles = build_profiles(&parse_roster(text), &facts, "", &[], &NoOverrides);

    let names: Vec<_> = profiles.iter().map(|p| p.canonical_name.as_str()).collect();
    assert_eq!(names, vec!["Judith Hochman", "Natalie Wexler"]);
    assert!(profiles.iter().all(|p| !p.canonical_name.contains("amp")));
    assert_eq!(profiles[1].fact_citations, 1);
}

#[test]
fn curated_overrides_replace_counts_for_known_names() {
    let text = "DOK1: Experts\n- Expert 1\n  - Who: Natalie Wexler\n- Expert 2\n  - Who: Daniel Willingham\n";
    let facts = vec![Fact {
        fact: "Willingham: memory is the residue of thought".to_string(),
        note: None,
        source: None,
        score: 5,
    }];
    let profiles = build_profiles(
        &parse_roster(text),
        &facts,
        text,
        &[],
        &StaticOverrides::curated(),
    );
    assert_eq!(profiles[0].fact_citations, 13);
    assert_eq!(count_mentions(text, "Daniel Willingham"), 1);
    assert_eq!(profiles[1].fact_citations, 1);
    assert_eq!(profiles[1].score5_fact_citations, 1);
}
