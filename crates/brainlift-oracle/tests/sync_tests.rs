//! Refresh pipeline against the in-memory ledger.

use std::sync::Arc;
use std::time::Duration;

use brainlift_evidence::{BrainliftDocument, Fact, NoOverrides, StaticOverrides};
use brainlift_oracle::{
    RankingAdapter, RankingOrigin, RefreshCoordinator, ScriptedOracle, ScriptedReply,
};
use brainlift_storage::{ExpertLedger, ExpertStore};

fn document(id: i64) -> BrainliftDocument {
    BrainliftDocument {
        id,
        title: "Explicit instruction".to_string(),
        description: "Teaching writing through sentences".to_string(),
        original_content: "Intro\nDOK1: Experts\n\
            - Expert 1\n  - Who: Judith C. Hochman;\n  - Where: X: @TWRwriting\n  - Focus: sentence-level writing\n\
            - Expert 2\n  - Who: Paul Kirschner, Ed.D.\n  - Focus: cognitive load\n"
            .to_string(),
        facts: vec![
            Fact {
                fact: "Minimal guidance underperforms".to_string(),
                note: Some("Kirschner, Sweller & Clark 2006".to_string()),
                source: None,
                score: 5,
            },
            Fact {
                fact: "Sentence expansion improves writing".to_string(),
                note: None,
                source: Some("Hochman".to_string()),
                score: 4,
            },
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn refresh_persists_ranked_experts() {
    let store = Arc::new(ExpertLedger::in_memory());
    let coordinator = RefreshCoordinator::new(
        store.clone(),
        RankingAdapter::fallback_only(),
        Arc::new(NoOverrides),
    );

    let outcome = coordinator.refresh(&document(3)).await.unwrap();

    assert!(matches!(outcome.origin, RankingOrigin::Fallback { .. }));
    assert_eq!(outcome.profiles.len(), 2);
    assert_eq!(outcome.stored.len(), 2);
    let stored = store.experts_for(3).unwrap();
    assert_eq!(stored, outcome.stored);
    assert!(stored[0].expert.rank_score >= stored[1].expert.rank_score);
    let hochman = stored
        .iter()
        .find(|s| s.expert.name == "Judith C. Hochman")
        .unwrap();
    assert_eq!(hochman.expert.twitter_handle.as_deref(), Some("@TWRwriting"));
    assert_eq!(coordinator.active_refreshes(), 0);
}

#[tokio::test]
async fn refresh_replaces_the_previous_set() {
    let store = Arc::new(ExpertLedger::in_memory());
    let coordinator = RefreshCoordinator::new(
        store.clone(),
        RankingAdapter::fallback_only(),
        Arc::new(StaticOverrides::curated()),
    );

    let first = coordinator.refresh(&document(8)).await.unwrap();
    let second = coordinator.refresh(&document(8)).await.unwrap();

    assert_eq!(store.experts_for(8).unwrap().len(), 2);
    assert!(second.stored.iter().all(|s| first.stored.iter().all(|f| f.id != s.id)));
    let hochman = second
        .profiles
        .iter()
        .find(|p| p.canonical_name == "Judith C. Hochman")
        .unwrap();
    assert_eq!(hochman.fact_citations, 7);
}

#[tokio::test]
async fn document_without_roster_clears_its_experts() {
    let store = Arc::new(ExpertLedger::in_memory());
    let oracle = Arc::new(ScriptedOracle::text("[]"));
    let coordinator = RefreshCoordinator::new(
        store.clone(),
        RankingAdapter::new(oracle.clone(), Duration::from_secs(1)),
        Arc::new(NoOverrides),
    );
    coordinator.refresh(&document(4)).await.unwrap();

    let mut empty = document(4);
    empty.original_content = "No experts listed here.".to_string();
    let outcome = coordinator.refresh(&empty).await.unwrap();

    assert_eq!(outcome.origin, RankingOrigin::Empty);
    assert!(store.experts_for(4).unwrap().is_empty());
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn concurrent_refreshes_of_one_document_are_serialized() {
    let reply = r#"[{"name": "Paul Kirschner", "rankScore": 8, "rationale": "r", "source": "listed"},
                    {"name": "Judith C. Hochman", "rankScore": 7, "rationale": "r", "source": "listed"}]"#;
    let oracle = Arc::new(ScriptedOracle::new(vec![ScriptedReply::Delay(
        Duration::from_millis(30),
        reply.to_string(),
    )]));
    let store = Arc::new(ExpertLedger::in_memory());
    let coordinator = RefreshCoordinator::new(
        store.clone(),
        RankingAdapter::new(oracle.clone(), Duration::from_secs(5)),
        Arc::new(NoOverrides),
    );

    let doc = document(11);
    let (a, b) = tokio::join!(coordinator.refresh(&doc), coordinator.refresh(&doc));
    a.unwrap();
    b.unwrap();

    assert_eq!(oracle.calls(), 2);
    assert_eq!(oracle.max_concurrent_calls(), 1);
    assert_eq!(store.experts_for(11).unwrap().len(), 2);
    assert_eq!(coordinator.active_refreshes(), 0);
}

#[tokio::test]
async fn different_documents_refresh_in_parallel() {
    let oracle = Arc::new(ScriptedOracle::new(vec![ScriptedReply::Delay(
        Duration::from_millis(30),
        r#"[{"name": "Paul Kirschner", "rankScore": 8, "rationale": "r", "source": "listed"}]"#
            .to_string(),
    )]));
    let store = Arc::new(ExpertLedger::in_memory());
    let coordinator = RefreshCoordinator::new(
        store.clone(),
        RankingAdapter::new(oracle.clone(), Duration::from_secs(5)),
        Arc::new(NoOverrides),
    );

    let (one, two) = (document(21), document(22));
    let (a, b) = tokio::join!(coordinator.refresh(&one), coordinator.refresh(&two));
    a.unwrap();
    b.unwrap();

    assert_eq!(oracle.max_concurrent_calls(), 2);
    assert_eq!(store.experts_for(21).unwrap().len(), 1);
    assert_eq!(store.experts_for(22).unwrap().len(), 1);
}

#[tokio::test]
async fn abandoned_refresh_releases_its_slot() {
    let reply = r#"[{"name": "Paul Kirschner", "rankScore": 8, "rationale": "r", "source": "listed"}]"#;
    let oracle = Arc::new(ScriptedOracle::new(vec![ScriptedReply::Delay(
        Duration::from_millis(100),
        reply.to_string(),
    )]));
    let store = Arc::new(ExpertLedger::in_memory());
    let coordinator = RefreshCoordinator::new(
        store.clone(),
        RankingAdapter::new(oracle.clone(), Duration::from_secs(5)),
        Arc::new(NoOverrides),
    );

    // The second refresh queues behind the first, takes the lock, and is
    // dropped while its oracle call is still pending.
    let doc = document(31);
    let abandoned = tokio::time::timeout(Duration::from_millis(150), coordinator.refresh(&doc));
    let (first, second) = tokio::join!(coordinator.refresh(&doc), abandoned);
    first.unwrap();
    assert!(second.is_err());
    assert_eq!(coordinator.active_refreshes(), 0);

    coordinator.refresh(&doc).await.unwrap();
    assert_eq!(coordinator.active_refreshes(), 0);
    assert_eq!(store.experts_for(31).unwrap().len(), 1);
}
