//! Refresh pipeline with per-brainlift serialization
//!
//! A refresh runs roster parse → profile build → rank → replace for one
//! document. Refreshes of the same brainlift queue behind an async mutex so
//! their delete-then-insert steps never interleave; different brainlifts
//! proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;

use brainlift_evidence::{build_profiles, parse_roster, BrainliftDocument, CitationOverrides, EvidenceProfile};
use brainlift_storage::{ExpertStore, StoredExpert};

use crate::adapter::{RankingAdapter, RankingOrigin};
use crate::RankingContext;

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub brainlift_id: i64,
    pub profiles: Vec<EvidenceProfile>,
    pub origin: RankingOrigin,
    /// The new expert set as stored, highest score first.
    pub stored: Vec<StoredExpert>,
}

pub struct RefreshCoordinator {
    store: Arc<dyn ExpertStore>,
    adapter: RankingAdapter,
    overrides: Arc<dyn CitationOverrides>,
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn ExpertStore>,
        adapter: RankingAdapter,
        overrides: Arc<dyn CitationOverrides>,
    ) -> Self {
        Self {
            store,
            adapter,
            overrides,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ExpertStore> {
        &self.store
    }

    fn lease(&self, brainlift_id: i64) -> RefreshLease<'_> {
        let lock = self.locks.lock().entry(brainlift_id).or_default().clone();
        RefreshLease {
            coordinator: self,
            brainlift_id,
            lock,
        }
    }

    /// Recompute and persist the expert set of `document`.
    ///
    /// Dropping the returned future while it waits or runs still releases
    /// the brainlift's slot.
    pub async fn refresh(&self, document: &BrainliftDocument) -> Result<RefreshOutcome> {
        let lease = self.lease(document.id);
        let _guard = lease.lock.lock().await;
        self.refresh_locked(document).await
    }

    async fn refresh_locked(&self, document: &BrainliftDocument) -> Result<RefreshOutcome> {
        let mentions = parse_roster(&document.original_content);
        let mention_count = mentions.len();
        let overrides = Arc::clone(&self.overrides);
        let facts = document.facts.clone();
        let text = document.original_content.clone();
        let reading_list = document.reading_list.clone();
        let profiles = tokio::task::spawn_blocking(move || {
            build_profiles(&mentions, &facts, &text, &reading_list, overrides.as_ref())
        })
        .await
        .context("profile build task panicked")?;
        tracing::debug!(
            brainlift_id = document.id,
            mentions = mention_count,
            profiles = profiles.len(),
            "evidence gathered"
        );

        let context = RankingContext {
            brainlift_id: document.id,
            title: document.title.clone(),
            description: document.description.clone(),
        };
        let report = self.adapter.rank_with_report(&profiles, &context).await;

        let store = Arc::clone(&self.store);
        let brainlift_id = document.id;
        let experts = report.experts;
        let stored = tokio::task::spawn_blocking(move || store.replace_experts(brainlift_id, experts))
            .await
            .context("expert store task panicked")?
            .with_context(|| format!("failed to store experts for brainlift {brainlift_id}"))?;

        tracing::info!(
            brainlift_id,
            experts = stored.len(),
            origin = ?report.origin,
            "brainlift experts refreshed"
        );

        Ok(RefreshOutcome {
            brainlift_id,
            profiles,
            origin: report.origin,
            stored,
        })
    }

    /// Brainlifts with a refresh currently queued or running.
    pub fn active_refreshes(&self) -> usize {
        self.locks.lock().len()
    }
}

/// A refresh's claim on its brainlift's mutex. The map entry goes away when
/// the last lease for that brainlift drops.
struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    brainlift_id: i64,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.coordinator.locks.lock();
        // The map's handle plus this lease's.
        if locks
            .get(&self.brainlift_id)
            .is_some_and(|held| Arc::strong_count(held) == 2)
        {
            locks.remove(&self.brainlift_id);
        }
    }
}
