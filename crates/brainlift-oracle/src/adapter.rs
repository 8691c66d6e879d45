//! Ranking Oracle Adapter
//!
//! Turns evidence profiles into scored experts. The oracle is consulted once
//! per run under a hard timeout; if it is disabled, fails, times out, or
//! returns nothing usable, every profile is scored by the deterministic
//! estimator instead.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use brainlift_evidence::{
    batch_max_citations, estimate_score, fallback_rationale, EvidenceProfile, ExpertSource,
    RankedExpert,
};

use crate::config::{OracleConfig, DEFAULT_TIMEOUT_SECS};
use crate::prompt::build_request;
use crate::providers::build_oracle;
use crate::response::parse_oracle_response;
use crate::{OracleError, RankingContext, RankingOracle};

/// Which path produced a ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingOrigin {
    /// Nothing to rank.
    Empty,
    Oracle { dropped: usize },
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct RankingReport {
    /// Highest score first; ties keep the order they arrived in.
    pub experts: Vec<RankedExpert>,
    pub origin: RankingOrigin,
}

pub struct RankingAdapter {
    oracle: Option<Arc<dyn RankingOracle>>,
    timeout: Duration,
}

impl RankingAdapter {
    pub fn new(oracle: Arc<dyn RankingOracle>, timeout: Duration) -> Self {
        Self {
            oracle: Some(oracle),
            timeout,
        }
    }

    /// An adapter that always uses the estimator.
    pub fn fallback_only() -> Self {
        Self {
            oracle: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            oracle: build_oracle(config),
            timeout: config.timeout,
        }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Rank `profiles`. Never fails; see [`RankingAdapter::rank_with_report`].
    pub async fn rank(
        &self,
        profiles: &[EvidenceProfile],
        context: &RankingContext,
    ) -> Vec<RankedExpert> {
        self.rank_with_report(profiles, context).await.experts
    }

    pub async fn rank_with_report(
        &self,
        profiles: &[EvidenceProfile],
        context: &RankingContext,
    ) -> RankingReport {
        if profiles.is_empty() {
            return RankingReport {
                experts: Vec::new(),
                origin: RankingOrigin::Empty,
            };
        }

        let max_citations = batch_max_citations(profiles);
        let Some(oracle) = &self.oracle else {
            return self.fallback(profiles, context, max_citations, "oracle disabled".to_string());
        };

        match self.consult(oracle.as_ref(), profiles, context, max_citations).await {
            Ok((experts, dropped)) if !experts.is_empty() => {
                if dropped > 0 {
                    tracing::warn!(
                        brainlift_id = context.brainlift_id,
                        dropped,
                        kept = experts.len(),
                        "oracle returned invalid entries"
                    );
                }
                RankingReport {
                    experts: sort_by_score(experts),
                    origin: RankingOrigin::Oracle { dropped },
                }
            }
            Ok((_, dropped)) => self.fallback(
                profiles,
                context,
                max_citations,
                format!("oracle returned no valid entries ({dropped} dropped)"),
            ),
            Err(e) => {
                tracing::warn!(
                    brainlift_id = context.brainlift_id,
                    oracle = %oracle.describe(),
                    error = %e,
                    "ranking oracle failed"
                );
                self.fallback(profiles, context, max_citations, e.to_string())
            }
        }
    }

    async fn consult(
        &self,
        oracle: &dyn RankingOracle,
        profiles: &[EvidenceProfile],
        context: &RankingContext,
        max_citations: u64,
    ) -> Result<(Vec<RankedExpert>, usize), OracleError> {
        let request = build_request(profiles, context, max_citations);
        let reply = tokio::time::timeout(self.timeout, oracle.rank(&request))
            .await
            .map_err(|_| OracleError::Timeout(self.timeout))??;

        let parsed = parse_oracle_response(&reply)?;
        let mut dropped = parsed.dropped;
        let mut seen = HashSet::new();
        let experts = parsed
            .accepted
            .into_iter()
            .filter(|entry| {
                let key = entry
                    .name
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                let first = seen.insert(key);
                if !first {
                    tracing::warn!(name = %entry.name, "dropping repeated oracle entry");
                    dropped += 1;
                }
                first
            })
            .map(|entry| {
                RankedExpert::new(
                    context.brainlift_id,
                    entry.name,
                    entry.rank_score,
                    entry.rationale,
                    entry.source,
                    entry.twitter_handle,
                )
            })
            .collect();
        Ok((experts, dropped))
    }

    fn fallback(
        &self,
        profiles: &[EvidenceProfile],
        context: &RankingContext,
        max_citations: u64,
        reason: String,
    ) -> RankingReport {
        tracing::info!(
            brainlift_id = context.brainlift_id,
            profiles = profiles.len(),
            %reason,
            "using fallback impact scores"
        );
        let experts = profiles
            .iter()
            .map(|profile| {
                let source = if profile.is_in_dok1_section {
                    ExpertSource::Listed
                } else {
                    ExpertSource::Cited
                };
                RankedExpert::new(
                    context.brainlift_id,
                    profile.canonical_name.clone(),
                    estimate_score(profile, max_citations),
                    fallback_rationale(profile),
                    source,
                    profile.twitter_handle.clone(),
                )
            })
            .collect();
        RankingReport {
            experts: sort_by_score(experts),
            origin: RankingOrigin::Fallback { reason },
        }
    }
}

fn sort_by_score(mut experts: Vec<RankedExpert>) -> Vec<RankedExpert> {
    experts.sort_by(|a, b| b.rank_score.cmp(&a.rank_score));
    experts
}
