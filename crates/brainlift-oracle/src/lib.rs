//! Brainlift Oracle: delegated expert ranking with a guaranteed fallback
//!
//! The final 1-10 scores come from an external generative model (the
//! "ranking oracle"). This crate prepares the numeric evidence it sees,
//! validates what comes back, and substitutes the deterministic estimator
//! from `brainlift-evidence` whenever the oracle is missing, slow, or wrong.
//!
//! ```text
//!  EvidenceProfiles ──► evidence table ──► RankingOracle ──► JSON text
//!         │                                (timeout-bounded)     │
//!         │                                                      ▼
//!         │                                          extract + validate entries
//!         │                                                      │
//!         │                        ≥1 valid entry ◄──────────────┤
//!         │                                                      │ none / error / timeout
//!         └──────────────► estimate_score per profile ◄──────────┘
//!                                      │
//!                         stable sort by score, follow if > 5
//! ```
//!
//! The adapter never returns an error: oracle trouble degrades to the
//! fallback, and an empty profile list yields an empty ranking without
//! contacting the oracle.

pub mod adapter;
pub mod config;
pub mod prompt;
pub mod providers;
pub mod response;
pub mod sync;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use adapter::{RankingAdapter, RankingOrigin, RankingReport};
pub use config::{BackendChoice, ConfigError, ConfigOverrides, OracleBackend, OracleConfig};
pub use providers::{build_oracle, ScriptedOracle, ScriptedReply};
pub use response::{extract_json_array, parse_oracle_response, OracleEntry, ParsedRanking};
pub use sync::{RefreshCoordinator, RefreshOutcome};

// ============================================================================
// Oracle Interface
// ============================================================================

/// Document context shown to the oracle next to the evidence table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingContext {
    pub brainlift_id: i64,
    pub title: String,
    pub description: String,
}

/// What one oracle call receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    /// One line per expert with raw counts.
    pub evidence_table: String,
    pub title: String,
    pub description: String,
    /// Highest total citation count in the batch.
    pub max_citations: u64,
}

impl OracleRequest {
    pub fn user_prompt(&self) -> String {
        prompt::render_user_prompt(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("ranking oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle http error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
    #[error("oracle timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// An external ranking collaborator. Returns the model's raw text; parsing
/// and validation belong to the adapter.
#[async_trait]
pub trait RankingOracle: Send + Sync {
    async fn rank(&self, request: &OracleRequest) -> Result<String, OracleError>;

    /// Short label for logs ("openrouter:anthropic/claude-sonnet-4").
    fn describe(&self) -> String;
}
