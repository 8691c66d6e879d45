//! Brainlift Expert Ledger
//!
//! Stores the ranked expert set of each brainlift:
//!
//! ```text
//! ┌──────────────┐  replace_experts   ┌──────────────────────────┐
//! │   refresh    │───────────────────►│       ExpertLedger       │
//! │ (rank run)   │  delete + insert   │                          │
//! └──────────────┘                    │  brainlift 1: [e1, e2]   │──► ledger.json
//!                                     │  brainlift 2: [e3]       │    (atomic rewrite)
//! ┌──────────────┐  set_following     │                          │
//! │  user edits  │───────────────────►│                          │
//! └──────────────┘  delete_expert     └──────────────────────────┘
//!                                                  │
//!                              followed_experts ◄──┘ (tweet / web search)
//! ```
//!
//! A refresh replaces the whole set for its brainlift. Follow flags the user
//! toggled on the previous set are not carried over.
//!
//! The ledger does not serialize refreshes of the same brainlift; callers
//! must (see `RefreshCoordinator` in brainlift-oracle).

pub mod persistence;


use brainlift_evidence::RankedExpert;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use persistence::LedgerSnapshot;

// ============================================================================
// Core Types
// ============================================================================

/// Ledger-assigned expert identifier.
pub type ExpertId = u64;

/// A persisted expert row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredExpert {
    pub id: ExpertId,
    #[serde(flatten)]
    pub expert: RankedExpert,
}

/// Name and bare handle, in priority order, for downstream search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizedExpert {
    pub name: String,
    /// Handle without the leading `@`.
    pub handle: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("expert {0} not found")]
    ExpertNotFound(ExpertId),
    #[error("ledger io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger at {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================================
// Store interface
// ============================================================================

/// Persistence for ranked experts, owned per brainlift.
pub trait ExpertStore: Send + Sync {
    /// All experts of a brainlift, highest score first.
    fn experts_for(&self, brainlift_id: i64) -> StorageResult<Vec<StoredExpert>>;

    /// Delete the brainlift's current set and insert `experts` in order.
    fn replace_experts(
        &self,
        brainlift_id: i64,
        experts: Vec<RankedExpert>,
    ) -> StorageResult<Vec<StoredExpert>>;

    fn set_following(&self, expert_id: ExpertId, following: bool) -> StorageResult<StoredExpert>;

    /// Followed experts of a brainlift, highest score first.
    fn followed_experts(&self, brainlift_id: i64) -> StorageResult<Vec<StoredExpert>>;

    fn delete_expert(&self, expert_id: ExpertId) -> StorageResult<()>;

    /// Cascade delete for a removed brainlift. Returns the number of rows removed.
    fn delete_brainlift(&self, brainlift_id: i64) -> StorageResult<usize>;

    /// Followed experts as name/handle pairs, in rank order.
    fn prioritized_experts(&self, brainlift_id: i64) -> StorageResult<Vec<PrioritizedExpert>> {
        Ok(self
            .followed_experts(brainlift_id)?
            .into_iter()
            .map(|stored| PrioritizedExpert {
                handle: stored
                    .expert
                    .twitter_handle
                    .as_deref()
                    .map(|h| h.trim_start_matches('@').to_string())
                    .filter(|h| !h.is_empty()),
                name: stored.expert.name,
            })
            .collect())
    }
}

// ============================================================================
// Expert Ledger
// ============================================================================

/// In-memory ledger, optionally mirrored to a JSON file after every write.
pub struct ExpertLedger {
    path: Option<PathBuf>,
    state: RwLock<LedgerSnapshot>,
}

impl ExpertLedger {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(LedgerSnapshot::default()),
        }
    }

    /// Open a file-backed ledger, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let snapshot = persistence::load_snapshot(&path)?;
        tracing::debug!(
            path = %path.display(),
            experts = snapshot.experts.len(),
            "expert ledger opened"
        );
        Ok(Self {
            path: Some(path),
            state: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, snapshot: &LedgerSnapshot) -> StorageResult<()> {
        match &self.path {
            Some(path) => persistence::save_snapshot(path, snapshot),
            None => Ok(()),
        }
    }

    fn sorted_by_rank(mut rows: Vec<StoredExpert>) -> Vec<StoredExpert> {
        // Stable: equal scores stay in insertion order.
        rows.sort_by(|a, b| b.expert.rank_score.cmp(&a.expert.rank_score));
        rows
    }
}

impl ExpertStore for ExpertLedger {
    fn experts_for(&self, brainlift_id: i64) -> StorageResult<Vec<StoredExpert>> {
        let state = self.state.read();
        let rows = state
            .experts
            .iter()
            .filter(|row| row.expert.brainlift_id == brainlift_id)
            .cloned()
            .collect();
        Ok(Self::sorted_by_rank(rows))
    }

    fn replace_experts(
        &self,
        brainlift_id: i64,
        experts: Vec<RankedExpert>,
    ) -> StorageResult<Vec<StoredExpert>> {
        let mut state = self.state.write();
        let mut next = state.clone();

        let before = next.experts.len();
        next.experts.retain(|row| row.expert.brainlift_id != brainlift_id);
        let removed = before - next.experts.len();

        let mut inserted = Vec::with_capacity(experts.len());
        for mut expert in experts {
            expert.brainlift_id = brainlift_id;
            next.next_id += 1;
            let row = StoredExpert {
                id: next.next_id,
                expert,
            };
            next.experts.push(row.clone());
            inserted.push(row);
        }

        self.persist(&next)?;
        *state = next;
        tracing::info!(brainlift_id, removed, inserted = inserted.len(), "expert set replaced");
        Ok(inserted)
    }

    fn set_following(&self, expert_id: ExpertId, following: bool) -> StorageResult<StoredExpert> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let row = next
            .experts
            .iter_mut()
            .find(|row| row.id == expert_id)
            .ok_or(StorageError::ExpertNotFound(expert_id))?;
        row.expert.is_following = following;
        let updated = row.clone();

        self.persist(&next)?;
        *state = next;
        Ok(updated)
    }

    fn followed_experts(&self, brainlift_id: i64) -> StorageResult<Vec<StoredExpert>> {
        Ok(self
            .experts_for(brainlift_id)?
            .into_iter()
            .filter(|row| row.expert.is_following)
            .collect())
    }

    fn delete_expert(&self, expert_id: ExpertId) -> StorageResult<()> {
        let mut state = self.state.write();
        if !state.experts.iter().any(|row| row.id == expert_id) {
            return Err(StorageError::ExpertNotFound(expert_id));
        }
        let mut next = state.clone();
        next.experts.retain(|row| row.id != expert_id);

        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn delete_brainlift(&self, brainlift_id: i64) -> StorageResult<usize> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let before = next.experts.len();
        next.experts.retain(|row| row.expert.brainlift_id != brainlift_id);
        let removed = before - next.experts.len();
        if removed == 0 {
            return Ok(0);
        }

        self.persist(&next)?;
        *state = next;
        Ok(removed)
    }
}
