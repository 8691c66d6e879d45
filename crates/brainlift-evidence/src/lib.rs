//! Expert evidence aggregation for brainlift documents
//!
//! Turns a document's expert roster plus its fact base and reading list into
//! one [`EvidenceProfile`] per cited individual, and scores those profiles
//! with a deterministic fallback formula.
//!
//! ```text
//!   document text ──► roster ──► mentions ──┐
//!                                           ├──► profiles ──► estimate_score
//!   facts, reading list, text ──────────────┘        │
//!                                                    └──► (ranking oracle, see brainlift-oracle)
//! ```
//!
//! Every function in this crate is total: a document without a roster, an
//! empty fact base, or empty text all produce empty or zero-evidence output
//! instead of errors.

use serde::{Deserialize, Serialize};

pub mod citations;
pub mod estimate;
pub mod normalize;
pub mod overrides;
pub mod profiles;
pub mod roster;

pub use citations::{count_mentions, distinctive_token};
pub use estimate::{batch_max_citations, estimate_score, fallback_rationale};
pub use normalize::{normalize, split_co_authors};
pub use overrides::{CitationOverrides, NoOverrides, StaticOverrides};
pub use profiles::build_profiles;
pub use roster::{parse_roster, ROSTER_MARKER, ROSTER_WINDOW_CHARS};

// ============================================================================
// Inputs from collaborators
// ============================================================================

/// Highest verification score a fact can carry.
pub const MAX_FACT_SCORE: u8 = 5;

/// A verified statement from the fact ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub fact: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Verification score, 1..=5.
    pub score: u8,
}

impl Fact {
    /// Statement, note, and source joined for evidence searches.
    pub fn evidence_text(&self) -> String {
        format!(
            "{} {} {}",
            self.fact,
            self.note.as_deref().unwrap_or(""),
            self.source.as_deref().unwrap_or("")
        )
    }
}

/// One entry of the document's reading list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingListItem {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub topic: String,
    /// Medium ("Twitter", "Substack", ...).
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub time: String,
    /// What the item covers.
    #[serde(default)]
    pub facts: String,
    #[serde(default)]
    pub url: String,
}

/// Everything one expert refresh needs about a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainliftDocument {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Plain text after format conversion.
    #[serde(default)]
    pub original_content: String,
    #[serde(default)]
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub reading_list: Vec<ReadingListItem>,
}

// ============================================================================
// Engine types
// ============================================================================

/// A roster bullet as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertMention {
    pub name: String,
    pub handle: Option<String>,
    pub focus_description: String,
}

/// Aggregated citation evidence for one individual in one ranking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceProfile {
    /// Normalized, co-author-split name. Case-insensitive dedup key.
    pub canonical_name: String,
    pub twitter_handle: Option<String>,
    pub description: String,
    pub fact_citations: u32,
    /// Folded into `fact_citations` by the combined counting pass.
    pub note_citations: u32,
    /// Folded into `fact_citations` by the combined counting pass.
    pub source_citations: u32,
    pub reading_list_mentions: u32,
    /// Whether the individual appeared in the document's roster section.
    pub is_in_dok1_section: bool,
    /// Score-5 facts whose text, note, or source mention the surname.
    pub score5_fact_citations: u32,
}

impl EvidenceProfile {
    /// A roster-sourced profile with no evidence gathered yet.
    pub fn listed(name: &str, handle: Option<String>, description: &str) -> Self {
        Self {
            canonical_name: name.to_string(),
            twitter_handle: handle,
            description: description.to_string(),
            is_in_dok1_section: true,
            ..Default::default()
        }
    }

    pub fn total_citations(&self) -> u64 {
        u64::from(self.fact_citations)
            + u64::from(self.note_citations)
            + u64::from(self.source_citations)
    }

    pub fn key(&self) -> String {
        self.canonical_name.to_lowercase()
    }
}

/// Where a ranked expert's evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertSource {
    /// Named in the document's roster section.
    Listed,
    /// Surfaced while verifying facts.
    Verification,
    /// Found only through citations in the text.
    Cited,
}

impl ExpertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertSource::Listed => "listed",
            ExpertSource::Verification => "verification",
            ExpertSource::Cited => "cited",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "listed" => Some(ExpertSource::Listed),
            "verification" => Some(ExpertSource::Verification),
            "cited" => Some(ExpertSource::Cited),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExpertSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowest and highest rank scores.
pub const MIN_RANK_SCORE: u8 = 1;
pub const MAX_RANK_SCORE: u8 = 10;

/// Scores above this are followed by default.
pub const FOLLOW_THRESHOLD: u8 = 5;

/// A scored expert ready to persist against its brainlift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedExpert {
    pub brainlift_id: i64,
    pub name: String,
    pub rank_score: u8,
    pub rationale: String,
    pub source: ExpertSource,
    pub twitter_handle: Option<String>,
    pub is_following: bool,
}

impl RankedExpert {
    /// New entry with the default follow flag for its score.
    pub fn new(
        brainlift_id: i64,
        name: impl Into<String>,
        rank_score: u8,
        rationale: impl Into<String>,
        source: ExpertSource,
        twitter_handle: Option<String>,
    ) -> Self {
        Self {
            brainlift_id,
            name: name.into(),
            rank_score,
            rationale: rationale.into(),
            source,
            twitter_handle,
            is_following: rank_score > FOLLOW_THRESHOLD,
        }
    }
}
