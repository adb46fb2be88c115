//! Core types for merged results, confidence tiers, and fetch summaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which producer a delivered descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// The exact/standard search.
    Standard,
    /// The approximate/semantic search.
    Semantic,
    /// A duplicate reconciled across producers. Supersedes the earlier
    /// delivery of the same item.
    Merged,
}

impl Origin {
    /// Returns the human-readable name of this origin.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Semantic => "semantic",
            Self::Merged => "merged",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate result plus its scoring metadata.
///
/// Descriptors are never mutated once built; a merge produces a new
/// descriptor that replaces the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDescriptor<I> {
    /// The underlying item.
    pub item: I,
    /// Relevance used for ordering (higher is better).
    pub weight: f64,
    /// Similarity in `[0, 1]`, present for semantic-origin items.
    pub similarity: Option<f64>,
    /// Which producer (or merge) this descriptor came from.
    pub origin: Origin,
}

impl<I> ResultDescriptor<I> {
    /// Descriptor for a standard search hit.
    pub fn standard(item: I, weight: f64) -> Self {
        Self {
            item,
            weight,
            similarity: None,
            origin: Origin::Standard,
        }
    }

    /// Descriptor for a semantic match. The weight is the similarity itself.
    pub fn semantic(item: I, similarity: f64) -> Self {
        Self {
            item,
            weight: similarity,
            similarity: Some(similarity),
            origin: Origin::Semantic,
        }
    }
}

/// A raw hit pushed by the standard search.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardHit<I> {
    pub item: I,
    pub weight: f64,
}

/// A raw candidate yielded by the semantic stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch<I> {
    pub item: I,
    pub similarity: f64,
}

/// Discrete confidence bucket derived from a similarity score.
///
/// Variants are ordered from most to least confident, so derived `Ord`
/// gives the order in which semantic passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    /// All tiers in pass order.
    pub const ALL: [PriorityTier; 3] = [Self::High, Self::Medium, Self::Low];

    /// Returns the human-readable name of this tier.
    pub fn name(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Position of this tier in pass order (0 for `High`).
    pub fn index(&self) -> usize {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of a completed (or cancelled) fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchStats {
    /// New standard descriptors delivered to the consumer.
    pub standard_delivered: usize,
    /// New semantic descriptors delivered to the consumer.
    pub semantic_delivered: usize,
    /// Merged descriptors re-emitted for already delivered items.
    pub merged: usize,
    /// Duplicates absorbed without an emission.
    pub absorbed: usize,
    /// Semantic tier passes that ran to completion.
    pub semantic_tiers_completed: usize,
    /// True if the caller's token was cancelled or the consumer asked to stop.
    pub cancelled: bool,
    /// Wall time from session start to both producers finishing.
    pub elapsed: Duration,
}

impl FetchStats {
    /// Distinct items delivered across both producers.
    pub fn delivered(&self) -> usize {
        self.standard_delivered + self.semantic_delivered
    }
}
