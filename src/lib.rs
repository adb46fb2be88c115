//! # fae-fetch
//!
//! Concurrent dual-source result fetching for Fae.
//!
//! Merges a fast exact search and a slower semantic search into one
//! deduplicated, budget-limited stream of results delivered to a single
//! consumer, cooperating with a caller-supplied [`CancellationToken`].
//!
//! ## Design
//!
//! - Both producers run concurrently on blocking tasks
//! - The semantic side waits until the standard side has started, so exact
//!   hits reach the dedup registry first
//! - Semantic candidates are consumed in High, Medium, Low tiers from a
//!   single pass over the stream
//! - Duplicates across producers are merged by an injectable strategy
//! - `fetch` never returns while either producer could still emit
//!
//! ## Privacy
//!
//! - Search patterns are logged only at trace level

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod types;

pub use config::{FetchConfig, ThresholdTable};
pub use error::{FetchError, Result};
pub use orchestrator::classifier::PriorityClassifier;
pub use orchestrator::dedup::{
    BoostMergeStrategy, DeduplicationRegistry, Delivery, EqualityPredicate, MergeDecision,
    MergeStrategy, ResultConsumer,
};
pub use orchestrator::fetch::{FetchOrchestrator, FetchSession};
pub use source::{SemanticSearch, SemanticStream, StandardRequest, StandardSearch};
pub use tokio_util::sync::CancellationToken;
pub use types::{FetchStats, Origin, PriorityTier, ResultDescriptor, SemanticMatch, StandardHit};

use std::sync::Arc;

/// Fetch merged results with a one-off orchestrator.
///
/// Validates `config`, uses `I: PartialEq` as item identity and
/// [`BoostMergeStrategy`] for duplicates. Build a [`FetchOrchestrator`]
/// directly to reuse it or to inject other policies.
///
/// # Errors
///
/// Returns [`FetchError::Config`] for an invalid configuration, otherwise
/// the first producer failure (see [`FetchOrchestrator::fetch`]).
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use fae_fetch::{SemanticSearch, StandardSearch};
/// # async fn example(
/// #     standard: Arc<dyn StandardSearch<String>>,
/// #     semantic: Arc<dyn SemanticSearch<String>>,
/// # ) -> fae_fetch::Result<()> {
/// let config = fae_fetch::FetchConfig::default();
/// let cancel = fae_fetch::CancellationToken::new();
/// let print = |d: fae_fetch::ResultDescriptor<String>| {
///     println!("{} ({:.2})", d.item, d.weight);
///     true
/// };
/// let stats =
///     fae_fetch::fetch("parse config", &config, standard, semantic, &cancel, print).await?;
/// println!("delivered {}", stats.delivered());
/// # Ok(())
/// # }
/// ```
pub async fn fetch<I, C>(
    pattern: &str,
    config: &FetchConfig,
    standard: Arc<dyn StandardSearch<I>>,
    semantic: Arc<dyn SemanticSearch<I>>,
    cancellation: &CancellationToken,
    consumer: C,
) -> Result<FetchStats>
where
    I: Clone + PartialEq + Send + 'static,
    C: ResultConsumer<I> + 'static,
{
    FetchOrchestrator::new(config.clone(), standard, semantic)?
        .fetch(pattern, cancellation, consumer)
        .await
}
