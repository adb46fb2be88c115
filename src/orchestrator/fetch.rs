//! Fetch orchestrator: runs both producers concurrently and merges their
//! results into one consumer.
//!
//! # Sequencing
//!
//! 1. Spawn the standard task under the session cancellation token
//! 2. Await the startup rendezvous (first standard hit, or the end of the
//!    standard search) or cancellation, without holding a blocking thread
//! 3. Spawn the semantic task unless the session was cancelled meanwhile
//! 4. Both tasks deliver through the shared [`DeduplicationRegistry`]
//! 5. Await both join handles, even on error or cancellation, so nothing
//!    is emitted after `fetch` returns
//!
//! Dropping the `fetch` future cancels the session, so detached producers
//! wind down instead of feeding the consumer.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::source::{SemanticSearch, StandardSearch};
use crate::types::FetchStats;

use super::classifier::PriorityClassifier;
use super::dedup::{
    BoostMergeStrategy, DeduplicationRegistry, EqualityPredicate, MergeStrategy, ResultConsumer,
};
use super::semantic::SemanticProducerAdapter;
use super::standard::StandardProducerAdapter;

/// Ephemeral state for one fetch invocation. Never outlives it.
pub struct FetchSession<I> {
    /// The search pattern shared by both producers.
    pub pattern: Arc<str>,
    /// Child of the caller's token; also cancelled when the consumer stops.
    pub cancellation: CancellationToken,
    pub registry: Arc<DeduplicationRegistry<I>>,
    started_at: Instant,
}

impl<I> Clone for FetchSession<I> {
    fn clone(&self) -> Self {
        Self {
            pattern: Arc::clone(&self.pattern),
            cancellation: self.cancellation.clone(),
            registry: Arc::clone(&self.registry),
            started_at: self.started_at,
        }
    }
}

impl<I: Clone> FetchSession<I> {
    pub fn new(
        pattern: &str,
        cancellation: CancellationToken,
        registry: DeduplicationRegistry<I>,
    ) -> Self {
        Self {
            pattern: Arc::from(pattern),
            cancellation,
            registry: Arc::new(registry),
            started_at: Instant::now(),
        }
    }

    /// Milliseconds since the session was created.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Merges a standard and a semantic search into one deduplicated stream.
///
/// Configuration and collaborators are long-lived; every call to
/// [`fetch`](Self::fetch) gets its own session.
pub struct FetchOrchestrator<I> {
    config: FetchConfig,
    classifier: PriorityClassifier,
    standard: Arc<dyn StandardSearch<I>>,
    semantic: Arc<dyn SemanticSearch<I>>,
    equality: Arc<dyn EqualityPredicate<I>>,
    merge: Arc<dyn MergeStrategy<I>>,
}

impl<I> FetchOrchestrator<I>
where
    I: Clone + PartialEq + Send + 'static,
{
    /// Create an orchestrator using `I: PartialEq` as item identity and
    /// [`BoostMergeStrategy`] for duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] if `config` is invalid.
    pub fn new(
        config: FetchConfig,
        standard: Arc<dyn StandardSearch<I>>,
        semantic: Arc<dyn SemanticSearch<I>>,
    ) -> Result<Self> {
        config.validate()?;
        let classifier = PriorityClassifier::new(config.thresholds)?;
        Ok(Self {
            config,
            classifier,
            standard,
            semantic,
            equality: Arc::new(|a: &I, b: &I| a == b),
            merge: Arc::new(BoostMergeStrategy::default()),
        })
    }
}

impl<I> FetchOrchestrator<I>
where
    I: Clone + Send + 'static,
{
    /// Replace the "same underlying item" predicate.
    #[must_use]
    pub fn with_equality(mut self, equality: Arc<dyn EqualityPredicate<I>>) -> Self {
        self.equality = equality;
        self
    }

    /// Replace the duplicate merge policy.
    #[must_use]
    pub fn with_merge_strategy(mut self, merge: Arc<dyn MergeStrategy<I>>) -> Self {
        self.merge = merge;
        self
    }

    /// Run both producers for `pattern` and deliver merged results to
    /// `consumer`.
    ///
    /// Returns only after both producers have finished. Cancelling
    /// `cancellation` (or the consumer returning `false`) stops both
    /// cooperatively and yields `Ok` with [`FetchStats::cancelled`] set.
    ///
    /// # Errors
    ///
    /// Returns the standard producer's error if it failed, otherwise the
    /// semantic producer's. Panicking producers surface as
    /// [`FetchError::Task`].
    pub async fn fetch<C>(
        &self,
        pattern: &str,
        cancellation: &CancellationToken,
        consumer: C,
    ) -> Result<FetchStats>
    where
        C: ResultConsumer<I> + 'static,
    {
        if cancellation.is_cancelled() {
            tracing::debug!("fetch cancelled before start");
            return Ok(FetchStats {
                cancelled: true,
                ..Default::default()
            });
        }

        let token = cancellation.child_token();
        let _session_guard = token.clone().drop_guard();
        let registry = DeduplicationRegistry::new(
            Arc::clone(&self.equality),
            Arc::clone(&self.merge),
            Box::new(consumer),
            token.clone(),
        );
        let session = FetchSession::new(pattern, token, registry);
        tracing::trace!(pattern, "fetch started");

        let (started_tx, started_rx) = oneshot::channel::<()>();

        let standard_task = {
            let adapter = StandardProducerAdapter::new(
                Arc::clone(&self.standard),
                self.config.use_external_synchronization_for_standard_search,
            );
            let session = session.clone();
            tokio::task::spawn_blocking(move || {
                let outcome = adapter.run(&session, started_tx);
                if outcome.is_err() {
                    session.cancellation.cancel();
                }
                outcome
            })
        };

        let adapter = SemanticProducerAdapter::new(
            Arc::clone(&self.semantic),
            self.classifier,
            self.config.desired_results_count,
        );
        let semantic_task = if adapter.wait_for_start(&session, started_rx).await {
            let session = session.clone();
            Some(tokio::task::spawn_blocking(move || {
                let outcome = adapter.run(&session);
                if outcome.is_err() {
                    session.cancellation.cancel();
                }
                outcome
            }))
        } else {
            None
        };

        let (standard_outcome, semantic_outcome) = tokio::join!(standard_task, async move {
            match semantic_task {
                Some(task) => task.await,
                None => Ok(Ok(0)),
            }
        });
        let standard_result = flatten(standard_outcome, "standard");
        let semantic_result = flatten(semantic_outcome, "semantic");

        if let Err(err) = &semantic_result {
            tracing::warn!(error = %err, "semantic producer failed");
        }
        standard_result?;
        let tiers_completed = semantic_result?;

        let mut stats = FetchStats {
            semantic_tiers_completed: tiers_completed,
            cancelled: session.cancellation.is_cancelled(),
            elapsed: session.started_at.elapsed(),
            ..Default::default()
        };
        session.registry.record_into(&mut stats)?;

        tracing::debug!(
            delivered = stats.delivered(),
            merged = stats.merged,
            absorbed = stats.absorbed,
            cancelled = stats.cancelled,
            elapsed_ms = session.elapsed_ms(),
            "fetch finished"
        );
        Ok(stats)
    }
}

/// Collapse a join outcome into the producer's own result.
fn flatten<T>(outcome: std::result::Result<Result<T>, JoinError>, producer: &str) -> Result<T> {
    match outcome {
        Ok(result) => result,
        Err(err) if err.is_panic() => {
            Err(FetchError::Task(format!("{producer} producer panicked")))
        }
        Err(err) => Err(FetchError::Task(format!("{producer} producer: {err}"))),
    }
}
