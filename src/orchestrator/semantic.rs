//! Adapter that drains the semantic stream tier by tier.
//!
//! # Passes
//!
//! ```text
//! live stream ──► High pass ──► deliver High
//!                    │
//!                    └─► buckets[Medium], buckets[Low]
//!                                │              │
//!                  Medium pass ◄─┘   Low pass ◄─┘
//! ```
//!
//! The orchestrator awaits the startup rendezvous through
//! [`SemanticProducerAdapter::wait_for_start`] before spawning the blocking
//! drain.
//!
//! The live stream is read exactly once, during the High pass. Later passes
//! replay the bucketed candidates. Between passes the adapter stops if the
//! budget is met, the session is cancelled, or the consumer has stopped.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::Result;
use crate::source::SemanticSearch;
use crate::types::{PriorityTier, ResultDescriptor};

use super::classifier::PriorityClassifier;
use super::dedup::Delivery;
use super::fetch::FetchSession;

/// Delivers semantic candidates in High, Medium, Low order.
pub struct SemanticProducerAdapter<I> {
    search: Arc<dyn SemanticSearch<I>>,
    classifier: PriorityClassifier,
    desired_results_count: usize,
}

impl<I: Clone + Send + 'static> SemanticProducerAdapter<I> {
    pub fn new(
        search: Arc<dyn SemanticSearch<I>>,
        classifier: PriorityClassifier,
        desired_results_count: usize,
    ) -> Self {
        Self {
            search,
            classifier,
            desired_results_count,
        }
    }

    /// Wait until the standard side has started or the session is
    /// cancelled. Returns `false` if the semantic search should not run.
    pub async fn wait_for_start(
        &self,
        session: &FetchSession<I>,
        started: oneshot::Receiver<()>,
    ) -> bool {
        tokio::select! {
            signal = started => {
                if signal.is_err() {
                    tracing::trace!("standard search ended before producing a hit");
                }
            }
            () = session.cancellation.cancelled() => {}
        }
        if session.cancellation.is_cancelled() {
            tracing::debug!("semantic search skipped, session cancelled");
            return false;
        }
        true
    }

    /// Run the tier passes. Call once [`wait_for_start`](Self::wait_for_start)
    /// has returned `true`.
    ///
    /// Blocks the current thread; call from a blocking task. Returns the
    /// number of tier passes that ran to completion.
    ///
    /// # Errors
    ///
    /// Propagates failures to open the stream, stream item errors, and
    /// registry failures.
    pub fn run(&self, session: &FetchSession<I>) -> Result<usize> {
        if session.cancellation.is_cancelled() {
            tracing::debug!("semantic search skipped, session cancelled");
            return Ok(0);
        }
        tracing::trace!(pattern = %session.pattern, "opening semantic stream");
        let stream = self
            .search
            .stream(&session.pattern, self.classifier.minimum_similarity())?;

        let mut buckets: [Vec<ResultDescriptor<I>>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        let mut completed = 0usize;

        for candidate in stream {
            if session.cancellation.is_cancelled() {
                return Ok(completed);
            }
            let candidate = candidate?;
            // Sorted descending: nothing after an excluded candidate can qualify.
            let Some(tier) = self.classifier.classify(candidate.similarity) else {
                break;
            };
            let descriptor = ResultDescriptor::semantic(candidate.item, candidate.similarity);
            if tier == PriorityTier::High {
                if !self.deliver(session, descriptor)? {
                    return Ok(completed);
                }
            } else {
                buckets[tier.index()].push(descriptor);
            }
        }
        completed += 1;
        if self.pass_finished(session, PriorityTier::High)? {
            return Ok(completed);
        }

        for tier in [PriorityTier::Medium, PriorityTier::Low] {
            for descriptor in std::mem::take(&mut buckets[tier.index()]) {
                if session.cancellation.is_cancelled() {
                    return Ok(completed);
                }
                if !self.deliver(session, descriptor)? {
                    return Ok(completed);
                }
            }
            completed += 1;
            if self.pass_finished(session, tier)? {
                break;
            }
        }
        Ok(completed)
    }

    /// Deliver one candidate. Returns `false` once the consumer has stopped.
    fn deliver(&self, session: &FetchSession<I>, descriptor: ResultDescriptor<I>) -> Result<bool> {
        Ok(session.registry.deliver(descriptor)? != Delivery::Stopped)
    }

    /// Log the pass and report whether the adapter should stop.
    fn pass_finished(&self, session: &FetchSession<I>, tier: PriorityTier) -> Result<bool> {
        let delivered = session.registry.delivered()?;
        let budget_met = delivered >= self.desired_results_count;
        let cancelled = session.cancellation.is_cancelled();
        tracing::debug!(
            %tier,
            delivered,
            budget_met,
            cancelled,
            elapsed_ms = session.elapsed_ms(),
            "semantic tier pass finished"
        );
        Ok(budget_met || cancelled)
    }
}
