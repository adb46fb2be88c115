//! Cross-producer deduplication of delivered results.
//!
//! Both producers funnel every candidate through one
//! [`DeduplicationRegistry`]. Under a single mutex it checks the candidate
//! against the items already delivered in this fetch, either registers it
//! as new or hands it to a [`MergeStrategy`], and then calls the consumer.
//! Check, insert-or-merge, and the consumer call form one critical section,
//! so a slow consumer serialises both producers.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, Result};
use crate::types::{FetchStats, Origin, ResultDescriptor};

/// Decides whether two items are the same underlying result.
///
/// Must be pure and must not panic; a panic poisons the registry and
/// aborts the fetch.
pub trait EqualityPredicate<I>: Send + Sync {
    fn same_item(&self, a: &I, b: &I) -> bool;
}

impl<I, F> EqualityPredicate<I> for F
where
    F: Fn(&I, &I) -> bool + Send + Sync,
{
    fn same_item(&self, a: &I, b: &I) -> bool {
        self(a, b)
    }
}

/// Outcome of merging a duplicate into an already delivered entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeDecision<I> {
    /// Replace the stored entry and re-emit it.
    Emit(ResultDescriptor<I>),
    /// Keep the stored entry; emit nothing.
    Absorb,
}

/// Policy for reconciling a duplicate with the entry already delivered.
pub trait MergeStrategy<I>: Send + Sync {
    fn merge(
        &self,
        existing: &ResultDescriptor<I>,
        incoming: &ResultDescriptor<I>,
    ) -> MergeDecision<I>;
}

/// Default merge policy: corroboration from the other producer boosts the
/// existing entry.
///
/// A duplicate coming from a different producer than the stored entry is
/// merged into a descriptor weighted `max(existing, incoming) * boost`.
/// Same-producer duplicates and duplicates of an already merged entry are
/// absorbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostMergeStrategy {
    pub boost: f64,
}

impl Default for BoostMergeStrategy {
    fn default() -> Self {
        Self { boost: 1.1 }
    }
}

impl<I: Clone> MergeStrategy<I> for BoostMergeStrategy {
    fn merge(
        &self,
        existing: &ResultDescriptor<I>,
        incoming: &ResultDescriptor<I>,
    ) -> MergeDecision<I> {
        if existing.origin == Origin::Merged || existing.origin == incoming.origin {
            return MergeDecision::Absorb;
        }
        MergeDecision::Emit(ResultDescriptor {
            item: existing.item.clone(),
            weight: existing.weight.max(incoming.weight) * self.boost,
            similarity: existing.similarity.or(incoming.similarity),
            origin: Origin::Merged,
        })
    }
}

/// Receives every emission of a fetch. Return `false` to stop the fetch.
///
/// A [`Origin::Merged`] descriptor supersedes the earlier delivery of the
/// same item.
pub trait ResultConsumer<I>: Send {
    fn accept(&mut self, descriptor: ResultDescriptor<I>) -> bool;
}

impl<I, F> ResultConsumer<I> for F
where
    F: FnMut(ResultDescriptor<I>) -> bool + Send,
{
    fn accept(&mut self, descriptor: ResultDescriptor<I>) -> bool {
        self(descriptor)
    }
}

/// Result of [`DeduplicationRegistry::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A descriptor reached the consumer.
    Delivered(Origin),
    /// The candidate was a duplicate and nothing was emitted.
    Absorbed,
    /// The consumer asked to stop or the session was cancelled; no more
    /// deliveries are accepted.
    Stopped,
}

struct RegistryState<I> {
    known: Vec<ResultDescriptor<I>>,
    standard_delivered: usize,
    semantic_delivered: usize,
    merged: usize,
    absorbed: usize,
    stopped: bool,
    consumer: Box<dyn ResultConsumer<I>>,
}

impl<I: Clone> RegistryState<I> {
    fn reconcile(
        &mut self,
        candidate: ResultDescriptor<I>,
        equality: &dyn EqualityPredicate<I>,
        merge: &dyn MergeStrategy<I>,
    ) -> Option<ResultDescriptor<I>> {
        let existing = self
            .known
            .iter()
            .position(|known| equality.same_item(&known.item, &candidate.item));

        let Some(index) = existing else {
            match candidate.origin {
                Origin::Semantic => self.semantic_delivered += 1,
                Origin::Standard | Origin::Merged => self.standard_delivered += 1,
            }
            self.known.push(candidate.clone());
            return Some(candidate);
        };

        match merge.merge(&self.known[index], &candidate) {
            MergeDecision::Emit(merged) => {
                let merged = ResultDescriptor {
                    origin: Origin::Merged,
                    ..merged
                };
                tracing::trace!(index, weight = merged.weight, "duplicate merged");
                self.merged += 1;
                self.known[index] = merged.clone();
                Some(merged)
            }
            MergeDecision::Absorb => {
                tracing::trace!(index, origin = %candidate.origin, "duplicate absorbed");
                self.absorbed += 1;
                None
            }
        }
    }

    fn delivered(&self) -> usize {
        self.standard_delivered + self.semantic_delivered
    }
}

/// Per-fetch list of delivered items, guarded by one mutex.
///
/// Holds at most one descriptor per distinct underlying item. Created
/// fresh for every fetch and never shared between fetches.
pub struct DeduplicationRegistry<I> {
    state: Mutex<RegistryState<I>>,
    equality: Arc<dyn EqualityPredicate<I>>,
    merge: Arc<dyn MergeStrategy<I>>,
    session: CancellationToken,
}

impl<I: Clone> DeduplicationRegistry<I> {
    /// Create a registry that delivers into `consumer`.
    ///
    /// `session` is cancelled once the consumer returns `false`.
    pub fn new(
        equality: Arc<dyn EqualityPredicate<I>>,
        merge: Arc<dyn MergeStrategy<I>>,
        consumer: Box<dyn ResultConsumer<I>>,
        session: CancellationToken,
    ) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                known: Vec::new(),
                standard_delivered: 0,
                semantic_delivered: 0,
                merged: 0,
                absorbed: 0,
                stopped: false,
                consumer,
            }),
            equality,
            merge,
            session,
        }
    }

    /// Check `candidate` against known items without calling the consumer.
    ///
    /// Returns the descriptor to emit (the candidate itself or a merged
    /// replacement), or `None` if the duplicate was absorbed. A new item is
    /// registered and counted toward [`delivered`](Self::delivered) even
    /// though nothing is emitted, so it reserves a slot of the semantic
    /// budget; the caller takes over emitting the returned descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RegistryPoisoned`] if a collaborator panicked
    /// inside an earlier reconciliation.
    pub fn reconcile(&self, candidate: ResultDescriptor<I>) -> Result<Option<ResultDescriptor<I>>> {
        let mut state = self.state.lock().map_err(|_| FetchError::RegistryPoisoned)?;
        Ok(state.reconcile(candidate, self.equality.as_ref(), self.merge.as_ref()))
    }

    /// Reconcile `candidate` and hand the outcome to the consumer as one
    /// atomic step.
    ///
    /// Session cancellation is checked under the lock, so once the session
    /// token is cancelled no further descriptor reaches the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RegistryPoisoned`] if a collaborator panicked
    /// inside an earlier reconciliation.
    pub fn deliver(&self, candidate: ResultDescriptor<I>) -> Result<Delivery> {
        let mut state = self.state.lock().map_err(|_| FetchError::RegistryPoisoned)?;
        if state.stopped || self.session.is_cancelled() {
            return Ok(Delivery::Stopped);
        }
        let outcome = state.reconcile(candidate, self.equality.as_ref(), self.merge.as_ref());
        let Some(descriptor) = outcome else {
            return Ok(Delivery::Absorbed);
        };

        let origin = descriptor.origin;
        if !state.consumer.accept(descriptor) {
            tracing::debug!(delivered = state.delivered(), "consumer requested stop");
            state.stopped = true;
            self.session.cancel();
            return Ok(Delivery::Stopped);
        }
        Ok(Delivery::Delivered(origin))
    }

    /// Distinct items delivered so far. Merges and absorbed duplicates do
    /// not count.
    pub fn delivered(&self) -> Result<usize> {
        let state = self.state.lock().map_err(|_| FetchError::RegistryPoisoned)?;
        Ok(state.delivered())
    }

    /// Whether the consumer has asked to stop.
    pub fn is_stopped(&self) -> Result<bool> {
        let state = self.state.lock().map_err(|_| FetchError::RegistryPoisoned)?;
        Ok(state.stopped)
    }

    /// Copy of the known items, in delivery order.
    pub fn known_items(&self) -> Result<Vec<ResultDescriptor<I>>> {
        let state = self.state.lock().map_err(|_| FetchError::RegistryPoisoned)?;
        Ok(state.known.clone())
    }

    /// Copy delivery counters into `stats`.
    pub fn record_into(&self, stats: &mut FetchStats) -> Result<()> {
        let state = self.state.lock().map_err(|_| FetchError::RegistryPoisoned)?;
        stats.standard_delivered = state.standard_delivered;
        stats.semantic_delivered = state.semantic_delivered;
        stats.merged = state.merged;
        stats.absorbed = state.absorbed;
        stats.cancelled |= state.stopped;
        Ok(())
    }
}
