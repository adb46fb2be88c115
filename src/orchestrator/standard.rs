//! Adapter that feeds standard search hits into the registry.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::{FetchError, Result};
use crate::source::{StandardRequest, StandardSearch};
use crate::types::{ResultDescriptor, StandardHit};

use super::dedup::Delivery;
use super::fetch::FetchSession;

/// Runs the standard search and delivers each hit in the order produced.
///
/// Fires the startup rendezvous right before its first hit is reconciled.
/// If the search ends without any hit, dropping the sender releases the
/// semantic side instead.
pub struct StandardProducerAdapter<I> {
    search: Arc<dyn StandardSearch<I>>,
    external_synchronization: bool,
}

impl<I: Clone + Send + 'static> StandardProducerAdapter<I> {
    pub fn new(search: Arc<dyn StandardSearch<I>>, external_synchronization: bool) -> Self {
        Self {
            search,
            external_synchronization,
        }
    }

    /// Run the search to completion, cancellation, or consumer stop.
    ///
    /// Returns the number of hits forwarded to the registry.
    ///
    /// # Errors
    ///
    /// Propagates failures of the search itself and of the registry.
    pub fn run(&self, session: &FetchSession<I>, started: oneshot::Sender<()>) -> Result<usize> {
        let cancellation = &session.cancellation;
        let mut started = Some(started);
        let mut failure: Option<FetchError> = None;
        let mut forwarded = 0usize;

        let request = StandardRequest {
            pattern: &session.pattern,
            cancellation,
            external_synchronization: self.external_synchronization,
        };

        let outcome = self.search.search(&request, &mut |hit: StandardHit<I>| {
            if let Some(signal) = started.take() {
                tracing::debug!(
                    elapsed_ms = session.elapsed_ms(),
                    "standard search started producing"
                );
                let _ = signal.send(());
            }
            if cancellation.is_cancelled() {
                return false;
            }
            match session.registry.deliver(ResultDescriptor::standard(hit.item, hit.weight)) {
                Ok(Delivery::Stopped) => false,
                Ok(Delivery::Delivered(_) | Delivery::Absorbed) => {
                    forwarded += 1;
                    !cancellation.is_cancelled()
                }
                Err(err) => {
                    failure = Some(err);
                    false
                }
            }
        });
        // Releases the semantic side when no hit ever arrived.
        drop(started);

        if let Some(err) = failure {
            return Err(err);
        }
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "standard search failed");
            return Err(err);
        }

        tracing::debug!(
            forwarded,
            elapsed_ms = session.elapsed_ms(),
            cancelled = cancellation.is_cancelled(),
            "standard search finished"
        );
        Ok(forwarded)
    }
}
