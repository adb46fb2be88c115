//! Traits for the two result producers a fetch merges.
//!
//! Both producers are synchronous: the fetcher runs each on a blocking
//! thread. [`StandardSearch`] pushes hits into a callback; [`SemanticSearch`]
//! hands back a lazy iterator sorted by descending similarity.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{SemanticMatch, StandardHit};

/// Arguments passed to [`StandardSearch::search`].
#[derive(Debug, Clone, Copy)]
pub struct StandardRequest<'a> {
    /// The user's search pattern.
    pub pattern: &'a str,
    /// Session token. Cancelled when the caller cancels or the consumer
    /// asks to stop.
    pub cancellation: &'a CancellationToken,
    /// Whether the search should run under the host's extra read
    /// synchronization. Not interpreted by the fetcher.
    pub external_synchronization: bool,
}

/// The exact/standard search.
///
/// Implementations must honour `request.cancellation` internally and stop
/// producing once `on_hit` returns `false`.
pub trait StandardSearch<I>: Send + Sync {
    /// Run the search, pushing each hit to `on_hit` in ranking order.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails. The fetcher does not retry.
    fn search(
        &self,
        request: &StandardRequest<'_>,
        on_hit: &mut dyn FnMut(StandardHit<I>) -> bool,
    ) -> Result<()>;
}

/// Lazy sequence of semantic candidates, descending by similarity.
pub type SemanticStream<I> = Box<dyn Iterator<Item = Result<SemanticMatch<I>>> + Send>;

/// The approximate/semantic search.
pub trait SemanticSearch<I>: Send + Sync {
    /// Open a fresh stream of candidates with similarity of at least
    /// `minimum_similarity`. Called once per fetch; the stream is never
    /// restarted.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened.
    fn stream(&self, pattern: &str, minimum_similarity: f64) -> Result<SemanticStream<I>>;
}
