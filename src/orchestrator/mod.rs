//! Fetch orchestrator: concurrent producers, tiering, dedup, delivery.
//!
//! The standard and semantic producers run on separate blocking tasks and
//! meet at a shared [`dedup::DeduplicationRegistry`]. Semantic candidates are
//! bucketed into confidence tiers by [`classifier::PriorityClassifier`] and
//! delivered one tier at a time.

pub mod classifier;
pub mod dedup;
pub mod fetch;
pub mod semantic;
pub mod standard;
