//! Similarity-to-tier classification.
//!
//! Maps a continuous similarity score onto a [`PriorityTier`] using a
//! validated [`ThresholdTable`]:
//!
//! | Tier | Qualifies when |
//! |------|----------------|
//! | `High` | `similarity >= high` |
//! | `Medium` | `similarity >= medium` |
//! | `Low` | `similarity >= low` |
//! | excluded | `similarity < low` or NaN |

use crate::config::ThresholdTable;
use crate::error::Result;
use crate::types::PriorityTier;

/// Classifies similarities into tiers. Built once, shared across fetches.
#[derive(Debug, Clone, Copy)]
pub struct PriorityClassifier {
    thresholds: ThresholdTable,
}

impl PriorityClassifier {
    /// Create a classifier, validating the threshold table.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`](crate::FetchError::Config) if the
    /// thresholds are out of range or not strictly decreasing.
    pub fn new(thresholds: ThresholdTable) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    /// Highest tier whose threshold `similarity` meets, or `None` if excluded.
    pub fn classify(&self, similarity: f64) -> Option<PriorityTier> {
        PriorityTier::ALL
            .into_iter()
            .find(|tier| similarity >= self.thresholds.threshold(*tier))
    }

    /// Lowest similarity that still classifies.
    pub fn minimum_similarity(&self) -> f64 {
        self.thresholds.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PriorityClassifier {
        PriorityClassifier::new(ThresholdTable {
            high: 0.68,
            medium: 0.5,
            low: 0.4,
        })
        .expect("valid thresholds")
    }

    #[test]
    fn classifies_each_band() {
        let c = classifier();
        assert_eq!(c.classify(0.9), Some(PriorityTier::High));
        assert_eq!(c.classify(0.55), Some(PriorityTier::Medium));
        assert_eq!(c.classify(0.45), Some(PriorityTier::Low));
        assert_eq!(c.classify(0.1), None);
    }

    #[test]
    fn threshold_values_are_inclusive() {
        let c = classifier();
        assert_eq!(c.classify(0.68), Some(PriorityTier::High));
        assert_eq!(c.classify(0.5), Some(PriorityTier::Medium));
        assert_eq!(c.classify(0.4), Some(PriorityTier::Low));
    }

    #[test]
    fn just_below_low_is_excluded() {
        assert_eq!(classifier().classify(0.399_999), None);
    }

    #[test]
    fn nan_is_excluded() {
        assert_eq!(classifier().classify(f64::NAN), None);
    }

    #[test]
    fn classification_is_monotonic() {
        let c = classifier();
        let tiers: Vec<_> = (0..=100)
            .rev()
            .filter_map(|i| c.classify(i as f64 / 100.0))
            .collect();
        for pair in tiers.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn invalid_table_fails_at_construction() {
        let result = PriorityClassifier::new(ThresholdTable {
            high: 0.4,
            medium: 0.5,
            low: 0.6,
        });
        assert!(result.is_err());
    }

    #[test]
    fn minimum_similarity_is_low_threshold() {
        assert!((classifier().minimum_similarity() - 0.4).abs() < f64::EPSILON);
    }
}
