//! Fetch configuration with sensible defaults.
//!
//! [`FetchConfig`] holds the long-lived settings shared by every fetch: the
//! similarity thresholds that split the semantic stream into tiers, the
//! result budget, and a pass-through flag for the standard search.

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, Result};
use crate::types::PriorityTier;

/// Minimum similarity required for each [`PriorityTier`].
///
/// Thresholds must be finite, within `[0, 1]`, and strictly decreasing
/// from `high` to `low`. Similarities below `low` are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdTable {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            high: 0.68,
            medium: 0.5,
            low: 0.4,
        }
    }
}

impl ThresholdTable {
    /// Threshold for a single tier.
    pub fn threshold(&self, tier: PriorityTier) -> f64 {
        match tier {
            PriorityTier::High => self.high,
            PriorityTier::Medium => self.medium,
            PriorityTier::Low => self.low,
        }
    }

    /// Validates ordering and range of the thresholds.
    pub fn validate(&self) -> Result<()> {
        for tier in PriorityTier::ALL {
            let value = self.threshold(tier);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(FetchError::Config(format!(
                    "{tier} threshold must be within [0, 1], got {value}"
                )));
            }
        }
        if self.high <= self.medium || self.medium <= self.low {
            return Err(FetchError::Config(format!(
                "thresholds must be strictly decreasing (high {} > medium {} > low {})",
                self.high, self.medium, self.low
            )));
        }
        Ok(())
    }
}

/// Configuration for a [`FetchOrchestrator`](crate::FetchOrchestrator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Similarity thresholds for the semantic tiers.
    pub thresholds: ThresholdTable,
    /// Once this many distinct results are delivered, no further semantic
    /// tier pass starts. The standard search is not limited by it.
    pub desired_results_count: usize,
    /// Forwarded to the standard search untouched; the fetcher does not
    /// interpret it.
    pub use_external_synchronization_for_standard_search: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdTable::default(),
            desired_results_count: 30,
            use_external_synchronization_for_standard_search: false,
        }
    }
}

impl FetchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `desired_results_count` must be greater than 0
    /// - thresholds must be in range and strictly decreasing
    pub fn validate(&self) -> Result<()> {
        if self.desired_results_count == 0 {
            return Err(FetchError::Config(
                "desired_results_count must be greater than 0".into(),
            ));
        }
        self.thresholds.validate()
    }

    /// Parse and validate a configuration from TOML, falling back to
    /// defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] if the TOML is malformed or invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| FetchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
