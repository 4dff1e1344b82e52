//! Batching configuration
//!
//! `BatchConfig` is created once, validated at batcher construction and never
//! mutated during a run. Adjusting batch size mid-run means building a new
//! batcher with a new config.

use crate::{BatchError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the batching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum batch size in bytes (the baseline budget)
    pub max_bytes: usize,
    /// SQL statement delimiter appended between batched statements
    pub delimiter: String,
    /// Skip execution and only report what would run
    pub dry_run: bool,
    /// Merge compatible INSERT statements before batching
    pub merge_inserts: bool,
    /// Adjust the byte budget according to detected column count
    pub auto_adjust_for_columns: bool,
    /// Reference column count for the adjustment (required when
    /// `auto_adjust_for_columns` is set; there is no sensible universal
    /// default)
    pub reference_column_count: usize,
    /// Lower clamp for the adjustment factor
    pub min_adjustment_factor: f64,
    /// Upper clamp for the adjustment factor
    pub max_adjustment_factor: f64,
    /// Wrap the whole run in one transaction
    pub use_transaction: bool,
    /// Create a savepoint per batch for partial rollback
    pub use_savepoints: bool,
}

impl BatchConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the baseline byte budget
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the statement delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Enable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable INSERT merging
    pub fn with_merge_inserts(mut self, merge: bool) -> Self {
        self.merge_inserts = merge;
        self
    }

    /// Enable column-aware budget adjustment against the given reference
    /// column count
    pub fn with_column_adjustment(mut self, reference_column_count: usize) -> Self {
        self.auto_adjust_for_columns = true;
        self.reference_column_count = reference_column_count;
        self
    }

    /// Set the clamp bounds for the adjustment factor
    pub fn with_adjustment_factors(mut self, min: f64, max: f64) -> Self {
        self.min_adjustment_factor = min;
        self.max_adjustment_factor = max;
        self
    }

    /// Wrap the whole run in one transaction
    pub fn with_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    /// Create a savepoint per batch
    pub fn with_savepoints(mut self, use_savepoints: bool) -> Self {
        self.use_savepoints = use_savepoints;
        self
    }

    /// Validate the configuration.
    ///
    /// Invalid combinations fail here, at batcher construction, never
    /// mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(BatchError::Configuration(
                "max_bytes must be positive".to_string(),
            ));
        }
        if self.delimiter.is_empty() {
            return Err(BatchError::Configuration(
                "delimiter must not be empty".to_string(),
            ));
        }
        if self.min_adjustment_factor <= 0.0 {
            return Err(BatchError::Configuration(
                "min_adjustment_factor must be positive".to_string(),
            ));
        }
        if self.min_adjustment_factor > self.max_adjustment_factor {
            return Err(BatchError::Configuration(format!(
                "min_adjustment_factor {} exceeds max_adjustment_factor {}",
                self.min_adjustment_factor, self.max_adjustment_factor
            )));
        }
        if self.auto_adjust_for_columns && self.reference_column_count == 0 {
            return Err(BatchError::Configuration(
                "reference_column_count must be positive when auto_adjust_for_columns is set"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1_000_000,
            delimiter: ";".to_string(),
            dry_run: false,
            merge_inserts: false,
            auto_adjust_for_columns: false,
            reference_column_count: 0,
            min_adjustment_factor: 0.2,
            max_adjustment_factor: 5.0,
            use_transaction: false,
            use_savepoints: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_defaults() {
        let config = BatchConfig::default();

        assert_eq!(config.max_bytes, 1_000_000);
        assert_eq!(config.delimiter, ";");
        assert!(!config.dry_run);
        assert!(!config.merge_inserts);
        assert!(!config.auto_adjust_for_columns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = BatchConfig::new()
            .with_max_bytes(500)
            .with_delimiter(";")
            .with_dry_run(true)
            .with_merge_inserts(true)
            .with_column_adjustment(10)
            .with_adjustment_factors(0.5, 2.0)
            .with_transaction(true)
            .with_savepoints(true);

        assert_eq!(config.max_bytes, 500);
        assert!(config.dry_run);
        assert!(config.merge_inserts);
        assert!(config.auto_adjust_for_columns);
        assert_eq!(config.reference_column_count, 10);
        assert_eq!(config.min_adjustment_factor, 0.5);
        assert_eq!(config.max_adjustment_factor, 2.0);
        assert!(config.use_transaction);
        assert!(config.use_savepoints);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_max_bytes() {
        let config = BatchConfig::new().with_max_bytes(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_empty_delimiter() {
        let config = BatchConfig::new().with_delimiter("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_inverted_factors() {
        let config = BatchConfig::new().with_adjustment_factors(3.0, 0.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_config_rejects_nonpositive_min_factor() {
        let config = BatchConfig::new().with_adjustment_factors(0.0, 2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_requires_reference_columns_when_adjusting() {
        let mut config = BatchConfig::new();
        config.auto_adjust_for_columns = true;
        assert!(config.validate().is_err());

        let config = BatchConfig::new().with_column_adjustment(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = BatchConfig::new()
            .with_max_bytes(2048)
            .with_merge_inserts(true)
            .with_column_adjustment(8);

        let json = serde_json::to_string(&config).unwrap();
        let back: BatchConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back, config);
    }
}
