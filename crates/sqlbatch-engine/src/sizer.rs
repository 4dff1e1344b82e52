//! Column-aware byte budget adjustment
//!
//! Wide tables produce proportionally larger rows, so a fixed byte budget
//! admits too many statements for wide tables and too few for narrow ones.
//! The sizer scales the baseline budget by `reference / detected` columns,
//! clamped to the configured factor range. It is stateless: the factor is
//! recomputed per statement or run, never cached across table boundaries.

use sqlbatch_core::BatchConfig;

/// Derives the effective byte budget for a batch from the detected column
/// count of its current table context.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAwareSizer {
    baseline: usize,
    reference_columns: usize,
    min_factor: f64,
    max_factor: f64,
}

impl ColumnAwareSizer {
    pub fn new(
        baseline: usize,
        reference_columns: usize,
        min_factor: f64,
        max_factor: f64,
    ) -> Self {
        Self {
            baseline,
            reference_columns,
            min_factor,
            max_factor,
        }
    }

    /// Build a sizer from a validated config; `None` when column adjustment
    /// is disabled.
    pub fn from_config(config: &BatchConfig) -> Option<Self> {
        if !config.auto_adjust_for_columns {
            return None;
        }
        Some(Self::new(
            config.max_bytes,
            config.reference_column_count,
            config.min_adjustment_factor,
            config.max_adjustment_factor,
        ))
    }

    /// The adjustment factor for a detected column count. More columns than
    /// the reference shrink the budget, fewer grow it. Missing column
    /// information leaves the budget untouched.
    pub fn factor(&self, detected_columns: Option<usize>) -> f64 {
        let detected = match detected_columns {
            Some(n) if n > 0 => n,
            _ => return 1.0,
        };
        let raw = self.reference_columns as f64 / detected as f64;
        raw.clamp(self.min_factor, self.max_factor)
    }

    /// The effective byte budget for a detected column count.
    pub fn effective_budget(&self, detected_columns: Option<usize>) -> usize {
        let factor = self.factor(detected_columns);
        if factor == 1.0 {
            return self.baseline;
        }
        let adjusted = (self.baseline as f64 * factor) as usize;
        tracing::debug!(
            detected = ?detected_columns,
            reference = self.reference_columns,
            factor,
            adjusted,
            "column-based budget adjustment"
        );
        adjusted.max(1)
    }

    /// The unadjusted baseline budget.
    pub fn baseline(&self) -> usize {
        self.baseline
    }
}
