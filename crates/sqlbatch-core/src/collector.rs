//! Query collection
//!
//! A collector is a passive, append-only sink the batcher reports each
//! physical execution to. The batcher treats a missing collector as a no-op;
//! retention policy belongs to the collector, not the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One executed (or dry-run) physical batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// The SQL text that was (or would have been) executed
    pub sql: String,
    /// Serialized byte size of the batch
    pub size_bytes: usize,
    /// Number of logical statements the batch represents (merged INSERT
    /// rows count individually)
    pub statement_count: usize,
    /// Execution duration (zero in dry-run mode)
    pub duration: Duration,
    /// Whether execution succeeded
    pub success: bool,
    /// Error detail when execution failed
    pub error: Option<String>,
    /// When the record was appended
    pub recorded_at: DateTime<Utc>,
}

impl QueryRecord {
    /// Record a successful execution.
    pub fn success(
        sql: impl Into<String>,
        size_bytes: usize,
        statement_count: usize,
        duration: Duration,
    ) -> Self {
        Self {
            sql: sql.into(),
            size_bytes,
            statement_count,
            duration,
            success: true,
            error: None,
            recorded_at: Utc::now(),
        }
    }

    /// Record a failed execution.
    pub fn failure(
        sql: impl Into<String>,
        size_bytes: usize,
        statement_count: usize,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            sql: sql.into(),
            size_bytes,
            statement_count,
            duration,
            success: false,
            error: Some(error.into()),
            recorded_at: Utc::now(),
        }
    }
}

/// Aggregate view over the records of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectorStats {
    /// Number of physical batches recorded
    pub batches: usize,
    /// How many of them failed
    pub failures: usize,
    /// Total logical statements across all records
    pub statements: usize,
    /// Total serialized bytes across all records
    pub total_bytes: usize,
    /// Summed execution duration
    pub total_duration: Duration,
}

impl CollectorStats {
    /// Compute stats over a record slice.
    pub fn from_records(records: &[QueryRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.batches += 1;
            if !record.success {
                stats.failures += 1;
            }
            stats.statements += record.statement_count;
            stats.total_bytes += record.size_bytes;
            stats.total_duration += record.duration;
        }
        stats
    }

    /// Mean serialized size of a recorded batch.
    pub fn mean_batch_bytes(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.batches as f64
        }
    }
}

/// Passive sink for per-batch execution metadata. Append-only; records are
/// never merged or rewritten.
pub trait QueryCollector {
    /// Append one record.
    fn record(&mut self, record: QueryRecord);

    /// All records, in append order.
    fn all(&self) -> &[QueryRecord];

    /// Aggregate counts/averages over everything recorded so far.
    fn stats(&self) -> CollectorStats {
        CollectorStats::from_records(self.all())
    }
}

/// In-memory collector backed by a `Vec`. Useful for dry runs and tests,
/// where the point is inspecting what ran (or would have run).
#[derive(Debug, Default)]
pub struct MemoryCollector {
    records: Vec<QueryRecord>,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl QueryCollector for MemoryCollector {
    fn record(&mut self, record: QueryRecord) {
        self.records.push(record);
    }

    fn all(&self) -> &[QueryRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_collector_appends_in_order() {
        let mut collector = MemoryCollector::new();
        collector.record(QueryRecord::success("SELECT 1", 8, 1, Duration::ZERO));
        collector.record(QueryRecord::failure(
            "BAD SQL",
            7,
            1,
            Duration::ZERO,
            "syntax error",
        ));

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.all()[0].sql, "SELECT 1");
        assert!(collector.all()[0].success);
        assert_eq!(collector.all()[1].error.as_deref(), Some("syntax error"));
    }

    #[test]
    fn test_stats_aggregation() {
        let mut collector = MemoryCollector::new();
        collector.record(QueryRecord::success(
            "A",
            100,
            3,
            Duration::from_millis(10),
        ));
        collector.record(QueryRecord::success(
            "B",
            300,
            2,
            Duration::from_millis(30),
        ));
        collector.record(QueryRecord::failure(
            "C",
            50,
            1,
            Duration::from_millis(5),
            "boom",
        ));

        let stats = collector.stats();
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.statements, 6);
        assert_eq!(stats.total_bytes, 450);
        assert_eq!(stats.total_duration, Duration::from_millis(45));
        assert_eq!(stats.mean_batch_bytes(), 150.0);
    }

    #[test]
    fn test_empty_stats() {
        let collector = MemoryCollector::new();
        let stats = collector.stats();

        assert_eq!(stats, CollectorStats::default());
        assert_eq!(stats.mean_batch_bytes(), 0.0);
    }
}
