//! Batch planning
//!
//! Planning is pure: given the statements and a config it produces the exact
//! batch partitioning, with no I/O. Both batchers execute the same plan,
//! which is also what makes dry-run reporting identical to a live run.

use crate::{ColumnAwareSizer, InsertMerger, MergedStatement};
use sqlbatch_core::{detect_column_count, BatchConfig};

/// One planned physical batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedBatch {
    pub sql: String,
    pub statement_count: usize,
    pub size_bytes: usize,
}

/// Accumulator for the batch under construction.
#[derive(Default)]
struct Accumulator {
    lines: Vec<String>,
    statement_count: usize,
    size: usize,
}

impl Accumulator {
    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Size this unit would add, including the joining newline.
    fn added_size(&self, text: &str) -> usize {
        if self.is_empty() {
            text.len()
        } else {
            text.len() + 1
        }
    }

    fn push(&mut self, text: String, statement_count: usize) {
        self.size += self.added_size(&text);
        self.lines.push(text);
        self.statement_count += statement_count;
    }

    fn flush(&mut self) -> Option<PlannedBatch> {
        if self.is_empty() {
            return None;
        }
        let batch = PlannedBatch {
            sql: self.lines.join("\n"),
            statement_count: self.statement_count,
            size_bytes: self.size,
        };
        self.lines.clear();
        self.statement_count = 0;
        self.size = 0;
        Some(batch)
    }
}

/// Append the configured delimiter when the statement does not already end
/// with it.
fn terminated(sql: &str, delimiter: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.ends_with(delimiter) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{delimiter}")
    }
}

/// Partition statements into byte-bounded batches.
///
/// Every input statement lands in exactly one batch, in input order. A
/// statement larger than its effective budget becomes a singleton batch;
/// it is never dropped and never split.
pub(crate) fn plan_batches(statements: &[String], config: &BatchConfig) -> Vec<PlannedBatch> {
    let sizer = ColumnAwareSizer::from_config(config);

    let units: Vec<MergedStatement> = if config.merge_inserts {
        // the delimiter appended below must still fit a full run
        let mut merger =
            InsertMerger::new(config.max_bytes).with_reserve(config.delimiter.len());
        if let Some(sizer) = sizer.clone() {
            merger = merger.with_sizer(sizer);
        }
        merger.merge(statements)
    } else {
        statements
            .iter()
            .map(|sql| MergedStatement {
                sql: sql.clone(),
                statement_count: 1,
            })
            .collect()
    };

    let mut batches = Vec::new();
    let mut current = Accumulator::default();

    for unit in units {
        let text = terminated(&unit.sql, &config.delimiter);
        let effective = match &sizer {
            Some(sizer) => sizer.effective_budget(detect_column_count(&unit.sql)),
            None => config.max_bytes,
        };

        if text.len() > effective {
            // oversized: flush whatever is pending, then emit it alone
            batches.extend(current.flush());
            tracing::debug!(
                bytes = text.len(),
                budget = effective,
                "statement exceeds budget, executing alone"
            );
            batches.push(PlannedBatch {
                size_bytes: text.len(),
                sql: text,
                statement_count: unit.statement_count,
            });
            continue;
        }

        if current.size + current.added_size(&text) > effective {
            batches.extend(current.flush());
        }
        current.push(text, unit.statement_count);
    }

    batches.extend(current.flush());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stmts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_batch_when_everything_fits() {
        let config = BatchConfig::new().with_max_bytes(1000);
        let plan = plan_batches(&stmts(&["SELECT 1", "SELECT 2"]), &config);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].sql, "SELECT 1;\nSELECT 2;");
        assert_eq!(plan[0].statement_count, 2);
        assert_eq!(plan[0].size_bytes, plan[0].sql.len());
    }

    #[test]
    fn test_splits_on_budget() {
        // each terminated statement is 10 bytes
        let config = BatchConfig::new().with_max_bytes(21);
        let plan = plan_batches(
            &stmts(&["SELECT 01", "SELECT 02", "SELECT 03", "SELECT 04"]),
            &config,
        );

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].sql, "SELECT 01;\nSELECT 02;");
        assert_eq!(plan[1].sql, "SELECT 03;\nSELECT 04;");
    }

    #[test]
    fn test_oversized_statement_is_a_singleton_batch() {
        let config = BatchConfig::new().with_max_bytes(20);
        let long = format!("SELECT '{}'", "x".repeat(40));
        let plan = plan_batches(&stmts(&["SELECT 1", &long, "SELECT 2"]), &config);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].sql, "SELECT 1;");
        assert!(plan[1].sql.starts_with("SELECT 'xxx"));
        assert_eq!(plan[2].sql, "SELECT 2;");
    }

    #[test]
    fn test_existing_delimiter_not_doubled() {
        let config = BatchConfig::new();
        let plan = plan_batches(&stmts(&["SELECT 1;", "SELECT 2"]), &config);

        assert_eq!(plan[0].sql, "SELECT 1;\nSELECT 2;");
    }

    #[test]
    fn test_custom_delimiter() {
        let config = BatchConfig::new().with_delimiter("$$");
        let plan = plan_batches(&stmts(&["SELECT 1", "SELECT 2"]), &config);

        assert_eq!(plan[0].sql, "SELECT 1$$\nSELECT 2$$");
    }

    #[test]
    fn test_empty_input_plans_nothing() {
        let config = BatchConfig::new();
        assert!(plan_batches(&[], &config).is_empty());
    }

    #[test]
    fn test_merge_then_batch() {
        let config = BatchConfig::new().with_max_bytes(1000).with_merge_inserts(true);
        let plan = plan_batches(
            &stmts(&[
                "INSERT INTO t (a) VALUES (1)",
                "INSERT INTO t (a) VALUES (2)",
                "UPDATE t SET a = 0",
            ]),
            &config,
        );

        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan[0].sql,
            "INSERT INTO t (a) VALUES (1), (2);\nUPDATE t SET a = 0;"
        );
        assert_eq!(plan[0].statement_count, 3);
    }

    #[test]
    fn test_merged_batches_stay_within_budget_after_delimiter() {
        // a merge run filled to exactly max_bytes would overflow the budget
        // once the delimiter lands; the reserve keeps it inside
        let config = BatchConfig::new().with_max_bytes(33).with_merge_inserts(true);
        let plan = plan_batches(
            &stmts(&[
                "INSERT INTO t (a) VALUES (1)",
                "INSERT INTO t (a) VALUES (2)",
            ]),
            &config,
        );

        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|b| b.size_bytes <= 33));
    }

    #[test]
    fn test_column_adjusted_budget_applies() {
        // baseline 200, reference 2, detected 4 -> effective 100
        let config = BatchConfig::new()
            .with_max_bytes(200)
            .with_column_adjustment(2)
            .with_adjustment_factors(0.5, 2.0);
        let wide: Vec<String> = (0..4)
            .map(|i| format!("INSERT INTO w (a, b, c, d) VALUES ({i}, {i}, {i}, {i})"))
            .collect();
        let plan = plan_batches(&wide, &config);

        // terminated statements are 47 bytes; only two fit under 100
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|b| b.size_bytes <= 100));
    }
}
