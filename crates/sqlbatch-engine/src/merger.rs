//! INSERT statement merging
//!
//! Consecutive merge-compatible INSERTs (same table, same column list under
//! normalization) are combined into one multi-row INSERT. Runs are bounded
//! by the nearest incompatible statement: a non-INSERT, or an INSERT with a
//! different signature, closes the current run and passes through at its
//! original position. Merging therefore never reorders statements.

use crate::ColumnAwareSizer;
use sqlbatch_core::statement::{parse_insert, InsertSignature, ParsedInsert};

/// One output unit of a merge pass: either a pass-through statement or a
/// combined multi-row INSERT, with the number of input statements it
/// represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedStatement {
    /// The output SQL text
    pub sql: String,
    /// How many input statements this unit absorbed (1 for pass-through)
    pub statement_count: usize,
}

impl MergedStatement {
    fn passthrough(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            statement_count: 1,
        }
    }
}

/// Merges compatible INSERT statements under a byte budget.
#[derive(Debug)]
pub struct InsertMerger {
    max_bytes: usize,
    sizer: Option<ColumnAwareSizer>,
    reserve: usize,
}

/// An open merge run: compatible INSERTs being combined into one statement.
struct Run {
    signature: InsertSignature,
    prefix: String,
    tuples: Vec<String>,
    statement_count: usize,
    // serialized length of the merged statement so far
    len: usize,
    budget: usize,
    // exact original text, emitted when the run stays a singleton
    first_sql: String,
}

impl Run {
    fn start(sql: &str, parsed: &ParsedInsert, budget: usize) -> Self {
        let prefix = parsed.insert_prefix();
        let tuples: Vec<String> = parsed.values().to_vec();
        let len = prefix.len() + joined_len(&tuples);
        Self {
            signature: parsed.signature(),
            prefix,
            tuples,
            statement_count: 1,
            len,
            budget,
            first_sql: sql.to_string(),
        }
    }

    /// Bytes appending this statement's tuples would add.
    fn added_len(parsed: &ParsedInsert) -> usize {
        parsed.values().iter().map(|t| t.len() + 2).sum()
    }

    fn fits(&self, parsed: &ParsedInsert) -> bool {
        self.len + Self::added_len(parsed) <= self.budget
    }

    fn append(&mut self, parsed: &ParsedInsert) {
        self.len += Self::added_len(parsed);
        self.tuples.extend(parsed.values().iter().cloned());
        self.statement_count += 1;
    }

    fn close(self) -> MergedStatement {
        if self.statement_count == 1 {
            // nothing was merged; keep the caller's exact text
            return MergedStatement {
                sql: self.first_sql,
                statement_count: 1,
            };
        }
        tracing::debug!(
            table = self.signature.table(),
            statements = self.statement_count,
            rows = self.tuples.len(),
            bytes = self.len,
            "closing merge run"
        );
        MergedStatement {
            sql: format!("{}{}", self.prefix, self.tuples.join(", ")),
            statement_count: self.statement_count,
        }
    }
}

fn joined_len(tuples: &[String]) -> usize {
    let sep = 2 * tuples.len().saturating_sub(1);
    tuples.iter().map(String::len).sum::<usize>() + sep
}

impl InsertMerger {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            sizer: None,
            reserve: 0,
        }
    }

    /// Use a column-aware budget: each run's budget reflects its own
    /// detected column count.
    pub fn with_sizer(mut self, sizer: ColumnAwareSizer) -> Self {
        self.sizer = Some(sizer);
        self
    }

    /// Hold back bytes from every run budget, for trailing text the caller
    /// appends to each merged statement (typically the delimiter).
    pub fn with_reserve(mut self, bytes: usize) -> Self {
        self.reserve = bytes;
        self
    }

    fn budget_for(&self, parsed: &ParsedInsert) -> usize {
        let budget = match &self.sizer {
            Some(sizer) => sizer.effective_budget(parsed.column_count()),
            None => self.max_bytes,
        };
        budget.saturating_sub(self.reserve)
    }

    /// Merge an ordered statement sequence.
    ///
    /// The output corresponds to a valid linearization of the input: every
    /// pass-through statement keeps its position relative to the merge runs
    /// around it, and no INSERT is merged past an intervening incompatible
    /// statement. Input statements are atomic - a multi-tuple INSERT either
    /// joins a run whole or starts its own.
    pub fn merge(&self, statements: &[String]) -> Vec<MergedStatement> {
        let mut output = Vec::new();
        let mut run: Option<Run> = None;

        for sql in statements {
            let parsed = match parse_insert(sql) {
                Some(parsed) => parsed,
                None => {
                    // incompatible: close the run, pass through in place
                    if let Some(open) = run.take() {
                        output.push(open.close());
                    }
                    output.push(MergedStatement::passthrough(sql));
                    continue;
                }
            };

            if let Some(mut open) = run.take() {
                if open.signature == parsed.signature() && open.fits(&parsed) {
                    open.append(&parsed);
                    run = Some(open);
                    continue;
                }
                output.push(open.close());
            }

            let budget = self.budget_for(&parsed);
            let fresh = Run::start(sql, &parsed, budget);
            if fresh.len > budget {
                // oversized on its own: emit untouched, never truncate
                output.push(fresh.close());
            } else {
                run = Some(fresh);
            }
        }

        if let Some(open) = run.take() {
            output.push(open.close());
        }

        output
    }
}
