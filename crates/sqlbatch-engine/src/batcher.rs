//! Synchronous batcher
//!
//! The batcher owns the control flow of one run: plan the batches, walk them
//! in order, wrap each in a savepoint when asked, and stop at the first
//! execution failure after rolling that batch back.

use crate::hooks::{BatchContext, BatchHook};
use crate::planner::{plan_batches, PlannedBatch};
use sqlbatch_core::{
    BatchConfig, BatchError, QueryCollector, QueryRecord, Result, SqlAdapter,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Cooperative cancellation flag, checked between batches. Cancelling never
/// interrupts a batch that is already executing.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The run stops before its next batch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Summary of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Logical statements handed in (merged INSERT rows count individually)
    pub statements: usize,
    /// Physical batches planned and executed
    pub batches: usize,
    /// Total serialized bytes across all batches
    pub total_bytes: usize,
}

/// Byte-bounded SQL batch executor over a [`SqlAdapter`].
#[derive(Clone)]
pub struct Batcher {
    config: BatchConfig,
    cancel: Option<CancelHandle>,
    hooks: Vec<Arc<dyn BatchHook>>,
}

impl std::fmt::Debug for Batcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batcher")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Batcher {
    /// Create a batcher, rejecting invalid configuration up front.
    pub fn new(config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
            hooks: Vec::new(),
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Attach a cancellation handle, checked between batches.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    /// Register a lifecycle hook, invoked around each executed batch in
    /// registration order.
    pub fn with_hook(mut self, hook: impl BatchHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Plan and execute `statements` against `adapter`.
    ///
    /// Every statement lands in exactly one batch, in input order. In
    /// dry-run mode the plan is identical but nothing reaches the adapter;
    /// records carry a zero duration.
    pub fn process<A>(
        &self,
        statements: &[String],
        adapter: &mut A,
        mut collector: Option<&mut dyn QueryCollector>,
    ) -> Result<ProcessReport>
    where
        A: SqlAdapter + ?Sized,
    {
        let batches = plan_batches(statements, &self.config);
        tracing::debug!(
            statements = statements.len(),
            batches = batches.len(),
            dry_run = self.config.dry_run,
            "planned run"
        );

        let mut report = ProcessReport::default();

        if self.config.dry_run {
            for batch in batches {
                tally(&mut report, &batch);
                if let Some(collector) = collector.as_deref_mut() {
                    collector.record(QueryRecord::success(
                        batch.sql,
                        batch.size_bytes,
                        batch.statement_count,
                        Duration::ZERO,
                    ));
                }
            }
            return Ok(report);
        }

        let in_transaction = self.config.use_transaction;
        if in_transaction {
            adapter
                .begin()
                .map_err(|e| BatchError::Transaction(e.to_string()))?;
        }

        for (index, batch) in batches.into_iter().enumerate() {
            if let Some(cancel) = &self.cancel {
                if cancel.is_cancelled() {
                    tracing::info!(batches_done = report.batches, "run cancelled");
                    if in_transaction {
                        adapter
                            .rollback()
                            .map_err(|e| BatchError::Transaction(e.to_string()))?;
                    }
                    return Err(BatchError::Cancelled);
                }
            }

            match self.execute_batch(&batch, index, adapter, collector.as_deref_mut()) {
                Ok(()) => tally(&mut report, &batch),
                Err(err) => {
                    if in_transaction {
                        adapter
                            .rollback()
                            .map_err(|e| BatchError::Transaction(e.to_string()))?;
                    }
                    return Err(err);
                }
            }
        }

        if in_transaction {
            adapter
                .commit()
                .map_err(|e| BatchError::Transaction(e.to_string()))?;
        }

        tracing::info!(
            statements = report.statements,
            batches = report.batches,
            bytes = report.total_bytes,
            "run complete"
        );
        Ok(report)
    }

    fn execute_batch<A>(
        &self,
        batch: &PlannedBatch,
        batch_index: usize,
        adapter: &mut A,
        collector: Option<&mut (dyn QueryCollector + '_)>,
    ) -> Result<()>
    where
        A: SqlAdapter + ?Sized,
    {
        let context = BatchContext {
            sql: &batch.sql,
            size_bytes: batch.size_bytes,
            statement_count: batch.statement_count,
            batch_index,
        };
        for hook in &self.hooks {
            hook.before_batch(&context);
        }

        let savepoint = if self.config.use_savepoints {
            let name = savepoint_name();
            adapter
                .create_savepoint(&name)
                .map_err(|e| BatchError::Transaction(e.to_string()))?;
            Some(name)
        } else {
            None
        };

        for hook in &self.hooks {
            hook.before_execute(&context);
        }
        let started = Instant::now();
        match adapter.execute(&batch.sql) {
            Ok(_) => {
                let elapsed = started.elapsed();
                for hook in &self.hooks {
                    hook.after_execute(&context, elapsed);
                }
                if let Some(name) = savepoint {
                    adapter
                        .release_savepoint(&name)
                        .map_err(|e| BatchError::Transaction(e.to_string()))?;
                }
                if let Some(collector) = collector {
                    collector.record(QueryRecord::success(
                        batch.sql.clone(),
                        batch.size_bytes,
                        batch.statement_count,
                        elapsed,
                    ));
                }
                for hook in &self.hooks {
                    hook.after_batch(&context);
                }
                Ok(())
            }
            Err(err) => {
                let elapsed = started.elapsed();
                tracing::warn!(
                    bytes = batch.size_bytes,
                    statements = batch.statement_count,
                    error = %err,
                    "batch failed"
                );
                if let Some(name) = savepoint {
                    adapter
                        .rollback_to_savepoint(&name)
                        .map_err(|e| BatchError::Transaction(e.to_string()))?;
                }
                for hook in &self.hooks {
                    hook.on_error(&context, &err);
                }
                if let Some(collector) = collector {
                    collector.record(QueryRecord::failure(
                        batch.sql.clone(),
                        batch.size_bytes,
                        batch.statement_count,
                        elapsed,
                        err.to_string(),
                    ));
                }
                Err(BatchError::execution(batch.sql.clone(), err.to_string()))
            }
        }
    }
}

fn tally(report: &mut ProcessReport, batch: &PlannedBatch) {
    report.statements += batch.statement_count;
    report.batches += 1;
    report.total_bytes += batch.size_bytes;
}

pub(crate) fn savepoint_name() -> String {
    format!("sqlbatch_{}", Uuid::new_v4().simple())
}
