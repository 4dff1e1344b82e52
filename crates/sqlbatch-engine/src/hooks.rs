//! Execution lifecycle hooks
//!
//! Hooks are passive observers around each physical batch: they see the
//! batch before the savepoint is taken, before and after the adapter call,
//! and on failure after the savepoint rollback. All methods have no-op
//! defaults, so an implementor overrides only the stages it cares about.
//! Hooks cannot fail the run; anything fallible belongs in the adapter.

use sqlbatch_core::BatchError;
use std::time::Duration;

/// Borrowed view of the batch a hook is observing.
#[derive(Debug, Clone, Copy)]
pub struct BatchContext<'a> {
    /// Serialized SQL of the batch
    pub sql: &'a str,
    /// Serialized byte size
    pub size_bytes: usize,
    /// Logical statements the batch represents
    pub statement_count: usize,
    /// Zero-based position of the batch within the run
    pub batch_index: usize,
}

/// Observer invoked around each physical batch execution.
///
/// Receivers are `&self` so one hook can serve concurrent runs; implementors
/// needing state use interior mutability. Hooks are skipped in dry-run mode,
/// where nothing executes.
pub trait BatchHook: Send + Sync {
    /// Invoked when the batch begins, before any savepoint is created.
    fn before_batch(&self, _batch: &BatchContext<'_>) {}

    /// Invoked immediately before the adapter executes the batch.
    fn before_execute(&self, _batch: &BatchContext<'_>) {}

    /// Invoked after a successful execution, with the measured duration.
    fn after_execute(&self, _batch: &BatchContext<'_>, _duration: Duration) {}

    /// Invoked when the batch completes, after its savepoint is released.
    fn after_batch(&self, _batch: &BatchContext<'_>) {}

    /// Invoked when execution fails, after any rollback to the batch's
    /// savepoint and before the error propagates.
    fn on_error(&self, _batch: &BatchContext<'_>, _error: &BatchError) {}
}
