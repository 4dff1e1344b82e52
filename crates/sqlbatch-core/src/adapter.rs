//! Adapter traits for execution backends
//!
//! An adapter is the sole integration point between the batching engine and
//! a database. The only required method is `execute`; the transaction and
//! savepoint methods form an optional capability set with no-op defaults, so
//! backends without savepoint support (or without transactions at all) plug
//! in unchanged. The engine tolerates the no-ops; it only loses
//! partial-batch rollback granularity.

use crate::{Result, Row};
use async_trait::async_trait;

/// A synchronous execution backend.
pub trait SqlAdapter {
    /// Execute a SQL string and return result rows (empty for non-SELECT).
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// The backend's own query size ceiling, if it has one.
    fn max_query_size(&self) -> Option<usize> {
        None
    }

    /// Begin a transaction.
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// Commit the current transaction.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Roll back the current transaction.
    fn rollback(&mut self) -> Result<()> {
        Ok(())
    }

    /// Create a named savepoint in the current transaction.
    fn create_savepoint(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Roll back to a previously created savepoint.
    fn rollback_to_savepoint(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Release a previously created savepoint.
    fn release_savepoint(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Close the backend connection.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// An asynchronous execution backend.
///
/// Same surface as [`SqlAdapter`]; `execute` and the transaction control
/// calls are the suspension points. Receivers are `&self` so one adapter can
/// back concurrent runs when the implementation allows it.
#[async_trait]
pub trait AsyncSqlAdapter: Send + Sync {
    /// Execute a SQL string and return result rows (empty for non-SELECT).
    async fn execute(&self, sql: &str) -> Result<Vec<Row>>;

    /// The backend's own query size ceiling, if it has one.
    fn max_query_size(&self) -> Option<usize> {
        None
    }

    /// Begin a transaction.
    async fn begin(&self) -> Result<()> {
        Ok(())
    }

    /// Commit the current transaction.
    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    /// Roll back the current transaction.
    async fn rollback(&self) -> Result<()> {
        Ok(())
    }

    /// Create a named savepoint in the current transaction.
    async fn create_savepoint(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Roll back to a previously created savepoint.
    async fn rollback_to_savepoint(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Release a previously created savepoint.
    async fn release_savepoint(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Close the backend connection.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
