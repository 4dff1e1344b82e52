//! In-memory recording adapter
//!
//! Records every call the engine makes, in order, and can inject failures.
//! Interior mutability lets the same instance serve both the sync trait and
//! the `&self`-based async trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlbatch_core::{AsyncSqlAdapter, BatchError, Result, Row, SqlAdapter};

/// One call the adapter received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    Execute(String),
    Begin,
    Commit,
    Rollback,
    CreateSavepoint(String),
    RollbackToSavepoint(String),
    ReleaseSavepoint(String),
    Close,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<AdapterCall>,
    fail_on: Option<String>,
    fail_next: u32,
}

/// Recording adapter for tests and dry-run verification.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    state: Mutex<State>,
    max_query_size: Option<usize>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a query size ceiling.
    pub fn with_max_query_size(mut self, bytes: usize) -> Self {
        self.max_query_size = Some(bytes);
        self
    }

    /// Fail any execute whose SQL contains `pattern`.
    pub fn fail_when_contains(self, pattern: impl Into<String>) -> Self {
        self.state.lock().fail_on = Some(pattern.into());
        self
    }

    /// Fail the next `n` executes, then recover.
    pub fn fail_next(&self, n: u32) {
        self.state.lock().fail_next = n;
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.state.lock().calls.clone()
    }

    /// Only the executed SQL strings, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                AdapterCall::Execute(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    fn run(&self, sql: &str) -> Result<Vec<Row>> {
        let mut state = self.state.lock();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            state
                .calls
                .push(AdapterCall::Execute(sql.to_string()));
            return Err(BatchError::Adapter("injected transient failure".to_string()));
        }
        if let Some(pattern) = state.fail_on.clone() {
            if sql.contains(pattern.as_str()) {
                state.calls.push(AdapterCall::Execute(sql.to_string()));
                return Err(BatchError::Adapter(format!(
                    "injected failure on '{pattern}'"
                )));
            }
        }
        state.calls.push(AdapterCall::Execute(sql.to_string()));
        Ok(Vec::new())
    }

    fn note(&self, call: AdapterCall) {
        self.state.lock().calls.push(call);
    }
}

impl SqlAdapter for MemoryAdapter {
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.run(sql)
    }

    fn max_query_size(&self) -> Option<usize> {
        self.max_query_size
    }

    fn begin(&mut self) -> Result<()> {
        self.note(AdapterCall::Begin);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.note(AdapterCall::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.note(AdapterCall::Rollback);
        Ok(())
    }

    fn create_savepoint(&mut self, name: &str) -> Result<()> {
        self.note(AdapterCall::CreateSavepoint(name.to_string()));
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<()> {
        self.note(AdapterCall::RollbackToSavepoint(name.to_string()));
        Ok(())
    }

    fn release_savepoint(&mut self, name: &str) -> Result<()> {
        self.note(AdapterCall::ReleaseSavepoint(name.to_string()));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.note(AdapterCall::Close);
        Ok(())
    }
}

#[async_trait]
impl AsyncSqlAdapter for MemoryAdapter {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        self.run(sql)
    }

    fn max_query_size(&self) -> Option<usize> {
        self.max_query_size
    }

    async fn begin(&self) -> Result<()> {
        self.note(AdapterCall::Begin);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.note(AdapterCall::Commit);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.note(AdapterCall::Rollback);
        Ok(())
    }

    async fn create_savepoint(&self, name: &str) -> Result<()> {
        self.note(AdapterCall::CreateSavepoint(name.to_string()));
        Ok(())
    }

    async fn rollback_to_savepoint(&self, name: &str) -> Result<()> {
        self.note(AdapterCall::RollbackToSavepoint(name.to_string()));
        Ok(())
    }

    async fn release_savepoint(&self, name: &str) -> Result<()> {
        self.note(AdapterCall::ReleaseSavepoint(name.to_string()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.note(AdapterCall::Close);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_records_calls_in_order() {
        let mut adapter = MemoryAdapter::new();

        SqlAdapter::begin(&mut adapter).unwrap();
        SqlAdapter::execute(&mut adapter, "SELECT 1;").unwrap();
        SqlAdapter::commit(&mut adapter).unwrap();

        assert_eq!(
            adapter.calls(),
            vec![
                AdapterCall::Begin,
                AdapterCall::Execute("SELECT 1;".to_string()),
                AdapterCall::Commit,
            ]
        );
        assert_eq!(adapter.executed(), vec!["SELECT 1;".to_string()]);
    }

    #[test]
    fn test_fail_when_contains() {
        let mut adapter = MemoryAdapter::new().fail_when_contains("boom");

        assert!(SqlAdapter::execute(&mut adapter, "SELECT 1;").is_ok());
        assert!(SqlAdapter::execute(&mut adapter, "SELECT boom;").is_err());
        // the failing call is still recorded
        assert_eq!(adapter.executed().len(), 2);
    }

    #[test]
    fn test_fail_next_recovers() {
        let mut adapter = MemoryAdapter::new();
        adapter.fail_next(2);

        assert!(SqlAdapter::execute(&mut adapter, "A;").is_err());
        assert!(SqlAdapter::execute(&mut adapter, "B;").is_err());
        assert!(SqlAdapter::execute(&mut adapter, "C;").is_ok());
    }

    #[tokio::test]
    async fn test_async_surface_shares_state() {
        let adapter = MemoryAdapter::new();

        AsyncSqlAdapter::execute(&adapter, "SELECT 1;").await.unwrap();
        AsyncSqlAdapter::create_savepoint(&adapter, "sp").await.unwrap();

        assert_eq!(
            adapter.calls(),
            vec![
                AdapterCall::Execute("SELECT 1;".to_string()),
                AdapterCall::CreateSavepoint("sp".to_string()),
            ]
        );
    }
}
