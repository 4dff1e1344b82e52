//! Closure-backed adapters
//!
//! These exist so a caller holding any database handle can participate
//! without writing a trait impl: wrap the execute call in a closure and hand
//! it over. Transaction and savepoint calls keep their no-op defaults, so a
//! generic adapter gives up partial-batch rollback.

use futures::future::BoxFuture;
use sqlbatch_core::{AsyncSqlAdapter, Result, Row, SqlAdapter};

type ExecuteFn = Box<dyn FnMut(&str) -> Result<Vec<Row>> + Send>;
type CloseFn = Box<dyn FnMut() -> Result<()> + Send>;
type AsyncExecuteFn = Box<dyn Fn(String) -> BoxFuture<'static, Result<Vec<Row>>> + Send + Sync>;

/// Synchronous adapter built from an execute closure.
pub struct GenericAdapter {
    execute_fn: ExecuteFn,
    close_fn: Option<CloseFn>,
    max_query_size: Option<usize>,
}

impl GenericAdapter {
    pub fn new<F>(execute_fn: F) -> Self
    where
        F: FnMut(&str) -> Result<Vec<Row>> + Send + 'static,
    {
        Self {
            execute_fn: Box::new(execute_fn),
            close_fn: None,
            max_query_size: None,
        }
    }

    /// Advertise the backend's query size ceiling.
    pub fn with_max_query_size(mut self, bytes: usize) -> Self {
        self.max_query_size = Some(bytes);
        self
    }

    /// Run this closure when the engine closes the adapter.
    pub fn with_close<F>(mut self, close_fn: F) -> Self
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        self.close_fn = Some(Box::new(close_fn));
        self
    }
}

impl SqlAdapter for GenericAdapter {
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>> {
        tracing::trace!(bytes = sql.len(), "generic adapter execute");
        (self.execute_fn)(sql)
    }

    fn max_query_size(&self) -> Option<usize> {
        self.max_query_size
    }

    fn close(&mut self) -> Result<()> {
        match self.close_fn.as_mut() {
            Some(close) => close(),
            None => Ok(()),
        }
    }
}

/// Asynchronous adapter built from an execute closure returning a boxed
/// future.
pub struct GenericAsyncAdapter {
    execute_fn: AsyncExecuteFn,
    max_query_size: Option<usize>,
}

impl GenericAsyncAdapter {
    pub fn new<F>(execute_fn: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, Result<Vec<Row>>> + Send + Sync + 'static,
    {
        Self {
            execute_fn: Box::new(execute_fn),
            max_query_size: None,
        }
    }

    /// Advertise the backend's query size ceiling.
    pub fn with_max_query_size(mut self, bytes: usize) -> Self {
        self.max_query_size = Some(bytes);
        self
    }
}

#[async_trait::async_trait]
impl AsyncSqlAdapter for GenericAsyncAdapter {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        tracing::trace!(bytes = sql.len(), "generic adapter execute");
        (self.execute_fn)(sql.to_string()).await
    }

    fn max_query_size(&self) -> Option<usize> {
        self.max_query_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlbatch_core::{BatchError, Value};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_generic_adapter_delegates_to_closure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut adapter = GenericAdapter::new(move |sql| {
            sink.lock().unwrap().push(sql.to_string());
            Ok(vec![vec![Value::from(1i64)]])
        })
        .with_max_query_size(512);

        let rows = adapter.execute("SELECT 1;").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(adapter.max_query_size(), Some(512));
        assert_eq!(seen.lock().unwrap().as_slice(), &["SELECT 1;".to_string()]);
    }

    #[test]
    fn test_generic_adapter_propagates_errors() {
        let mut adapter =
            GenericAdapter::new(|_| Err(BatchError::Adapter("connection lost".to_string())));
        assert!(adapter.execute("SELECT 1;").is_err());
    }

    #[test]
    fn test_close_hook_runs() {
        let closed = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&closed);
        let mut adapter = GenericAdapter::new(|_| Ok(Vec::new())).with_close(move || {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        adapter.close().unwrap();
        assert!(*closed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_generic_async_adapter_delegates() {
        let adapter = GenericAsyncAdapter::new(|sql| {
            Box::pin(async move {
                assert_eq!(sql, "SELECT 2;");
                Ok(Vec::new())
            })
        });

        assert!(adapter.execute("SELECT 2;").await.is_ok());
        assert_eq!(adapter.max_query_size(), None);
    }
}
