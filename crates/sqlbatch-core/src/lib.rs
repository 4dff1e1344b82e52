//! sqlbatch-core - Core abstractions and types for the sqlbatch workspace
//!
//! This crate provides the fundamental traits and types that the batching
//! engine and the adapters depend on. It defines:
//!
//! - `SqlAdapter` / `AsyncSqlAdapter` - Traits for database execution backends
//! - `BatchConfig` - Batching configuration with fail-fast validation
//! - `ParsedInsert` and the statement sizing helpers
//! - `QueryCollector` - Trait for recording per-batch execution metadata
//! - Common types like `Value`, `Row` and `BatchError`

mod adapter;
mod collector;
mod config;
mod error;
pub mod statement;
mod types;

pub use adapter::*;
pub use collector::*;
pub use config::*;
pub use error::*;
pub use statement::{
    detect_column_count, parse_insert, split_statements, statement_size, InsertSignature,
    ParsedInsert,
};
pub use types::*;
