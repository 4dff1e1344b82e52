//! sqlbatch-engine - Byte-bounded SQL batching and INSERT merging
//!
//! The engine partitions an ordered stream of SQL statements into batches
//! that fit a byte budget, optionally merging compatible INSERT statements
//! into multi-row INSERTs first, and drives execution through an adapter
//! from `sqlbatch-core`:
//!
//! - [`InsertMerger`] - combines compatible INSERTs without reordering
//! - [`ColumnAwareSizer`] - adapts the byte budget to table width
//! - [`Batcher`] / [`AsyncBatcher`] - orchestrate planning, execution,
//!   transactions/savepoints and collection
//! - [`BatchHook`] - lifecycle observers around each executed batch
//! - [`RetryPolicy`] - backoff helper for callers that wrap adapter I/O

mod async_batcher;
mod batcher;
mod hooks;
mod merger;
mod planner;
mod retry;
mod sizer;


pub use async_batcher::AsyncBatcher;
pub use batcher::{Batcher, CancelHandle, ProcessReport};
pub use hooks::{BatchContext, BatchHook};
pub use merger::{InsertMerger, MergedStatement};
pub use retry::RetryPolicy;
pub use sizer::ColumnAwareSizer;
