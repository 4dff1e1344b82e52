//! Ready-made execution backends for the batching engine.
//!
//! [`GenericAdapter`] and [`GenericAsyncAdapter`] wrap a closure, which is
//! usually all an application needs to hook up a driver it already holds.
//! [`MemoryAdapter`] records every call it receives and is the workhorse of
//! the engine's own tests.

mod generic;
mod memory;

pub use generic::{GenericAdapter, GenericAsyncAdapter};
pub use memory::{AdapterCall, MemoryAdapter};
