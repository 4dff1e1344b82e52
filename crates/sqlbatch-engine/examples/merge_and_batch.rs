//! Batches a small INSERT-heavy workload through a callback adapter and
//! prints what actually went over the wire.
//!
//! Run with `RUST_LOG=debug` to see the planning decisions.

use anyhow::Result;
use sqlbatch_adapters::GenericAdapter;
use sqlbatch_core::{BatchConfig, MemoryCollector, QueryCollector};
use sqlbatch_engine::Batcher;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let statements: Vec<String> = (0..10)
        .map(|i| format!("INSERT INTO events (id, kind) VALUES ({i}, 'demo')"))
        .chain(std::iter::once(
            "UPDATE events SET kind = 'done' WHERE id = 0".to_string(),
        ))
        .collect();

    let config = BatchConfig::new()
        .with_max_bytes(256)
        .with_merge_inserts(true);
    let batcher = Batcher::new(config)?;

    let mut adapter = GenericAdapter::new(|sql| {
        println!("-- executing {} bytes --\n{sql}\n", sql.len());
        Ok(Vec::new())
    });

    let mut collector = MemoryCollector::new();
    let report = batcher.process(&statements, &mut adapter, Some(&mut collector))?;

    let stats = collector.stats();
    println!(
        "{} statements in {} batches, {} bytes, mean batch {:.0} bytes",
        report.statements,
        report.batches,
        report.total_bytes,
        stats.mean_batch_bytes()
    );
    Ok(())
}
