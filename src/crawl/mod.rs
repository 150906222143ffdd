// src/crawl/mod.rs
// =============================================================================
// The discovery engine.
//
// Submodules:
// - frontier: queue of domains waiting for a probe (with optional seen-set)
// - scheduler: pops domains, bounds concurrency, detects when we're done
// - results: thread-safe list of confirmed buckets
// - stats: counters for the end-of-run summary
//
// Everything shared between probes is created once per scan inside
// Scanner::run and passed down explicitly; there are no globals.
// =============================================================================

mod frontier;
mod results;
mod scheduler;
mod stats;

pub use frontier::Frontier;
pub use results::{BucketResult, ResultAggregator};
pub use scheduler::{ScanReport, Scanner};
pub use stats::{ScanStats, StatsSnapshot};
