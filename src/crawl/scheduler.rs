// src/crawl/scheduler.rs
// =============================================================================
// The scheduler: turns a list of seed domains into a finished scan.
//
// How it works:
// 1. Seeds go onto the frontier
// 2. While the frontier has entries: pop one, wait for a permit (at most
//    `concurrency` probes run at once), spawn a probe task, keep going
// 3. Frontier empty but probes still running? Wait until one of them
//    finishes OR pushes something new, then look again
// 4. Frontier empty AND no probe running: done
//
// Step 3 is the important one. A probe that is still running can push new
// domains at any moment, so "the queue looks empty" is never enough to
// stop. The JoinSet is our count of outstanding work: it only becomes
// empty once every spawned probe has finished, and a probe finishes only
// after it has pushed everything it found.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use super::{BucketResult, Frontier, ResultAggregator, ScanStats, StatsSnapshot};
use crate::config::ScanConfig;
use crate::error::ConfigError;
use crate::net::{CnameResolver, Fetcher};
use crate::probe::{BucketLocator, Prober};

/// Everything a finished scan produced
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Confirmed buckets, in the order they were found
    pub results: Vec<BucketResult>,
    pub stats: StatsSnapshot,
}

/// Runs scans with a fixed set of network collaborators
pub struct Scanner {
    config: ScanConfig,
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<dyn CnameResolver>,
    locator: Arc<dyn BucketLocator>,
}

impl Scanner {
    /// `locator` decides where each domain's bucket would live
    /// (`S3Locator` for Amazon S3 and S3-compatible providers)
    pub fn new(
        config: ScanConfig,
        fetcher: Arc<dyn Fetcher>,
        resolver: Arc<dyn CnameResolver>,
        locator: Arc<dyn BucketLocator>,
    ) -> Self {
        Self {
            config,
            fetcher,
            resolver,
            locator,
        }
    }

    /// Scans outward from `seeds` until there is nothing left to probe
    ///
    /// Returns an error only for misconfiguration (no seeds, zero
    /// concurrency, bad proxy); probe failures are logged and counted in
    /// the report's stats instead.
    pub async fn run(&self, seeds: Vec<String>) -> Result<ScanReport, ConfigError> {
        self.config.validate()?;

        let seeds: Vec<String> = seeds
            .into_iter()
            .map(|seed| seed.trim().to_string())
            .filter(|seed| !seed.is_empty())
            .collect();

        if seeds.is_empty() {
            return Err(ConfigError::NoSeeds);
        }

        let started = Instant::now();

        // Per-run shared state, handed to every probe through the Prober
        let frontier = Arc::new(Frontier::new(self.config.dedup));
        let results = Arc::new(ResultAggregator::new());
        let stats = Arc::new(ScanStats::default());

        let prober = Arc::new(Prober::new(
            self.config.clone(),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.resolver),
            Arc::clone(&self.locator),
            Arc::clone(&frontier),
            Arc::clone(&results),
            Arc::clone(&stats),
        ));

        info!(
            seeds = seeds.len(),
            concurrency = self.config.concurrency,
            follow_links = self.config.follow_links,
            follow_cnames = self.config.follow_cnames,
            "Starting analysis"
        );

        for seed in seeds {
            frontier.push(seed);
        }

        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let mut probes: JoinSet<()> = JoinSet::new();

        loop {
            reap_finished(&mut probes, &stats);

            if !frontier.is_empty_snapshot() {
                // We're the only consumer, so this never actually waits
                let domain = frontier.pop().await;
                debug!(domain = %domain, queued = frontier.len(), "Dispatching");

                let permit = match Arc::clone(&permits).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("Permit pool closed, stopping dispatch");
                        break;
                    }
                };

                let prober = Arc::clone(&prober);
                probes.spawn(async move {
                    // Dropped when the task ends, however it ends
                    let _permit = permit;
                    prober.probe(&domain).await;
                });
                continue;
            }

            // Nothing queued and nothing running: no one is left to push
            if probes.is_empty() {
                break;
            }

            tokio::select! {
                joined = probes.join_next() => {
                    if let Some(Err(e)) = joined {
                        report_join_error(e, &stats);
                    }
                }
                _ = frontier.wait_for_push() => {}
            }
        }

        // Only non-empty if dispatch was cut short above
        while let Some(joined) = probes.join_next().await {
            if let Err(e) = joined {
                report_join_error(e, &stats);
            }
        }

        let stats = stats.snapshot();
        info!(
            started = stats.probes_started,
            probes = stats.probes_finished,
            panicked = stats.probes_panicked,
            buckets = stats.buckets_found,
            new_domains = stats.domains_pushed,
            duplicates = stats.duplicates_skipped,
            failures = stats.failures,
            peak_concurrency = stats.peak_concurrent_probes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis finished"
        );

        Ok(ScanReport { results: results.all(), stats })
    }
}

// Collects every probe that has already finished without waiting on the
// rest, so handles don't pile up while the frontier keeps the loop busy
fn reap_finished(probes: &mut JoinSet<()>, stats: &ScanStats) -> usize {
    let mut reaped = 0;
    while let Some(joined) = probes.try_join_next() {
        if let Err(e) = joined {
            report_join_error(e, stats);
        }
        reaped += 1;
    }
    reaped
}

// A probe that panicked already gave its permit back (it's dropped while
// the task unwinds); all that's left is to say so.
fn report_join_error(error: JoinError, stats: &ScanStats) {
    if error.is_panic() {
        stats.record_panic();
        warn!(error = %error, "Probe panicked");
    } else {
        debug!(error = %error, "Probe task cancelled");
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is a Semaphore?
//    - A pool of N permits; acquire() waits until one is free
//    - acquire_owned() returns a permit that isn't tied to a borrow, so it
//      can be moved into a spawned task
//    - Dropping the permit puts it back in the pool
//
// 2. What is a JoinSet?
//    - A collection of spawned tasks you can wait on one at a time
//    - join_next() returns the next task to finish (in any order)
//    - If a task panics, join_next() gives back an Err instead of
//      crashing the caller
//
// 3. What does tokio::select! do?
//    - Waits on several futures at once and runs the branch of whichever
//      finishes first; the others are dropped
//    - Here: "a probe finished" OR "something was pushed"
// -----------------------------------------------------------------------------
