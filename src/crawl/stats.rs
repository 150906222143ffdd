// src/crawl/stats.rs
// =============================================================================
// Run statistics, shared by the scheduler and every probe.
//
// Plain atomic counters: nothing here influences control flow, they only
// feed the end-of-run summary (and let tests see what happened).
// =============================================================================

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct ScanStats {
    probes_started: AtomicU64,
    probes_finished: AtomicU64,
    probes_panicked: AtomicU64,
    domains_pushed: AtomicU64,
    duplicates_skipped: AtomicU64,
    buckets_found: AtomicU64,
    failures: AtomicU64,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

/// Plain copy of the counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub probes_started: u64,
    pub probes_finished: u64,
    pub probes_panicked: u64,
    pub domains_pushed: u64,
    pub duplicates_skipped: u64,
    pub buckets_found: u64,
    pub failures: u64,
    pub peak_concurrent_probes: usize,
}

/// Marks one probe as running; dropping it marks the probe finished
#[derive(Debug)]
pub struct ActiveProbe<'a> {
    stats: &'a ScanStats,
}

impl Drop for ActiveProbe<'_> {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
        self.stats.probes_finished.fetch_add(1, Ordering::Relaxed);
    }
}

impl ScanStats {
    pub fn probe_started(&self) -> ActiveProbe<'_> {
        self.probes_started.fetch_add(1, Ordering::Relaxed);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ActiveProbe { stats: self }
    }

    pub fn record_panic(&self) {
        self.probes_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_push(&self) {
        self.domains_pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bucket(&self) {
        self.buckets_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            probes_started: self.probes_started.load(Ordering::Relaxed),
            probes_finished: self.probes_finished.load(Ordering::Relaxed),
            probes_panicked: self.probes_panicked.load(Ordering::Relaxed),
            domains_pushed: self.domains_pushed.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            buckets_found: self.buckets_found.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            peak_concurrent_probes: self.peak_active.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_guard_tracks_peak() {
        let stats = ScanStats::default();
        {
            let _a = stats.probe_started();
            let _b = stats.probe_started();
        }
        let _c = stats.probe_started();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.probes_started, 3);
        assert_eq!(snapshot.probes_finished, 2);
        assert_eq!(snapshot.peak_concurrent_probes, 2);
    }
}
