// src/probe/mod.rs
// =============================================================================
// Everything that happens to ONE domain once the scheduler hands it over.
//
// Submodules:
// - bucket: is there an open bucket behind this name?
// - links: which hosts does the domain's web page load resources from?
// - alias: which names does the domain CNAME to?
//
// Each check returns a ProbeOutcome instead of raising. The Prober then
// applies the outcome (new domains go to the frontier, buckets go to the
// results) and moves on to the next check, so one failing check never
// stops its siblings.
// =============================================================================

mod alias;
mod bucket;
mod links;

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::crawl::{BucketResult, Frontier, ResultAggregator, ScanStats};
use crate::error::ProbeError;
use crate::net::{CnameResolver, Fetcher};

pub use alias::probe_alias;
pub use bucket::{probe_bucket, BucketLocator, S3Locator};
pub use links::probe_links;

/// What a single check learned about a domain
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Nothing interesting (closed bucket, no alias, empty page, ...)
    NoFinding,
    /// Names worth probing next
    NewDomains(Vec<String>),
    /// A public, non-empty bucket listing
    BucketFound(BucketResult),
    /// The check could not complete; recovered locally
    Failed(ProbeError),
}

/// The three checks, used to label log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Bucket,
    Links,
    Alias,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Bucket => "bucket",
            Check::Links => "links",
            Check::Alias => "alias",
        };
        f.write_str(name)
    }
}

/// Runs the checks for a domain and feeds their findings back into the run
///
/// One Prober is built per scan and shared (behind an Arc) by every probe
/// task; it holds the network collaborators and the run's shared state.
pub struct Prober {
    config: ScanConfig,
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<dyn CnameResolver>,
    locator: Arc<dyn BucketLocator>,
    frontier: Arc<Frontier>,
    results: Arc<ResultAggregator>,
    stats: Arc<ScanStats>,
}

impl Prober {
    pub fn new(
        config: ScanConfig,
        fetcher: Arc<dyn Fetcher>,
        resolver: Arc<dyn CnameResolver>,
        locator: Arc<dyn BucketLocator>,
        frontier: Arc<Frontier>,
        results: Arc<ResultAggregator>,
        stats: Arc<ScanStats>,
    ) -> Self {
        Self { config, fetcher, resolver, locator, frontier, results, stats }
    }

    /// Probes one domain: bucket check, then links and alias if enabled
    pub async fn probe(&self, domain: &str) {
        // Counts this probe as running until it returns (or unwinds)
        let _active = self.stats.probe_started();
        let timeout = self.config.request_timeout;

        info!(domain = %domain, "Processing");

        let outcome = probe_bucket(self.fetcher.as_ref(), self.locator.as_ref(), domain, timeout).await;
        self.apply(domain, Check::Bucket, outcome);

        if self.config.follow_links {
            let outcome = probe_links(self.fetcher.as_ref(), domain, timeout).await;
            self.apply(domain, Check::Links, outcome);
        }

        if self.config.follow_cnames {
            let outcome = probe_alias(self.resolver.as_ref(), domain, timeout).await;
            self.apply(domain, Check::Alias, outcome);
        }
    }

    fn apply(&self, domain: &str, check: Check, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::NoFinding => {
                debug!(domain = %domain, check = %check, "No finding");
            }
            ProbeOutcome::NewDomains(found) => {
                if check == Check::Bucket {
                    debug!(domain = %domain, target = ?found, "Bucket redirected");
                }

                for new_domain in found {
                    if self.frontier.push(new_domain.clone()) {
                        self.stats.record_push();
                        debug!(domain = %domain, check = %check, new_domain = %new_domain, "Adding domain");
                    } else {
                        self.stats.record_duplicate();
                    }
                }
            }
            ProbeOutcome::BucketFound(result) => {
                info!(
                    domain = %domain,
                    bucket = %result.bucket,
                    objects = result.objects.len(),
                    "Found public bucket"
                );
                self.stats.record_bucket();
                self.results.add(result);
            }
            ProbeOutcome::Failed(error) => {
                self.stats.record_failure();
                match error {
                    // A bucket host serving something that isn't XML is odd enough to surface
                    ProbeError::Parse { .. } => {
                        warn!(domain = %domain, check = %check, error = %error, "Check failed")
                    }
                    _ => {
                        debug!(domain = %domain, check = %check, kind = error.kind(), error = %error, "Check failed")
                    }
                }
            }
        }
    }
}
