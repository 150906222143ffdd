// src/net/mod.rs
// =============================================================================
// Network collaborators: HTTP fetching and DNS resolution.
//
// Submodules:
// - http: the Fetcher trait and its reqwest implementation
// - dns: the CnameResolver trait and its hickory implementation
//
// This file also owns the per-request deadline. Every network call a probe
// makes goes through `fetch`, `fetch_direct` or `resolve_cnames` below, so
// a hung server (or a hung fake in tests) can never hold a probe's permit
// forever.
// =============================================================================

mod dns;
mod http;

use std::future::Future;
use std::time::Duration;

use crate::error::ProbeError;

pub use dns::{CnameResolver, DnsResolver};
pub use http::{FetchResponse, Fetcher, HttpFetcher};

/// GET `url`, giving up after `timeout`
pub async fn fetch(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<FetchResponse, ProbeError> {
    with_deadline(url, timeout, fetcher.get(url)).await
}

/// Like `fetch`, but a redirect comes back as the response itself
pub async fn fetch_direct(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<FetchResponse, ProbeError> {
    with_deadline(url, timeout, fetcher.get_without_redirects(url)).await
}

async fn with_deadline<F>(url: &str, timeout: Duration, request: F) -> Result<FetchResponse, ProbeError>
where
    F: Future<Output = Result<FetchResponse, ProbeError>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout {
            url: url.to_string(),
            after: timeout,
        }),
    }
}

/// CNAME lookup for `domain`, giving up after `timeout`
pub async fn resolve_cnames(
    resolver: &dyn CnameResolver,
    domain: &str,
    timeout: Duration,
) -> Result<Vec<String>, ProbeError> {
    match tokio::time::timeout(timeout, resolver.cnames(domain)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Resolution {
            domain: domain.to_string(),
            reason: format!("timed out after {}s", timeout.as_secs_f32()),
        }),
    }
}
