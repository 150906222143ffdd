// src/error.rs
// =============================================================================
// Error types used by the scanner.
//
// Two families:
// - ProbeError: things that go wrong while probing ONE domain. These are
//   always recovered inside the sub-probe that hit them (logged, then the
//   probe moves on). They never stop the scan.
// - ConfigError: the caller handed us something we can't run with. These
//   are fatal and are reported before any probe starts.
//
// The binary itself (main.rs) uses anyhow on top of these, the same way
// it uses anyhow for file loading.
// =============================================================================

use std::time::Duration;
use thiserror::Error;

/// Failure of a single sub-probe (bucket, links or alias check)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Connection refused, TLS failure, reset, ...
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// Server answered, but not with anything we can use
    #[error("{url} answered with HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The request did not finish within the per-request timeout
    #[error("request to {url} timed out after {}s", .after.as_secs_f32())]
    Timeout { url: String, after: Duration },

    /// Body could not be read as the document we expected
    #[error("could not parse response from {url}: {reason}")]
    Parse { url: String, reason: String },

    /// DNS query failed (including "no records")
    #[error("could not resolve {domain}: {reason}")]
    Resolution { domain: String, reason: String },
}

impl ProbeError {
    /// Short label used as a structured logging field
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Network { .. } => "network",
            ProbeError::UnexpectedStatus { .. } => "status",
            ProbeError::Timeout { .. } => "timeout",
            ProbeError::Parse { .. } => "parse",
            ProbeError::Resolution { .. } => "resolution",
        }
    }
}

/// Caller misconfiguration, surfaced before the engine starts
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("you must provide at least one domain")]
    NoSeeds,

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("invalid proxy URL '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
