// src/net/dns.rs
// =============================================================================
// DNS side of the network layer: CNAME lookups.
//
// hickory-resolver does the actual wire protocol. We only ask it one
// question ("what does this name alias to?") and hand back plain strings
// with the trailing root dot stripped, so they can go straight onto the
// frontier.
//
// Name servers come from the host's own configuration (/etc/resolv.conf on
// Unix), so internal and split-horizon aliases resolve the way they would
// for any other program on the machine.
// =============================================================================

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use std::fmt::Display;
use std::time::Duration;
use tracing::warn;

use crate::config::ScanConfig;
use crate::error::ProbeError;

/// Answers CNAME queries
#[async_trait]
pub trait CnameResolver: Send + Sync {
    /// Alias targets for `domain`; an empty Vec when there is no CNAME
    async fn cnames(&self, domain: &str) -> Result<Vec<String>, ProbeError>;
}

/// System-configured async resolver
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    pub fn new(config: &ScanConfig) -> Self {
        let (resolver_config, opts) = resolver_setup(read_system_conf(), config.request_timeout);

        Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        }
    }
}

// System name servers with our own deadline; hickory's built-in defaults
// only when the system configuration can't be read
fn resolver_setup<E: Display>(
    system: Result<(ResolverConfig, ResolverOpts), E>,
    timeout: Duration,
) -> (ResolverConfig, ResolverOpts) {
    let (config, mut opts) = match system {
        Ok(system) => system,
        Err(e) => {
            warn!(error = %e, "Could not read system DNS configuration, using default name servers");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };

    opts.timeout = timeout;
    opts.attempts = 1;
    (config, opts)
}

#[async_trait]
impl CnameResolver for DnsResolver {
    async fn cnames(&self, domain: &str) -> Result<Vec<String>, ProbeError> {
        let lookup = match self.resolver.lookup(domain, RecordType::CNAME).await {
            Ok(lookup) => lookup,
            // A name without an alias is an answer, not a failure
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                return Ok(Vec::new())
            }
            Err(e) => {
                return Err(ProbeError::Resolution {
                    domain: domain.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let aliases = lookup
            .iter()
            .filter_map(|rdata| match rdata {
                RData::CNAME(cname) => Some(strip_root(&cname.0.to_utf8())),
                _ => None,
            })
            .filter(|alias| !alias.is_empty())
            .collect();

        Ok(aliases)
    }
}

// "cdn.example.com." -> "cdn.example.com"
fn strip_root(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_root() {
        assert_eq!(strip_root("cdn.example.com."), "cdn.example.com");
        assert_eq!(strip_root("cdn.example.com"), "cdn.example.com");
        assert_eq!(strip_root("."), "");
    }

    #[test]
    fn test_system_config_is_used_with_our_deadline() {
        let mut system_opts = ResolverOpts::default();
        system_opts.attempts = 4;

        let (config, opts) = resolver_setup::<String>(
            Ok((ResolverConfig::cloudflare(), system_opts)),
            Duration::from_secs(3),
        );

        assert_eq!(config, ResolverConfig::cloudflare());
        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert_eq!(opts.attempts, 1);
    }

    #[test]
    fn test_unreadable_system_config_falls_back_to_defaults() {
        let (config, opts) = resolver_setup(Err("no resolv.conf"), Duration::from_secs(3));

        assert_eq!(config, ResolverConfig::default());
        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert_eq!(opts.attempts, 1);
    }
}
