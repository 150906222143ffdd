// src/config.rs
// =============================================================================
// Runtime settings for a scan.
//
// The CLI layer (cli.rs) fills this in; everything below it (scheduler,
// probes, HTTP client) only ever sees a ScanConfig. The debug/quiet flags
// are NOT here on purpose: they only change the log filter in main.rs.
// =============================================================================

use crate::error::ConfigError;
use std::time::Duration;

/// Local Tor SOCKS endpoint used by `--tor`
pub const TOR_PROXY: &str = "socks5h://127.0.0.1:9050";

/// Proxy schemes reqwest can speak
const PROXY_SCHEMES: [&str; 5] = ["http", "https", "socks5", "socks5h", "socks4"];

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum number of domains probed at the same time (C)
    pub concurrency: usize,
    /// Follow `src` references found on the domain's web page
    pub follow_links: bool,
    /// Follow DNS CNAME aliases
    pub follow_cnames: bool,
    /// Proxy applied to every HTTP request, e.g. socks5h://127.0.0.1:9050
    pub proxy: Option<String>,
    /// Upper bound for any single network call
    pub request_timeout: Duration,
    /// Skip domains that were already put on the frontier once
    pub dedup: bool,
    /// Don't verify TLS certificates when fetching pages
    pub accept_invalid_certs: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            follow_links: true,
            follow_cnames: true,
            proxy: None,
            request_timeout: Duration::from_secs(10),
            dedup: true,
            accept_invalid_certs: true,
        }
    }
}

impl ScanConfig {
    /// Checks the settings that would make a scan impossible
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        if let Some(proxy) = &self.proxy {
            let parsed = url::Url::parse(proxy).map_err(|e| ConfigError::InvalidProxy {
                url: proxy.clone(),
                reason: e.to_string(),
            })?;

            if !PROXY_SCHEMES.contains(&parsed.scheme()) {
                return Err(ConfigError::InvalidProxy {
                    url: proxy.clone(),
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.concurrency, 2);
        assert!(config.dedup);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ScanConfig { concurrency: 0, ..ScanConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroConcurrency)));
    }

    #[test]
    fn test_tor_proxy_accepted() {
        let config = ScanConfig { proxy: Some(TOR_PROXY.to_string()), ..ScanConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_proxy_rejected() {
        let config = ScanConfig { proxy: Some("ftp://10.0.0.1:21".to_string()), ..ScanConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidProxy { .. })));

        let config = ScanConfig { proxy: Some("not a url".to_string()), ..ScanConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidProxy { .. })));
    }
}
