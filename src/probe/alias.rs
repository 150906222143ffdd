// src/probe/alias.rs
// =============================================================================
// The alias check: follow the domain's DNS CNAME records.
//
// A custom domain like assets.example.com is often just a CNAME for
// assets-prod.s3.amazonaws.com, so the alias target is exactly the name we
// want to try next.
// =============================================================================

use std::time::Duration;

use super::ProbeOutcome;
use crate::net::{self, CnameResolver};

/// Runs the alias check for one domain
pub async fn probe_alias(resolver: &dyn CnameResolver, domain: &str, timeout: Duration) -> ProbeOutcome {
    match net::resolve_cnames(resolver, domain, timeout).await {
        Ok(aliases) if aliases.is_empty() => ProbeOutcome::NoFinding,
        Ok(aliases) => ProbeOutcome::NewDomains(aliases),
        Err(e) => ProbeOutcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::testing::FakeResolver;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_alias_targets_become_new_domains() {
        let resolver = FakeResolver::new().alias("assets.example.com", &["assets-prod.s3.amazonaws.com"]);
        let outcome = probe_alias(&resolver, "assets.example.com", TIMEOUT).await;
        assert_eq!(
            outcome,
            ProbeOutcome::NewDomains(vec!["assets-prod.s3.amazonaws.com".to_string()])
        );
    }

    #[tokio::test]
    async fn test_no_alias_is_no_finding() {
        let resolver = FakeResolver::new();
        let outcome = probe_alias(&resolver, "example.com", TIMEOUT).await;
        assert_eq!(outcome, ProbeOutcome::NoFinding);
    }

    #[tokio::test]
    async fn test_resolver_error_is_reported() {
        let resolver = FakeResolver::new().fail("broken.example.com");
        let outcome = probe_alias(&resolver, "broken.example.com", TIMEOUT).await;
        assert!(matches!(outcome, ProbeOutcome::Failed(ProbeError::Resolution { .. })));
    }
}
