// src/probe/links.rs
// =============================================================================
// The link check: which other hosts does this domain's web page pull
// resources from?
//
// Sites very often load images, scripts and stylesheets straight out of a
// bucket (or out of a CDN host that aliases one), so every host named in
// a `src` attribute is worth a probe of its own.
//
// We use the `scraper` crate to find the attributes and the `url` crate
// to pull the authority (host[:port]) out of each reference.
// =============================================================================

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::ProbeOutcome;
use crate::net::{self, Fetcher};

/// Both transports are tried; some sites only answer on one of them
const SCHEMES: [&str; 2] = ["http", "https"];

/// Runs the link check for one domain
pub async fn probe_links(fetcher: &dyn Fetcher, domain: &str, timeout: Duration) -> ProbeOutcome {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    let mut first_error = None;
    let mut fetched_any = false;

    for scheme in SCHEMES {
        let page_url = format!("{}://{}", scheme, domain);

        let response = match net::fetch(fetcher, &page_url, timeout).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %page_url, error = %e, "Page fetch failed");
                first_error.get_or_insert(e);
                continue;
            }
        };
        fetched_any = true;

        if !response.is_html() {
            debug!(url = %page_url, content_type = ?response.content_type, "Not an HTML page, skipping");
            continue;
        }

        for authority in extract_src_authorities(&response.body) {
            if seen.insert(authority.clone()) {
                found.push(authority);
            }
        }
    }

    debug!(domain = %domain, count = found.len(), "Found new domains in site links");

    // One page answering is enough for the check to have worked
    match (found.is_empty(), first_error) {
        (false, _) => ProbeOutcome::NewDomains(found),
        (true, Some(e)) if !fetched_any => ProbeOutcome::Failed(e),
        (true, _) => ProbeOutcome::NoFinding,
    }
}

// Extracts the authority of every absolute `src` reference in a page
//
// Relative references ("/img/logo.png") point back at the page's own host,
// so they are skipped. Order of first appearance is kept, duplicates are
// dropped.
//
// Example:
//   <img src="//cdn.example.com/a.png"><script src="/app.js">
//   -> ["cdn.example.com"]
pub fn extract_src_authorities(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // Constant selector, known to be valid
    let selector = match Selector::parse("[src]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter_map(authority_of)
        .filter(|authority| seen.insert(authority.clone()))
        .collect()
}

// "https://cdn.example.com:8443/x.js" -> Some("cdn.example.com:8443")
// "//cdn.example.com/x.js"            -> Some("cdn.example.com")
// "/x.js", "data:..."                 -> None
fn authority_of(reference: &str) -> Option<String> {
    let reference = reference.trim();

    // Scheme-relative: borrow a scheme just so it parses
    let url = if reference.starts_with("//") {
        Url::parse(&format!("http:{}", reference)).ok()?
    } else {
        Url::parse(reference).ok()?
    };

    let host = url.host_str().filter(|h| !h.is_empty())?;

    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is an authority?
//    - The host (and port, if it isn't the default) part of a URL
//    - https://cdn.example.com:8443/a.js -> cdn.example.com:8443
//
// 2. What is a scheme-relative URL?
//    - "//cdn.example.com/a.js" means "same scheme as the page"
//    - Url::parse needs a scheme, so we glue "http:" on the front
//
// 3. Why HashSet::insert in a filter?
//    - insert() returns false when the value was already there
//    - So `.filter(|x| seen.insert(x.clone()))` keeps first appearances only
// -----------------------------------------------------------------------------
