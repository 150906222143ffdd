// src/probe/bucket.rs
// =============================================================================
// The bucket check: "is there a publicly listable bucket behind this name?"
//
// How it works:
// 1. A BucketLocator turns the domain into the URL where the bucket would
//    live (S3Locator knows Amazon's naming rules)
// 2. We GET that URL once, without following redirects
// 3. 2xx   -> the body is a ListBucketResult; every <Key> is an object
//    301   -> S3 moved the bucket; the <Endpoint> in the body is a new
//             domain for the frontier
//    other -> nothing public here
//
// The locator is a trait so other providers can plug in their own rules.
// =============================================================================

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::time::Duration;
use url::Url;

use super::ProbeOutcome;
use crate::crawl::BucketResult;
use crate::error::ProbeError;
use crate::net::{self, Fetcher};

/// Host suffix of virtual-hosted style S3 buckets
pub const S3_HOST_SUFFIX: &str = "s3.amazonaws.com";

/// Marker that separates a bucket name from an S3-compatible provider host
/// (bucket.s3.us-west-2.amazonaws.com, bucket.s3.wasabisys.com, ...)
const PROVIDER_MARKER: &str = ".s3";

/// Maps a domain onto the URL its bucket would be listed at
pub trait BucketLocator: Send + Sync {
    fn locate(&self, domain: &str) -> String;
}

/// Amazon S3 (and S3-compatible) naming rules
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Locator;

impl BucketLocator for S3Locator {
    fn locate(&self, domain: &str) -> String {
        // Already a bucket host: bucket.s3.amazonaws.com
        if domain.ends_with(S3_HOST_SUFFIX) {
            return format!("http://{}", domain);
        }

        // Regional or third-party provider: path-style on the provider host
        if let Some(idx) = domain.find(PROVIDER_MARKER).filter(|&idx| idx > 0) {
            let bucket = &domain[..idx];
            let provider = &domain[idx + 1..];
            return format!("http://{}/{}", provider, bucket);
        }

        // Plain domain: try a bucket with the same name
        format!("http://{}.{}", domain, S3_HOST_SUFFIX)
    }
}

/// Runs the bucket check for one domain
pub async fn probe_bucket(
    fetcher: &dyn Fetcher,
    locator: &dyn BucketLocator,
    domain: &str,
    timeout: Duration,
) -> ProbeOutcome {
    let bucket_url = locator.locate(domain);

    let response = match net::fetch_direct(fetcher, &bucket_url, timeout).await {
        Ok(response) => response,
        Err(e) => return ProbeOutcome::Failed(e),
    };

    if response.is_success() {
        return match parse_listing(&response.body) {
            Ok(objects) if objects.is_empty() => ProbeOutcome::NoFinding,
            Ok(objects) => ProbeOutcome::BucketFound(BucketResult {
                domain: domain.to_string(),
                bucket: bucket_url,
                objects,
            }),
            Err(reason) => ProbeOutcome::Failed(ProbeError::Parse { url: bucket_url, reason }),
        };
    }

    if response.status == 301 {
        return match parse_redirect(&response.body) {
            Ok(target) => ProbeOutcome::NewDomains(vec![target]),
            Err(reason) => ProbeOutcome::Failed(ProbeError::Parse { url: bucket_url, reason }),
        };
    }

    ProbeOutcome::Failed(ProbeError::UnexpectedStatus {
        url: bucket_url,
        status: response.status,
    })
}

/// Object keys of an S3 ListBucketResult document, in document order
///
/// Keys are taken verbatim: S3 allows leading and trailing spaces, so no
/// text is trimmed.
pub fn parse_listing(body: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(body);

    let mut objects = Vec::new();
    let mut is_listing = false;
    // Text of the <Key> being read, if we're inside one
    let mut key: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"ListBucketResult" => is_listing = true,
                b"Key" => key = Some(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"Key" {
                    if let Some(key) = key.take().filter(|k| !k.is_empty()) {
                        objects.push(key);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(key) = key.as_mut() {
                    key.push_str(&text.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(key) = key.as_mut() {
                    key.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("malformed XML at byte {}: {}", reader.buffer_position(), e)),
            Ok(_) => {}
        }
    }

    if !is_listing {
        return Err("not a ListBucketResult document".to_string());
    }

    Ok(objects)
}

/// Domain named by the <Endpoint> of an S3 redirect error document
pub fn parse_redirect(body: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut in_endpoint = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => in_endpoint = e.local_name().as_ref() == b"Endpoint",
            Ok(Event::End(_)) => in_endpoint = false,
            Ok(Event::Text(text)) if in_endpoint => {
                let endpoint = text.unescape().map_err(|e| e.to_string())?;
                return endpoint_domain(&endpoint)
                    .ok_or_else(|| format!("unusable redirect endpoint '{}'", endpoint));
            }
            Ok(Event::Eof) => return Err("redirect without an <Endpoint>".to_string()),
            Err(e) => return Err(format!("malformed XML at byte {}: {}", reader.buffer_position(), e)),
            Ok(_) => {}
        }
    }
}

// S3 sends a bare host, but accept a full URL too
fn endpoint_domain(endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim();

    let domain = if endpoint.contains("://") {
        let parsed = Url::parse(endpoint).ok()?;
        parsed.host_str()?.to_string()
    } else {
        endpoint.split('/').next().unwrap_or_default().to_string()
    };

    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}
