// src/net/http.rs
// =============================================================================
// HTTP side of the network layer.
//
// Key functionality:
// - The Fetcher trait: "GET this URL and give me status, content type, body"
// - HttpFetcher: the real implementation on top of reqwest
// - Proxy support (SOCKS/Tor) and a per-request timeout
// - Two redirect policies: page fetches follow redirects, bucket requests
//   don't (a bucket's 301 body is the answer we want)
// - Turning reqwest errors into our ProbeError taxonomy
//
// Probes only ever talk to `dyn Fetcher`, so tests can swap in an
// in-memory fake and never touch the network.
// =============================================================================

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, Proxy};
use std::time::Duration;

use crate::config::ScanConfig;
use crate::error::{ConfigError, ProbeError};

/// What a probe needs to know about an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchResponse {
    /// 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the server labelled the body as some flavour of HTML
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("html"))
            .unwrap_or(false)
    }
}

/// A single GET request, abstracted so probes can be tested offline
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url`, following redirects to the final page
    async fn get(&self, url: &str) -> Result<FetchResponse, ProbeError>;

    /// GET `url` and hand back whatever it answers, 3xx included
    ///
    /// Fetchers that never follow redirects can leave the default.
    async fn get_without_redirects(&self, url: &str) -> Result<FetchResponse, ProbeError> {
        self.get(url).await
    }
}

/// reqwest-backed fetcher shared by every probe of a run
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    // Same settings as `client`, but redirects come back as responses
    direct: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Builds the clients for the whole run
    ///
    /// Client is cheap to clone (it's an Arc internally) and keeps a
    /// connection pool, so every probe shares these.
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(config, Policy::limited(5))?,
            direct: build_client(config, Policy::none())?,
            timeout: config.request_timeout,
        })
    }

    async fn send(&self, client: &Client, url: &str) -> Result<FetchResponse, ProbeError> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_error(url, e, self.timeout))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| categorize_error(url, e, self.timeout))?;

        Ok(FetchResponse { status, content_type, body })
    }
}

fn build_client(config: &ScanConfig, redirects: Policy) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .timeout(config.request_timeout)
        .redirect(redirects)
        .danger_accept_invalid_certs(config.accept_invalid_certs);

    if let Some(proxy) = &config.proxy {
        let proxy = Proxy::all(proxy).map_err(|e| ConfigError::InvalidProxy {
            url: proxy.clone(),
            reason: e.to_string(),
        })?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, ProbeError> {
        self.send(&self.client, url).await
    }

    async fn get_without_redirects(&self, url: &str) -> Result<FetchResponse, ProbeError> {
        self.send(&self.direct, url).await
    }
}

// Categorizes reqwest errors into the probe error taxonomy
//
// Timeouts get their own variant so the logs can tell a hung server apart
// from a refused connection; everything else is a network failure with
// a short human-readable reason.
fn categorize_error(url: &str, error: reqwest::Error, timeout: Duration) -> ProbeError {
    let error_string = error.to_string();

    if error.is_timeout() {
        return ProbeError::Timeout {
            url: url.to_string(),
            after: timeout,
        };
    }

    let reason = if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        if error_string.contains("dns") {
            "could not resolve hostname".to_string()
        } else {
            "connection failed".to_string()
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "TLS error".to_string()
    } else if error.is_body() || error.is_decode() {
        format!("could not read body: {}", error_string)
    } else {
        error_string
    };

    ProbeError::Network { url: url.to_string(), reason }
}
