// src/testing.rs
// =============================================================================
// In-memory stand-ins for the network, used by the unit tests.
//
// FakeFetcher answers GET requests from a table of canned responses and
// FakeResolver answers CNAME queries the same way. Both record every call
// so tests can assert on what was probed, and FakeFetcher tracks how many
// requests are in flight at once (used to check the concurrency limit).
//
// serve_local is the odd one out: a tiny real HTTP server on 127.0.0.1 for
// the few tests that need reqwest's own behaviour (redirect handling).
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::error::ProbeError;
use crate::net::{CnameResolver, FetchResponse, Fetcher};

#[derive(Clone)]
enum Reply<T> {
    Value(T),
    Fail(ProbeError),
    Hang,
}

#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, Reply<FetchResponse>>,
    delay: Duration,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
        let response = FetchResponse {
            status,
            content_type: Some(content_type.to_string()),
            body: body.to_string(),
        };
        self.routes.insert(url.to_string(), Reply::Value(response));
        self
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.respond(url, 200, "text/html; charset=utf-8", body)
    }

    pub fn xml(self, url: &str, status: u16, body: &str) -> Self {
        self.respond(url, status, "application/xml", body)
    }

    pub fn fail(mut self, url: &str, error: ProbeError) -> Self {
        self.routes.insert(url.to_string(), Reply::Fail(error));
        self
    }

    pub fn hang(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), Reply::Hang);
        self
    }

    /// Every request sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requests().iter().any(|u| u == url)
    }

    /// Highest number of requests that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, ProbeError> {
        self.requests.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self.routes.get(url).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(Reply::Value(response)) => Ok(response),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ProbeError::Network {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeResolver {
    answers: HashMap<String, Reply<Vec<String>>>,
    queries: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, domain: &str, targets: &[&str]) -> Self {
        let targets = targets.iter().map(|t| t.to_string()).collect();
        self.answers.insert(domain.to_string(), Reply::Value(targets));
        self
    }

    pub fn fail(mut self, domain: &str) -> Self {
        let error = ProbeError::Resolution {
            domain: domain.to_string(),
            reason: "SERVFAIL".to_string(),
        };
        self.answers.insert(domain.to_string(), Reply::Fail(error));
        self
    }

    pub fn hang(mut self, domain: &str) -> Self {
        self.answers.insert(domain.to_string(), Reply::Hang);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CnameResolver for FakeResolver {
    async fn cnames(&self, domain: &str) -> Result<Vec<String>, ProbeError> {
        self.queries.lock().unwrap().push(domain.to_string());

        match self.answers.get(domain).cloned() {
            Some(Reply::Value(targets)) => Ok(targets),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok(Vec::new()),
        }
    }
}

/// An S3 ListBucketResult body holding `keys`
pub fn listing(keys: &[&str]) -> String {
    let contents: String = keys
        .iter()
        .map(|k| format!("<Contents><Key>{}</Key><Size>1</Size></Contents>", k))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>bucket</Name>{}</ListBucketResult>"#,
        contents
    )
}

/// An S3 PermanentRedirect error body pointing at `endpoint`
pub fn permanent_redirect(endpoint: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>PermanentRedirect</Code><Message>The bucket you are attempting to access must be addressed using the specified endpoint.</Message><Endpoint>{}</Endpoint></Error>"#,
        endpoint
    )
}

/// One canned answer of `serve_local`: path, status line, extra header
/// lines (each ending in \r\n), body
pub type LocalRoute = (&'static str, &'static str, &'static str, &'static str);

/// Serves `routes` over plain HTTP/1.1 on an ephemeral local port
///
/// Unknown paths get a 404. Every connection answers one request and closes.
pub async fn serve_local(routes: Vec<LocalRoute>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, headers, body) = routes
                    .iter()
                    .find(|(route, ..)| *route == path)
                    .map(|(_, status, headers, body)| (*status, *headers, *body))
                    .unwrap_or(("404 Not Found", "", ""));

                let response = format!(
                    "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    headers,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
