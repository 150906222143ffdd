// src/index/mod.rs
// =============================================================================
// Hands the contents of found buckets to a document index.
//
// The scan itself only produces BucketResults (where the bucket is and
// what keys it lists). With --index, every listed object is downloaded and
// passed to a DocumentSink as one Document. What the sink does with it is
// its own business: the JSON-lines sink in jsonl.rs just appends it to a
// file, a full-text backend would store and tokenize it.
//
// Downloads run concurrently (up to the scan's concurrency) using the same
// buffer_unordered pattern as the rest of the codebase.
// =============================================================================

mod jsonl;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::crawl::BucketResult;
use crate::net::{self, Fetcher};

pub use jsonl::JsonLinesSink;

/// One downloaded object, ready to be indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub domain: String,
    pub bucket: String,
    pub path: String,
    pub url: String,
    pub content: String,
}

/// Where downloaded objects end up
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn add_document(&self, document: Document) -> Result<()>;
}

/// How an indexing pass went
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub indexed: usize,
    pub failed: usize,
}

/// Downloads every object of every bucket and feeds it to `sink`
///
/// A failed download or a sink error skips that object only.
pub async fn index_buckets(
    fetcher: &dyn Fetcher,
    sink: &dyn DocumentSink,
    buckets: &[BucketResult],
    concurrency: usize,
    timeout: Duration,
) -> IndexSummary {
    let jobs = buckets
        .iter()
        .flat_map(|bucket| bucket.objects.iter().map(move |path| (bucket, path)));

    let outcomes: Vec<bool> = stream::iter(jobs)
        .map(|(bucket, path)| async move {
            match index_object(fetcher, sink, bucket, path, timeout).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(domain = %bucket.domain, path = %path, error = %e, "Could not index object");
                    false
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let indexed = outcomes.iter().filter(|ok| **ok).count();
    IndexSummary {
        indexed,
        failed: outcomes.len() - indexed,
    }
}

async fn index_object(
    fetcher: &dyn Fetcher,
    sink: &dyn DocumentSink,
    bucket: &BucketResult,
    path: &str,
    timeout: Duration,
) -> Result<()> {
    let url = object_url(&bucket.bucket, path)
        .ok_or_else(|| anyhow!("cannot build a URL for '{}' in {}", path, bucket.bucket))?;

    let response = net::fetch(fetcher, &url, timeout).await?;
    if !response.is_success() {
        return Err(anyhow!("HTTP {}", response.status));
    }

    debug!(url = %url, bytes = response.body.len(), "Downloaded object");

    sink.add_document(Document {
        domain: bucket.domain.clone(),
        bucket: bucket.bucket.clone(),
        path: path.to_string(),
        url,
        content: response.body,
    })
    .await
}

// Appends an object key to the bucket URL, percent-encoding each segment
//
// Example:
//   ("http://s3.eu-west-1.amazonaws.com/assets", "docs/q 1.pdf")
//   -> "http://s3.eu-west-1.amazonaws.com/assets/docs/q%201.pdf"
fn object_url(bucket_url: &str, path: &str) -> Option<String> {
    let mut url = Url::parse(bucket_url).ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        for segment in path.split('/') {
            segments.push(segment);
        }
    }
    Some(url.to_string())
}
