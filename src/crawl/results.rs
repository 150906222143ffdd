// src/crawl/results.rs
// =============================================================================
// Confirmed buckets, collected while the scan runs.
//
// Probes add to it from many tasks at once; the caller reads it once the
// scheduler is done. It only ever grows, so a failure late in the run
// never loses a bucket found earlier.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// A public, non-empty bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketResult {
    /// The domain whose probe found the bucket
    pub domain: String,
    /// URL the listing was read from
    pub bucket: String,
    /// Object keys, in the order the listing returned them
    pub objects: Vec<String>,
}

/// Append-only, thread-safe list of bucket results
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<Vec<BucketResult>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, result: BucketResult) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    /// Snapshot of everything added so far, in insertion order
    pub fn all(&self) -> Vec<BucketResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(domain: &str) -> BucketResult {
        BucketResult {
            domain: domain.to_string(),
            bucket: format!("http://{}.s3.amazonaws.com", domain),
            objects: vec!["index.html".to_string()],
        }
    }

    #[test]
    fn test_insertion_order() {
        let results = ResultAggregator::new();
        results.add(result("b.example.com"));
        results.add(result("a.example.com"));

        let all = results.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].domain, "b.example.com");
        assert_eq!(all[1].domain, "a.example.com");
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(result("a.example.com")).unwrap();
        assert_eq!(json["domain"], "a.example.com");
        assert_eq!(json["bucket"], "http://a.example.com.s3.amazonaws.com");
        assert_eq!(json["objects"][0], "index.html");
    }
}
