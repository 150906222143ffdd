// src/index/jsonl.rs
// =============================================================================
// A DocumentSink that writes one JSON object per line.
//
// Good enough to grep through, and trivial to bulk-load into a real
// search backend later.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{Document, DocumentSink};

pub struct JsonLinesSink {
    // Async mutex: the lock is held across the write's .await
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the output file
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .with_context(|| format!("could not create index file {}", path.display()))?;
        Ok(Self { file: Mutex::new(file) })
    }

    /// Pushes buffered writes to disk; call once indexing is done
    pub async fn flush(&self) -> Result<()> {
        self.file.lock().await.flush().await.context("could not flush index file")
    }
}

#[async_trait]
impl DocumentSink for JsonLinesSink {
    async fn add_document(&self, document: Document) -> Result<()> {
        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await.context("could not write to index file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(path: &str, content: &str) -> Document {
        Document {
            domain: "files.example.com".to_string(),
            bucket: "http://files.example.com.s3.amazonaws.com".to_string(),
            path: path.to_string(),
            url: format!("http://files.example.com.s3.amazonaws.com/{}", path),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_writes_one_line_per_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.jsonl");

        let sink = JsonLinesSink::create(&path).await.unwrap();
        sink.add_document(document("a.txt", "first\nline")).await.unwrap();
        sink.add_document(document("b.txt", "second")).await.unwrap();
        sink.flush().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["path"], "a.txt");
        assert_eq!(lines[0]["content"], "first\nline");
        assert_eq!(lines[1]["url"], "http://files.example.com.s3.amazonaws.com/b.txt");
    }
}
