// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Collect the seed domains (arguments + optional file)
// 3. Run the scan (crawl::Scanner does the real work)
// 4. Print the buckets found, optionally index their contents
// 5. Exit with proper code (0 = nothing found, 1 = buckets found, 2 = error)
//
// Logs go to stderr through `tracing`; stdout only carries results, so
// `--json` output can be piped straight into another tool.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;      // src/cli.rs - command-line parsing
mod config;   // src/config.rs - scan settings
mod crawl;    // src/crawl/ - frontier, scheduler, results
mod error;    // src/error.rs - error types
mod index;    // src/index/ - downloading found objects into an index
mod net;      // src/net/ - HTTP and DNS collaborators
mod probe;    // src/probe/ - the per-domain checks

#[cfg(test)]
mod testing;  // src/testing.rs - in-memory network fakes

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use crawl::{ScanReport, Scanner};
use net::{DnsResolver, HttpFetcher};
use probe::S3Locator;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins when set; otherwise --debug / --quiet pick the level
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bucket_scout={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Returns:
//   Ok(0) = scan finished, no public buckets
//   Ok(1) = at least one public bucket found
//   Err   = misconfiguration or I/O problem (exit code 2)
async fn run(cli: Cli) -> Result<i32> {
    let mut seeds = cli.domains.clone();
    if let Some(path) = &cli.file_domains {
        info!(file = %path.display(), "Loading domains file");
        seeds.extend(load_domains_file(path)?);
    }

    let config = cli.scan_config();
    config.validate()?;

    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let resolver = Arc::new(DnsResolver::new(&config));

    let scanner = Scanner::new(config.clone(), fetcher.clone(), resolver, Arc::new(S3Locator));
    let report = scanner.run(seeds).await?;

    if !cli.no_print {
        print_results(&report, cli.json)?;
    }

    if let Some(index_path) = &cli.index {
        info!(file = %index_path.display(), buckets = report.results.len(), "Indexing bucket contents");

        let sink = index::JsonLinesSink::create(index_path).await?;
        let summary = index::index_buckets(
            fetcher.as_ref(),
            &sink,
            &report.results,
            config.concurrency,
            config.request_timeout,
        )
        .await;
        sink.flush().await?;

        info!(indexed = summary.indexed, failed = summary.failed, "Indexing finished");
    }

    if report.results.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn load_domains_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read domains file {}", path.display()))?;
    Ok(parse_domains(&content))
}

// One domain per line; blank lines and # comments are skipped
fn parse_domains(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// Prints the results either as a listing or JSON
fn print_results(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(&report.results)?;
        println!("{}", json_output);
    } else {
        print_listing(report);
    }
    Ok(())
}

fn print_listing(report: &ScanReport) {
    let results = &report.results;
    let stats = &report.stats;

    if results.is_empty() {
        println!("No public buckets found");
    } else {
        println!("Buckets found:");
    }
    for result in results {
        println!(
            "    > Domain '{}' - Found {} public objects",
            result.domain,
            result.objects.len()
        );
        println!("      bucket: {}", result.bucket);

        for object in &result.objects {
            println!("      -> {}/{}", result.domain, object);
        }
    }

    println!();

    let objects: usize = results.iter().map(|r| r.objects.len()).sum();
    println!("📊 Summary:");
    println!("   🔎 Domains probed: {}", stats.probes_finished);
    println!("   🪣 Buckets: {}", results.len());
    println!("   📄 Objects: {}", objects);
    if stats.failures > 0 || stats.probes_panicked > 0 {
        println!("   ⚠️  Failed checks: {} (run with --debug for details)", stats.failures + stats.probes_panicked);
    }
}
