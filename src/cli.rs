// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the Cli struct below IS the argument list, and
// clap generates the parser, --help and --version from it.
//
// Cli::scan_config() turns the parsed flags into the ScanConfig the engine
// understands. Flags that only affect output (--json, --no-print) or
// logging (--debug, --quiet) stay here and are read by main.rs.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ScanConfig, TOR_PROXY};

#[derive(Parser, Debug)]
#[command(
    name = "bucket-scout",
    version = "0.1.0",
    about = "Discover publicly readable S3 buckets reachable from a list of domains",
    long_about = "bucket-scout probes each domain for an open S3 bucket, then follows the \
                  resources its web page loads, its DNS aliases and S3 redirects to find \
                  more domains to probe, until nothing new turns up."
)]
pub struct Cli {
    /// Domains to start from
    ///
    /// Example: bucket-scout example.com assets.example.com
    pub domains: Vec<String>,

    /// File with more domains, one per line (blank lines and # comments are skipped)
    #[arg(short = 'f', long = "file-domains", value_name = "FILE")]
    pub file_domains: Option<PathBuf>,

    /// Don't follow resource links found on the domains' web pages
    #[arg(long)]
    pub no_links: bool,

    /// Don't follow DNS CNAME aliases
    #[arg(long)]
    pub no_dns: bool,

    /// Maximum number of domains probed at the same time
    #[arg(short = 'c', long, default_value_t = 2)]
    pub concurrency: usize,

    /// Send all HTTP traffic through a local Tor client (127.0.0.1:9050)
    #[arg(long, conflicts_with = "proxy")]
    pub tor: bool,

    /// Send all HTTP traffic through this proxy (e.g. socks5h://10.0.0.1:1080)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub timeout: u64,

    /// Probe a domain again every time it is discovered (may never finish on cyclic sites)
    #[arg(long)]
    pub no_dedup: bool,

    /// Download every object of the found buckets into this JSON-lines file
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Print results as JSON instead of a listing
    #[arg(long)]
    pub json: bool,

    /// Don't print the found buckets
    #[arg(long)]
    pub no_print: bool,

    /// Verbose logging (shows every check and every discovered domain)
    #[arg(long, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    /// Engine settings for this invocation
    pub fn scan_config(&self) -> ScanConfig {
        let proxy = if self.tor {
            Some(TOR_PROXY.to_string())
        } else {
            self.proxy.clone()
        };

        ScanConfig {
            concurrency: self.concurrency,
            follow_links: !self.no_links,
            follow_cnames: !self.no_dns,
            proxy,
            request_timeout: Duration::from_secs(self.timeout.max(1)),
            dedup: !self.no_dedup,
            ..ScanConfig::default()
        }
    }

    /// Log filter implied by --debug / --quiet
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
