// src/cli.rs
// =============================================================================
// Command-line interface, built with clap's derive API.
//
// Two subcommands:
// - crawl: run a whole session from some seeds for a fixed duration
// - domain: run the crawl pipeline once against a single domain
//
// Most options can also come from environment variables, so the crawler
// can run in a container without a wrapper script.
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Blocked unless the user says otherwise: local and tunnel hosts.
pub const DEFAULT_BLOCKLIST: [&str; 5] = ["localhost", "ngrok.io", "ngrok-free.app", "ngrok.app", "onion"];

#[derive(Parser, Debug)]
#[command(
    name = "fedicrawl",
    version,
    about = "Crawl the fediverse by following the peer lists servers publish",
    long_about = "fedicrawl starts from a few seed servers, reads their nodeinfo metadata \
                  and peer lists, and keeps following newly discovered peers until the \
                  crawl duration runs out."
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl from seed domains until the duration runs out or Ctrl-C
    ///
    /// Example: fedicrawl crawl mastodon.social --duration 60 --workers 4
    Crawl(CrawlArgs),

    /// Crawl a single domain and print what was found
    ///
    /// Example: fedicrawl domain fosstodon.org --json
    Domain {
        /// Domain to crawl (bare hostname, no scheme)
        domain: String,

        #[command(flatten)]
        client: ClientArgs,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Seed domains. Without any, a few well-known servers are used
    pub seeds: Vec<String>,

    /// File with one seed domain per line
    #[arg(long)]
    pub seed_file: Option<PathBuf>,

    /// How long the session runs, in seconds
    #[arg(long, env = "CRAWL_DURATION", default_value_t = 300)]
    pub duration: u64,

    /// Number of concurrent crawl workers
    #[arg(long, env = "CRAWLER_COUNT", default_value_t = 2)]
    pub workers: usize,

    /// Extra domain suffixes to skip, on top of the defaults
    #[arg(long = "block")]
    pub block: Vec<String>,

    #[command(flatten)]
    pub client: ClientArgs,

    /// Print one JSON record per line instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Settings shared by both subcommands.
#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Time budget for crawling one domain, in seconds
    #[arg(long, env = "CRAWL_TIMEOUT", default_value_t = 10)]
    pub crawl_timeout: u64,

    /// User agent sent with every request and matched against robots.txt
    #[arg(long, env = "CRAWLER_USER_AGENT")]
    pub user_agent: Option<String>,
}
