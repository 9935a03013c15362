// src/main.rs
// =============================================================================
// Entry point of the fedicrawl binary.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, filtered by RUST_LOG or --log-level)
// 3. Dispatch to the subcommand handler
// 4. Print records as they arrive, then a summary
// 5. Exit with proper code (0 = success, 2 = error)
//
// A crawl session ends when its duration runs out or on Ctrl-C. Both are a
// normal end, not an error.
// =============================================================================

mod cli;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, ClientArgs, Commands, CrawlArgs, DEFAULT_BLOCKLIST};
use fedicrawl::config::DEFAULT_USER_AGENT;
use fedicrawl::net::RetryPolicy;
use fedicrawl::{
    run_crawl, seeds, Blocklist, CrawlConfig, CrawlRecord, CrawlStatus, Crawler, DomainCrawler,
    JobContext, Sink,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // logs go to stderr so stdout stays clean for records
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Domain { domain, client, json } => handle_domain(&domain, &client, json).await,
    }
}

fn user_agent(client: &ClientArgs) -> String {
    client
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let blocklist = Blocklist::new(
        DEFAULT_BLOCKLIST
            .iter()
            .map(|entry| entry.to_string())
            .chain(args.block.iter().cloned()),
    );

    let mut candidates = args.seeds.clone();
    if let Some(path) = &args.seed_file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        candidates.extend(seeds::parse_seed_file(&contents));
    }
    let seeds = seeds::prepare(candidates, &blocklist);

    let config = CrawlConfig {
        workers: args.workers,
        seeds,
        blocklist,
        crawl_timeout: Duration::from_secs(args.client.crawl_timeout),
        session_budget: Some(Duration::from_secs(args.duration)),
        user_agent: user_agent(&args.client),
        ..Default::default()
    };

    eprintln!("🔍 Crawling from {} seed(s): {}", config.seeds.len(), config.seeds.join(", "));
    eprintln!("⏱️  Duration: {}s, workers: {}", args.duration, config.workers);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, stopping crawl");
                cancel.cancel();
            }
        });
    }

    let sink = StdoutSink::new(args.json);
    if !args.json {
        print_header();
    }

    run_crawl(config, &sink, cancel)
        .await
        .context("crawl session failed")?;

    sink.print_summary();
    Ok(0)
}

// Handles the 'domain' subcommand
async fn handle_domain(domain: &str, client: &ClientArgs, json: bool) -> Result<i32> {
    let timeout = Duration::from_secs(client.crawl_timeout);
    let crawler = Crawler::new(&user_agent(client), timeout, RetryPolicy::default())
        .context("failed to build HTTP client")?;

    let outcome = crawler
        .crawl_domain(&JobContext::standalone(timeout), domain)
        .await;
    let record = CrawlRecord::from(outcome);

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_details(&record);
    }
    Ok(0)
}

/// Prints records as they come in and counts them by status.
struct StdoutSink {
    json: bool,
    counts: Mutex<HashMap<CrawlStatus, usize>>,
}

impl StdoutSink {
    fn new(json: bool) -> Self {
        Self {
            json,
            counts: Mutex::new(HashMap::new()),
        }
    }

    fn print_summary(&self) {
        let counts = match self.counts.lock() {
            Ok(counts) => counts,
            Err(poisoned) => poisoned.into_inner(),
        };
        let total: usize = counts.values().sum();

        info!(total, "crawl finished");
        eprintln!();
        eprintln!("📊 Summary:");
        for status in CrawlStatus::ALL {
            eprintln!("   {:<16} {}", status, counts.get(&status).copied().unwrap_or(0));
        }
        eprintln!("   📋 Total: {}", total);
    }
}

#[async_trait]
impl Sink for StdoutSink {
    async fn submit(&self, record: CrawlRecord) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(&record)?);
        } else {
            print_row(&record);
        }

        let mut counts = match self.counts.lock() {
            Ok(counts) => counts,
            Err(poisoned) => poisoned.into_inner(),
        };
        *counts.entry(record.status).or_insert(0) += 1;
        Ok(())
    }
}

fn print_header() {
    println!("{:<40} {:<15} {:<20} {:>8} {:<30}", "DOMAIN", "STATUS", "SOFTWARE", "PEERS", "ERROR");
    println!("{}", "=".repeat(117));
}

fn print_row(record: &CrawlRecord) {
    // Truncate long domains so the columns stay aligned
    let domain = if record.domain.chars().count() > 37 {
        format!("{}...", record.domain.chars().take(37).collect::<String>())
    } else {
        record.domain.clone()
    };
    let software = match (&record.software_name, &record.software_version) {
        (Some(name), Some(version)) => format!("{} {}", name, version),
        (Some(name), None) => name.clone(),
        _ => "-".to_string(),
    };
    let peers = record
        .number_of_peers
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    let error = record
        .error
        .as_ref()
        .map(|e| e.code.to_string())
        .unwrap_or_default();

    println!(
        "{:<40} {:<15} {:<20} {:>8} {:<30}",
        domain,
        format_status(record.status),
        software,
        peers,
        error
    );
}

fn print_details(record: &CrawlRecord) {
    println!("🌐 {}", record.domain);
    println!("   Status:    {}", format_status(record.status));
    if let Some(error) = &record.error {
        println!("   Error:     {} ({})", error.code, error.message);
        println!("              {}", error.code.description());
    }
    let addresses: Vec<String> = record.addresses.iter().map(|a| a.to_string()).collect();
    println!("   Addresses: {}", addresses.join(", "));
    if let Some(name) = &record.software_name {
        println!(
            "   Software:  {} {}",
            name,
            record.software_version.as_deref().unwrap_or("")
        );
    }
    if let Some(users) = record.total_users {
        println!("   Users:     {}", users);
    }
    if let Some(peers) = record.number_of_peers {
        println!("   Peers:     {}", peers);
    }
}

fn format_status(status: CrawlStatus) -> String {
    match status {
        CrawlStatus::Completed => "✅ COMPLETED".to_string(),
        CrawlStatus::Failed => "❌ FAILED".to_string(),
        CrawlStatus::Blocked => "🚫 BLOCKED".to_string(),
        CrawlStatus::Timeout => "⏱️  TIMEOUT".to_string(),
        CrawlStatus::InternalError => "⚠️  INTERNAL".to_string(),
    }
}
