use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use content_checker::config;
use content_checker::content::build_http_client;
use content_checker::feed::{self, FeedClient, NotificationFeed, DEFAULT_SINCE};

/// Fetch a single notifications page and show what the checker would do with it.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cursor (RFC3339 timestamp) to fetch from
    #[arg(long, default_value = DEFAULT_SINCE)]
    since: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    let client = FeedClient::from_config(build_http_client(cfg.request_timeout()), &cfg);

    let page = client.fetch_page(&args.since).await?;
    println!("Request URL: {}", page.request_url);
    println!("Notifications: {}", page.notifications.len());
    for n in &page.notifications {
        println!("  {} {} ({})", n.kind, n.api_url, n.last_modified);
    }

    let checkable = feed::filter_notifications(&page);
    println!("Checkable UUIDs: {}", checkable.len());
    for uuid in &checkable {
        println!("  {}", uuid);
    }

    match page.next_link().and_then(feed::next_since) {
        Some(next) if next.is_empty() => println!("Next cursor: none"),
        Some(next) if next == args.since => println!("Next cursor: unchanged (feed exhausted)"),
        Some(next) => println!("Next cursor: {}", next),
        None => println!("Next cursor: none"),
    }
    Ok(())
}
