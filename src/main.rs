use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use content_checker::checker::{Checker, ImageChecker};
use content_checker::config::{self, Config};
use content_checker::content::{build_http_client, ContentApi, ContentClient};
use content_checker::feed::{self, FeedClient, NotificationFeed, DEFAULT_SINCE};
use content_checker::ids::parse_uuid_list;
use content_checker::pipeline::{self, AuditContext};
use content_checker::sink::CsvSink;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Check that images referenced by recently changed content resolve"
)]
struct Args {
    /// Path to YAML config file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Content read endpoint URL
    #[arg(long)]
    content: Option<String>,

    /// Notifications endpoint URL
    #[arg(long)]
    notifications: Option<String>,

    /// Basic authentication as user:password
    #[arg(long)]
    auth: Option<String>,

    /// Number of concurrent check workers
    #[arg(long)]
    workers: Option<usize>,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// CSV file receiving failure rows
    #[arg(long)]
    output: Option<String>,

    /// Check content from the given RFC3339 date/time
    #[arg(long, conflicts_with = "uuids")]
    since: Option<String>,

    /// Check one or more UUIDs (comma- or whitespace-separated)
    #[arg(long)]
    uuids: Option<String>,
}

impl Args {
    /// The `--uuids` value, unless it is blank; blank falls back to the feed.
    fn uuid_list(&self) -> Option<&str> {
        self.uuids.as_deref().filter(|list| !list.trim().is_empty())
    }

    fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(content) = &self.content {
            cfg.api.content_url = content.clone();
        }
        if let Some(notifications) = &self.notifications {
            cfg.api.notifications_url = notifications.clone();
        }
        if let Some(auth) = &self.auth {
            cfg.api.auth = auth.clone();
        }
        if let Some(workers) = self.workers {
            cfg.app.workers = workers;
        }
        if let Some(timeout) = self.timeout_secs {
            cfg.app.request_timeout_secs = timeout;
        }
        if let Some(output) = &self.output {
            cfg.app.output = output.clone();
        }
    }
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
    let mut cfg = config::load(args.config.as_deref())?;
    args.apply_overrides(&mut cfg);
    config::validate(&cfg)?;

    let http = build_http_client(cfg.request_timeout());
    let content: Arc<dyn ContentApi> = Arc::new(ContentClient::from_config(http.clone(), &cfg));
    let checkers: Vec<Arc<dyn Checker>> = vec![Arc::new(ImageChecker::new(content))];
    let ctx = Arc::new(AuditContext::new(checkers));

    match args.uuid_list() {
        Some(list) => {
            let uuids = parse_uuid_list(list);
            info!(count = uuids.len(), "checking listed UUIDs");
            let mut sink = CsvSink::create(&cfg.app.output)?;
            pipeline::run_list(&ctx, &uuids, &mut sink).await?;
        }
        None => {
            let since = args.since.as_deref().unwrap_or(DEFAULT_SINCE);
            let since = feed::validate_since(since)
                .with_context(|| format!("--since must be an RFC3339 timestamp: {}", since))?;
            info!(since, "earliest notification");

            let sink = CsvSink::create(&cfg.app.output)?;
            let notifications: Arc<dyn NotificationFeed> =
                Arc::new(FeedClient::from_config(http, &cfg));
            let (summary, _sink) =
                pipeline::run_stream(ctx.clone(), notifications, since, cfg.app.workers, sink)
                    .await?;
            info!(
                pages = summary.pages,
                emitted = summary.emitted,
                last_cursor = %summary.last_cursor,
                "notifications exhausted"
            );
        }
    }

    let stats = ctx.stats();
    info!(
        processed = stats.processed,
        failed = stats.failed,
        rows = stats.rows,
        output = %cfg.app.output,
        "content check complete"
    );
    Ok(())
}
