//! Wires the feed poller to a fixed pool of check workers.
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::checker::Checker;
use crate::feed::{poll, NotificationFeed, PollSummary};
use crate::model::FailureRow;
use crate::sink::{run_aggregator, AuditStats, RowSink, StatsSnapshot};

/// State handed to every worker: the registered checkers and run counters.
pub struct AuditContext {
    checkers: Vec<Arc<dyn Checker>>,
    stats: Arc<AuditStats>,
}

impl AuditContext {
    pub fn new(checkers: Vec<Arc<dyn Checker>>) -> Self {
        Self {
            checkers,
            stats: Arc::new(AuditStats::default()),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Run every checker against `uuid` and gather their rows.
    pub async fn check(&self, uuid: &str) -> Vec<FailureRow> {
        let mut rows = Vec::new();
        for checker in &self.checkers {
            let report = checker.check(uuid).await;
            if let Some(err) = &report.error {
                self.stats.record_failed();
                error!(uuid, checker = checker.name(), rows = ?report.rows, %err, "check failed");
            }
            rows.extend(report.rows);
        }
        rows
    }
}

/// Check an explicit list of identifiers one after another.
pub async fn run_list<S: RowSink>(ctx: &AuditContext, uuids: &[String], sink: &mut S) -> Result<()> {
    for uuid in uuids {
        let rows = ctx.check(uuid).await;
        sink.write_rows(&rows)?;
        ctx.stats.record_rows(rows.len());
        ctx.stats.record_processed();
    }
    sink.flush()
}

/// Poll the feed from `since` and check every emitted identifier on
/// `workers` concurrent workers. Returns once the feed is exhausted and every
/// queued identifier has been checked, handing the sink back.
///
/// A feed failure stops the workers, flushes what was already written and is
/// returned as the error. A sink failure stops the workers and the poller and
/// is returned instead.
pub async fn run_stream<S: RowSink + 'static>(
    ctx: Arc<AuditContext>,
    feed: Arc<dyn NotificationFeed>,
    since: &str,
    workers: usize,
    sink: S,
) -> Result<(PollSummary, S)> {
    let workers = workers.max(1);
    let (uuid_tx, uuid_rx) = mpsc::channel::<String>(workers);
    let (row_tx, row_rx) = mpsc::channel::<Vec<FailureRow>>(workers);

    let aggregator = tokio::spawn(run_aggregator(row_rx, sink, ctx.stats.clone()));

    let queue = Arc::new(Mutex::new(uuid_rx));
    let handles: Vec<JoinHandle<()>> = (0..workers)
        .map(|id| tokio::spawn(worker(id, ctx.clone(), queue.clone(), row_tx.clone())))
        .collect();
    // The receiver must close once every worker is gone so the poller sees it.
    drop(queue);
    drop(row_tx);
    info!(workers, since, "starting content check");

    let polled = poll(feed.as_ref(), since, &uuid_tx).await;
    drop(uuid_tx);

    if polled.is_err() {
        for handle in &handles {
            handle.abort();
        }
    }
    for joined in join_all(handles).await {
        if let Err(err) = joined {
            if !err.is_cancelled() {
                error!(?err, "worker terminated abnormally");
            }
        }
    }

    let sink = aggregator.await.context("result sink task failed")??;
    let summary = polled.context("polling notifications failed")?;
    Ok((summary, sink))
}

#[instrument(skip_all, fields(worker = id))]
async fn worker(
    id: usize,
    ctx: Arc<AuditContext>,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    rows: mpsc::Sender<Vec<FailureRow>>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(uuid) = next else { break };

        let found = ctx.check(&uuid).await;
        if !found.is_empty() && rows.send(found).await.is_err() {
            error!(uuid, "result sink closed; worker stopping");
            break;
        }
        ctx.stats.record_processed();
    }
    debug!("worker finished");
}
