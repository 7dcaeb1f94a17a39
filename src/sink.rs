//! Where failure rows end up, plus the run counters.
use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::model::FailureRow;

/// Append-only destination for failure rows. Each `write_rows` call lands
/// contiguously.
pub trait RowSink: Send {
    fn write_rows(&mut self, rows: &[FailureRow]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RowSink for Vec<FailureRow> {
    fn write_rows(&mut self, rows: &[FailureRow]) -> Result<()> {
        self.extend_from_slice(rows);
        Ok(())
    }
}

/// Header-less CSV output; rows may have different lengths.
pub struct CsvSink<W: io::Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("failed to create output file: {}", path.display()))?;
        Ok(Self { writer })
    }
}

impl<W: io::Write> CsvSink<W> {
    pub fn from_writer(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(inner);
        Self { writer }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to flush csv output: {}", err.error()))
    }
}

impl<W: io::Write + Send> RowSink for CsvSink<W> {
    fn write_rows(&mut self, rows: &[FailureRow]) -> Result<()> {
        for row in rows {
            self.writer
                .write_record(row.fields())
                .context("failed to write csv row")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush csv output")
    }
}

/// Counters shared by every worker of a run.
#[derive(Debug, Default)]
pub struct AuditStats {
    processed: AtomicUsize,
    failed: AtomicUsize,
    rows: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Identifiers fully checked.
    pub processed: usize,
    /// Checks that stopped at the article itself.
    pub failed: usize,
    /// Failure rows written.
    pub rows: usize,
}

impl AuditStats {
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rows(&self, n: usize) {
        self.rows.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rows: self.rows.load(Ordering::Relaxed),
        }
    }
}

/// Single writer for the sink: drains `rows` until every sender is gone,
/// flushes, and hands the sink back. Writes run on the blocking pool.
pub async fn run_aggregator<S: RowSink + 'static>(
    mut rows: mpsc::Receiver<Vec<FailureRow>>,
    mut sink: S,
    stats: Arc<AuditStats>,
) -> Result<S> {
    while let Some(batch) = rows.recv().await {
        let written = batch.len();
        sink = on_blocking_pool(sink, move |sink| sink.write_rows(&batch)).await?;
        stats.record_rows(written);
    }
    sink = on_blocking_pool(sink, |sink| sink.flush()).await?;
    debug!("result sink closed");
    Ok(sink)
}

async fn on_blocking_pool<S, F>(mut sink: S, op: F) -> Result<S>
where
    S: RowSink + 'static,
    F: FnOnce(&mut S) -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&mut sink).map(|()| sink))
        .await
        .context("result sink writer panicked")?
}
