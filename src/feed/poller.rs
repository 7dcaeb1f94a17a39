use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::{filter_notifications, next_since, NotificationFeed};
use crate::error::CheckError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub pages: usize,
    pub emitted: usize,
    /// Cursor of the last page that was fetched.
    pub last_cursor: String,
}

/// Page through the feed from `since`, sending every checkable identifier
/// into `out`. Stops when a page's next cursor is missing, empty or equal to
/// the cursor that produced it. A failed page fetch ends the poll with
/// `FeedFetchFailed`.
#[instrument(skip_all, fields(since = %since))]
pub async fn poll(
    feed: &dyn NotificationFeed,
    since: &str,
    out: &mpsc::Sender<String>,
) -> Result<PollSummary, CheckError> {
    let mut cursor = since.to_string();
    let mut summary = PollSummary::default();

    loop {
        let page = feed.fetch_page(&cursor).await?;
        summary.pages += 1;
        summary.last_cursor = cursor.clone();

        let uuids = filter_notifications(&page);
        debug!(
            cursor = %cursor,
            notifications = page.notifications.len(),
            emitted = uuids.len(),
            "fetched notifications page"
        );
        for uuid in uuids {
            if out.send(uuid).await.is_err() {
                warn!("identifier queue closed; stopping poll");
                return Ok(summary);
            }
            summary.emitted += 1;
        }

        let next = page.next_link().and_then(next_since).unwrap_or_default();
        if next.is_empty() || next == cursor {
            info!(latest = %next, pages = summary.pages, "no more notifications to fetch");
            break;
        }
        cursor = next;
    }

    Ok(summary)
}
