use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use std::fmt;
use tracing::{info, warn};
use url::Url;

use crate::config::{Config, Credentials};
use crate::content::drain;
use crate::error::CheckError;
use crate::ids;
use crate::model::NotificationPage;

pub mod poller;

pub use poller::{poll, PollSummary};

pub const DEFAULT_SINCE: &str = "2016-03-31T00:00:00Z";

/// Source of notification pages, one per cursor.
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    async fn fetch_page(&self, since: &str) -> Result<NotificationPage, CheckError>;
}

#[derive(Clone)]
pub struct FeedClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FeedClient {
    pub fn new(http: Client, base_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    pub fn from_config(http: Client, cfg: &Config) -> Self {
        Self::new(http, cfg.api.notifications_url.clone(), cfg.credentials())
    }

    pub fn build_page_request(&self, since: &str) -> reqwest::Result<reqwest::Request> {
        let mut request = self.http.get(&self.base_url).query(&[("since", since)]);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.user, Some(&creds.password));
        }
        request.build()
    }
}

#[async_trait]
impl NotificationFeed for FeedClient {
    async fn fetch_page(&self, since: &str) -> Result<NotificationPage, CheckError> {
        let request = self
            .build_page_request(since)
            .map_err(|err| CheckError::FeedFetchFailed(err.to_string()))?;
        let url = request.url().to_string();

        let res = self
            .http
            .execute(request)
            .await
            .map_err(|err| CheckError::FeedFetchFailed(format!("{}: {}", url, err)))?;

        let status = res.status();
        if status != StatusCode::OK {
            drain(res).await;
            return Err(CheckError::FeedFetchFailed(format!(
                "unexpected HTTP response {} from {}",
                status, url
            )));
        }

        let body = res
            .bytes()
            .await
            .map_err(|err| CheckError::FeedFetchFailed(format!("{}: {}", url, err)))?;
        serde_json::from_slice(&body).map_err(|err| {
            CheckError::FeedFetchFailed(format!("unable to deserialize page from {}: {}", url, err))
        })
    }
}

/// Check that a starting cursor is an RFC3339 timestamp.
pub fn validate_since(since: &str) -> Result<&str, chrono::ParseError> {
    DateTime::parse_from_rfc3339(since)?;
    Ok(since)
}

/// Value of the `since` query parameter of a "next" link, percent-decoded.
/// A literal `+` is kept: in a cursor it is a UTC offset sign, not a space.
pub fn next_since(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let query = url.query()?.replace('+', "%2B");
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "since")
        .map(|(_, value)| value.into_owned())
}

/// Identifiers worth checking from one page, in page order. Entries whose
/// API URL carries no UUID and delete notifications are skipped.
pub fn filter_notifications(page: &NotificationPage) -> Vec<String> {
    let mut uuids = Vec::with_capacity(page.notifications.len());
    for notification in &page.notifications {
        let Some(uuid) = ids::extract_uuid(&notification.api_url) else {
            let err = CheckError::MalformedNotification(notification.api_url.clone());
            warn!(%err, "skipping unexpected URL");
            continue;
        };
        if notification.is_delete() {
            info!(api_url = %notification.api_url, "skipping delete notification");
            continue;
        }
        uuids.push(uuid.to_string());
    }
    uuids
}
