use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, Credentials};
use crate::error::CheckError;
use crate::model::ContentRecord;

/// Read access to the content API plus the public binary store.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn fetch_content(&self, uuid: &str) -> Result<ContentRecord, CheckError>;

    /// Unauthenticated GET of a binary asset; only a 200 counts as present.
    async fn probe_binary(&self, url: &str) -> Result<(), CheckError>;
}

/// Shared HTTP client for the content API and the notifications feed.
pub fn build_http_client(timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder().user_agent("content-checker/0.1");
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().expect("reqwest client")
}

#[derive(Clone)]
pub struct ContentClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl fmt::Debug for ContentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ContentClient {
    pub fn new(http: Client, base_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    pub fn from_config(http: Client, cfg: &Config) -> Self {
        Self::new(http, cfg.api.content_url.clone(), cfg.credentials())
    }

    pub fn content_url(&self, uuid: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), uuid)
    }

    pub fn build_content_request(&self, uuid: &str) -> reqwest::Result<reqwest::Request> {
        let mut request = self.http.get(self.content_url(uuid));
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.user, Some(&creds.password));
        }
        request.build()
    }

    pub fn build_probe_request(&self, url: &str) -> reqwest::Result<reqwest::Request> {
        self.http.get(url).build()
    }
}

#[async_trait]
impl ContentApi for ContentClient {
    async fn fetch_content(&self, uuid: &str) -> Result<ContentRecord, CheckError> {
        let url = self.content_url(uuid);
        let fetch_failed = |source: reqwest::Error| CheckError::FetchFailed {
            url: url.clone(),
            source,
        };

        let request = self.build_content_request(uuid).map_err(fetch_failed)?;
        let res = self.http.execute(request).await.map_err(|err| {
            warn!(%url, ?err, "unable to fetch content");
            fetch_failed(err)
        })?;

        let status = res.status();
        if status != StatusCode::OK {
            drain(res).await;
            debug!(%url, %status, "unexpected content response");
            return Err(CheckError::ContentNotFound {
                status: status.as_u16(),
            });
        }

        // Reading the whole body up front leaves nothing for the decoder to
        // abandon on the connection.
        let body = res.bytes().await.map_err(fetch_failed)?;
        let mut record: ContentRecord = serde_json::from_slice(&body).map_err(|err| {
            warn!(%url, ?err, "unable to deserialize content");
            CheckError::DecodeFailed(err)
        })?;
        record.normalize_id(uuid);
        Ok(record)
    }

    async fn probe_binary(&self, url: &str) -> Result<(), CheckError> {
        let unreachable_err = |status: Option<u16>| CheckError::BinaryUnreachable {
            url: url.to_string(),
            status,
        };

        let request = self.build_probe_request(url).map_err(|err| {
            warn!(url, ?err, "invalid binary URL");
            unreachable_err(None)
        })?;
        let res = self.http.execute(request).await.map_err(|err| {
            warn!(url, ?err, "error retrieving binary");
            unreachable_err(None)
        })?;

        let status = res.status();
        drain(res).await;
        if status != StatusCode::OK {
            return Err(unreachable_err(Some(status.as_u16())));
        }
        Ok(())
    }
}

/// Read and discard the rest of the body so the connection can be reused.
pub(crate) async fn drain(mut res: Response) {
    loop {
        match res.chunk().await {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(err) => {
                debug!(?err, "failed to drain response body");
                break;
            }
        }
    }
}
