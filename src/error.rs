//! Error kinds raised while auditing content.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    /// Transport failure talking to the content API.
    #[error("unable to fetch {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The content API answered with something other than 200.
    #[error("could not fetch content")]
    ContentNotFound { status: u16 },
    #[error("unable to deserialize JSON: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    #[error("unable to parse document: {0}")]
    MarkupParseError(String),
    #[error("binary unreachable: {url}")]
    BinaryUnreachable { url: String, status: Option<u16> },
    #[error("unexpected notification URL: {0}")]
    MalformedNotification(String),
    #[error("notifications feed unavailable: {0}")]
    FeedFetchFailed(String),
}

impl CheckError {
    /// Status code reported by the remote end, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CheckError::ContentNotFound { status } => Some(*status),
            CheckError::BinaryUnreachable { status, .. } => *status,
            _ => None,
        }
    }
}
