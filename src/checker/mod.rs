use async_trait::async_trait;

use crate::error::CheckError;
use crate::model::FailureRow;

pub mod image;

pub use image::ImageChecker;

/// Outcome of running one checker against one content identifier.
///
/// An empty report means everything the checker looked at resolved. When
/// `error` is set the check stopped early; `rows` then holds the single row
/// describing why.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub rows: Vec<FailureRow>,
    pub error: Option<CheckError>,
}

impl CheckReport {
    pub fn aborted(uuid: &str, error: CheckError) -> Self {
        Self {
            rows: vec![FailureRow::article(uuid, error.to_string())],
            error: Some(error),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.rows.is_empty() && self.error.is_none()
    }
}

/// A referential-integrity check run against each content identifier.
#[async_trait]
pub trait Checker: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, uuid: &str) -> CheckReport;
}
