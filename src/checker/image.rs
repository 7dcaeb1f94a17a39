//! Verifies that every image an article references can be fetched.
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::checker::{CheckReport, Checker};
use crate::content::ContentApi;
use crate::model::FailureRow;
use crate::resolver;

/// Walks article -> image sets -> image models -> binaries. Every hop that
/// fails adds a row and the walk moves on to the next sibling.
pub struct ImageChecker {
    content: Arc<dyn ContentApi>,
}

impl ImageChecker {
    pub fn new(content: Arc<dyn ContentApi>) -> Self {
        Self { content }
    }

    async fn check_image_set(&self, article: &str, image_set_uuid: &str, rows: &mut Vec<FailureRow>) {
        let image_set = match self.content.fetch_content(image_set_uuid).await {
            Ok(image_set) => image_set,
            Err(err) => {
                warn!(article, image_set = image_set_uuid, %err, "unable to fetch image set");
                rows.push(FailureRow::image_set(article, image_set_uuid));
                return;
            }
        };

        for member in &image_set.members {
            let Some(image_model_uuid) = member.uuid() else {
                debug!(article, member = %member.id, "skipping image set member without uuid");
                continue;
            };
            if let Some(row) = self
                .check_image_model(article, image_set_uuid, image_model_uuid)
                .await
            {
                rows.push(row);
            }
        }
    }

    async fn check_image_model(
        &self,
        article: &str,
        image_set_uuid: &str,
        image_model_uuid: &str,
    ) -> Option<FailureRow> {
        let image_model = match self.content.fetch_content(image_model_uuid).await {
            Ok(image_model) => image_model,
            Err(err) => {
                warn!(article, image_model = image_model_uuid, %err, "error retrieving image model");
                return Some(FailureRow::image_model(article, image_set_uuid, image_model_uuid));
            }
        };

        match self.content.probe_binary(&image_model.binary_url).await {
            Ok(()) => None,
            Err(err) => {
                warn!(article, binary_url = %image_model.binary_url, %err, "error retrieving binary");
                Some(FailureRow::binary(
                    article,
                    image_set_uuid,
                    image_model_uuid,
                    &image_model.binary_url,
                ))
            }
        }
    }
}

#[async_trait]
impl Checker for ImageChecker {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn check(&self, uuid: &str) -> CheckReport {
        let article = match self.content.fetch_content(uuid).await {
            Ok(article) => article,
            Err(err) => return CheckReport::aborted(uuid, err),
        };

        let image_sets = match resolver::resolve_image_sets(&article) {
            Ok(image_sets) => image_sets,
            Err(err) => return CheckReport::aborted(uuid, err),
        };
        debug!(uuid, image_sets = image_sets.len(), "resolved image sets");

        let mut rows = Vec::new();
        for image_set_uuid in &image_sets {
            self.check_image_set(uuid, image_set_uuid, &mut rows).await;
        }

        CheckReport { rows, error: None }
    }
}
