use serde::{Deserialize, Serialize};

use crate::ids;

/// Change type carried by notifications for removed content.
pub const DELETE_NOTIFICATION: &str = "http://www.ft.com/thing/ThingChangeType/DELETE";

/// A pointer to another piece of content, e.g. `mainImage` or a set member.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Reference {
    pub id: String,
}

impl Reference {
    pub fn uuid(&self) -> Option<&str> {
        ids::extract_uuid(&self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Identifier {
    pub authority: String,
    pub identifier_value: String,
}

/// Decoded content API record. Articles, image sets and image models all
/// share this shape; fields that do not apply are left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    #[serde(rename = "bodyXML")]
    pub body_xml: String,
    pub identifiers: Vec<Identifier>,
    pub main_image: Reference,
    pub members: Vec<Reference>,
    pub binary_url: String,
    pub publish_reference: String,
    pub last_modified: String,
}

impl ContentRecord {
    /// Rewrite `id` to a bare UUID. The API reports ids as thing URIs; when
    /// none can be found the id that was requested is used instead.
    pub fn normalize_id(&mut self, requested: &str) {
        if ids::is_valid_uuid(&self.id) {
            return;
        }
        self.id = ids::extract_uuid(&self.id)
            .unwrap_or(requested)
            .to_string();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub api_url: String,
    pub last_modified: String,
}

impl Notification {
    pub fn is_delete(&self) -> bool {
        self.kind == DELETE_NOTIFICATION
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

/// One page of the notifications feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationPage {
    pub request_url: String,
    pub notifications: Vec<Notification>,
    pub links: Vec<Link>,
}

impl NotificationPage {
    /// Href of the first link with `rel == "next"`.
    pub fn next_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "next")
            .map(|link| link.href.as_str())
    }
}

/// One broken dependency path. The number of fields tells how far the
/// check got: `[article, error]`, `[article, set]`, `[article, set, model]`
/// or `[article, set, model, binary_url]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FailureRow(Vec<String>);

impl FailureRow {
    pub fn article(article: &str, error: impl Into<String>) -> Self {
        Self(vec![article.to_string(), error.into()])
    }

    pub fn image_set(article: &str, image_set: &str) -> Self {
        Self(vec![article.to_string(), image_set.to_string()])
    }

    pub fn image_model(article: &str, image_set: &str, image_model: &str) -> Self {
        Self(vec![
            article.to_string(),
            image_set.to_string(),
            image_model.to_string(),
        ])
    }

    pub fn binary(article: &str, image_set: &str, image_model: &str, binary_url: &str) -> Self {
        Self(vec![
            article.to_string(),
            image_set.to_string(),
            image_model.to_string(),
            binary_url.to_string(),
        ])
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn content_id(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_content_record_with_missing_fields() {
        let record: ContentRecord = serde_json::from_value(json!({
            "id": "http://www.ft.com/thing/3c1f5a2e-7b1d-4c5e-9a8f-0123456789ab",
            "type": "http://www.ft.com/ontology/content/Article",
            "bodyXML": "<body/>",
            "mainImage": { "id": "http://api.ft.com/content/00000000-0000-0000-0000-000000000001" }
        }))
        .unwrap();
        assert_eq!(record.content_type, "http://www.ft.com/ontology/content/Article");
        assert_eq!(record.body_xml, "<body/>");
        assert_eq!(
            record.main_image.uuid(),
            Some("00000000-0000-0000-0000-000000000001")
        );
        assert!(record.members.is_empty());
        assert!(record.binary_url.is_empty());
    }

    #[test]
    fn normalize_id_prefers_embedded_uuid() {
        let mut record = ContentRecord {
            id: "http://www.ft.com/thing/3c1f5a2e-7b1d-4c5e-9a8f-0123456789ab".into(),
            ..Default::default()
        };
        record.normalize_id("00000000-0000-0000-0000-000000000001");
        assert_eq!(record.id, "3c1f5a2e-7b1d-4c5e-9a8f-0123456789ab");

        let mut record = ContentRecord::default();
        record.normalize_id("00000000-0000-0000-0000-000000000001");
        assert_eq!(record.id, "00000000-0000-0000-0000-000000000001");
    }

    #[test]
    fn next_link_picks_rel_next() {
        let page: NotificationPage = serde_json::from_value(json!({
            "requestUrl": "http://api/notifications?since=a",
            "notifications": [],
            "links": [
                { "href": "http://api/self", "rel": "self" },
                { "href": "http://api/notifications?since=b", "rel": "next" }
            ]
        }))
        .unwrap();
        assert_eq!(page.next_link(), Some("http://api/notifications?since=b"));
        assert!(NotificationPage::default().next_link().is_none());
    }

    #[test]
    fn failure_rows_are_hop_truncated() {
        assert_eq!(FailureRow::article("a", "boom").fields().len(), 2);
        assert_eq!(FailureRow::image_set("a", "s").fields(), ["a", "s"]);
        assert_eq!(FailureRow::image_model("a", "s", "m").fields().len(), 3);
        let row = FailureRow::binary("a", "s", "m", "http://b");
        assert_eq!(row.fields().len(), 4);
        assert_eq!(row.content_id(), "a");
    }
}
