#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use content_checker::content::ContentApi;
use content_checker::error::CheckError;
use content_checker::feed::NotificationFeed;
use content_checker::model::{ContentRecord, Link, Notification, NotificationPage, Reference};
use content_checker::resolver::IMAGE_SET_TYPE;

pub const API: &str = "http://api.ft.com/content";
pub const UPDATE: &str = "http://www.ft.com/thing/ThingChangeType/UPDATE";

pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn content_url(uuid: &str) -> String {
    format!("{}/{}", API, uuid)
}

pub fn binary_url(uuid: &str) -> String {
    format!("http://img.example/{}.jpg", uuid)
}

/// Article with an optional main image set and image sets embedded in its body.
pub fn article(uuid: &str, main_image: Option<&String>, embedded: &[&String]) -> ContentRecord {
    let links: String = embedded
        .iter()
        .map(|set| {
            format!(
                r#"<ft-content type="{}" url="{}"></ft-content>"#,
                IMAGE_SET_TYPE,
                content_url(set)
            )
        })
        .collect();
    ContentRecord {
        id: uuid.to_string(),
        content_type: "http://www.ft.com/ontology/content/Article".into(),
        body_xml: format!("<body><p>story</p>{}</body>", links),
        main_image: Reference {
            id: main_image.map(|set| content_url(set)).unwrap_or_default(),
        },
        ..Default::default()
    }
}

pub fn image_set(uuid: &str, members: &[&String]) -> ContentRecord {
    ContentRecord {
        id: uuid.to_string(),
        content_type: "http://www.ft.com/ontology/content/ImageSet".into(),
        members: members
            .iter()
            .map(|m| Reference { id: content_url(m) })
            .collect(),
        ..Default::default()
    }
}

pub fn image_model(uuid: &str) -> ContentRecord {
    ContentRecord {
        id: uuid.to_string(),
        content_type: "http://www.ft.com/ontology/content/MediaResource".into(),
        binary_url: binary_url(uuid),
        ..Default::default()
    }
}

/// In-memory content API. Unknown ids answer 404, unknown binaries 404.
#[derive(Clone, Default)]
pub struct RecordingContent {
    records: Arc<Mutex<HashMap<String, ContentRecord>>>,
    binaries: Arc<Mutex<HashSet<String>>>,
    fetches: Arc<Mutex<Vec<String>>>,
    probes: Arc<Mutex<Vec<String>>>,
}

impl RecordingContent {
    pub async fn insert(&self, record: ContentRecord) {
        self.records.lock().await.insert(record.id.clone(), record);
    }

    /// Insert an image model whose binary resolves.
    pub async fn insert_model(&self, uuid: &str) {
        self.insert(image_model(uuid)).await;
        self.binaries.lock().await.insert(binary_url(uuid));
    }

    pub async fn fetches(&self) -> Vec<String> {
        self.fetches.lock().await.clone()
    }

    pub async fn probes(&self) -> Vec<String> {
        self.probes.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ContentApi for RecordingContent {
    async fn fetch_content(&self, uuid: &str) -> Result<ContentRecord, CheckError> {
        self.fetches.lock().await.push(uuid.to_string());
        self.records
            .lock()
            .await
            .get(uuid)
            .cloned()
            .ok_or(CheckError::ContentNotFound { status: 404 })
    }

    async fn probe_binary(&self, url: &str) -> Result<(), CheckError> {
        self.probes.lock().await.push(url.to_string());
        if self.binaries.lock().await.contains(url) {
            Ok(())
        } else {
            Err(CheckError::BinaryUnreachable {
                url: url.to_string(),
                status: Some(404),
            })
        }
    }
}

/// Notifications feed keyed by cursor. Missing cursors fail the fetch.
#[derive(Clone, Default)]
pub struct RecordingFeed {
    pages: Arc<Mutex<HashMap<String, NotificationPage>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingFeed {
    pub async fn add_page(&self, since: &str, page: NotificationPage) {
        self.pages.lock().await.insert(since.to_string(), page);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationFeed for RecordingFeed {
    async fn fetch_page(&self, since: &str) -> Result<NotificationPage, CheckError> {
        self.calls.lock().await.push(since.to_string());
        self.pages
            .lock()
            .await
            .get(since)
            .cloned()
            .ok_or_else(|| CheckError::FeedFetchFailed(format!("no page for {}", since)))
    }
}

pub fn notification(kind: &str, uuid: &str) -> Notification {
    Notification {
        kind: kind.to_string(),
        id: format!("http://www.ft.com/thing/{}", uuid),
        api_url: content_url(uuid),
        last_modified: "2016-04-01T00:00:00.000Z".into(),
    }
}

/// Page of update notifications; `next` is the cursor of the next link.
pub fn page(since: &str, uuids: &[&String], next: Option<&str>) -> NotificationPage {
    NotificationPage {
        request_url: format!("{}/notifications?since={}", API, since),
        notifications: uuids.iter().map(|u| notification(UPDATE, u)).collect(),
        links: next
            .map(|n| Link {
                href: format!("{}/notifications?since={}", API, n),
                rel: "next".into(),
            })
            .into_iter()
            .collect(),
    }
}

/// Minimal HTTP/1.1 responder: answers each request by path, ignoring the
/// query string, and records the raw request head.
pub async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let routes = routes.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&buf).to_string();
                let target = head.split_whitespace().nth(1).unwrap_or("");
                let path = target.split('?').next().unwrap_or("").to_string();
                log.lock().await.push(head);

                let (status, body) = routes
                    .iter()
                    .find(|(p, _, _)| *p == path)
                    .map(|(_, s, b)| (*s, *b))
                    .unwrap_or((404, "not found"));
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen)
}
