//! Finds the image sets an article depends on.
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeSet;

use crate::error::CheckError;
use crate::ids;
use crate::model::ContentRecord;

pub const IMAGE_SET_TYPE: &str = "http://www.ft.com/ontology/content/ImageSet";
const CONTENT_TAG: &[u8] = b"ft-content";

/// Image-set UUIDs referenced by `record`, from its main image and from
/// `<ft-content type="...ImageSet" url="..."/>` links in the body.
///
/// A body that is not well-formed XML fails the whole resolution; references
/// without an extractable UUID are dropped.
pub fn resolve_image_sets(record: &ContentRecord) -> Result<BTreeSet<String>, CheckError> {
    let mut image_sets = BTreeSet::new();

    if let Some(uuid) = record.main_image.uuid() {
        image_sets.insert(uuid.to_string());
    }

    for url in embedded_image_set_urls(&record.body_xml)? {
        if let Some(uuid) = ids::extract_uuid(&url) {
            image_sets.insert(uuid.to_string());
        }
    }

    Ok(image_sets)
}

/// `url` attributes of every image-set `ft-content` element in `body`.
pub fn embedded_image_set_urls(body: &str) -> Result<Vec<String>, CheckError> {
    let mut reader = Reader::from_str(body);
    let mut depth = 0usize;
    let mut urls = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                collect_image_set_url(&element, &mut urls)?;
            }
            Ok(Event::Empty(element)) => collect_image_set_url(&element, &mut urls)?,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(CheckError::MarkupParseError(format!(
                    "{} at position {}",
                    err,
                    reader.buffer_position()
                )))
            }
        }
    }

    if depth > 0 {
        return Err(CheckError::MarkupParseError(format!(
            "{} unclosed element(s) at end of document",
            depth
        )));
    }
    Ok(urls)
}

fn collect_image_set_url(element: &BytesStart<'_>, urls: &mut Vec<String>) -> Result<(), CheckError> {
    if element.local_name().as_ref() != CONTENT_TAG {
        return Ok(());
    }

    let mut kind = None;
    let mut url = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|err| CheckError::MarkupParseError(err.to_string()))?;
        let value = || {
            attr.unescape_value()
                .map(|v| v.into_owned())
                .map_err(|err| CheckError::MarkupParseError(err.to_string()))
        };
        match attr.key.as_ref() {
            b"type" => kind = Some(value()?),
            b"url" => url = Some(value()?),
            _ => {}
        }
    }

    if let (Some(kind), Some(url)) = (kind, url) {
        if kind == IMAGE_SET_TYPE {
            urls.push(url);
        }
    }
    Ok(())
}
