//! Raw repository documents -> validated post models
//!
//! Documents missing a required field are rejected here so nothing
//! null-filled reaches pagination state or a rendered page.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{ContentBlock, PostDetail, PostSummary, RichTextSpan};
use crate::error::{BlogError, Result};
use crate::repository::RawDocument;

/// Parse a repository timestamp (`2021-03-25T19:25:28+0000` or RFC 3339) into UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];
    for fmt in formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    // Offset-less timestamps are taken as UTC
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }

    Err(BlogError::fetch(format!("unparsable timestamp: {}", s)))
}

fn timestamp(document: &RawDocument, field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|v| {
            parse_timestamp(v)
                .map_err(|_| BlogError::malformed(&document.id, format!("invalid {}: {}", field, v)))
        })
        .transpose()
}

fn required(document: &RawDocument, field: &str, value: Option<&String>) -> Result<String> {
    value
        .cloned()
        .ok_or_else(|| BlogError::malformed(&document.id, format!("missing {}", field)))
}

/// Uids are URL slugs and name output directories: ASCII letters, digits, `-` and `_`
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn uid(document: &RawDocument) -> Result<String> {
    match document.uid.as_deref() {
        Some(uid) if is_valid_uid(uid) => Ok(uid.to_string()),
        Some(uid) if !uid.trim().is_empty() => Err(BlogError::malformed(
            &document.id,
            format!("uid is not a URL slug: {:?}", uid),
        )),
        _ => Err(BlogError::malformed(&document.id, "missing uid")),
    }
}

/// Keep only the fields an index listing shows
pub fn summary(document: &RawDocument) -> Result<PostSummary> {
    Ok(PostSummary {
        uid: uid(document)?,
        first_publication_date: timestamp(
            document,
            "first_publication_date",
            document.first_publication_date.as_deref(),
        )?,
        title: required(document, "title", document.data.title.as_ref())?,
        subtitle: required(document, "subtitle", document.data.subtitle.as_ref())?,
        author: required(document, "author", document.data.author.as_ref())?,
    })
}

/// Keep only uid and title, for previous/next links
pub fn link(document: &RawDocument) -> Result<PostSummary> {
    Ok(PostSummary::link(
        uid(document)?,
        required(document, "title", document.data.title.as_ref())?,
    ))
}

/// Full post with its content blocks in source order
pub fn detail(document: &RawDocument) -> Result<PostDetail> {
    let data = &document.data;

    let banner_url = data
        .banner
        .as_ref()
        .and_then(|b| b.url.clone())
        .ok_or_else(|| BlogError::malformed(&document.id, "missing banner url"))?;

    let content = data
        .content
        .iter()
        .flatten()
        .map(|block| ContentBlock {
            heading: block.heading.clone().unwrap_or_default(),
            body: block
                .body
                .iter()
                .map(|span| RichTextSpan {
                    kind: span.kind.clone(),
                    text: span.text.clone().unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    Ok(PostDetail {
        id: document.id.clone(),
        uid: uid(document)?,
        first_publication_date: timestamp(
            document,
            "first_publication_date",
            document.first_publication_date.as_deref(),
        )?,
        last_publication_date: timestamp(
            document,
            "last_publication_date",
            document.last_publication_date.as_deref(),
        )?,
        title: required(document, "title", data.title.as_ref())?,
        subtitle: data.subtitle.clone().unwrap_or_default(),
        author: required(document, "author", data.author.as_ref())?,
        banner_url,
        content,
    })
}
