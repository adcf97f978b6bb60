//! Query vocabulary and raw document shapes exchanged with the content repository

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document metadata field a query can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    FirstPublicationDate,
    LastPublicationDate,
}

impl OrderField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstPublicationDate => "first_publication_date",
            Self::LastPublicationDate => "last_publication_date",
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches("document.") {
            "first_publication_date" => Ok(Self::FirstPublicationDate),
            "last_publication_date" => Ok(Self::LastPublicationDate),
            other => Err(format!(
                "Unknown ordering key: {}. Available: first_publication_date, last_publication_date",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering of a query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: OrderField,
    pub direction: Direction,
}

impl Ordering {
    pub fn desc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    pub fn asc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    /// Ordering expression as understood by the repository API
    ///
    /// ```ignore
    /// Ordering::desc(OrderField::FirstPublicationDate).expression()
    /// // -> "[document.first_publication_date desc]"
    /// ```
    pub fn expression(&self) -> String {
        match self.direction {
            Direction::Desc => format!("[document.{} desc]", self.field),
            Direction::Asc => format!("[document.{}]", self.field),
        }
    }
}

/// Document filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    DocumentType(String),
}

impl Predicate {
    pub fn document_type(name: impl Into<String>) -> Self {
        Self::DocumentType(name.into())
    }

    pub fn expression(&self) -> String {
        match self {
            Self::DocumentType(name) => format!("[at(document.type, \"{}\")]", name),
        }
    }
}

/// Options recognized by repository queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Field selectors such as `posts.title`; empty means every field
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    /// Document id the result set starts after
    pub after: Option<String>,
    pub orderings: Option<Ordering>,
    /// Revision reference; `None` selects the published revision
    pub reference: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn orderings(mut self, ordering: Ordering) -> Self {
        self.orderings = Some(ordering);
        self
    }

    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<RawDocument>,
    /// Opaque cursor for the following page; `None` once exhausted
    #[serde(default)]
    pub next_page: Option<String>,
}

/// A document as returned by the repository, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub document_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: RawPostData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPostData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<RawImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<RawContentBlock>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContentBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: Vec<RawSpan>,
}

/// Rich-text node; only its text matters here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_expression() {
        assert_eq!(
            Ordering::desc(OrderField::FirstPublicationDate).expression(),
            "[document.first_publication_date desc]"
        );
        assert_eq!(
            Ordering::asc(OrderField::LastPublicationDate).expression(),
            "[document.last_publication_date]"
        );
    }

    #[test]
    fn test_parse_order_field() {
        assert_eq!(
            "document.last_publication_date".parse::<OrderField>().unwrap(),
            OrderField::LastPublicationDate
        );
        assert!("title".parse::<OrderField>().is_err());
    }

    #[test]
    fn test_deserialize_raw_document() {
        let json = r#"{
            "id": "YF1",
            "uid": "como-utilizar-hooks",
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": null,
            "data": {
                "title": "Como utilizar Hooks",
                "banner": { "url": "https://images.example/banner.png" },
                "content": [
                    { "heading": "Proin et varius", "body": [{ "type": "paragraph", "text": "Lorem ipsum", "spans": [] }] }
                ]
            }
        }"#;
        let doc: RawDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(doc.document_type, "posts");
        assert!(doc.last_publication_date.is_none());
        assert!(doc.data.subtitle.is_none());
        let content = doc.data.content.unwrap();
        assert_eq!(content[0].body[0].kind, "paragraph");
        assert_eq!(content[0].body[0].text.as_deref(), Some("Lorem ipsum"));
    }
}
