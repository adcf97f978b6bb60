//! In-process repository backed by a fixed document set
//!
//! Mirrors the query semantics of the HTTP API closely enough to drive the
//! paginator and sibling resolver offline: type filtering, ordering, `after`
//! anchoring, page sizes, field restriction, draft refs and opaque cursors.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{
    ContentRepository, Direction, OrderField, Ordering, Predicate, QueryOptions, QueryResponse,
    RawDocument,
};
use crate::error::{BlogError, Result};

const CURSOR_PREFIX: &str = "memory:";
const DEFAULT_PAGE_SIZE: u32 = 20;

/// On-disk fixture format: published documents plus draft sets keyed by ref
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    #[serde(default)]
    pub drafts: HashMap<String, Vec<RawDocument>>,
}

/// Everything needed to reproduce a page; serialized into the cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PageRequest {
    document_type: String,
    fetch: Vec<String>,
    page_size: u32,
    after: Option<String>,
    orderings: Option<Ordering>,
    reference: Option<String>,
    page: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    published: Vec<RawDocument>,
    drafts: HashMap<String, Vec<RawDocument>>,
    unavailable: bool,
}

impl MemoryRepository {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self {
            published: documents,
            ..Self::default()
        }
    }

    /// Load a JSON fixture file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read fixture {:?}", path.as_ref()))?;
        let fixture: Fixture = serde_json::from_str(&content)
            .with_context(|| format!("Invalid fixture {:?}", path.as_ref()))?;
        tracing::debug!(
            documents = fixture.documents.len(),
            drafts = fixture.drafts.len(),
            "Loaded fixture"
        );
        Ok(Self::from(fixture))
    }

    /// Register draft revisions visible under `reference`
    pub fn with_draft(mut self, reference: impl Into<String>, documents: Vec<RawDocument>) -> Self {
        self.drafts.insert(reference.into(), documents);
        self
    }

    /// A repository whose every call fails, as an unreachable backend would
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Published documents with the drafts of `reference` laid over them by id
    fn revision(&self, reference: Option<&str>) -> Result<Vec<RawDocument>> {
        if self.unavailable {
            return Err(BlogError::fetch("repository unavailable"));
        }

        let Some(reference) = reference else {
            return Ok(self.published.clone());
        };
        let drafts = self
            .drafts
            .get(reference)
            .ok_or_else(|| BlogError::fetch(format!("unknown or expired ref: {}", reference)))?;

        let mut documents = self.published.clone();
        for draft in drafts {
            match documents.iter_mut().find(|d| d.id == draft.id) {
                Some(existing) => *existing = draft.clone(),
                None => documents.push(draft.clone()),
            }
        }
        Ok(documents)
    }

    fn page(&self, request: &PageRequest) -> Result<QueryResponse> {
        let mut documents: Vec<RawDocument> = self
            .revision(request.reference.as_deref())?
            .into_iter()
            .filter(|d| d.document_type == request.document_type)
            .collect();

        if let Some(ordering) = &request.orderings {
            sort_documents(&mut documents, ordering);
        }

        if let Some(after) = &request.after {
            let pos = documents
                .iter()
                .position(|d| &d.id == after)
                .ok_or_else(|| BlogError::fetch(format!("unknown document id: {}", after)))?;
            documents.drain(..=pos);
        }

        let size = request.page_size.max(1) as usize;
        let start = request
            .page
            .checked_mul(size)
            .ok_or_else(|| BlogError::fetch(format!("page out of range: {}", request.page)))?;
        let end = start.saturating_add(size).min(documents.len());

        let results = documents
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|d| restrict(d, &request.fetch))
            .collect();

        let next_page = if end < documents.len() {
            let next = PageRequest {
                page: request.page + 1,
                ..request.clone()
            };
            Some(format!("{}{}", CURSOR_PREFIX, serde_json::to_string(&next)?))
        } else {
            None
        };

        Ok(QueryResponse { results, next_page })
    }
}

impl From<Fixture> for MemoryRepository {
    fn from(fixture: Fixture) -> Self {
        Self {
            published: fixture.documents,
            drafts: fixture.drafts,
            unavailable: false,
        }
    }
}

/// Stable sort by a publication date; missing dates sort as the oldest
fn sort_documents(documents: &mut [RawDocument], ordering: &Ordering) {
    let key = |d: &RawDocument| -> Option<chrono::DateTime<chrono::Utc>> {
        let value = match ordering.field {
            OrderField::FirstPublicationDate => d.first_publication_date.as_deref(),
            OrderField::LastPublicationDate => d.last_publication_date.as_deref(),
        };
        value.and_then(|v| crate::content::parse_timestamp(v).ok())
    };

    match ordering.direction {
        Direction::Asc => documents.sort_by(|a, b| key(a).cmp(&key(b))),
        Direction::Desc => documents.sort_by(|a, b| key(b).cmp(&key(a))),
    }
}

/// Drop data fields a `fetch` list does not select
fn restrict(document: &RawDocument, fetch: &[String]) -> RawDocument {
    let mut document = document.clone();
    if fetch.is_empty() {
        return document;
    }

    let wants = |field: &str| {
        fetch
            .iter()
            .any(|f| f.rsplit('.').next() == Some(field))
    };
    let data = &mut document.data;
    if !wants("title") {
        data.title = None;
    }
    if !wants("subtitle") {
        data.subtitle = None;
    }
    if !wants("author") {
        data.author = None;
    }
    if !wants("banner") {
        data.banner = None;
    }
    if !wants("content") {
        data.content = None;
    }
    document
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    async fn query(&self, predicate: &Predicate, options: &QueryOptions) -> Result<QueryResponse> {
        let Predicate::DocumentType(document_type) = predicate;
        self.page(&PageRequest {
            document_type: document_type.clone(),
            fetch: options.fetch.clone(),
            page_size: options.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            after: options.after.clone(),
            orderings: options.orderings,
            reference: options.reference.clone(),
            page: 0,
        })
    }

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<RawDocument> {
        self.revision(options.reference.as_deref())?
            .into_iter()
            .find(|d| d.document_type == document_type && d.uid.as_deref() == Some(uid))
            .ok_or_else(|| BlogError::fetch(format!("{} document not found: {}", document_type, uid)))
    }

    async fn follow(&self, cursor: &str) -> Result<QueryResponse> {
        let encoded = cursor
            .strip_prefix(CURSOR_PREFIX)
            .ok_or_else(|| BlogError::fetch(format!("foreign cursor: {}", cursor)))?;
        let request: PageRequest = serde_json::from_str(encoded)?;
        self.page(&request)
    }
}
