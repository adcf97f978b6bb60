//! Cursor-driven incremental loading of the post index
//!
//! The cursor handed out by the repository is opaque: it is stored as-is and
//! passed back verbatim, never derived from page sizes or offsets.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::content::{normalize, PostSummary};
use crate::error::Result;
use crate::repository::{ContentRepository, OrderField, Ordering, Predicate, QueryOptions, QueryResponse};

/// Posts loaded so far and where to resume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    /// Posts in fetch order, unique by uid
    pub loaded: Vec<PostSummary>,
    /// `None` once the last page has been loaded
    pub cursor: Option<String>,
}

impl PaginationState {
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Append a page, skipping posts whose uid is already loaded, and take its cursor
    fn merge(&mut self, page: Vec<PostSummary>, cursor: Option<String>) -> usize {
        let mut seen: HashSet<String> = self.loaded.iter().map(|p| p.uid.clone()).collect();
        let before = self.loaded.len();

        for post in page {
            if seen.insert(post.uid.clone()) {
                self.loaded.push(post);
            } else {
                tracing::debug!(uid = %post.uid, "Skipping post already loaded");
            }
        }

        self.cursor = cursor;
        self.loaded.len() - before
    }
}

/// Loads the post index page by page
pub struct Paginator {
    repository: Arc<dyn ContentRepository>,
    document_type: String,
    reference: Option<String>,
}

impl Paginator {
    pub fn new(repository: Arc<dyn ContentRepository>, document_type: impl Into<String>) -> Self {
        Self {
            repository,
            document_type: document_type.into(),
            reference: None,
        }
    }

    /// Read from a specific revision (a preview ref) instead of the published one
    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Fetch the first page, newest first by `order_by`
    pub async fn initialize(&self, page_size: u32, order_by: OrderField) -> Result<PaginationState> {
        let options = QueryOptions::new()
            .fetch(
                ["title", "subtitle", "author"]
                    .iter()
                    .map(|field| format!("{}.{}", self.document_type, field)),
            )
            .page_size(page_size)
            .orderings(Ordering::desc(order_by))
            .reference(self.reference.clone());

        let response = self
            .repository
            .query(&Predicate::document_type(&self.document_type), &options)
            .await?;

        let (page, cursor) = summarize(response)?;
        let mut state = PaginationState::default();
        state.merge(page, cursor);

        tracing::debug!(
            loaded = state.loaded.len(),
            has_more = state.has_more(),
            "Loaded first index page"
        );
        Ok(state)
    }

    /// Follow the cursor and append the next page; returns how many posts were added
    ///
    /// A state without a cursor is left alone. On error the state is untouched.
    pub async fn load_next(&self, state: &mut PaginationState) -> Result<usize> {
        let Some(cursor) = state.cursor.as_deref() else {
            return Ok(0);
        };

        let response = self.repository.follow(cursor).await?;
        let (page, cursor) = summarize(response)?;
        let added = state.merge(page, cursor);

        tracing::debug!(
            added,
            loaded = state.loaded.len(),
            has_more = state.has_more(),
            "Loaded next index page"
        );
        Ok(added)
    }

    /// Keep loading until the repository reports no further page
    pub async fn exhaust(&self, state: &mut PaginationState) -> Result<()> {
        while state.has_more() {
            self.load_next(state).await?;
        }
        Ok(())
    }
}

/// Normalize every document of a page; one bad document fails the page
fn summarize(response: QueryResponse) -> Result<(Vec<PostSummary>, Option<String>)> {
    let page = response
        .results
        .iter()
        .map(normalize::summary)
        .collect::<Result<Vec<_>>>()?;
    Ok((page, response.next_page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlogError;
    use crate::repository::{MemoryRepository, RawDocument, RawPostData};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn doc(n: u32) -> RawDocument {
        RawDocument {
            id: format!("ID{}", n),
            uid: Some(format!("post-{}", n)),
            document_type: "posts".to_string(),
            first_publication_date: Some(format!("2021-01-{:02}T10:00:00+0000", n)),
            last_publication_date: None,
            data: RawPostData {
                title: Some(format!("Post {}", n)),
                subtitle: Some("Subtitle".to_string()),
                author: Some("Author".to_string()),
                ..RawPostData::default()
            },
        }
    }

    fn corpus(count: u32) -> Arc<dyn ContentRepository> {
        Arc::new(MemoryRepository::new((1..=count).map(doc).collect()))
    }

    /// Serves scripted pages in order and records the cursors it was given
    struct ScriptedRepository {
        first: QueryResponse,
        pages: Mutex<Vec<Result<QueryResponse>>>,
        followed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContentRepository for ScriptedRepository {
        async fn query(&self, _: &Predicate, _: &QueryOptions) -> Result<QueryResponse> {
            Ok(self.first.clone())
        }

        async fn get_by_uid(&self, _: &str, uid: &str, _: &QueryOptions) -> Result<RawDocument> {
            Err(BlogError::fetch(format!("not found: {}", uid)))
        }

        async fn follow(&self, cursor: &str) -> Result<QueryResponse> {
            self.followed.lock().unwrap().push(cursor.to_string());
            self.pages.lock().unwrap().remove(0)
        }
    }

    fn response(numbers: &[u32], next_page: Option<&str>) -> QueryResponse {
        QueryResponse {
            results: numbers.iter().copied().map(doc).collect(),
            next_page: next_page.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_initialize_newest_first() {
        let paginator = Paginator::new(corpus(5), "posts");
        let state = paginator
            .initialize(2, OrderField::FirstPublicationDate)
            .await
            .unwrap();

        let uids: Vec<_> = state.loaded.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["post-5", "post-4"]);
        assert!(state.has_more());
    }

    #[tokio::test]
    async fn test_exhaust_yields_unique_posts_for_any_page_size() {
        for page_size in 1..=7 {
            let paginator = Paginator::new(corpus(6), "posts");
            let mut state = paginator
                .initialize(page_size, OrderField::FirstPublicationDate)
                .await
                .unwrap();
            paginator.exhaust(&mut state).await.unwrap();

            let uids: HashSet<_> = state.loaded.iter().map(|p| &p.uid).collect();
            assert_eq!(uids.len(), state.loaded.len(), "page size {}", page_size);
            assert_eq!(state.loaded.len(), 6, "page size {}", page_size);
            assert!(state.cursor.is_none());
        }
    }

    #[tokio::test]
    async fn test_load_next_without_cursor_is_noop() {
        let paginator = Paginator::new(corpus(2), "posts");
        let mut state = paginator
            .initialize(10, OrderField::FirstPublicationDate)
            .await
            .unwrap();
        assert!(state.cursor.is_none());

        let before = state.clone();
        assert_eq!(paginator.load_next(&mut state).await.unwrap(), 0);
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn test_load_next_forwards_cursor_and_dedups_boundary() {
        let repo = Arc::new(ScriptedRepository {
            first: response(&[4, 3], Some("https://cdn.example/page=2&x=1")),
            pages: Mutex::new(vec![Ok(response(&[3, 2], Some("opaque-3"))), Ok(response(&[1], None))]),
            followed: Mutex::new(Vec::new()),
        });
        let paginator = Paginator::new(repo.clone(), "posts");

        let mut state = paginator
            .initialize(2, OrderField::FirstPublicationDate)
            .await
            .unwrap();
        assert_eq!(paginator.load_next(&mut state).await.unwrap(), 1);
        assert_eq!(state.cursor.as_deref(), Some("opaque-3"));
        assert_eq!(paginator.load_next(&mut state).await.unwrap(), 1);

        let uids: Vec<_> = state.loaded.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["post-4", "post-3", "post-2", "post-1"]);
        assert!(state.cursor.is_none());
        assert_eq!(
            *repo.followed.lock().unwrap(),
            vec!["https://cdn.example/page=2&x=1".to_string(), "opaque-3".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_page_leaves_state_untouched() {
        let mut malformed = response(&[2, 1], None);
        malformed.results[1].data.title = None;

        let repo = Arc::new(ScriptedRepository {
            first: response(&[4, 3], Some("next")),
            pages: Mutex::new(vec![
                Err(BlogError::fetch("connection reset")),
                Ok(malformed),
            ]),
            followed: Mutex::new(Vec::new()),
        });
        let paginator = Paginator::new(repo, "posts");
        let mut state = paginator
            .initialize(2, OrderField::FirstPublicationDate)
            .await
            .unwrap();
        let before = state.clone();

        let err = paginator.load_next(&mut state).await.unwrap_err();
        assert!(err.is_fetch_failure());
        assert_eq!(state, before);

        let err = paginator.load_next(&mut state).await.unwrap_err();
        assert!(matches!(err, BlogError::MalformedContent { .. }));
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn test_preview_reference_reaches_repository() {
        let mut draft = doc(9);
        draft.data.title = Some("Draft".to_string());
        let repo = MemoryRepository::new((1..=2).map(doc).collect()).with_draft("ref-1", vec![draft]);
        let paginator =
            Paginator::new(Arc::new(repo), "posts").with_reference(Some("ref-1".to_string()));

        let state = paginator
            .initialize(10, OrderField::FirstPublicationDate)
            .await
            .unwrap();
        assert_eq!(state.loaded[0].title, "Draft");
        assert_eq!(state.loaded.len(), 3);
    }
}
