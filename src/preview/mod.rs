//! Preview mode - rendering a draft revision instead of the published one

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use std::sync::Arc;

use crate::content::{normalize, PostDetail};
use crate::error::Result;
use crate::repository::{ContentRepository, QueryOptions};

/// A fetched post together with the mode it was fetched in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub post: PostDetail,
    /// True when fetched through a preview token; enables the exit-preview link
    pub preview: bool,
}

/// Normalize an incoming preview token; blank values mean no preview
pub fn active_token(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.trim().is_empty())
}

/// Query string that keeps a link in preview mode (`?token=...`), empty outside it
pub fn preview_query(token: Option<&str>) -> String {
    match active_token(token) {
        Some(token) => format!("?token={}", utf8_percent_encode(token, NON_ALPHANUMERIC)),
        None => String::new(),
    }
}

pub struct PreviewGate {
    repository: Arc<dyn ContentRepository>,
    document_type: String,
}

impl PreviewGate {
    pub fn new(repository: Arc<dyn ContentRepository>, document_type: impl Into<String>) -> Self {
        Self {
            repository,
            document_type: document_type.into(),
        }
    }

    /// Fetch `uid`, from the revision `preview_token` selects when one is given
    ///
    /// The token is handed to the repository verbatim as the revision reference.
    /// Invalid or expired tokens come back as the repository's fetch failure.
    pub async fn resolve_revision(&self, uid: &str, preview_token: Option<&str>) -> Result<Revision> {
        let token = active_token(preview_token);
        let options = QueryOptions::new().reference(token.map(str::to_string));

        if token.is_some() {
            tracing::info!(uid, "Fetching draft revision for preview");
        }

        let document = self
            .repository
            .get_by_uid(&self.document_type, uid, &options)
            .await?;

        Ok(Revision {
            post: normalize::detail(&document)?,
            preview: token.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlogError;
    use crate::repository::{
        MemoryRepository, Predicate, QueryResponse, RawDocument, RawImage, RawPostData,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn doc(title: &str) -> RawDocument {
        RawDocument {
            id: "D1".to_string(),
            uid: Some("hooks".to_string()),
            document_type: "posts".to_string(),
            first_publication_date: None,
            last_publication_date: None,
            data: RawPostData {
                title: Some(title.to_string()),
                author: Some("Joseph".to_string()),
                banner: Some(RawImage {
                    url: Some("https://images.example/b.png".to_string()),
                }),
                content: Some(Vec::new()),
                ..RawPostData::default()
            },
        }
    }

    /// Records the options of every `get_by_uid` call
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<QueryOptions>>,
    }

    #[async_trait]
    impl ContentRepository for Recorder {
        async fn query(&self, _: &Predicate, _: &QueryOptions) -> Result<QueryResponse> {
            Ok(QueryResponse::default())
        }

        async fn get_by_uid(&self, _: &str, _: &str, options: &QueryOptions) -> Result<RawDocument> {
            self.calls.lock().unwrap().push(options.clone());
            Ok(doc("Recorded"))
        }

        async fn follow(&self, _: &str) -> Result<QueryResponse> {
            Ok(QueryResponse::default())
        }
    }

    #[test]
    fn test_preview_query() {
        assert_eq!(preview_query(None), "");
        assert_eq!(preview_query(Some("  ")), "");
        assert_eq!(
            preview_query(Some("https://x.prismic.io/previews/a:b")),
            "?token=https%3A%2F%2Fx%2Eprismic%2Eio%2Fpreviews%2Fa%3Ab"
        );
    }

    #[tokio::test]
    async fn test_token_passed_verbatim() {
        let recorder = Arc::new(Recorder::default());
        let gate = PreviewGate::new(recorder.clone(), "posts");
        let token = "https://blog.prismic.io/previews/XYZ:abc?websitePreviewId=1";

        let revision = gate.resolve_revision("hooks", Some(token)).await.unwrap();
        assert!(revision.preview);
        assert_eq!(
            recorder.calls.lock().unwrap()[0].reference.as_deref(),
            Some(token)
        );
    }

    #[tokio::test]
    async fn test_no_token_means_no_reference() {
        let recorder = Arc::new(Recorder::default());
        let gate = PreviewGate::new(recorder.clone(), "posts");

        let revision = gate.resolve_revision("hooks", None).await.unwrap();
        assert!(!revision.preview);
        gate.resolve_revision("hooks", Some("")).await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert!(calls.iter().all(|c| c.reference.is_none()));
    }

    #[tokio::test]
    async fn test_draft_revision_is_rendered() {
        let repo = MemoryRepository::new(vec![doc("Published")])
            .with_draft("draft-ref", vec![doc("Draft")]);
        let gate = PreviewGate::new(Arc::new(repo), "posts");

        let published = gate.resolve_revision("hooks", None).await.unwrap();
        assert_eq!(published.post.title, "Published");

        let draft = gate.resolve_revision("hooks", Some("draft-ref")).await.unwrap();
        assert_eq!(draft.post.title, "Draft");
        assert!(draft.preview);
    }

    #[tokio::test]
    async fn test_expired_token_fails() {
        let gate = PreviewGate::new(Arc::new(MemoryRepository::new(vec![doc("Published")])), "posts");
        let err = gate.resolve_revision("hooks", Some("expired")).await.unwrap_err();
        assert!(err.is_fetch_failure());

        let err = gate.resolve_revision("missing", None).await.unwrap_err();
        assert!(matches!(err, BlogError::FetchFailed(_)));
    }
}
