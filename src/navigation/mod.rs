//! Previous/next post resolution
//!
//! Navigation links are auxiliary: a failing sibling query only drops that
//! link, it never fails the post page.

use std::sync::Arc;

use crate::content::{normalize, Navigation, PostSummary};
use crate::error::Result;
use crate::repository::{ContentRepository, OrderField, Ordering, Predicate, QueryOptions};

pub struct SiblingResolver {
    repository: Arc<dyn ContentRepository>,
    document_type: String,
}

impl SiblingResolver {
    pub fn new(repository: Arc<dyn ContentRepository>, document_type: impl Into<String>) -> Self {
        Self {
            repository,
            document_type: document_type.into(),
        }
    }

    /// Siblings of the post whose document id is `target_id`
    ///
    /// Previous is the next entry after the target by first publication date
    /// (descending); next is the next entry after it by last publication date
    /// (descending).
    pub async fn resolve(&self, target_id: &str) -> Navigation {
        let (previous, next) = tokio::join!(
            self.sibling(target_id, OrderField::FirstPublicationDate),
            self.sibling(target_id, OrderField::LastPublicationDate),
        );

        Navigation {
            previous: previous.unwrap_or_else(|e| {
                tracing::warn!(target_id, error = %e, "Previous post lookup failed");
                None
            }),
            next: next.unwrap_or_else(|e| {
                tracing::warn!(target_id, error = %e, "Next post lookup failed");
                None
            }),
        }
    }

    async fn sibling(&self, target_id: &str, order_by: OrderField) -> Result<Option<PostSummary>> {
        let options = QueryOptions::new()
            .fetch([format!("{}.title", self.document_type)])
            .page_size(1)
            .after(target_id)
            .orderings(Ordering::desc(order_by));

        let response = self
            .repository
            .query(&Predicate::document_type(&self.document_type), &options)
            .await?;

        response.results.first().map(normalize::link).transpose()
    }
}
