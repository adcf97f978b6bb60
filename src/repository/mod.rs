//! Content repository - the headless backend posts are sourced from
//!
//! The repository is always an explicitly constructed value handed to the
//! components that need it, so tests can swap in [`MemoryRepository`].

mod memory;
mod prismic;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::{Fixture, MemoryRepository};
pub use prismic::PrismicClient;
pub use types::{
    Direction, OrderField, Ordering, Predicate, QueryOptions, QueryResponse, RawContentBlock,
    RawDocument, RawImage, RawPostData, RawSpan,
};

/// Read-only access to repository documents
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch one page of documents matching `predicate`
    async fn query(&self, predicate: &Predicate, options: &QueryOptions) -> Result<QueryResponse>;

    /// Fetch a single document of `document_type` by its uid
    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<RawDocument>;

    /// Fetch the page a `next_page` cursor points at, passing the cursor verbatim
    async fn follow(&self, cursor: &str) -> Result<QueryResponse>;
}
