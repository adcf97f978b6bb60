//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as listed on the index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// URL-safe identifier, unique per post
    pub uid: String,

    /// When the post was first published
    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// A summary carrying only what a navigation link needs
    pub fn link(uid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            first_publication_date: None,
            title: title.into(),
            subtitle: String::new(),
            author: String::new(),
        }
    }

    /// Site-relative path of the post page
    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

/// A fully fetched post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    /// Backend document id, the anchor for sibling queries
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    /// Set once the document has been edited after its first publication
    pub last_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub content: Vec<ContentBlock>,
}

impl PostDetail {
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }

    /// Whether the post was edited after it first went out
    pub fn was_edited(&self) -> bool {
        match (self.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) => last > first,
            _ => false,
        }
    }

    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

/// A titled section of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextSpan>,
}

/// A text-bearing rich-text node; its markup is not interpreted here
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextSpan {
    pub kind: String,
    pub text: String,
}

impl RichTextSpan {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: text.into(),
        }
    }
}

/// Previous/next links of a post page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub previous: Option<PostSummary>,
    pub next: Option<PostSummary>,
}

impl Navigation {
    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.next.is_none()
    }
}

fn post_path(uid: &str) -> String {
    format!("/post/{}/", uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_link_summary() {
        let link = PostSummary::link("hello", "Hello");
        assert_eq!(link.path(), "/post/hello/");
        assert!(link.first_publication_date.is_none());
        assert!(link.author.is_empty());
    }

    #[test]
    fn test_was_edited() {
        let first = Utc.with_ymd_and_hms(2021, 3, 1, 10, 0, 0).unwrap();
        let mut post = PostDetail {
            id: "1".to_string(),
            uid: "p".to_string(),
            first_publication_date: Some(first),
            last_publication_date: Some(first),
            title: "P".to_string(),
            subtitle: String::new(),
            author: "A".to_string(),
            banner_url: String::new(),
            content: Vec::new(),
        };
        assert!(!post.was_edited());

        post.last_publication_date = Some(Utc.with_ymd_and_hms(2021, 3, 2, 10, 0, 0).unwrap());
        assert!(post.was_edited());
        assert_eq!(post.summary().uid, "p");
    }
}
