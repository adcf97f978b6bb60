//! Built-in templates using the Tera template engine
//!
//! Templates are embedded in the binary; rich-text spans are rendered as
//! escaped paragraphs, nothing more.

use anyhow::Result;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use tera::{Context, Tera};

use crate::content::{ContentBlock, PostSummary};
use crate::helpers::DateFormatter;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/preview.html",
                include_str!("site/partials/preview.html"),
            ),
            (
                "partials/nav.html",
                include_str!("site/partials/nav.html"),
            ),
        ])?;

        tera.register_filter("minutes", minutes_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: `5 | minutes` -> "5 min"
fn minutes_filter(
    value: &tera::Value,
    _args: &std::collections::HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let n = tera::try_get_value!("minutes", "value", u64, value);
    Ok(tera::Value::String(format!("{} min", n)))
}

/// Local route serving pages for cursors a browser cannot fetch directly
pub const POSTS_ROUTE: &str = "/api/posts";

/// Whether the browser can GET `cursor` itself (an HTTP `next_page` URL)
pub fn is_remote_cursor(cursor: &str) -> bool {
    cursor.starts_with("https://") || cursor.starts_with("http://")
}

/// URL the "load more" button fetches to get the page behind `cursor`
pub fn load_more_url(cursor: &str) -> String {
    if is_remote_cursor(cursor) {
        cursor.to_string()
    } else {
        format!(
            "{}?cursor={}",
            POSTS_ROUTE,
            utf8_percent_encode(cursor, NON_ALPHANUMERIC)
        )
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
}

impl PostData {
    pub fn from_summary(post: &PostSummary, dates: &DateFormatter) -> Self {
        Self {
            uid: post.uid.clone(),
            path: post.path(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: dates.format(post.first_publication_date.as_ref()),
            datetime: dates.datetime(post.first_publication_date.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    /// What the "load more" button fetches, see [`load_more_url`]
    pub next_page: Option<String>,
    pub loaded: usize,
}

impl PaginationData {
    pub fn new(cursor: Option<&str>, loaded: usize) -> Self {
        Self {
            next_page: cursor.map(load_more_url),
            loaded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub uid: String,
    pub title: String,
    pub author: String,
    pub banner_url: String,
    pub date: String,
    pub datetime: String,
    /// Display date of the last edit, when edited after publication
    pub edited: Option<String>,
    pub reading_time: usize,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

impl From<&PostSummary> for NavPost {
    fn from(post: &PostSummary) -> Self {
        Self {
            title: post.title.clone(),
            path: post.path(),
        }
    }
}
