//! Generator module - renders the index and post pages from repository content

use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

use tera::Context;
use walkdir::WalkDir;

use crate::content::{reading_time, Navigation, PostSummary};
use crate::helpers::DateFormatter;
use crate::pagination::PaginationState;
use crate::preview::{active_token, preview_query, Revision};
use crate::templates::{NavPost, PaginationData, PostData, PostPageData, SiteData, TemplateRenderer};
use crate::Blog;

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    dates: DateFormatter,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new()?,
            dates: DateFormatter::from_config(&blog.config)?,
        })
    }

    /// Generate the entire site
    ///
    /// Every page is rendered fully in memory before it is written, so a failed
    /// fetch never leaves a half-populated page behind.
    pub async fn generate(&self) -> Result<()> {
        fs::create_dir_all(&self.blog.public_dir)?;
        self.copy_static_assets()?;

        let state = self.initial_state(None).await?;
        let index = self.render_index(&state, None)?;
        self.write_page(&self.blog.public_dir.join("index.html"), &index)?;

        // Post paths come from walking the whole index
        let mut all = state;
        self.blog
            .paginator(None)
            .exhaust(&mut all)
            .await
            .context("Failed to list posts")?;

        let mut failed = 0;
        for post in &all.loaded {
            match self.render_post(&post.uid, None).await {
                Ok(html) => {
                    let output_path = self
                        .blog
                        .public_dir
                        .join("post")
                        .join(&post.uid)
                        .join("index.html");
                    self.write_page(&output_path, &html)?;
                }
                Err(e) => {
                    tracing::error!(uid = %post.uid, "Failed to generate post page: {:#}", e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("Failed to generate {} of {} post pages", failed, all.loaded.len());
        }

        tracing::info!("Generated index and {} post pages", all.loaded.len());
        Ok(())
    }

    /// First index page, from the draft revision `preview_token` selects when given
    pub async fn initial_state(&self, preview_token: Option<&str>) -> Result<PaginationState> {
        let pagination = &self.blog.config.pagination;
        let state = self
            .blog
            .paginator(active_token(preview_token).map(str::to_string))
            .initialize(pagination.page_size, pagination.order_by()?)
            .await
            .context("Failed to load the post index")?;
        Ok(state)
    }

    /// Render the index page for an initial pagination state
    ///
    /// With a preview token every post link carries it, so navigation stays in preview.
    pub fn render_index(&self, state: &PaginationState, preview_token: Option<&str>) -> Result<String> {
        let posts: Vec<PostData> = state
            .loaded
            .iter()
            .map(|p| PostData::from_summary(p, &self.dates))
            .collect();

        let mut context = self.create_base_context(preview_token);
        context.insert("posts", &posts);
        context.insert(
            "pagination",
            &PaginationData::new(state.cursor.as_deref(), state.loaded.len()),
        );

        self.renderer.render("index.html", &context)
    }

    /// Fetch and render a single post page
    pub async fn render_post(&self, uid: &str, preview_token: Option<&str>) -> Result<String> {
        let revision = self
            .blog
            .preview_gate()
            .resolve_revision(uid, preview_token)
            .await
            .with_context(|| format!("Failed to load post {}", uid))?;

        let navigation = self.blog.sibling_resolver().resolve(&revision.post.id).await;

        let token = if revision.preview { preview_token } else { None };
        self.render_revision(&revision, &navigation, token)
    }

    fn render_revision(
        &self,
        revision: &Revision,
        navigation: &Navigation,
        preview_token: Option<&str>,
    ) -> Result<String> {
        let post = &revision.post;

        let page = PostPageData {
            uid: post.uid.clone(),
            title: post.title.clone(),
            author: post.author.clone(),
            banner_url: post.banner_url.clone(),
            date: self.dates.format(post.first_publication_date.as_ref()),
            datetime: self.dates.datetime(post.first_publication_date.as_ref()),
            edited: post
                .was_edited()
                .then(|| self.dates.format(post.last_publication_date.as_ref())),
            reading_time: reading_time::estimate_with_rate(
                &post.content,
                self.blog.config.reading.words_per_minute,
            ),
            content: post.content.clone(),
        };

        let mut context = self.create_base_context(preview_token);
        context.insert("post", &page);
        if let Some(prev) = navigation.previous.as_ref().map(NavPost::from) {
            context.insert("previous", &prev);
        }
        if let Some(next) = navigation.next.as_ref().map(NavPost::from) {
            context.insert("next", &next);
        }

        self.renderer.render("post.html", &context)
    }

    /// Create a base context with common variables
    fn create_base_context(&self, preview_token: Option<&str>) -> Context {
        let config = &self.blog.config;
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: config.title.clone(),
                description: config.description.clone(),
                language: config.language.clone(),
            },
        );
        context.insert("preview", &active_token(preview_token).is_some());
        context.insert("preview_query", &preview_query(preview_token));
        context
    }

    fn write_page(&self, output_path: &Path, html: &str) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(output_path, html)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Copy static assets (css, images) into the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }
}

/// Lines for the `list` command: date, title and uid of every post
pub fn describe(posts: &[PostSummary], dates: &DateFormatter) -> Vec<String> {
    posts
        .iter()
        .map(|p| {
            let date = dates.format(p.first_publication_date.as_ref());
            let date = if date.is_empty() { "-".to_string() } else { date };
            format!("  {} - {} [{}]", date, p.title, p.uid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::repository::{
        MemoryRepository, RawContentBlock, RawDocument, RawImage, RawPostData, RawSpan,
    };
    use std::sync::Arc;

    fn doc(n: u32) -> RawDocument {
        RawDocument {
            id: format!("ID{}", n),
            uid: Some(format!("post-{}", n)),
            document_type: "posts".to_string(),
            first_publication_date: Some(format!("2021-03-{:02}T15:00:00+0000", n)),
            last_publication_date: Some(format!("2021-03-{:02}T15:00:00+0000", n)),
            data: RawPostData {
                title: Some(format!("Post {}", n)),
                subtitle: Some(format!("Subtitle {}", n)),
                author: Some("Joseph Oliveira".to_string()),
                banner: Some(RawImage {
                    url: Some("https://images.example/banner.png".to_string()),
                }),
                content: Some(vec![RawContentBlock {
                    heading: Some("Heading".to_string()),
                    body: vec![RawSpan {
                        kind: "paragraph".to_string(),
                        text: Some(vec!["word"; 250].join(" ")),
                    }],
                }]),
            },
        }
    }

    fn blog(dir: &Path, repo: MemoryRepository) -> Blog {
        let mut config = SiteConfig::default();
        config.pagination.page_size = 2;
        config.timezone = "UTC".to_string();
        config.date_format = "YYYY-MM-DD".to_string();
        Blog::with_repository(dir, config, Arc::new(repo))
    }

    #[tokio::test]
    async fn test_generate_writes_index_and_every_post() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("static/css")).unwrap();
        fs::write(dir.path().join("static/css/style.css"), "body {}").unwrap();

        let blog = blog(dir.path(), MemoryRepository::new((1..=3).map(doc).collect()));
        Generator::new(&blog).unwrap().generate().await.unwrap();

        let index = fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        assert!(index.contains("Post 3"));
        assert!(index.contains("Post 2"));
        assert!(!index.contains("Post 1"));
        assert!(index.contains("data-next-page"));

        for n in 1..=3 {
            let path = blog.public_dir.join(format!("post/post-{}/index.html", n));
            assert!(path.exists(), "missing {:?}", path);
        }
        assert!(blog.public_dir.join("css/style.css").exists());

        let middle = fs::read_to_string(blog.public_dir.join("post/post-2/index.html")).unwrap();
        // 1 heading word + 250 body words
        assert!(middle.contains("2 min"));
        assert!(middle.contains("2021-03-02"));
        assert!(middle.contains(r#"href="/post/post-1/""#));
        assert!(!middle.contains("editado em"));
    }

    #[tokio::test]
    async fn test_broken_post_fails_the_build_without_writing_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut broken = doc(2);
        broken.data.banner = None;
        let blog = blog(dir.path(), MemoryRepository::new(vec![doc(1), broken, doc(3)]));

        let err = Generator::new(&blog).unwrap().generate().await.unwrap_err();
        assert!(err.to_string().contains("1 of 3"));
        assert!(blog.public_dir.join("post/post-1/index.html").exists());
        assert!(!blog.public_dir.join("post/post-2/index.html").exists());
    }

    #[tokio::test]
    async fn test_unreachable_repository_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path(), MemoryRepository::unavailable());

        assert!(Generator::new(&blog).unwrap().generate().await.is_err());
        assert!(!blog.public_dir.join("index.html").exists());
    }

    #[tokio::test]
    async fn test_preview_post_render() {
        let dir = tempfile::tempdir().unwrap();
        let mut draft = doc(2);
        draft.data.title = Some("Rascunho".to_string());
        draft.last_publication_date = Some("2021-04-01T15:00:00+0000".to_string());
        let repo = MemoryRepository::new(vec![doc(1), doc(2)]).with_draft("tok", vec![draft]);
        let generator = Generator::new(&blog(dir.path(), repo)).unwrap();

        let html = generator.render_post("post-2", Some("tok")).await.unwrap();
        assert!(html.contains("Rascunho"));
        assert!(html.contains("/api/exit-preview"));
        assert!(html.contains("editado em 2021-04-01"));
        // links out of a preview page stay in preview
        assert!(html.contains(r#"href="/post/post-1/?token=tok""#));
        assert!(html.contains(r#"href="/?token=tok""#));

        let html = generator.render_post("post-2", None).await.unwrap();
        assert!(html.contains("Post 2"));
        assert!(!html.contains("/api/exit-preview"));
        assert!(html.contains(r#"href="/post/post-1/""#));
        assert!(!html.contains("token="));
    }

    #[tokio::test]
    async fn test_preview_index_links_carry_token() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MemoryRepository::new((1..=3).map(doc).collect()).with_draft("tok", Vec::new());
        let generator = Generator::new(&blog(dir.path(), repo)).unwrap();

        let state = generator.initial_state(Some("tok")).await.unwrap();
        let html = generator.render_index(&state, Some("tok")).unwrap();
        assert!(html.contains(r#"href="/post/post-3/?token=tok""#));
        assert!(html.contains(r#"data-post-query="?token=tok""#));
        assert!(html.contains("/api/exit-preview"));

        let state = generator.initial_state(None).await.unwrap();
        let html = generator.render_index(&state, None).unwrap();
        assert!(html.contains(r#"href="/post/post-3/""#));
        assert!(!html.contains("token="));
    }

    #[test]
    fn test_describe() {
        let dates = DateFormatter::new(chrono_tz::UTC, "YYYY-MM-DD", "en");
        let lines = describe(&[PostSummary::link("a", "A")], &dates);
        assert_eq!(lines, vec!["  - - A [a]".to_string()]);
    }
}
