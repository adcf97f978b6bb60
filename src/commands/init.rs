//! Initialize a new blog directory

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::repository::{Fixture, RawContentBlock, RawDocument, RawImage, RawPostData, RawSpan};

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static/css"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }

    let config_content = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo
date_format: DD MMM YYYY

# Directory
public_dir: public
static_dir: static

# Content repository
## The access token can also be given through PRISMIC_ACCESS_TOKEN
repository:
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  access_token:
  document_type: posts
  timeout_secs: 30

# Index page
pagination:
  page_size: 20
  order_by: first_publication_date

# Reading time
reading:
  words_per_minute: 200
"#;

    fs::write(&config_path, config_content)?;

    let stylesheet = r#"body { margin: 0; font-family: Inter, sans-serif; background: #1a1d23; color: #d7d7d7; }
.container, .header { max-width: 720px; margin: 0 auto; padding: 0 1rem; }
.post { display: block; color: inherit; text-decoration: none; margin: 3rem 0; }
.meta { display: flex; gap: 1.5rem; font-size: 0.875rem; }
.banner { height: 400px; background-size: cover; background-position: center; }
.more { background: none; border: 0; color: #ff57b2; cursor: pointer; }
.post-navigation { display: flex; justify-content: space-between; margin: 3rem 0; }
.preview-banner { text-align: center; padding: 1rem; }
"#;
    fs::write(target_dir.join("static/css/style.css"), stylesheet)?;

    let fixture = Fixture {
        documents: vec![sample_post()],
        ..Fixture::default()
    };
    fs::write(
        target_dir.join("fixture.json"),
        serde_json::to_string_pretty(&fixture)?,
    )?;

    Ok(())
}

/// A sample post so `--fixture fixture.json generate` works out of the box
fn sample_post() -> RawDocument {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%z").to_string();
    RawDocument {
        id: "sample".to_string(),
        uid: Some("hello-world".to_string()),
        document_type: "posts".to_string(),
        first_publication_date: Some(now.clone()),
        last_publication_date: Some(now),
        data: RawPostData {
            title: Some("Hello World".to_string()),
            subtitle: Some("Your very first post".to_string()),
            author: Some("spacetraveling".to_string()),
            banner: Some(RawImage {
                url: Some("https://images.prismic.io/sample/banner.png".to_string()),
            }),
            content: Some(vec![RawContentBlock {
                heading: Some("Quick start".to_string()),
                body: vec![RawSpan {
                    kind: "paragraph".to_string(),
                    text: Some(
                        "Point repository.endpoint at your repository and run generate."
                            .to_string(),
                    ),
                }],
            }]),
        },
    }
}
