//! spacetraveling: a static blog generator backed by a headless content repository
//!
//! Posts live in a Prismic-style repository. This crate pages through them for
//! the index, renders each post with its reading time and previous/next links,
//! and can render unpublished drafts through a preview token.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod navigation;
pub mod pagination;
pub mod preview;
pub mod repository;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use error::BlogError;

use navigation::SiblingResolver;
use pagination::Paginator;
use preview::PreviewGate;
use repository::{ContentRepository, PrismicClient};

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied verbatim into the output
    pub static_dir: PathBuf,
    repository: Arc<dyn ContentRepository>,
}

impl Blog {
    /// Create a blog from a directory, connected to the configured repository endpoint
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = Self::load_config(base_dir.as_ref())?;

        if config.repository.endpoint.is_empty() {
            anyhow::bail!("repository.endpoint is not configured (or pass --fixture)");
        }
        let client = PrismicClient::new(&config.repository)?;

        Ok(Self::with_repository(base_dir, config, Arc::new(client)))
    }

    /// Create a blog around an already constructed repository
    pub fn with_repository<P: AsRef<Path>>(
        base_dir: P,
        config: config::SiteConfig,
        repository: Arc<dyn ContentRepository>,
    ) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            repository,
        }
    }

    /// Read `_config.yml` (defaults when absent) and apply environment overrides
    pub fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(config)
    }

    pub fn repository(&self) -> Arc<dyn ContentRepository> {
        self.repository.clone()
    }

    /// Index paginator, reading the draft revision `reference` when given
    pub fn paginator(&self, reference: Option<String>) -> Paginator {
        Paginator::new(self.repository(), &self.config.repository.document_type)
            .with_reference(reference)
    }

    pub fn sibling_resolver(&self) -> SiblingResolver {
        SiblingResolver::new(self.repository(), &self.config.repository.document_type)
    }

    pub fn preview_gate(&self) -> PreviewGate {
        PreviewGate::new(self.repository(), &self.config.repository.document_type)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }
}
