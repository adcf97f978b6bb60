//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::repository::OrderField;

/// Environment variable that overrides `repository.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Date format (Moment.js tokens)
    pub date_format: String,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub reading: ReadingConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            date_format: "DD MMM YYYY".to_string(),

            repository: RepositoryConfig::default(),
            pagination: PaginationConfig::default(),
            reading: ReadingConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.repository.access_token = Some(token);
            }
        }
    }

    /// Reject values the rest of the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.pagination.page_size == 0 {
            anyhow::bail!("pagination.page_size must be at least 1");
        }
        if self.repository.document_type.trim().is_empty() {
            anyhow::bail!("repository.document_type must not be empty");
        }
        self.pagination.order_by()?;
        self.timezone()?;
        Ok(())
    }

    /// Configured display timezone
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {}: {}", self.timezone, e))
    }
}

/// Content repository connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// API root, e.g. `https://my-blog.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Document type holding blog posts
    pub document_type: String,
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Index page pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub page_size: u32,
    pub order_by: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            order_by: "first_publication_date".to_string(),
        }
    }
}

impl PaginationConfig {
    pub fn order_by(&self) -> Result<OrderField> {
        self.order_by.parse::<OrderField>().map_err(|e| anyhow::anyhow!(e))
    }
}

/// Reading time estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: crate::content::reading_time::WORDS_PER_MINUTE,
        }
    }
}
