//! Errors raised while fetching and normalizing repository content

use thiserror::Error;

/// Failure taxonomy for content fetching
#[derive(Error, Debug)]
pub enum BlogError {
    /// Backend unreachable, non-success response, undecodable body or missing document
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// A document lacks a required field or carries an unusable value
    #[error("Malformed content in document {document}: {message}")]
    MalformedContent { document: String, message: String },
}

impl BlogError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::FetchFailed(message.into())
    }

    pub fn malformed(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedContent {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the transport layer rather than the content itself
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_))
    }
}

impl From<reqwest::Error> for BlogError {
    fn from(e: reqwest::Error) -> Self {
        Self::FetchFailed(e.to_string())
    }
}

impl From<serde_json::Error> for BlogError {
    fn from(e: serde_json::Error) -> Self {
        Self::FetchFailed(format!("malformed response: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
