//! HTTP client for a Prismic-style REST content API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{ContentRepository, Predicate, QueryOptions, QueryResponse, RawDocument};
use crate::config::RepositoryConfig;
use crate::error::{BlogError, Result};

/// API root description, only the refs are needed
#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl PrismicClient {
    /// Create a client for the API root at `config.endpoint` (e.g. `https://repo.cdn.prismic.io/api/v2`)
    pub fn new(config: &RepositoryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Reference of the currently published revision
    async fn master_ref(&self) -> Result<String> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }
        let info: ApiInfo = self.send(request).await?;

        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| BlogError::fetch("repository exposes no master ref"))
    }

    async fn search(&self, predicates: &[String], options: &QueryOptions) -> Result<QueryResponse> {
        let reference = match &options.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };

        let params = search_params(reference, predicates, options, self.access_token.as_deref());
        let url = format!("{}/documents/search", self.endpoint);
        tracing::debug!(url = %url, "Querying repository");
        self.send(self.client.get(&url).query(&params)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BlogError::fetch(format!(
                "repository returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Query-string parameters of a `documents/search` request
fn search_params(
    reference: String,
    predicates: &[String],
    options: &QueryOptions,
    access_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("ref", reference), ("q", format!("[{}]", predicates.concat()))];

    if let Some(size) = options.page_size {
        params.push(("pageSize", size.to_string()));
    }
    if let Some(after) = &options.after {
        params.push(("after", after.clone()));
    }
    if let Some(ordering) = &options.orderings {
        params.push(("orderings", ordering.expression()));
    }
    if !options.fetch.is_empty() {
        params.push(("fetch", options.fetch.join(",")));
    }
    if let Some(token) = access_token {
        params.push(("access_token", token.to_string()));
    }

    params
}

/// `[at(my.<type>.uid, "<uid>")]` with the uid quoted as a string literal
fn uid_predicate(document_type: &str, uid: &str) -> String {
    let quoted = uid.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[at(my.{}.uid, \"{}\")]", document_type, quoted)
}

#[async_trait]
impl ContentRepository for PrismicClient {
    async fn query(&self, predicate: &Predicate, options: &QueryOptions) -> Result<QueryResponse> {
        self.search(&[predicate.expression()], options).await
    }

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<RawDocument> {
        let predicates = [
            Predicate::document_type(document_type).expression(),
            uid_predicate(document_type, uid),
        ];
        let options = QueryOptions {
            page_size: Some(1),
            ..options.clone()
        };

        self.search(&predicates, &options)
            .await?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| BlogError::fetch(format!("{} document not found: {}", document_type, uid)))
    }

    async fn follow(&self, cursor: &str) -> Result<QueryResponse> {
        tracing::debug!(cursor, "Following next_page cursor");
        self.send(self.client.get(cursor)).await
    }
}
