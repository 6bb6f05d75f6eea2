//! `reqwest` implementation of [`ContentApi`] for a Prismic repository

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tokio::sync::OnceCell;

use super::client::predicates_query;
use super::{ContentApi, ContentDocument, Predicate, QueryOptions, QueryResponse};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Authenticated client for one content repository
pub struct PrismicClient {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Create a client for `endpoint` (e.g. `https://blog.cdn.prismic.io/api/v2`)
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(Error::MissingEndpoint);
        }
        Ok(Self {
            http: Client::new(),
            endpoint: endpoint.to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    /// Create a client from the `api` section of the site config
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(&api.endpoint, api.access_token.clone())
    }

    /// The repository's published ref, resolved once per client
    async fn master_ref(&self) -> Result<String> {
        self.master_ref
            .get_or_try_init(|| async {
                let mut request = self.http.get(&self.endpoint);
                if let Some(token) = &self.access_token {
                    request = request.query(&[("access_token", token)]);
                }
                let info: ApiInfo = self.send(request, &self.endpoint).await?;
                let master = info
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .ok_or(Error::MissingMasterRef)?;
                tracing::debug!("Resolved master ref {}", master.reference);
                Ok::<_, Error>(master.reference)
            })
            .await
            .cloned()
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint)
    }

    /// Query-string parameters of a search request
    fn search_params(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![("ref", reference.to_string())];
        if !predicates.is_empty() {
            params.push(("q", predicates_query(predicates)));
        }
        if !options.fetch.is_empty() {
            params.push(("fetch", options.fetch.join(",")));
        }
        if let Some(size) = options.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(after) = &options.after {
            params.push(("after", after.clone()));
        }
        if let Some(orderings) = &options.orderings {
            params.push(("orderings", orderings.clone()));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }
        params
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn first(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
        doc_type: &str,
        uid: &str,
    ) -> Result<ContentDocument> {
        let response = self.query(predicates, options).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}

impl fmt::Debug for PrismicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrismicClient")
            .field("http", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[async_trait]
impl ContentApi for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse> {
        let reference = match &options.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };
        let url = self.search_url();
        let params = self.search_params(&reference, predicates, options);
        tracing::debug!("Querying {} with {:?}", url, predicates);
        self.send(self.http.get(&url).query(&params), &url).await
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<ContentDocument> {
        let options = QueryOptions {
            page_size: Some(1),
            ..options.clone()
        };
        self.first(&[Predicate::uid(doc_type, uid)], &options, doc_type, uid)
            .await
    }

    async fn get_single(&self, doc_type: &str, reference: &str) -> Result<ContentDocument> {
        let options = QueryOptions::new().page_size(1).reference(reference);
        self.first(
            &[Predicate::document_type(doc_type)],
            &options,
            doc_type,
            "<single>",
        )
        .await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse> {
        let url = url::Url::parse(cursor).map_err(|source| Error::InvalidCursor {
            cursor: cursor.to_string(),
            source,
        })?;
        tracing::debug!("Following cursor {}", url);
        self.send(self.http.get(url.clone()), url.as_str()).await
    }
}
