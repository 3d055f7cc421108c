#![doc = "GitLab REST client: the production PagedFetcher."]
//
//! Follows GitLab's offset pagination by re-requesting the same URL with the
//! `page` query parameter taken from the `X-Next-Page` response header, until the
//! header is empty. List bodies are concatenated; a single-object body (such as
//! `/user`) is returned as a one-element sequence.
//!
//! No retries: the first failed page fails the whole call.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, error};

use crate::contract::{FetchError, PagedFetcher};

const NEXT_PAGE_HEADER: &str = "x-next-page";
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

pub struct GitlabClient {
    client: Client,
}

impl GitlabClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for GitlabClient {
    fn default() -> Self {
        Self::new()
    }
}

fn next_page(headers: &HeaderMap) -> Option<String> {
    headers
        .get(NEXT_PAGE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn with_page(base: &Url, page: Option<&str>) -> Url {
    let Some(page) = page else {
        return base.clone();
    };
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", page);
    url
}

#[async_trait]
impl PagedFetcher for GitlabClient {
    async fn fetch_all_pages(
        &self,
        url: &str,
        credential: &str,
        context: &str,
    ) -> Result<Vec<Value>, FetchError> {
        let base = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let mut items = Vec::new();
        let mut page: Option<String> = None;

        loop {
            let page_url = with_page(&base, page.as_deref());
            debug!(context, url = %page_url, "Fetching page");
            let response = self
                .client
                .get(page_url.clone())
                .header(TOKEN_HEADER, credential)
                .send()
                .await
                .map_err(|source| FetchError::Http {
                    url: page_url.to_string(),
                    source,
                })?;

            let status = response.status();
            let next = next_page(response.headers());
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
                error!(context, status = %status, url = %page_url, "GitLab API returned error");
                return Err(FetchError::Status {
                    url: page_url.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let body: Value = response.json().await.map_err(|e| FetchError::Decode {
                url: page_url.to_string(),
                reason: e.to_string(),
            })?;
            match body {
                Value::Array(values) => items.extend(values),
                other => items.push(other),
            }

            match next {
                Some(next) if page.as_deref() != Some(next.as_str()) => page = Some(next),
                _ => break,
            }
        }

        debug!(context, items = items.len(), "Fetched all pages");
        Ok(items)
    }
}
