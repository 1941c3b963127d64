//! Developer docs search passthrough.

use crate::client::CanopyClient;
use crate::error::{CanopyError, CanopyResult};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    query: &'a str,
    page: u32,
    per_page: u32,
}

/// Developer docs API. Unauthenticated: the docs are public.
pub struct DocsApi<'a> {
    client: &'a CanopyClient,
}

impl<'a> DocsApi<'a> {
    pub(crate) fn new(client: &'a CanopyClient) -> Self {
        Self { client }
    }

    /// Search the developer docs. Results are passed through verbatim.
    pub async fn search(&self, query: &str, page: u32, per_page: u32) -> CanopyResult<Value> {
        let url = self.client.config().docs_url.join("/api/search")?;
        let body = SearchBody {
            query,
            page,
            per_page,
        };
        let response = self.client.http.post(url, HeaderMap::new(), &body).await?;
        let response = response.error_for_status()?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| CanopyError::UnparseableResult(format!("docs search: {}", e)))
    }
}
