//! HTTP transport layer for the Canopy SDK.
//!
//! Tokens are scoped per call (every invocation re-authenticates), so
//! headers are supplied per request instead of being baked into the client
//! at construction time. No retries and no explicit timeout: every call is
//! a single attempt on the underlying transport's defaults.

use crate::error::{CanopyError, CanopyResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

/// HTTP transport for making API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new() -> CanopyResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("canopy-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Execute a JSON POST request. Returns the raw response so callers can
    /// apply their endpoint-specific status classification.
    pub async fn post<B: Serialize>(
        &self,
        url: Url,
        headers: HeaderMap,
        body: &B,
    ) -> CanopyResult<Response> {
        debug!(url = %url, "POST request");
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Build a header map from name/value pairs, rejecting values that cannot
/// be represented as HTTP header values (e.g. tokens with control bytes).
pub fn header_map(pairs: &[(&str, &str)]) -> CanopyResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| CanopyError::Config(format!("invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| CanopyError::Config(format!("invalid value for header '{}'", name)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
