//! Main client for the Canopy SDK.

use crate::api::*;
use crate::config::ClientConfig;
use crate::error::{CanopyError, CanopyResult};
use crate::graphql::{GraphqlRequest, GraphqlResponse};
use crate::transport::http::header_map;
use crate::transport::HttpTransport;
use std::sync::Arc;
use url::Url;

/// Main client for interacting with the Canopy backend.
///
/// Holds no per-caller state: tokens and refs are resolved per call by the
/// auth API and passed explicitly into each request.
#[derive(Clone)]
pub struct CanopyClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl CanopyClient {
    /// Create a new client builder.
    pub fn builder() -> CanopyClientBuilder {
        CanopyClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> CanopyResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the authentication API.
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Get the transactions API.
    pub fn transactions(&self) -> TransactionsApi<'_> {
        TransactionsApi::new(self)
    }

    /// Get the content API.
    pub fn content(&self) -> ContentApi<'_> {
        ContentApi::new(self)
    }

    /// Get the branches API.
    pub fn branches(&self) -> BranchesApi<'_> {
        BranchesApi::new(self)
    }

    /// Get the uploads API.
    pub fn uploads(&self) -> UploadsApi<'_> {
        UploadsApi::new(self)
    }

    /// Get the developer docs API.
    pub fn docs(&self) -> DocsApi<'_> {
        DocsApi::new(self)
    }

    /// Execute a GraphQL request against the content API, authenticated
    /// with the given scoped token and addressed to the given ref.
    ///
    /// The ref header is omitted when the active ref has no branch name
    /// (commit refs); the backend then resolves its default branch.
    pub(crate) async fn graphql(
        &self,
        token: &str,
        ref_name: Option<&str>,
        draft: bool,
        request: &GraphqlRequest,
    ) -> CanopyResult<GraphqlResponse> {
        let mut pairs = vec![("x-canopy-token", token)];
        if let Some(name) = ref_name {
            pairs.push(("x-canopy-ref", name));
        }
        if draft {
            pairs.push(("x-canopy-draft", "true"));
        }
        let headers = header_map(&pairs)?;

        let response = self
            .http
            .post(self.config.api_url.clone(), headers, request)
            .await?;
        let response = response.error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| CanopyError::UnparseableResult(format!("graphql envelope: {}", e)))
    }

    pub(crate) fn app_endpoint(&self, path: &str) -> CanopyResult<Url> {
        Ok(self.config.app_url.join(path)?)
    }
}

/// Builder for creating a [`CanopyClient`].
///
/// Unset URLs fall back to the environment (`CANOPY_APP_URL`,
/// `CANOPY_API_URL`, `CANOPY_DOCS_URL`) and then to the hosted defaults, so
/// misconfiguration surfaces here, at startup.
pub struct CanopyClientBuilder {
    app_url: Option<String>,
    api_url: Option<String>,
    docs_url: Option<String>,
}

impl CanopyClientBuilder {
    pub fn new() -> Self {
        Self {
            app_url: None,
            api_url: None,
            docs_url: None,
        }
    }

    /// Set the app server URL (authentication + branch management).
    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = Some(url.into());
        self
    }

    /// Set the GraphQL content API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the developer docs URL.
    pub fn docs_url(mut self, url: impl Into<String>) -> Self {
        self.docs_url = Some(url.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> CanopyResult<CanopyClient> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = self.app_url {
            config.app_url = Url::parse(&url)?;
        }
        if let Some(url) = self.api_url {
            config.api_url = Url::parse(&url)?;
        }
        if let Some(url) = self.docs_url {
            config.docs_url = Url::parse(&url)?;
        }
        CanopyClient::from_config(config)
    }
}

impl Default for CanopyClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
