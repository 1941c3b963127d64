//! Authentication: exchanging an opaque MCP token for scoped tokens and
//! the caller's active ref.

use crate::client::CanopyClient;
use crate::error::{CanopyError, CanopyResult};
use canopy_core::Ref;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Deserializer, Serialize};

/// What the authentication endpoint hands back for a valid token.
///
/// Created fresh on every tool invocation and discarded at call end,
/// never cached, because the active ref can change between calls via
/// checkout. `read` and `write` are distinct capability scopes: read-only
/// calls must use `read` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub read: String,
    pub write: String,
    /// Currently active version pointer. The `ref` key must be present in
    /// the response (a missing key is a malformed response) but may be
    /// null, in which case there is no active ref.
    #[serde(rename = "ref", deserialize_with = "nullable")]
    pub active_ref: Option<Ref>,
    pub user_id: String,
}

impl AuthContext {
    /// Branch name of the active ref, when there is one. Commit refs and
    /// null refs have no branch name.
    pub fn ref_name(&self) -> Option<&str> {
        self.active_ref.as_ref().and_then(|r| r.name.as_deref())
    }
}

// An `Option` field without a default: the key has to be on the wire, but
// its value may be null.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::deserialize(deserializer)
}

#[derive(Serialize)]
struct AuthenticateBody<'a> {
    token: &'a str,
}

/// Authentication API.
pub struct AuthApi<'a> {
    client: &'a CanopyClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a CanopyClient) -> Self {
        Self { client }
    }

    /// Exchange the caller's opaque token for an [`AuthContext`].
    ///
    /// Pure lookup, no side effects. Invoked fresh on every tool call.
    pub async fn authenticate(&self, token: &str) -> CanopyResult<AuthContext> {
        let url = self.client.app_endpoint("/api/mcp/authenticate")?;
        let response = self
            .client
            .http
            .post(url, HeaderMap::new(), &AuthenticateBody { token })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CanopyError::AuthenticationFailed {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CanopyError::MalformedAuthResponse(e.to_string()))
    }
}
