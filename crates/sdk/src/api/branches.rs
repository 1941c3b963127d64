//! Branch listing and checkout.
//!
//! Listing goes through the content API (`_sys.branches`); checkout goes
//! through the app server's manage endpoint, authenticated with the raw
//! MCP token rather than a scoped one.

use crate::api::auth::AuthContext;
use crate::client::CanopyClient;
use crate::error::{CanopyError, CanopyResult};
use crate::graphql::GraphqlRequest;
use crate::transport::http::header_map;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const LIST_BRANCHES_QUERY: &str = "query ListBranches($limit: Int, $offset: Int) { _sys { branches(limit: $limit, offset: $offset) { items { id name createdAt } } } }";

/// One branch of the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct BranchesData {
    #[serde(rename = "_sys")]
    sys: SysData,
}

#[derive(Deserialize)]
struct SysData {
    branches: BranchItems,
}

#[derive(Deserialize)]
struct BranchItems {
    items: Vec<BranchSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManageBody<'a> {
    op: &'a str,
    target_ref: &'a str,
}

#[derive(Deserialize)]
struct ManageResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Branches API.
pub struct BranchesApi<'a> {
    client: &'a CanopyClient,
}

impl<'a> BranchesApi<'a> {
    pub(crate) fn new(client: &'a CanopyClient) -> Self {
        Self { client }
    }

    /// List branches of the repository, most recent first server-side.
    pub async fn list(
        &self,
        auth: &AuthContext,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> CanopyResult<Vec<BranchSummary>> {
        let mut variables = serde_json::Map::new();
        if let Some(limit) = limit {
            variables.insert("limit".to_string(), json!(limit));
        }
        if let Some(offset) = offset {
            variables.insert("offset".to_string(), json!(offset));
        }
        let request =
            GraphqlRequest::new(LIST_BRANCHES_QUERY).with_variables(Value::Object(variables));

        let response = self
            .client
            .graphql(&auth.read, auth.ref_name(), true, &request)
            .await?;
        let data = response
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| CanopyError::UnparseableResult("no data in branches response".into()))?;
        let parsed: BranchesData = serde_json::from_value(data)
            .map_err(|e| CanopyError::UnparseableResult(format!("branches: {}", e)))?;
        Ok(parsed.sys.branches.items)
    }

    /// Switch the caller's active ref to `target_ref`.
    ///
    /// This mutates server-side state tied to the MCP token: the next
    /// authenticate call will see the new ref.
    pub async fn checkout(&self, mcp_token: &str, target_ref: &str) -> CanopyResult<Option<Value>> {
        let url = self.client.app_endpoint("/api/mcp/manage")?;
        let headers = header_map(&[("x-canopy-mcp-token", mcp_token)])?;
        let body = ManageBody {
            op: "checkout",
            target_ref,
        };
        debug!(target_ref, "checkout");

        let response = self.client.http.post(url, headers, &body).await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // The manage endpoint usually explains itself in the body.
            let message = serde_json::from_str::<ManageResponse>(&text)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(CanopyError::MutationFailed { message });
        }

        let parsed: ManageResponse = serde_json::from_str(&text)
            .map_err(|e| CanopyError::UnparseableResult(format!("manage response: {}", e)))?;
        if !parsed.success {
            return Err(CanopyError::MutationFailed {
                message: parsed.error.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(parsed.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth() -> AuthContext {
        serde_json::from_value(json!({
            "read": "rt_read",
            "write": "wt_write",
            "ref": { "type": "branch", "id": "br_1", "name": "main" },
            "userId": "user_42"
        }))
        .unwrap()
    }

    async fn client_for(server: &MockServer) -> CanopyClient {
        CanopyClient::builder()
            .app_url(server.uri())
            .api_url(format!("{}/graphql", server.uri()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_branches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "_sys": {
                        "branches": {
                            "items": [
                                {"id": "br_1", "name": "main", "createdAt": "2024-01-01T00:00:00Z"},
                                {"id": "br_2", "name": "feature/hero", "createdAt": "2024-02-01T09:30:00Z"}
                            ]
                        }
                    }
                }
            })))
            .mount(&server)
            .await;

        let branches = client_for(&server)
            .await
            .branches()
            .list(&auth(), Some(10), None)
            .await
            .unwrap();

        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].name, "main");
        assert_eq!(branches[1].id, "br_2");
    }

    #[tokio::test]
    async fn test_checkout_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .and(header("x-canopy-mcp-token", "mcp_tok"))
            .and(body_json(json!({"op": "checkout", "targetRef": "feature/hero"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": {"ref": "feature/hero"}})),
            )
            .mount(&server)
            .await;

        let data = client_for(&server)
            .await
            .branches()
            .checkout("mcp_tok", "feature/hero")
            .await
            .unwrap();
        assert_eq!(data.unwrap()["ref"], "feature/hero");
    }

    #[tokio::test]
    async fn test_checkout_rejected_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "error": "branch not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .branches()
            .checkout("mcp_tok", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "branch not found");
    }

    #[tokio::test]
    async fn test_checkout_http_error_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .branches()
            .checkout("mcp_tok", "feature/hero")
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "HTTP 500");
    }
}
