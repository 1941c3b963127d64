// Branch and ref tools: create/checkout/merge/list branches, current ref,
// commit.

use crate::context::ToolContext;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use crate::tools::{
    authenticate, json_schema_boolean, json_schema_number, json_schema_object, json_schema_string,
    Tool,
};
use anyhow::Result;
use canopy_core::{ContentRequest, Operation, Transaction};
use canopy_sdk::{CanopyClient, CanopyError};
use serde::Deserialize;
use serde_json::json;

/// Create a new branch, optionally checking it out afterwards.
///
/// The two steps are separate remote calls and are NOT atomic: when the
/// checkout fails the branch stays created and the checkout failure is
/// returned verbatim. No compensating delete is attempted.
pub struct CreateBranchTool {
    client: CanopyClient,
}

impl CreateBranchTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBranchArgs {
    base_branch_name: String,
    branch_name: String,
    description: Option<String>,
    auto_checkout: Option<bool>,
}

#[async_trait::async_trait]
impl Tool for CreateBranchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_branch".to_string(),
            description: "Create a new branch based on an existing branch. The new branch is created from the specified base branch and optionally checked out.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "baseBranchName": json_schema_string("The name of the existing branch to base the new branch on"),
                    "branchName": json_schema_string("The name for the new branch to create"),
                    "description": json_schema_string("Optional description for the new branch"),
                    "autoCheckout": json_schema_boolean("Whether to automatically checkout the new branch. Defaults to true.")
                }),
                vec!["baseBranchName", "branchName"],
            ),
            annotations: Some(ToolAnnotations::write("Create Branch")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: CreateBranchArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error creating branch: {}", e))),
        };
        let auto_checkout = args.auto_checkout.unwrap_or(true);

        let token = match ctx.credential() {
            Ok(token) => token,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error creating branch: {}",
                    e.detail()
                )))
            }
        };
        let auth = match self.client.auth().authenticate(&token).await {
            Ok(auth) => auth,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error creating branch: {}",
                    e.detail()
                )))
            }
        };

        let operation = Operation::CreateBranch {
            base_branch_name: args.base_branch_name.clone(),
            branch_name: args.branch_name.clone(),
            description: args.description.unwrap_or_default(),
        };
        let transaction = match Transaction::single(operation) {
            Ok(tx) => tx.with_author(auth.user_id.clone()),
            Err(e) => return Ok(CallToolResult::error(format!("Error creating branch: {}", e))),
        };

        let record = match self.client.transactions().submit(&transaction, &auth).await {
            Ok(record) => record,
            Err(e) => {
                // First step failed: abort before checkout is ever attempted.
                return Ok(CallToolResult::error(format!(
                    "Error creating branch: {}",
                    e.detail()
                )));
            }
        };

        if auto_checkout {
            if let Err(e) = self
                .client
                .branches()
                .checkout(&token, &args.branch_name)
                .await
            {
                // Later step failed after the branch was created: surface
                // the checkout failure and leave the branch in place.
                return Ok(CallToolResult::error(format!(
                    "Error checking out branch: {}",
                    e.detail()
                )));
            }
        }

        let mut body = json!({
            "success": true,
            "message": format!(
                "Branch '{}' created{} successfully from '{}'",
                args.branch_name,
                if auto_checkout { " and checked out" } else { "" },
                args.base_branch_name
            ),
            "transaction": record,
        });
        if auto_checkout {
            body["currentBranch"] = json!(args.branch_name);
        }
        Ok(CallToolResult::text(body.to_string()))
    }
}

/// Checkout (switch to) a branch via the manage endpoint. Changes the
/// caller's active ref for subsequent calls.
pub struct CheckoutBranchTool {
    client: CanopyClient,
}

impl CheckoutBranchTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBranchArgs {
    branch_name: String,
}

#[async_trait::async_trait]
impl Tool for CheckoutBranchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "checkout_branch".to_string(),
            description: "Checkout (switch to) a specific branch. This changes the current working branch to the specified branch name.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "branchName": json_schema_string("The name of the branch to checkout/switch to")
                }),
                vec!["branchName"],
            ),
            annotations: Some(ToolAnnotations::idempotent_write("Checkout Branch")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: CheckoutBranchArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error checking out branch: {}",
                    e
                )))
            }
        };

        let token = match ctx.credential() {
            Ok(token) => token,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error checking out branch: {}",
                    e.detail()
                )))
            }
        };

        match self
            .client
            .branches()
            .checkout(&token, &args.branch_name)
            .await
        {
            Ok(data) => {
                let body = json!({
                    "success": true,
                    "message": format!("Successfully checked out branch '{}'", args.branch_name),
                    "currentBranch": args.branch_name,
                    "data": data,
                });
                Ok(CallToolResult::text(body.to_string()))
            }
            Err(e) => Ok(CallToolResult::error(format!(
                "Error checking out branch: {}",
                e.detail()
            ))),
        }
    }
}

/// Merge a branch into another branch.
pub struct MergeBranchTool {
    client: CanopyClient,
}

impl MergeBranchTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeBranchArgs {
    base_branch_name: String,
    source_branch_name: Option<String>,
    auto_create_content_request: Option<ContentRequest>,
}

#[async_trait::async_trait]
impl Tool for MergeBranchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "merge_branch".to_string(),
            description: "Merge a branch into another branch.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "baseBranchName": json_schema_string("The base or destination branch to merge into."),
                    "sourceBranchName": json_schema_string("The optional source branch to merge into the base branch. Defaults to the current branch."),
                    "autoCreateContentRequest": {
                        "type": "object",
                        "description": "If there's no content request and this is provided, a content request will be created with the given title and description.",
                        "properties": {
                            "title": json_schema_string("Title for the content request"),
                            "description": json_schema_string("Optional description for the content request")
                        },
                        "required": ["title"]
                    }
                }),
                vec!["baseBranchName"],
            ),
            annotations: Some(ToolAnnotations::write("Merge Branch")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: MergeBranchArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e.detail()))),
        };

        let operation = Operation::MergeBranch {
            base_branch_name: args.base_branch_name,
            source_branch_name: args.source_branch_name,
            auto_create_content_request: args.auto_create_content_request,
        };
        let transaction = match Transaction::single(operation) {
            Ok(tx) => tx.with_author(auth.user_id.clone()),
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        match self.client.transactions().submit(&transaction, &auth).await {
            Ok(record) => Ok(CallToolResult::text(format!("Transaction {}", record.status))),
            Err(CanopyError::MutationFailed { message }) => Ok(CallToolResult::error(format!(
                "Mutation failed: {}.",
                message
            ))),
            Err(e) => Ok(CallToolResult::error(format!("Error: {}", e))),
        }
    }
}

/// Commit pending transactions on the active branch.
pub struct CommitTool {
    client: CanopyClient,
}

impl CommitTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct CommitArgs {
    message: String,
}

#[async_trait::async_trait]
impl Tool for CommitTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "commit".to_string(),
            description: "Commit pending transactions in the repository with a descriptive message".to_string(),
            input_schema: json_schema_object(
                json!({
                    "message": json_schema_string("The commit message describing the changes being committed")
                }),
                vec!["message"],
            ),
            annotations: Some(ToolAnnotations::write("Commit Changes")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: CommitArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e.detail()))),
        };
        let Some(branch) = auth.ref_name().map(str::to_string) else {
            return Ok(CallToolResult::error(
                "Error: no active branch to commit on".to_string(),
            ));
        };

        let operation = Operation::Commit {
            branch_name: branch,
            message: args.message,
        };
        let transaction = match Transaction::single(operation) {
            Ok(tx) => tx.with_author(auth.user_id.clone()),
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        match self.client.transactions().submit(&transaction, &auth).await {
            Ok(record) => Ok(CallToolResult::text(format!("Transaction {}", record.status))),
            Err(CanopyError::MutationFailed { message }) => Ok(CallToolResult::error(format!(
                "Mutation failed: {}.",
                message
            ))),
            Err(e) => Ok(CallToolResult::error(format!("Error: {}", e))),
        }
    }
}

/// List branches in the repository.
pub struct ListBranchesTool {
    client: CanopyClient,
}

impl ListBranchesTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ListBranchesArgs {
    limit: Option<u32>,
    offset: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for ListBranchesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_branches".to_string(),
            description: "List all branches in the current repository.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "limit": json_schema_number("The number of branches to list"),
                    "offset": json_schema_number("The offset to start listing branches from")
                }),
                vec![],
            ),
            annotations: Some(ToolAnnotations::read_only("List Branches")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: ListBranchesArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error listing branches: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error listing branches: {}",
                    e.detail()
                )))
            }
        };

        match self
            .client
            .branches()
            .list(&auth, args.limit, args.offset)
            .await
        {
            Ok(branches) => Ok(CallToolResult::text(
                serde_json::to_string(&branches).unwrap_or_default(),
            )),
            Err(e) => Ok(CallToolResult::error(format!(
                "Error listing branches: {}",
                e.detail()
            ))),
        }
    }
}

/// Report the caller's currently active ref.
pub struct CurrentRefTool {
    client: CanopyClient,
}

impl CurrentRefTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for CurrentRefTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_ref".to_string(),
            description: "Get the current branch/ref. This returns information about the currently active branch.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: Some(ToolAnnotations::read_only("Get Current Ref")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        _arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error getting current ref: {}",
                    e.detail()
                )))
            }
        };

        match &auth.active_ref {
            Some(active_ref) => Ok(CallToolResult::text(
                serde_json::to_string(active_ref).unwrap_or_default(),
            )),
            None => Ok(CallToolResult::error(
                "Error getting current ref: \"Missing ref object\"".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> ToolContext {
        ToolContext::from_headers([("authorization", "Bearer mcp_tok")])
    }

    async fn client_for(server: &MockServer) -> CanopyClient {
        CanopyClient::builder()
            .app_url(server.uri())
            .api_url(format!("{}/graphql", server.uri()))
            .build()
            .unwrap()
    }

    async fn mount_auth(server: &MockServer, ref_value: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/mcp/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "read": "rt_read",
                "write": "wt_write",
                "ref": ref_value,
                "userId": "user_42"
            })))
            .mount(server)
            .await;
    }

    fn transaction_response(status: &str, message: Option<&str>) -> serde_json::Value {
        json!({"data": {"transaction": {"status": status, "message": message}}})
    }

    fn first_text(result: &CallToolResult) -> &str {
        result.content[0].as_text()
    }

    // Scenario A: branch creation completes, checkout succeeds, the tool
    // reports success and the new current branch.
    #[tokio::test]
    async fn test_create_branch_with_auto_checkout() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_1", "name": "main"})).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("x-canopy-token", "wt_write"))
            .and(body_string_contains("create-branch"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(transaction_response("Completed", None)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .and(header("x-canopy-mcp-token", "mcp_tok"))
            .and(body_partial_json(json!({"op": "checkout", "targetRef": "feature/hero"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CreateBranchTool::new(client_for(&server).await);
        let result = tool
            .execute(
                &context(),
                json!({"baseBranchName": "main", "branchName": "feature/hero"}),
            )
            .await
            .unwrap();

        assert!(!result.is_error());
        let body: serde_json::Value = serde_json::from_str(first_text(&result)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["currentBranch"], "feature/hero");
        assert_eq!(body["transaction"]["status"], "Completed");
    }

    // Scenario B: branch creation fails; the server message surfaces
    // verbatim and checkout is never attempted.
    #[tokio::test]
    async fn test_create_branch_failure_skips_checkout() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_1", "name": "main"})).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(transaction_response(
                "Failed",
                Some("branch already exists"),
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(0)
            .mount(&server)
            .await;

        let tool = CreateBranchTool::new(client_for(&server).await);
        let result = tool
            .execute(
                &context(),
                json!({"baseBranchName": "main", "branchName": "feature/hero"}),
            )
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(first_text(&result).contains("branch already exists"));
    }

    // Scenario C: the branch is created but checkout fails; the checkout
    // failure is reported and the branch stays (no compensation).
    #[tokio::test]
    async fn test_create_branch_checkout_failure_is_reported() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_1", "name": "main"})).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(transaction_response("Completed", None)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CreateBranchTool::new(client_for(&server).await);
        let result = tool
            .execute(
                &context(),
                json!({"baseBranchName": "main", "branchName": "feature/hero"}),
            )
            .await
            .unwrap();

        assert!(result.is_error());
        let text = first_text(&result);
        assert!(text.starts_with("Error checking out branch:"));
        assert!(text.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_create_branch_without_auto_checkout() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_1", "name": "main"})).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(transaction_response("Completed", None)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(0)
            .mount(&server)
            .await;

        let tool = CreateBranchTool::new(client_for(&server).await);
        let result = tool
            .execute(
                &context(),
                json!({
                    "baseBranchName": "main",
                    "branchName": "feature/quiet",
                    "autoCheckout": false
                }),
            )
            .await
            .unwrap();

        assert!(!result.is_error());
        let body: serde_json::Value = serde_json::from_str(first_text(&result)).unwrap();
        assert!(body.get("currentBranch").is_none());
    }

    // Scenario D: no active ref in the auth context.
    #[tokio::test]
    async fn test_get_current_ref_missing_ref() {
        let server = MockServer::start().await;
        mount_auth(&server, serde_json::Value::Null).await;

        let tool = CurrentRefTool::new(client_for(&server).await);
        let result = tool.execute(&context(), json!({})).await.unwrap();

        assert!(result.is_error());
        assert_eq!(
            first_text(&result),
            "Error getting current ref: \"Missing ref object\""
        );
    }

    #[tokio::test]
    async fn test_get_current_ref_returns_ref_json() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_9", "name": "staging"})).await;

        let tool = CurrentRefTool::new(client_for(&server).await);
        let result = tool.execute(&context(), json!({})).await.unwrap();

        assert!(!result.is_error());
        let body: serde_json::Value = serde_json::from_str(first_text(&result)).unwrap();
        assert_eq!(body["type"], "branch");
        assert_eq!(body["name"], "staging");
    }

    #[tokio::test]
    async fn test_get_current_ref_without_credential() {
        // Must fail before any network call: no mocks mounted at all.
        let server = MockServer::start().await;
        let tool = CurrentRefTool::new(client_for(&server).await);
        let result = tool.execute(&ToolContext::new(), json!({})).await.unwrap();

        assert!(result.is_error());
        assert!(first_text(&result).contains("missing credential"));
    }

    #[tokio::test]
    async fn test_checkout_branch_tool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/mcp/manage"))
            .and(header("x-canopy-mcp-token", "mcp_tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": {"ok": 1}})),
            )
            .mount(&server)
            .await;

        let tool = CheckoutBranchTool::new(client_for(&server).await);
        let result = tool
            .execute(&context(), json!({"branchName": "staging"}))
            .await
            .unwrap();

        assert!(!result.is_error());
        let body: serde_json::Value = serde_json::from_str(first_text(&result)).unwrap();
        assert_eq!(body["currentBranch"], "staging");
    }

    #[tokio::test]
    async fn test_merge_branch_reports_status() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_1", "name": "feature/hero"})).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("merge-branch"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(transaction_response("Completed", None)),
            )
            .mount(&server)
            .await;

        let tool = MergeBranchTool::new(client_for(&server).await);
        let result = tool
            .execute(&context(), json!({"baseBranchName": "main"}))
            .await
            .unwrap();

        assert!(!result.is_error());
        assert_eq!(first_text(&result), "Transaction Completed");
    }

    #[tokio::test]
    async fn test_commit_uses_active_branch() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_1", "name": "feature/hero"})).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("feature/hero"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(transaction_response("Completed", None)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tool = CommitTool::new(client_for(&server).await);
        let result = tool
            .execute(&context(), json!({"message": "ship hero section"}))
            .await
            .unwrap();

        assert!(!result.is_error());
        assert_eq!(first_text(&result), "Transaction Completed");
    }

    #[tokio::test]
    async fn test_list_branches_tool() {
        let server = MockServer::start().await;
        mount_auth(&server, json!({"type": "branch", "id": "br_1", "name": "main"})).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"_sys": {"branches": {"items": [
                    {"id": "br_1", "name": "main", "createdAt": "2024-01-01T00:00:00Z"}
                ]}}}
            })))
            .mount(&server)
            .await;

        let tool = ListBranchesTool::new(client_for(&server).await);
        let result = tool.execute(&context(), json!({"limit": 5})).await.unwrap();

        assert!(!result.is_error());
        let body: serde_json::Value = serde_json::from_str(first_text(&result)).unwrap();
        assert_eq!(body[0]["name"], "main");
    }
}
