// Read-side tools: raw GraphQL queries, the structure document, the
// working-tree diff and schema introspection.

use crate::context::ToolContext;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolContent, ToolSchema};
use crate::tools::{authenticate, json_schema_boolean, json_schema_object, json_schema_string, Tool};
use anyhow::Result;
use canopy_sdk::api::{StructureRequest, TargetBlock};
use canopy_sdk::CanopyClient;
use serde::Deserialize;
use serde_json::json;

fn default_true() -> bool {
    true
}

/// Run a caller-supplied GraphQL query against the content repository.
pub struct QueryContentTool {
    client: CanopyClient,
}

impl QueryContentTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct QueryContentArgs {
    query: String,
    #[serde(default = "default_true")]
    draft: bool,
    variables: Option<serde_json::Value>,
}

#[async_trait::async_trait]
impl Tool for QueryContentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "query_content".to_string(),
            description: "Query the repository content. Use this to get content created by the user, or specific IDs for subsequent content changes. Use proper GraphQL syntax, include necessary fields and arguments, and consider using variables for dynamic queries.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "query": json_schema_string("The GraphQL query to execute against the content repository."),
                    "draft": json_schema_boolean("Whether to query the draft content repository. Defaults to true."),
                    "variables": {"type": "object", "description": "Variables for the GraphQL query."}
                }),
                vec!["query"],
            ),
            annotations: Some(ToolAnnotations::read_only("Query Repository Content")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: QueryContentArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error executing GraphQL query: {}",
                    e
                )))
            }
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error executing GraphQL query: {}",
                    e.detail()
                )))
            }
        };

        match self
            .client
            .content()
            .query(&auth, &args.query, args.variables, args.draft)
            .await
        {
            Ok(response) if response.has_errors() => Ok(CallToolResult::error(
                serde_json::to_string_pretty(&response.errors).unwrap_or_default(),
            )),
            Ok(response) => Ok(CallToolResult::text(
                serde_json::to_string_pretty(&response).unwrap_or_default(),
            )),
            Err(e) => Ok(CallToolResult::error(format!(
                "Error executing GraphQL query: {}",
                e.detail()
            ))),
        }
    }
}

/// Retrieve the structure of the repository as an XML document.
pub struct ContentStructureTool {
    client: CanopyClient,
}

impl ContentStructureTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetBlockArgs {
    id: Option<String>,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentStructureArgs {
    #[serde(default = "default_true")]
    draft: bool,
    target_block: Option<TargetBlockArgs>,
    #[serde(default)]
    focus: bool,
}

#[async_trait::async_trait]
impl Tool for ContentStructureTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_content_structure".to_string(),
            description: "Retrieve the structure of the current repository in XML format. Use when you need to know the structure / schema / blocks / tree of the repository.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "draft": json_schema_boolean("Whether to use draft mode. Defaults to true. Draft mode returns the working tree (useful when making changes to the CURRENT state), while non-draft mode returns the committed structure (useful for production content)."),
                    "targetBlock": {
                        "type": "object",
                        "description": "Target block to focus on.",
                        "properties": {
                            "id": json_schema_string("ID of the target block to focus on."),
                            "label": json_schema_string("Label for the target block, placed next to the block that matches the ID.")
                        }
                    },
                    "focus": json_schema_boolean("Whether to focus on the target block and strip the rest. Defaults to false.")
                }),
                vec![],
            ),
            annotations: Some(ToolAnnotations::read_only("Retrieve Repository Structure")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: ContentStructureArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e.detail()))),
        };

        let request = StructureRequest {
            draft: args.draft,
            target_block: args.target_block.map(|target| TargetBlock {
                id: target.id,
                label: target.label,
                focus: args.focus,
            }),
        };

        match self.client.content().structure(&auth, &request).await {
            Ok(structure) => Ok(CallToolResult {
                content: vec![
                    ToolContent::text(
                        structure
                            .unwrap_or_else(|| "The repository structure is empty".to_string()),
                    ),
                    ToolContent::text(
                        "Note: to understand more about the different block types and ways to mutate them, use the search_developer_docs tool (e.g. search_developer_docs(query: 'mutation date block'))",
                    ),
                ],
                is_error: None,
            }),
            Err(e) => Ok(CallToolResult::error(format!("Error: {}", e.detail()))),
        }
    }
}

/// Diff between the working tree and the head commit.
pub struct DiffTool {
    client: CanopyClient,
}

impl DiffTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DiffArgs {
    #[serde(default = "default_true")]
    simplified: bool,
}

#[async_trait::async_trait]
impl Tool for DiffTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_diff".to_string(),
            description: "Get the diff between the working tree and the head commit. To only know which blocks changed, set simplified to true. If you need the exact content changes, set simplified to false.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "simplified": json_schema_boolean("Whether to simplify the diff")
                }),
                vec![],
            ),
            annotations: Some(ToolAnnotations::read_only("Get Working Tree Diff")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: DiffArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error getting diff: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error getting diff: {}",
                    e.detail()
                )))
            }
        };

        match self.client.content().diff(&auth, args.simplified).await {
            Ok(diff) => Ok(CallToolResult::text(
                serde_json::to_string_pretty(&diff).unwrap_or_default(),
            )),
            Err(e) => Ok(CallToolResult::error(format!(
                "Error getting diff: {}",
                e.detail()
            ))),
        }
    }
}

/// Fetch the GraphQL schema of the content API.
pub struct GraphqlSchemaTool {
    client: CanopyClient,
}

impl GraphqlSchemaTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GraphqlSchemaTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_graphql_schema".to_string(),
            description: "Fetch the GraphQL schema of the content API as introspection JSON, to understand available types to query.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: Some(ToolAnnotations::read_only("Get GraphQL Schema")),
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
                    "Error fetching schema: {}",
                    e.detail()
                )))
            }
        };

        match self.client.content().introspect(&auth).await {
            Ok(schema) => Ok(CallToolResult::text(
                serde_json::to_string_pretty(&schema).unwrap_or_default(),
            )),
            Err(e) => Ok(CallToolResult::error(format!(
                "Error fetching schema: {}",
                e.detail()
            ))),
        }
    }
}
