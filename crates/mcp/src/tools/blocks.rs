// Block mutation tools: create, update and delete blocks in one
// transaction each.

use crate::context::ToolContext;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolContent, ToolSchema};
use crate::tools::docs::FAILED_MUTATION_HELP_TEXT;
use crate::tools::{authenticate, json_schema_array, json_schema_object, json_schema_string, Tool};
use anyhow::Result;
use canopy_core::{CreateEntry, Operation, Transaction, UpdateEntry};
use canopy_sdk::{CanopyClient, CanopyError};
use serde::Deserialize;
use serde_json::json;

/// A mutation-failure result with the help text appended, so agents can
/// self-correct their payload shapes.
fn mutation_failed(message: &str) -> CallToolResult {
    CallToolResult {
        content: vec![
            ToolContent::text(format!("Mutation failed: {}.", message)),
            ToolContent::text(FAILED_MUTATION_HELP_TEXT),
        ],
        is_error: Some(true),
    }
}

/// Create one or more blocks (with possibly nested children) in a single
/// transaction.
pub struct CreateBlocksTool {
    client: CanopyClient,
}

impl CreateBlocksTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBlocksArgs {
    parent_id: Option<String>,
    data: Vec<CreateEntry>,
    auto_commit: Option<String>,
}

#[async_trait::async_trait]
impl Tool for CreateBlocksTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_blocks".to_string(),
            description: "Create one or more blocks (with possible nested children) in a single transaction. Children should always be nested in the value key of their parent, never as another item in the array. Each create entry requires a block type (kebab-case, see get_block_types) and a value whose shape depends on that type.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "parentId": json_schema_string("Optional ID of the parent block. If provided, the new blocks are created as children of this block; otherwise at the root level."),
                    "data": json_schema_array(
                        json_schema_object(
                            json!({
                                "type": json_schema_string("Block type, kebab-case (e.g. 'text', 'rich-text')"),
                                "title": json_schema_string("Title for the new block"),
                                "value": {"description": "Block value; shape depends on the block type."}
                            }),
                            vec!["type", "value"],
                        ),
                        "Array of block creation objects, each with its own type and value.",
                    ),
                    "autoCommit": json_schema_string("Optional commit message. If provided, the transaction is auto-committed with this message. Don't provide unless the user asks for it.")
                }),
                vec!["data"],
            ),
            annotations: Some(ToolAnnotations::write("Create Blocks")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: CreateBlocksArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e.detail()))),
        };

        let operations = args
            .data
            .into_iter()
            .map(|data| Operation::Create {
                parent_id: args.parent_id.clone(),
                data,
            })
            .collect();
        let mut transaction = match Transaction::new(operations) {
            Ok(tx) => tx.with_author(auth.user_id.clone()),
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };
        if let Some(message) = args.auto_commit {
            transaction = transaction.with_auto_commit(message);
        }

        match self.client.transactions().submit(&transaction, &auth).await {
            Ok(record) => Ok(CallToolResult::text(format!("Transaction {}", record.status))),
            Err(CanopyError::MutationFailed { message }) => Ok(mutation_failed(&message)),
            Err(e) => Ok(CallToolResult::error(format!("Error: {}", e))),
        }
    }
}

/// Update one or more blocks in a single transaction.
pub struct UpdateBlocksTool {
    client: CanopyClient,
}

impl UpdateBlocksTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBlocksArgs {
    data: Vec<UpdateEntry>,
    auto_commit: Option<String>,
}

#[async_trait::async_trait]
impl Tool for UpdateBlocksTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "update_blocks".to_string(),
            description: "Update one or more blocks in a single transaction; see get_block_types for value shapes. When updating layout blocks (document, instance, etc.), use value: { childApiName: ... } to update the children blocks.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "data": json_schema_array(
                        json_schema_object(
                            json!({
                                "id": json_schema_string("ID of the block to update"),
                                "title": json_schema_string("New title"),
                                "value": {"description": "Update payload; shape depends on the block type."}
                            }),
                            vec!["id"],
                        ),
                        "Array of update objects, each with at least 'id' and update fields.",
                    ),
                    "autoCommit": json_schema_string("Optional commit message. If provided, the transaction is auto-committed with this message. Don't provide unless the user asks for it.")
                }),
                vec!["data"],
            ),
            annotations: Some(ToolAnnotations::write("Update Blocks")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: UpdateBlocksArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e.detail()))),
        };

        let operations = args.data.into_iter().map(Operation::Update).collect();
        let mut transaction = match Transaction::new(operations) {
            Ok(tx) => tx.with_author(auth.user_id.clone()),
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };
        if let Some(message) = args.auto_commit {
            transaction = transaction.with_auto_commit(message);
        }

        match self.client.transactions().submit(&transaction, &auth).await {
            Ok(record) => Ok(CallToolResult::text(format!("Transaction {}", record.status))),
            Err(CanopyError::MutationFailed { message }) => Ok(mutation_failed(&message)),
            Err(e) => Ok(CallToolResult::error(format!("Error: {}", e))),
        }
    }
}

/// Delete one or more blocks in a single transaction.
pub struct DeleteBlocksTool {
    client: CanopyClient,
}

impl DeleteBlocksTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteTarget {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBlocksArgs {
    data: Vec<DeleteTarget>,
    auto_commit: Option<String>,
}

#[async_trait::async_trait]
impl Tool for DeleteBlocksTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_blocks".to_string(),
            description: "Delete one or more blocks in a single transaction.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "data": json_schema_array(
                        json_schema_object(
                            json!({"id": json_schema_string("ID of the block to delete")}),
                            vec!["id"],
                        ),
                        "Array of delete objects, each with at least 'id'.",
                    ),
                    "autoCommit": json_schema_string("Optional commit message. If provided, the transaction is auto-committed with this message.")
                }),
                vec!["data"],
            ),
            annotations: Some(ToolAnnotations::destructive("Delete Blocks")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: DeleteBlocksArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e.detail()))),
        };

        let operations = args
            .data
            .into_iter()
            .map(|target| Operation::Delete { id: target.id })
            .collect();
        let mut transaction = match Transaction::new(operations) {
            Ok(tx) => tx.with_author(auth.user_id.clone()),
            Err(e) => return Ok(CallToolResult::error(format!("Error: {}", e))),
        };
        if let Some(message) = args.auto_commit {
            transaction = transaction.with_auto_commit(message);
        }

        match self.client.transactions().submit(&transaction, &auth).await {
            Ok(record) => Ok(CallToolResult::text(format!("Transaction {}", record.status))),
            Err(CanopyError::MutationFailed { message }) => Ok(mutation_failed(&message)),
            Err(e) => Ok(CallToolResult::error(format!("Error: {}", e))),
        }
    }
}
