// Token and upload tools.

use crate::context::ToolContext;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolContent, ToolSchema};
use crate::tools::{authenticate, json_schema_object, json_schema_string, Tool};
use anyhow::Result;
use canopy_sdk::CanopyClient;
use serde::Deserialize;
use serde_json::json;

/// Disclose one of the caller's scoped tokens (for wiring up an SDK or
/// `.env` file).
pub struct GetTokenTool {
    client: CanopyClient,
}

impl GetTokenTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    #[default]
    Read,
    Write,
}

#[derive(Debug, Deserialize)]
struct GetTokenArgs {
    #[serde(rename = "type", default)]
    kind: TokenKind,
}

#[async_trait::async_trait]
impl Tool for GetTokenTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_token".to_string(),
            description: "Get a scoped CANOPY_TOKEN.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "type": {
                        "type": "string",
                        "enum": ["read", "write"],
                        "description": "Which scope to return. Defaults to read."
                    }
                }),
                vec![],
            ),
            annotations: Some(ToolAnnotations::read_only("Get Token")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: GetTokenArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(_) => return Ok(CallToolResult::error("Error getting token")),
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            // Deliberately terse: don't echo details around credentials.
            Err(_) => return Ok(CallToolResult::error("Error getting token")),
        };

        let resolved = match args.kind {
            TokenKind::Read => auth.read,
            TokenKind::Write => auth.write,
        };

        Ok(CallToolResult {
            content: vec![
                ToolContent::text(resolved),
                ToolContent::text(
                    "Note: don't inline the token, prefer asking the user to append CANOPY_TOKEN=\"<token>\" to their .env/.env.local",
                ),
            ],
            is_error: None,
        })
    }
}

/// Request a signed URL for uploading a file.
pub struct UploadUrlTool {
    client: CanopyClient,
}

impl UploadUrlTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlArgs {
    file_name: String,
}

#[async_trait::async_trait]
impl Tool for UploadUrlTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_upload_url".to_string(),
            description: "Get a signed URL to upload a file. Useful for uploading media before referencing it from a block.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "fileName": json_schema_string("The name of the file to upload")
                }),
                vec!["fileName"],
            ),
            annotations: Some(ToolAnnotations::write("Get Upload URL")),
        }
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: UploadUrlArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error getting upload URL: {}",
                    e
                )))
            }
        };

        let auth = match authenticate(&self.client, ctx).await {
            Ok(auth) => auth,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Error getting upload URL: {}",
                    e.detail()
                )))
            }
        };

        match self.client.uploads().signed_url(&auth, &args.file_name).await {
            Ok(upload) => Ok(CallToolResult {
                content: vec![
                    ToolContent::text(format!("Upload URL: {}", upload.upload_url)),
                    ToolContent::text(format!(
                        "NOTE: if you have access to a terminal, you can upload the file by running `curl -X PUT --data-binary @/path/to/your/local/file {}`",
                        upload.signed_url
                    )),
                ],
                is_error: None,
            }),
            Err(e) => Ok(CallToolResult::error(format!(
                "Error getting upload URL: {}",
                e.detail()
            ))),
        }
    }
}
