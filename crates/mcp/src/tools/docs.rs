// Documentation tools: the block-type catalogue, mutation/query
// guidelines and developer docs search.

use crate::context::ToolContext;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use crate::tools::{json_schema_number, json_schema_object, json_schema_string, Tool};
use anyhow::Result;
use canopy_core::BLOCK_TYPE_REFERENCE;
use canopy_sdk::CanopyClient;
use serde::Deserialize;
use serde_json::json;

/// Appended to failed create/update transactions so agents can fix their
/// payloads without a round-trip to a human.
pub const FAILED_MUTATION_HELP_TEXT: &str = "Tips for failed mutations:\n\
- Check the block types and value shapes with get_block_types; types are kebab-case ('rich-text', not 'RichText').\n\
- Children of layout blocks (document, component, instance) nest inside their parent's value, never as separate array entries.\n\
- Updates and deletes need real block ids; fetch them first with query_content or get_content_structure.\n\
- Within one transaction a later entry can reference an earlier one by its transactionId placeholder.\n\
- Use get_mutation_guidelines for the full rules.";

pub const MUTATION_GUIDELINES: &str = "# Mutation Guidelines\n\
\n\
Mutations are submitted as a single transaction: an ordered array of operations\n\
(create / update / delete / create-branch / merge-branch / commit). The backend\n\
applies entries in order, so a later entry may reference an earlier entry's\n\
transactionId placeholder instead of a real block id.\n\
\n\
- Block types are written in kebab-case ('rich-text', 'code-snippet').\n\
- create entries need a type and a value; the value's shape depends on the type\n\
  (see get_block_types).\n\
- update and delete entries need the block's id.\n\
- Children always nest inside their parent's value key, never as separate\n\
  entries in the operations array.\n\
- og-image, event and workflow blocks are query-only: they cannot be created or\n\
  updated through the mutation api.\n\
- Pass autoCommit with a commit message to commit immediately instead of\n\
  leaving the changes as pending drafts. Don't auto-commit unless asked.\n\
- A Failed transaction applies nothing; fix the reported problem and resubmit\n\
  the whole transaction.";

pub const QUERY_GUIDELINES: &str = "# Query Guidelines\n\
\n\
Content is queried with GraphQL against the active branch's draft state by\n\
default (set draft to false for the committed state).\n\
\n\
- Access document blocks directly by field name and select their children:\n\
  fieldName { childFieldName }.\n\
- Collections take pagination arguments and expose items plus _meta:\n\
  fieldName(first: 10) { items { ... } _meta { totalCount } }.\n\
- Rich text exposes multiple formats: html, markdown, json, plainText.\n\
- Unions (media, references) need inline fragments:\n\
  fieldName { ... on BlockImage { url alt } }.\n\
- Use _sys { id } to fetch block ids for subsequent mutations.\n\
- Prefer variables over string interpolation for dynamic values.";

/// Serve the block-type catalogue.
pub struct BlockTypesTool;

#[async_trait::async_trait]
impl Tool for BlockTypesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_block_types".to_string(),
            description: "Retrieve all block types and their uses in a comprehensive markdown document. Useful for writing mutations.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: Some(ToolAnnotations::read_only("Get Block Types")),
        }
    }

    async fn execute(
        &self,
        _ctx: &ToolContext,
        _arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        Ok(CallToolResult::text(BLOCK_TYPE_REFERENCE))
    }
}

/// Serve the mutation guidelines.
pub struct MutationGuidelinesTool;

#[async_trait::async_trait]
impl Tool for MutationGuidelinesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_mutation_guidelines".to_string(),
            description: "Get guidelines for mutating content.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: Some(ToolAnnotations::read_only("Get Mutation Guidelines")),
        }
    }

    async fn execute(
        &self,
        _ctx: &ToolContext,
        _arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        Ok(CallToolResult::text(MUTATION_GUIDELINES))
    }
}

/// Serve the query guidelines.
pub struct QueryGuidelinesTool;

#[async_trait::async_trait]
impl Tool for QueryGuidelinesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_query_guidelines".to_string(),
            description: "Get guidelines for querying content.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: Some(ToolAnnotations::read_only("Get Query Guidelines")),
        }
    }

    async fn execute(
        &self,
        _ctx: &ToolContext,
        _arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        Ok(CallToolResult::text(QUERY_GUIDELINES))
    }
}

/// Search the developer docs.
pub struct SearchDeveloperDocsTool {
    client: CanopyClient,
}

impl SearchDeveloperDocsTool {
    pub fn new(client: CanopyClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDocsArgs {
    query: String,
    page: Option<u32>,
    per_page: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for SearchDeveloperDocsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_developer_docs".to_string(),
            description: "Search the developer docs.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "query": json_schema_string("The search query"),
                    "page": json_schema_number("The page number to search (optional)."),
                    "perPage": json_schema_number("The number of results to return per page (optional).")
                }),
                vec!["query"],
            ),
            annotations: Some(ToolAnnotations::read_only("Search Developer Docs")),
        }
    }

    async fn execute(
        &self,
        _ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult> {
        let args: SearchDocsArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error searching docs: {}", e))),
        };

        match self
            .client
            .docs()
            .search(
                &args.query,
                args.page.unwrap_or(1),
                args.per_page.unwrap_or(10),
            )
            .await
        {
            Ok(results) => Ok(CallToolResult::text(
                serde_json::to_string_pretty(&results).unwrap_or_default(),
            )),
            Err(e) => Ok(CallToolResult::error(format!(
                "Error searching docs: {}",
                e.detail()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_block_types_is_static() {
        let tool = BlockTypesTool;
        let result = tool.execute(&ToolContext::new(), json!({})).await.unwrap();
        assert!(!result.is_error());
        assert!(result.content[0].as_text().contains("## rich-text"));
    }

    #[tokio::test]
    async fn test_guidelines_are_static() {
        let result = MutationGuidelinesTool
            .execute(&ToolContext::new(), json!({}))
            .await
            .unwrap();
        assert!(result.content[0].as_text().contains("kebab-case"));

        let result = QueryGuidelinesTool
            .execute(&ToolContext::new(), json!({}))
            .await
            .unwrap();
        assert!(result.content[0].as_text().contains("GraphQL"));
    }

    #[tokio::test]
    async fn test_search_docs_defaults_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_partial_json(json!({"page": 1, "perPage": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = CanopyClient::builder()
            .app_url(server.uri())
            .api_url(format!("{}/graphql", server.uri()))
            .docs_url(server.uri())
            .build()
            .unwrap();

        let tool = SearchDeveloperDocsTool::new(client);
        let result = tool
            .execute(&ToolContext::new(), json!({"query": "rich-text"}))
            .await
            .unwrap();
        assert!(!result.is_error());
    }
}
