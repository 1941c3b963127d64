//! Read-side access to the content tree: raw GraphQL queries, the
//! structure document and the working-tree diff.

use crate::api::auth::AuthContext;
use crate::client::CanopyClient;
use crate::error::{CanopyError, CanopyResult};
use crate::graphql::{GraphqlRequest, GraphqlResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const STRUCTURE_QUERY: &str = "query Structure($targetBlock: StructureTargetBlockInput) { _structure(resolveTargetsWith: objectName, targetBlock: $targetBlock) }";

const DIFF_QUERY: &str =
    "query Diff($simplified: Boolean) { _diff(simplified: $simplified) }";

/// The standard GraphQL introspection query, trimmed to three levels of
/// type nesting, which is enough for the content schema.
const INTROSPECTION_QUERY: &str = "query IntrospectionQuery { __schema { queryType { name } mutationType { name } types { kind name description fields(includeDeprecated: true) { name description args { name description type { kind name ofType { kind name ofType { kind name } } } defaultValue } type { kind name ofType { kind name ofType { kind name } } } isDeprecated deprecationReason } inputFields { name description type { kind name ofType { kind name ofType { kind name } } } defaultValue } interfaces { kind name } enumValues(includeDeprecated: true) { name description isDeprecated deprecationReason } possibleTypes { kind name } } } }";

/// Block to focus a structure request on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub focus: bool,
}

/// Arguments for a structure fetch.
#[derive(Debug, Clone, Default)]
pub struct StructureRequest {
    /// Draft mode returns the working tree; non-draft the committed state.
    pub draft: bool,
    pub target_block: Option<TargetBlock>,
}

#[derive(Deserialize)]
struct StructureData {
    #[serde(rename = "_structure")]
    structure: Option<String>,
}

#[derive(Deserialize)]
struct DiffData {
    #[serde(rename = "_diff")]
    diff: Value,
}

/// Content API.
pub struct ContentApi<'a> {
    client: &'a CanopyClient,
}

impl<'a> ContentApi<'a> {
    pub(crate) fn new(client: &'a CanopyClient) -> Self {
        Self { client }
    }

    /// Run a caller-supplied GraphQL query with the read token. The
    /// response envelope is returned as-is; GraphQL-level errors are the
    /// caller's to surface.
    pub async fn query(
        &self,
        auth: &AuthContext,
        query: &str,
        variables: Option<Value>,
        draft: bool,
    ) -> CanopyResult<GraphqlResponse> {
        let mut request = GraphqlRequest::new(query);
        if let Some(variables) = variables {
            request = request.with_variables(variables);
        }
        // Queries without an active branch fall back to main, matching the
        // backend's own default.
        let branch = auth.ref_name().unwrap_or("main");
        self.client
            .graphql(&auth.read, Some(branch), draft, &request)
            .await
    }

    /// Fetch the structure document of the repository. `None` means the
    /// repository is empty.
    pub async fn structure(
        &self,
        auth: &AuthContext,
        request: &StructureRequest,
    ) -> CanopyResult<Option<String>> {
        let variables = match &request.target_block {
            Some(target) if target.id.is_some() => json!({ "targetBlock": target }),
            _ => json!({}),
        };
        let graphql = GraphqlRequest::new(STRUCTURE_QUERY).with_variables(variables);
        let response = self
            .client
            .graphql(&auth.read, auth.ref_name(), request.draft, &graphql)
            .await?;
        let data: StructureData = decode(response)?;
        Ok(data.structure)
    }

    /// Diff between the working tree and the head commit of the active
    /// branch. The diff itself is computed server-side.
    pub async fn diff(&self, auth: &AuthContext, simplified: bool) -> CanopyResult<Value> {
        let graphql = GraphqlRequest::new(DIFF_QUERY)
            .with_variables(json!({ "simplified": simplified }));
        let response = self
            .client
            .graphql(&auth.read, auth.ref_name(), true, &graphql)
            .await?;
        let data: DiffData = decode(response)?;
        Ok(data.diff)
    }

    /// Fetch the GraphQL schema of the content API as introspection JSON.
    pub async fn introspect(&self, auth: &AuthContext) -> CanopyResult<Value> {
        let graphql = GraphqlRequest::new(INTROSPECTION_QUERY);
        let response = self
            .client
            .graphql(&auth.read, auth.ref_name(), false, &graphql)
            .await?;
        response
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| CanopyError::UnparseableResult("no data in introspection".into()))
    }
}

/// Decode the `data` half of a response into the expected shape; anything
/// else (including GraphQL errors with no data) is an unparseable
/// result, never a silent fallback to raw serialization.
fn decode<T: serde::de::DeserializeOwned>(response: GraphqlResponse) -> CanopyResult<T> {
    let data = match response.data {
        Some(data) if !data.is_null() => data,
        _ => {
            let detail = match &response.errors {
                Some(errors) => format!("no data in response, errors: {}", errors),
                None => "no data in response".to_string(),
            };
            return Err(CanopyError::UnparseableResult(detail));
        }
    };
    serde_json::from_value(data).map_err(|e| CanopyError::UnparseableResult(e.to_string()))
}
