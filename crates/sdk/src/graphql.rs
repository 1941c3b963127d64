//! GraphQL request/response envelopes for the content API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GraphQL request body: `{ query, variables }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// A GraphQL response envelope: `{ data, errors }`.
///
/// Both halves can be present at once (partial responses); interpreting
/// them is endpoint-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl GraphqlResponse {
    pub fn has_errors(&self) -> bool {
        match &self.errors {
            None | Some(Value::Null) => false,
            Some(Value::Array(errors)) => !errors.is_empty(),
            Some(_) => true,
        }
    }
}
