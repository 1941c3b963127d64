//! Submitting mutation transactions and interpreting their outcome.

use crate::api::auth::AuthContext;
use crate::client::CanopyClient;
use crate::error::{CanopyError, CanopyResult};
use crate::graphql::{GraphqlRequest, GraphqlResponse};
use canopy_core::{Transaction, TransactionRecord};
use serde_json::{Map, Value};
use tracing::debug;

/// The transaction mutation. Operations travel JSON-encoded in `$data`,
/// ordered exactly as assembled by the builder.
const TRANSACTION_MUTATION: &str = "mutation Transaction($data: String!, $authorId: String, $autoCommit: String) { transaction(data: $data, authorId: $authorId, autoCommit: $autoCommit) { status message duration } }";

/// Transactions API.
pub struct TransactionsApi<'a> {
    client: &'a CanopyClient,
}

impl<'a> TransactionsApi<'a> {
    pub(crate) fn new(client: &'a CanopyClient) -> Self {
        Self { client }
    }

    /// Submit a transaction addressed to the caller's active branch and
    /// interpret the resulting record.
    ///
    /// A single attempt: no retry and no idempotency key, so resubmitting
    /// after a transport failure may duplicate the mutation server-side.
    pub async fn submit(
        &self,
        transaction: &Transaction,
        auth: &AuthContext,
    ) -> CanopyResult<TransactionRecord> {
        let payload = build_payload(transaction)?;
        debug!(
            operations = transaction.operations().len(),
            branch = auth.ref_name().unwrap_or("<default>"),
            "submitting transaction"
        );
        let response = self
            .client
            .graphql(&auth.write, auth.ref_name(), true, &payload)
            .await?;
        interpret(response)
    }
}

/// Map a validated transaction onto the wire payload. Item order is
/// preserved: the backend applies entries in sequence within the one
/// transaction.
fn build_payload(transaction: &Transaction) -> CanopyResult<GraphqlRequest> {
    let data = serde_json::to_string(transaction.operations())?;
    let mut variables = Map::new();
    variables.insert("data".to_string(), Value::String(data));
    if let Some(author_id) = transaction.author_id() {
        variables.insert("authorId".to_string(), Value::String(author_id.to_string()));
    }
    if let Some(message) = transaction.auto_commit() {
        variables.insert("autoCommit".to_string(), Value::String(message.to_string()));
    }
    Ok(GraphqlRequest::new(TRANSACTION_MUTATION).with_variables(Value::Object(variables)))
}

/// Classify a raw mutation response.
///
/// Shape mismatches become [`CanopyError::UnparseableResult`]; a
/// well-shaped `Failed` record becomes [`CanopyError::MutationFailed`]
/// carrying the server's message verbatim. Every other status passes
/// through, including Running and Scheduled, which nothing here polls.
fn interpret(response: GraphqlResponse) -> CanopyResult<TransactionRecord> {
    let raw = response
        .data
        .as_ref()
        .and_then(|data| data.get("transaction"))
        .cloned()
        .ok_or_else(|| {
            let detail = match &response.errors {
                Some(errors) => format!("no transaction in response, errors: {}", errors),
                None => "no transaction in response".to_string(),
            };
            CanopyError::UnparseableResult(detail)
        })?;

    let record: TransactionRecord = serde_json::from_value(raw)
        .map_err(|e| CanopyError::UnparseableResult(format!("transaction record: {}", e)))?;

    match record.failure_message() {
        Some(message) => Err(CanopyError::MutationFailed { message }),
        None => Ok(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{BlockType, CreateEntry, Operation, TransactionStatus, UpdateEntry};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_on(branch: &str) -> AuthContext {
        serde_json::from_value(json!({
            "read": "rt_read",
            "write": "wt_write",
            "ref": { "type": "branch", "id": "br_1", "name": branch },
            "userId": "user_42"
        }))
        .unwrap()
    }

    fn sample_transaction(n: usize) -> Transaction {
        let ops = (0..n)
            .map(|i| {
                Operation::Update(UpdateEntry {
                    id: format!("blk_{}", i),
                    title: Some(format!("title {}", i)),
                    ..Default::default()
                })
            })
            .collect();
        Transaction::new(ops).unwrap().with_author("user_42")
    }

    async fn client_for(server: &MockServer) -> CanopyClient {
        CanopyClient::builder()
            .app_url(server.uri())
            .api_url(format!("{}/graphql", server.uri()))
            .build()
            .unwrap()
    }

    fn transaction_response(status: &str, message: Option<&str>) -> serde_json::Value {
        json!({
            "data": {
                "transaction": {
                    "status": status,
                    "message": message,
                    "duration": 12.5
                }
            }
        })
    }

    #[test]
    fn test_build_payload_preserves_order_and_count() {
        let tx = sample_transaction(4);
        let payload = build_payload(&tx).unwrap();
        let variables = payload.variables.unwrap();

        let data: Vec<serde_json::Value> =
            serde_json::from_str(variables["data"].as_str().unwrap()).unwrap();
        assert_eq!(data.len(), 4);
        for (i, entry) in data.iter().enumerate() {
            assert_eq!(entry["type"], "update");
            assert_eq!(entry["id"], format!("blk_{}", i));
        }
        assert_eq!(variables["authorId"], "user_42");
        assert!(variables.get("autoCommit").is_none());
    }

    #[test]
    fn test_build_payload_auto_commit() {
        let tx = Transaction::single(Operation::Create {
            parent_id: None,
            data: CreateEntry::new(BlockType::Text, json!("hi")),
        })
        .unwrap()
        .with_auto_commit("initial content");

        let payload = build_payload(&tx).unwrap();
        let variables = payload.variables.unwrap();
        assert_eq!(variables["autoCommit"], "initial content");
        assert!(variables.get("authorId").is_none());
    }

    #[test]
    fn test_interpret_failed_keeps_server_message() {
        let response: GraphqlResponse =
            serde_json::from_value(transaction_response("Failed", Some("branch already exists")))
                .unwrap();
        let err = interpret(response).unwrap_err();
        match err {
            CanopyError::MutationFailed { message } => {
                assert_eq!(message, "branch already exists");
            }
            other => panic!("expected MutationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_failed_without_message_falls_back() {
        let response: GraphqlResponse =
            serde_json::from_value(transaction_response("Failed", None)).unwrap();
        let err = interpret(response).unwrap_err();
        assert_eq!(err.detail(), "Unknown error");
    }

    #[test]
    fn test_interpret_shape_mismatch() {
        let response: GraphqlResponse =
            serde_json::from_value(json!({"data": {"something": "else"}})).unwrap();
        assert!(matches!(
            interpret(response).unwrap_err(),
            CanopyError::UnparseableResult(_)
        ));

        // A valid envelope with an unknown status is also unparseable,
        // not a Failed transaction.
        let response: GraphqlResponse =
            serde_json::from_value(transaction_response("Exploded", None)).unwrap();
        assert!(matches!(
            interpret(response).unwrap_err(),
            CanopyError::UnparseableResult(_)
        ));
    }

    #[tokio::test]
    async fn test_submit_uses_write_token_and_ref() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("x-canopy-token", "wt_write"))
            .and(header("x-canopy-ref", "feature/hero"))
            .and(header("x-canopy-draft", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(transaction_response("Completed", None)),
            )
            .mount(&server)
            .await;

        let record = client_for(&server)
            .await
            .transactions()
            .submit(&sample_transaction(1), &auth_on("feature/hero"))
            .await
            .unwrap();

        assert_eq!(record.status, TransactionStatus::Completed);
        assert_eq!(record.duration, Some(12.5));
    }

    #[tokio::test]
    async fn test_submit_twice_yields_two_independent_records() {
        // No dedup key: two identical submissions are two transactions.
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(transaction_response("Completed", None)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tx = sample_transaction(1);
        let auth = auth_on("main");

        let first = client.transactions().submit(&tx, &auth).await.unwrap();
        let second = client.transactions().submit(&tx, &auth).await.unwrap();
        assert_eq!(first.status, second.status);
    }

    #[tokio::test]
    async fn test_submit_non_2xx_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .transactions()
            .submit(&sample_transaction(1), &auth_on("main"))
            .await
            .unwrap_err();
        assert!(matches!(err, CanopyError::Transport(_)));
    }
}
