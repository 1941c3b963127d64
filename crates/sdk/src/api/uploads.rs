//! Signed upload URLs for media files.

use crate::api::auth::AuthContext;
use crate::client::CanopyClient;
use crate::error::{CanopyError, CanopyResult};
use crate::graphql::GraphqlRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;

const UPLOAD_URL_MUTATION: &str = "mutation UploadUrl($fileName: String!) { getUploadSignedURL(fileName: $fileName) { signedURL uploadURL } }";

/// A signed URL pair: PUT the file to `signed_url`, reference it later at
/// `upload_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUpload {
    #[serde(rename = "signedURL")]
    pub signed_url: String,
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
}

#[derive(Deserialize)]
struct UploadData {
    #[serde(rename = "getUploadSignedURL")]
    upload: SignedUpload,
}

/// Uploads API.
pub struct UploadsApi<'a> {
    client: &'a CanopyClient,
}

impl<'a> UploadsApi<'a> {
    pub(crate) fn new(client: &'a CanopyClient) -> Self {
        Self { client }
    }

    /// Request a signed URL for uploading `file_name`.
    pub async fn signed_url(
        &self,
        auth: &AuthContext,
        file_name: &str,
    ) -> CanopyResult<SignedUpload> {
        let request = GraphqlRequest::new(UPLOAD_URL_MUTATION)
            .with_variables(json!({ "fileName": file_name }));
        // Uploads are repository-wide, not branch-scoped.
        let response = self.client.graphql(&auth.write, None, false, &request).await?;
        let data = response
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| CanopyError::UnparseableResult("no data in upload response".into()))?;
        let parsed: UploadData = serde_json::from_value(data)
            .map_err(|e| CanopyError::UnparseableResult(format!("signed upload: {}", e)))?;
        Ok(parsed.upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
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

    #[tokio::test]
    async fn test_signed_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("x-canopy-token", "wt_write"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "getUploadSignedURL": {
                        "signedURL": "https://storage.example/put/abc?sig=1",
                        "uploadURL": "https://assets.example/abc.jpg"
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = CanopyClient::builder()
            .app_url(server.uri())
            .api_url(format!("{}/graphql", server.uri()))
            .build()
            .unwrap();

        let upload = client
            .uploads()
            .signed_url(&auth(), "photo.jpg")
            .await
            .unwrap();
        assert!(upload.signed_url.contains("sig=1"));
        assert_eq!(upload.upload_url, "https://assets.example/abc.jpg");
    }
}
