//! Error types for the Canopy SDK.

use canopy_core::OperationError;

/// Result type for SDK operations.
pub type CanopyResult<T> = Result<T, CanopyError>;

/// Error taxonomy for calls against the Canopy backend.
///
/// Everything here is caught at the tool boundary and converted into a
/// structured error response; nothing is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum CanopyError {
    /// No credential could be extracted from the inbound call.
    #[error("missing credential: no authorization header on the tool call")]
    MissingCredential,

    /// The authentication endpoint rejected the token.
    #[error("failed to authenticate: {status} {status_text}")]
    AuthenticationFailed { status: u16, status_text: String },

    /// The authentication endpoint answered 2xx with a body that does not
    /// match the expected shape.
    #[error("malformed authentication response: {0}")]
    MalformedAuthResponse(String),

    /// Local validation rejected the operation before any network call.
    #[error("invalid operation: {0}")]
    InvalidOperation(#[from] OperationError),

    /// Network or HTTP-level failure. A repeated identical call after one
    /// of these may duplicate the mutation server-side; there is no
    /// idempotency key.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Structurally successful response whose body does not match the
    /// expected shape. Distinct from [`CanopyError::MutationFailed`], which
    /// is a well-shaped but unsuccessful result.
    #[error("unparseable result: {0}")]
    UnparseableResult(String),

    /// The backend applied none of the transaction and reported why.
    #[error("mutation failed: {message}")]
    MutationFailed { message: String },

    /// Invalid configuration, detected at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Serialization error while assembling a payload.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CanopyError {
    /// The part of the error worth showing a caller verbatim: the server's
    /// own message for rejected mutations, the display form otherwise.
    pub fn detail(&self) -> String {
        match self {
            CanopyError::MutationFailed { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
