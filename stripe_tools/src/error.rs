use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    /// Covers malformed signature headers, stale timestamps and digest mismatches alike. The caller gets a single
    /// opaque rejection; the specific reason is only ever logged server-side.
    #[error("Webhook signature verification failed")]
    InvalidSignature,
    #[error("Webhook payload is missing {0}")]
    MissingField(String),
}
