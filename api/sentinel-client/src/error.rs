use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The stored token was missing, expired or rejected. It has been cleared.
    #[error("not authenticated; run `sentinel login`")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected ({code}): {detail}")]
    Validation { code: String, detail: String },
    #[error("conflict ({code}): {detail}")]
    Conflict { code: String, detail: String },
    #[error("forbidden ({code}): {detail}")]
    Forbidden { code: String, detail: String },
    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("token store: {0}")]
    TokenStore(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
