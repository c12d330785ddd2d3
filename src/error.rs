use thiserror::Error;

/// Failures from the remote user directory.
///
/// Every remote call is attempted exactly once; there is no retry policy.
/// A failure is terminal for that request (or, during a bulk run, for that
/// single item).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or HTTP-level failure reaching the remote.
    #[error("transport error: {0}")]
    Transport(String),

    /// The requested entity does not exist on the server.
    #[error("user not found: {0}")]
    NotFound(String),

    /// The server rejected a write.
    #[error("server rejected update: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Top-level result type used by the binary and the event loop.
pub type Result<T> = anyhow::Result<T>;
