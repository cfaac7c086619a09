//! Closed error taxonomy for session and API calls.
//!
//! DESIGN
//! ======
//! Every HTTP outcome is funneled through `net::gateway::interpret_response`,
//! so callers match on variants instead of inspecting response bodies.
//! The type is `Clone` because one refresh result is handed to every caller
//! that joined the same in-flight refresh.

/// Errors produced by session operations and authenticated API calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Login or registration was refused by the server (4xx).
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The refresh token was rejected or absent; the session has been cleared.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// No response from the server (connect failure, timeout, broken body).
    #[error("server unreachable: {0}")]
    Transient(String),

    /// The server answered with a 5xx status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The access token was rejected (401) on a bearer-authenticated call.
    #[error("access token rejected")]
    Unauthorized,

    /// Any other 4xx on a bearer-authenticated call (not found, bad request...).
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The operation needs a session and none is active.
    #[error("not logged in")]
    Unauthenticated,

    /// Client-side input validation failed before any request was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A success body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Durable token storage could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(String),
}

impl SessionError {
    /// True for failures where retrying later may succeed without any change
    /// to credentials (network trouble and 5xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Server { .. })
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}
