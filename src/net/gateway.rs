//! Request Gateway seam and the single response-interpretation boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionManager` talks to the remote API only through [`AuthGateway`], so
//! tests swap in a scripted gateway while production uses `HttpGateway`.
//!
//! ERROR HANDLING
//! ==============
//! [`interpret_response`] is the only place a status code and body become a
//! `SessionError`. The same status means different things per call: a 401 on
//! login is bad credentials, on refresh it is an expired session, and on a
//! bearer call it is the trigger for a refresh.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::types::{AuthResponse, RefreshResponse, UserProfile};
use crate::session::SessionError;

/// Auth endpoints of the remote API.
#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    /// `POST /auth/connexion`.
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, SessionError>;

    /// `POST /auth/inscription`.
    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse, SessionError>;

    /// `POST /auth/refresh` with the refresh token as bearer.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError>;

    /// `GET /auth/profil` with the access token as bearer.
    async fn profile(&self, access_token: &str) -> Result<UserProfile, SessionError>;

    /// `POST /auth/deconnexion` with the access token as bearer.
    async fn logout(&self, access_token: &str) -> Result<(), SessionError>;
}

/// How a failed status should be classified for a given call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScope {
    /// Unauthenticated credential exchange (login, register).
    Credentials,
    /// Refresh-token exchange; any rejection ends the session.
    Refresh,
    /// Call authorized by the access token.
    Bearer,
    /// Call that needs no token at all (public listings).
    Anonymous,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    details: Option<String>,
}

/// Human-readable message from an error body, falling back to the status.
pub(crate) fn failure_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    match (parsed.message, parsed.details) {
        (Some(message), Some(details)) if !details.is_empty() => format!("{message} ({details})"),
        (Some(message), _) => message,
        (None, _) => format!("HTTP {status}"),
    }
}

/// Classify a non-2xx status for `scope`.
pub(crate) fn classify_failure(status: u16, body: &str, scope: AuthScope) -> SessionError {
    if status >= 500 {
        return SessionError::Server { status, message: failure_message(status, body) };
    }
    match scope {
        AuthScope::Credentials => SessionError::InvalidCredentials(failure_message(status, body)),
        AuthScope::Refresh => SessionError::SessionExpired,
        AuthScope::Bearer if status == 401 => SessionError::Unauthorized,
        AuthScope::Bearer | AuthScope::Anonymous => {
            SessionError::Rejected { status, message: failure_message(status, body) }
        }
    }
}

/// Turn a status and raw body into a typed result.
///
/// # Errors
///
/// Returns the classified failure for non-2xx statuses, or
/// [`SessionError::Decode`] when a 2xx body does not match `T`.
pub fn interpret_response<T: DeserializeOwned>(status: u16, body: &str, scope: AuthScope) -> Result<T, SessionError> {
    if !(200..300).contains(&status) {
        return Err(classify_failure(status, body, scope));
    }
    // Empty 2xx bodies (204, bare 200) decode as JSON null.
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| SessionError::Decode(e.to_string()))
}
