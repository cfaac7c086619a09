//! In-memory session snapshot and the notices emitted on transitions.

use crate::net::types::UserProfile;

/// Current credentials and identity.
///
/// `user` may lag behind the tokens: right after login or hydration the
/// session is authenticated while the profile fetch is still running.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    /// A profile fetch is in flight.
    pub profile_loading: bool,
    /// Last profile fetch failure, cleared when a fetch starts.
    pub profile_error: Option<String>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Reset to the logged-out state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("user", &self.user)
            .field("profile_loading", &self.profile_loading)
            .field("profile_error", &self.profile_error)
            .finish()
    }
}

/// Global notifications for UI consumers (toasts, redirects).
#[derive(Clone, Debug, PartialEq)]
pub enum SessionNotice {
    LoggedIn { email: String },
    Registered { email: String },
    LoggedOut,
    /// The refresh token was rejected or missing; the session was cleared.
    SessionExpired,
    /// The profile could not be fetched; the session is kept.
    ProfileUnavailable { message: String },
}
