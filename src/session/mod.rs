//! Session Store: login, registration, logout, hydration, and profile fetch.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `SessionManager` is built at startup and cloned into every consumer;
//! clones share state. It is the only writer of tokens and identity. Readers
//! take snapshots and never hold the lock across an `.await`.
//!
//! ERROR HANDLING
//! ==============
//! Foreground operations (`login`, `register`) return errors to the caller and
//! commit nothing on failure. Background paths (profile fetch, refresh)
//! record their outcome in shared state and on the notice channel. The only
//! error that mutates state by itself is `SessionExpired`, which logs out.

mod error;
mod refresh;
mod state;
mod storage;

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub use error::SessionError;
pub use refresh::spawn_refresh_task;
use refresh::RefreshFlight;
pub use state::{Session, SessionNotice};
pub use storage::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};

use crate::net::gateway::AuthGateway;
use crate::net::types::{AuthResponse, UserProfile};
use crate::validation;

const NOTICE_CAPACITY: usize = 32;

/// Shared handle to the process-wide session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn TokenStore>,
    session: RwLock<Session>,
    show_login_modal: AtomicBool,
    flight: RefreshFlight,
    notices: broadcast::Sender<SessionNotice>,
}

impl SessionManager {
    /// Build an empty (logged-out) session. Call [`SessionManager::hydrate`]
    /// to restore persisted tokens.
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>, store: Arc<dyn TokenStore>) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                gateway,
                store,
                session: RwLock::new(Session::default()),
                show_login_modal: AtomicBool::new(false),
                flight: RefreshFlight::new(),
                notices,
            }),
        }
    }

    // =========================================================================
    // READERS
    // =========================================================================

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.session.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.session.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    #[must_use]
    pub fn show_login_modal(&self) -> bool {
        self.inner.show_login_modal.load(Ordering::Relaxed)
    }

    pub fn set_show_login_modal(&self, show: bool) {
        self.inner.show_login_modal.store(show, Ordering::Relaxed);
    }

    /// Receive session notices emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.inner.notices.subscribe()
    }

    fn notify(&self, notice: SessionNotice) {
        // No subscribers is fine.
        let _ = self.inner.notices.send(notice);
    }

    // =========================================================================
    // LOGIN / REGISTER / LOGOUT
    // =========================================================================

    /// Exchange credentials for tokens, then fetch the profile.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure (typically [`SessionError::InvalidCredentials`]);
    /// the session is left exactly as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let auth = self.inner.gateway.login(email, password).await?;
        info!(email, "login succeeded");
        self.establish(auth);
        self.notify(SessionNotice::LoggedIn { email: email.to_owned() });
        let _ = self.fetch_profile().await;
        Ok(())
    }

    /// Create an account, then behave like [`SessionManager::login`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] without any request when the input
    /// is malformed, otherwise the gateway failure. State is untouched on error.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<(), SessionError> {
        validation::validate_registration(email, password, name)?;
        let auth = self.inner.gateway.register(email, password, name).await?;
        info!(email, "registration succeeded");
        self.establish(auth);
        self.notify(SessionNotice::Registered { email: email.to_owned() });
        let _ = self.fetch_profile().await;
        Ok(())
    }

    /// Commit a successful credential exchange in one step.
    fn establish(&self, auth: AuthResponse) {
        let tokens = StoredTokens { access_token: auth.access_token, refresh_token: auth.refresh_token };
        {
            let mut session = self.write();
            session.clear();
            session.access_token = Some(tokens.access_token.clone());
            session.refresh_token = Some(tokens.refresh_token.clone());
            session.user = auth.user;
        }
        self.set_show_login_modal(false);
        self.persist(&tokens);
    }

    fn persist(&self, tokens: &StoredTokens) {
        if let Err(e) = self.inner.store.save(tokens) {
            warn!(error = %e, "failed to persist session tokens");
        }
    }

    /// End the session. Never fails: the server call is best-effort and local
    /// state is cleared regardless.
    pub async fn logout(&self) {
        if let Some(token) = self.access_token() {
            if let Err(e) = self.inner.gateway.logout(&token).await {
                warn!(error = %e, "logout request failed; clearing local session anyway");
            }
        }
        self.clear();
        info!("logged out");
        self.notify(SessionNotice::LoggedOut);
    }

    /// Drop tokens and identity from memory and durable storage.
    pub fn clear(&self) {
        self.write().clear();
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "failed to clear persisted tokens");
        }
    }

    /// Restore persisted tokens, then probe them with a profile fetch.
    ///
    /// Returns whether a session was restored. A failing probe does not undo
    /// the restore unless it ends in [`SessionError::SessionExpired`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the token store cannot be read.
    pub async fn hydrate(&self) -> Result<bool, SessionError> {
        let Some(tokens) = self.inner.store.load()? else {
            debug!("no persisted session");
            return Ok(false);
        };
        if tokens.access_token.is_empty() || tokens.refresh_token.is_empty() {
            debug!("discarding partial persisted session");
            self.clear();
            return Ok(false);
        }
        {
            let mut session = self.write();
            session.clear();
            session.access_token = Some(tokens.access_token);
            session.refresh_token = Some(tokens.refresh_token);
        }
        info!("restored persisted session");
        let _ = self.fetch_profile().await;
        Ok(self.is_authenticated())
    }

    /// Optimistically patch the cached display name after a settings save.
    pub fn update_display_name(&self, name: &str) {
        if let Some(user) = self.write().user.as_mut() {
            name.clone_into(&mut user.display_name);
        }
    }

    // =========================================================================
    // TOKEN REFRESH
    // =========================================================================

    /// Mint a new access token. Concurrent callers share one request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionExpired`] after logging out when the
    /// refresh token is missing or the refresh call fails.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        self.inner.flight.run(|| self.refresh_now()).await
    }

    async fn refresh_now(&self) -> Result<(), SessionError> {
        let current = self.read().refresh_token.clone();
        let Some(refresh_token) = current else {
            warn!("no refresh token available");
            return Err(self.expire());
        };

        match self.inner.gateway.refresh(&refresh_token).await {
            Ok(resp) => {
                {
                    let mut session = self.write();
                    // A logout or new login during the call owns the session now.
                    if session.refresh_token.as_deref() != Some(refresh_token.as_str()) {
                        debug!("discarding refresh result for a replaced session");
                        return if session.is_authenticated() { Ok(()) } else { Err(SessionError::SessionExpired) };
                    }
                    session.access_token = Some(resp.access_token.clone());
                }
                self.persist(&StoredTokens { access_token: resp.access_token, refresh_token });
                debug!("access token refreshed");
                Ok(())
            }
            Err(e) => {
                {
                    let session = self.read();
                    if session.refresh_token.as_deref() != Some(refresh_token.as_str()) {
                        debug!(error = %e, "ignoring refresh failure for a replaced session");
                        return if session.is_authenticated() { Ok(()) } else { Err(SessionError::SessionExpired) };
                    }
                }
                warn!(error = %e, "token refresh failed");
                Err(self.expire())
            }
        }
    }

    /// Forced logout after a refresh failure.
    fn expire(&self) -> SessionError {
        self.clear();
        self.notify(SessionNotice::SessionExpired);
        SessionError::SessionExpired
    }

    // =========================================================================
    // AUTHORIZED CALLS
    // =========================================================================

    /// Run `op` with the current access token. On a 401, refresh once and
    /// re-run `op` once with the new token; a second 401 is returned as is.
    ///
    /// # Errors
    ///
    /// [`SessionError::Unauthenticated`] without a session, the refresh
    /// failure, or whatever `op` returns.
    pub async fn authorized<T, F, Fut>(&self, op: F) -> Result<T, SessionError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, SessionError>>,
    {
        let token = self.access_token().ok_or(SessionError::Unauthenticated)?;
        match op(token).await {
            Err(SessionError::Unauthorized) => {
                debug!("access token rejected; refreshing once");
                self.refresh().await?;
                let token = self.access_token().ok_or(SessionError::Unauthenticated)?;
                op(token).await
            }
            other => other,
        }
    }

    // =========================================================================
    // PROFILE FETCHER
    // =========================================================================

    /// Resolve the access token into a profile and cache it.
    ///
    /// # Errors
    ///
    /// [`SessionError::Unauthenticated`] without a session,
    /// [`SessionError::SessionExpired`] if the reactive refresh failed, or the
    /// transport/server failure (recorded in `profile_error`, session kept).
    pub async fn fetch_profile(&self) -> Result<UserProfile, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::Unauthenticated);
        }
        {
            let mut session = self.write();
            session.profile_loading = true;
            session.profile_error = None;
        }

        let gateway = Arc::clone(&self.inner.gateway);
        let result = self
            .authorized(|token| {
                let gateway = Arc::clone(&gateway);
                async move { gateway.profile(&token).await }
            })
            .await;

        let mut session = self.write();
        session.profile_loading = false;
        match result {
            Ok(user) => {
                if session.is_authenticated() {
                    session.user = Some(user.clone());
                }
                Ok(user)
            }
            Err(SessionError::SessionExpired) => Err(SessionError::SessionExpired),
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "profile fetch failed");
                session.profile_error = Some(message.clone());
                drop(session);
                self.notify(SessionNotice::ProfileUnavailable { message });
                Err(e)
            }
        }
    }
}
