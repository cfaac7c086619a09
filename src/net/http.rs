//! reqwest-backed Request Gateway.
//!
//! Thin HTTP wrapper: every call is built here, sent once, and handed to
//! `interpret_response` with the matching [`AuthScope`]. No retries happen at
//! this layer; the session decides when a 401 deserves a refresh.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::gateway::{AuthGateway, AuthScope, interpret_response};
use super::types::{AuthResponse, LoginRequest, ProfileResponse, RefreshResponse, RegisterRequest, UserProfile};
use crate::config::ClientConfig;
use crate::session::SessionError;

pub const LOGIN_PATH: &str = "/auth/connexion";
pub const REGISTER_PATH: &str = "/auth/inscription";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const PROFILE_PATH: &str = "/auth/profil";
pub const LOGOUT_PATH: &str = "/auth/deconnexion";

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client bound to one API base URL.
#[derive(Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Build a gateway with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transient`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| SessionError::Transient(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: config.api_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, endpoint(&self.base_url, path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request without a body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        scope: AuthScope,
    ) -> Result<T, SessionError> {
        let builder = self.request(method.clone(), path, token).query(query);
        execute(builder, &method, path, scope).await
    }

    /// Send a request with a JSON body.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
        scope: AuthScope,
    ) -> Result<T, SessionError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path, token).json(body);
        execute(builder, &method, path, scope).await
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

async fn execute<T: DeserializeOwned>(
    builder: reqwest::RequestBuilder,
    method: &Method,
    path: &str,
    scope: AuthScope,
) -> Result<T, SessionError> {
    let response = builder.send().await?;
    let status = response.status().as_u16();
    let text = response.text().await?;
    debug!(%method, path, status, "api response");
    interpret_response(status, &text, scope)
}

// =============================================================================
// AUTH ENDPOINTS
// =============================================================================

#[async_trait::async_trait]
impl AuthGateway for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, SessionError> {
        let body = LoginRequest { email, password };
        self.send_json(Method::POST, LOGIN_PATH, None, &body, AuthScope::Credentials)
            .await
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse, SessionError> {
        let body = RegisterRequest { email, password, name };
        self.send_json(Method::POST, REGISTER_PATH, None, &body, AuthScope::Credentials)
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError> {
        self.send(Method::POST, REFRESH_PATH, Some(refresh_token), &[], AuthScope::Refresh)
            .await
    }

    async fn profile(&self, access_token: &str) -> Result<UserProfile, SessionError> {
        let body: ProfileResponse = self
            .send(Method::GET, PROFILE_PATH, Some(access_token), &[], AuthScope::Bearer)
            .await?;
        Ok(body.user)
    }

    async fn logout(&self, access_token: &str) -> Result<(), SessionError> {
        let _: serde_json::Value = self
            .send(Method::POST, LOGOUT_PATH, Some(access_token), &[], AuthScope::Bearer)
            .await?;
        Ok(())
    }
}
