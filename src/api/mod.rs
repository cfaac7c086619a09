//! Typed wrappers for the recipe, ingredient, inventory and shopping-list
//! endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`Api`] pairs the shared [`SessionManager`] with an [`HttpGateway`]. Every
//! bearer call goes through `SessionManager::authorized`, so a 401 anywhere
//! triggers the same single refresh and single retry as the profile fetch.
//! Public listings skip the session entirely.
//!
//! DESIGN
//! ======
//! The server wraps single records under a resource key (`{"recette": {..}}`)
//! on some routes and returns them bare on others. [`parse_item`] accepts
//! both, so each endpoint only names the keys it may use.

mod ingredients;
mod inventories;
mod lists;
mod recipes;


use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::net::gateway::AuthScope;
use crate::net::http::HttpGateway;
use crate::net::types::{Page, PageRequest, parse_page};
use crate::session::{SessionError, SessionManager};

/// Resource client bound to one session.
#[derive(Clone)]
pub struct Api {
    session: SessionManager,
    http: HttpGateway,
}

impl Api {
    #[must_use]
    pub fn new(session: SessionManager, http: HttpGateway) -> Self {
        Self { session, http }
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    // =========================================================================
    // AUTHORIZED TRANSPORT
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, SessionError> {
        let http = &self.http;
        self.session
            .authorized(|token| async move {
                http.send(Method::GET, path, Some(&token), query, AuthScope::Bearer)
                    .await
            })
            .await
    }

    async fn send_body<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, SessionError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let http = &self.http;
        self.session
            .authorized(|token| {
                let method = method.clone();
                async move {
                    http.send_json(method, path, Some(&token), body, AuthScope::Bearer)
                        .await
                }
            })
            .await
    }

    /// DELETE and discard whatever confirmation body comes back.
    async fn delete(&self, path: &str) -> Result<(), SessionError> {
        let http = &self.http;
        let _: Value = self
            .session
            .authorized(|token| async move {
                http.send(Method::DELETE, path, Some(&token), &[], AuthScope::Bearer)
                    .await
            })
            .await?;
        Ok(())
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        page: PageRequest,
        filter: Option<(&'static str, &str)>,
    ) -> Result<Page<T>, SessionError> {
        let query = page_query(page, filter);
        let body: Value = self.get(path, &query).await?;
        parse_page(body, key, page.page)
    }
}

/// `page`/`per_page` plus an optional non-empty filter parameter.
pub(crate) fn page_query(page: PageRequest, filter: Option<(&'static str, &str)>) -> Vec<(&'static str, String)> {
    let mut query = page.query();
    if let Some((name, value)) = filter.filter(|(_, v)| !v.trim().is_empty()) {
        query.push((name, value.trim().to_owned()));
    }
    query
}

/// Decode a single record that may be wrapped under one of `keys`.
pub(crate) fn parse_item<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Result<T, SessionError> {
    let value = match body {
        Value::Object(mut map) => match keys.iter().find_map(|key| map.remove(*key)) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(value).map_err(|e| SessionError::Decode(e.to_string()))
}
