use reqwest::Method;
use serde_json::Value;

use super::{Api, page_query, parse_item};
use crate::net::gateway::AuthScope;
use crate::net::types::{Page, PageRequest, Recipe, RecipeDraft, RecipeScope, parse_page};
use crate::session::SessionError;

const RECIPES_KEY: &str = "recettes";
const RECIPE_KEY: &str = "recette";
const PUBLIC_RECIPES_PATH: &str = "/recettes/public";
const SUGGESTIONS_PATH: &str = "/recettes/suggestions";

pub(crate) fn scope_path(scope: RecipeScope) -> &'static str {
    match scope {
        RecipeScope::All => "/recettes",
        RecipeScope::Owned => "/recettes/privees",
        RecipeScope::OwnedPublic => "/recettes/publiques",
        RecipeScope::Saved => "/recettes/enregistrées",
    }
}

pub(crate) fn recipe_path(id: i64) -> String {
    format!("/recettes/{id}")
}

impl Api {
    /// List recipes for `scope`, optionally filtered by title.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the page decode.
    pub async fn list_recipes(
        &self,
        scope: RecipeScope,
        page: PageRequest,
        title: Option<&str>,
    ) -> Result<Page<Recipe>, SessionError> {
        self.get_page(scope_path(scope), RECIPES_KEY, page, title.map(|t| ("titre", t)))
            .await
    }

    /// Published recipes from every user. Works without a session.
    ///
    /// # Errors
    ///
    /// Transport and server failures, or [`SessionError::Rejected`].
    pub async fn public_recipes(&self, page: PageRequest, title: Option<&str>) -> Result<Page<Recipe>, SessionError> {
        let query = page_query(page, title.map(|t| ("titre", t)));
        let body: Value = self
            .http
            .send(Method::GET, PUBLIC_RECIPES_PATH, None, &query, AuthScope::Anonymous)
            .await?;
        parse_page(body, RECIPES_KEY, page.page)
    }

    /// Recipe suggestions for the home screen.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn suggestions(&self, limit: u32) -> Result<Vec<Recipe>, SessionError> {
        let body: Value = self.get(SUGGESTIONS_PATH, &[("limit", limit.to_string())]).await?;
        Ok(parse_page(body, RECIPES_KEY, 1)?.items)
    }

    /// # Errors
    ///
    /// [`SessionError::Rejected`] with status 404 or 403 for missing or
    /// private recipes, plus the usual authorized-call failures.
    pub async fn recipe(&self, id: i64) -> Result<Recipe, SessionError> {
        let body: Value = self.get(&recipe_path(id), &[]).await?;
        parse_item(body, &[RECIPE_KEY])
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, SessionError> {
        let body: Value = self.send_body(Method::POST, "/recettes", draft).await?;
        parse_item(body, &[RECIPE_KEY])
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<Recipe, SessionError> {
        let body: Value = self.send_body(Method::PUT, &recipe_path(id), draft).await?;
        parse_item(body, &[RECIPE_KEY])
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call.
    pub async fn delete_recipe(&self, id: i64) -> Result<(), SessionError> {
        self.delete(&recipe_path(id)).await
    }
}
