use reqwest::Method;
use serde_json::Value;

use super::{Api, parse_item};
use crate::net::types::{Ingredient, IngredientDraft, Page, PageRequest};
use crate::session::SessionError;

const INGREDIENTS_PATH: &str = "/ingredients";
const INGREDIENTS_KEY: &str = "ingredients";
const INGREDIENT_KEY: &str = "ingredient";

fn ingredient_path(id: i64) -> String {
    format!("{INGREDIENTS_PATH}/{id}")
}

impl Api {
    /// Page through the ingredient catalog, optionally by name search.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the page decode.
    pub async fn list_ingredients(&self, page: PageRequest, search: Option<&str>) -> Result<Page<Ingredient>, SessionError> {
        self.get_page(INGREDIENTS_PATH, INGREDIENTS_KEY, page, search.map(|s| ("search", s)))
            .await
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn ingredient(&self, id: i64) -> Result<Ingredient, SessionError> {
        let body: Value = self.get(&ingredient_path(id), &[]).await?;
        parse_item(body, &[INGREDIENT_KEY])
    }

    /// # Errors
    ///
    /// [`SessionError::Validation`] for a blank name, otherwise any failure
    /// from the authorized call or the decode.
    pub async fn create_ingredient(&self, draft: &IngredientDraft) -> Result<Ingredient, SessionError> {
        if draft.name.trim().is_empty() {
            return Err(SessionError::Validation("ingredient name must not be empty".into()));
        }
        let body: Value = self.send_body(Method::POST, INGREDIENTS_PATH, draft).await?;
        parse_item(body, &[INGREDIENT_KEY])
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn update_ingredient(&self, id: i64, draft: &IngredientDraft) -> Result<Ingredient, SessionError> {
        let body: Value = self.send_body(Method::PUT, &ingredient_path(id), draft).await?;
        parse_item(body, &[INGREDIENT_KEY])
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call.
    pub async fn delete_ingredient(&self, id: i64) -> Result<(), SessionError> {
        self.delete(&ingredient_path(id)).await
    }
}
