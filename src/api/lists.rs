use reqwest::Method;
use serde_json::Value;

use super::inventories::inventory_path;
use super::{Api, parse_item};
use crate::net::types::{GeneratedShoppingList, Page, PageRequest, ShoppingList, ShoppingListDraft, ShoppingListUpdate};
use crate::session::SessionError;

const LISTS_PATH: &str = "/courses";
const LISTS_KEY: &str = "courses";
// Creation answers under `liste`, update under `course`, fetch bare.
const LIST_KEYS: &[&str] = &["liste", "course"];

fn list_path(id: i64) -> String {
    format!("{LISTS_PATH}/{id}")
}

impl Api {
    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the page decode.
    pub async fn list_shopping_lists(&self, page: PageRequest, search: Option<&str>) -> Result<Page<ShoppingList>, SessionError> {
        self.get_page(LISTS_PATH, LISTS_KEY, page, search.map(|s| ("search", s)))
            .await
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn shopping_list(&self, id: i64) -> Result<ShoppingList, SessionError> {
        let body: Value = self.get(&list_path(id), &[]).await?;
        parse_item(body, LIST_KEYS)
    }

    /// # Errors
    ///
    /// [`SessionError::Validation`] for a blank name, otherwise any failure
    /// from the authorized call or the decode.
    pub async fn create_shopping_list(&self, draft: &ShoppingListDraft) -> Result<ShoppingList, SessionError> {
        if draft.name.trim().is_empty() {
            return Err(SessionError::Validation("shopping list name must not be empty".into()));
        }
        let body: Value = self.send_body(Method::POST, LISTS_PATH, draft).await?;
        parse_item(body, LIST_KEYS)
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn update_shopping_list(&self, id: i64, update: &ShoppingListUpdate) -> Result<ShoppingList, SessionError> {
        let body: Value = self.send_body(Method::PUT, &list_path(id), update).await?;
        parse_item(body, LIST_KEYS)
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call.
    pub async fn delete_shopping_list(&self, id: i64) -> Result<(), SessionError> {
        self.delete(&list_path(id)).await
    }

    /// Ask the server what `inventory_id` lacks to cook `recipe_id`.
    /// Without a recipe the server picks its own reference.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn generate_shopping_list(
        &self,
        inventory_id: i64,
        recipe_id: Option<i64>,
    ) -> Result<GeneratedShoppingList, SessionError> {
        let path = format!("{}/courses", inventory_path(inventory_id));
        let query: Vec<(&str, String)> = recipe_id
            .map(|id| ("id_recette", id.to_string()))
            .into_iter()
            .collect();
        self.get(&path, &query).await
    }
}
