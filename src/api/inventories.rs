use reqwest::Method;
use serde_json::Value;

use super::{Api, parse_item};
use crate::net::types::{Inventory, InventoryDraft, Page, PageRequest, StockDraft};
use crate::session::SessionError;

const INVENTORIES_PATH: &str = "/inventaires";
const INVENTORIES_KEY: &str = "inventaires";
const INVENTORY_KEY: &str = "inventaire";

pub(crate) fn inventory_path(id: i64) -> String {
    format!("{INVENTORIES_PATH}/{id}")
}

fn stock_path(inventory_id: i64, entry_id: Option<i64>) -> String {
    match entry_id {
        Some(entry) => format!("{INVENTORIES_PATH}/{inventory_id}/ingredients/{entry}"),
        None => format!("{INVENTORIES_PATH}/{inventory_id}/ingredients"),
    }
}

impl Api {
    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the page decode.
    pub async fn list_inventories(&self, page: PageRequest) -> Result<Page<Inventory>, SessionError> {
        self.get_page(INVENTORIES_PATH, INVENTORIES_KEY, page, None).await
    }

    /// Inventory with its stocked ingredients.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn inventory(&self, id: i64) -> Result<Inventory, SessionError> {
        let body: Value = self.get(&inventory_path(id), &[]).await?;
        parse_item(body, &[INVENTORY_KEY])
    }

    /// # Errors
    ///
    /// [`SessionError::Validation`] for a blank name, otherwise any failure
    /// from the authorized call or the decode.
    pub async fn create_inventory(&self, draft: &InventoryDraft) -> Result<Inventory, SessionError> {
        if draft.name.trim().is_empty() {
            return Err(SessionError::Validation("inventory name must not be empty".into()));
        }
        let body: Value = self.send_body(Method::POST, INVENTORIES_PATH, draft).await?;
        parse_item(body, &[INVENTORY_KEY])
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call or the decode.
    pub async fn update_inventory(&self, id: i64, draft: &InventoryDraft) -> Result<Inventory, SessionError> {
        let body: Value = self.send_body(Method::PUT, &inventory_path(id), draft).await?;
        parse_item(body, &[INVENTORY_KEY])
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call.
    pub async fn delete_inventory(&self, id: i64) -> Result<(), SessionError> {
        self.delete(&inventory_path(id)).await
    }

    /// Stock an ingredient in an inventory.
    ///
    /// # Errors
    ///
    /// [`SessionError::Validation`] for a negative quantity, otherwise any
    /// failure from the authorized call.
    pub async fn add_stock(&self, inventory_id: i64, draft: &StockDraft) -> Result<(), SessionError> {
        check_quantity(draft)?;
        let _: Value = self
            .send_body(Method::POST, &stock_path(inventory_id, None), draft)
            .await?;
        Ok(())
    }

    /// Change quantity, unit or price of a stocked ingredient.
    ///
    /// # Errors
    ///
    /// [`SessionError::Validation`] for a negative quantity, otherwise any
    /// failure from the authorized call.
    pub async fn update_stock(&self, inventory_id: i64, entry_id: i64, draft: &StockDraft) -> Result<(), SessionError> {
        check_quantity(draft)?;
        let _: Value = self
            .send_body(Method::PUT, &stock_path(inventory_id, Some(entry_id)), draft)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Any [`SessionError`] from the authorized call.
    pub async fn remove_stock(&self, inventory_id: i64, entry_id: i64) -> Result<(), SessionError> {
        self.delete(&stock_path(inventory_id, Some(entry_id))).await
    }
}

fn check_quantity(draft: &StockDraft) -> Result<(), SessionError> {
    if draft.available_quantity.is_finite() && draft.available_quantity >= 0.0 {
        Ok(())
    } else {
        Err(SessionError::Validation(format!(
            "available quantity must be zero or more, got {}",
            draft.available_quantity
        )))
    }
}
