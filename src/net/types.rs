//! Wire DTOs for the recipe-manager REST API.
//!
//! DESIGN
//! ======
//! The server speaks French field names (`nom`, `quantite`, `id_utilisateur`);
//! Rust fields use English names and `#[serde(rename)]` keeps the wire format
//! lossless. Optional server fields default instead of failing the decode.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

use crate::session::SessionError;

// =============================================================================
// AUTH
// =============================================================================

/// Identity resolved from an access token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "id_utilisateur", alias = "id")]
    pub id: i64,
    pub email: String,
    #[serde(rename = "nom")]
    pub display_name: String,
}

/// Body returned by the login and registration endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "utilisateur", default)]
    pub user: Option<UserProfile>,
}

/// Body returned by the refresh endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    #[serde(rename = "utilisateur")]
    pub(crate) user: UserProfile,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub(crate) email: &'a str,
    #[serde(rename = "mot_de_passe")]
    pub(crate) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub(crate) email: &'a str,
    #[serde(rename = "mot_de_passe")]
    pub(crate) password: &'a str,
    #[serde(rename = "nom")]
    pub(crate) name: &'a str,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Page selector sent as `page` / `per_page` query parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page: page.max(1), per_page: per_page.max(1) }
    }

    pub(crate) fn query(self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string()), ("per_page", self.per_page.to_string())]
    }
}

/// One page of a server-paginated listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pages: u32,
    pub current_page: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.pages
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    fn empty(requested: u32) -> Self {
        Self { items: Vec::new(), total: 0, pages: 1, current_page: requested }
    }
}

/// Decode a paginated body whose item array lives under `key`
/// (`recettes`, `ingredients`, `inventaires`, `courses`).
///
/// A body without an array under `key` yields an empty page for the
/// requested page number.
pub(crate) fn parse_page<T>(body: serde_json::Value, key: &str, requested: u32) -> Result<Page<T>, SessionError>
where
    T: serde::de::DeserializeOwned,
{
    let serde_json::Value::Object(mut map) = body else {
        return Ok(Page::empty(requested));
    };
    let Some(raw_items @ serde_json::Value::Array(_)) = map.remove(key) else {
        return Ok(Page::empty(requested));
    };
    let items: Vec<T> = serde_json::from_value(raw_items).map_err(|e| SessionError::Decode(e.to_string()))?;

    let number = |field: &str| map.get(field).and_then(serde_json::Value::as_u64);
    let total = number("total").unwrap_or(items.len() as u64);
    let pages = number("pages").and_then(|v| u32::try_from(v).ok()).unwrap_or(1);
    let current_page = number("current_page")
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(requested);

    Ok(Page { items, total, pages, current_page })
}

// =============================================================================
// INGREDIENTS
// =============================================================================

/// Catalog ingredient, or a recipe line when `quantity` is present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "id_ingredient")]
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "quantite", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(rename = "unite", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Price per 100 units of `unit`.
    #[serde(rename = "prix_unitaire", default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IngredientDraft {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "unite", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "prix_unitaire", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

// =============================================================================
// RECIPES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "id_etape", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "ordre")]
    pub order: u32,
    pub instruction: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "id_recette")]
    pub id: i64,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "publique", default)]
    pub public: bool,
    #[serde(rename = "id_utilisateur", default)]
    pub owner_id: Option<i64>,
    #[serde(rename = "temps_preparation", default)]
    pub prep_minutes: Option<u32>,
    #[serde(rename = "temps_cuisson", default)]
    pub cook_minutes: Option<u32>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(rename = "etapes", default)]
    pub steps: Vec<Step>,
    #[serde(rename = "createur", alias = "nom_utilisateur", default)]
    pub creator: Option<String>,
    #[serde(rename = "date_creation", default)]
    pub created_at: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

impl Recipe {
    /// Sum of `unit_price * quantity / 100` over ingredients that carry both.
    #[must_use]
    pub fn estimated_cost(&self) -> f64 {
        self.ingredients
            .iter()
            .filter_map(|ing| Some(ing.unit_price? * ing.quantity? / 100.0))
            .sum()
    }

    /// Preparation plus cooking time, when at least one is known.
    #[must_use]
    pub fn total_minutes(&self) -> Option<u32> {
        match (self.prep_minutes, self.cook_minutes) {
            (None, None) => None,
            (prep, cook) => Some(prep.unwrap_or(0) + cook.unwrap_or(0)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipeIngredientDraft {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "quantite")]
    pub quantity: f64,
    #[serde(rename = "unite")]
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepDraft {
    #[serde(rename = "ordre", skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    pub instruction: String,
}

/// Body for recipe creation and update.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RecipeDraft {
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "publique", skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(rename = "temps_preparation", skip_serializing_if = "Option::is_none")]
    pub prep_minutes: Option<u32>,
    #[serde(rename = "temps_cuisson", skip_serializing_if = "Option::is_none")]
    pub cook_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<RecipeIngredientDraft>,
    #[serde(rename = "etapes", skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepDraft>,
}

/// Which recipe listing to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeScope {
    /// Everything visible to the caller.
    All,
    /// The caller's private recipes.
    Owned,
    /// The caller's published recipes.
    OwnedPublic,
    /// Recipes the caller bookmarked.
    Saved,
}

// =============================================================================
// INVENTORIES
// =============================================================================

/// One stocked ingredient inside an inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    #[serde(rename = "id_inventaire_ingredient")]
    pub id: i64,
    #[serde(rename = "id_ingredient")]
    pub ingredient_id: i64,
    #[serde(rename = "nom_ingredient", default)]
    pub ingredient_name: String,
    #[serde(rename = "quantite_disponible")]
    pub available_quantity: f64,
    #[serde(rename = "unite")]
    pub unit: String,
    #[serde(rename = "prix_unitaire", default)]
    pub unit_price: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "id_inventaire")]
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "publique", default)]
    pub public: bool,
    #[serde(rename = "id_utilisateur", default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub ingredients: Vec<InventoryEntry>,
}

/// Body for inventory creation and rename.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InventoryDraft {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "publique", skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// Body for adding or updating a stocked ingredient.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockDraft {
    #[serde(rename = "id_ingredient", skip_serializing_if = "Option::is_none")]
    pub ingredient_id: Option<i64>,
    #[serde(rename = "quantite_disponible")]
    pub available_quantity: f64,
    #[serde(rename = "unite")]
    pub unit: String,
    #[serde(rename = "prix_unitaire")]
    pub unit_price: Option<f64>,
}

// =============================================================================
// SHOPPING LISTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    #[serde(rename = "id_item")]
    pub id: i64,
    #[serde(rename = "id_ingredient")]
    pub ingredient_id: i64,
    #[serde(rename = "nom_ingredient", default)]
    pub ingredient_name: String,
    #[serde(rename = "quantite")]
    pub quantity: f64,
    #[serde(rename = "unite")]
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    #[serde(rename = "id_liste")]
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "date_creation", default)]
    pub created_at: Option<String>,
    #[serde(rename = "id_utilisateur", default)]
    pub owner_id: Option<i64>,
    #[serde(rename = "id_recette", default)]
    pub recipe_id: Option<i64>,
    #[serde(rename = "id_inventaire", default)]
    pub inventory_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<ShoppingItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShoppingItemDraft {
    #[serde(rename = "id_ingredient")]
    pub ingredient_id: i64,
    #[serde(rename = "quantite")]
    pub quantity: f64,
    #[serde(rename = "unite")]
    pub unit: String,
}

/// Body for shopping-list creation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ShoppingListDraft {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "id_recette", skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<i64>,
    pub items: Vec<ShoppingItemDraft>,
}

/// Body for shopping-list updates.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ShoppingListUpdate {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "quantite", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(rename = "achete", skip_serializing_if = "Option::is_none")]
    pub purchased: Option<bool>,
}

/// One line of a generated shopping list: what the inventory lacks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissingIngredient {
    #[serde(rename = "id_ingredient")]
    pub ingredient_id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "quantite_manquante")]
    pub missing_quantity: f64,
    #[serde(rename = "unite")]
    pub unit: String,
    #[serde(rename = "prix_unitaire", default)]
    pub unit_price: f64,
    #[serde(rename = "cout", default)]
    pub cost: f64,
}

/// Shopping list generated from an inventory and a recipe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedShoppingList {
    #[serde(rename = "liste_courses", default)]
    pub items: Vec<MissingIngredient>,
    #[serde(rename = "total_cout", default)]
    pub total_cost: f64,
}
