//! Local shopping-list generation: what an inventory lacks for a recipe.
//!
//! Mirrors the server-side generator so a list can be previewed from data
//! already fetched. Recipe lines match stock by ingredient id first, then by
//! case-insensitive name. Quantities convert within mass (mg/g/kg) and
//! volume (mL/cL/dL/L); any other unit only matches itself.
//!
//! Prices are per 100 units of the recipe line's unit, so a line costs
//! `unit_price * missing / 100`. Costs are rounded to cents.

#[cfg(test)]
#[path = "shopping_test.rs"]
mod shopping_test;

use tracing::debug;

use crate::net::types::{GeneratedShoppingList, Ingredient, Inventory, InventoryEntry, MissingIngredient, Recipe};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Dimension {
    Mass,
    Volume,
}

/// Dimension and factor to the base unit (g or mL), if the unit is known.
fn scale(unit: &str) -> Option<(Dimension, f64)> {
    match unit.trim().to_lowercase().as_str() {
        "mg" => Some((Dimension::Mass, 0.001)),
        "g" => Some((Dimension::Mass, 1.0)),
        "kg" => Some((Dimension::Mass, 1000.0)),
        "ml" => Some((Dimension::Volume, 1.0)),
        "cl" => Some((Dimension::Volume, 10.0)),
        "dl" => Some((Dimension::Volume, 100.0)),
        "l" => Some((Dimension::Volume, 1000.0)),
        _ => None,
    }
}

/// Convert `quantity` from `from` into `to`. `None` when the units are
/// incompatible.
#[must_use]
pub fn convert(quantity: f64, from: &str, to: &str) -> Option<f64> {
    match (scale(from), scale(to)) {
        (Some((df, ff)), Some((dt, ft))) if df == dt => Some(quantity * ff / ft),
        (None, None) if from.trim().eq_ignore_ascii_case(to.trim()) => Some(quantity),
        _ => None,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn find_stock<'a>(inventory: &'a Inventory, line: &Ingredient) -> Option<&'a InventoryEntry> {
    inventory
        .ingredients
        .iter()
        .find(|entry| entry.ingredient_id == line.id)
        .or_else(|| {
            let name = line.name.trim().to_lowercase();
            inventory
                .ingredients
                .iter()
                .find(|entry| entry.ingredient_name.trim().to_lowercase() == name)
        })
}

/// Diff `recipe` requirements against `inventory` stock.
///
/// Lines without a quantity are skipped. Stock in an incompatible unit
/// counts as absent.
#[must_use]
pub fn missing_ingredients(recipe: &Recipe, inventory: &Inventory) -> GeneratedShoppingList {
    let mut list = GeneratedShoppingList::default();

    for line in &recipe.ingredients {
        let Some(required) = line.quantity.filter(|q| *q > 0.0) else {
            continue;
        };
        let unit = line.unit.clone().unwrap_or_default();
        let stock = find_stock(inventory, line);

        let available = stock
            .and_then(|entry| {
                let converted = convert(entry.available_quantity, &entry.unit, &unit);
                if converted.is_none() {
                    debug!(ingredient = %line.name, stock_unit = %entry.unit, unit = %unit, "incompatible stock unit");
                }
                converted
            })
            .unwrap_or(0.0);

        let missing = required - available;
        if missing <= f64::EPSILON {
            continue;
        }

        let unit_price = line
            .unit_price
            .or_else(|| stock.and_then(|entry| entry.unit_price))
            .unwrap_or(0.0);
        let cost = round_cents(unit_price * missing / 100.0);
        list.total_cost += cost;
        list.items.push(MissingIngredient {
            ingredient_id: line.id,
            name: line.name.clone(),
            missing_quantity: missing,
            unit,
            unit_price,
            cost,
        });
    }

    list.total_cost = round_cents(list.total_cost);
    list
}
