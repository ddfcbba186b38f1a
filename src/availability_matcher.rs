use crate::ingredient_parser::RecipeIngredient;
use crate::inventory_store::Product;

/// Check whether the inventory covers a single recipe ingredient.
///
/// A product counts as a match when its name and unit equal the
/// ingredient's (case-insensitive) and its quantity is at least the
/// required amount. Matching is deliberately strict: "12 pieces eggs"
/// is not covered by a product stocked in dozens, and no unit
/// conversion or fuzzy name matching is attempted.
pub fn is_available(ingredient: &RecipeIngredient, inventory: &[Product]) -> bool {
    inventory.iter().any(|product| {
        product.name.to_lowercase() == ingredient.name.to_lowercase()
            && product.unit.to_lowercase() == ingredient.unit.to_lowercase()
            && product.quantity >= ingredient.quantity
    })
}
