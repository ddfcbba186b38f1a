use crate::availability_matcher::is_available;
use crate::ingredient_parser::{parse_ingredient, RecipeIngredient};
use crate::inventory_store::Product;
use serde::{Deserialize, Serialize};

/// One ingredient entry as it arrives from upstream: either already
/// structured, or a free-form line that still needs parsing.
///
/// Untagged, so a JSON object binds to `Structured` and a bare string
/// to `Raw`; an object missing required fields fails both and surfaces
/// as a deserialization error.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum IngredientSpec {
    Structured(RecipeIngredient),
    Raw(String),
}

/// A recipe before reconciliation: ingredients may still be raw text and
/// carry no availability verdict.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CandidateRecipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<IngredientSpec>,
    pub instructions: Vec<String>,
}

/// A fully reconciled recipe: every ingredient structured, availability
/// settled against an inventory snapshot, and the shopping list derived.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub missing_ingredients: Vec<String>,
}

/// Settle a candidate recipe against the given inventory snapshot.
///
/// Raw ingredient lines are parsed first. Every ingredient's `available`
/// flag is then recomputed from the snapshot, regardless of what the
/// candidate claimed, and `missing_ingredients` lists the names of the
/// unavailable ones in recipe order.
pub fn reconcile(candidate: CandidateRecipe, inventory: &[Product]) -> Recipe {
    let ingredients: Vec<RecipeIngredient> = candidate
        .ingredients
        .into_iter()
        .map(|spec| {
            let mut ingredient = match spec {
                IngredientSpec::Structured(ingredient) => ingredient,
                IngredientSpec::Raw(text) => parse_ingredient(&text),
            };
            ingredient.available = is_available(&ingredient, inventory);
            ingredient
        })
        .collect();

    let missing_ingredients = ingredients
        .iter()
        .filter(|ingredient| !ingredient.available)
        .map(|ingredient| ingredient.name.clone())
        .collect();

    Recipe {
        id: candidate.id,
        name: candidate.name,
        ingredients,
        instructions: candidate.instructions,
        missing_ingredients,
    }
}

impl From<Recipe> for CandidateRecipe {
    /// Turn a reconciled recipe back into a candidate, e.g. to settle it
    /// again after the inventory changed. The derived fields are dropped
    /// and recomputed on the next pass.
    fn from(recipe: Recipe) -> Self {
        CandidateRecipe {
            id: recipe.id,
            name: recipe.name,
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(IngredientSpec::Structured)
                .collect(),
            instructions: recipe.instructions,
        }
    }
}
