use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A recipe ingredient in structured form.
///
/// `available` is derived state: the reconciler recomputes it on every pass
/// against an inventory snapshot, so whatever a wire payload carries in this
/// field is never trusted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub available: bool,
}

// Matches: "3 pieces eggs", "1.5 cups flour", "200 grams cheddar cheese"
// Stored as Option so a compile failure degrades to the name-only branch
// instead of panicking (the pattern is static and should never fail).
static QUANTITY_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s+(\w+)\s+(.+)$").ok());

/// Parse a free-form ingredient description into a structured ingredient.
///
/// A leading `<number> <unit> <name...>` prefix is split into its parts,
/// with unit and name lower-cased; anything else becomes a name-only
/// ingredient with quantity 1 and unit "piece". The function is total:
/// malformed input degrades to the default branch, it never fails.
///
/// `available` always starts out `false`; the availability matcher is the
/// only place that sets it.
pub fn parse_ingredient(text: &str) -> RecipeIngredient {
    let structured = QUANTITY_PREFIX
        .as_ref()
        .and_then(|pattern| pattern.captures(text))
        .and_then(|caps| {
            let quantity: f64 = caps[1].parse().ok()?;
            Some(RecipeIngredient {
                name: caps[3].to_lowercase(),
                quantity,
                unit: caps[2].to_lowercase(),
                available: false,
            })
        });

    structured.unwrap_or_else(|| RecipeIngredient {
        name: text.to_lowercase(),
        quantity: 1.0,
        unit: "piece".to_string(),
        available: false,
    })
}
