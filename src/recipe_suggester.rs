use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api_connection::connection::ApiConnectionError;
use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, ResponseFormat};
use crate::api_connection::CompletionBackend;
use crate::inventory_store::Product;
use crate::recipe_reconciler::{reconcile, CandidateRecipe, IngredientSpec, Recipe};

const SYSTEM_INSTRUCTION: &str = "You are a cooking assistant that suggests recipes from the \
contents of a fridge. Respond with a single JSON object and nothing else: no explanations, \
no markdown fences.";

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("completion API credential missing: {0}")]
    Configuration(String),
    #[error("completion API call failed: {0}")]
    Upstream(#[source] ApiConnectionError),
    #[error("malformed recipe response: {0}")]
    MalformedResponse(String),
}

impl From<ApiConnectionError> for SuggestionError {
    fn from(err: ApiConnectionError) -> Self {
        match err {
            ApiConnectionError::MissingApiKey(key_name) => {
                SuggestionError::Configuration(format!("{} is not set", key_name))
            }
            other => SuggestionError::Upstream(other),
        }
    }
}

/// Result of a `refresh` call: a status flag plus a human-readable
/// message, never an error.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub success: bool,
    pub message: String,
}

/// Wire shape of the model's reply. Anything that does not deserialize
/// into this is a malformed response.
#[derive(Debug, Deserialize)]
struct RecipesPayload {
    recipes: Vec<GeneratedRecipe>,
}

#[derive(Debug, Deserialize)]
struct GeneratedRecipe {
    name: String,
    ingredients: Vec<IngredientSpec>,
    instructions: Vec<String>,
}

/// Turns an inventory snapshot into reconciled recipe suggestions by
/// prompting a chat completion backend.
///
/// Failures propagate as [`SuggestionError`]; callers that prefer a
/// degraded result over an error render [`fallback_recipes`] instead.
/// `suggest` and `refresh` apply the same policy, neither falls back
/// silently.
pub struct RecipeSuggester {
    backend: Box<dyn CompletionBackend>,
    last_request_at: Option<Instant>,
}

impl RecipeSuggester {
    pub fn new(backend: Box<dyn CompletionBackend>) -> Self {
        RecipeSuggester {
            backend,
            last_request_at: None,
        }
    }

    /// When the backend was last called, if ever. Bookkeeping only;
    /// nothing throttles on it.
    pub fn last_request_at(&self) -> Option<Instant> {
        self.last_request_at
    }

    /// Ask the backend for recipe suggestions and reconcile each against
    /// the given inventory snapshot.
    ///
    /// The snapshot is read-only for the duration of the call; concurrent
    /// calls each work from their own snapshot.
    pub async fn suggest(&mut self, inventory: &[Product]) -> Result<Vec<Recipe>, SuggestionError> {
        let request = ChatCompletionRequest {
            model: self.backend.model_name().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(inventory),
                },
            ],
            response_format: Some(ResponseFormat::json_object()),
            temperature: None,
            max_tokens: None,
        };

        self.last_request_at = Some(Instant::now());
        let response = self.backend.complete(request).await?;

        let choice = response.choices.first().ok_or_else(|| {
            SuggestionError::MalformedResponse("no response choices received".to_string())
        })?;

        let content = strip_code_fences(&choice.message.content);
        if content.is_empty() {
            return Err(SuggestionError::MalformedResponse(
                "response content is empty".to_string(),
            ));
        }

        let payload: RecipesPayload = serde_json::from_str(content).map_err(|err| {
            warn!(error = %err, "recipe payload did not match the expected shape");
            SuggestionError::MalformedResponse(err.to_string())
        })?;
        debug!(count = payload.recipes.len(), "parsed generated recipes");

        let timestamp = Utc::now().timestamp_millis();
        let recipes = payload
            .recipes
            .into_iter()
            .enumerate()
            .map(|(index, generated)| {
                let candidate = CandidateRecipe {
                    id: format!("generated-{}-{}", index + 1, timestamp),
                    name: generated.name,
                    ingredients: generated.ingredients,
                    instructions: generated.instructions,
                };
                reconcile(candidate, inventory)
            })
            .collect();

        Ok(recipes)
    }

    /// Re-run `suggest` and report the outcome as a status instead of an
    /// error. Carries no state of its own.
    pub async fn refresh(&mut self, inventory: &[Product]) -> RefreshOutcome {
        match self.suggest(inventory).await {
            Ok(_) => RefreshOutcome {
                success: true,
                message: "Recipes refreshed successfully".to_string(),
            },
            Err(err) => {
                warn!(error = %err, "recipe refresh failed");
                RefreshOutcome {
                    success: false,
                    message: format!("Failed to refresh recipes: {}", err),
                }
            }
        }
    }
}

/// Build the user prompt: one line per product, then the response
/// contract the parser on our side expects.
pub fn build_prompt(inventory: &[Product]) -> String {
    let mut prompt = String::from("I have the following ingredients in my fridge:\n");
    for product in inventory {
        prompt.push_str(&format!(
            "- {} {} of {}\n",
            product.quantity, product.unit, product.name
        ));
    }
    prompt.push_str(
        "\nSuggest exactly 3 recipes I can make using only the listed ingredients.\n\
         Return a single JSON object with a \"recipes\" array. Each recipe must have:\n\
         - \"name\": the recipe name as a string.\n\
         - \"ingredients\": an array of objects, each with \"name\" (string), \"quantity\" (number) and \"unit\" (string).\n\
         - \"instructions\": an array of strings, one cooking step per entry.\n\
         Do not include any text outside the JSON object.",
    );
    prompt
}

/// The fixed fallback set, reconciled against the given snapshot. Served
/// by the presentation layer when `suggest` fails.
pub fn fallback_recipes(inventory: &[Product]) -> Vec<Recipe> {
    fallback_candidates()
        .into_iter()
        .map(|candidate| reconcile(candidate, inventory))
        .collect()
}

fn fallback_candidates() -> Vec<CandidateRecipe> {
    vec![
        CandidateRecipe {
            id: "mock-1".to_string(),
            name: "Scrambled Eggs".to_string(),
            ingredients: vec![
                IngredientSpec::Raw("Eggs".to_string()),
                IngredientSpec::Raw("Milk".to_string()),
                IngredientSpec::Raw("Salt".to_string()),
                IngredientSpec::Raw("Pepper".to_string()),
            ],
            instructions: vec![
                "Whisk the eggs with a splash of milk, salt, and pepper.".to_string(),
                "Melt a knob of butter in a nonstick pan over medium-low heat.".to_string(),
                "Pour in the eggs and stir gently until softly set.".to_string(),
            ],
        },
        CandidateRecipe {
            id: "mock-2".to_string(),
            name: "Grilled Cheese Sandwich".to_string(),
            ingredients: vec![
                IngredientSpec::Raw("Bread".to_string()),
                IngredientSpec::Raw("Cheese".to_string()),
                IngredientSpec::Raw("Butter".to_string()),
            ],
            instructions: vec![
                "Butter one side of each bread slice.".to_string(),
                "Lay cheese between the slices, buttered sides facing out.".to_string(),
                "Toast in a pan over medium heat until golden on both sides.".to_string(),
            ],
        },
        CandidateRecipe {
            id: "mock-3".to_string(),
            name: "Cheese Omelette".to_string(),
            ingredients: vec![
                IngredientSpec::Raw("2 pieces eggs".to_string()),
                IngredientSpec::Raw("50 grams cheese".to_string()),
                IngredientSpec::Raw("Salt".to_string()),
            ],
            instructions: vec![
                "Beat the eggs with a pinch of salt.".to_string(),
                "Cook in a hot buttered pan until almost set.".to_string(),
                "Scatter the cheese on top, fold, and serve.".to_string(),
            ],
        },
    ]
}

/// Strip a leading/trailing markdown code fence if the model added one
/// despite instructions.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_prefix
        .strip_suffix("```")
        .unwrap_or(without_prefix)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::FakeBackend;
    use chrono::NaiveDate;

    fn sample_inventory() -> Vec<Product> {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        vec![
            Product {
                id: "1".to_string(),
                name: "Eggs".to_string(),
                quantity: 12.0,
                unit: "pieces".to_string(),
                expiration_date: today,
                date_added: today,
            },
            Product {
                id: "2".to_string(),
                name: "Milk".to_string(),
                quantity: 1.0,
                unit: "gallon".to_string(),
                expiration_date: today,
                date_added: today,
            },
            Product {
                id: "3".to_string(),
                name: "Cheese".to_string(),
                quantity: 200.0,
                unit: "grams".to_string(),
                expiration_date: today,
                date_added: today,
            },
        ]
    }

    fn valid_payload() -> String {
        r#"{
            "recipes": [
                {
                    "name": "Cheese Omelette",
                    "ingredients": [
                        {"name": "eggs", "quantity": 2, "unit": "pieces"},
                        {"name": "cheese", "quantity": 50, "unit": "grams"},
                        "a pinch of salt"
                    ],
                    "instructions": ["Beat the eggs.", "Cook and fold."]
                },
                {
                    "name": "French Toast",
                    "ingredients": [
                        {"name": "eggs", "quantity": 3, "unit": "pieces"},
                        {"name": "bread", "quantity": 4, "unit": "slices"}
                    ],
                    "instructions": ["Soak the bread.", "Fry until golden."]
                },
                {
                    "name": "Milk Pudding",
                    "ingredients": [
                        {"name": "milk", "quantity": 1, "unit": "gallon"}
                    ],
                    "instructions": ["Simmer.", "Chill."]
                }
            ]
        }"#
        .to_string()
    }

    #[tokio::test]
    async fn test_suggest_reconciles_generated_recipes() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::with_content(&valid_payload())));
        let inventory = sample_inventory();

        let recipes = suggester.suggest(&inventory).await.unwrap();
        assert_eq!(recipes.len(), 3);

        let omelette = &recipes[0];
        assert_eq!(omelette.name, "Cheese Omelette");
        assert!(omelette.ingredients[0].available);
        assert!(omelette.ingredients[1].available);
        // The raw line parsed to "a pinch of salt", which the fridge lacks.
        assert!(!omelette.ingredients[2].available);
        assert_eq!(omelette.missing_ingredients, vec!["a pinch of salt"]);

        let toast = &recipes[1];
        assert_eq!(toast.missing_ingredients, vec!["bread"]);
    }

    #[tokio::test]
    async fn test_suggest_ids_are_indexed_and_timestamped() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::with_content(&valid_payload())));
        let recipes = suggester.suggest(&sample_inventory()).await.unwrap();

        assert!(recipes[0].id.starts_with("generated-1-"));
        assert!(recipes[1].id.starts_with("generated-2-"));
        assert!(recipes[2].id.starts_with("generated-3-"));
        // Same batch, same timestamp suffix.
        let suffix = |id: &str| id.rsplit('-').next().unwrap().to_string();
        assert_eq!(suffix(&recipes[0].id), suffix(&recipes[2].id));
    }

    #[tokio::test]
    async fn test_suggest_strips_markdown_fences() {
        let fenced = format!("```json\n{}\n```", valid_payload());
        let mut suggester = RecipeSuggester::new(Box::new(FakeBackend::with_content(&fenced)));
        let recipes = suggester.suggest(&sample_inventory()).await.unwrap();
        assert_eq!(recipes.len(), 3);
    }

    #[tokio::test]
    async fn test_suggest_empty_recipes_array_is_ok() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::with_content(r#"{"recipes": []}"#)));
        let recipes = suggester.suggest(&sample_inventory()).await.unwrap();
        assert!(recipes.is_empty());
    }

    #[tokio::test]
    async fn test_suggest_rejects_payload_without_recipes_key() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::with_content(r#"{"meals": []}"#)));
        let err = suggester.suggest(&sample_inventory()).await.unwrap_err();
        assert!(matches!(err, SuggestionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_suggest_rejects_non_json_content() {
        let mut suggester = RecipeSuggester::new(Box::new(FakeBackend::with_content(
            "Sure! Here are three ideas:",
        )));
        let err = suggester.suggest(&sample_inventory()).await.unwrap_err();
        assert!(matches!(err, SuggestionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_suggest_rejects_response_without_choices() {
        let mut suggester = RecipeSuggester::new(Box::new(FakeBackend::no_choices()));
        let err = suggester.suggest(&sample_inventory()).await.unwrap_err();
        assert!(matches!(
            err,
            SuggestionError::MalformedResponse(message) if message.contains("no response choices")
        ));
    }

    #[tokio::test]
    async fn test_suggest_rejects_empty_content() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::with_content("```json\n```")));
        let err = suggester.suggest(&sample_inventory()).await.unwrap_err();
        assert!(matches!(
            err,
            SuggestionError::MalformedResponse(message) if message.contains("empty")
        ));
    }

    #[tokio::test]
    async fn test_suggest_maps_api_failure_to_upstream() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::failing(503, "upstream down")));
        let err = suggester.suggest(&sample_inventory()).await.unwrap_err();
        assert!(matches!(err, SuggestionError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_suggest_maps_missing_key_to_configuration() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::missing_key("OPENAI_API_KEY")));
        let err = suggester.suggest(&sample_inventory()).await.unwrap_err();
        assert!(matches!(
            err,
            SuggestionError::Configuration(message) if message.contains("OPENAI_API_KEY")
        ));
    }

    #[tokio::test]
    async fn test_suggest_records_request_time() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::with_content(&valid_payload())));
        assert!(suggester.last_request_at().is_none());
        suggester.suggest(&sample_inventory()).await.unwrap();
        assert!(suggester.last_request_at().is_some());
    }

    #[tokio::test]
    async fn test_refresh_reports_success() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::with_content(&valid_payload())));
        let outcome = suggester.refresh(&sample_inventory()).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "Recipes refreshed successfully");
    }

    #[tokio::test]
    async fn test_refresh_reports_failure_without_panicking() {
        let mut suggester =
            RecipeSuggester::new(Box::new(FakeBackend::failing(500, "boom")));
        let outcome = suggester.refresh(&sample_inventory()).await;
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Failed to refresh recipes"));
        assert!(!outcome.message.is_empty());
    }

    #[test]
    fn test_build_prompt_lists_products_and_contract() {
        let prompt = build_prompt(&sample_inventory());
        assert!(prompt.contains("- 12 pieces of Eggs"));
        assert!(prompt.contains("- 1 gallon of Milk"));
        assert!(prompt.contains("- 200 grams of Cheese"));
        assert!(prompt.contains("exactly 3 recipes"));
        assert!(prompt.contains("\"recipes\""));
    }

    #[test]
    fn test_fallback_recipes_reconcile_against_inventory() {
        let recipes = fallback_recipes(&sample_inventory());
        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[0].id, "mock-1");
        assert_eq!(recipes[1].id, "mock-2");
        assert_eq!(recipes[2].id, "mock-3");

        // The omelette's quantified lines match the stocked units.
        let omelette = &recipes[2];
        assert_eq!(omelette.name, "Cheese Omelette");
        assert!(omelette.ingredients[0].available);
        assert!(omelette.ingredients[1].available);
        assert_eq!(omelette.missing_ingredients, vec!["salt"]);
    }

    #[test]
    fn test_fallback_recipes_on_empty_inventory() {
        let recipes = fallback_recipes(&[]);
        assert_eq!(recipes.len(), 3);
        // Nothing is stocked, so every ingredient is missing.
        assert_eq!(recipes[0].missing_ingredients.len(), 4);
        assert_eq!(recipes[1].missing_ingredients.len(), 3);
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n```"), "");
    }
}
