use anyhow::Result;
use chrono::{Local, NaiveDate};
use smart_fridge::api_connection::Provider;
use smart_fridge::cli::{parse_args, Command};
use smart_fridge::inventory_store::{InventoryStore, MemoryInventoryStore, NewProduct, Product};
use smart_fridge::recipe_reconciler::Recipe;
use smart_fridge::recipe_suggester::{fallback_recipes, RecipeSuggester};

// Environment variable holding the OpenAI API key.
const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env before anything reads the environment

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let cli_args = parse_args();
    let today = Local::now().date_naive();

    // The store lives for one invocation only; every run starts from the
    // same seeded inventory.
    let mut store = MemoryInventoryStore::with_sample_products(today);

    match cli_args.command {
        Command::List => {
            print_inventory(&store.list(), today);
        }
        Command::Add {
            name,
            quantity,
            unit,
            expires,
        } => {
            let product = store.add(NewProduct {
                name,
                quantity,
                unit,
                expiration_date: expires,
            })?;
            println!(
                "Added {} {} of {} with id {}",
                product.quantity, product.unit, product.name, product.id
            );
            print_inventory(&store.list(), today);
        }
        Command::Remove { id } => {
            let product = store.remove(&id)?;
            println!("Removed {} (id {})", product.name, product.id);
            print_inventory(&store.list(), today);
        }
        Command::Suggest => {
            let inventory = store.list();
            let mut suggester = RecipeSuggester::new(Box::new(Provider::openai(API_KEY_ENV_VAR)));
            match suggester.suggest(&inventory).await {
                Ok(recipes) => print_recipes(&recipes),
                Err(e) => {
                    eprintln!("Recipe suggestion failed: {}", e);
                    println!("Falling back to the built-in recipe set.\n");
                    print_recipes(&fallback_recipes(&inventory));
                }
            }
        }
        Command::Refresh => {
            let inventory = store.list();
            let mut suggester = RecipeSuggester::new(Box::new(Provider::openai(API_KEY_ENV_VAR)));
            let outcome = suggester.refresh(&inventory).await;
            println!("{}", outcome.message);
            if !outcome.success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_inventory(products: &[Product], today: NaiveDate) {
    if products.is_empty() {
        println!("The fridge is empty.");
        return;
    }
    println!("Fridge contents:");
    for product in products {
        println!(
            "  [{}] {} {} of {} (expires {}, {})",
            product.id,
            product.quantity,
            product.unit,
            product.name,
            product.expiration_date,
            product.expiration_status(today)
        );
    }
}

fn print_recipes(recipes: &[Recipe]) {
    if recipes.is_empty() {
        println!("No recipes suggested.");
        return;
    }
    for recipe in recipes {
        println!("{} ({})", recipe.name, recipe.id);
        println!("  Ingredients:");
        for ingredient in &recipe.ingredients {
            let mark = if ingredient.available { "+" } else { "-" };
            println!(
                "    {} {} {} {}",
                mark, ingredient.quantity, ingredient.unit, ingredient.name
            );
        }
        if !recipe.missing_ingredients.is_empty() {
            println!("  Missing: {}", recipe.missing_ingredients.join(", "));
        }
        println!("  Instructions:");
        for (step, instruction) in recipe.instructions.iter().enumerate() {
            println!("    {}. {}", step + 1, instruction);
        }
        println!();
    }
}
