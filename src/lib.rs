pub mod api_connection;
pub mod cli;
pub mod inventory_store;
pub mod ingredient_parser;
pub mod availability_matcher;
pub mod recipe_reconciler;
pub mod recipe_suggester;
