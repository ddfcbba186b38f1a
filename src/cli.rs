use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show everything currently in the fridge
    List,
    /// Add a product to the fridge
    Add {
        /// Product name
        #[arg(short, long)]
        name: String,
        /// Amount on hand
        #[arg(short, long)]
        quantity: f64,
        /// Unit the amount is measured in
        #[arg(short, long)]
        unit: String,
        /// Expiration date (YYYY-MM-DD)
        #[arg(short, long)]
        expires: NaiveDate,
    },
    /// Remove a product by its id
    Remove {
        /// Id of the product to remove
        #[arg(short, long)]
        id: String,
    },
    /// Ask the model for recipe suggestions based on the fridge contents
    Suggest,
    /// Re-run suggestion and report whether it succeeded
    Refresh,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
