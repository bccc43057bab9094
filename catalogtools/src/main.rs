use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;

mod commands;
mod endpoint_store;
mod formatting;

use commands::handle_command;

#[derive(Parser, Debug)]
#[command(
    version = "0.1.0",
    about = "Administration and browsing tools for the Floor Depot sheet-backed catalog"
)]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and print the catalog
    List(ListParams),
    /// Print a single product in full, including private fields
    Get {
        #[arg(required = true, index = 1)]
        id: String,
    },
    /// Create a new product. --name is required; everything else has a sensible default
    Add(ProductParams),
    /// Update an existing product. Only the fields you pass change; the rest keep their values
    Edit {
        #[arg(required = true, index = 1)]
        id: String,
        #[command(flatten)]
        params: ProductParams,
    },
    /// Delete the product with the given id
    Delete {
        #[arg(required = true, index = 1)]
        id: String,
    },
    /// Follow the catalog live, re-rendering whenever the sheet changes
    Watch,
    /// Print the WhatsApp contact link for a product
    Contact {
        #[arg(required = true, index = 1)]
        id: String,
    },
    /// Validate and persist the sheet endpoint URL
    Setup {
        #[arg(required = true, index = 1)]
        url: String,
    },
    /// Clear the persisted endpoint URL
    Reset,
}

#[derive(Debug, Args)]
pub struct ListParams {
    /// Only show this category
    #[arg(short = 'c', long = "category")]
    pub category: Option<String>,
    /// Only show featured products
    #[arg(short = 'f', long = "featured")]
    pub featured: bool,
    /// Case-insensitive search against product name and code
    #[arg(short = 's', long = "search")]
    pub search: Option<String>,
    /// Include the private columns (cost, provider)
    #[arg(short = 'a', long = "all")]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ProductParams {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// e.g. 60x60
    #[arg(long)]
    pub format: Option<String>,
    /// Square meters covered per box
    #[arg(long = "yield")]
    pub yield_m2: Option<f64>,
    /// Public price per square meter, in pesos
    #[arg(long)]
    pub price: Option<i64>,
    /// Acquisition cost, in pesos. Never shown in public views
    #[arg(long)]
    pub cost: Option<i64>,
    #[arg(long)]
    pub finish: Option<String>,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub provider: Option<String>,
    /// Comma-separated image URLs, in display order
    #[arg(long)]
    pub images: Option<String>,
    /// Include the product in the featured filter
    #[arg(long)]
    pub featured: Option<bool>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
