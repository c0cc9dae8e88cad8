use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Base URL of the recipe API (default: TheMealDB v1).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding persisted state (selected recipes).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Recipes per page.
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Search(SearchArgs),
    Browse(BrowseArgs),
    Show(ShowArgs),
    Categories,
    Select {
        #[command(subcommand)]
        command: SelectCommand,
    },
    ShoppingList(ShoppingListArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Name to search for. Blank shows the initial recipes.
    #[arg(long, default_value = "")]
    pub term: String,

    /// Only show recipes in this category (exact match).
    #[arg(long)]
    pub category: Option<String>,

    /// Page to show (1-indexed).
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Print the page as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Only show recipes in this category (exact match).
    #[arg(long)]
    pub category: Option<String>,

    /// Page to show (1-indexed).
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Stop progressive loading after this many letters.
    #[arg(long, default_value_t = 26)]
    pub max_letters: usize,

    /// Load all letters in concurrent batches instead of one at a time.
    #[arg(long, conflicts_with = "max_letters")]
    pub batched: bool,

    /// Letters fetched concurrently per batch (with --batched).
    #[arg(long, default_value_t = 5, requires = "batched")]
    pub batch_size: usize,

    /// Print the page as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Recipe id.
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Subcommand)]
pub enum SelectCommand {
    /// Select the recipe, or unselect it if already selected.
    Toggle(SelectToggleArgs),
    /// Unselect everything.
    Clear,
    /// List selected recipes.
    List,
}

#[derive(Debug, Args)]
pub struct SelectToggleArgs {
    /// Recipe id.
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ShoppingListArgs {
    /// Mark an ingredient as already bought (repeatable).
    #[arg(long = "check")]
    pub checked: Vec<String>,

    /// Print the list as JSON.
    #[arg(long)]
    pub json: bool,
}
