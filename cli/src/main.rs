use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use marmite::net::types::{
    IngredientDraft, InventoryDraft, PageRequest, RecipeScope, StockDraft, UserProfile,
};
use marmite::session::FileTokenStore;
use marmite::shopping::missing_ingredients;
use marmite::{Api, ClientConfig, ConfigError, HttpGateway, SessionError, SessionManager};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("not logged in; run `marmite login` first")]
    NotLoggedIn,
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "marmite", about = "Recipe manager API client")]
struct Cli {
    #[arg(long, env = "MARMITE_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "MARMITE_STATE_DIR", help = "Directory holding tokens.json")]
    state_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MARMITE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MARMITE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
    },
    Logout,
    Whoami,
    /// Mint a new access token from the stored refresh token.
    Refresh,
    Recipes(RecipesCommand),
    Ingredients(IngredientsCommand),
    Inventories(InventoriesCommand),
    Shopping(ShoppingCommand),
}

#[derive(Args, Debug, Clone, Copy)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 10)]
    per_page: u32,
}

impl From<PageArgs> for PageRequest {
    fn from(args: PageArgs) -> Self {
        PageRequest::new(args.page, args.per_page)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ScopeArg {
    All,
    Owned,
    Published,
    Saved,
}

impl From<ScopeArg> for RecipeScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => RecipeScope::All,
            ScopeArg::Owned => RecipeScope::Owned,
            ScopeArg::Published => RecipeScope::OwnedPublic,
            ScopeArg::Saved => RecipeScope::Saved,
        }
    }
}

#[derive(Args, Debug)]
struct RecipesCommand {
    #[command(subcommand)]
    command: RecipesSubcommand,
}

#[derive(Subcommand, Debug)]
enum RecipesSubcommand {
    /// Published recipes from every user; no login needed.
    Public {
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    #[command(flatten)]
    Own(OwnRecipesSubcommand),
}

/// Recipe commands that act on the logged-in user's data.
#[derive(Subcommand, Debug)]
enum OwnRecipesSubcommand {
    List {
        #[arg(long, value_enum, default_value = "all")]
        scope: ScopeArg,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    Saved {
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    Suggestions {
        #[arg(long, default_value_t = 4)]
        limit: u32,
    },
    Show {
        id: i64,
        #[arg(long, help = "Include the estimated ingredient cost")]
        cost: bool,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct IngredientsCommand {
    #[command(subcommand)]
    command: IngredientsSubcommand,
}

#[derive(Subcommand, Debug)]
enum IngredientsSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long, help = "Price per 100 units")]
        price: Option<f64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct InventoriesCommand {
    #[command(subcommand)]
    command: InventoriesSubcommand,
}

#[derive(Subcommand, Debug)]
enum InventoriesSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        public: bool,
    },
    /// Stock an ingredient in an inventory.
    Add {
        inventory_id: i64,
        #[arg(long)]
        ingredient_id: i64,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        unit: String,
        #[arg(long)]
        price: Option<f64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct ShoppingCommand {
    #[command(subcommand)]
    command: ShoppingSubcommand,
}

#[derive(Subcommand, Debug)]
enum ShoppingSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    Show {
        id: i64,
    },
    /// Server-side list of what an inventory lacks for a recipe.
    Generate {
        inventory_id: i64,
        #[arg(long)]
        recipe: Option<i64>,
    },
    /// Same comparison computed locally from the fetched recipe and inventory.
    Diff {
        inventory_id: i64,
        recipe_id: i64,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_lookup(|key| match key {
        "MARMITE_API_URL" => cli.api_url.clone(),
        "MARMITE_STATE_DIR" => cli.state_dir.clone(),
        _ => std::env::var(key).ok(),
    })?;
    let api = connect(&config)?;

    match cli.command {
        Command::Login { email, password } => {
            api.session().login(&email, &password).await?;
            print_json(&current_user(&api).await?)
        }
        Command::Register { email, password, name } => {
            api.session().register(&email, &password, &name).await?;
            print_json(&current_user(&api).await?)
        }
        Command::Logout => {
            // Logout clears local state even when the token file is unreadable.
            if let Err(e) = api.session().hydrate().await {
                warn!(error = %e, "could not restore session before logout");
            }
            api.session().logout().await;
            print_json(&json!({ "logged_out": true }))
        }
        Command::Whoami => {
            require_session(&api).await?;
            print_json(&current_user(&api).await?)
        }
        Command::Refresh => {
            require_session(&api).await?;
            api.session().refresh().await?;
            print_json(&json!({ "refreshed": true }))
        }
        Command::Recipes(recipes) => run_recipes(&api, recipes).await,
        Command::Ingredients(ingredients) => run_ingredients(&api, ingredients).await,
        Command::Inventories(inventories) => run_inventories(&api, inventories).await,
        Command::Shopping(shopping) => run_shopping(&api, shopping).await,
    }
}

fn connect(config: &ClientConfig) -> Result<Api, CliError> {
    let http = HttpGateway::new(config)?;
    let store = Arc::new(FileTokenStore::new(config.token_path()));
    let session = SessionManager::new(Arc::new(http.clone()), store);
    Ok(Api::new(session, http))
}

/// Restore the persisted session or fail with [`CliError::NotLoggedIn`].
async fn require_session(api: &Api) -> Result<(), CliError> {
    if api.session().hydrate().await? { Ok(()) } else { Err(CliError::NotLoggedIn) }
}

/// The cached profile, fetched again if the last attempt failed.
async fn current_user(api: &Api) -> Result<UserProfile, CliError> {
    match api.session().user() {
        Some(user) => Ok(user),
        None => Ok(api.session().fetch_profile().await?),
    }
}

async fn run_recipes(api: &Api, recipes: RecipesCommand) -> Result<(), CliError> {
    match recipes.command {
        RecipesSubcommand::Public { title, page } => {
            print_json(&api.public_recipes(page.into(), title.as_deref()).await?)
        }
        RecipesSubcommand::Own(command) => {
            require_session(api).await?;
            run_own_recipes(api, command).await
        }
    }
}

async fn run_own_recipes(api: &Api, command: OwnRecipesSubcommand) -> Result<(), CliError> {
    match command {
        OwnRecipesSubcommand::List { scope, title, page } => {
            print_json(&api.list_recipes(scope.into(), page.into(), title.as_deref()).await?)
        }
        OwnRecipesSubcommand::Saved { title, page } => {
            print_json(&api.list_recipes(RecipeScope::Saved, page.into(), title.as_deref()).await?)
        }
        OwnRecipesSubcommand::Suggestions { limit } => print_json(&api.suggestions(limit).await?),
        OwnRecipesSubcommand::Show { id, cost } => {
            let recipe = api.recipe(id).await?;
            if cost {
                let estimate = recipe.estimated_cost();
                let minutes = recipe.total_minutes();
                print_json(&json!({ "recette": recipe, "cout_estime": estimate, "temps_total": minutes }))
            } else {
                print_json(&recipe)
            }
        }
        OwnRecipesSubcommand::Delete { id } => {
            api.delete_recipe(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_ingredients(api: &Api, ingredients: IngredientsCommand) -> Result<(), CliError> {
    require_session(api).await?;
    match ingredients.command {
        IngredientsSubcommand::List { search, page } => {
            print_json(&api.list_ingredients(page.into(), search.as_deref()).await?)
        }
        IngredientsSubcommand::Show { id } => print_json(&api.ingredient(id).await?),
        IngredientsSubcommand::Create { name, unit, price } => {
            let draft = IngredientDraft { name, unit, unit_price: price };
            print_json(&api.create_ingredient(&draft).await?)
        }
        IngredientsSubcommand::Delete { id } => {
            api.delete_ingredient(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_inventories(api: &Api, inventories: InventoriesCommand) -> Result<(), CliError> {
    require_session(api).await?;
    match inventories.command {
        InventoriesSubcommand::List { page } => print_json(&api.list_inventories(page.into()).await?),
        InventoriesSubcommand::Show { id } => print_json(&api.inventory(id).await?),
        InventoriesSubcommand::Create { name, public } => {
            let draft = InventoryDraft { name, public: Some(public) };
            print_json(&api.create_inventory(&draft).await?)
        }
        InventoriesSubcommand::Add { inventory_id, ingredient_id, quantity, unit, price } => {
            let draft = StockDraft {
                ingredient_id: Some(ingredient_id),
                available_quantity: quantity,
                unit,
                unit_price: price,
            };
            api.add_stock(inventory_id, &draft).await?;
            print_json(&api.inventory(inventory_id).await?)
        }
        InventoriesSubcommand::Delete { id } => {
            api.delete_inventory(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_shopping(api: &Api, shopping: ShoppingCommand) -> Result<(), CliError> {
    require_session(api).await?;
    match shopping.command {
        ShoppingSubcommand::List { search, page } => {
            print_json(&api.list_shopping_lists(page.into(), search.as_deref()).await?)
        }
        ShoppingSubcommand::Show { id } => print_json(&api.shopping_list(id).await?),
        ShoppingSubcommand::Generate { inventory_id, recipe } => {
            print_json(&api.generate_shopping_list(inventory_id, recipe).await?)
        }
        ShoppingSubcommand::Diff { inventory_id, recipe_id } => {
            let recipe = api.recipe(recipe_id).await?;
            let inventory = api.inventory(inventory_id).await?;
            print_json(&missing_ingredients(&recipe, &inventory))
        }
        ShoppingSubcommand::Delete { id } => {
            api.delete_shopping_list(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
