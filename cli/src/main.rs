mod display;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fridge_core::{
    App, FilterStatus, FridgeConfig, SelectOutcome, ShoppingListOp, Submission,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fridge")]
#[command(about = "Find recipes for what is in your fridge", long_about = None)]
struct Cli {
    /// Recipe database base URL
    #[arg(long, global = true, env = "FRIDGE_MEALDB_URL")]
    mealdb_url: Option<String>,

    /// Inference gateway base URL
    #[arg(long, global = true, env = "FRIDGE_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Directory for saved shopping lists
    #[arg(long, global = true, env = "FRIDGE_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search by dish name or comma-separated ingredients, in any language
    Search {
        query: String,
        /// Only show meat-free recipes
        #[arg(long)]
        vegan: bool,
    },
    /// Show one recipe with its shopping list
    Show {
        id: String,
        /// Add the AI-localized version
        #[arg(long)]
        enrich: bool,
    },
    /// Edit a recipe's shopping list
    List {
        id: String,
        #[command(subcommand)]
        action: ListAction,
    },
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum ListAction {
    /// Print the visible items
    Show,
    /// Mark an item bought, or not bought
    Toggle { index: u8 },
    /// Hide an item
    Archive { index: u8 },
    /// Unhide every item
    RestoreAll,
    /// Start over from the recipe's ingredients
    Reset,
    /// Print the list as plain text for pasting elsewhere
    Copy,
}

impl ListAction {
    fn op(self) -> Option<ShoppingListOp> {
        match self {
            ListAction::Toggle { index } => Some(ShoppingListOp::Toggle(index)),
            ListAction::Archive { index } => Some(ShoppingListOp::Archive(index)),
            ListAction::RestoreAll => Some(ShoppingListOp::RestoreAll),
            ListAction::Reset => Some(ShoppingListOp::Reset),
            ListAction::Show | ListAction::Copy => None,
        }
    }
}

impl Cli {
    fn config(&self) -> Result<FridgeConfig> {
        let mut config = FridgeConfig::from_env().context("Invalid configuration")?;
        if let Some(url) = &self.mealdb_url {
            config.mealdb_url = url.clone();
        }
        if let Some(url) = &self.gateway_url {
            config.gateway_url = url.clone();
        }
        if let Some(dir) = &self.storage_dir {
            config.storage_dir = dir.clone();
        }
        Ok(config)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let app = App::new(&cli.config()?)?;

    match cli.command {
        Commands::Search { query, vegan } => search(&app, &query, vegan).await?,
        Commands::Show { id, enrich } => show(&app, &id, enrich).await?,
        Commands::List { id, action } => list(&app, &id, action).await?,
    }

    Ok(())
}

async fn search(app: &App, query: &str, vegan: bool) -> Result<()> {
    app.vegan_mode().set(vegan);
    let report = app.smart_search(query).await;

    if let Some(notice) = report.notice() {
        println!("{notice}");
    }
    let state = match report.submission {
        Submission::Published(state) => state,
        Submission::Rejected(err) => bail!(err.user_message()),
        Submission::Superseded => return Ok(()),
    };
    if let Some(err) = &state.error {
        bail!(err.user_message());
    }
    if let Some(warning) = &state.warning {
        println!("{warning}");
    }

    if vegan {
        let filter = app.wait_for_filter().await;
        match filter.status {
            FilterStatus::Unavailable => {
                println!("Vegan check is unavailable right now; no recipes shown.");
            }
            FilterStatus::Degraded => {
                println!("Vegan check is unavailable; showing a keyword-based guess.");
            }
            _ => {}
        }
    }

    print!("{}", display::results(&app.displayed(), state.results.len(), vegan));
    Ok(())
}

async fn open(app: &App, id: &str) -> Result<()> {
    match app.select(id).await {
        SelectOutcome::Loaded(_) => Ok(()),
        SelectOutcome::Failed(err) => Err(err).context("Could not load recipe"),
        SelectOutcome::Superseded => bail!("Recipe {id} was closed while loading"),
    }
}

async fn show(app: &App, id: &str, enrich: bool) -> Result<()> {
    open(app, id).await?;
    let state = app.detail_state();
    let Some(recipe) = &state.recipe else {
        bail!("Recipe {id} not found");
    };
    print!("{}", display::recipe(recipe));
    if let Some(list) = &state.shopping_list {
        print!("{}", display::shopping_list(list));
    }

    if enrich {
        match app.enrich_selected().await {
            Ok(enriched) => print!("{}", display::enriched(&enriched)),
            Err(err) => println!("\nAI version unavailable: {}", err.user_message()),
        }
    }
    Ok(())
}

async fn list(app: &App, id: &str, action: ListAction) -> Result<()> {
    open(app, id).await?;

    if action == ListAction::Copy {
        if let Some(text) = app.clipboard_text() {
            println!("{text}");
        }
        return Ok(());
    }

    let list = match action.op() {
        Some(op) => app
            .mutate_shopping_list(op)
            .context("Failed to save shopping list")?,
        None => app.detail_state().shopping_list,
    };
    match list {
        Some(list) => print!("{}", display::shopping_list(&list)),
        None => println!("Recipe {id} has no ingredients to shop for."),
    }
    Ok(())
}
