use anyhow::{bail, Context, Result};
use catalog_core::config::{CatalogConfig, DEFAULT_CONFIG_FILE};
use catalog_core::core::types::{Drink, FavoriteEntry, Nutrition};
use catalog_core::loader::load_dataset;
use catalog_core::persistence::{FileStore, KeyValueStore, MemoryStore};
use catalog_core::{logging, ui, Catalog, Intent, Outcome};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

/// Search-first browser for drink nutrition facts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file
    #[arg(short = 'C', long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Nutrition dataset (JSON), overrides the config file
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Directory for favorites, usage stats and flags
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Keep all state in memory for this run only
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Interactive terminal browser (default)
    Browse,
    /// Print drinks whose name contains TEXT
    Search {
        text: String,
        /// Only this size
        #[arg(long)]
        size: Option<String>,
        /// Only this milk type
        #[arg(long)]
        milk: Option<String>,
    },
    /// List size facet values in display order
    Sizes,
    /// List milk facet values in display order
    Milks,
    /// Show or clear starred variants
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Dataset metadata
    Info,
}

#[derive(Subcommand, Debug, Clone)]
enum FavoritesAction {
    List,
    /// Remove every favorite; irreversible
    Clear {
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let command = cli.command.clone().unwrap_or(Commands::Browse);

    if matches!(command, Commands::Browse) {
        logging::init_file(&config.log_path(), &config.log_filter)
            .with_context(|| format!("cannot open log file {}", config.log_path().display()))?;
    } else {
        logging::init_stderr(&config.log_filter);
    }

    let dataset = load_dataset(&config.dataset).context("the catalog cannot start without its dataset")?;
    let store: Box<dyn KeyValueStore> = if cli.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::new(&config.state_dir))
    };
    let mut catalog = Catalog::new(dataset, store);

    match command {
        Commands::Browse => ui::run(catalog).context("terminal error"),
        Commands::Search { text, size, milk } => search(&mut catalog, text, size, milk),
        Commands::Sizes => {
            catalog.sizes().iter().for_each(|s| println!("{s}"));
            Ok(())
        }
        Commands::Milks => {
            catalog.milk_types().iter().for_each(|m| println!("{m}"));
            Ok(())
        }
        Commands::Favorites { action } => favorites(&mut catalog, action),
        Commands::Info => {
            info(&catalog);
            Ok(())
        }
    }
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<CatalogConfig> {
    let mut config = CatalogConfig::load_or_default(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;
    if let Some(dataset) = &cli.dataset {
        config.dataset.clone_from(dataset);
    }
    if let Some(dir) = &cli.state_dir {
        config.state_dir.clone_from(dir);
    }
    Ok(config)
}

fn search(catalog: &mut Catalog, text: String, size: Option<String>, milk: Option<String>) -> Result<()> {
    let now = Instant::now();
    catalog.dispatch(Intent::SearchInput(text), now);
    catalog.flush();

    if let Some(size) = size {
        if catalog.dispatch(Intent::SelectSize(size.clone()), now) == Outcome::Ignored {
            bail!("size `{size}` is not offered; see `catalog sizes`");
        }
    }
    if let Some(milk) = milk {
        if catalog.dispatch(Intent::SelectMilk(milk.clone()), now) == Outcome::Ignored {
            bail!("milk type `{milk}` is not offered; see `catalog milks`");
        }
    }
    catalog.flush();

    if catalog.results().is_empty() {
        println!("No drinks match.");
    }
    for drink in catalog.results() {
        print_drink(drink, catalog);
    }
    Ok(())
}

fn print_drink(drink: &Drink, catalog: &Catalog) {
    println!("{} [{}]", drink.name, drink.id);
    if !drink.has_variants() {
        println!("  no variant fits both filters");
    }
    for size in &drink.sizes {
        for variant in &size.milk_variants {
            let star = if catalog.is_starred(&drink.id, &size.size, &variant.milk_type) { "*" } else { " " };
            println!("{star} {} / {}", size.size, variant.milk_type);
            print_nutrition(&variant.nutrition);
        }
    }
}

fn print_nutrition(nutrition: &Nutrition) {
    for (label, value) in nutrition.rows() {
        println!("    {label:<16}{value}");
    }
}

fn print_favorite(entry: &FavoriteEntry) {
    println!("{} / {} / {}", entry.drink_name, entry.size, entry.milk_type);
    print_nutrition(&entry.nutrition);
}

fn favorites(catalog: &mut Catalog, action: FavoritesAction) -> Result<()> {
    match action {
        FavoritesAction::List => {
            if catalog.favorites().is_empty() {
                println!("No favorites yet.");
            }
            catalog.favorites().list().iter().for_each(print_favorite);
        }
        FavoritesAction::Clear { yes } => {
            let count = catalog.favorites().len();
            if !yes {
                bail!("refusing to clear {count} favorites without --yes");
            }
            let now = Instant::now();
            if catalog.dispatch(Intent::RequestClearFavorites, now) == Outcome::AwaitingConfirmation {
                catalog.dispatch(Intent::ConfirmClearFavorites, now);
            }
            println!("Cleared {count} favorites.");
        }
    }
    Ok(())
}

fn info(catalog: &Catalog) {
    let dataset = catalog.dataset();
    let metadata = &dataset.metadata;
    println!("drinks:       {}", dataset.drinks.len());
    if let Some(total) = metadata.total_drinks {
        println!("declared:     {total}");
    }
    println!("source:       {}", metadata.source.as_deref().unwrap_or("unknown"));
    println!("extracted at: {}", metadata.extracted_at.as_deref().unwrap_or("unknown"));
    println!("sizes:        {}", catalog.sizes().join(", "));
    println!("milk types:   {}", catalog.milk_types().join(", "));
    println!("favorites:    {}", catalog.favorites().len());
}
