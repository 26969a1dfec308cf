use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pmx_core::checklist::ChecklistSession;
use pmx_core::{NewItem, RecommendationItem};
use pmx_storage::{seed, snapshot, ItemStore, SeedOutcome, SqliteItemStore};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod matrix;
mod overlay;

use overlay::FileOverlayStore;

#[derive(Parser)]
#[command(name = "pmx")]
#[command(about = "Priority matrix checklist CLI", long_about = None)]
struct Cli {
    /// SQLite database holding the priority items.
    #[arg(long, global = true, env = "PMX_DB_PATH", default_value = "db/cjn-dakota.db")]
    db: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Seed an empty database with the recommendation catalog
    Seed,
    /// List every item ordered by category
    List(ListArgs),
    /// Append a new item
    Add(AddArgs),
    /// Mark an item complete in the database
    Check(TargetArgs),
    /// Mark an item incomplete in the database
    Uncheck(TargetArgs),
    /// Write the static catalog snapshot
    Snapshot(SnapshotArgs),
    /// Show the priority matrix with the local completion overlay
    Matrix(MatrixArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    category: String,
    #[arg(long, alias = "item-text")]
    text: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, alias = "priority-level", default_value = "")]
    priority: String,
}

#[derive(Args, Debug)]
struct TargetArgs {
    id: i64,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[arg(long, default_value = snapshot::DEFAULT_SNAPSHOT_PATH)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct MatrixArgs {
    /// Read the catalog from a static snapshot file.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Read the catalog from a running service, e.g. http://127.0.0.1:3000
    #[arg(long, env = "PMX_API_URL")]
    api: Option<String>,
    #[arg(long, env = "PMX_OVERLAY_PATH")]
    overlay: Option<PathBuf>,
    /// Toggle an item before rendering; repeatable.
    #[arg(long = "toggle")]
    toggles: Vec<i64>,
    /// Click a row open or shut before rendering; repeatable.
    #[arg(long)]
    expand: Vec<i64>,
    /// Also write toggles to the service given by --api.
    #[arg(long)]
    sync: bool,
    #[arg(long)]
    json: bool,
}

enum CatalogSource<'a> {
    Snapshot(&'a Path),
    Api(&'a str),
    Store(&'a Path),
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Seed => {
            let store = open_store(&cli.db)?;
            match seed(&store).context("Failed to seed priority items")? {
                SeedOutcome::Seeded { inserted } => {
                    println!("Seeded {inserted} priority items into {}", cli.db.display());
                }
                SeedOutcome::Skipped { existing } => {
                    println!("Store already holds {existing} items; nothing to seed");
                }
            }
        }
        Commands::List(args) => {
            let store = open_store(&cli.db)?;
            let items = store.list_all().context("Failed to fetch items")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_items(&items);
            }
        }
        Commands::Add(args) => {
            let store = open_store(&cli.db)?;
            let id = store
                .insert(&NewItem {
                    category: args.category,
                    item_text: args.text,
                    description: args.description,
                    priority_level: args.priority,
                })
                .context("Failed to create item")?;
            println!("Created item {id}");
        }
        Commands::Check(args) => set_flag(&cli.db, args.id, true)?,
        Commands::Uncheck(args) => set_flag(&cli.db, args.id, false)?,
        Commands::Snapshot(args) => {
            let count = snapshot::write_snapshot(&args.out)
                .with_context(|| format!("Failed to write {}", args.out.display()))?;
            println!("Generated {count} priority items → {}", args.out.display());
        }
        Commands::Matrix(args) => run_matrix(&cli.db, args).await?,
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("PMX_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_store(path: &Path) -> Result<SqliteItemStore> {
    SqliteItemStore::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn set_flag(db: &Path, id: i64, is_checked: bool) -> Result<()> {
    let store = open_store(db)?;
    let changes = store
        .set_checked(id, is_checked)
        .context("Failed to update item")?;
    if changes == 0 {
        bail!("Item not found: {id}");
    }
    let state = if is_checked { "complete" } else { "incomplete" };
    println!("Item {id} marked {state}");
    Ok(())
}

fn print_items(items: &[RecommendationItem]) {
    for item in items {
        let mark = if item.is_checked { "[x]" } else { "[ ]" };
        println!(
            "{mark} {:>3}  {}  {}",
            item.id, item.category, item.recommendation
        );
    }
}

async fn load_catalog(
    source: &CatalogSource<'_>,
    client: &reqwest::Client,
) -> Result<Vec<RecommendationItem>> {
    match source {
        CatalogSource::Snapshot(path) => snapshot::read_snapshot(path)
            .with_context(|| format!("Failed to load priority items from {}", path.display())),
        CatalogSource::Api(base) => api::fetch_items(client, base).await,
        CatalogSource::Store(path) => open_store(path)?
            .list_all()
            .context("Failed to load priority items"),
    }
}

async fn run_matrix(db: &Path, args: MatrixArgs) -> Result<()> {
    let client = reqwest::Client::new();
    let session = prepare_matrix(db, &args, &client).await?;
    let view = session.view();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&matrix::summarize(view))?);
    } else {
        print!("{}", matrix::render_text(view));
    }
    Ok(())
}

/// Loads the catalog, applies the overlay and the requested row clicks.
async fn prepare_matrix(
    db: &Path,
    args: &MatrixArgs,
    client: &reqwest::Client,
) -> Result<ChecklistSession<FileOverlayStore>> {
    let source = if let Some(path) = args.snapshot.as_deref() {
        CatalogSource::Snapshot(path)
    } else if let Some(base) = args.api.as_deref() {
        CatalogSource::Api(base)
    } else {
        CatalogSource::Store(db)
    };
    let sync_base = match (&source, args.sync) {
        (CatalogSource::Api(base), true) => Some(*base),
        (_, true) => bail!("--sync requires the catalog to come from --api"),
        _ => None,
    };

    let items = load_catalog(&source, client).await?;

    let overlay_path = args
        .overlay
        .clone()
        .unwrap_or_else(FileOverlayStore::default_path);
    let mut session = ChecklistSession::open(items, FileOverlayStore::new(overlay_path));
    if let Some(reason) = session.warning() {
        warn!(event = "overlay_reset", reason = %reason);
    }

    for &id in &args.toggles {
        let Some(is_checked) = session
            .toggle(id)
            .context("Failed to save completion overlay")?
        else {
            warn!(event = "toggle_unknown_item", id);
            continue;
        };
        info!(event = "item_toggled", id, is_checked);
        if let Some(base) = sync_base {
            api::set_checked(client, base, id, is_checked).await?;
        }
    }
    for &id in &args.expand {
        session.view_mut().toggle_expanded(id);
    }
    Ok(session)
}
