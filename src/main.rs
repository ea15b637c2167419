use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use curio::blob::Blob;
use curio::catalog::{
    CategoryTab, CategoryTag, Item, ItemDraft, MutationCoordinator, MutationState, QueryKey,
    Repository, SortMode,
};
use curio::config::Config;
use curio::storage::{Database, DatabaseError};
use curio::util::{pad_to_width, strip_control_chars};

/// Get the config directory path (~/.config/curio/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("curio"))
}

#[derive(Parser, Debug)]
#[command(name = "curio", about = "Catalog of tins, books, patches and uniforms")]
struct Args {
    /// Config file (defaults to ~/.config/curio/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add an item
    Add {
        /// tin, book, patch or uniform
        kind: CategoryTag,

        /// Book title (books only)
        #[arg(long)]
        name: Option<String>,

        /// Book year (books only)
        #[arg(long)]
        year: Option<String>,

        /// Item id (everything except books)
        #[arg(long)]
        id: Option<String>,

        /// Photo to attach
        #[arg(long, value_name = "FILE")]
        photo: Option<PathBuf>,
    },

    /// List items for a category tab
    List {
        /// all, books, patches, uniforms or tins
        #[arg(long)]
        category: Option<CategoryTab>,

        /// Case-insensitive substring of a book title or an id
        #[arg(long)]
        search: Option<String>,

        /// newest, oldest, year-asc or year-desc
        #[arg(long)]
        sort: Option<SortMode>,

        #[arg(long)]
        json: bool,
    },

    /// Show one item
    Get {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List books ordered by year as the store sorts them
    BooksByYear,

    /// Save an item's photo to a file
    Photo {
        id: String,

        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    // User-only access to the catalog directory
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = config.database_path(&config_dir);
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db.with_upload_chunk_bytes(config.upload_chunk_bytes),
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: Another curio process appears to be using the catalog. Please close it and try again.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let repository = Repository::new(Arc::new(db));

    match args.command {
        Command::Add {
            kind,
            name,
            year,
            id,
            photo,
        } => {
            let photo = match photo {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("Failed to read photo {}", path.display()))?;
                    Some(Blob::from_bytes(bytes))
                }
                None => None,
            };
            let draft = ItemDraft {
                book_name: name.unwrap_or_default(),
                book_year: year.unwrap_or_default(),
                item_id: id.unwrap_or_default(),
                photo,
                ..ItemDraft::new(kind)
            };
            add_item(repository, draft, config.max_photo_bytes).await?;
        }
        Command::List {
            category,
            search,
            sort,
            json,
        } => {
            let mut view = config.initial_view();
            if let Some(category) = category {
                view.set_selected_category(category);
            }
            if let Some(search) = search {
                view.set_search_query(search);
            }
            if let Some(sort) = sort {
                view.set_sort_mode(sort);
            }
            if matches!(view.sort_mode(), SortMode::YearAsc | SortMode::YearDesc)
                && !view.year_sort_available()
            {
                anyhow::bail!(
                    "Sorting by year is only available for the all and books tabs (got {})",
                    view.selected_category()
                );
            }

            let items = repository
                .load_view(&view)
                .await
                .context("Failed to load items")?;
            print_items(&items, json)?;
        }
        Command::Get { id, json } => {
            let item = repository
                .get_item(&id)
                .await
                .with_context(|| format!("Failed to look up {id}"))?;
            print_items(std::slice::from_ref(&item), json)?;
        }
        Command::BooksByYear => {
            let books = repository
                .ensure(QueryKey::BooksSortedByYear)
                .await
                .context("Failed to load books")?;
            print_items(&books, false)?;
        }
        Command::Photo { id, out } => {
            let item = repository
                .get_item(&id)
                .await
                .with_context(|| format!("Failed to look up {id}"))?;
            let Some(photo) = item.photo else {
                anyhow::bail!("{id} has no photo");
            };
            let bytes = repository
                .backend()
                .photo_bytes(&photo)
                .await
                .context("Failed to read photo")?;
            std::fs::write(&out, &bytes)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Saved {} ({} bytes) to {}", photo.display_url(), bytes.len(), out.display());
        }
    }

    Ok(())
}

/// Submit a draft, echoing upload progress to stderr while it runs.
async fn add_item(repository: Repository, draft: ItemDraft, max_photo_bytes: u64) -> Result<()> {
    let coordinator = MutationCoordinator::new(repository);
    let mut rx = coordinator.subscribe();

    let progress = tokio::spawn(async move {
        let mut last = None;
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            match state {
                MutationState::Submitting {
                    progress: Some(p), ..
                } if last != Some(p) => {
                    eprint!("\rUploading photo... {p:>3}%");
                    last = Some(p);
                }
                MutationState::Submitting { .. } | MutationState::Idle => {}
                MutationState::Succeeded { .. } | MutationState::Failed { .. } => break,
            }
        }
        if last.is_some() {
            eprintln!();
        }
    });

    let outcome = coordinator.submit_draft(draft, max_photo_bytes).await;
    let state = coordinator.state();
    drop(coordinator);
    progress.await.ok();

    outcome.map_err(|e| anyhow::anyhow!("Failed to add item: {e}"))?;
    if let MutationState::Succeeded { id } = state {
        println!("Added {id}");
    }
    Ok(())
}

fn print_items(items: &[Item], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("No items.");
        return Ok(());
    }

    println!(
        "{} {} {} {} CREATED",
        pad_to_width("ID", 28),
        pad_to_width("CATEGORY", 8),
        pad_to_width("TITLE", 30),
        pad_to_width("DETAIL", 10),
    );
    for item in items {
        let detail = item.subtitle().unwrap_or_default();
        let photo = if item.photo.is_some() { " [photo]" } else { "" };
        println!(
            "{} {} {} {} {}{}",
            pad_to_width(&strip_control_chars(&item.id), 28),
            pad_to_width(item.category.label(), 8),
            pad_to_width(&strip_control_chars(item.title()), 30),
            pad_to_width(&detail, 10),
            item.created_at().format("%Y-%m-%d %H:%M"),
            photo,
        );
    }
    Ok(())
}
