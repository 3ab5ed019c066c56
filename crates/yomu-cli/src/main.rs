//! Command-line front end for the MangaDex content source.
//!
//! Each subcommand maps to one source operation and prints the result
//! as pretty JSON, which makes the tool usable both interactively and
//! from scripts.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use yomu_source::{MangaDexSource, MangaSource, SourceConfig};

#[derive(Parser)]
#[command(name = "yomu", about = "Browse MangaDex from the terminal", version)]
struct Cli {
    /// Path to a TOML config file. Defaults to the platform config
    /// directory when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search manga by title.
    Search {
        query: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Show full details for a manga.
    Details { manga_id: String },
    /// List every chapter of a manga.
    Chapters { manga_id: String },
    /// List the page image URLs of a chapter.
    Pages {
        manga_id: String,
        chapter_id: String,
    },
    /// Show the home-page sections.
    Home,
    /// Page through a home-page section.
    ViewMore {
        section_id: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// List the search-filter tags.
    Tags,
}

fn load_config(path: Option<PathBuf>) -> Result<SourceConfig> {
    let path = path.or_else(|| {
        directories::ProjectDirs::from("", "", "yomu")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|p| p.exists())
    });

    match path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(SourceConfig::default()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yomu=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let source = MangaDexSource::new(config)?;

    match cli.command {
        Command::Search { query, page } => {
            let results = source.search(&query, page).await?;
            print_json(&results)?;
        }
        Command::Details { manga_id } => {
            let detail = source.manga_details(&manga_id).await?;
            tracing::info!(url = %source.manga_share_url(&manga_id), "share");
            print_json(&detail)?;
        }
        Command::Chapters { manga_id } => {
            let chapters = source.chapters(&manga_id).await?;
            tracing::info!(total = chapters.len(), "chapters fetched");
            print_json(&chapters)?;
        }
        Command::Pages {
            manga_id,
            chapter_id,
        } => {
            let pages = source.chapter_pages(&manga_id, &chapter_id).await?;
            print_json(&pages)?;
        }
        Command::Home => {
            let sections = source.home_sections().await?;
            print_json(&sections)?;
        }
        Command::ViewMore { section_id, page } => {
            let results = source.view_more(&section_id, page).await?;
            print_json(&results)?;
        }
        Command::Tags => {
            let tags = source.tags().await?;
            print_json(&tags)?;
        }
    }

    Ok(())
}
