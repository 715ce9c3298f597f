//! thedump-cli: capture a note, photo, voice memo or file and follow it until
//! the backend has organized it.

mod follow;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use thedump::browse::FolderRow;
use thedump::secrets::ID_TOKEN_ENV_VAR;
use thedump::telemetry::init_logging;
use thedump::{resolve_config, BrowseIndex, CaptureService, HttpBackend, SessionStore, TokenSource};

use follow::{follow_item, Outcome};

#[derive(Parser)]
#[command(name = "thedump-cli")]
#[command(author, version, about = "Capture into The Dump and watch it get organized")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: <config dir>/thedump/config.json if present)
    #[arg(short, long, env = "THEDUMP_CONFIG")]
    config: Option<PathBuf>,

    /// Account email
    #[arg(long, env = "THEDUMP_EMAIL", default_value = "")]
    email: String,

    /// File holding the ID token (otherwise THEDUMP_ID_TOKEN is used)
    #[arg(long)]
    token_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a typed note
    Text {
        /// Note content
        content: String,
    },

    /// Upload a JPEG photo
    Photo {
        path: PathBuf,

        /// Optional thumbnail kept alongside the session item
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },

    /// Upload a recorded voice memo
    Audio { path: PathBuf },

    /// Upload any file under its own name
    File { path: PathBuf },

    /// List note folders by category, date and file type
    Browse,

    /// Show this month's usage against the plan limits
    Usage {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
}

fn backend(cli: &Cli, config: &thedump::Config) -> Result<HttpBackend> {
    let tokens = TokenSource {
        direct: None,
        file_path: cli.token_file.clone(),
        env_var: Some(ID_TOKEN_ENV_VAR.to_string()),
    };
    HttpBackend::from_sources(config.backend.clone(), cli.email.clone(), &tokens)
        .context("Failed to set up backend client")
}

async fn show_browse(backend: &HttpBackend) -> Result<ExitCode> {
    let counts = backend.fetch_counts().await?;
    let index = BrowseIndex::from_counts(&counts);

    print_section("Categories", &index.categories);
    print_section("Dates", &index.date_groups);
    print_section("File types", &index.mime_types);
    Ok(ExitCode::SUCCESS)
}

fn print_section(title: &str, rows: &[FolderRow]) {
    if rows.is_empty() {
        return;
    }
    println!("{}", title);
    for row in rows {
        println!("  {:<24} {}", row.name, row.count);
    }
}

async fn show_usage(backend: &HttpBackend, json: bool) -> Result<ExitCode> {
    let usage = backend.fetch_usage_status().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&usage)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", usage.limiting_factor_label());
    println!("Resets at {}", usage.resets_at);
    if usage.is_blocked {
        println!(
            "Uploads blocked: {}",
            usage.blocked_reason.as_deref().unwrap_or("limit reached")
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;
    info!("Starting thedump v{}", env!("CARGO_PKG_VERSION"));

    let backend = Arc::new(backend(&cli, &config)?);

    let store = SessionStore::new(backend.clone());
    let capture = CaptureService::new(store.clone(), backend.clone());
    let rx = store.subscribe();

    let id = match &cli.command {
        Commands::Text { content } => capture.capture_text(content).await?,
        Commands::Photo { path, thumbnail } => {
            let jpeg = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let thumbnail = match thumbnail {
                Some(thumb) => Some(
                    tokio::fs::read(thumb)
                        .await
                        .with_context(|| format!("Failed to read {}", thumb.display()))?,
                ),
                None => None,
            };
            capture.capture_photo(jpeg, thumbnail).await?
        }
        Commands::Audio { path } => capture.capture_audio(path).await?,
        Commands::File { path } => capture.capture_file(path).await?,
        Commands::Browse => return show_browse(&backend).await,
        Commands::Usage { json } => return show_usage(&backend, *json).await,
    };

    let outcome = follow_item(&store, &id, rx, &mut std::io::stdout()).await;
    store.clear();

    match outcome? {
        Outcome::Organized(status) => {
            info!("Capture {} finished: {}", id, status);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Failed(error) => {
            eprintln!("Upload failed: {}", error);
            Ok(ExitCode::FAILURE)
        }
        Outcome::Gone => Ok(ExitCode::FAILURE),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
