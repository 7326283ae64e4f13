//! # `docstore` CLI Library Crate
//!
//! This crate contains the command definitions and handlers for the
//! `docstore` binary: managing File Search stores and uploading local
//! documents into them.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docstore::pacing::FixedInterval;
use docstore::providers::store::{ApiVariant, GeminiStoreClient, StoreClient};
use docstore::types::{Document, DocumentMetadata, DocumentSource};
use docstore::constants::{
    ENV_API_BASE_URL, ENV_API_KEY, ENV_API_VARIANT, ENV_STORE_ID, ENV_UPLOAD_BASE_URL,
};
use docstore::{BatchUploader, StoreClientConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// API key for the Gemini API.
    #[arg(long, env = ENV_API_KEY, hide_env_values = true, global = true)]
    pub api_key: Option<String>,
    /// Which API shape to target: `corpora` or `fileSearchStores`.
    #[arg(
        long,
        env = ENV_API_VARIANT,
        default_value = "fileSearchStores",
        global = true
    )]
    pub variant: ApiVariant,
    /// The store (or corpus) to operate on.
    #[arg(long, env = ENV_STORE_ID, global = true)]
    pub store_id: Option<String>,
    /// Override for the REST base URL.
    #[arg(long, env = ENV_API_BASE_URL, global = true)]
    pub base_url: Option<String>,
    /// Override for the media upload base URL.
    #[arg(long, env = ENV_UPLOAD_BASE_URL, global = true)]
    pub upload_base_url: Option<String>,
    /// Milliseconds between file state polls.
    #[arg(long, default_value_t = 2000, global = true)]
    pub poll_interval_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new store
    CreateStore {
        /// Human-readable name for the store.
        display_name: String,
    },
    /// Show one store
    GetStore { id: String },
    /// Delete a store
    DeleteStore {
        id: String,
        /// Also delete the documents inside the store.
        #[arg(long)]
        force: bool,
    },
    /// List every store
    ListStores,
    /// List every file in the configured store (corpora only)
    ListFiles,
    /// Upload markdown or text files into the configured store
    Upload(UploadArgs),
    /// Delete every file in the configured store (corpora only)
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Files or directories to upload. Directories are walked recursively.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// The `type` recorded in each document's metadata.
    #[arg(long = "type", default_value = "markdown")]
    pub doc_type: String,
    /// Milliseconds to wait between uploads.
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,
    /// Seconds to wait for each file to become active.
    #[arg(long, default_value_t = 60)]
    pub max_wait_secs: u64,
}

// --- Public Entrypoint ---

/// The main entry point for the `docstore` library.
pub async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli.connection)?;

    match cli.command {
        Commands::CreateStore { display_name } => {
            let store = client.create_store(&display_name).await?;
            print_json(&store)
        }
        Commands::GetStore { id } => print_json(&client.get_store(&id).await?),
        Commands::DeleteStore { id, force } => {
            client.delete_store(&id, force).await?;
            println!("🗑️  Deleted store '{id}'.");
            Ok(())
        }
        Commands::ListStores => print_json(&client.list_all_stores().await?),
        Commands::ListFiles => {
            let store_id = require_store(client.default_store_id())?;
            if !client.capabilities().file_listing {
                bail!("The {} API cannot list files.", client.variant());
            }
            print_json(&client.list_all_files(&store_id).await?)
        }
        Commands::Upload(args) => handle_upload(client, args).await,
        Commands::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete every file without --yes.");
            }
            let store_id = client.default_store_id().map(str::to_string);
            let uploader = BatchUploader::builder()
                .client(Arc::new(client))
                .maybe_store_id(store_id)
                .build()?;
            let deleted = uploader.clear_corpus().await?;
            println!("🧹 Deleted {deleted} files.");
            Ok(())
        }
    }
}

/// Builds the store client from the command-line and environment settings.
pub fn build_client(args: &ConnectionArgs) -> Result<GeminiStoreClient> {
    let api_key = args
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow!("{ENV_API_KEY} is required (set it or pass --api-key)"))?;

    let mut config = StoreClientConfig::new(api_key, args.variant)
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms));
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(upload_base_url) = &args.upload_base_url {
        config.upload_base_url = upload_base_url.trim_end_matches('/').to_string();
    }
    config.store_id = args.store_id.clone();

    Ok(GeminiStoreClient::new(config)?)
}

fn require_store(store_id: Option<&str>) -> Result<String> {
    store_id
        .map(str::to_string)
        .ok_or_else(|| anyhow!("A store is required (set {ENV_STORE_ID} or pass --store-id)"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// --- Command Handlers ---

/// Handles the `docstore upload` command logic.
async fn handle_upload(client: GeminiStoreClient, args: UploadArgs) -> Result<()> {
    info!("Starting 'upload' command with args: {:?}", args);
    let store_id = require_store(client.default_store_id())?;
    let documents = load_documents(&args.paths, &args.doc_type)?;
    if documents.is_empty() {
        println!("🤷 No markdown or text files found. Nothing to do.");
        return Ok(());
    }
    println!(
        "🚀 Uploading {} documents to '{store_id}'...",
        documents.len()
    );

    let uploader = BatchUploader::builder()
        .client(Arc::new(client))
        .store_id(store_id)
        .pacer(Box::new(FixedInterval(Duration::from_millis(args.delay_ms))))
        .max_wait(Duration::from_secs(args.max_wait_secs))
        .build()?;

    let started = Instant::now();
    let batch = uploader
        .upload_documents_with_progress(documents, |index, total, result| {
            if result.success {
                println!("  ✅ [{index}/{total}] {}", result.file_name);
            } else {
                eprintln!(
                    "  ❌ [{index}/{total}] {}: {}",
                    result.file_name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        })
        .await;
    info!("Upload finished in {:?}", started.elapsed());

    print_json(&batch)?;
    if batch.failure_count > 0 {
        bail!(
            "{} of {} documents failed to upload",
            batch.failure_count,
            batch.total_documents
        );
    }
    Ok(())
}

/// Reads every `.md`, `.markdown` and `.txt` file under `paths` into a `Document`.
///
/// Directory entries are visited in sorted order so batches are reproducible.
pub fn load_documents(paths: &[PathBuf], doc_type: &str) -> Result<Vec<Document>> {
    let mut files = Vec::new();
    for path in paths {
        collect_files(path, &mut files)?;
    }

    files
        .iter()
        .map(|file| load_document(file, doc_type))
        .collect()
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_dir() {
        let mut entries = fs::read_dir(path)
            .with_context(|| format!("Failed to read directory '{}'", path.display()))?
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            collect_files(&entry.path(), files)?;
        }
    } else if is_document_file(path) {
        files.push(path.to_path_buf());
    } else if !path.exists() {
        bail!("Path '{}' does not exist", path.display());
    } else {
        warn!("Skipping '{}': not a markdown or text file.", path.display());
    }
    Ok(())
}

fn is_document_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "markdown" | "txt")
    )
}

fn load_document(path: &Path, doc_type: &str) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let absolute = fs::canonicalize(path)?;
    let url = Url::from_file_path(&absolute)
        .map_err(|_| anyhow!("Cannot build a file URL for '{}'", absolute.display()))?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    let mut metadata = DocumentMetadata::new(DocumentSource::Filesystem, doc_type, id, url.to_string());
    metadata.title = content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string());
    Ok(Document::new(content, metadata))
}
