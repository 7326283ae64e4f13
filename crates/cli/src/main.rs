//! # docstore: File Search store management and document upload
//!
//! This binary is a thin entrypoint; all logic lives in the `docstore_cli`
//! library crate.

use anyhow::Result;
use clap::Parser;
use docstore_cli::{run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env so clap's env fallbacks can see it
    dotenvy::dotenv().ok();

    // 2. Setup logging
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("docstore=info".parse()?)
                .add_directive("docstore_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 3. Parse CLI arguments
    let cli = Cli::parse();

    // 4. Call the library's run function and handle the final result
    if let Err(e) = run(cli).await {
        eprintln!("[docstore error] {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
