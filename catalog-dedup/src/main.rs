//! catalog-dedup - duplicate product review service
//!
//! Serves the duplicate review API over the catalog database, or with
//! `--report` prints one duplicate report as JSON and exits.

use anyhow::{Context, Result};
use catalog_common::config::{
    default_config_path, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use catalog_common::db::init_database;
use catalog_dedup::parity::select_encoder;
use catalog_dedup::store::SqliteCatalogStore;
use catalog_dedup::{build_router, AppState, DuplicateReview, GroupingOptions};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for catalog-dedup
#[derive(Parser, Debug)]
#[command(name = "catalog-dedup")]
#[command(about = "Phonetic duplicate detection for the product catalog")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides bind_addr's port)
    #[arg(short, long, env = "CATALOG_PORT")]
    port: Option<u16>,

    /// Folder holding catalog.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the current duplicate report as JSON and exit
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing exists; problems are logged right after init
    let config_path = args.config.clone().or_else(default_config_path);
    let (config, config_error) = match config_path.as_deref().filter(|p| p.exists()) {
        Some(path) => match TomlConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (TomlConfig::default(), Some(e)),
        },
        None => (TomlConfig::default(), None),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting catalog-dedup v{}",
        env!("CARGO_PKG_VERSION")
    );
    if let Some(e) = config_error {
        warn!("Ignoring config file, using defaults: {}", e);
    }

    let root_folder = RootFolderResolver::new("catalog-dedup")
        .with_cli_arg(args.root_folder.clone())
        .with_config_path(args.config.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to open catalog database")?;

    let dedup = &config.dedup;
    let store = Arc::new(SqliteCatalogStore::new(
        pool,
        Duration::from_millis(dedup.store_timeout_ms),
    ));
    let encoder = select_encoder(store.as_ref(), dedup.prefer_native_encoding).await;
    let review = DuplicateReview::new(
        store,
        GroupingOptions {
            include_empty_code: dedup.include_empty_code,
        },
    )
    .with_encoder(encoder);

    if args.report {
        let report = review.find_duplicates().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut addr: SocketAddr = dedup
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind_addr {:?}", dedup.bind_addr))?;
    if let Some(port) = args.port {
        addr.set_port(port);
    }

    let app = build_router(AppState::new(review));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("catalog-dedup listening on http://{}", addr);
    info!("Duplicate report: http://{}/api/duplicates", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("catalog-dedup stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
