// Bookshelf - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bookshelf::api::{router, AppState};
use bookshelf::{AccountRegistry, Catalog, SnapshotMirror};

#[derive(Parser, Debug)]
#[command(name = "bookshelf-server", version, about = "Book catalog HTTP service")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BOOKSHELF_ADDR", default_value = "0.0.0.0:5000")]
    addr: SocketAddr,

    /// Seed file (defaults to the embedded data/books.json)
    #[arg(long, env = "BOOKSHELF_SEED")]
    seed: Option<PathBuf>,

    /// Snapshot file consulted before the local catalog for listings
    #[arg(long, env = "BOOKSHELF_MIRROR")]
    mirror: Option<PathBuf>,

    /// Log filter (e.g. "info", "bookshelf=debug,tower_http=debug")
    #[arg(long, env = "BOOKSHELF_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let catalog = match &args.seed {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::seeded()?,
    };
    if catalog.is_empty() {
        warn!(seed = ?args.seed, "catalog seed has no books");
    }
    info!(books = catalog.len(), seed = ?args.seed, "catalog loaded");

    let mut state = AppState::new(catalog, AccountRegistry::new());
    if let Some(path) = &args.mirror {
        info!(snapshot = ?path, "mirror enabled");
        state = state.with_mirror(Arc::new(SnapshotMirror::new(path)));
    }

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    info!(addr = %args.addr, "server running");

    axum::serve(listener, router(state))
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
