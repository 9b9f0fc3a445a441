//! Sail RPC Server - JSON-RPC frontend for the SAIL source index.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the sail-core
//! library so assistant tooling can load application exports and query the
//! resulting object index over HTTP.

mod handler;
mod server;

use anyhow::Result;
use clap::Parser;
use sail_core::{AppRef, SailApi};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sail-rpc")]
#[command(about = "JSON-RPC server for the SAIL source index")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Data directory for archive and checklist caches
    /// (defaults to the platform data dir)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Export archive to load before serving
    #[arg(long)]
    preload_zip: Option<PathBuf>,

    /// Label for the preloaded application
    #[arg(long, default_value = "default")]
    preload_label: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Sail RPC Server");

    let data_root = match args.data_root {
        Some(path) => path,
        None => dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sail-source"),
    };
    info!("Data root: {}", data_root.display());

    let api = SailApi::new(&data_root)?;

    if let Some(zip) = args.preload_zip {
        let report = api
            .load_application(&args.preload_label, &AppRef::local(zip), false)
            .await?;
        info!(
            "Preloaded '{}' with {} objects",
            report.label, report.object_count
        );
    }

    let addr = server::start_server(api, &args.host, args.port).await?;

    // Printed for the supervising process to read (intentional stdout).
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
