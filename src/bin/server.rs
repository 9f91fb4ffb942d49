//! Phonebook Server Binary
//!
//! Bootstraps the directory from its two log files and serves UDP requests.

use std::path::PathBuf;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use phonebook::config::Config;
use phonebook::network::Server;
use phonebook::PhonebookService;
use tracing_subscriber::{fmt, EnvFilter};

/// Phonebook Server
#[derive(Parser, Debug)]
#[command(name = "phonebook-server")]
#[command(about = "Single-writer, multi-reader phonebook directory service")]
#[command(version)]
struct Args {
    /// Phonebook data file (entry log)
    #[arg(required_unless_present = "config")]
    entry_log: Option<PathBuf>,

    /// Credentials data file (credential log)
    #[arg(required_unless_present = "config")]
    credential_log: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,phonebook=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Missing data files print usage and fail like any startup error
            let _ = e.print();
            std::process::exit(-1);
        }
    };

    tracing::info!("Phonebook Server v{}", phonebook::VERSION);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(-1);
        }
    };

    tracing::info!("Entry log: {}", config.entry_log_path.display());
    tracing::info!("Credential log: {}", config.credential_log_path.display());

    let service = match PhonebookService::bootstrap(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to load phonebook: {}", e);
            std::process::exit(-1);
        }
    };

    let server = match Server::bind(config, service) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind socket: {}", e);
            std::process::exit(-1);
        }
    };

    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Cannot install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(-1);
    }

    tracing::info!("Server stopped");
}

/// Config file first, then command line overrides
fn build_config(args: &Args) -> phonebook::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(path) = &args.entry_log {
        config.entry_log_path = path.clone();
    }
    if let Some(path) = &args.credential_log {
        config.credential_log_path = path.clone();
    }
    if let Some(listen) = &args.listen {
        config.listen_addr = listen.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    config.validate()?;
    Ok(config)
}
